use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use sea_orm::sea_query::LockType;

use crate::{
    db::set_lock_timeout,
    dto::orders::ProofAccepted,
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult, RuleViolation},
    ledger::inventory,
    models::OrderStatus,
    notify::{self, messages},
    order_code,
    pricing,
    response::{ApiResponse, Meta},
    services::settings_service,
    state::AppState,
    storage::{ImageKind, StoredFile},
};

/// Directory under the storage root that receives proofs.
pub const PROOF_DIR: &str = "payment-proofs";

/// A file taken from the multipart `proof` field.
#[derive(Debug, Clone)]
pub struct ProofUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Accepts jpg/jpeg/png names whose content really is JPEG or PNG.
pub fn validate_upload(upload: &ProofUpload, max_bytes: usize) -> AppResult<ImageKind> {
    if upload.bytes.is_empty() {
        return Err(AppError::validation("proof", "Payment proof file is required"));
    }
    if upload.bytes.len() > max_bytes {
        return Err(AppError::validation(
            "proof",
            format!("Payment proof must not exceed {} KB", max_bytes / 1024),
        ));
    }
    if ImageKind::from_file_name(&upload.file_name).is_none() {
        return Err(AppError::validation("proof", "Payment proof must be a jpg or png image"));
    }
    ImageKind::sniff(&upload.bytes)
        .ok_or_else(|| AppError::validation("proof", "Payment proof must be a jpg or png image"))
}

fn ensure_payable(order: &OrderModel) -> Result<(), RuleViolation> {
    if order.payment_proof_uploaded_at.is_some() {
        return Err(RuleViolation::ProofAlreadySubmitted);
    }
    if order.status != OrderStatus::PendingPayment.as_str() {
        return Err(RuleViolation::OrderNotPayable);
    }
    Ok(())
}

/// Accepts a payment proof for an order, exactly once.
///
/// The file is stored first, then one transaction re-validates the order's
/// lines under lock, reserves inventory if checkout did not, and records the
/// proof and order code. Any failure removes the stored file. Admin and
/// customer are notified after commit; delivery problems only add a warning.
pub async fn submit_payment_proof(
    state: &AppState,
    id_or_code: &str,
    upload: ProofUpload,
) -> AppResult<ApiResponse<ProofAccepted>> {
    let order = super::order_service::find_order(&state.orm, id_or_code).await?;
    ensure_payable(&order)?;
    let kind = validate_upload(&upload, state.config.proof_max_bytes)?;

    let stored = state
        .storage
        .store(PROOF_DIR, kind.extension(), &upload.bytes)
        .await?;

    let (order, items) = match finalize(state, &order, &stored, Utc::now()).await {
        Ok(done) => done,
        Err(err) => {
            if let Err(cleanup) = state.storage.delete(&stored.path).await {
                tracing::warn!(error = %cleanup, path = %stored.path, "orphaned proof not removed");
            }
            return Err(err);
        }
    };

    let order_code = order.order_code.clone().unwrap_or_default();
    tracing::info!(order_id = %order.id, order_code = %order_code, "payment proof accepted");

    let warning = notify_proof_received(state, &order, &items, &stored.url).await;

    Ok(ApiResponse::success(
        "Payment proof uploaded",
        ProofAccepted {
            message: "Payment proof received. We will verify it shortly.".into(),
            proof_url: stored.url,
            order_code,
            warning,
        },
        Some(Meta::empty()),
    ))
}

async fn finalize(
    state: &AppState,
    order: &OrderModel,
    stored: &StoredFile,
    now: DateTime<Utc>,
) -> AppResult<(OrderModel, Vec<OrderItemModel>)> {
    let txn = state.orm.begin().await?;
    set_lock_timeout(&txn, state.config.lock_timeout_ms).await?;

    let order = Orders::find_by_id(order.id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    ensure_payable(&order)?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .order_by_asc(OrderItemCol::Id)
        .all(&txn)
        .await?;
    let reserve_now = order.stock_reserved_at.is_none();
    let ids: Vec<_> = items.iter().map(|item| item.product_id).collect();
    let mut products = inventory::lock_products(&txn, &ids, false).await?;

    for item in &items {
        let product = match products.get(&item.product_id) {
            Some(p) if p.is_active || !reserve_now => p,
            None if !reserve_now => continue,
            _ => {
                return Err(RuleViolation::InsufficientStock {
                    product: item.product_name_snapshot.clone(),
                }
                .into());
            }
        };

        if reserve_now {
            inventory::check_stock(product, item.qty)?;
            if item.is_flash_sale {
                if !pricing::is_flash_sale_window(product, now) {
                    return Err(RuleViolation::FlashSaleEnded {
                        product: product.name.clone(),
                    }
                    .into());
                }
                inventory::check_flash_stock(product, item.qty)?;
            }
        }

        if item.is_flash_sale && product.max_qty_per_customer.is_some() {
            let prior = inventory::per_customer_flash_usage(
                &txn,
                &order.customer_whatsapp,
                product.id,
                Some(order.id),
            )
            .await?;
            inventory::check_customer_limit(product, item.qty, prior)?;
        }
    }

    if reserve_now {
        for item in &items {
            let Some(product) = products.get_mut(&item.product_id) else {
                continue;
            };
            inventory::reserve_stock(&txn, product, item.qty).await?;
            if item.is_flash_sale {
                inventory::reserve_flash_stock(&txn, product, item.qty).await?;
            }
        }
    }

    let code = match &order.order_code {
        Some(code) => code.clone(),
        None => order_code::generate(&txn, &state.config.order_code_prefix).await?,
    };

    let mut active: OrderActive = order.into();
    active.payment_proof_url = Set(Some(stored.url.clone()));
    active.payment_proof_uploaded_at = Set(Some(now.into()));
    active.order_code = Set(Some(code));
    if reserve_now {
        active.stock_reserved_at = Set(Some(now.into()));
    }
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;

    txn.commit().await?;
    Ok((order, items))
}

async fn notify_proof_received(
    state: &AppState,
    order: &OrderModel,
    items: &[OrderItemModel],
    proof_url: &str,
) -> Option<String> {
    let mut warnings = Vec::new();

    let settings = match settings_service::load(&state.orm).await {
        Ok(settings) => Some(settings),
        Err(err) => {
            tracing::warn!(error = %err, "site settings unavailable for notification");
            None
        }
    };
    let store_name = settings
        .as_ref()
        .and_then(|s| s.store_name.clone())
        .unwrap_or_else(|| settings_service::DEFAULT_STORE_NAME.to_string());
    let admin_target = settings
        .as_ref()
        .and_then(|s| s.admin_whatsapp.clone())
        .filter(|wa| !wa.trim().is_empty())
        .or_else(|| state.config.notify.admin_whatsapp.clone());

    match admin_target {
        Some(target) => {
            let message = messages::proof_received_admin(&store_name, order, items, proof_url);
            if !notify::send_logged(state.notifier.as_ref(), &target, &message, "proof_admin").await
            {
                warnings.push("Admin notification could not be delivered");
            }
        }
        None => {
            tracing::warn!(order_id = %order.id, "admin WhatsApp is not configured");
            warnings.push("Admin WhatsApp number is not configured");
        }
    }

    let message = messages::proof_received_customer(order, items);
    if !notify::send_logged(
        state.notifier.as_ref(),
        &order.customer_whatsapp,
        &message,
        "proof_customer",
    )
    .await
    {
        warnings.push("Customer notification could not be delivered");
    }

    (!warnings.is_empty()).then(|| warnings.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: [u8; 9] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0];

    fn upload(name: &str, bytes: &[u8]) -> ProofUpload {
        ProofUpload {
            file_name: name.into(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn png_with_png_name_is_accepted() {
        assert_eq!(validate_upload(&upload("bukti.png", &PNG), 1024).unwrap(), ImageKind::Png);
    }

    #[test]
    fn extension_and_content_must_both_be_images() {
        assert!(validate_upload(&upload("bukti.pdf", &PNG), 1024).is_err());
        assert!(validate_upload(&upload("bukti.jpg", b"%PDF-1.7"), 1024).is_err());
        assert!(validate_upload(&upload("bukti.jpg", b""), 1024).is_err());
    }

    #[test]
    fn oversized_files_are_rejected() {
        let err = validate_upload(&upload("bukti.png", &PNG), 4).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "proof"));
    }
}
