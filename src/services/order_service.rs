use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::collections::HashSet;
use uuid::Uuid;

use crate::{
    config::ReservationMode,
    db::set_lock_timeout,
    dto::orders::{CreateOrderRequest, OrderPlaced, OrderWithItems},
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult, RuleViolation},
    ledger::{inventory, voucher},
    models::OrderStatus,
    pricing,
    response::{ApiResponse, Meta},
    state::AppState,
};

const MAX_NAME_LEN: usize = 255;
const MAX_WHATSAPP_LEN: usize = 32;
const MAX_VOUCHER_LEN: usize = 50;

/// Rejects malformed checkout input before any row is locked.
pub fn validate_order_request(payload: &CreateOrderRequest) -> AppResult<()> {
    let name = payload.customer_name.trim();
    if name.is_empty() {
        return Err(AppError::validation("customer_name", "Name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation("customer_name", "Name is too long"));
    }

    let whatsapp = payload.customer_whatsapp.trim();
    if whatsapp.is_empty() {
        return Err(AppError::validation("customer_whatsapp", "WhatsApp number is required"));
    }
    if whatsapp.chars().count() > MAX_WHATSAPP_LEN {
        return Err(AppError::validation("customer_whatsapp", "WhatsApp number is too long"));
    }

    if let Some(code) = &payload.voucher_code {
        if code.trim().chars().count() > MAX_VOUCHER_LEN {
            return Err(AppError::validation("voucher_code", "Voucher code is too long"));
        }
    }

    if payload.items.is_empty() {
        return Err(AppError::validation("items", "At least one item is required"));
    }
    let mut seen = HashSet::new();
    for (i, item) in payload.items.iter().enumerate() {
        if item.qty < 1 {
            return Err(AppError::validation(
                format!("items.{i}.qty"),
                "Quantity must be at least 1",
            ));
        }
        if !seen.insert(item.product_id) {
            return Err(AppError::validation(
                format!("items.{i}.product_id"),
                "Each product may appear only once",
            ));
        }
    }
    Ok(())
}

struct PricedLine {
    product_id: Uuid,
    name: String,
    qty: i32,
    unit_price: i64,
    line_total: i64,
    use_flash: bool,
}

/// Places an order in one transaction: prices every line against locked
/// product rows, applies the voucher, persists the order and its snapshots
/// and, in checkout reservation mode, takes the units out of stock.
pub async fn place_order(
    state: &AppState,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderPlaced>> {
    validate_order_request(&payload)?;
    let customer_name = payload.customer_name.trim().to_string();
    let customer_whatsapp = payload.customer_whatsapp.trim().to_string();
    let voucher_code = payload
        .voucher_code
        .as_deref()
        .map(voucher::normalize_code)
        .filter(|code| !code.is_empty());
    let reserve_now = state.config.reservation == ReservationMode::Checkout;
    let now = Utc::now();

    let txn = state.orm.begin().await?;
    set_lock_timeout(&txn, state.config.lock_timeout_ms).await?;

    let ids: Vec<Uuid> = payload.items.iter().map(|item| item.product_id).collect();
    let mut products = inventory::lock_products(&txn, &ids, true).await?;
    if products.len() != ids.len() {
        return Err(RuleViolation::InvalidItems.into());
    }

    let mut lines = Vec::with_capacity(payload.items.len());
    let mut subtotal: i64 = 0;
    for item in &payload.items {
        let product = match products.get(&item.product_id) {
            Some(p) => p,
            None => return Err(RuleViolation::InvalidItems.into()),
        };
        let use_flash =
            item.is_flash_sale.unwrap_or(false) && pricing::is_flash_sale_window(product, now);

        inventory::check_stock(product, item.qty)?;
        if use_flash {
            inventory::check_flash_stock(product, item.qty)?;
            if product.max_qty_per_customer.is_some() {
                let prior = inventory::per_customer_flash_usage(
                    &txn,
                    &customer_whatsapp,
                    product.id,
                    None,
                )
                .await?;
                inventory::check_customer_limit(product, item.qty, prior)?;
            }
        }

        let unit_price = pricing::resolve_unit_price(product, use_flash);
        let line_total = unit_price
            .checked_mul(i64::from(item.qty))
            .ok_or_else(|| AppError::validation("items", "Order total is too large"))?;
        subtotal = subtotal
            .checked_add(line_total)
            .ok_or_else(|| AppError::validation("items", "Order total is too large"))?;

        lines.push(PricedLine {
            product_id: product.id,
            name: product.name.clone(),
            qty: item.qty,
            unit_price,
            line_total,
            use_flash,
        });
    }

    let quote = match &voucher_code {
        Some(code) => Some(voucher::validate_and_price(&txn, code, subtotal, now, true).await?),
        None => None,
    };
    let voucher_discount = quote.as_ref().map_or(0, |q| q.discount);
    let total_amount = (subtotal - voucher_discount).max(0);

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        order_code: Set(None),
        customer_name: Set(customer_name),
        customer_whatsapp: Set(customer_whatsapp),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::PendingPayment.to_string()),
        voucher_code: Set(quote.as_ref().map(|q| q.voucher.code.clone())),
        voucher_discount: Set(voucher_discount),
        notes: Set(None),
        payment_proof_url: Set(None),
        payment_proof_uploaded_at: Set(None),
        stock_reserved_at: Set(reserve_now.then(|| now.into())),
        stock_restored_at: Set(None),
        fulfillment_account: Set(None),
        fulfillment_email: Set(None),
        fulfillment_password: Set(None),
        fulfillment_link: Set(None),
        fulfillment_notes: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    for line in &lines {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            product_name_snapshot: Set(line.name.clone()),
            unit_price: Set(line.unit_price),
            qty: Set(line.qty),
            line_total: Set(line.line_total),
            is_flash_sale: Set(line.use_flash),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
    }

    if let Some(quote) = &quote {
        voucher::consume(&txn, &quote.voucher).await?;
    }

    if reserve_now {
        for line in &lines {
            let product = match products.get_mut(&line.product_id) {
                Some(p) => p,
                None => return Err(RuleViolation::InvalidItems.into()),
            };
            inventory::reserve_stock(&txn, product, line.qty).await?;
            if line.use_flash {
                inventory::reserve_flash_stock(&txn, product, line.qty).await?;
            }
        }
    }

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        total_amount = order.total_amount,
        voucher = order.voucher_code.as_deref().unwrap_or("-"),
        reserved = reserve_now,
        "order placed"
    );

    Ok(ApiResponse::success(
        "Order created",
        OrderPlaced {
            order_id: order.id,
            status: order.status,
            total_amount: order.total_amount,
            voucher_discount: order.voucher_discount,
            voucher_code: order.voucher_code,
        },
        Some(Meta::empty()),
    ))
}

/// Finds an order by UUID or, failing that, by its order code.
pub async fn find_order<C: ConnectionTrait>(conn: &C, id_or_code: &str) -> AppResult<OrderModel> {
    let key = id_or_code.trim();
    let order = match Uuid::parse_str(key) {
        Ok(id) => Orders::find_by_id(id).one(conn).await?,
        Err(_) => {
            Orders::find()
                .filter(OrderCol::OrderCode.eq(key.to_uppercase()))
                .one(conn)
                .await?
        }
    };
    match order {
        Some(o) => Ok(o),
        None => Err(AppError::NotFound),
    }
}

pub async fn load_with_items<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderWithItems> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .order_by_asc(OrderItemCol::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(OrderWithItems {
        order: order.into(),
        items,
    })
}

pub async fn get_order(
    state: &AppState,
    id_or_code: &str,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_order(&state.orm, id_or_code).await?;
    let data = load_with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}
