use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    audit,
    db::set_lock_timeout,
    dto::vouchers::{ValidateVoucherRequest, VoucherList, VoucherPreview, VoucherRequest},
    entity::vouchers::{ActiveModel as VoucherActive, Column as VoucherCol, Entity as Vouchers},
    error::{AppError, AppResult},
    ledger::voucher,
    middleware::auth::AdminUser,
    models::{DiscountType, Voucher},
    response::{ApiResponse, Meta},
    routes::params::SearchQuery,
    state::AppState,
};

/// Prices a voucher against a cart subtotal without consuming it.
pub async fn preview(
    state: &AppState,
    payload: ValidateVoucherRequest,
) -> AppResult<ApiResponse<VoucherPreview>> {
    let code = voucher::normalize_code(&payload.code);
    if code.is_empty() {
        return Err(AppError::validation("code", "Voucher code is required"));
    }
    if code.chars().count() > 50 {
        return Err(AppError::validation("code", "Voucher code is too long"));
    }
    if payload.subtotal < 0 {
        return Err(AppError::validation("subtotal", "Subtotal must not be negative"));
    }

    let quote = voucher::validate_and_price(&state.orm, &code, payload.subtotal, Utc::now(), false)
        .await?;
    Ok(ApiResponse::success(
        "Voucher applied",
        VoucherPreview {
            code: quote.voucher.code,
            discount_amount: quote.discount,
            final_total: (payload.subtotal - quote.discount).max(0),
            label: quote.label,
        },
        Some(Meta::empty()),
    ))
}

/// Checks an admin voucher payload and returns it with the code normalized.
pub fn validate_request(mut payload: VoucherRequest) -> AppResult<VoucherRequest> {
    payload.code = voucher::normalize_code(&payload.code);
    if payload.code.is_empty() || payload.code.chars().count() > 50 {
        return Err(AppError::validation("code", "Code must be 1 to 50 characters"));
    }
    let kind = DiscountType::parse(Some(&payload.kind))
        .ok_or_else(|| AppError::validation("type", "Type must be PERCENT or FIXED"))?;
    if payload.value < 0 {
        return Err(AppError::validation("value", "Value must not be negative"));
    }
    if kind == DiscountType::Percent && payload.value > 100 {
        return Err(AppError::validation("value", "Percent value must be at most 100"));
    }
    if payload.max_discount.is_some_and(|v| v < 0) {
        return Err(AppError::validation("max_discount", "Must not be negative"));
    }
    if payload.min_order.is_some_and(|v| v < 0) {
        return Err(AppError::validation("min_order", "Must not be negative"));
    }
    if payload.usage_limit.is_some_and(|v| v < 1) {
        return Err(AppError::validation("usage_limit", "Must be at least 1"));
    }
    if let (Some(start), Some(end)) = (payload.starts_at, payload.ends_at) {
        if end < start {
            return Err(AppError::validation("ends_at", "End must not be before start"));
        }
    }
    // A zero cap or floor from the admin form means "none".
    payload.max_discount = payload.max_discount.filter(|v| *v > 0);
    payload.min_order = payload.min_order.filter(|v| *v > 0);
    payload.kind = kind.as_str().to_string();
    Ok(payload)
}

fn ensure_limit_covers_used(limit: Option<i32>, used: i32) -> AppResult<()> {
    if limit.is_some_and(|limit| limit < used) {
        return Err(AppError::validation(
            "usage_limit",
            format!("Must be at least the {used} uses already made"),
        ));
    }
    Ok(())
}

async fn ensure_code_free(state: &AppState, code: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut finder = Vouchers::find().filter(VoucherCol::Code.eq(code));
    if let Some(id) = except {
        finder = finder.filter(VoucherCol::Id.ne(id));
    }
    if finder.count(&state.orm).await? > 0 {
        return Err(AppError::validation("code", "Code is already used"));
    }
    Ok(())
}

pub async fn list_vouchers(
    state: &AppState,
    query: SearchQuery,
) -> AppResult<ApiResponse<VoucherList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(VoucherCol::Code).ilike(format!("%{search}%")));
    }

    let finder = Vouchers::find()
        .filter(condition)
        .order_by_desc(VoucherCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Voucher::from)
        .collect();

    Ok(ApiResponse::success(
        "Vouchers",
        VoucherList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_voucher(
    state: &AppState,
    admin: &AdminUser,
    payload: VoucherRequest,
) -> AppResult<ApiResponse<Voucher>> {
    let payload = validate_request(payload)?;
    ensure_code_free(state, &payload.code, None).await?;

    let now = Utc::now();
    let created = VoucherActive {
        id: Set(Uuid::new_v4()),
        code: Set(payload.code),
        kind: Set(payload.kind),
        value: Set(payload.value),
        max_discount: Set(payload.max_discount),
        min_order: Set(payload.min_order),
        usage_limit: Set(payload.usage_limit),
        used_count: Set(0),
        starts_at: Set(payload.starts_at.map(Into::into)),
        ends_at: Set(payload.ends_at.map(Into::into)),
        is_active: Set(payload.is_active),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        admin.user_id,
        "voucher_create",
        "vouchers",
        serde_json::json!({ "voucher_id": created.id, "code": created.code }),
    )
    .await;

    Ok(ApiResponse::success("Voucher created", created.into(), Some(Meta::empty())))
}

pub async fn update_voucher(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
    payload: VoucherRequest,
) -> AppResult<ApiResponse<Voucher>> {
    let payload = validate_request(payload)?;
    ensure_code_free(state, &payload.code, Some(id)).await?;

    let txn = state.orm.begin().await?;
    set_lock_timeout(&txn, state.config.lock_timeout_ms).await?;
    let existing = Vouchers::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let existing = match existing {
        Some(v) => v,
        None => return Err(AppError::NotFound),
    };
    ensure_limit_covers_used(payload.usage_limit, existing.used_count)?;

    let mut active: VoucherActive = existing.into();
    active.code = Set(payload.code);
    active.kind = Set(payload.kind);
    active.value = Set(payload.value);
    active.max_discount = Set(payload.max_discount);
    active.min_order = Set(payload.min_order);
    active.usage_limit = Set(payload.usage_limit);
    active.starts_at = Set(payload.starts_at.map(Into::into));
    active.ends_at = Set(payload.ends_at.map(Into::into));
    active.is_active = Set(payload.is_active);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        admin.user_id,
        "voucher_update",
        "vouchers",
        serde_json::json!({ "voucher_id": updated.id }),
    )
    .await;

    Ok(ApiResponse::success("Voucher updated", updated.into(), Some(Meta::empty())))
}

pub async fn delete_voucher(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Vouchers::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        admin.user_id,
        "voucher_delete",
        "vouchers",
        serde_json::json!({ "voucher_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Voucher deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> VoucherRequest {
        VoucherRequest {
            code: " hemat20 ".into(),
            kind: "PERCENT".into(),
            value: 20,
            max_discount: Some(0),
            min_order: Some(0),
            usage_limit: None,
            starts_at: None,
            ends_at: None,
            is_active: true,
        }
    }

    #[test]
    fn normalizes_code_and_zero_limits() {
        let checked = validate_request(request()).unwrap();
        assert_eq!(checked.code, "HEMAT20");
        assert_eq!(checked.max_discount, None);
        assert_eq!(checked.min_order, None);
    }

    #[test]
    fn rejects_unknown_type_and_inverted_window() {
        let mut bad = request();
        bad.kind = "BOGO".into();
        assert!(validate_request(bad).is_err());

        let mut bad = request();
        let now = Utc::now();
        bad.starts_at = Some(now);
        bad.ends_at = Some(now - chrono::Duration::days(1));
        assert!(validate_request(bad).is_err());
    }

    #[test]
    fn usage_limit_cannot_drop_below_uses() {
        assert!(ensure_limit_covers_used(Some(2), 2).is_ok());
        assert!(ensure_limit_covers_used(None, 40).is_ok());
        assert!(matches!(
            ensure_limit_covers_used(Some(1), 2),
            Err(AppError::Validation { ref field, .. }) if field == "usage_limit"
        ));
    }

    #[test]
    fn percent_value_is_capped_at_hundred() {
        let mut bad = request();
        bad.value = 150;
        assert!(validate_request(bad).is_err());
    }
}
