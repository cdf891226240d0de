use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use sea_orm::sea_query::{Expr, LockType};

use crate::{
    entity::vouchers::{Column as VoucherCol, Entity as Vouchers, Model as VoucherModel},
    error::{AppResult, RuleViolation},
    models::DiscountType,
    pricing,
};

/// A voucher that passed validation together with what it takes off.
#[derive(Debug, Clone)]
pub struct VoucherQuote {
    pub voucher: VoucherModel,
    pub discount: i64,
    pub label: String,
}

/// Voucher codes are matched case-insensitively and stored upper-case.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Discount `voucher` grants on `subtotal` at `now`.
///
/// Checks run in a fixed order so the customer always sees the first rule
/// that fails: active, started, not ended, minimum order, usage limit.
pub fn evaluate(
    voucher: &VoucherModel,
    subtotal: i64,
    now: DateTime<Utc>,
) -> Result<i64, RuleViolation> {
    if !voucher.is_active {
        return Err(RuleViolation::VoucherNotFound);
    }
    if voucher
        .starts_at
        .is_some_and(|start| now < start.with_timezone(&Utc))
    {
        return Err(RuleViolation::VoucherNotStarted);
    }
    if voucher
        .ends_at
        .is_some_and(|end| now > end.with_timezone(&Utc))
    {
        return Err(RuleViolation::VoucherExpired);
    }
    if let Some(min_order) = voucher.min_order {
        if subtotal < min_order {
            return Err(RuleViolation::VoucherMinOrderNotMet { min_order });
        }
    }
    if voucher
        .usage_limit
        .is_some_and(|limit| voucher.used_count >= limit)
    {
        return Err(RuleViolation::VoucherExhausted);
    }

    let Some(kind) = DiscountType::parse(Some(&voucher.kind)) else {
        return Ok(0);
    };
    let raw = pricing::discount_amount(subtotal, kind, voucher.value);
    let capped = match voucher.max_discount {
        Some(max) => raw.min(max),
        None => raw,
    };
    Ok(capped.clamp(0, subtotal.max(0)))
}

pub fn label(voucher: &VoucherModel) -> String {
    match DiscountType::parse(Some(&voucher.kind)) {
        Some(kind) => pricing::discount_label(kind, voucher.value),
        None => voucher.code.clone(),
    }
}

/// Looks up `code` and prices it against `subtotal`.
///
/// With `lock` set the voucher row stays locked until the caller's
/// transaction ends, so `used_count` cannot move underneath it.
pub async fn validate_and_price<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    subtotal: i64,
    now: DateTime<Utc>,
    lock: bool,
) -> AppResult<VoucherQuote> {
    let mut finder = Vouchers::find().filter(VoucherCol::Code.eq(normalize_code(code)));
    if lock {
        finder = finder.lock(LockType::Update);
    }
    let voucher = match finder.one(conn).await? {
        Some(v) => v,
        None => return Err(RuleViolation::VoucherNotFound.into()),
    };

    let discount = evaluate(&voucher, subtotal, now)?;
    Ok(VoucherQuote {
        label: label(&voucher),
        discount,
        voucher,
    })
}

/// Records one use of a voucher locked by [`validate_and_price`].
pub async fn consume<C: ConnectionTrait>(conn: &C, voucher: &VoucherModel) -> Result<(), DbErr> {
    Vouchers::update_many()
        .col_expr(VoucherCol::UsedCount, Expr::col(VoucherCol::UsedCount).add(1))
        .filter(VoucherCol::Id.eq(voucher.id))
        .exec(conn)
        .await?;
    Ok(())
}
