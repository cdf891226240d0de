//! Price computation for catalog items and vouchers.
//!
//! Everything here is pure: callers pass the row they already hold (usually
//! under a lock) together with the instant they consider "now".

use chrono::{DateTime, Utc};

use crate::{entity::products, models::DiscountType};

/// Unit price after a declarative discount rule.
///
/// A missing type, an unrecognized type or a non-positive value leaves the
/// price unchanged. The discount is clamped to `[0, price]`.
pub fn apply_discount(price: i64, kind: Option<&str>, value: Option<i64>) -> i64 {
    let (Some(kind), Some(value)) = (DiscountType::parse(kind), value) else {
        return price;
    };
    if value <= 0 {
        return price;
    }
    price - discount_amount(price, kind, value).clamp(0, price.max(0))
}

/// Raw discount for `base` before any clamping.
pub fn discount_amount(base: i64, kind: DiscountType, value: i64) -> i64 {
    match kind {
        DiscountType::Percent => percent_of(base, value),
        DiscountType::Fixed => value,
    }
}

/// `round(base * percent / 100)`, rounding half away from zero.
pub fn percent_of(base: i64, percent: i64) -> i64 {
    let scaled = i128::from(base) * i128::from(percent);
    let rounded = if scaled >= 0 {
        (scaled + 50) / 100
    } else {
        (scaled - 50) / 100
    };
    i64::try_from(rounded).unwrap_or(if rounded > 0 { i64::MAX } else { i64::MIN })
}

/// Price of one unit, using the flash-sale rule when `use_flash` is set.
pub fn resolve_unit_price(product: &products::Model, use_flash: bool) -> i64 {
    if use_flash {
        apply_discount(
            product.price,
            product.flash_sale_discount_type.as_deref(),
            product.flash_sale_discount_value,
        )
    } else {
        apply_discount(
            product.price,
            product.discount_type.as_deref(),
            Some(product.discount_value),
        )
    }
}

/// Whether flash pricing is live for `product` at `now`.
pub fn is_flash_sale_window(product: &products::Model, now: DateTime<Utc>) -> bool {
    if !product.flash_sale_active {
        return false;
    }
    if product.flash_sale_discount_type.is_none() || product.flash_sale_discount_value.is_none() {
        return false;
    }
    let started = product
        .flash_sale_start_at
        .is_none_or(|start| now >= start.with_timezone(&Utc));
    let not_ended = product
        .flash_sale_end_at
        .is_none_or(|end| now <= end.with_timezone(&Utc));
    started && not_ended
}

/// Human label for a discount rule, e.g. `Diskon 10%` or `Diskon Rp5.000`.
pub fn discount_label(kind: DiscountType, value: i64) -> String {
    match kind {
        DiscountType::Percent => format!("Diskon {value}%"),
        DiscountType::Fixed => format!("Diskon {}", format_rupiah(value)),
    }
}

/// Formats an amount the way the storefront shows it: `Rp110.000`.
pub fn format_rupiah(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-Rp{grouped}")
    } else {
        format!("Rp{grouped}")
    }
}
