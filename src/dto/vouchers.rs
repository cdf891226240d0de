use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Voucher;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateVoucherRequest {
    pub code: String,
    pub subtotal: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VoucherPreview {
    pub code: String,
    pub discount_amount: i64,
    pub final_total: i64,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VoucherRequest {
    pub code: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: i64,
    pub max_discount: Option<i64>,
    pub min_order: Option<i64>,
    pub usage_limit: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VoucherList {
    pub items: Vec<Voucher>,
}
