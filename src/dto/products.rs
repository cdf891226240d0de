use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Product;

/// Create/update payload. Updates replace every field, as the admin form
/// always posts the full product.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub duration: Option<String>,
    pub warranty: Option<String>,
    #[serde(default)]
    pub product_images: Vec<String>,
    pub discount_type: Option<String>,
    pub discount_value: Option<i64>,
    pub stock: Option<i32>,
    #[serde(default)]
    pub flash_sale_active: bool,
    pub flash_sale_discount_type: Option<String>,
    pub flash_sale_discount_value: Option<i64>,
    pub flash_sale_start_at: Option<DateTime<Utc>>,
    pub flash_sale_end_at: Option<DateTime<Utc>>,
    pub flash_sale_stock: Option<i32>,
    pub max_qty_per_customer: Option<i32>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductRemoved {
    /// `deleted` or `deactivated` when order history still references it.
    pub action: String,
}
