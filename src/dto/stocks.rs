use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Stock;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StockRequest {
    pub product_id: Option<Uuid>,
    pub name: String,
    pub account: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub active_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration: String,
    pub warranty: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockList {
    pub items: Vec<Stock>,
}
