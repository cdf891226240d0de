use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateOrderItem {
    pub product_id: Uuid,
    pub qty: i32,
    #[serde(default)]
    pub is_flash_sale: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub customer_whatsapp: String,
    #[serde(default)]
    pub voucher_code: Option<String>,
    pub items: Vec<CreateOrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderPlaced {
    pub order_id: Uuid,
    pub status: String,
    pub total_amount: i64,
    pub voucher_discount: i64,
    pub voucher_code: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProofAccepted {
    pub message: String,
    pub proof_url: String,
    pub order_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Admin edit of an order. Every field is optional; fulfillment fields are
/// only accepted when the order ends up `DELIVERED`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub notes: Option<String>,
    pub fulfillment_account: Option<String>,
    pub fulfillment_email: Option<String>,
    pub fulfillment_password: Option<String>,
    pub fulfillment_link: Option<String>,
    pub fulfillment_notes: Option<String>,
}

impl UpdateOrderRequest {
    pub fn has_fulfillment(&self) -> bool {
        [
            &self.fulfillment_account,
            &self.fulfillment_email,
            &self.fulfillment_password,
            &self.fulfillment_link,
            &self.fulfillment_notes,
        ]
        .iter()
        .any(|field| field.is_some())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderUpdated {
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
