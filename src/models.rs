use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{order_items, orders, products, site_settings, stocks, users, vouchers},
    error::RuleViolation,
    ledger::inventory,
    pricing,
    storage::normalize_media_url,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscountType {
    Percent,
    Fixed,
}

impl DiscountType {
    /// Unknown or missing values mean "no discount".
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value?.trim() {
            "PERCENT" => Some(Self::Percent),
            "FIXED" => Some(Self::Fixed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percent => "PERCENT",
            DiscountType::Fixed => "FIXED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingPayment,
    Paid,
    Delivered,
    InvalidPayment,
    Refund,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::PendingPayment,
        OrderStatus::Paid,
        OrderStatus::Delivered,
        OrderStatus::InvalidPayment,
        OrderStatus::Refund,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "PENDING_PAYMENT",
            OrderStatus::Paid => "PAID",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::InvalidPayment => "INVALID_PAYMENT",
            OrderStatus::Refund => "REFUND",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::PendingPayment | OrderStatus::Paid)
    }

    /// Re-setting the current status is always allowed; terminal states
    /// accept nothing else.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        if *self == target {
            return true;
        }
        match self {
            OrderStatus::PendingPayment => matches!(
                target,
                OrderStatus::Paid
                    | OrderStatus::InvalidPayment
                    | OrderStatus::Refund
                    | OrderStatus::Cancelled
            ),
            OrderStatus::Paid => matches!(
                target,
                OrderStatus::Delivered
                    | OrderStatus::InvalidPayment
                    | OrderStatus::Refund
                    | OrderStatus::Cancelled
            ),
            _ => false,
        }
    }

    /// Entering this status gives reserved inventory back.
    pub fn restores_stock(&self) -> bool {
        matches!(
            self,
            OrderStatus::InvalidPayment | OrderStatus::Refund | OrderStatus::Cancelled
        )
    }

    /// Entering this status sends the customer a WhatsApp update.
    pub fn notifies_customer(&self) -> bool {
        matches!(
            self,
            OrderStatus::Paid
                | OrderStatus::Delivered
                | OrderStatus::InvalidPayment
                | OrderStatus::Refund
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = RuleViolation;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value.trim())
            .ok_or(RuleViolation::InvalidStatus)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: i64,
    /// Price after the regular discount, or the flash price while the sale is live.
    pub final_price: i64,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub duration: Option<String>,
    pub warranty: Option<String>,
    pub product_images: Vec<String>,
    pub discount_type: Option<String>,
    pub discount_value: i64,
    pub stock: Option<i32>,
    pub flash_sale_active: bool,
    pub flash_sale_live: bool,
    pub flash_sale_discount_type: Option<String>,
    pub flash_sale_discount_value: Option<i64>,
    pub flash_sale_start_at: Option<DateTime<Utc>>,
    pub flash_sale_end_at: Option<DateTime<Utc>>,
    pub flash_sale_stock: Option<i32>,
    pub flash_sale_sold: i32,
    pub flash_sale_remaining: Option<i32>,
    pub max_qty_per_customer: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn from_entity(model: products::Model, public_url: &str, now: DateTime<Utc>) -> Self {
        let flash_sale_live = pricing::is_flash_sale_window(&model, now);
        let final_price = pricing::resolve_unit_price(&model, flash_sale_live);
        let flash_sale_remaining = inventory::remaining_flash_stock(&model);
        let product_images = model
            .product_images
            .as_ref()
            .and_then(|value| value.as_array())
            .map(|images| {
                images
                    .iter()
                    .filter_map(|image| image.as_str())
                    .filter_map(|image| normalize_media_url(Some(image), public_url))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: model.id,
            image_url: normalize_media_url(model.image_url.as_deref(), public_url),
            name: model.name,
            slug: model.slug,
            description: model.description,
            price: model.price,
            final_price,
            category: model.category,
            duration: model.duration,
            warranty: model.warranty,
            product_images,
            discount_type: model.discount_type,
            discount_value: model.discount_value,
            stock: model.stock,
            flash_sale_active: model.flash_sale_active,
            flash_sale_live,
            flash_sale_discount_type: model.flash_sale_discount_type,
            flash_sale_discount_value: model.flash_sale_discount_value,
            flash_sale_start_at: model.flash_sale_start_at.map(|dt| dt.with_timezone(&Utc)),
            flash_sale_end_at: model.flash_sale_end_at.map(|dt| dt.with_timezone(&Utc)),
            flash_sale_stock: model.flash_sale_stock,
            flash_sale_sold: model.flash_sale_sold,
            flash_sale_remaining,
            max_qty_per_customer: model.max_qty_per_customer,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Voucher {
    pub id: Uuid,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: i64,
    pub max_discount: Option<i64>,
    pub min_order: Option<i64>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<vouchers::Model> for Voucher {
    fn from(model: vouchers::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            kind: model.kind,
            value: model.value,
            max_discount: model.max_discount,
            min_order: model.min_order,
            usage_limit: model.usage_limit,
            used_count: model.used_count,
            starts_at: model.starts_at.map(|dt| dt.with_timezone(&Utc)),
            ends_at: model.ends_at.map(|dt| dt.with_timezone(&Utc)),
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_code: Option<String>,
    pub customer_name: String,
    pub customer_whatsapp: String,
    pub total_amount: i64,
    pub status: String,
    pub voucher_code: Option<String>,
    pub voucher_discount: i64,
    pub notes: Option<String>,
    pub payment_proof_url: Option<String>,
    pub payment_proof_uploaded_at: Option<DateTime<Utc>>,
    pub stock_reserved_at: Option<DateTime<Utc>>,
    pub stock_restored_at: Option<DateTime<Utc>>,
    pub fulfillment_account: Option<String>,
    pub fulfillment_email: Option<String>,
    pub fulfillment_password: Option<String>,
    pub fulfillment_link: Option<String>,
    pub fulfillment_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            order_code: model.order_code,
            customer_name: model.customer_name,
            customer_whatsapp: model.customer_whatsapp,
            total_amount: model.total_amount,
            status: model.status,
            voucher_code: model.voucher_code,
            voucher_discount: model.voucher_discount,
            notes: model.notes,
            payment_proof_url: model.payment_proof_url,
            payment_proof_uploaded_at: model
                .payment_proof_uploaded_at
                .map(|dt| dt.with_timezone(&Utc)),
            stock_reserved_at: model.stock_reserved_at.map(|dt| dt.with_timezone(&Utc)),
            stock_restored_at: model.stock_restored_at.map(|dt| dt.with_timezone(&Utc)),
            fulfillment_account: model.fulfillment_account,
            fulfillment_email: model.fulfillment_email,
            fulfillment_password: model.fulfillment_password,
            fulfillment_link: model.fulfillment_link,
            fulfillment_notes: model.fulfillment_notes,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name_snapshot: String,
    pub unit_price: i64,
    pub qty: i32,
    pub line_total: i64,
    pub is_flash_sale: bool,
    pub created_at: DateTime<Utc>,
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_name_snapshot: model.product_name_snapshot,
            unit_price: model.unit_price,
            qty: model.qty,
            line_total: model.line_total,
            is_flash_sale: model.is_flash_sale,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Stock {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: Option<String>,
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
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stock {
    pub fn from_entity(model: stocks::Model, product: Option<&products::Model>) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            product_name: product.map(|p| p.name.clone()),
            name: model.name,
            account: model.account,
            username: model.username,
            password: model.password,
            link: model.link,
            description: model.description,
            active_date: model.active_date,
            end_date: model.end_date,
            duration: model.duration,
            warranty: model.warranty,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SiteSetting {
    pub store_name: Option<String>,
    pub store_tagline: Option<String>,
    pub logo_url: Option<String>,
    pub qris_url: Option<String>,
    pub admin_whatsapp: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl SiteSetting {
    pub fn from_entity(model: site_settings::Model, public_url: &str) -> Self {
        Self {
            store_name: model.store_name,
            store_tagline: model.store_tagline,
            logo_url: normalize_media_url(model.logo_url.as_deref(), public_url),
            qris_url: normalize_media_url(model.qris_url.as_deref(), public_url),
            admin_whatsapp: model.admin_whatsapp,
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
