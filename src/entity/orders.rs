use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_code: Option<String>,
    pub customer_name: String,
    pub customer_whatsapp: String,
    pub total_amount: i64,
    pub status: String,
    pub voucher_code: Option<String>,
    pub voucher_discount: i64,
    pub notes: Option<String>,
    pub payment_proof_url: Option<String>,
    pub payment_proof_uploaded_at: Option<DateTimeWithTimeZone>,
    pub stock_reserved_at: Option<DateTimeWithTimeZone>,
    pub stock_restored_at: Option<DateTimeWithTimeZone>,
    pub fulfillment_account: Option<String>,
    pub fulfillment_email: Option<String>,
    pub fulfillment_password: Option<String>,
    pub fulfillment_link: Option<String>,
    pub fulfillment_notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
