use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: i64,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub duration: Option<String>,
    pub warranty: Option<String>,
    pub product_images: Option<Json>,
    pub discount_type: Option<String>,
    pub discount_value: i64,
    pub stock: Option<i32>,
    pub flash_sale_active: bool,
    pub flash_sale_discount_type: Option<String>,
    pub flash_sale_discount_value: Option<i64>,
    pub flash_sale_start_at: Option<DateTimeWithTimeZone>,
    pub flash_sale_end_at: Option<DateTimeWithTimeZone>,
    pub flash_sale_stock: Option<i32>,
    pub flash_sale_sold: i32,
    pub max_qty_per_customer: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::stocks::Entity")]
    Stocks,
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::stocks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stocks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
