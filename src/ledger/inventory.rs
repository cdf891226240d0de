use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, RelationTrait, Set,
};
use sea_orm::sea_query::{Expr, LockType};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    entity::{
        order_items::{self, Column as OrderItemCol, Entity as OrderItems},
        orders::{self, ActiveModel as OrderActive, Column as OrderCol},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppResult, RuleViolation},
    models::OrderStatus,
};

/// Flash-sale units still available, or `None` when the quota is unlimited.
pub fn remaining_flash_stock(product: &ProductModel) -> Option<i32> {
    product
        .flash_sale_stock
        .map(|quota| (quota - product.flash_sale_sold).max(0))
}

pub fn check_stock(product: &ProductModel, qty: i32) -> Result<(), RuleViolation> {
    match product.stock {
        Some(stock) if stock < qty => Err(RuleViolation::InsufficientStock {
            product: product.name.clone(),
        }),
        _ => Ok(()),
    }
}

pub fn check_flash_stock(product: &ProductModel, qty: i32) -> Result<(), RuleViolation> {
    match remaining_flash_stock(product) {
        Some(remaining) if remaining < qty => Err(RuleViolation::InsufficientFlashStock {
            product: product.name.clone(),
        }),
        _ => Ok(()),
    }
}

/// Checks `prior + qty` against the product's per-customer flash cap.
pub fn check_customer_limit(
    product: &ProductModel,
    qty: i32,
    prior: i64,
) -> Result<(), RuleViolation> {
    match product.max_qty_per_customer {
        Some(limit) if prior + i64::from(qty) > i64::from(limit) => {
            Err(RuleViolation::PerCustomerLimitExceeded {
                product: product.name.clone(),
                limit,
            })
        }
        _ => Ok(()),
    }
}

/// Loads and row-locks products in ascending id order.
///
/// Every transaction that touches several products goes through here so the
/// lock acquisition order is the same everywhere.
pub async fn lock_products<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
    active_only: bool,
) -> Result<HashMap<Uuid, ProductModel>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Products::find()
        .filter(ProdCol::Id.is_in(ids.to_vec()))
        .apply_if(active_only.then_some(true), |query, active| {
            query.filter(ProdCol::IsActive.eq(active))
        })
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|p| (p.id, p)).collect())
}

/// Takes `qty` units off a locked product. Unlimited stock is left alone.
pub async fn reserve_stock<C: ConnectionTrait>(
    conn: &C,
    product: &mut ProductModel,
    qty: i32,
) -> AppResult<()> {
    check_stock(product, qty)?;
    let Some(stock) = product.stock else {
        return Ok(());
    };

    Products::update_many()
        .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(qty))
        .col_expr(ProdCol::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(ProdCol::Id.eq(product.id))
        .exec(conn)
        .await?;
    product.stock = Some(stock - qty);
    Ok(())
}

/// Counts `qty` units against a locked product's flash-sale quota.
/// Regular stock is not touched.
pub async fn reserve_flash_stock<C: ConnectionTrait>(
    conn: &C,
    product: &mut ProductModel,
    qty: i32,
) -> AppResult<()> {
    check_flash_stock(product, qty)?;

    Products::update_many()
        .col_expr(
            ProdCol::FlashSaleSold,
            Expr::col(ProdCol::FlashSaleSold).add(qty),
        )
        .filter(ProdCol::Id.eq(product.id))
        .exec(conn)
        .await?;
    product.flash_sale_sold += qty;
    Ok(())
}

/// Flash-sale units this customer already holds for `product_id`.
///
/// Only orders with a submitted proof count, and payments that were rejected
/// or refunded are left out.
pub async fn per_customer_flash_usage<C: ConnectionTrait>(
    conn: &C,
    customer_whatsapp: &str,
    product_id: Uuid,
    exclude_order: Option<Uuid>,
) -> Result<i64, DbErr> {
    let released = [
        OrderStatus::InvalidPayment.as_str(),
        OrderStatus::Refund.as_str(),
    ];
    let total = OrderItems::find()
        .select_only()
        .column_as(
            Expr::col((order_items::Entity, OrderItemCol::Qty)).sum(),
            "total",
        )
        .join(JoinType::InnerJoin, order_items::Relation::Orders.def())
        .filter(OrderItemCol::ProductId.eq(product_id))
        .filter(OrderItemCol::IsFlashSale.eq(true))
        .filter(OrderCol::CustomerWhatsapp.eq(customer_whatsapp))
        .filter(OrderCol::PaymentProofUploadedAt.is_not_null())
        .filter(OrderCol::Status.is_not_in(released))
        .apply_if(exclude_order, |query, id| query.filter(OrderCol::Id.ne(id)))
        .into_tuple::<Option<i64>>()
        .one(conn)
        .await?;
    Ok(total.flatten().unwrap_or(0))
}

/// Gives an order's reserved units back to stock and flash quota.
///
/// The caller must hold the order row lock. The first call stamps
/// `stock_restored_at`; later calls return the order unchanged. Orders that
/// never reserved stock are only stamped.
pub async fn restore_stock<C: ConnectionTrait>(
    conn: &C,
    order: orders::Model,
    now: DateTime<Utc>,
) -> AppResult<orders::Model> {
    if order.stock_restored_at.is_some() {
        return Ok(order);
    }

    if order.stock_reserved_at.is_some() {
        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order.id))
            .all(conn)
            .await?;
        let ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
        let products = lock_products(conn, &ids, false).await?;

        for item in &items {
            // deleted products have nothing to give back
            let Some(product) = products.get(&item.product_id) else {
                continue;
            };
            let mut update = Products::update_many().filter(ProdCol::Id.eq(product.id));
            if product.stock.is_some() {
                update = update.col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.qty));
            }
            if item.is_flash_sale {
                let sold = (product.flash_sale_sold - item.qty).max(0);
                update = update.col_expr(ProdCol::FlashSaleSold, Expr::value(sold));
            }
            if product.stock.is_some() || item.is_flash_sale {
                update.exec(conn).await?;
            }
        }
        tracing::info!(order_id = %order.id, items = items.len(), "stock restored");
    }

    let mut active: OrderActive = order.into();
    active.stock_restored_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    Ok(active.update(conn).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::tests::product;

    #[test]
    fn flash_remaining_never_goes_negative() {
        let mut p = product(10000);
        assert_eq!(remaining_flash_stock(&p), None);

        p.flash_sale_stock = Some(5);
        p.flash_sale_sold = 3;
        assert_eq!(remaining_flash_stock(&p), Some(2));

        p.flash_sale_sold = 9;
        assert_eq!(remaining_flash_stock(&p), Some(0));
    }

    #[test]
    fn unlimited_stock_always_passes() {
        let p = product(10000);
        assert_eq!(check_stock(&p, 1_000_000), Ok(()));
        assert_eq!(check_flash_stock(&p, 1_000_000), Ok(()));
    }

    #[test]
    fn stock_check_names_the_product() {
        let mut p = product(10000);
        p.stock = Some(1);
        assert_eq!(check_stock(&p, 1), Ok(()));
        assert_eq!(
            check_stock(&p, 2),
            Err(RuleViolation::InsufficientStock {
                product: "Spotify Premium".into()
            })
        );
    }

    #[test]
    fn flash_quota_check_uses_remaining_units() {
        let mut p = product(10000);
        p.flash_sale_stock = Some(3);
        p.flash_sale_sold = 2;
        assert_eq!(check_flash_stock(&p, 1), Ok(()));
        assert!(matches!(
            check_flash_stock(&p, 2),
            Err(RuleViolation::InsufficientFlashStock { .. })
        ));
    }

    #[test]
    fn customer_limit_counts_prior_purchases() {
        let mut p = product(10000);
        assert_eq!(check_customer_limit(&p, 50, 50), Ok(()));

        p.max_qty_per_customer = Some(2);
        assert_eq!(check_customer_limit(&p, 2, 0), Ok(()));
        assert_eq!(check_customer_limit(&p, 1, 1), Ok(()));
        assert_eq!(
            check_customer_limit(&p, 1, 2),
            Err(RuleViolation::PerCustomerLimitExceeded {
                product: "Spotify Premium".into(),
                limit: 2
            })
        );
    }
}
