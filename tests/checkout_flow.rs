mod common;

use chrono::Utc;
use common::{insert_product, insert_voucher, new_product, new_voucher, order_request, place, rule_of};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use storefront_api::{
    config::ReservationMode,
    entity::{order_items, orders},
    error::RuleViolation,
    models::OrderStatus,
    services::order_service,
};

#[tokio::test]
async fn checkout_prices_lines_and_reserves_stock() -> anyhow::Result<()> {
    let Some(app) = common::setup(ReservationMode::Checkout).await? else {
        return Ok(());
    };
    let limited = insert_product(&app, new_product(50_000, Some(1))).await;
    let mut discounted = new_product(55_000, None);
    discounted.discount_type = Set(Some("FIXED".into()));
    discounted.discount_value = Set(6_000);
    let unlimited = insert_product(&app, discounted).await;

    let wa = common::whatsapp();
    let placed = place(
        &app,
        order_request(&wa, &[(limited.id, 1, false), (unlimited.id, 1, false)], None),
    )
    .await;

    assert_eq!(placed.total_amount, 99_000);
    assert_eq!(placed.status, OrderStatus::PendingPayment.as_str());
    assert_eq!(placed.voucher_discount, 0);

    let order = common::load_order(&app, placed.order_id).await;
    assert!(order.stock_reserved_at.is_some());
    assert!(order.order_code.is_none());

    let lines = order_items::Entity::find()
        .filter(order_items::Column::OrderId.eq(order.id))
        .all(&app.state.orm)
        .await?;
    assert_eq!(lines.len(), 2);
    let sum: i64 = lines.iter().map(|l| l.line_total).sum();
    assert_eq!(sum, 99_000);

    assert_eq!(app.product(limited.id).await.stock, Some(0));
    assert_eq!(app.product(unlimited.id).await.stock, None);
    Ok(())
}

#[tokio::test]
async fn discounted_lines_with_percent_voucher_total_ninety_nine_thousand() -> anyhow::Result<()> {
    let Some(app) = common::setup(ReservationMode::Checkout).await? else {
        return Ok(());
    };
    let mut product = new_product(60_000, Some(10));
    product.discount_type = Set(Some("FIXED".into()));
    product.discount_value = Set(5_000);
    let product = insert_product(&app, product).await;
    let mut voucher = new_voucher("PERCENT", 10);
    voucher.max_discount = Set(Some(20_000));
    voucher.min_order = Set(Some(50_000));
    voucher.usage_limit = Set(Some(100));
    let voucher = insert_voucher(&app, voucher).await;

    let placed = place(
        &app,
        order_request(
            &common::whatsapp(),
            &[(product.id, 2, false)],
            Some(&voucher.code.to_lowercase()),
        ),
    )
    .await;

    assert_eq!(placed.voucher_discount, 11_000);
    assert_eq!(placed.total_amount, 99_000);
    assert_eq!(placed.voucher_code.as_deref(), Some(voucher.code.as_str()));
    assert_eq!(app.voucher(voucher.id).await.used_count, 1);

    let lines = order_items::Entity::find()
        .filter(order_items::Column::OrderId.eq(placed.order_id))
        .all(&app.state.orm)
        .await?;
    assert_eq!((lines[0].unit_price, lines[0].line_total), (55_000, 110_000));
    Ok(())
}

#[tokio::test]
async fn voucher_discount_is_capped() -> anyhow::Result<()> {
    let Some(app) = common::setup(ReservationMode::Checkout).await? else {
        return Ok(());
    };
    let product = insert_product(&app, new_product(150_000, Some(10))).await;
    let mut voucher = new_voucher("PERCENT", 10);
    voucher.max_discount = Set(Some(12_000));
    let voucher = insert_voucher(&app, voucher).await;

    let placed = place(
        &app,
        order_request(&common::whatsapp(), &[(product.id, 1, false)], Some(&voucher.code)),
    )
    .await;

    assert_eq!(placed.voucher_discount, 12_000);
    assert_eq!(placed.total_amount, 138_000);
    Ok(())
}

#[tokio::test]
async fn insufficient_stock_rejects_the_whole_order() -> anyhow::Result<()> {
    let Some(app) = common::setup(ReservationMode::Checkout).await? else {
        return Ok(());
    };
    let plenty = insert_product(&app, new_product(10_000, Some(50))).await;
    let scarce = insert_product(&app, new_product(20_000, Some(1))).await;
    let wa = common::whatsapp();

    let rule = rule_of(
        order_service::place_order(
            &app.state,
            order_request(&wa, &[(plenty.id, 3, false), (scarce.id, 2, false)], None),
        )
        .await,
    );
    assert!(matches!(rule, RuleViolation::InsufficientStock { ref product } if *product == scarce.name));

    assert_eq!(app.product(plenty.id).await.stock, Some(50));
    assert_eq!(app.product(scarce.id).await.stock, Some(1));
    let orders_for_customer = orders::Entity::find()
        .filter(orders::Column::CustomerWhatsapp.eq(wa.as_str()))
        .count(&app.state.orm)
        .await?;
    assert_eq!(orders_for_customer, 0);
    Ok(())
}

#[tokio::test]
async fn expired_voucher_fails_and_retry_without_it_succeeds() -> anyhow::Result<()> {
    let Some(app) = common::setup(ReservationMode::Checkout).await? else {
        return Ok(());
    };
    let product = insert_product(&app, new_product(40_000, Some(3))).await;
    let mut voucher = new_voucher("FIXED", 5_000);
    voucher.ends_at = Set(Some((Utc::now() - chrono::Duration::days(1)).into()));
    let voucher = insert_voucher(&app, voucher).await;
    let wa = common::whatsapp();

    let rule = rule_of(
        order_service::place_order(
            &app.state,
            order_request(&wa, &[(product.id, 1, false)], Some(&voucher.code)),
        )
        .await,
    );
    assert_eq!(rule, RuleViolation::VoucherExpired);
    assert_eq!(app.product(product.id).await.stock, Some(3));
    assert_eq!(app.voucher(voucher.id).await.used_count, 0);

    let placed = place(&app, order_request(&wa, &[(product.id, 1, false)], None)).await;
    assert_eq!(placed.total_amount, 40_000);
    assert_eq!(app.product(product.id).await.stock, Some(2));
    Ok(())
}

#[tokio::test]
async fn voucher_usage_limit_is_enforced() -> anyhow::Result<()> {
    let Some(app) = common::setup(ReservationMode::Checkout).await? else {
        return Ok(());
    };
    let product = insert_product(&app, new_product(30_000, None)).await;
    let mut voucher = new_voucher("FIXED", 5_000);
    voucher.usage_limit = Set(Some(1));
    let voucher = insert_voucher(&app, voucher).await;

    place(
        &app,
        order_request(&common::whatsapp(), &[(product.id, 1, false)], Some(&voucher.code)),
    )
    .await;
    let rule = rule_of(
        order_service::place_order(
            &app.state,
            order_request(&common::whatsapp(), &[(product.id, 1, false)], Some(&voucher.code)),
        )
        .await,
    );
    assert_eq!(rule, RuleViolation::VoucherExhausted);
    assert_eq!(app.voucher(voucher.id).await.used_count, 1);
    Ok(())
}

#[tokio::test]
async fn inactive_or_unknown_products_are_invalid() -> anyhow::Result<()> {
    let Some(app) = common::setup(ReservationMode::Checkout).await? else {
        return Ok(());
    };
    let mut hidden = new_product(10_000, Some(5));
    hidden.is_active = Set(false);
    let hidden = insert_product(&app, hidden).await;

    let rule = rule_of(
        order_service::place_order(
            &app.state,
            order_request(&common::whatsapp(), &[(hidden.id, 1, false)], None),
        )
        .await,
    );
    assert_eq!(rule, RuleViolation::InvalidItems);

    let rule = rule_of(
        order_service::place_order(
            &app.state,
            order_request(&common::whatsapp(), &[(uuid::Uuid::new_v4(), 1, false)], None),
        )
        .await,
    );
    assert_eq!(rule, RuleViolation::InvalidItems);
    Ok(())
}

#[tokio::test]
async fn flash_sale_price_and_quota_apply_only_when_requested() -> anyhow::Result<()> {
    let Some(app) = common::setup(ReservationMode::Checkout).await? else {
        return Ok(());
    };
    let product = insert_product(
        &app,
        common::with_flash_sale(new_product(100_000, Some(10)), 50, 2),
    )
    .await;

    let regular = place(
        &app,
        order_request(&common::whatsapp(), &[(product.id, 1, false)], None),
    )
    .await;
    assert_eq!(regular.total_amount, 100_000);

    let flash = place(
        &app,
        order_request(&common::whatsapp(), &[(product.id, 2, true)], None),
    )
    .await;
    assert_eq!(flash.total_amount, 100_000);

    let after = app.product(product.id).await;
    assert_eq!(after.stock, Some(7));
    assert_eq!(after.flash_sale_sold, 2);

    let rule = rule_of(
        order_service::place_order(
            &app.state,
            order_request(&common::whatsapp(), &[(product.id, 1, true)], None),
        )
        .await,
    );
    assert!(matches!(rule, RuleViolation::InsufficientFlashStock { .. }));
    Ok(())
}
