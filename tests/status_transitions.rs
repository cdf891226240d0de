mod common;

use common::{TestApp, insert_product, new_product, order_request, place, png_upload, rule_of};
use storefront_api::{
    config::ReservationMode,
    dto::orders::{OrderUpdated, UpdateOrderRequest},
    error::RuleViolation,
    middleware::auth::AdminUser,
    models::OrderStatus,
    services::{admin_service, payment_proof_service, product_service},
};
use uuid::Uuid;

fn to_status(status: OrderStatus) -> UpdateOrderRequest {
    UpdateOrderRequest {
        status: Some(status.to_string()),
        ..Default::default()
    }
}

async fn apply(app: &TestApp, admin: &AdminUser, id: Uuid, edit: UpdateOrderRequest) -> OrderUpdated {
    admin_service::update_order(&app.state, admin, id, edit)
        .await
        .expect("order updated")
        .data
        .expect("update data")
}

/// Places an order for `qty` units and submits its proof.
async fn submitted_order(app: &TestApp, product_id: Uuid, qty: i32, flash: bool) -> (Uuid, String) {
    let wa = common::whatsapp();
    let placed = place(app, order_request(&wa, &[(product_id, qty, flash)], None)).await;
    payment_proof_service::submit_payment_proof(&app.state, &placed.order_id.to_string(), png_upload())
        .await
        .expect("proof accepted");
    (placed.order_id, wa)
}

#[tokio::test]
async fn invalid_payment_restores_stock_exactly_once() -> anyhow::Result<()> {
    let Some(app) = common::setup(ReservationMode::Checkout).await? else {
        return Ok(());
    };
    let admin = common::insert_admin(&app).await;
    let product = insert_product(&app, new_product(15_000, Some(5))).await;
    let (order_id, wa) = submitted_order(&app, product.id, 2, false).await;
    assert_eq!(app.product(product.id).await.stock, Some(3));

    let paid = apply(&app, &admin, order_id, to_status(OrderStatus::Paid)).await;
    assert_eq!(paid.order.status, "PAID");
    assert_eq!(paid.warning, None);
    assert_eq!(app.product(product.id).await.stock, Some(3));

    let invalid = apply(&app, &admin, order_id, to_status(OrderStatus::InvalidPayment)).await;
    assert!(invalid.order.stock_restored_at.is_some());
    assert_eq!(app.product(product.id).await.stock, Some(5));

    // same status again is accepted but gives nothing back
    let again = apply(&app, &admin, order_id, to_status(OrderStatus::InvalidPayment)).await;
    assert_eq!(again.order.status, "INVALID_PAYMENT");
    assert_eq!(app.product(product.id).await.stock, Some(5));

    // proof notice, then PAID and INVALID_PAYMENT; the repeat sends nothing
    assert_eq!(app.notifier.sent_to(&wa).len(), 3);
    Ok(())
}

#[tokio::test]
async fn cancelling_a_flash_order_returns_flash_quota() -> anyhow::Result<()> {
    let Some(app) = common::setup(ReservationMode::Checkout).await? else {
        return Ok(());
    };
    let admin = common::insert_admin(&app).await;
    let product = insert_product(
        &app,
        common::with_flash_sale(new_product(80_000, Some(10)), 25, 3),
    )
    .await;
    let (order_id, wa) = submitted_order(&app, product.id, 2, true).await;
    let reserved = app.product(product.id).await;
    assert_eq!((reserved.stock, reserved.flash_sale_sold), (Some(8), 2));

    apply(&app, &admin, order_id, to_status(OrderStatus::Cancelled)).await;
    let restored = app.product(product.id).await;
    assert_eq!((restored.stock, restored.flash_sale_sold), (Some(10), 0));

    // CANCELLED is not announced to the customer
    assert_eq!(app.notifier.sent_to(&wa).len(), 1);
    Ok(())
}

#[tokio::test]
async fn released_orders_cannot_be_reopened() -> anyhow::Result<()> {
    let Some(app) = common::setup(ReservationMode::Checkout).await? else {
        return Ok(());
    };
    let admin = common::insert_admin(&app).await;
    let product = insert_product(&app, new_product(15_000, Some(5))).await;
    let (order_id, _) = submitted_order(&app, product.id, 1, false).await;

    apply(&app, &admin, order_id, to_status(OrderStatus::Refund)).await;
    let result =
        admin_service::update_order(&app.state, &admin, order_id, to_status(OrderStatus::Paid)).await;
    assert_eq!(
        rule_of(result),
        RuleViolation::InvalidStatusTransition {
            from: "REFUND".into(),
            to: "PAID".into(),
        }
    );
    assert_eq!(app.product(product.id).await.stock, Some(5));
    Ok(())
}

#[tokio::test]
async fn fulfillment_details_require_delivered() -> anyhow::Result<()> {
    let Some(app) = common::setup(ReservationMode::Checkout).await? else {
        return Ok(());
    };
    let admin = common::insert_admin(&app).await;
    let product = insert_product(&app, new_product(15_000, None)).await;
    let (order_id, wa) = submitted_order(&app, product.id, 1, false).await;

    let mut edit = to_status(OrderStatus::Paid);
    edit.fulfillment_email = Some("family@example.com".into());
    let result = admin_service::update_order(&app.state, &admin, order_id, edit).await;
    assert_eq!(rule_of(result), RuleViolation::FulfillmentRequiresDelivered);
    assert_eq!(common::load_order(&app, order_id).await.status, "PENDING_PAYMENT");

    apply(&app, &admin, order_id, to_status(OrderStatus::Paid)).await;
    let mut edit = to_status(OrderStatus::Delivered);
    edit.fulfillment_email = Some("family@example.com".into());
    edit.fulfillment_password = Some("s3cret".into());
    edit.notes = Some("sent via chat".into());
    let delivered = apply(&app, &admin, order_id, edit).await;

    assert_eq!(delivered.order.status, "DELIVERED");
    assert_eq!(delivered.order.fulfillment_email.as_deref(), Some("family@example.com"));
    assert_eq!(delivered.order.notes.as_deref(), Some("sent via chat"));
    assert!(delivered.order.stock_restored_at.is_none());
    assert_eq!(app.notifier.sent_to(&wa).len(), 3);
    Ok(())
}

#[tokio::test]
async fn unknown_order_is_not_found() -> anyhow::Result<()> {
    let Some(app) = common::setup(ReservationMode::Checkout).await? else {
        return Ok(());
    };
    let admin = common::insert_admin(&app).await;
    let result =
        admin_service::update_order(&app.state, &admin, Uuid::new_v4(), to_status(OrderStatus::Paid))
            .await;
    assert!(matches!(result, Err(storefront_api::error::AppError::NotFound)));
    Ok(())
}

#[tokio::test]
async fn cancelling_restores_stock_of_a_deactivated_product() -> anyhow::Result<()> {
    let Some(app) = common::setup(ReservationMode::Checkout).await? else {
        return Ok(());
    };
    let admin = common::insert_admin(&app).await;
    let product = insert_product(&app, new_product(15_000, Some(5))).await;
    let (order_id, _) = submitted_order(&app, product.id, 2, false).await;

    let removed = product_service::delete_product(&app.state, &admin, product.id)
        .await?
        .data
        .expect("removal data");
    assert_eq!(removed.action, "deactivated");
    assert!(!app.product(product.id).await.is_active);

    let cancelled = apply(&app, &admin, order_id, to_status(OrderStatus::Cancelled)).await;
    assert!(cancelled.order.stock_restored_at.is_some());
    let restored = app.product(product.id).await;
    assert_eq!(restored.stock, Some(5));
    assert!(!restored.is_active);
    Ok(())
}
