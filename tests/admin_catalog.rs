mod common;

use common::{insert_product, insert_voucher, new_product, new_voucher, order_request, place};
use axum::http::StatusCode;
use chrono::Utc;
use sea_orm::Set;
use storefront_api::{
    config::ReservationMode,
    dto::{products::ProductRequest, vouchers::{ValidateVoucherRequest, VoucherRequest}},
    entity::vouchers,
    error::{AppError, AppResult},
    services::{product_service, voucher_service},
};

fn voucher_request(voucher: &vouchers::Model, usage_limit: Option<i32>) -> VoucherRequest {
    VoucherRequest {
        code: voucher.code.clone(),
        kind: voucher.kind.clone(),
        value: voucher.value,
        max_discount: voucher.max_discount,
        min_order: voucher.min_order,
        usage_limit,
        starts_at: None,
        ends_at: None,
        is_active: true,
    }
}

/// Unwraps the field a call was rejected on, checking it maps to 422.
fn field_of<T: std::fmt::Debug>(result: AppResult<T>) -> String {
    let err = match result {
        Ok(value) => panic!("expected a validation error, got {value:?}"),
        Err(err) => err,
    };
    assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    match err {
        AppError::Validation { field, .. } => field,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn usage_limit_below_uses_is_a_validation_error() -> anyhow::Result<()> {
    let Some(app) = common::setup(ReservationMode::Checkout).await? else {
        return Ok(());
    };
    let admin = common::insert_admin(&app).await;
    let product = insert_product(&app, new_product(30_000, None)).await;
    let mut voucher = new_voucher("FIXED", 5_000);
    voucher.usage_limit = Set(Some(5));
    let voucher = insert_voucher(&app, voucher).await;
    for _ in 0..2 {
        place(
            &app,
            order_request(&common::whatsapp(), &[(product.id, 1, false)], Some(&voucher.code)),
        )
        .await;
    }

    let lowered =
        voucher_service::update_voucher(&app.state, &admin, voucher.id, voucher_request(&voucher, Some(1)))
            .await;
    assert_eq!(field_of(lowered), "usage_limit");
    let unchanged = app.voucher(voucher.id).await;
    assert_eq!((unchanged.usage_limit, unchanged.used_count), (Some(5), 2));

    let updated =
        voucher_service::update_voucher(&app.state, &admin, voucher.id, voucher_request(&voucher, Some(2)))
            .await?
            .data
            .expect("voucher data");
    assert_eq!(updated.usage_limit, Some(2));
    Ok(())
}

#[tokio::test]
async fn flash_quota_below_units_sold_is_a_validation_error() -> anyhow::Result<()> {
    let Some(app) = common::setup(ReservationMode::Checkout).await? else {
        return Ok(());
    };
    let admin = common::insert_admin(&app).await;
    let product = insert_product(
        &app,
        common::with_flash_sale(new_product(50_000, None), 40, 5),
    )
    .await;
    place(
        &app,
        order_request(&common::whatsapp(), &[(product.id, 3, true)], None),
    )
    .await;

    let request = ProductRequest {
        name: product.name.clone(),
        description: None,
        price: product.price,
        category: product.category.clone(),
        image_url: None,
        duration: product.duration.clone(),
        warranty: None,
        product_images: Vec::new(),
        discount_type: None,
        discount_value: None,
        stock: None,
        flash_sale_active: true,
        flash_sale_discount_type: product.flash_sale_discount_type.clone(),
        flash_sale_discount_value: product.flash_sale_discount_value,
        flash_sale_start_at: product.flash_sale_start_at.map(|at| at.with_timezone(&Utc)),
        flash_sale_end_at: product.flash_sale_end_at.map(|at| at.with_timezone(&Utc)),
        flash_sale_stock: Some(2),
        max_qty_per_customer: None,
        is_active: true,
    };
    let result = product_service::update_product(&app.state, &admin, product.id, request).await;

    assert_eq!(field_of(result), "flash_sale_stock");
    let unchanged = app.product(product.id).await;
    assert_eq!((unchanged.flash_sale_stock, unchanged.flash_sale_sold), (Some(5), 3));
    Ok(())
}

#[tokio::test]
async fn voucher_preview_does_not_consume_the_voucher() -> anyhow::Result<()> {
    let Some(app) = common::setup(ReservationMode::Checkout).await? else {
        return Ok(());
    };
    let mut voucher = new_voucher("PERCENT", 10);
    voucher.usage_limit = Set(Some(1));
    let voucher = insert_voucher(&app, voucher).await;

    for _ in 0..3 {
        let preview = voucher_service::preview(
            &app.state,
            ValidateVoucherRequest {
                code: format!("  {}  ", voucher.code.to_lowercase()),
                subtotal: 110_000,
            },
        )
        .await?
        .data
        .expect("preview data");
        assert_eq!(preview.code, voucher.code);
        assert_eq!(preview.discount_amount, 11_000);
        assert_eq!(preview.final_total, 99_000);
    }

    assert_eq!(app.voucher(voucher.id).await.used_count, 0);
    Ok(())
}
