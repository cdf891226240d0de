use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    audit,
    db::set_lock_timeout,
    dto::products::{ProductList, ProductRemoved, ProductRequest},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        products::{ActiveModel, Column, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    models::{DiscountType, Product},
    response::{ApiResponse, Meta},
    routes::params::{CatalogQuery, ProductQuery},
    state::AppState,
};

/// Public catalog: active products by name.
pub async fn list_catalog(
    state: &AppState,
    query: CatalogQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let mut condition = Condition::all().add(Column::IsActive.eq(true));
    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Category).ilike(pattern)),
        );
    }

    let now = Utc::now();
    let items = Products::find()
        .filter(condition)
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|model| Product::from_entity(model, &state.config.public_url, now))
        .collect();

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::empty()),
    ))
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Slug).ilike(pattern)),
        );
    }
    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Column::Category.eq(category.clone()));
    }
    if let Some(is_active) = query.is_active {
        condition = condition.add(Column::IsActive.eq(is_active));
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let now = Utc::now();
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|model| Product::from_entity(model, &state.config.public_url, now))
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let result = Products::find_by_id(id).one(&state.orm).await?;
    let result = match result {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success(
        "Product",
        Product::from_entity(result, &state.config.public_url, Utc::now()),
        Some(Meta::empty()),
    ))
}

/// Lower-case ASCII slug with single dashes between words.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "product".to_string()
    } else {
        slug.to_string()
    }
}

async fn unique_slug(state: &AppState, name: &str, except: Option<Uuid>) -> AppResult<String> {
    let base = slugify(name);
    let mut candidate = base.clone();
    let mut n = 2;
    loop {
        let mut finder = Products::find().filter(Column::Slug.eq(candidate.as_str()));
        if let Some(id) = except {
            finder = finder.filter(Column::Id.ne(id));
        }
        if finder.count(&state.orm).await? == 0 {
            return Ok(candidate);
        }
        candidate = format!("{base}-{n}");
        n += 1;
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validates an admin product payload and normalizes its discount rules.
pub fn validate_request(mut payload: ProductRequest) -> AppResult<ProductRequest> {
    payload.name = payload.name.trim().to_string();
    if payload.name.is_empty() || payload.name.chars().count() > 255 {
        return Err(AppError::validation("name", "Name must be 1 to 255 characters"));
    }
    if payload.price < 0 {
        return Err(AppError::validation("price", "Price must not be negative"));
    }
    if payload.stock.is_some_and(|s| s < 0) {
        return Err(AppError::validation("stock", "Stock must not be negative"));
    }

    let discount_type = match blank_to_none(payload.discount_type.take()) {
        Some(raw) => Some(
            DiscountType::parse(Some(&raw))
                .ok_or_else(|| AppError::validation("discount_type", "Must be PERCENT or FIXED"))?,
        ),
        None => None,
    };
    let discount_value = payload.discount_value.unwrap_or(0);
    if discount_value < 0 {
        return Err(AppError::validation("discount_value", "Must not be negative"));
    }
    if discount_type == Some(DiscountType::Percent) && discount_value > 100 {
        return Err(AppError::validation("discount_value", "Percent must be at most 100"));
    }
    // no value means no discount
    payload.discount_type = discount_type
        .filter(|_| discount_value > 0)
        .map(|kind| kind.as_str().to_string());
    payload.discount_value = Some(if payload.discount_type.is_some() {
        discount_value
    } else {
        0
    });

    let flash_type = match blank_to_none(payload.flash_sale_discount_type.take()) {
        Some(raw) => Some(DiscountType::parse(Some(&raw)).ok_or_else(|| {
            AppError::validation("flash_sale_discount_type", "Must be PERCENT or FIXED")
        })?),
        None => None,
    };
    if payload.flash_sale_discount_value.is_some_and(|v| v < 0) {
        return Err(AppError::validation("flash_sale_discount_value", "Must not be negative"));
    }
    if flash_type == Some(DiscountType::Percent)
        && payload.flash_sale_discount_value.is_some_and(|v| v > 100)
    {
        return Err(AppError::validation(
            "flash_sale_discount_value",
            "Percent must be at most 100",
        ));
    }
    payload.flash_sale_discount_type = flash_type.map(|kind| kind.as_str().to_string());
    if let (Some(start), Some(end)) = (payload.flash_sale_start_at, payload.flash_sale_end_at) {
        if end < start {
            return Err(AppError::validation("flash_sale_end_at", "End must not be before start"));
        }
    }
    if payload.flash_sale_stock.is_some_and(|s| s < 0) {
        return Err(AppError::validation("flash_sale_stock", "Must not be negative"));
    }
    if payload.max_qty_per_customer.is_some_and(|q| q < 1) {
        return Err(AppError::validation("max_qty_per_customer", "Must be at least 1"));
    }

    payload.description = blank_to_none(payload.description);
    payload.category = blank_to_none(payload.category);
    payload.image_url = blank_to_none(payload.image_url);
    payload.duration = blank_to_none(payload.duration);
    payload.warranty = blank_to_none(payload.warranty);
    payload.product_images = payload
        .product_images
        .into_iter()
        .map(|image| image.trim().to_string())
        .filter(|image| !image.is_empty())
        .collect();
    Ok(payload)
}

fn images_json(images: &[String]) -> Option<serde_json::Value> {
    (!images.is_empty()).then(|| serde_json::json!(images))
}

pub async fn create_product(
    state: &AppState,
    admin: &AdminUser,
    payload: ProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let payload = validate_request(payload)?;
    let slug = unique_slug(state, &payload.name, None).await?;
    let now = Utc::now();

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        slug: Set(slug),
        description: Set(payload.description),
        price: Set(payload.price),
        category: Set(payload.category),
        image_url: Set(payload.image_url),
        duration: Set(payload.duration),
        warranty: Set(payload.warranty),
        product_images: Set(images_json(&payload.product_images)),
        discount_type: Set(payload.discount_type),
        discount_value: Set(payload.discount_value.unwrap_or(0)),
        stock: Set(payload.stock),
        flash_sale_active: Set(payload.flash_sale_active),
        flash_sale_discount_type: Set(payload.flash_sale_discount_type),
        flash_sale_discount_value: Set(payload.flash_sale_discount_value),
        flash_sale_start_at: Set(payload.flash_sale_start_at.map(Into::into)),
        flash_sale_end_at: Set(payload.flash_sale_end_at.map(Into::into)),
        flash_sale_stock: Set(payload.flash_sale_stock),
        flash_sale_sold: Set(0),
        max_qty_per_customer: Set(payload.max_qty_per_customer),
        is_active: Set(payload.is_active),
        name: Set(payload.name),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        admin.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from_entity(product, &state.config.public_url, now),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
    payload: ProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let payload = validate_request(payload)?;
    let txn = state.orm.begin().await?;
    set_lock_timeout(&txn, state.config.lock_timeout_ms).await?;

    // locked so a concurrent flash checkout cannot raise the sold count
    let existing = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    ensure_quota_covers_sold(payload.flash_sale_stock, existing.flash_sale_sold)?;

    let slug = if payload.name == existing.name {
        existing.slug.clone()
    } else {
        unique_slug(state, &payload.name, Some(id)).await?
    };
    let now = Utc::now();

    let mut active: ActiveModel = existing.into();
    active.slug = Set(slug);
    active.description = Set(payload.description);
    active.price = Set(payload.price);
    active.category = Set(payload.category);
    active.image_url = Set(payload.image_url);
    active.duration = Set(payload.duration);
    active.warranty = Set(payload.warranty);
    active.product_images = Set(images_json(&payload.product_images));
    active.discount_type = Set(payload.discount_type);
    active.discount_value = Set(payload.discount_value.unwrap_or(0));
    active.stock = Set(payload.stock);
    active.flash_sale_active = Set(payload.flash_sale_active);
    active.flash_sale_discount_type = Set(payload.flash_sale_discount_type);
    active.flash_sale_discount_value = Set(payload.flash_sale_discount_value);
    active.flash_sale_start_at = Set(payload.flash_sale_start_at.map(Into::into));
    active.flash_sale_end_at = Set(payload.flash_sale_end_at.map(Into::into));
    active.flash_sale_stock = Set(payload.flash_sale_stock);
    active.max_qty_per_customer = Set(payload.max_qty_per_customer);
    active.is_active = Set(payload.is_active);
    active.name = Set(payload.name);
    active.updated_at = Set(now.into());
    let product = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        admin.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Product::from_entity(product, &state.config.public_url, now),
        Some(Meta::empty()),
    ))
}

fn ensure_quota_covers_sold(quota: Option<i32>, sold: i32) -> AppResult<()> {
    if quota.is_some_and(|quota| quota < sold) {
        return Err(AppError::validation(
            "flash_sale_stock",
            format!("Must be at least the {sold} units already sold"),
        ));
    }
    Ok(())
}

/// Deletes a product, or deactivates it when order history references it.
pub async fn delete_product(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
) -> AppResult<ApiResponse<ProductRemoved>> {
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let referenced = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(id))
        .count(&state.orm)
        .await?
        > 0;

    let action = if referenced {
        let mut active: ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().into());
        active.update(&state.orm).await?;
        "deactivated"
    } else {
        Products::delete_by_id(id).exec(&state.orm).await?;
        "deleted"
    };

    audit::record(
        &state.orm,
        admin.user_id,
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id, "action": action }),
    )
    .await;

    Ok(ApiResponse::success(
        if referenced { "Product deactivated" } else { "Deleted" },
        ProductRemoved {
            action: action.to_string(),
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_quota_cannot_drop_below_units_sold() {
        assert!(ensure_quota_covers_sold(Some(3), 3).is_ok());
        assert!(ensure_quota_covers_sold(None, 7).is_ok());
        assert!(matches!(
            ensure_quota_covers_sold(Some(2), 3),
            Err(AppError::Validation { ref field, .. }) if field == "flash_sale_stock"
        ));
    }

    fn request() -> ProductRequest {
        ProductRequest {
            name: "  Netflix Premium 1 Bulan ".into(),
            description: Some("   ".into()),
            price: 60000,
            category: Some("streaming".into()),
            image_url: None,
            duration: Some("30 hari".into()),
            warranty: None,
            product_images: vec!["a.jpg".into(), " ".into()],
            discount_type: Some("FIXED".into()),
            discount_value: Some(5000),
            stock: Some(10),
            flash_sale_active: false,
            flash_sale_discount_type: None,
            flash_sale_discount_value: None,
            flash_sale_start_at: None,
            flash_sale_end_at: None,
            flash_sale_stock: None,
            max_qty_per_customer: None,
            is_active: true,
        }
    }

    #[test]
    fn slugs_are_lowercase_dash_separated() {
        assert_eq!(slugify("Netflix Premium 1 Bulan"), "netflix-premium-1-bulan");
        assert_eq!(slugify("  YouTube -- Premium!! "), "youtube-premium");
        assert_eq!(slugify("***"), "product");
    }

    #[test]
    fn payload_is_trimmed_and_blank_fields_cleared() {
        let checked = validate_request(request()).unwrap();
        assert_eq!(checked.name, "Netflix Premium 1 Bulan");
        assert_eq!(checked.description, None);
        assert_eq!(checked.product_images, vec!["a.jpg".to_string()]);
        assert_eq!(checked.discount_type.as_deref(), Some("FIXED"));
    }

    #[test]
    fn zero_discount_value_clears_discount_type() {
        let mut req = request();
        req.discount_value = Some(0);
        let checked = validate_request(req).unwrap();
        assert_eq!(checked.discount_type, None);
        assert_eq!(checked.discount_value, Some(0));
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let mut req = request();
        req.discount_type = Some("HALF".into());
        assert!(validate_request(req).is_err());

        let mut req = request();
        req.max_qty_per_customer = Some(0);
        assert!(validate_request(req).is_err());

        let mut req = request();
        req.price = -1;
        assert!(validate_request(req).is_err());
    }
}
