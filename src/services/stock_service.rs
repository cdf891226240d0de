use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    audit,
    dto::stocks::{StockList, StockRequest},
    entity::{
        products::Entity as Products,
        stocks::{ActiveModel as StockActive, Column as StockCol, Entity as Stocks},
    },
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    models::Stock,
    response::{ApiResponse, Meta},
    routes::params::SearchQuery,
    state::AppState,
};

fn validate_request(mut payload: StockRequest) -> AppResult<StockRequest> {
    payload.name = payload.name.trim().to_string();
    if payload.name.is_empty() {
        return Err(AppError::validation("name", "Name is required"));
    }
    if payload.end_date < payload.active_date {
        return Err(AppError::validation("end_date", "End date must not be before active date"));
    }
    payload.duration = payload.duration.trim().to_string();
    payload.warranty = payload.warranty.trim().to_string();
    if payload.duration.is_empty() {
        return Err(AppError::validation("duration", "Duration is required"));
    }
    if payload.warranty.is_empty() {
        return Err(AppError::validation("warranty", "Warranty is required"));
    }
    Ok(payload)
}

async fn ensure_product(state: &AppState, product_id: Option<Uuid>) -> AppResult<()> {
    if let Some(id) = product_id {
        if Products::find_by_id(id).one(&state.orm).await?.is_none() {
            return Err(AppError::validation("product_id", "Product does not exist"));
        }
    }
    Ok(())
}

async fn with_product(state: &AppState, model: crate::entity::stocks::Model) -> AppResult<Stock> {
    let product = match model.product_id {
        Some(id) => Products::find_by_id(id).one(&state.orm).await?,
        None => None,
    };
    Ok(Stock::from_entity(model, product.as_ref()))
}

pub async fn list_stocks(state: &AppState, query: SearchQuery) -> AppResult<ApiResponse<StockList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(StockCol::Name).ilike(pattern.clone()))
                .add(Expr::col(StockCol::Account).ilike(pattern)),
        );
    }

    let finder = Stocks::find()
        .filter(condition)
        .order_by_desc(StockCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let rows = finder
        .find_also_related(Products)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = rows
        .into_iter()
        .map(|(stock, product)| Stock::from_entity(stock, product.as_ref()))
        .collect();

    Ok(ApiResponse::success(
        "Stocks",
        StockList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_stock(
    state: &AppState,
    admin: &AdminUser,
    payload: StockRequest,
) -> AppResult<ApiResponse<Stock>> {
    let payload = validate_request(payload)?;
    ensure_product(state, payload.product_id).await?;

    let now = Utc::now();
    let created = StockActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(payload.product_id),
        name: Set(payload.name),
        account: Set(payload.account),
        username: Set(payload.username),
        password: Set(payload.password),
        link: Set(payload.link),
        description: Set(payload.description),
        active_date: Set(payload.active_date),
        end_date: Set(payload.end_date),
        duration: Set(payload.duration),
        warranty: Set(payload.warranty),
        is_active: Set(payload.is_active),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        admin.user_id,
        "stock_create",
        "stocks",
        serde_json::json!({ "stock_id": created.id }),
    )
    .await;

    let stock = with_product(state, created).await?;
    Ok(ApiResponse::success("Stock created", stock, Some(Meta::empty())))
}

pub async fn update_stock(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
    payload: StockRequest,
) -> AppResult<ApiResponse<Stock>> {
    let payload = validate_request(payload)?;
    let existing = match Stocks::find_by_id(id).one(&state.orm).await? {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };
    ensure_product(state, payload.product_id).await?;

    let mut active: StockActive = existing.into();
    active.product_id = Set(payload.product_id);
    active.name = Set(payload.name);
    active.account = Set(payload.account);
    active.username = Set(payload.username);
    active.password = Set(payload.password);
    active.link = Set(payload.link);
    active.description = Set(payload.description);
    active.active_date = Set(payload.active_date);
    active.end_date = Set(payload.end_date);
    active.duration = Set(payload.duration);
    active.warranty = Set(payload.warranty);
    active.is_active = Set(payload.is_active);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        admin.user_id,
        "stock_update",
        "stocks",
        serde_json::json!({ "stock_id": updated.id }),
    )
    .await;

    let stock = with_product(state, updated).await?;
    Ok(ApiResponse::success("Stock updated", stock, Some(Meta::empty())))
}

pub async fn delete_stock(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Stocks::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        admin.user_id,
        "stock_delete",
        "stocks",
        serde_json::json!({ "stock_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Stock deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}
