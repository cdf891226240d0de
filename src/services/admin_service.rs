use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LockType};
use uuid::Uuid;

use crate::{
    audit,
    db::set_lock_timeout,
    dto::orders::{OrderList, OrderUpdated, OrderWithItems, UpdateOrderRequest},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult, RuleViolation},
    ledger::inventory,
    middleware::auth::AdminUser,
    models::OrderStatus,
    notify::{self, messages},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::order_service,
    state::AppState,
};

/// Orders awaiting or past payment review; orders without a proof are hidden.
pub async fn list_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all().add(OrderCol::PaymentProofUploadedAt.is_not_null());
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse()?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }
    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(OrderCol::OrderCode).ilike(pattern.clone()))
                .add(Expr::col(OrderCol::CustomerName).ilike(pattern.clone()))
                .add(Expr::col(OrderCol::CustomerWhatsapp).ilike(pattern)),
        );
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items: orders }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    id_or_code: &str,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = order_service::find_order(&state.orm, id_or_code).await?;
    let data = order_service::load_with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("Order found", data, Some(Meta::empty())))
}

/// Checks an edit against the status machine and returns the resulting status.
pub fn plan_transition(
    current: OrderStatus,
    payload: &UpdateOrderRequest,
) -> Result<OrderStatus, RuleViolation> {
    let target = match payload.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse::<OrderStatus>()?,
        None => current,
    };
    if !current.can_transition_to(target) {
        return Err(RuleViolation::InvalidStatusTransition {
            from: current.to_string(),
            to: target.to_string(),
        });
    }
    if payload.has_fulfillment() && target != OrderStatus::Delivered {
        return Err(RuleViolation::FulfillmentRequiresDelivered);
    }
    Ok(target)
}

/// Applies an admin status/notes/fulfillment edit.
///
/// Entering a releasing status gives inventory back in the same
/// transaction. The customer is told about the new status after commit.
pub async fn update_order(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<OrderUpdated>> {
    let now = Utc::now();
    let txn = state.orm.begin().await?;
    set_lock_timeout(&txn, state.config.lock_timeout_ms).await?;

    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let current: OrderStatus = existing.status.parse()?;
    let target = plan_transition(current, &payload)?;
    let changed = current != target;

    let mut active: OrderActive = existing.into();
    active.status = Set(target.to_string());
    if let Some(notes) = payload.notes {
        active.notes = Set(Some(notes).filter(|n| !n.trim().is_empty()));
    }
    if let Some(value) = payload.fulfillment_account {
        active.fulfillment_account = Set(Some(value));
    }
    if let Some(value) = payload.fulfillment_email {
        active.fulfillment_email = Set(Some(value));
    }
    if let Some(value) = payload.fulfillment_password {
        active.fulfillment_password = Set(Some(value));
    }
    if let Some(value) = payload.fulfillment_link {
        active.fulfillment_link = Set(Some(value));
    }
    if let Some(value) = payload.fulfillment_notes {
        active.fulfillment_notes = Set(Some(value));
    }
    active.updated_at = Set(now.into());
    let mut order = active.update(&txn).await?;

    if target.restores_stock() {
        order = inventory::restore_stock(&txn, order, now).await?;
    }

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        from = %current,
        to = %target,
        "order status updated"
    );
    audit::record(
        &state.orm,
        admin.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": current, "to": target }),
    )
    .await;

    let warning = if changed && target.notifies_customer() {
        notify_status_change(state, &order, target).await
    } else {
        None
    };

    Ok(ApiResponse::success(
        "Order updated",
        OrderUpdated {
            order: order.into(),
            warning,
        },
        Some(Meta::empty()),
    ))
}

async fn notify_status_change(
    state: &AppState,
    order: &OrderModel,
    status: OrderStatus,
) -> Option<String> {
    let items: Vec<OrderItemModel> = match OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(&state.orm)
        .await
    {
        Ok(items) => items,
        Err(err) => {
            tracing::warn!(error = %err, order_id = %order.id, "could not load items for notification");
            Vec::new()
        }
    };

    let message = messages::status_changed(order, &items, status);
    let delivered = notify::send_logged(
        state.notifier.as_ref(),
        &order.customer_whatsapp,
        &message,
        "status_customer",
    )
    .await;
    (!delivered).then(|| "Customer notification could not be delivered".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(status: Option<&str>) -> UpdateOrderRequest {
        UpdateOrderRequest {
            status: status.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn missing_status_keeps_current() {
        assert_eq!(plan_transition(OrderStatus::Paid, &edit(None)), Ok(OrderStatus::Paid));
        assert_eq!(
            plan_transition(OrderStatus::Paid, &edit(Some(" "))),
            Ok(OrderStatus::Paid)
        );
    }

    #[test]
    fn unknown_status_is_invalid() {
        assert_eq!(
            plan_transition(OrderStatus::Paid, &edit(Some("SHIPPED"))),
            Err(RuleViolation::InvalidStatus)
        );
    }

    #[test]
    fn terminal_orders_cannot_reopen() {
        assert_eq!(
            plan_transition(OrderStatus::Refund, &edit(Some("PAID"))),
            Err(RuleViolation::InvalidStatusTransition {
                from: "REFUND".into(),
                to: "PAID".into()
            })
        );
    }

    #[test]
    fn fulfillment_only_with_delivered() {
        let mut req = edit(Some("PAID"));
        req.fulfillment_email = Some("fam@example.com".into());
        assert_eq!(
            plan_transition(OrderStatus::PendingPayment, &req),
            Err(RuleViolation::FulfillmentRequiresDelivered)
        );

        req.status = Some("DELIVERED".into());
        assert_eq!(plan_transition(OrderStatus::Paid, &req), Ok(OrderStatus::Delivered));
        req.status = None;
        assert_eq!(
            plan_transition(OrderStatus::Delivered, &req),
            Ok(OrderStatus::Delivered)
        );
    }

    #[test]
    fn notes_are_allowed_in_any_state() {
        let mut req = edit(None);
        req.notes = Some("called customer".into());
        assert_eq!(
            plan_transition(OrderStatus::Cancelled, &req),
            Ok(OrderStatus::Cancelled)
        );
    }
}
