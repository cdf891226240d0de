use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

/// Business rule failures. Each aborts the enclosing transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("One or more products are invalid or inactive")]
    InvalidItems,

    #[error("Insufficient stock for {product}")]
    InsufficientStock { product: String },

    #[error("Flash sale quota for {product} is not enough")]
    InsufficientFlashStock { product: String },

    #[error("Flash sale for {product} has ended")]
    FlashSaleEnded { product: String },

    #[error("Purchase limit for {product} is {limit} per customer")]
    PerCustomerLimitExceeded { product: String, limit: i32 },

    #[error("Voucher is not valid")]
    VoucherNotFound,

    #[error("Voucher is not active yet")]
    VoucherNotStarted,

    #[error("Voucher has expired")]
    VoucherExpired,

    #[error("Minimum order of {min_order} not met")]
    VoucherMinOrderNotMet { min_order: i64 },

    #[error("Voucher usage limit reached")]
    VoucherExhausted,

    #[error("Payment proof was already submitted")]
    ProofAlreadySubmitted,

    #[error("Order is no longer awaiting payment")]
    OrderNotPayable,

    #[error("Invalid order status")]
    InvalidStatus,

    #[error("Cannot change status from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Fulfillment details can only be set on delivered orders")]
    FulfillmentRequiresDelivered,
}

impl RuleViolation {
    /// Request field the violation is reported against.
    pub fn field(&self) -> &'static str {
        match self {
            RuleViolation::InvalidItems
            | RuleViolation::InsufficientStock { .. }
            | RuleViolation::InsufficientFlashStock { .. }
            | RuleViolation::FlashSaleEnded { .. }
            | RuleViolation::PerCustomerLimitExceeded { .. } => "items",
            RuleViolation::VoucherNotFound
            | RuleViolation::VoucherNotStarted
            | RuleViolation::VoucherExpired
            | RuleViolation::VoucherMinOrderNotMet { .. }
            | RuleViolation::VoucherExhausted => "voucher_code",
            RuleViolation::ProofAlreadySubmitted | RuleViolation::OrderNotPayable => "proof",
            RuleViolation::InvalidStatus | RuleViolation::InvalidStatusTransition { .. } => {
                "status"
            }
            RuleViolation::FulfillmentRequiresDelivered => "fulfillment",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    Rule(#[from] RuleViolation),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Store is busy, please retry")]
    TransientConflict,

    #[error("ORM error")]
    OrmError(sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation { .. } | AppError::Rule(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::TransientConflict => StatusCode::SERVICE_UNAVAILABLE,
            AppError::OrmError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn field_errors(&self) -> Option<BTreeMap<String, Vec<String>>> {
        let (field, message) = match self {
            AppError::Validation { field, message } => (field.clone(), message.clone()),
            AppError::Rule(rule) => (rule.field().to_string(), rule.to_string()),
            _ => return None,
        };
        Some(BTreeMap::from([(field, vec![message])]))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        if crate::db::is_transient(&err) {
            tracing::warn!(error = %err, "transient store conflict");
            AppError::TransientConflict
        } else {
            AppError::OrmError(err)
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, Vec<String>>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
                errors: self.field_errors(),
            }),
            meta: Some(Meta::empty()),
        };

        let mut response = (status, axum::Json(body)).into_response();
        if matches!(self, AppError::TransientConflict) {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_violations_map_to_unprocessable_with_field() {
        let err = AppError::from(RuleViolation::VoucherExpired);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let errors = err.field_errors().unwrap();
        assert_eq!(errors["voucher_code"], vec!["Voucher has expired".to_string()]);
    }

    #[test]
    fn stock_violations_are_reported_on_items() {
        let rule = RuleViolation::InsufficientStock {
            product: "Netflix 1 Bulan".into(),
        };
        assert_eq!(rule.field(), "items");
        assert_eq!(rule.to_string(), "Insufficient stock for Netflix 1 Bulan");
    }

    #[test]
    fn transient_conflict_is_retryable_service_unavailable() {
        let response = AppError::TransientConflict.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }

    #[test]
    fn non_database_orm_errors_are_not_transient() {
        let err = AppError::from(sea_orm::DbErr::RecordNotFound("orders".into()));
        assert!(matches!(err, AppError::OrmError(_)));
    }
}
