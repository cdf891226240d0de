use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::vouchers::{ValidateVoucherRequest, VoucherPreview},
    error::AppResult,
    response::ApiResponse,
    services::voucher_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/validate", post(validate_voucher))
}

#[utoipa::path(
    post,
    path = "/api/vouchers/validate",
    request_body = ValidateVoucherRequest,
    responses(
        (status = 200, description = "Voucher preview", body = ApiResponse<VoucherPreview>),
        (status = 422, description = "Voucher cannot be applied"),
    ),
    tag = "Vouchers"
)]
pub async fn validate_voucher(
    State(state): State<AppState>,
    Json(payload): Json<ValidateVoucherRequest>,
) -> AppResult<Json<ApiResponse<VoucherPreview>>> {
    let resp = voucher_service::preview(&state, payload).await?;
    Ok(Json(resp))
}
