use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::orders::{CreateOrderRequest, OrderPlaced, OrderWithItems, ProofAccepted},
    error::{AppError, AppResult},
    response::ApiResponse,
    services::{
        order_service,
        payment_proof_service::{self, ProofUpload},
    },
    state::AppState,
};

/// Multipart envelope allowance on top of the proof itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(proof_max_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/{id_or_code}", get(get_order))
        .route(
            "/{id_or_code}/payment-proof",
            post(upload_payment_proof)
                .layer(DefaultBodyLimit::max(proof_max_bytes + MULTIPART_OVERHEAD)),
        )
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<OrderPlaced>),
        (status = 422, description = "Validation or stock/voucher rule failure"),
        (status = 503, description = "Store busy, retry"),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderPlaced>>)> {
    let resp = order_service::place_order(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id_or_code}",
    params(("id_or_code" = String, Path, description = "Order UUID or order code")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id_or_code): Path<String>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order(&state, &id_or_code).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id_or_code}/payment-proof",
    params(("id_or_code" = String, Path, description = "Order UUID or order code")),
    request_body(content_type = "multipart/form-data", description = "Image file in field `proof`"),
    responses(
        (status = 200, description = "Proof accepted, `warning` set when a notification failed", body = ApiResponse<ProofAccepted>),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Already submitted, invalid file or stock rule failure"),
    ),
    tag = "Orders"
)]
pub async fn upload_payment_proof(
    State(state): State<AppState>,
    Path(id_or_code): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<ProofAccepted>>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(err.body_text()))?
    {
        if field.name() != Some("proof") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|err| {
            if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::validation("proof", "Payment proof file is too large")
            } else {
                AppError::BadRequest(err.body_text())
            }
        })?;
        upload = Some(ProofUpload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    let upload =
        upload.ok_or_else(|| AppError::validation("proof", "Payment proof file is required"))?;
    let resp = payment_proof_service::submit_payment_proof(&state, &id_or_code, upload).await?;
    Ok(Json(resp))
}
