use axum::{Json, Router, extract::State, routing::get};

use crate::{
    error::AppResult, models::SiteSetting, response::ApiResponse, services::settings_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_settings))
}

#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "Store settings", body = ApiResponse<SiteSetting>)
    ),
    tag = "Settings"
)]
pub async fn get_settings(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<SiteSetting>>> {
    let resp = settings_service::get_settings(&state).await?;
    Ok(Json(resp))
}
