use axum::Router;

use crate::{config::AppConfig, state::AppState};

pub mod admin;
pub mod auth;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod settings;
pub mod vouchers;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/settings", settings::router())
        .nest("/orders", orders::router(config.proof_max_bytes))
        .nest("/vouchers", vouchers::router())
        .nest("/admin", admin::router())
}
