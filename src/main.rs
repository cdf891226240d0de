use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    routing::get,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::{net::SocketAddr, sync::Arc};

use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    middleware::request_id::with_request_tracing,
    notify,
    response::{ApiResponse, Meta},
    routes::{create_api_router, doc::scalar_docs, health},
    state::AppState,
    storage::LocalStorage,
};

// Headroom over the proof limit for multipart framing and JSON bodies.
const BODY_LIMIT_HEADROOM: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let storage = LocalStorage::new(&config.storage_dir, &config.public_url)?;
    let notifier = notify::from_config(&config.notify)?;
    tracing::info!(
        reservation = ?config.reservation,
        storage = %config.storage_dir.display(),
        "storefront configured"
    );

    let api_router = create_api_router(&config);
    let body_limit = config.proof_max_bytes + BODY_LIMIT_HEADROOM;
    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));

    let state = AppState {
        orm,
        config: Arc::new(config),
        notifier,
        storage,
    };

    let concurrency_limit_layer = ConcurrencyLimitLayer::new(100);

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_router)
        .nest_service("/storage", ServeDir::new(state.storage.root()))
        .merge(scalar_docs())
        .fallback(not_found);
    let app = with_request_tracing(app)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(concurrency_limit_layer)
        .with_state(state);

    tracing::info!("listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::success(
        "Not Found",
        serde_json::json!({ "path": uri.path() }),
        Some(Meta::empty()),
    );
    (StatusCode::NOT_FOUND, Json(body))
}
