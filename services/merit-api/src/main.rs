mod error;
mod scan;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use merit_common::types::ServiceInfo;
use merit_config::{init_tracing, AppConfig};
use merit_db::scan::pg_repository::PgScanRepository;
use merit_scoring::RuleRegistry;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub scan_repo: PgScanRepository,
    pub registry: Arc<RuleRegistry>,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn info() -> Json<ServiceInfo> {
    Json(ServiceInfo::new("merit-api"))
}

async fn metrics() -> impl IntoResponse {
    let body = "\
# HELP merit_up Service up indicator\n\
# TYPE merit_up gauge\n\
merit_up 1\n\
# HELP merit_info Service info\n\
# TYPE merit_info gauge\n\
merit_info{service=\"merit-api\",version=\"0.1.0\"} 1\n";

    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:3000".parse::<HeaderValue>().unwrap(),
            "http://127.0.0.1:3000".parse::<HeaderValue>().unwrap(),
        ])
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/metrics", get(metrics))
        .merge(scan::router())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    init_tracing("info");

    let config = AppConfig::from_env().expect("failed to load config");
    tracing::info!(service = "merit-api", "starting");

    // The registry is read-only here: it only prices the achievable maximum
    // reported next to each scan.
    let registry = RuleRegistry::from_path(Path::new(&config.scoring_config_path))
        .expect("invalid scoring configuration");

    let pool = merit_db::create_pool(&config.database_url)
        .await
        .expect("failed to create database pool");

    let state = AppState {
        scan_repo: PgScanRepository::new(pool),
        registry: Arc::new(registry),
    };

    let app = build_router(state);
    let addr: SocketAddr = config.bind_addr().parse().expect("invalid bind address");

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}
