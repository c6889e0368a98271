pub mod handlers;
pub mod responses;

use axum::routing::get;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/scan/{project_name}", get(handlers::get_latest_scan))
        .route(
            "/scan/{project_name}/history",
            get(handlers::list_scan_history),
        )
}
