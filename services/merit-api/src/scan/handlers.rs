use axum::extract::{Path, Query, State};
use axum::Json;
use merit_common::error::MeritError;
use merit_db::scan::models::ScanFilter;
use merit_db::scan::repositories::ScanRepository;
use merit_scoring::max_possible;

use crate::error::ApiError;
use crate::scan::responses::{ScanDetailResponse, ScanHistoryResponse};
use crate::AppState;

pub async fn get_latest_scan(
    State(state): State<AppState>,
    Path(project_name): Path<String>,
) -> Result<Json<ScanDetailResponse>, ApiError> {
    let detail = state
        .scan_repo
        .latest(&project_name)
        .await?
        .ok_or_else(|| MeritError::NotFound(format!("no scan found for project {project_name}")))?;

    Ok(Json(ScanDetailResponse {
        data: detail,
        max_possible_score: max_possible(state.registry.rules()),
    }))
}

pub async fn list_scan_history(
    State(state): State<AppState>,
    Path(project_name): Path<String>,
    Query(filter): Query<ScanFilter>,
) -> Result<Json<ScanHistoryResponse>, ApiError> {
    let data = state.scan_repo.history(&project_name, filter).await?;
    let count = data.len();
    Ok(Json(ScanHistoryResponse { data, count }))
}
