use merit_db::scan::models::{Scan, ScanDetail};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ScanDetailResponse {
    pub data: ScanDetail,
    pub max_possible_score: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ScanHistoryResponse {
    pub data: Vec<Scan>,
    pub count: usize,
}
