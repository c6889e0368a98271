use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One completed ingestion cycle for one project.
///
/// Scans are append-only: a new row per cycle, unique on
/// (project_name, scan_timestamp), never mutated after persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scan {
    pub id: Uuid,
    pub project_name: String,
    pub scan_timestamp: DateTime<Utc>,
    pub final_score: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Per-metric sub-score row owned by a scan (cascade on delete).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanContribution {
    pub id: Uuid,
    pub scan_id: Uuid,
    pub rule_name: String,
    pub source: String,
    pub metric_key: String,
    pub raw_value: Option<f64>,
    pub score: f64,
    pub weighted_score: f64,
    pub skipped: bool,
    pub position: i32,
}

/// A scan ready to be persisted; ids and created_at are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewScan {
    pub project_name: String,
    pub scan_timestamp: DateTime<Utc>,
    pub final_score: Decimal,
    pub contributions: Vec<NewContribution>,
}

#[derive(Debug, Clone)]
pub struct NewContribution {
    pub rule_name: String,
    pub source: String,
    pub metric_key: String,
    pub raw_value: Option<f64>,
    pub score: f64,
    pub weighted_score: f64,
    pub skipped: bool,
}

/// A scan with its full breakdown, contributions in registry order.
#[derive(Debug, Clone, Serialize)]
pub struct ScanDetail {
    pub scan: Scan,
    pub contributions: Vec<ScanContribution>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanFilter {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
