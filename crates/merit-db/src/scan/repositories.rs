use async_trait::async_trait;

use crate::scan::models::{NewScan, Scan, ScanDetail, ScanFilter};
use merit_common::error::MeritResult;

#[async_trait]
pub trait ScanRepository: Send + Sync {
    /// Persist the scan and all its contributions in one transaction —
    /// readers never observe a scan without its breakdown.
    async fn persist(&self, scan: NewScan) -> MeritResult<Scan>;
    async fn latest(&self, project_name: &str) -> MeritResult<Option<ScanDetail>>;
    async fn history(&self, project_name: &str, filter: ScanFilter) -> MeritResult<Vec<Scan>>;
}
