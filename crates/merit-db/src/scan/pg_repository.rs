use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::scan::models::{NewScan, Scan, ScanContribution, ScanDetail, ScanFilter};
use crate::scan::repositories::ScanRepository;
use merit_common::error::{MeritError, MeritResult};

#[derive(Clone)]
pub struct PgScanRepository {
    pool: PgPool,
}

impl PgScanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScanRepository for PgScanRepository {
    async fn persist(&self, scan: NewScan) -> MeritResult<Scan> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| MeritError::Database(e.to_string()))?;

        let scan_id = Uuid::new_v4();
        let row = sqlx::query(
            "insert into project_scans (id, project_name, scan_timestamp, final_score, created_at)
             values ($1, $2, $3, $4, $5)
             returning id, project_name, scan_timestamp, final_score, created_at",
        )
        .bind(scan_id)
        .bind(&scan.project_name)
        .bind(scan.scan_timestamp)
        .bind(scan.final_score)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| MeritError::Database(e.to_string()))?;

        for (position, c) in scan.contributions.iter().enumerate() {
            sqlx::query(
                "insert into scan_contributions
                 (id, scan_id, rule_name, source, metric_key, raw_value,
                  score, weighted_score, skipped, position)
                 values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(Uuid::new_v4())
            .bind(scan_id)
            .bind(&c.rule_name)
            .bind(&c.source)
            .bind(&c.metric_key)
            .bind(c.raw_value)
            .bind(c.score)
            .bind(c.weighted_score)
            .bind(c.skipped)
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| MeritError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| MeritError::Database(e.to_string()))?;

        Ok(map_scan_row(&row))
    }

    async fn latest(&self, project_name: &str) -> MeritResult<Option<ScanDetail>> {
        let row = sqlx::query(
            "select id, project_name, scan_timestamp, final_score, created_at
             from project_scans
             where project_name = $1
             order by scan_timestamp desc
             limit 1",
        )
        .bind(project_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MeritError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let scan = map_scan_row(&row);

        let rows = sqlx::query(
            "select id, scan_id, rule_name, source, metric_key, raw_value,
                    score, weighted_score, skipped, position
             from scan_contributions
             where scan_id = $1
             order by position asc",
        )
        .bind(scan.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MeritError::Database(e.to_string()))?;

        let contributions = rows.iter().map(map_contribution_row).collect();

        Ok(Some(ScanDetail {
            scan,
            contributions,
        }))
    }

    async fn history(&self, project_name: &str, filter: ScanFilter) -> MeritResult<Vec<Scan>> {
        let rows = sqlx::query(
            "select id, project_name, scan_timestamp, final_score, created_at
             from project_scans
             where project_name = $1
             order by scan_timestamp desc
             limit $2 offset $3",
        )
        .bind(project_name)
        .bind(filter.limit.unwrap_or(50))
        .bind(filter.offset.unwrap_or(0))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MeritError::Database(e.to_string()))?;

        Ok(rows.iter().map(map_scan_row).collect())
    }
}

fn map_scan_row(row: &sqlx::postgres::PgRow) -> Scan {
    Scan {
        id: row.get("id"),
        project_name: row.get("project_name"),
        scan_timestamp: row.get("scan_timestamp"),
        final_score: row.get("final_score"),
        created_at: row.get("created_at"),
    }
}

fn map_contribution_row(row: &sqlx::postgres::PgRow) -> ScanContribution {
    ScanContribution {
        id: row.get("id"),
        scan_id: row.get("scan_id"),
        rule_name: row.get("rule_name"),
        source: row.get("source"),
        metric_key: row.get("metric_key"),
        raw_value: row.get("raw_value"),
        score: row.get("score"),
        weighted_score: row.get("weighted_score"),
        skipped: row.get("skipped"),
        position: row.get("position"),
    }
}
