use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use merit_db::scan::models::{NewContribution, NewScan};
use merit_db::scan::repositories::ScanRepository;
use merit_scoring::{aggregate, normalize, MetricContribution, RuleRegistry};

use crate::sources::{MetricSource, Target};

/// What one cycle did, for the cadence log line.
#[derive(Debug, Default)]
pub struct CycleSummary {
    pub persisted: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, PartialEq, Eq)]
enum ScanOutcome {
    Persisted,
    /// No source produced anything for this project — no scan record.
    Skipped,
    /// Scoring succeeded but the store write failed; retried next cycle.
    Failed,
}

/// Fetch → normalize → aggregate → persist, per project.
///
/// Projects run concurrently up to the permit limit; within one project the
/// stages are strictly sequential.
pub struct IngestPipeline<R> {
    registry: Arc<RuleRegistry>,
    repo: Arc<R>,
    max_concurrency: usize,
}

impl<R: ScanRepository + 'static> IngestPipeline<R> {
    pub fn new(registry: Arc<RuleRegistry>, repo: Arc<R>, max_concurrency: usize) -> Self {
        Self {
            registry,
            repo,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Run one ingestion cycle over the given targets with the given source
    /// set. A failure in one (project, source) pair never aborts the others.
    pub async fn run_cycle(
        &self,
        targets: &[Target],
        sources: &[Arc<dyn MetricSource>],
    ) -> CycleSummary {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for target in targets {
            let semaphore = semaphore.clone();
            let registry = self.registry.clone();
            let repo = self.repo.clone();
            let sources: Vec<Arc<dyn MetricSource>> = sources.to_vec();
            let target = target.clone();

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                scan_project(&registry, repo.as_ref(), &sources, &target).await
            });
        }

        let mut summary = CycleSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(ScanOutcome::Persisted) => summary.persisted += 1,
                Ok(ScanOutcome::Skipped) => summary.skipped += 1,
                Ok(ScanOutcome::Failed) => summary.failed += 1,
                Err(e) => {
                    tracing::error!(error = %e, "project scan task panicked");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            persisted = summary.persisted,
            skipped = summary.skipped,
            failed = summary.failed,
            "ingestion cycle completed"
        );
        summary
    }
}

async fn scan_project<R: ScanRepository>(
    registry: &RuleRegistry,
    repo: &R,
    sources: &[Arc<dyn MetricSource>],
    target: &Target,
) -> ScanOutcome {
    let mut raw_by_source: HashMap<String, HashMap<String, f64>> = HashMap::new();
    let mut fetched = 0usize;

    for source in sources {
        match source.fetch(target).await {
            Ok(values) => {
                tracing::debug!(
                    project = %target.project_name,
                    source = source.name(),
                    metrics = values.len(),
                    "metrics fetched"
                );
                fetched += 1;
                raw_by_source.insert(source.name().to_string(), values);
            }
            Err(e) => {
                tracing::warn!(
                    project = %target.project_name,
                    source = source.name(),
                    error = %e,
                    "metric fetch failed, skipping source for this cycle"
                );
            }
        }
    }

    // Nothing available is not the same as a zero score: don't record a scan.
    if fetched == 0 {
        tracing::warn!(
            project = %target.project_name,
            "no metric source succeeded, not recording a scan"
        );
        return ScanOutcome::Skipped;
    }

    let contributions: Vec<MetricContribution> = registry
        .rules()
        .iter()
        .map(|rule| {
            let raw = raw_by_source
                .get(&rule.source)
                .and_then(|metrics| metrics.get(&rule.key))
                .copied();
            normalize(rule, raw)
        })
        .collect();

    let final_score = aggregate(&contributions);

    let scan = NewScan {
        project_name: target.project_name.clone(),
        scan_timestamp: Utc::now(),
        final_score,
        contributions: contributions
            .into_iter()
            .map(|c| NewContribution {
                rule_name: c.rule_name,
                source: c.source,
                metric_key: c.key,
                raw_value: c.raw_value,
                score: c.score,
                weighted_score: c.weighted_score,
                skipped: c.skipped,
            })
            .collect(),
    };

    match repo.persist(scan).await {
        Ok(saved) => {
            tracing::info!(
                project = %target.project_name,
                score = %saved.final_score,
                "scan persisted"
            );
            ScanOutcome::Persisted
        }
        Err(e) => {
            tracing::error!(
                project = %target.project_name,
                error = %e,
                "failed to persist scan, will retry next cycle"
            );
            ScanOutcome::Failed
        }
    }
}
