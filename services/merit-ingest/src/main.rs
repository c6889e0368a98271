mod pipeline;
mod scheduler;
mod settings;
mod sources;
mod targets;

use std::sync::Arc;
use std::time::Duration;

use merit_config::init_tracing;
use merit_db::scan::pg_repository::PgScanRepository;
use merit_scoring::RuleRegistry;

use crate::pipeline::IngestPipeline;
use crate::scheduler::CycleScheduler;
use crate::settings::IngestSettings;
use crate::sources::scorecard::{ScorecardConfig, ScorecardSource};
use crate::sources::sonarqube::{SonarQubeConfig, SonarQubeSource};
use crate::sources::{MetricSource, Target};

#[tokio::main]
async fn main() {
    init_tracing("info");
    let _ = dotenvy::dotenv();

    tracing::info!(service = "merit-ingest", "starting");

    let settings = IngestSettings::from_env().expect("failed to load ingest settings");

    // Fail fast: never start scoring against an invalid registry.
    let registry = RuleRegistry::from_path(&settings.scoring_config_path)
        .expect("invalid scoring configuration");
    tracing::info!(rules = registry.len(), "scoring registry loaded");

    let targets = targets::load_targets(&settings.repositories_file)
        .expect("failed to load repository list");
    tracing::info!(targets = targets.len(), "repository list loaded");

    let pool = merit_db::create_pool(&settings.database_url)
        .await
        .expect("failed to connect to database");
    let repo = Arc::new(PgScanRepository::new(pool));

    // Sources are optional — each one runs only if its credentials are set
    let mut analysis_sources: Vec<Arc<dyn MetricSource>> = Vec::new();
    match SonarQubeConfig::from_env() {
        Some(config) => {
            tracing::info!(base_url = %config.base_url, "sonarqube source configured");
            let source = SonarQubeSource::new(config).expect("failed to create sonarqube client");
            analysis_sources.push(Arc::new(source));
        }
        None => {
            tracing::info!("no sonarqube token configured, skipping sonarqube source");
        }
    }

    let mut supply_chain_sources: Vec<Arc<dyn MetricSource>> = Vec::new();
    match ScorecardConfig::from_env() {
        Some(config) => {
            tracing::info!(binary = %config.binary, "scorecard source configured");
            supply_chain_sources.push(Arc::new(ScorecardSource::new(config)));
        }
        None => {
            tracing::info!("no scorecard github token configured, skipping scorecard source");
        }
    }

    let pipeline = Arc::new(IngestPipeline::new(
        Arc::new(registry),
        repo,
        settings.max_concurrency,
    ));

    // Run one combined cycle on startup, then hand off to the cadences
    let all_sources: Vec<Arc<dyn MetricSource>> = analysis_sources
        .iter()
        .chain(supply_chain_sources.iter())
        .cloned()
        .collect();
    if all_sources.is_empty() {
        tracing::warn!("no metric sources configured — nothing will be ingested");
    } else {
        tracing::info!("running startup ingestion cycle");
        pipeline.run_cycle(&targets, &all_sources).await;
    }

    let mut scheduler = CycleScheduler::new();
    if !analysis_sources.is_empty() {
        spawn_cadence(
            &mut scheduler,
            "static-analysis",
            Duration::from_secs(settings.analysis_interval_secs),
            pipeline.clone(),
            targets.clone(),
            analysis_sources,
        );
    }
    if !supply_chain_sources.is_empty() {
        spawn_cadence(
            &mut scheduler,
            "supply-chain",
            Duration::from_secs(settings.supply_chain_interval_secs),
            pipeline.clone(),
            targets.clone(),
            supply_chain_sources,
        );
    }

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl-c");
    scheduler.shutdown();
    tracing::info!("shutting down");
}

fn spawn_cadence(
    scheduler: &mut CycleScheduler,
    label: &'static str,
    period: Duration,
    pipeline: Arc<IngestPipeline<PgScanRepository>>,
    targets: Vec<Target>,
    sources: Vec<Arc<dyn MetricSource>>,
) {
    scheduler.spawn_cycle(label, period, move || {
        let pipeline = pipeline.clone();
        let targets = targets.clone();
        let sources = sources.clone();
        async move {
            pipeline.run_cycle(&targets, &sources).await;
        }
    });
}
