use std::path::PathBuf;

use merit_common::error::{MeritError, MeritResult};

/// Ingest-service knobs, all from environment.
///
/// Source credentials live with their adapters (`SonarQubeConfig`,
/// `ScorecardConfig`); this covers everything else the service needs to run.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub database_url: String,
    pub scoring_config_path: PathBuf,
    pub repositories_file: PathBuf,
    /// Static-analysis cadence. Default 6h.
    pub analysis_interval_secs: u64,
    /// Supply-chain scorer cadence — the scorer shells out per repository,
    /// so it runs far less often. Default 24h.
    pub supply_chain_interval_secs: u64,
    pub max_concurrency: usize,
}

impl IngestSettings {
    pub fn from_env() -> MeritResult<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| MeritError::Config("DATABASE_URL is required but not set".to_string()))?;

        Ok(Self {
            database_url,
            scoring_config_path: var_or("SCORING_CONFIG_PATH", "config/scoring.yml").into(),
            repositories_file: var_or("REPOSITORIES_FILE", "repositories.txt").into(),
            analysis_interval_secs: parse_var_or("ANALYSIS_INTERVAL_SECS", 21_600)?,
            supply_chain_interval_secs: parse_var_or("SUPPLY_CHAIN_INTERVAL_SECS", 86_400)?,
            max_concurrency: parse_var_or("INGEST_MAX_CONCURRENCY", 4)?,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_var_or<T: std::str::FromStr>(key: &str, default: T) -> MeritResult<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| MeritError::Config(format!("invalid {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn settings_require_database_url() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::remove_var("DATABASE_URL");
        assert!(IngestSettings::from_env().is_err());
    }

    #[test]
    fn settings_defaults() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("DATABASE_URL", "postgres://localhost/merit_test");
        std::env::remove_var("ANALYSIS_INTERVAL_SECS");
        std::env::remove_var("SUPPLY_CHAIN_INTERVAL_SECS");
        std::env::remove_var("INGEST_MAX_CONCURRENCY");

        let settings = IngestSettings::from_env().expect("should parse");
        assert_eq!(settings.analysis_interval_secs, 21_600);
        assert_eq!(settings.supply_chain_interval_secs, 86_400);
        assert_eq!(settings.max_concurrency, 4);
        assert_eq!(
            settings.repositories_file,
            PathBuf::from("repositories.txt")
        );

        std::env::remove_var("DATABASE_URL");
    }

    #[test]
    fn settings_reject_unparseable_interval() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("DATABASE_URL", "postgres://localhost/merit_test");
        std::env::set_var("ANALYSIS_INTERVAL_SECS", "six hours");

        let err = IngestSettings::from_env().unwrap_err();
        assert!(err.to_string().contains("ANALYSIS_INTERVAL_SECS"));

        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("ANALYSIS_INTERVAL_SECS");
    }

    #[test]
    fn settings_honor_overrides() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("DATABASE_URL", "postgres://localhost/merit_test");
        std::env::set_var("ANALYSIS_INTERVAL_SECS", "600");
        std::env::set_var("INGEST_MAX_CONCURRENCY", "8");

        let settings = IngestSettings::from_env().expect("should parse");
        assert_eq!(settings.analysis_interval_secs, 600);
        assert_eq!(settings.max_concurrency, 8);

        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("ANALYSIS_INTERVAL_SECS");
        std::env::remove_var("INGEST_MAX_CONCURRENCY");
    }
}
