use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use super::{MetricSource, SourceError, Target};

pub const SOURCE_NAME: &str = "openssf";

/// Raw-map key for the scorer's aggregate 0-10 score.
pub const OVERALL_SCORE_KEY: &str = "overall_score";

#[derive(Debug, Clone)]
pub struct ScorecardConfig {
    pub binary: String,
    pub github_token: String,
    pub timeout_secs: u64,
}

impl ScorecardConfig {
    /// Load Scorecard config from environment.
    ///
    /// Returns `None` if no GitHub token is set — the source is simply not
    /// enabled (the scorer cannot run unauthenticated against the API).
    pub fn from_env() -> Option<Self> {
        let github_token = match std::env::var("SCORECARD_GITHUB_TOKEN").ok() {
            Some(v) if !v.trim().is_empty() => v,
            _ => return None,
        };

        let binary = std::env::var("SCORECARD_BIN")
            .ok()
            .unwrap_or_else(|| "scorecard".to_string());
        let timeout_secs = std::env::var("SCORECARD_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);

        Some(Self {
            binary,
            github_token,
            timeout_secs,
        })
    }
}

/// The scorer's structured JSON report. Only `score` is required by the
/// default rules; every per-check score is exposed so new rules can be added
/// in config alone.
#[derive(Debug, Clone, Deserialize)]
pub struct ScorecardReport {
    pub score: f64,
    #[serde(default)]
    pub checks: Vec<ScorecardCheck>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScorecardCheck {
    pub name: String,
    pub score: f64,
}

pub fn flatten_report(report: &ScorecardReport) -> HashMap<String, f64> {
    let mut metrics = HashMap::with_capacity(report.checks.len() + 1);
    metrics.insert(OVERALL_SCORE_KEY.to_string(), report.score);
    for check in &report.checks {
        metrics.insert(check.name.clone(), check.score);
    }
    metrics
}

pub struct ScorecardSource {
    config: ScorecardConfig,
}

impl ScorecardSource {
    pub fn new(config: ScorecardConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MetricSource for ScorecardSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch(&self, target: &Target) -> Result<HashMap<String, f64>, SourceError> {
        let timeout = Duration::from_secs(self.config.timeout_secs);

        let mut command = Command::new(&self.config.binary);
        command
            .arg("--repo")
            .arg(&target.repo_url)
            .arg("--format")
            .arg("json")
            .env("GITHUB_AUTH_TOKEN", &self.config.github_token)
            .kill_on_drop(true);

        let output = tokio::time::timeout(timeout, command.output())
            .await
            .map_err(|_| SourceError::Timeout(timeout))??;

        if !output.status.success() {
            return Err(SourceError::Command {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let report: ScorecardReport = serde_json::from_slice(&output.stdout)
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        Ok(flatten_report(&report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    const SAMPLE_REPORT: &str = r#"{
        "date": "2026-08-01",
        "repo": {"name": "github.com/acme/widget", "commit": "abc123"},
        "score": 7.2,
        "checks": [
            {"name": "Maintained", "score": 10, "reason": "30 commits in 30 days"},
            {"name": "Code-Review", "score": 8, "reason": "most changes reviewed"},
            {"name": "Signed-Releases", "score": -1, "reason": "no releases found"}
        ]
    }"#;

    #[test]
    fn parse_and_flatten_sample_report() {
        let report: ScorecardReport = serde_json::from_str(SAMPLE_REPORT).unwrap();
        let metrics = flatten_report(&report);

        assert!((metrics[OVERALL_SCORE_KEY] - 7.2).abs() < f64::EPSILON);
        assert_eq!(metrics["Maintained"], 10.0);
        assert_eq!(metrics["Code-Review"], 8.0);
        // Not-applicable checks come through as-is; rules decide relevance
        assert_eq!(metrics["Signed-Releases"], -1.0);
        assert_eq!(metrics.len(), 4);
    }

    #[test]
    fn report_without_checks_still_has_overall_score() {
        let report: ScorecardReport = serde_json::from_str(r#"{"score": 4.5}"#).unwrap();
        let metrics = flatten_report(&report);
        assert_eq!(metrics.len(), 1);
        assert!((metrics[OVERALL_SCORE_KEY] - 4.5).abs() < f64::EPSILON);
    }

    fn fake_binary(dir: &tempfile::TempDir, script: &str) -> String {
        let path = dir.path().join("fake-scorecard");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(script.as_bytes()).unwrap();
        drop(file);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    fn test_target() -> Target {
        Target {
            repo_url: "github.com/acme/widget".to_string(),
            project_name: "widget".to_string(),
        }
    }

    #[tokio::test]
    async fn fetch_runs_binary_and_parses_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let script = format!("#!/bin/sh\ncat <<'EOF'\n{SAMPLE_REPORT}\nEOF\n");
        let binary = fake_binary(&dir, &script);

        let source = ScorecardSource::new(ScorecardConfig {
            binary,
            github_token: "tok".to_string(),
            timeout_secs: 10,
        });

        let metrics = source.fetch(&test_target()).await.unwrap();
        assert!((metrics[OVERALL_SCORE_KEY] - 7.2).abs() < f64::EPSILON);
        assert_eq!(metrics["Maintained"], 10.0);
    }

    #[tokio::test]
    async fn fetch_fails_on_nonzero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_binary(&dir, "#!/bin/sh\necho 'repo unreachable' >&2\nexit 3\n");

        let source = ScorecardSource::new(ScorecardConfig {
            binary,
            github_token: "tok".to_string(),
            timeout_secs: 10,
        });

        let err = source.fetch(&test_target()).await.unwrap_err();
        match err {
            SourceError::Command { stderr, .. } => {
                assert!(stderr.contains("repo unreachable"), "got: {stderr}");
            }
            other => panic!("expected Command error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_fails_on_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_binary(&dir, "#!/bin/sh\necho 'not json'\n");

        let source = ScorecardSource::new(ScorecardConfig {
            binary,
            github_token: "tok".to_string(),
            timeout_secs: 10,
        });

        let err = source.fetch(&test_target()).await.unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[tokio::test]
    async fn fetch_times_out_on_hung_binary() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_binary(&dir, "#!/bin/sh\nsleep 30\n");

        let source = ScorecardSource::new(ScorecardConfig {
            binary,
            github_token: "tok".to_string(),
            timeout_secs: 1,
        });

        let err = source.fetch(&test_target()).await.unwrap_err();
        assert!(matches!(err, SourceError::Timeout(_)));
    }

    #[tokio::test]
    async fn fetch_fails_on_missing_binary() {
        let source = ScorecardSource::new(ScorecardConfig {
            binary: "/nonexistent/scorecard".to_string(),
            github_token: "tok".to_string(),
            timeout_secs: 10,
        });

        let err = source.fetch(&test_target()).await.unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }

    // ── Config tests ─────────────────────────────────────────────

    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn from_env_returns_none_without_token() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::remove_var("SCORECARD_GITHUB_TOKEN");
        assert!(ScorecardConfig::from_env().is_none());
    }

    #[test]
    fn from_env_defaults() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("SCORECARD_GITHUB_TOKEN", "tok");
        std::env::remove_var("SCORECARD_BIN");
        std::env::remove_var("SCORECARD_TIMEOUT_SECS");
        let cfg = ScorecardConfig::from_env().unwrap();
        assert_eq!(cfg.binary, "scorecard");
        assert_eq!(cfg.timeout_secs, 300);
        std::env::remove_var("SCORECARD_GITHUB_TOKEN");
    }

    #[test]
    fn from_env_honors_binary_override() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("SCORECARD_GITHUB_TOKEN", "tok");
        std::env::set_var("SCORECARD_BIN", "/usr/local/bin/scorecard");
        let cfg = ScorecardConfig::from_env().unwrap();
        assert_eq!(cfg.binary, "/usr/local/bin/scorecard");
        std::env::remove_var("SCORECARD_GITHUB_TOKEN");
        std::env::remove_var("SCORECARD_BIN");
    }
}
