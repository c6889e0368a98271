pub mod scorecard;
pub mod sonarqube;

use std::collections::HashMap;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },

    #[error("command exited with {status}: {stderr}")]
    Command {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("malformed report: {0}")]
    Malformed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A repository to scan, identified the way the supply-chain scorer expects
/// (`host/owner/repo`). The project name is the final path segment and doubles
/// as the static-analysis component key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub repo_url: String,
    pub project_name: String,
}

impl Target {
    pub fn from_line(line: &str) -> Self {
        let repo_url = line.trim().to_string();
        let project_name = repo_url
            .rsplit('/')
            .next()
            .unwrap_or(repo_url.as_str())
            .to_string();
        Self {
            repo_url,
            project_name,
        }
    }
}

/// One external metric source, pulled per target.
///
/// A fetch returns whatever metric keys the source computed this cycle;
/// missing keys are normal and surface as skipped contributions downstream.
#[async_trait]
pub trait MetricSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch(&self, target: &Target) -> Result<HashMap<String, f64>, SourceError>;
}
