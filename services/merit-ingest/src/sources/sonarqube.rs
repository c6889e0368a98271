use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{MetricSource, SourceError, Target};

/// Metric keys requested from the platform per component.
const METRIC_KEYS: &str = "bugs,vulnerabilities,code_smells,coverage,duplicated_lines_density";

pub const SOURCE_NAME: &str = "sonarqube";

#[derive(Debug, Clone)]
pub struct SonarQubeConfig {
    pub base_url: String,
    pub token: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl SonarQubeConfig {
    /// Load SonarQube config from environment.
    ///
    /// Returns `None` if no token is set — the source is simply not enabled.
    pub fn from_env() -> Option<Self> {
        let token = match std::env::var("SONARQUBE_TOKEN").ok() {
            Some(v) if !v.trim().is_empty() => v,
            _ => return None,
        };

        let base_url = std::env::var("SONARQUBE_URL")
            .ok()
            .unwrap_or_else(|| "http://sonarqube:9000".to_string());
        let max_retries = std::env::var("SONARQUBE_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);
        let timeout_secs = std::env::var("SONARQUBE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Some(Self {
            base_url,
            token,
            max_retries,
            timeout_secs,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ComponentResponse {
    component: Component,
}

#[derive(Debug, Deserialize)]
struct Component {
    #[serde(default)]
    measures: Vec<Measure>,
}

#[derive(Debug, Deserialize)]
struct Measure {
    metric: String,
    value: Option<String>,
}

#[derive(Clone)]
pub struct SonarQubeSource {
    client: Client,
    config: SonarQubeConfig,
}

impl SonarQubeSource {
    pub fn new(config: SonarQubeConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// For testing: create a source pointing at a specific base URL (e.g., wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    async fn request_with_retry(&self, url: &str) -> Result<ComponentResponse, SourceError> {
        let mut last_error = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff_secs = std::cmp::min(1u64 << attempt, 30);
                tracing::warn!(attempt, backoff_secs, "retrying after backoff");
                tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
            }

            // The platform expects the token as the basic-auth username with
            // an empty password.
            let response = match self
                .client
                .get(url)
                .basic_auth(&self.config.token, Some(""))
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() || e.is_connect() {
                        continue;
                    }
                    return Err(SourceError::Request(e));
                }
            };

            let status = response.status();

            if status.is_success() {
                return response
                    .json::<ComponentResponse>()
                    .await
                    .map_err(SourceError::Request);
            }

            // Honor Retry-After header for 429
            if status == StatusCode::TOO_MANY_REQUESTS {
                if let Some(retry_after) = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                {
                    let wait = std::cmp::min(retry_after, 60);
                    tracing::warn!(wait, "rate-limited, waiting Retry-After");
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                }
                last_error = "429 Too Many Requests".to_string();
                continue;
            }

            // Retry on 5xx
            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                last_error = format!("{status}: {body}");
                continue;
            }

            // Fail fast on 4xx (except 429 handled above)
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Http { status, body });
        }

        Err(SourceError::MaxRetriesExceeded {
            attempts: self.config.max_retries + 1,
            last_error,
        })
    }
}

#[async_trait]
impl MetricSource for SonarQubeSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch(&self, target: &Target) -> Result<HashMap<String, f64>, SourceError> {
        let url = format!(
            "{}/api/measures/component?component={}&metricKeys={}",
            self.config.base_url, target.project_name, METRIC_KEYS
        );

        let response = self.request_with_retry(&url).await?;

        // Measure values arrive as strings; drop anything unparseable rather
        // than failing the whole component.
        let mut metrics = HashMap::new();
        for measure in response.component.measures {
            let Some(raw) = measure.value else { continue };
            match raw.parse::<f64>() {
                Ok(value) => {
                    metrics.insert(measure.metric, value);
                }
                Err(_) => {
                    tracing::warn!(
                        metric = %measure.metric,
                        value = %raw,
                        "non-numeric measure value, dropping"
                    );
                }
            }
        }

        Ok(metrics)
    }
}
