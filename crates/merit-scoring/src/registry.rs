//! Declarative scoring rules — the sole tuning surface of the scorecard.
//!
//! Rules are loaded once at startup from a YAML document and validated as a
//! whole: one bad rule rejects the entire registry, so the process never
//! scores against a partially valid configuration.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read scoring config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse scoring config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid rule `{rule}`: {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("duplicate rule name `{0}`")]
    DuplicateName(String),

    #[error("scoring config contains no rules")]
    Empty,
}

/// How a raw metric value is converted into points.
///
/// An unrecognized value in the config fails deserialization of the whole
/// document, so a new type must be added here before it can be configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Rewards higher raw values: `min(raw, base_max_value) * scale_factor`.
    DirectScaled,
    /// Each occurrence subtracts a fixed penalty: `max_score - raw * scale_factor`.
    InvertedScaled,
    /// Lower-is-better percentage: `max_score - (raw / base_max_value) * max_score`.
    InvertedPercentage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringRule {
    pub name: String,
    pub source: String,
    pub key: String,
    #[serde(rename = "type")]
    pub kind: RuleKind,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub base_max_value: Option<f64>,
    #[serde(default)]
    pub scale_factor: Option<f64>,
    pub max_score: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl ScoringRule {
    /// Check the per-kind field requirements.
    ///
    /// Required-but-absent fields are a load-time error, never a scoring-time
    /// fallback.
    fn validate(&self) -> Result<(), RegistryError> {
        if !self.max_score.is_finite() || self.max_score <= 0.0 {
            return Err(self.invalid("max_score must be a finite value > 0"));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(self.invalid("weight must be a finite value >= 0"));
        }

        match self.kind {
            RuleKind::DirectScaled => {
                self.require_base_max_value()?;
                self.require_scale_factor()?;
            }
            RuleKind::InvertedScaled => {
                self.require_scale_factor()?;
            }
            RuleKind::InvertedPercentage => {
                self.require_base_max_value()?;
            }
        }

        Ok(())
    }

    fn require_base_max_value(&self) -> Result<(), RegistryError> {
        match self.base_max_value {
            Some(v) if v.is_finite() && v > 0.0 => Ok(()),
            Some(_) => Err(self.invalid("base_max_value must be a finite value > 0")),
            None => Err(self.invalid("base_max_value is required for this rule type")),
        }
    }

    fn require_scale_factor(&self) -> Result<(), RegistryError> {
        match self.scale_factor {
            Some(v) if v.is_finite() => Ok(()),
            Some(_) => Err(self.invalid("scale_factor must be a finite value")),
            None => Err(self.invalid("scale_factor is required for this rule type")),
        }
    }

    fn invalid(&self, reason: &str) -> RegistryError {
        RegistryError::InvalidRule {
            rule: self.name.clone(),
            reason: reason.to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleDocument {
    metrics: Vec<ScoringRule>,
}

/// Ordered, read-only view of the validated scoring rules.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: Vec<ScoringRule>,
}

impl RuleRegistry {
    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, RegistryError> {
        let doc: RuleDocument = serde_yaml::from_str(raw)?;
        Self::from_rules(doc.metrics)
    }

    pub fn from_rules(rules: Vec<ScoringRule>) -> Result<Self, RegistryError> {
        if rules.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        for rule in &rules {
            rule.validate()?;
            if !seen.insert(rule.name.as_str()) {
                return Err(RegistryError::DuplicateName(rule.name.clone()));
            }
        }

        Ok(Self { rules })
    }

    /// Rules in document order — breakdown reporting preserves this order.
    pub fn rules(&self) -> &[ScoringRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
