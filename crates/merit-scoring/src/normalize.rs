use serde::Serialize;

use crate::registry::{RuleKind, ScoringRule};

/// One rule applied to one project's raw value.
///
/// Contributions are produced in registry order; a skipped contribution adds
/// nothing to the final score and does not reduce the achievable maximum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricContribution {
    pub rule_name: String,
    pub source: String,
    pub key: String,
    pub raw_value: Option<f64>,
    pub score: f64,
    pub weighted_score: f64,
    pub skipped: bool,
}

/// Apply one scoring rule to an optional raw metric value.
///
/// An absent raw value means the metric was not computed this cycle: the
/// contribution is zero and marked skipped. Non-finite values from a
/// misbehaving source are treated the same way.
pub fn normalize(rule: &ScoringRule, raw: Option<f64>) -> MetricContribution {
    let Some(value) = raw.filter(|v| v.is_finite()) else {
        return MetricContribution {
            rule_name: rule.name.clone(),
            source: rule.source.clone(),
            key: rule.key.clone(),
            raw_value: None,
            score: 0.0,
            weighted_score: 0.0,
            skipped: true,
        };
    };

    // Registry validation guarantees base_max_value / scale_factor are
    // present for the kinds that read them; the fallbacks are never hit on
    // a loaded registry.
    let score = match rule.kind {
        RuleKind::DirectScaled => {
            let base = rule.base_max_value.unwrap_or(f64::MAX);
            let scale = rule.scale_factor.unwrap_or(1.0);
            value.min(base) * scale
        }
        RuleKind::InvertedScaled => {
            let scale = rule.scale_factor.unwrap_or(1.0);
            rule.max_score - value * scale
        }
        RuleKind::InvertedPercentage => {
            let base = rule.base_max_value.unwrap_or(100.0);
            rule.max_score - (value / base) * rule.max_score
        }
    };

    let score = score.clamp(0.0, rule.max_score);

    MetricContribution {
        rule_name: rule.name.clone(),
        source: rule.source.clone(),
        key: rule.key.clone(),
        raw_value: Some(value),
        score,
        // Weight applies to the already-clamped score, so fractional weights
        // can produce sub-range contributions. That is the de-emphasis
        // semantics of the config, not a bug.
        weighted_score: score * rule.weight,
        skipped: false,
    }
}
