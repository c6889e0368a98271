use rust_decimal::Decimal;

use crate::normalize::MetricContribution;
use crate::registry::ScoringRule;

/// Sum the weighted contributions into the final score.
///
/// The aggregate is an open-ended point total, not a percentage: its maximum
/// is the sum of `max_score * weight` across the configured rules.
/// Accumulation happens in fixed-point decimal so repeated runs over the same
/// inputs round identically regardless of summation grouping.
pub fn aggregate(contributions: &[MetricContribution]) -> Decimal {
    contributions
        .iter()
        .filter(|c| !c.skipped)
        .map(|c| Decimal::from_f64_retain(c.weighted_score).unwrap_or(Decimal::ZERO))
        .sum::<Decimal>()
        .round_dp(2)
}

/// The highest final score the given rules can produce.
pub fn max_possible(rules: &[ScoringRule]) -> Decimal {
    rules
        .iter()
        .map(|r| Decimal::from_f64_retain(r.max_score * r.weight).unwrap_or(Decimal::ZERO))
        .sum::<Decimal>()
        .round_dp(2)
}
