//! Baseline stability: is this metric value normal for this application?
//!
//! Metrics are pulled from an observation by `extract_metrics` and compared
//! against the session's running baseline with `check_stability`. The
//! baseline is always updated with the new value, violation or not.

use std::collections::BTreeMap;

use serde_json::Value;

use scout_contracts::{
    action::ActionId,
    anomaly::{AnomalyCategory, AnomalyEvidence, AnomalySeverity},
    config::BaselineConfig,
    knowledge::BaselineStats,
    observation::Observation,
};

use crate::checks::{InvariantKind, Violation};

/// Metric keys extracted whenever they hold a number.
const WELL_KNOWN_METRICS: [&str; 3] = ["response_time_ms", "element_count", "error_count"];

/// Compare `value` against `baseline` and return the updated baseline.
///
/// - no baseline: start one at `{value, 0, 1}`, never a violation
/// - fewer than `min_samples` observations: update only
/// - zero spread: violation when the value moves more than
///   `zero_variance_tolerance` (relative) away from the mean
/// - otherwise: violation when the z-score exceeds `sigma_threshold`
///
/// Violations are MEDIUM / REGRESSION.
pub fn check_stability(
    metric: &str,
    value: f64,
    baseline: Option<&BaselineStats>,
    config: &BaselineConfig,
) -> (Option<Violation>, BaselineStats) {
    let Some(stats) = baseline else {
        return (None, BaselineStats::first(value));
    };
    let updated = stats.update(value);

    if stats.is_provisional(config.min_samples) {
        return (None, updated);
    }

    let mean = stats.mean;
    let std_dev = stats.std_dev;
    let deviation = (value - mean).abs();

    let violation = if std_dev == 0.0 {
        (deviation > config.zero_variance_tolerance * mean.abs()).then(|| {
            let deviation_percent = if mean != 0.0 {
                deviation / mean.abs() * 100.0
            } else {
                0.0
            };
            Violation {
                kind: InvariantKind::BaselineStability,
                severity: AnomalySeverity::Medium,
                category: AnomalyCategory::Regression,
                description: format!(
                    "Stability violation: {metric} deviated from perfect baseline"
                ),
                evidence: AnomalyEvidence::new(
                    format!("{metric} should remain stable at {mean:.2} (std_dev=0)"),
                    format!("{metric} = {value:.2} (deviation detected)"),
                )
                .with_context("baseline_mean", mean)
                .with_context("current_value", value)
                .with_context("deviation_percent", deviation_percent),
            }
        })
    } else {
        let z_score = deviation / std_dev;
        let threshold = config.sigma_threshold;
        (z_score > threshold).then(|| Violation {
            kind: InvariantKind::BaselineStability,
            severity: AnomalySeverity::Medium,
            category: AnomalyCategory::Regression,
            description: format!("Stability violation: {metric} exceeded {threshold} sigma threshold"),
            evidence: AnomalyEvidence::new(
                format!(
                    "{metric} within {threshold} sigma of baseline (mean={mean:.2}, std_dev={std_dev:.2})"
                ),
                format!("{metric} = {value:.2} (z={z_score:.2})"),
            )
            .with_context("baseline_mean", mean)
            .with_context("baseline_std_dev", std_dev)
            .with_context("current_value", value)
            .with_context("z_score", z_score)
            .with_context("threshold", threshold),
        })
    };

    (violation, updated)
}

/// Pull the numeric metrics out of an observation.
///
/// Extracts `response_time_ms`, `element_count`, `error_count`, any numeric
/// key ending in `_count`, and `{action}_duration_ms` when the last action
/// is known. Booleans and non-numeric values are ignored.
pub fn extract_metrics(observation: &Observation, action: Option<&ActionId>) -> BTreeMap<String, f64> {
    let mut metrics = BTreeMap::new();

    for key in WELL_KNOWN_METRICS {
        if let Some(v) = observation.get(key).and_then(Value::as_f64) {
            metrics.insert(key.to_string(), v);
        }
    }

    if let Some(action) = action {
        let key = format!("{action}_duration_ms");
        if let Some(v) = observation.get(&key).and_then(Value::as_f64) {
            metrics.insert(key, v);
        }
    }

    for (key, value) in observation.iter() {
        if key.ends_with("_count") {
            if let Some(v) = value.as_f64() {
                metrics.insert(key.clone(), v);
            }
        }
    }

    metrics
}

// ── Tests ────────────────────────────────────────────────────────────────────
