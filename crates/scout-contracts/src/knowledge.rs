//! Learned knowledge carried across reasoning cycles.
//!
//! `Baselines` holds one running statistic per metric name; `RiskScores`
//! holds one risk value per action. Both are plain data threaded through
//! each cycle; the core keeps no hidden session state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::ActionId;

/// Risk assumed for an action that has never been scored.
pub const NEUTRAL_RISK: f64 = 0.5;

/// Running `{mean, std_dev, count}` for one metric.
///
/// Updated with Welford's online algorithm; no sample history is stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    pub mean: f64,
    pub std_dev: f64,
    pub count: u64,
}

impl BaselineStats {
    pub fn new(mean: f64, std_dev: f64, count: u64) -> Self {
        Self { mean, std_dev, count }
    }

    /// The baseline after a single first observation.
    pub fn first(value: f64) -> Self {
        Self::new(value, 0.0, 1)
    }

    /// Fold one more observation into the statistic.
    pub fn update(&self, value: f64) -> Self {
        let count = self.count + 1;
        let n = count as f64;
        let delta = value - self.mean;
        let mean = self.mean + delta / n;
        let delta2 = value - mean;
        let variance = (self.count as f64 * self.std_dev.powi(2) + delta * delta2) / n;
        // Rounding can push a zero variance a hair below zero.
        let std_dev = variance.max(0.0).sqrt();
        Self { mean, std_dev, count }
    }

    /// Fewer than `min_samples` observations: compare nothing against it.
    pub fn is_provisional(&self, min_samples: u64) -> bool {
        self.count < min_samples
    }
}

/// Per-metric baselines, keyed by metric name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Baselines(BTreeMap<String, BaselineStats>);

impl Baselines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, metric: &str) -> Option<&BaselineStats> {
        self.0.get(metric)
    }

    /// Replace the stored statistic for `metric`.
    pub fn insert(&mut self, metric: impl Into<String>, stats: BaselineStats) {
        self.0.insert(metric.into(), stats);
    }

    /// Fold `value` into `metric`, creating the baseline on first sight.
    pub fn observe(&mut self, metric: &str, value: f64) -> BaselineStats {
        let next = match self.0.get(metric) {
            Some(stats) => stats.update(value),
            None => BaselineStats::first(value),
        };
        self.0.insert(metric.to_string(), next);
        next
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BaselineStats)> {
        self.0.iter()
    }
}

/// Per-action risk in `[0, 1]`; unseen actions read as `NEUTRAL_RISK`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskScores(BTreeMap<ActionId, f64>);

impl RiskScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, action: &ActionId) -> f64 {
        self.0.get(action).copied().unwrap_or(NEUTRAL_RISK)
    }

    /// True once the action has an explicit score.
    pub fn is_scored(&self, action: &ActionId) -> bool {
        self.0.contains_key(action)
    }

    /// Store a score, clamped to `[0, 1]`.
    pub fn set(&mut self, action: ActionId, risk: f64) {
        self.0.insert(action, risk.clamp(0.0, 1.0));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ActionId, &f64)> {
        self.0.iter()
    }
}

/// Everything learned so far in the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Knowledge {
    #[serde(default)]
    pub baselines: Baselines,
    #[serde(default)]
    pub risk_scores: RiskScores,
}
