//! Tunable thresholds for every SCOUT component.
//!
//! `ScoutConfig` is deserialized from TOML. Every section and every field
//! has a default, so an empty document is a valid configuration and a
//! partial one overrides only what it names.
//!
//! ```toml
//! [baseline]
//! sigma_threshold = 2.5
//!
//! [router]
//! high_severity_limit = 4
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ScoutError, ScoutResult};

/// Baseline stability check settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// z-score above which a metric counts as unstable.
    pub sigma_threshold: f64,
    /// Observations required before a baseline can produce a violation.
    pub min_samples: u64,
    /// Relative deviation tolerated while a baseline has zero variance.
    pub zero_variance_tolerance: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            sigma_threshold: 2.0,
            min_samples: 3,
            zero_variance_tolerance: 0.01,
        }
    }
}

/// Structural invariant settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvariantConfig {
    /// Identical consecutive observations that count as a stall.
    pub forward_progress_window: usize,
    /// Action-id fragments marking an action that should change the offered set.
    pub state_changing_keywords: Vec<String>,
    /// Action-id fragments that legitimize an entity disappearing.
    pub deletion_keywords: Vec<String>,
}

impl Default for InvariantConfig {
    fn default() -> Self {
        Self {
            forward_progress_window: 3,
            state_changing_keywords: [
                "submit", "navigate", "create", "delete", "update", "login", "logout",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            deletion_keywords: vec!["delete".to_string(), "remove".to_string()],
        }
    }
}

/// Risk policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub learning_rate: f64,
    /// Most recent anomalies considered per cycle.
    pub anomaly_window: usize,
    /// Score at or above which an action should be avoided.
    pub avoid_threshold: f64,
    /// HIGH anomalies attributed to an action that also mark it avoidable.
    pub avoid_high_severity_count: usize,
    /// History scanned for those HIGH anomalies.
    pub avoid_history_window: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.2,
            anomaly_window: 10,
            avoid_threshold: 0.8,
            avoid_high_severity_count: 2,
            avoid_history_window: 10,
        }
    }
}

/// Exploration policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    pub coverage_weight: f64,
    pub safety_weight: f64,
    /// Actions riskier than this are skipped unless nothing else is left.
    pub max_risk_threshold: f64,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            coverage_weight: 0.7,
            safety_weight: 0.3,
            max_risk_threshold: 0.9,
        }
    }
}

/// Control router settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub high_severity_window: usize,
    pub high_severity_limit: usize,
    pub consecutive_high_window: usize,
    /// Total anomaly count above which the HIGH ratio is checked.
    pub bulk_anomaly_floor: usize,
    pub bulk_high_ratio: f64,
    pub deep_test_window: usize,
    pub deep_test_risk_threshold: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            high_severity_window: 5,
            high_severity_limit: 3,
            consecutive_high_window: 3,
            bulk_anomaly_floor: 20,
            bulk_high_ratio: 0.5,
            deep_test_window: 3,
            deep_test_risk_threshold: 0.75,
        }
    }
}

/// Knowledge-update settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Recent anomalies scanned to decide whether the last action failed.
    pub success_window: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self { success_window: 3 }
    }
}

/// Settings for drivers that advance the execution context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Observations kept in `ExecutionContext::observation_history`.
    pub history_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { history_capacity: 16 }
    }
}

/// The complete SCOUT configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub baseline: BaselineConfig,
    pub invariants: InvariantConfig,
    pub risk: RiskConfig,
    pub exploration: ExplorationConfig,
    pub router: RouterConfig,
    pub learning: LearningConfig,
    pub session: SessionConfig,
}

impl ScoutConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `ScoutError::ConfigError` if the TOML is malformed or a value
    /// is out of range.
    pub fn from_toml_str(s: &str) -> ScoutResult<Self> {
        let config: ScoutConfig = toml::from_str(s).map_err(|e| ScoutError::ConfigError {
            reason: format!("failed to parse SCOUT config TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as TOML.
    pub fn from_file(path: &Path) -> ScoutResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ScoutError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reject values the components cannot work with.
    pub fn validate(&self) -> ScoutResult<()> {
        let unit = |name: &str, v: f64| -> ScoutResult<()> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(ScoutError::ConfigError {
                    reason: format!("{name} must be within [0, 1], got {v}"),
                })
            }
        };

        unit("risk.learning_rate", self.risk.learning_rate)?;
        unit("risk.avoid_threshold", self.risk.avoid_threshold)?;
        unit("exploration.max_risk_threshold", self.exploration.max_risk_threshold)?;
        unit("router.bulk_high_ratio", self.router.bulk_high_ratio)?;
        unit("router.deep_test_risk_threshold", self.router.deep_test_risk_threshold)?;

        if self.baseline.sigma_threshold <= 0.0 {
            return Err(ScoutError::ConfigError {
                reason: format!(
                    "baseline.sigma_threshold must be positive, got {}",
                    self.baseline.sigma_threshold
                ),
            });
        }
        if self.invariants.forward_progress_window < 2 {
            return Err(ScoutError::ConfigError {
                reason: "invariants.forward_progress_window must be at least 2".to_string(),
            });
        }
        Ok(())
    }
}
