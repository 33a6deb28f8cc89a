//! Per-action risk scoring.
//!
//! Every action carries a risk in `[0, 1]`, neutral (`0.5`) until scored.
//! Anomalies attributed to an action push its risk toward 1 in proportion
//! to their severity; a completed action with no attributed anomaly in the
//! recent window decays toward 0.

use std::fmt;

use tracing::debug;

use scout_contracts::{
    action::ActionId,
    anomaly::{AnomalyLog, AnomalySeverity},
    config::RiskConfig,
    knowledge::{RiskScores, NEUTRAL_RISK},
};

/// How strongly one anomaly of `severity` moves a risk score.
pub fn severity_weight(severity: AnomalySeverity) -> f64 {
    match severity {
        AnomalySeverity::Low => 0.2,
        AnomalySeverity::Medium => 0.5,
        AnomalySeverity::High => 0.9,
    }
}

/// `r + (1 - r) * lambda * w(severity)`, clamped to `[0, 1]`.
pub fn escalate(risk: f64, severity: AnomalySeverity, learning_rate: f64) -> f64 {
    (risk + (1.0 - risk) * learning_rate * severity_weight(severity)).clamp(0.0, 1.0)
}

/// `r * (1 - lambda / 2)`, clamped to `[0, 1]`.
pub fn decay(risk: f64, learning_rate: f64) -> f64 {
    (risk * (1.0 - learning_rate * 0.5)).clamp(0.0, 1.0)
}

/// Human-readable risk bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskCategory {
    Safe,
    LowRisk,
    MediumRisk,
    HighRisk,
}

impl RiskCategory {
    pub fn from_score(score: f64) -> Self {
        if score < 0.2 {
            Self::Safe
        } else if score < 0.5 {
            Self::LowRisk
        } else if score < 0.8 {
            Self::MediumRisk
        } else {
            Self::HighRisk
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Safe => "SAFE",
            Self::LowRisk => "LOW_RISK",
            Self::MediumRisk => "MEDIUM_RISK",
            Self::HighRisk => "HIGH_RISK",
        };
        f.write_str(s)
    }
}

/// The `top_n` lowest-risk offered actions, lowest first.
///
/// Ties keep offered order.
pub fn safest_actions<'a>(offered: &'a [ActionId], risks: &RiskScores, top_n: usize) -> Vec<&'a ActionId> {
    let mut ranked: Vec<(&ActionId, f64)> = offered.iter().map(|a| (a, risks.get(a))).collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked.into_iter().take(top_n).map(|(a, _)| a).collect()
}

/// Risk updates and risk queries, parameterized by `RiskConfig`.
#[derive(Debug, Clone, Default)]
pub struct RiskPolicy {
    config: RiskConfig,
}

impl RiskPolicy {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Give every offered action without a score the neutral risk.
    pub fn initialize_risk_scores(&self, risks: &mut RiskScores, offered: &[ActionId]) {
        for action in offered {
            if !risks.is_scored(action) {
                risks.set(action.clone(), NEUTRAL_RISK);
            }
        }
    }

    /// Fold the most recent anomalies into the risk scores.
    ///
    /// Each of the last `anomaly_window` reports escalates the risk of the
    /// action it is attributed to. If `completed` (the last executed action)
    /// has no attributed report in that window, its risk decays instead.
    pub fn update_from_anomalies(
        &self,
        risks: &mut RiskScores,
        anomalies: &AnomalyLog,
        completed: Option<&ActionId>,
    ) {
        let window = anomalies.recent(self.config.anomaly_window);

        for report in window {
            if let Some(action) = &report.action_id {
                let before = risks.get(action);
                let after = escalate(before, report.severity, self.config.learning_rate);
                risks.set(action.clone(), after);
                debug!(
                    action = %action,
                    severity = %report.severity,
                    before,
                    after,
                    "risk escalated"
                );
            }
        }

        if let Some(action) = completed {
            if !window.iter().any(|r| r.attributed_to(action)) {
                let before = risks.get(action);
                let after = decay(before, self.config.learning_rate);
                risks.set(action.clone(), after);
                debug!(action = %action, before, after, "risk decayed");
            }
        }
    }

    /// True when the action's risk is at or above `avoid_threshold`, or it
    /// drew at least `avoid_high_severity_count` HIGH anomalies among the
    /// last `avoid_history_window` reports.
    pub fn should_avoid(&self, action: &ActionId, risks: &RiskScores, anomalies: &AnomalyLog) -> bool {
        if risks.get(action) >= self.config.avoid_threshold {
            return true;
        }

        let recent_high = anomalies
            .recent(self.config.avoid_history_window)
            .iter()
            .filter(|r| r.is_high() && r.attributed_to(action))
            .count();
        recent_high >= self.config.avoid_high_severity_count
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
