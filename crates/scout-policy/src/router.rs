//! The control router: CONTINUE, DEEP_TEST, or TERMINATE.
//!
//! Conditions are evaluated in strict priority order and the first match
//! wins:
//!
//! 1. TERMINATE: the offered set is empty or holds only blank ids
//! 2. TERMINATE: the step limit is reached
//! 3. TERMINATE: too many HIGH anomalies in the recent window
//! 4. TERMINATE: the last few anomalies are all HIGH
//! 5. TERMINATE: a long history dominated by HIGH anomalies
//! 6. DEEP_TEST: a recent MEDIUM or REGRESSION anomaly, or a risky last action
//! 7. CONTINUE
//!
//! The router reads anomalies and risk scores and writes nothing.

use std::fmt;

use tracing::info;

use scout_contracts::{
    action::ActionId,
    anomaly::{AnomalyCategory, AnomalyLog, AnomalySeverity},
    config::RouterConfig,
    knowledge::RiskScores,
    state::{ControlDecision, CycleView},
};
use scout_core::traits::{ControlRouter, Routing};

/// The condition that decided a cycle's control value.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteReason {
    NoActionsAvailable,
    StepLimitReached { max_steps: u64 },
    RepeatedHighSeverity { count: usize },
    ConsecutiveHighSeverity { count: usize },
    ExcessiveHighSeverityRate { limit: f64 },
    MediumSeverityAnomaly,
    BaselineRegression,
    HighRiskAction { action: ActionId, risk: f64 },
    Nominal,
}

impl RouteReason {
    pub fn control(&self) -> ControlDecision {
        match self {
            Self::NoActionsAvailable
            | Self::StepLimitReached { .. }
            | Self::RepeatedHighSeverity { .. }
            | Self::ConsecutiveHighSeverity { .. }
            | Self::ExcessiveHighSeverityRate { .. } => ControlDecision::Terminate,
            Self::MediumSeverityAnomaly
            | Self::BaselineRegression
            | Self::HighRiskAction { .. } => ControlDecision::DeepTest,
            Self::Nominal => ControlDecision::Continue,
        }
    }
}

impl fmt::Display for RouteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActionsAvailable => write!(f, "No available actions remaining"),
            Self::StepLimitReached { max_steps } => write!(f, "Maximum steps reached ({max_steps})"),
            Self::RepeatedHighSeverity { count } => {
                write!(f, "Repeated high-severity anomalies ({count} in recent history)")
            }
            Self::ConsecutiveHighSeverity { count } => {
                write!(f, "{count} consecutive high-severity anomalies detected")
            }
            Self::ExcessiveHighSeverityRate { limit } => {
                write!(f, "Excessive anomaly rate (>{:.0}% high severity)", limit * 100.0)
            }
            Self::MediumSeverityAnomaly => {
                write!(f, "Medium severity anomaly detected - activating deep test")
            }
            Self::BaselineRegression => {
                write!(f, "Baseline deviation detected - activating deep test")
            }
            Self::HighRiskAction { action, risk } => write!(
                f,
                "High risk action '{action}' detected (risk={risk:.2}) - activating deep test"
            ),
            Self::Nominal => write!(f, "No anomalies or termination conditions detected"),
        }
    }
}

/// Priority-ordered router, parameterized by `RouterConfig`.
#[derive(Debug, Clone, Default)]
pub struct PriorityRouter {
    config: RouterConfig,
}

impl PriorityRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    /// The first condition that holds, in priority order.
    pub fn evaluate(&self, view: CycleView<'_>, anomalies: &AnomalyLog, risks: &RiskScores) -> RouteReason {
        self.termination_reason(view, anomalies)
            .or_else(|| self.deep_test_reason(view, anomalies, risks))
            .unwrap_or(RouteReason::Nominal)
    }

    fn termination_reason(&self, view: CycleView<'_>, anomalies: &AnomalyLog) -> Option<RouteReason> {
        let cfg = &self.config;

        if view.available_actions().iter().all(ActionId::is_blank) {
            return Some(RouteReason::NoActionsAvailable);
        }

        let ctx = view.context;
        if ctx.step_count >= ctx.max_steps {
            return Some(RouteReason::StepLimitReached { max_steps: ctx.max_steps });
        }

        let recent_high = anomalies
            .recent(cfg.high_severity_window)
            .iter()
            .filter(|a| a.is_high())
            .count();
        if recent_high >= cfg.high_severity_limit {
            return Some(RouteReason::RepeatedHighSeverity { count: recent_high });
        }

        if let Some(last) = anomalies.last_exactly(cfg.consecutive_high_window) {
            if last.iter().all(|a| a.is_high()) {
                return Some(RouteReason::ConsecutiveHighSeverity { count: last.len() });
            }
        }

        if anomalies.len() > cfg.bulk_anomaly_floor {
            let ratio = anomalies.high_severity_count() as f64 / anomalies.len() as f64;
            if ratio > cfg.bulk_high_ratio {
                return Some(RouteReason::ExcessiveHighSeverityRate { limit: cfg.bulk_high_ratio });
            }
        }

        None
    }

    fn deep_test_reason(
        &self,
        view: CycleView<'_>,
        anomalies: &AnomalyLog,
        risks: &RiskScores,
    ) -> Option<RouteReason> {
        let recent = anomalies.recent(self.config.deep_test_window);

        if recent.iter().any(|a| a.severity == AnomalySeverity::Medium) {
            return Some(RouteReason::MediumSeverityAnomaly);
        }
        if recent.iter().any(|a| a.category == AnomalyCategory::Regression) {
            return Some(RouteReason::BaselineRegression);
        }

        let action = view.last_action()?;
        let risk = risks.get(action);
        (risk > self.config.deep_test_risk_threshold).then(|| RouteReason::HighRiskAction {
            action: action.clone(),
            risk,
        })
    }
}

impl ControlRouter for PriorityRouter {
    fn route(&self, view: CycleView<'_>, anomalies: &AnomalyLog, risks: &RiskScores) -> Routing {
        let reason = self.evaluate(view, anomalies, risks);
        let control = reason.control();
        info!(
            step = view.context.step_count,
            control = %control,
            reason = %reason,
            "routing decision"
        );
        Routing {
            control,
            reasoning: format!("{control}: {reason}"),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
