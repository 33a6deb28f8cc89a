//! The invariant engine: every check over one cycle's snapshot.
//!
//! `InvariantEngine` decides which checks have their preconditions met,
//! runs them independently, and attributes each violation to the last
//! executed action. Structural checks never read knowledge; the baseline
//! pass reads and updates `Baselines` and nothing else.

use tracing::{debug, warn};

use scout_contracts::{
    anomaly::AnomalyReport,
    config::{BaselineConfig, InvariantConfig, ScoutConfig},
    knowledge::Baselines,
    state::CycleView,
};
use scout_core::traits::AnomalyDetector;

use crate::{
    baseline::{check_stability, extract_metrics},
    checks::{
        check_action_availability, check_api_ui_consistency, check_cause_effect,
        check_entity_continuity, check_forward_progress, Violation,
    },
};

/// Runs the five structural invariants and the baseline stability check.
#[derive(Debug, Clone, Default)]
pub struct InvariantEngine {
    baseline: BaselineConfig,
    invariants: InvariantConfig,
}

impl InvariantEngine {
    pub fn new(baseline: BaselineConfig, invariants: InvariantConfig) -> Self {
        Self { baseline, invariants }
    }

    pub fn from_config(config: &ScoutConfig) -> Self {
        Self::new(config.baseline.clone(), config.invariants.clone())
    }

    /// Run the structural invariants whose inputs are present.
    ///
    /// Returns violations in a fixed order: cause-effect, API-UI,
    /// entity continuity, forward progress, action availability.
    pub fn check_invariants(&self, view: CycleView<'_>) -> Vec<Violation> {
        let current = view.observation();
        let last_action = view.last_action();
        // An empty previous observation carries nothing to compare against.
        let previous = view.previous_observation().filter(|p| !p.is_empty());

        let mut violations = Vec::new();

        if let (Some(action), Some(previous)) = (last_action, previous) {
            let succeeded = view.context.last_action_succeeded.unwrap_or(true);
            violations.extend(check_cause_effect(action, previous, current, succeeded));
        }

        violations.extend(check_api_ui_consistency(current));

        if let (Some(action), Some(previous)) = (last_action, previous) {
            violations.extend(check_entity_continuity(
                previous,
                current,
                action,
                &self.invariants.deletion_keywords,
            ));
        }

        violations.extend(check_forward_progress(
            &view.context.action_history,
            &view.recent_observations(),
            self.invariants.forward_progress_window,
        ));

        if let (Some(action), Some(previous_actions)) =
            (last_action, view.context.previous_available_actions.as_deref())
        {
            violations.extend(check_action_availability(
                previous_actions,
                view.available_actions(),
                action,
                &self.invariants.state_changing_keywords,
            ));
        }

        violations
    }

    /// Compare every extracted metric against its baseline and fold the
    /// value in.
    pub fn check_baselines(&self, view: CycleView<'_>, baselines: &mut Baselines) -> Vec<Violation> {
        let metrics = extract_metrics(view.observation(), view.last_action());
        let mut violations = Vec::new();

        for (metric, value) in metrics {
            let (violation, updated) =
                check_stability(&metric, value, baselines.get(&metric), &self.baseline);
            debug!(
                metric = %metric,
                value,
                mean = updated.mean,
                std_dev = updated.std_dev,
                samples = updated.count,
                "baseline updated"
            );
            baselines.insert(metric, updated);
            violations.extend(violation);
        }

        violations
    }
}

impl AnomalyDetector for InvariantEngine {
    fn detect(&self, view: CycleView<'_>, baselines: &mut Baselines) -> Vec<AnomalyReport> {
        let mut violations = self.check_invariants(view);
        violations.extend(self.check_baselines(view, baselines));

        let action = view.last_action();
        violations
            .into_iter()
            .map(|v| {
                warn!(
                    invariant = %v.kind,
                    severity = %v.severity,
                    action = action.map(|a| a.as_str()).unwrap_or("-"),
                    description = %v.description,
                    "invariant violated"
                );
                v.into_report(action.cloned())
            })
            .collect()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
