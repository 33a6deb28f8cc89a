//! Risk-aware, coverage-guided action planner.
//!
//! `CoveragePlanner` implements `ActionPlanner`: it folds recent anomalies
//! into the risk scores, selects the best offered action, and wraps it in a
//! validated `ActionContract`. It never names an action outside the
//! offered set. Offered ids are used exactly as the driver sent them; blank
//! ids are passed over since no contract can carry one.

use tracing::{debug, warn};

use scout_contracts::{
    action::{ActionContract, ActionId},
    anomaly::AnomalyLog,
    config::ScoutConfig,
    error::ScoutResult,
    knowledge::RiskScores,
    state::CycleView,
};
use scout_core::traits::{ActionPlanner, Plan};

use crate::{
    exploration::{classify_action, unexplored_action_count, ExplorationPolicy},
    risk::{RiskCategory, RiskPolicy},
};

/// Plans the next action from risk and coverage.
#[derive(Debug, Clone, Default)]
pub struct CoveragePlanner {
    risk: RiskPolicy,
    exploration: ExplorationPolicy,
}

impl CoveragePlanner {
    pub fn new(risk: RiskPolicy, exploration: ExplorationPolicy) -> Self {
        Self { risk, exploration }
    }

    pub fn from_config(config: &ScoutConfig) -> Self {
        Self::new(
            RiskPolicy::new(config.risk.clone()),
            ExplorationPolicy::new(config.exploration.clone()),
        )
    }

    pub fn risk_policy(&self) -> &RiskPolicy {
        &self.risk
    }
}

impl ActionPlanner for CoveragePlanner {
    fn plan(
        &self,
        view: CycleView<'_>,
        anomalies: &AnomalyLog,
        risks: &mut RiskScores,
    ) -> ScoutResult<Plan> {
        let offered = view.available_actions();
        let eligible: Vec<ActionId> = offered.iter().filter(|a| !a.is_blank()).cloned().collect();
        if eligible.len() < offered.len() {
            warn!(skipped = offered.len() - eligible.len(), "ignoring blank offered action ids");
        }
        if eligible.is_empty() {
            return Ok(Plan {
                next_action: None,
                summary: "No valid actions available".to_string(),
            });
        }

        self.risk.update_from_anomalies(risks, anomalies, view.last_action());

        let history = &view.context.action_history;
        let Some(selection) = self.exploration.select(&eligible, history, risks) else {
            return Ok(Plan {
                next_action: None,
                summary: "No valid actions available".to_string(),
            });
        };
        let best = selection.best;

        let contract = ActionContract::bare(best.action)?;
        contract.ensure_offered(offered)?;

        if selection.relaxed {
            warn!(
                action = %best.action,
                risk = best.risk,
                "every offered action exceeds the risk threshold; selecting anyway"
            );
        }
        if self.risk.should_avoid(best.action, risks, anomalies) {
            warn!(action = %best.action, risk = best.risk, "selected action is flagged to avoid");
        }

        let category = classify_action(best.action);
        let unexplored = unexplored_action_count(&eligible, history);
        debug!(
            action = %best.action,
            category = %category,
            coverage = best.coverage,
            risk = best.risk,
            score = best.score,
            unexplored,
            "action selected"
        );

        Ok(Plan {
            summary: format!(
                "Selecting action '{}' ({}) from {} available actions. Risk score: {:.2} ({}). {} unexplored",
                best.action,
                category,
                eligible.len(),
                best.risk,
                RiskCategory::from_score(best.risk),
                unexplored,
            ),
            next_action: Some(contract),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
