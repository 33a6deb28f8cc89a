//! Coverage-guided action selection.
//!
//! Novelty first, safety second: every offered action is scored as
//! `coverage_weight * coverage + safety_weight * (1 - risk)` and the best
//! one wins. Actions riskier than `max_risk_threshold` are set aside unless
//! nothing else is left.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::debug;

use scout_contracts::{action::ActionId, config::ExplorationConfig, knowledge::RiskScores};

/// Priority of an action that has run `executions` times: 1.0 when never
/// run, 0.5 after one run, `1 / (n + 1)` after that.
pub fn coverage_score(executions: usize) -> f64 {
    match executions {
        0 => 1.0,
        1 => 0.5,
        n => 1.0 / (n as f64 + 1.0),
    }
}

/// Offered actions that have never been executed, counted once each.
pub fn unexplored_action_count(offered: &[ActionId], history: &[ActionId]) -> usize {
    let executed: BTreeSet<&ActionId> = history.iter().collect();
    offered
        .iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|a| !executed.contains(*a))
        .count()
}

/// Coarse action kind, inferred from the action id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionCategory {
    Navigation,
    Form,
    Click,
    Assertion,
    Wait,
    Other,
}

impl ActionCategory {
    pub const ALL: [ActionCategory; 6] = [
        Self::Navigation,
        Self::Form,
        Self::Click,
        Self::Assertion,
        Self::Wait,
        Self::Other,
    ];

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Navigation => &["navigate", "goto", "back", "forward"],
            Self::Form => &["fill", "input", "type", "select"],
            Self::Click => &["click", "press", "submit"],
            Self::Assertion => &["assert", "verify", "check", "expect"],
            Self::Wait => &["wait", "sleep", "pause"],
            Self::Other => &[],
        }
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Navigation => "navigation",
            Self::Form => "form",
            Self::Click => "click",
            Self::Assertion => "assertion",
            Self::Wait => "wait",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// Classify by the first matching keyword family, in `ActionCategory::ALL`
/// order.
pub fn classify_action(action: &ActionId) -> ActionCategory {
    let lowered = action.as_str().to_lowercase();
    ActionCategory::ALL
        .into_iter()
        .find(|c| c.keywords().iter().any(|kw| lowered.contains(kw)))
        .unwrap_or(ActionCategory::Other)
}

/// Every category, each with its offered actions in offered order.
pub fn group_actions_by_category(offered: &[ActionId]) -> BTreeMap<ActionCategory, Vec<&ActionId>> {
    let mut groups: BTreeMap<ActionCategory, Vec<&ActionId>> =
        ActionCategory::ALL.into_iter().map(|c| (c, Vec::new())).collect();
    for action in offered {
        groups.entry(classify_action(action)).or_default().push(action);
    }
    groups
}

/// One candidate's scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAction<'a> {
    pub action: &'a ActionId,
    pub coverage: f64,
    pub risk: f64,
    pub score: f64,
}

/// The winning candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    pub best: ScoredAction<'a>,
    /// True when every action exceeded the risk threshold and the
    /// selection was retried with the threshold at 1.0.
    pub relaxed: bool,
}

/// Scores and selects actions, parameterized by `ExplorationConfig`.
#[derive(Debug, Clone, Default)]
pub struct ExplorationPolicy {
    config: ExplorationConfig,
}

impl ExplorationPolicy {
    pub fn new(config: ExplorationConfig) -> Self {
        Self { config }
    }

    pub fn score<'a>(&self, action: &'a ActionId, history: &[ActionId], risks: &RiskScores) -> ScoredAction<'a> {
        let executions = history.iter().filter(|a| *a == action).count();
        let coverage = coverage_score(executions);
        let risk = risks.get(action);
        ScoredAction {
            action,
            coverage,
            risk,
            score: self.config.coverage_weight * coverage + self.config.safety_weight * (1.0 - risk),
        }
    }

    /// Pick the highest-scoring offered action.
    ///
    /// Ties go to the earliest in offered order. Returns `None` only when
    /// `offered` is empty.
    pub fn select<'a>(
        &self,
        offered: &'a [ActionId],
        history: &[ActionId],
        risks: &RiskScores,
    ) -> Option<Selection<'a>> {
        if let Some(best) = self.best_within(offered, history, risks, self.config.max_risk_threshold) {
            return Some(Selection { best, relaxed: false });
        }
        self.best_within(offered, history, risks, 1.0)
            .map(|best| Selection { best, relaxed: true })
    }

    fn best_within<'a>(
        &self,
        offered: &'a [ActionId],
        history: &[ActionId],
        risks: &RiskScores,
        max_risk: f64,
    ) -> Option<ScoredAction<'a>> {
        let mut best: Option<ScoredAction<'a>> = None;
        for action in offered {
            let candidate = self.score(action, history, risks);
            if candidate.risk > max_risk {
                debug!(action = %action, risk = candidate.risk, max_risk, "action over risk threshold");
                continue;
            }
            debug!(
                action = %action,
                coverage = candidate.coverage,
                risk = candidate.risk,
                score = candidate.score,
                "action scored"
            );
            if best.as_ref().map_or(true, |b| candidate.score > b.score) {
                best = Some(candidate);
            }
        }
        best
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
