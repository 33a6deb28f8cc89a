//! The five structural invariants.
//!
//! Each check is a pure function over the inputs it needs and returns
//! `Some(Violation)` or `None`. They validate coherence, not correctness:
//! a check never decides whether an outcome is right for the business, only
//! whether the application behaved consistently. Preconditions (is there a
//! previous observation, a last action, ...) are the engine's concern; the
//! checks assume their inputs exist.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::{json, Value};

use scout_contracts::{
    action::ActionId,
    anomaly::{AnomalyCategory, AnomalyEvidence, AnomalyReport, AnomalySeverity},
    observation::Observation,
};

/// Which rule produced a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantKind {
    CauseEffect,
    ApiUiConsistency,
    EntityContinuity,
    ForwardProgress,
    ActionAvailability,
    BaselineStability,
}

impl fmt::Display for InvariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CauseEffect => "cause_effect",
            Self::ApiUiConsistency => "api_ui_consistency",
            Self::EntityContinuity => "entity_continuity",
            Self::ForwardProgress => "forward_progress",
            Self::ActionAvailability => "action_availability",
            Self::BaselineStability => "baseline_stability",
        };
        f.write_str(s)
    }
}

/// A failed check, not yet attributed to an action.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub kind: InvariantKind,
    pub severity: AnomalySeverity,
    pub category: AnomalyCategory,
    pub description: String,
    pub evidence: AnomalyEvidence,
}

impl Violation {
    /// Turn the violation into a report attributed to `action`.
    pub fn into_report(self, action: Option<ActionId>) -> AnomalyReport {
        AnomalyReport::new(
            self.severity,
            self.category,
            action,
            self.description,
            self.evidence,
        )
    }
}

/// A successful action should change something observable.
///
/// MEDIUM / INVARIANT_VIOLATION when `succeeded` and the two observations
/// are deeply equal. A failed action is not expected to change anything.
pub fn check_cause_effect(
    action: &ActionId,
    previous: &Observation,
    current: &Observation,
    succeeded: bool,
) -> Option<Violation> {
    if !succeeded || previous != current {
        return None;
    }

    Some(Violation {
        kind: InvariantKind::CauseEffect,
        severity: AnomalySeverity::Medium,
        category: AnomalyCategory::InvariantViolation,
        description: format!(
            "Cause-Effect violation: Action '{action}' executed but no observable change detected"
        ),
        evidence: AnomalyEvidence::new(
            format!("Action '{action}' should cause observable state change"),
            "UI state unchanged after action execution",
        ),
    })
}

/// A successful API call should surface its declared fields in the UI.
///
/// Reads the embedded `_api_response` and `_expected_ui_fields`. Skipped
/// when there is no API response or it did not report success; HIGH /
/// INVARIANT_VIOLATION when any expected field is missing.
pub fn check_api_ui_consistency(current: &Observation) -> Option<Violation> {
    let response = current.api_response()?;
    let succeeded = response.get("success") == Some(&Value::Bool(true))
        || response.get("status").and_then(Value::as_str) == Some("ok");
    if !succeeded {
        return None;
    }

    let expected = current.expected_ui_fields();
    let missing: Vec<&str> = expected
        .iter()
        .copied()
        .filter(|field| !current.contains_key(field))
        .collect();
    if missing.is_empty() {
        return None;
    }

    Some(Violation {
        kind: InvariantKind::ApiUiConsistency,
        severity: AnomalySeverity::High,
        category: AnomalyCategory::InvariantViolation,
        description: "API-UI Consistency violation: API succeeded but UI fields not updated"
            .to_string(),
        evidence: AnomalyEvidence::new(
            format!("API success should reflect in UI fields: {expected:?}"),
            format!("Missing UI fields: {missing:?}"),
        )
        .with_context("missing_fields", json!(missing)),
    })
}

/// Entities should persist unless the action was a deletion.
///
/// HIGH / INVARIANT_VIOLATION naming every entity id present in `previous`
/// and absent from `current`, unless `action` mentions one of
/// `deletion_keywords`. A current observation without an entity map counts
/// as having no entities.
pub fn check_entity_continuity(
    previous: &Observation,
    current: &Observation,
    action: &ActionId,
    deletion_keywords: &[String],
) -> Option<Violation> {
    let before = previous.entities().filter(|e| !e.is_empty())?;
    if action.mentions_any(deletion_keywords) {
        return None;
    }

    let after = current.entities();
    let disappeared: Vec<&str> = before
        .keys()
        .filter(|id| after.map_or(true, |a| !a.contains_key(*id)))
        .map(String::as_str)
        .collect();
    if disappeared.is_empty() {
        return None;
    }

    Some(Violation {
        kind: InvariantKind::EntityContinuity,
        severity: AnomalySeverity::High,
        category: AnomalyCategory::InvariantViolation,
        description: format!(
            "Entity Continuity violation: Entities {disappeared:?} disappeared after non-delete action"
        ),
        evidence: AnomalyEvidence::new(
            "Entity IDs should persist unless explicitly deleted",
            format!("Entities disappeared: {disappeared:?}"),
        )
        .with_context("action_id", action.as_str())
        .with_context("disappeared_entities", json!(disappeared)),
    })
}

/// The application should not stall.
///
/// `observations` is oldest first and ends with the current observation.
/// HIGH / INSTABILITY when at least `window` observations exist, at least
/// `window` actions were executed, and the last `window` observations are
/// all identical.
pub fn check_forward_progress(
    action_history: &[ActionId],
    observations: &[&Observation],
    window: usize,
) -> Option<Violation> {
    if window == 0 || observations.len() < window || action_history.len() < window {
        return None;
    }

    let recent = &observations[observations.len() - window..];
    let first = recent[0];
    if !recent.iter().all(|obs| *obs == first) {
        return None;
    }

    let stalled: Vec<&str> = action_history[action_history.len() - window..]
        .iter()
        .map(ActionId::as_str)
        .collect();

    Some(Violation {
        kind: InvariantKind::ForwardProgress,
        severity: AnomalySeverity::High,
        category: AnomalyCategory::Instability,
        description: "Forward Progress violation: System stalled with identical observations"
            .to_string(),
        evidence: AnomalyEvidence::new(
            "System should make forward progress",
            format!("Same observation repeated {window} times despite actions: {stalled:?}"),
        )
        .with_context("identical_observation_count", window)
        .with_context("stalled_actions", json!(stalled)),
    })
}

/// A state-changing action should change the offered action set.
///
/// MEDIUM / INVARIANT_VIOLATION when `action` mentions one of
/// `state_changing_keywords` and the offered set is unchanged as a set
/// (order and duplicates are ignored).
pub fn check_action_availability(
    previous_actions: &[ActionId],
    current_actions: &[ActionId],
    action: &ActionId,
    state_changing_keywords: &[String],
) -> Option<Violation> {
    if !action.mentions_any(state_changing_keywords) {
        return None;
    }

    let before: BTreeSet<&ActionId> = previous_actions.iter().collect();
    let after: BTreeSet<&ActionId> = current_actions.iter().collect();
    if before != after {
        return None;
    }

    let offered: Vec<&str> = current_actions.iter().map(ActionId::as_str).collect();
    Some(Violation {
        kind: InvariantKind::ActionAvailability,
        severity: AnomalySeverity::Medium,
        category: AnomalyCategory::InvariantViolation,
        description:
            "Action Availability violation: State-changing action didn't affect available actions"
                .to_string(),
        evidence: AnomalyEvidence::new(
            format!("State-changing action '{action}' should alter available actions"),
            format!("Available actions unchanged: {offered:?}"),
        )
        .with_context("action_executed", action.as_str()),
    })
}

// ── Tests ────────────────────────────────────────────────────────────────────
