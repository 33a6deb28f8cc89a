//! Core trait definitions for the SCOUT reasoning cycle.
//!
//! Four seams split one cycle into stages that run in a fixed order:
//!
//! - `AnomalyDetector`: invariant and baseline checks, may update baselines
//! - `ControlRouter`: chooses CONTINUE / DEEP_TEST / TERMINATE, writes nothing
//! - `ActionPlanner`: picks the next offered action, may update risk scores
//! - `CycleAuditWriter`: records every cycle's outcome
//!
//! Each stage receives a shared `CycleView` over the read-only half of the
//! state and a `&mut` handle only for the knowledge it owns. The signatures
//! are the write partition: a router cannot touch a baseline, and no stage
//! can mutate the observation or the execution context.

use scout_contracts::{
    action::ActionContract,
    anomaly::{AnomalyLog, AnomalyReport},
    error::ScoutResult,
    knowledge::{Baselines, RiskScores},
    record::CycleRecord,
    state::{ControlDecision, CycleView},
};

/// Runs the structural invariants and the baseline stability check.
///
/// Detection is total: missing inputs mean "no violation", never an error.
pub trait AnomalyDetector: Send + Sync {
    /// Return the anomalies found in this cycle's snapshot.
    ///
    /// Every extracted metric is folded into `baselines`, whether or not it
    /// violated. The caller appends the returned reports to the log.
    fn detect(&self, view: CycleView<'_>, baselines: &mut Baselines) -> Vec<AnomalyReport>;
}

/// The router's verdict for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Routing {
    pub control: ControlDecision,
    /// Names the condition that fired, prefixed with the control value.
    pub reasoning: String,
}

/// Decides whether the session continues, deepens, or stops.
///
/// Runs after detection and strictly before planning. A TERMINATE verdict
/// skips the planner entirely.
pub trait ControlRouter: Send + Sync {
    fn route(&self, view: CycleView<'_>, anomalies: &AnomalyLog, risks: &RiskScores) -> Routing;
}

/// The planner's selection for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Absent only when the offered set is empty.
    pub next_action: Option<ActionContract>,
    /// Human-readable account of the selection, appended to the routing
    /// reasoning.
    pub summary: String,
}

/// Selects the next action from the offered set.
pub trait ActionPlanner: Send + Sync {
    /// Update `risks` from recent anomalies and pick the next action.
    ///
    /// The returned contract must name an action from
    /// `view.available_actions()`. Implementations return
    /// `ScoutError::ActionNotOffered` rather than emit anything else.
    fn plan(
        &self,
        view: CycleView<'_>,
        anomalies: &AnomalyLog,
        risks: &mut RiskScores,
    ) -> ScoutResult<Plan>;
}

/// The cycle audit sink.
///
/// Every cycle produces exactly one `CycleRecord`. A failed write is
/// surfaced as `ScoutError::AuditWriteFailed`.
pub trait CycleAuditWriter: Send + Sync {
    /// Append one record. Records are never modified once written.
    fn write(&self, record: &CycleRecord) -> ScoutResult<()>;

    /// Mark the session as finished. Called after a TERMINATE cycle.
    fn finalize(&self, session_id: &str) -> ScoutResult<()>;
}
