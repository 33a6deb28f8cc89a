//! Cycle-level audit records.
//!
//! `CycleRecord` is what gets written to the cycle audit trail, one per
//! reasoning cycle, whatever the control outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{action::ActionId, state::ControlDecision};

/// An immutable record of one reasoning cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    /// `execution_context.step_count` at the time of the cycle.
    pub step: u64,
    pub control: ControlDecision,
    /// The selected action, absent on TERMINATE or an empty offered set.
    pub next_action: Option<ActionId>,
    pub reasoning: String,
    /// How many anomaly reports this cycle appended.
    pub anomalies_appended: usize,
    /// Wall-clock time the record was created (UTC).
    pub recorded_at: DateTime<Utc>,
}
