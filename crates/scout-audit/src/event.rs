//! Audit event and log types.
//!
//! `AuditEvent` wraps one `CycleRecord` with its chain position and hashes.
//! `AuditLog` is the exported snapshot of a whole session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scout_contracts::record::CycleRecord;

/// One entry in a session's hash chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Position in the chain, starting at 0.
    pub sequence: u64,

    pub session_id: String,

    pub record: CycleRecord,

    /// `this_hash` of the previous event, or `GENESIS_HASH` for the first.
    pub prev_hash: String,

    /// Hex SHA-256 over (session_id, sequence, prev_hash, record JSON).
    pub this_hash: String,
}

impl AuditEvent {
    /// `prev_hash` of the first event in every chain: 64 hex zeros.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// Every cycle of one session, in chain order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub session_id: String,

    pub events: Vec<AuditEvent>,

    /// Whether `finalize` had been called when the log was exported.
    pub finalized: bool,

    /// Wall-clock time (UTC) of the export.
    pub exported_at: DateTime<Utc>,

    /// `this_hash` of the last event; empty when there are no events.
    pub terminal_hash: String,
}
