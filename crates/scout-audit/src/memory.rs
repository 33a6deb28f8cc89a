//! In-memory `CycleAuditWriter`.
//!
//! Events live in a `Vec` behind `Arc<Mutex<_>>`. Clone the writer to keep
//! a handle for `export_log()` after boxing one copy into the reasoning
//! cycle.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info};

use scout_contracts::{
    error::{ScoutError, ScoutResult},
    record::CycleRecord,
};
use scout_core::traits::CycleAuditWriter;

use crate::{
    chain::{hash_event, verify_chain},
    event::{AuditEvent, AuditLog},
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct ChainState {
    pub(crate) events: Vec<AuditEvent>,
    pub(crate) sequence: u64,
    /// `this_hash` of the last event, `GENESIS_HASH` before the first write.
    pub(crate) last_hash: String,
    pub(crate) finalized: bool,
}

// ── Public writer ─────────────────────────────────────────────────────────────

/// Append-only cycle audit backed by a SHA-256 hash chain.
///
/// Writes after `finalize` are rejected with `AuditWriteFailed`.
#[derive(Clone)]
pub struct InMemoryCycleAudit {
    session_id: String,
    pub(crate) state: Arc<Mutex<ChainState>>,
}

impl InMemoryCycleAudit {
    pub fn new(session_id: impl Into<String>) -> Self {
        let state = ChainState {
            events: Vec::new(),
            sequence: 0,
            last_hash: AuditEvent::GENESIS_HASH.to_string(),
            finalized: false,
        };
        Self {
            session_id: session_id.into(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn lock(&self) -> ScoutResult<MutexGuard<'_, ChainState>> {
        self.state.lock().map_err(|e| ScoutError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {e}"),
        })
    }

    /// Snapshot every event written so far.
    pub fn export_log(&self) -> ScoutResult<AuditLog> {
        let state = self.lock()?;
        let terminal_hash = state
            .events
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_default();

        Ok(AuditLog {
            session_id: self.session_id.clone(),
            events: state.events.clone(),
            finalized: state.finalized,
            exported_at: Utc::now(),
            terminal_hash,
        })
    }

    /// Re-verify the in-memory chain. A poisoned lock counts as tampered.
    pub fn verify_integrity(&self) -> bool {
        self.lock().map(|state| verify_chain(&state.events)).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|state| state.events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_finalized(&self) -> bool {
        self.lock().map(|state| state.finalized).unwrap_or(false)
    }
}

// ── CycleAuditWriter impl ─────────────────────────────────────────────────────

impl CycleAuditWriter for InMemoryCycleAudit {
    fn write(&self, record: &CycleRecord) -> ScoutResult<()> {
        let mut state = self.lock()?;
        if state.finalized {
            return Err(ScoutError::AuditWriteFailed {
                reason: format!("session '{}' is already finalized", self.session_id),
            });
        }

        let prev_hash = state.last_hash.clone();
        let sequence = state.sequence;
        let this_hash = hash_event(&self.session_id, sequence, record, &prev_hash)?;

        debug!(
            session_id = %self.session_id,
            sequence,
            step = record.step,
            control = %record.control,
            "cycle recorded"
        );

        state.events.push(AuditEvent {
            sequence,
            session_id: self.session_id.clone(),
            record: record.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.sequence += 1;
        state.last_hash = this_hash;

        Ok(())
    }

    fn finalize(&self, session_id: &str) -> ScoutResult<()> {
        let mut state = self.lock()?;
        state.finalized = true;

        info!(
            session_id = %session_id,
            event_count = state.events.len(),
            terminal_hash = %state.last_hash,
            "cycle audit finalized"
        );

        Ok(())
    }
}
