//! Hash chain construction and verification.
//!
//! Each event's hash covers the session id, its sequence number, the
//! previous event's hash, and the canonical JSON of its cycle record, in
//! that order. Changing any of them changes the hash.

use sha2::{Digest, Sha256};

use scout_contracts::{
    error::{ScoutError, ScoutResult},
    record::CycleRecord,
};

use crate::event::AuditEvent;

/// Compute the hex SHA-256 of one chain entry.
///
/// Fails only if the record cannot be serialized.
pub fn hash_event(
    session_id: &str,
    sequence: u64,
    record: &CycleRecord,
    prev_hash: &str,
) -> ScoutResult<String> {
    let body = serde_json::to_vec(record).map_err(|e| ScoutError::AuditWriteFailed {
        reason: format!("cycle record serialization failed: {e}"),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&body);
    Ok(hex::encode(hasher.finalize()))
}

/// True when every event links to its predecessor (the first to
/// `AuditEvent::GENESIS_HASH`), sequences run 0, 1, 2, ... and every stored
/// hash matches a fresh recomputation.
///
/// An empty chain is valid.
pub fn verify_chain(events: &[AuditEvent]) -> bool {
    let mut expected_prev = AuditEvent::GENESIS_HASH;

    for (idx, event) in events.iter().enumerate() {
        if event.sequence != idx as u64 || event.prev_hash != expected_prev {
            return false;
        }
        match hash_event(&event.session_id, event.sequence, &event.record, &event.prev_hash) {
            Ok(hash) if hash == event.this_hash => {}
            _ => return false,
        }
        expected_prev = &event.this_hash;
    }

    true
}
