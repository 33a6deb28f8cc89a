//! # scout-audit
//!
//! Append-only, SHA-256 hash-chained trail of SCOUT reasoning cycles.
//!
//! Every `CycleRecord` the reasoning cycle emits is wrapped in an
//! `AuditEvent` linked to its predecessor by hash. Editing any stored record
//! breaks the chain, and `verify_chain` reports it.
//!
//! ```rust,ignore
//! use scout_audit::InMemoryCycleAudit;
//!
//! let audit = InMemoryCycleAudit::new(session_id.to_string());
//! let cycle = build_cycle(&config).with_audit(Box::new(audit.clone()));
//! // ... run cycles ...
//! assert!(audit.verify_integrity());
//! let log = audit.export_log()?;
//! ```

pub mod chain;
pub mod event;
pub mod memory;

pub use chain::{hash_event, verify_chain};
pub use event::{AuditEvent, AuditLog};
pub use memory::InMemoryCycleAudit;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use scout_contracts::{
        action::ActionId,
        error::ScoutError,
        record::CycleRecord,
        state::ControlDecision,
    };
    use scout_core::traits::CycleAuditWriter;

    use super::{verify_chain, AuditEvent, InMemoryCycleAudit};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_record(step: u64, action: &str) -> CycleRecord {
        CycleRecord {
            step,
            control: ControlDecision::Continue,
            next_action: Some(ActionId::new(action)),
            reasoning: format!("CONTINUE: Normal exploration. Selecting action '{action}'"),
            anomalies_appended: 0,
            recorded_at: Utc::now(),
        }
    }

    fn three_cycle_audit(session: &str) -> InMemoryCycleAudit {
        let audit = InMemoryCycleAudit::new(session);
        audit.write(&make_record(0, "click_login")).unwrap();
        audit.write(&make_record(1, "fill_input")).unwrap();
        audit.write(&make_record(2, "click_submit")).unwrap();
        audit
    }

    // ── Chain ─────────────────────────────────────────────────────────────────

    #[test]
    fn sequential_writes_form_valid_chain() {
        let audit = three_cycle_audit("s-integrity");
        assert!(audit.verify_integrity());
        assert_eq!(audit.len(), 3);
    }

    #[test]
    fn tampered_reasoning_is_detected() {
        let audit = three_cycle_audit("s-tamper");
        {
            let mut state = audit.state.lock().unwrap();
            state.events[1].record.reasoning = "TERMINATE: nothing to see".to_string();
        }
        assert!(!audit.verify_integrity());
    }

    #[test]
    fn reordered_events_are_detected() {
        let audit = three_cycle_audit("s-reorder");
        let mut events = audit.export_log().unwrap().events;
        events.swap(1, 2);
        assert!(!verify_chain(&events));
    }

    #[test]
    fn first_event_links_to_genesis() {
        let audit = three_cycle_audit("s-genesis");
        let log = audit.export_log().unwrap();
        assert_eq!(log.events[0].prev_hash, AuditEvent::GENESIS_HASH);
        assert_eq!(log.events[1].prev_hash, log.events[0].this_hash);
    }

    #[test]
    fn sequences_are_contiguous() {
        let log = three_cycle_audit("s-seq").export_log().unwrap();
        for (idx, event) in log.events.iter().enumerate() {
            assert_eq!(event.sequence, idx as u64);
        }
    }

    #[test]
    fn empty_chain_is_valid() {
        let audit = InMemoryCycleAudit::new("s-empty");
        assert!(audit.is_empty());
        assert!(audit.verify_integrity());
        assert!(verify_chain(&[]));
        assert_eq!(audit.export_log().unwrap().terminal_hash, "");
    }

    // ── Export and finalize ───────────────────────────────────────────────────

    #[test]
    fn export_carries_terminal_hash_and_state() {
        let audit = three_cycle_audit("s-export");
        let log = audit.export_log().unwrap();

        assert_eq!(log.session_id, "s-export");
        assert_eq!(log.events.len(), 3);
        assert_eq!(log.terminal_hash, log.events[2].this_hash);
        assert!(!log.finalized);
        assert!(verify_chain(&log.events));
    }

    #[test]
    fn clones_share_one_chain() {
        let audit = InMemoryCycleAudit::new("s-shared");
        let boxed: Box<dyn CycleAuditWriter> = Box::new(audit.clone());
        boxed.write(&make_record(0, "a")).unwrap();
        boxed.finalize("s-shared").unwrap();

        assert_eq!(audit.len(), 1);
        assert!(audit.is_finalized());
        assert!(audit.export_log().unwrap().finalized);
    }

    #[test]
    fn writes_after_finalize_are_rejected() {
        let audit = three_cycle_audit("s-final");
        audit.finalize("s-final").unwrap();

        let err = audit.write(&make_record(3, "late")).unwrap_err();
        assert!(matches!(err, ScoutError::AuditWriteFailed { .. }));
        assert_eq!(audit.len(), 3);
    }

    #[test]
    fn log_round_trips_through_json() {
        let log = three_cycle_audit("s-json").export_log().unwrap();
        let text = serde_json::to_string(&log).unwrap();
        let back: super::AuditLog = serde_json::from_str(&text).unwrap();
        assert!(verify_chain(&back.events));
    }
}
