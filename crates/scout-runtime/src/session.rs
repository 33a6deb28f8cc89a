//! One exploratory test session, from the driver's side.
//!
//! The driver owns the loop: `decide()` runs a reasoning cycle on the
//! current snapshot, the driver executes the chosen action against the real
//! UI, then `observe()` hands back what the screen looks like now. The core
//! never advances the execution context itself; this type does it between
//! cycles.

use tracing::{debug, info};

use scout_audit::{AuditLog, InMemoryCycleAudit};
use scout_contracts::{
    action::ActionId,
    config::ScoutConfig,
    error::ScoutResult,
    state::{AgentState, ExecutionContext, UiState},
};
use scout_core::{traits::CycleAuditWriter, CycleOutcome, ReasoningCycle};
use scout_policy::risk::RiskPolicy;

use crate::wiring::build_cycle;

/// A live session: agent state, its reasoning cycle, and its audit trail.
pub struct ScoutSession {
    cycle: ReasoningCycle,
    risk: RiskPolicy,
    history_capacity: usize,
    state: AgentState,
    audit: InMemoryCycleAudit,
}

impl ScoutSession {
    /// Start a session on `ui` with the stock components.
    pub fn new(config: &ScoutConfig, ui: UiState, max_steps: u64) -> Self {
        let state = AgentState::new(ui, ExecutionContext::with_max_steps(max_steps));
        let audit = InMemoryCycleAudit::new(state.session_id.0.to_string());
        let cycle = build_cycle(config).with_audit(Box::new(audit.clone()));

        info!(
            session_id = %state.session_id.0,
            max_steps,
            offered = state.ui_state.available_actions.len(),
            "session started"
        );

        Self {
            cycle,
            risk: RiskPolicy::new(config.risk.clone()),
            history_capacity: config.session.history_capacity,
            state,
            audit,
        }
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn audit(&self) -> &InMemoryCycleAudit {
        &self.audit
    }

    /// Run one reasoning cycle on the current snapshot.
    ///
    /// Newly offered actions get the neutral risk before the cycle runs.
    pub fn decide(&mut self) -> ScoutResult<CycleOutcome> {
        self.risk.initialize_risk_scores(
            &mut self.state.knowledge.risk_scores,
            &self.state.ui_state.available_actions,
        );
        self.cycle.run(&mut self.state)
    }

    /// Record that `executed` ran and the UI now shows `next`.
    pub fn observe(&mut self, executed: ActionId, next: UiState, succeeded: Option<bool>) {
        let AgentState {
            ui_state,
            execution_context,
            ..
        } = &mut self.state;

        debug!(
            step = execution_context.step_count,
            action = %executed,
            succeeded = succeeded.unwrap_or(true),
            "action executed"
        );
        execution_context.advance(executed, ui_state, succeeded, self.history_capacity);
        *ui_state = next;
    }

    /// End the session. Finalizes the audit trail unless a TERMINATE cycle
    /// already did.
    pub fn finish(self) -> ScoutResult<(AgentState, AuditLog)> {
        if !self.audit.is_finalized() {
            self.audit.finalize(self.audit.session_id())?;
        }
        let log = self.audit.export_log()?;
        Ok((self.state, log))
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
