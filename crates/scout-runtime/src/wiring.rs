//! Default component wiring.

use scout_contracts::config::ScoutConfig;
use scout_core::ReasoningCycle;
use scout_invariants::InvariantEngine;
use scout_policy::{CoveragePlanner, PriorityRouter};

/// A reasoning cycle with the stock detector, router and planner, all
/// parameterized by `config`. No audit sink is attached.
pub fn build_cycle(config: &ScoutConfig) -> ReasoningCycle {
    ReasoningCycle::new(
        Box::new(InvariantEngine::from_config(config)),
        Box::new(PriorityRouter::new(config.router.clone())),
        Box::new(CoveragePlanner::from_config(config)),
        config.learning.clone(),
    )
}

// ── Tests ────────────────────────────────────────────────────────────────────
