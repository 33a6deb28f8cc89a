//! Scripted-session replay.
//!
//! `Replayer` plays the driver for a recorded `Scenario`: one reasoning
//! cycle per frame, feeding the chosen action and the next frame back into
//! the session until the router says TERMINATE or the frames run out.

use tracing::info;

use scout_audit::{verify_chain, AuditLog};
use scout_contracts::{
    action::ActionId,
    anomaly::AnomalyReport,
    config::ScoutConfig,
    error::{ScoutError, ScoutResult},
    state::{AgentState, ControlDecision},
};

use crate::{scenario::Scenario, session::ScoutSession};

/// How a replay stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayEnd {
    /// A cycle returned TERMINATE.
    Terminated,
    /// Every frame was consumed without a TERMINATE.
    FramesExhausted,
}

/// What happened at one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayStep {
    pub frame: usize,
    /// `execution_context.step_count` when the cycle ran.
    pub step: u64,
    pub control: ControlDecision,
    pub next_action: Option<ActionId>,
    pub reasoning: String,
    /// Reports this cycle appended to the anomaly log.
    pub anomalies: Vec<AnomalyReport>,
}

/// The result of replaying a whole scenario.
#[derive(Debug, Clone)]
pub struct Replay {
    pub steps: Vec<ReplayStep>,
    pub end: ReplayEnd,
    /// Agent state after the last cycle.
    pub state: AgentState,
    pub audit: AuditLog,
    /// Whether the exported audit chain verified.
    pub audit_intact: bool,
}

impl Replay {
    pub fn last_step(&self) -> Option<&ReplayStep> {
        self.steps.last()
    }

    pub fn anomaly_count(&self) -> usize {
        self.state.anomalies.len()
    }
}

/// Replays scenarios with one configuration.
#[derive(Debug, Clone, Default)]
pub struct Replayer {
    config: ScoutConfig,
}

impl Replayer {
    pub fn new(config: ScoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    /// Replay `scenario` in a fresh session.
    ///
    /// # Errors
    ///
    /// `ScenarioError` when the scenario has no frames or a cycle continues
    /// without choosing an action; otherwise whatever a cycle returned.
    pub fn replay(&self, scenario: &Scenario) -> ScoutResult<Replay> {
        let mut frames = scenario.frames.iter().enumerate();
        let Some((_, first)) = frames.next() else {
            return Err(ScoutError::ScenarioError {
                reason: "scenario has no frames".to_string(),
            });
        };

        let mut session = ScoutSession::new(&self.config, first.ui_state(), scenario.max_steps);
        info!(
            scenario = scenario.display_name(),
            frames = scenario.frames.len(),
            max_steps = scenario.max_steps,
            "replay starting"
        );

        let mut steps = Vec::new();
        let mut frame = 0;
        let end = loop {
            let logged = session.state().anomalies.len();
            let step = session.state().execution_context.step_count;
            let outcome = session.decide()?;
            let state = session.state();

            steps.push(ReplayStep {
                frame,
                step,
                control: outcome.control,
                next_action: outcome.next_action.as_ref().map(|c| c.action_id().clone()),
                reasoning: state.decision.reasoning.clone(),
                anomalies: state.anomalies.as_slice()[logged..].to_vec(),
            });

            if outcome.is_terminal() {
                break ReplayEnd::Terminated;
            }
            let Some(contract) = outcome.next_action else {
                return Err(ScoutError::ScenarioError {
                    reason: format!("cycle at frame {frame} continued without selecting an action"),
                });
            };
            let Some((index, next)) = frames.next() else {
                break ReplayEnd::FramesExhausted;
            };

            session.observe(contract.action_id().clone(), next.ui_state(), next.action_succeeded);
            frame = index;
        };

        let (state, audit) = session.finish()?;
        let audit_intact = verify_chain(&audit.events);

        info!(
            scenario = scenario.display_name(),
            cycles = steps.len(),
            end = ?end,
            anomalies = state.anomalies.len(),
            audit_intact,
            "replay finished"
        );

        Ok(Replay {
            steps,
            end,
            state,
            audit,
            audit_intact,
        })
    }
}
