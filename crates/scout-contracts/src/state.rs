//! Session state and the read-only cycle view.
//!
//! `AgentState` is the aggregate one test session carries from cycle to
//! cycle. Its fields split into two groups:
//!
//! - read-only to the core: `ui_state`, `execution_context`
//! - writable by the core: `knowledge`, `decision`, `anomalies` (append-only)
//!
//! The split is enforced by borrowing, not by convention: a reasoning cycle
//! destructures the state into a shared `CycleView` over the read-only
//! fields and separate `&mut` handles for each writable field, so a
//! component handed the view cannot mutate the observation or the context.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    action::{ActionContract, ActionId},
    anomaly::AnomalyLog,
    knowledge::Knowledge,
    observation::Observation,
};

/// Unique identifier for one exploratory test session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub uuid::Uuid);

impl SessionId {
    /// Create a new, unique session ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// What the driver currently exposes. Read-only to the core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiState {
    /// Actions executable right now, in the driver's order.
    #[serde(default)]
    pub available_actions: Vec<ActionId>,
    #[serde(default)]
    pub observation: Observation,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub page_title: Option<String>,
}

/// Step counters and history. Read-only to the core; the external
/// orchestrator advances it between cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    #[serde(default)]
    pub step_count: u64,
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,
    /// Executed actions, oldest first.
    #[serde(default)]
    pub action_history: Vec<ActionId>,
    /// The observation from the previous cycle.
    #[serde(default)]
    pub previous_state: Option<Observation>,
    /// The offered action set from the previous cycle.
    #[serde(default)]
    pub previous_available_actions: Option<Vec<ActionId>>,
    /// Earlier observations, oldest first; the newest entry is the previous
    /// cycle's observation.
    #[serde(default)]
    pub observation_history: Vec<Observation>,
    /// Whether the driver reported the last action as successful.
    /// `None` means no outcome was reported.
    #[serde(default)]
    pub last_action_succeeded: Option<bool>,
}

fn default_max_steps() -> u64 {
    100
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            step_count: 0,
            max_steps: default_max_steps(),
            action_history: Vec::new(),
            previous_state: None,
            previous_available_actions: None,
            observation_history: Vec::new(),
            last_action_succeeded: None,
        }
    }
}

impl ExecutionContext {
    pub fn with_max_steps(max_steps: u64) -> Self {
        Self {
            max_steps,
            ..Self::default()
        }
    }

    pub fn last_action(&self) -> Option<&ActionId> {
        self.action_history.last()
    }

    /// How many times `action` has been executed this session.
    pub fn execution_count(&self, action: &ActionId) -> usize {
        self.action_history.iter().filter(|a| *a == action).count()
    }

    /// Record that `executed` ran while `ui` was on screen.
    ///
    /// For external drivers only; the core never advances the context.
    /// `history_capacity` bounds `observation_history`.
    pub fn advance(
        &mut self,
        executed: ActionId,
        ui: &UiState,
        succeeded: Option<bool>,
        history_capacity: usize,
    ) {
        self.step_count += 1;
        self.action_history.push(executed);
        self.previous_state = Some(ui.observation.clone());
        self.previous_available_actions = Some(ui.available_actions.clone());
        self.observation_history.push(ui.observation.clone());
        if self.observation_history.len() > history_capacity {
            let excess = self.observation_history.len() - history_capacity;
            self.observation_history.drain(..excess);
        }
        self.last_action_succeeded = succeeded;
    }
}

/// The three control outcomes of a reasoning cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlDecision {
    /// Keep exploring normally.
    #[default]
    Continue,
    /// Keep exploring; downstream consumers should scrutinize harder.
    DeepTest,
    /// Stop the session. Terminal.
    Terminate,
}

impl fmt::Display for ControlDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Continue => "CONTINUE",
            Self::DeepTest => "DEEP_TEST",
            Self::Terminate => "TERMINATE",
        };
        f.write_str(s)
    }
}

/// The cycle's output. Fully replaced every cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub next_action: Option<ActionContract>,
    pub control: ControlDecision,
    /// Empty until the first cycle has run.
    #[serde(default)]
    pub reasoning: String,
}

/// Everything one test session carries between cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    #[serde(default)]
    pub session_id: SessionId,
    #[serde(default)]
    pub ui_state: UiState,
    #[serde(default)]
    pub execution_context: ExecutionContext,
    #[serde(default)]
    pub knowledge: Knowledge,
    #[serde(default)]
    pub decision: Decision,
    #[serde(default)]
    pub anomalies: AnomalyLog,
}

impl AgentState {
    /// A fresh session state for the given UI snapshot.
    pub fn new(ui_state: UiState, execution_context: ExecutionContext) -> Self {
        Self {
            ui_state,
            execution_context,
            ..Self::default()
        }
    }
}

/// Shared, read-only view of the cycle's input snapshot.
#[derive(Debug, Clone, Copy)]
pub struct CycleView<'a> {
    pub ui: &'a UiState,
    pub context: &'a ExecutionContext,
}

impl<'a> CycleView<'a> {
    pub fn new(ui: &'a UiState, context: &'a ExecutionContext) -> Self {
        Self { ui, context }
    }

    pub fn observation(&self) -> &'a Observation {
        &self.ui.observation
    }

    pub fn available_actions(&self) -> &'a [ActionId] {
        &self.ui.available_actions
    }

    pub fn last_action(&self) -> Option<&'a ActionId> {
        self.context.last_action()
    }

    pub fn previous_observation(&self) -> Option<&'a Observation> {
        self.context.previous_state.as_ref()
    }

    /// The most recent observations, oldest first, ending with the current
    /// one.
    ///
    /// Built from `observation_history`; when the driver keeps no history
    /// but did supply `previous_state`, that single observation is used.
    pub fn recent_observations(&self) -> Vec<&'a Observation> {
        let mut window: Vec<&'a Observation> = if self.context.observation_history.is_empty() {
            self.context.previous_state.iter().collect()
        } else {
            self.context.observation_history.iter().collect()
        };
        window.push(&self.ui.observation);
        window
    }
}
