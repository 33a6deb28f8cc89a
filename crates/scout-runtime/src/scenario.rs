//! Recorded test sessions.
//!
//! A `Scenario` is a sequence of UI snapshots as a driver would have
//! captured them. Frame 0 is the starting screen; frame `n + 1` is what the
//! UI showed after the action chosen at frame `n` ran.

use std::path::Path;

use serde::{Deserialize, Serialize};

use scout_contracts::{
    action::ActionId,
    error::{ScoutError, ScoutResult},
    observation::Observation,
    state::{ExecutionContext, UiState},
};

/// One captured UI snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub observation: Observation,
    #[serde(default)]
    pub available_actions: Vec<ActionId>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub page_title: Option<String>,
    /// Whether the action that led to this frame succeeded. Ignored on the
    /// first frame.
    #[serde(default)]
    pub action_succeeded: Option<bool>,
}

impl Frame {
    pub fn ui_state(&self) -> UiState {
        UiState {
            available_actions: self.available_actions.clone(),
            observation: self.observation.clone(),
            page_url: self.page_url.clone(),
            page_title: self.page_title.clone(),
        }
    }
}

fn default_max_steps() -> u64 {
    ExecutionContext::default().max_steps
}

/// A recorded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,
    pub frames: Vec<Frame>,
}

impl Scenario {
    /// Parse `s` as a JSON scenario.
    ///
    /// Returns `ScoutError::ScenarioError` if the JSON is malformed or the
    /// scenario has no frames.
    pub fn from_json_str(s: &str) -> ScoutResult<Self> {
        let scenario: Scenario = serde_json::from_str(s).map_err(|e| ScoutError::ScenarioError {
            reason: format!("failed to parse scenario JSON: {}", e),
        })?;
        if scenario.frames.is_empty() {
            return Err(ScoutError::ScenarioError {
                reason: "scenario has no frames".to_string(),
            });
        }
        Ok(scenario)
    }

    pub fn from_file(path: &Path) -> ScoutResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ScoutError::ScenarioError {
            reason: format!("failed to read scenario file '{}': {}", path.display(), e),
        })?;
        Self::from_json_str(&contents)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed scenario")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
