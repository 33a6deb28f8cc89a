//! Read-only interpretation of a cycle's input snapshot.
//!
//! `interpret` summarizes what the driver is showing: notable signals in the
//! observation, how it differs from the previous one, and where the session
//! stands. It takes only shared borrows, so running it any number of times
//! yields the same value and leaves the state untouched.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

use scout_contracts::{
    action::ActionId,
    anomaly::AnomalyLog,
    observation::Observation,
    state::CycleView,
};

/// Observation keys surfaced verbatim as counts.
const COUNT_KEYS: [&str; 4] = ["element_count", "item_count", "result_count", "error_count"];

/// Notable conditions in the current observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Signals {
    /// `error` or `error_message` is present, even when null.
    pub error_present: bool,
    pub error_details: Option<Value>,
    /// `loading` or `is_busy` is true.
    pub system_busy: bool,
    /// False when `empty_state` or `no_data` is true.
    pub data_present: bool,
    /// `success` or `success_message` is present.
    pub success_present: bool,
    pub success_details: Option<Value>,
    pub counts: BTreeMap<String, Value>,
    pub form_visible: Option<Value>,
    pub inputs_filled: Option<Value>,
}

/// A changed value under a key present in both observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueChange {
    pub previous: Value,
    pub current: Value,
}

/// Key-level difference between the previous and current observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateDelta {
    pub added_keys: BTreeSet<String>,
    pub removed_keys: BTreeSet<String>,
    pub changed_values: BTreeMap<String, ValueChange>,
    pub unchanged: bool,
}

/// Where the session stands.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextSummary {
    pub step_count: u64,
    pub actions_executed: usize,
    pub anomalies_detected: usize,
    pub page_url: Option<String>,
    pub page_title: Option<String>,
    /// Offered actions that have never been executed.
    pub unexplored_actions: usize,
}

/// Everything derived from one snapshot before any check runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    pub available_actions: Vec<ActionId>,
    pub signals: Signals,
    pub context: ContextSummary,
    /// Absent when there is no previous observation.
    pub state_delta: Option<StateDelta>,
}

/// Summarize the snapshot. Pure: no field of the state is written.
pub fn interpret(view: CycleView<'_>, anomalies: &AnomalyLog) -> Interpretation {
    let history = &view.context.action_history;
    let unexplored_actions = view
        .available_actions()
        .iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|a| !history.contains(*a))
        .count();

    Interpretation {
        available_actions: view.available_actions().to_vec(),
        signals: extract_signals(view.observation()),
        context: ContextSummary {
            step_count: view.context.step_count,
            actions_executed: history.len(),
            anomalies_detected: anomalies.len(),
            page_url: view.ui.page_url.clone(),
            page_title: view.ui.page_title.clone(),
            unexplored_actions,
        },
        state_delta: view
            .previous_observation()
            .map(|previous| compute_state_delta(previous, view.observation())),
    }
}

/// Pull the conventional signal keys out of an observation.
pub fn extract_signals(observation: &Observation) -> Signals {
    let first_present = |keys: [&str; 2]| -> (bool, Option<Value>) {
        let present = keys.iter().any(|k| observation.contains_key(k));
        let details = keys
            .iter()
            .filter_map(|k| observation.get(k))
            .find(|v| is_truthy(v))
            .cloned();
        (present, details)
    };

    let (error_present, error_details) = first_present(["error", "error_message"]);
    let (success_present, success_details) = first_present(["success", "success_message"]);

    let counts = COUNT_KEYS
        .iter()
        .filter_map(|k| observation.get(k).map(|v| (k.to_string(), v.clone())))
        .collect();

    Signals {
        error_present,
        error_details,
        system_busy: observation.flag("loading") || observation.flag("is_busy"),
        data_present: !(observation.flag("empty_state") || observation.flag("no_data")),
        success_present,
        success_details,
        counts,
        form_visible: observation.get("form_visible").cloned(),
        inputs_filled: observation.get("inputs_filled").cloned(),
    }
}

/// Compare two observations key by key.
pub fn compute_state_delta(previous: &Observation, current: &Observation) -> StateDelta {
    let added_keys: BTreeSet<String> = current
        .iter()
        .filter(|(k, _)| !previous.contains_key(k))
        .map(|(k, _)| k.clone())
        .collect();
    let removed_keys: BTreeSet<String> = previous
        .iter()
        .filter(|(k, _)| !current.contains_key(k))
        .map(|(k, _)| k.clone())
        .collect();

    let changed_values: BTreeMap<String, ValueChange> = previous
        .iter()
        .filter_map(|(k, before)| {
            let after = current.get(k)?;
            (before != after).then(|| {
                (
                    k.clone(),
                    ValueChange {
                        previous: before.clone(),
                        current: after.clone(),
                    },
                )
            })
        })
        .collect();

    let unchanged = added_keys.is_empty() && removed_keys.is_empty() && changed_values.is_empty();

    StateDelta {
        added_keys,
        removed_keys,
        changed_values,
        unchanged,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
