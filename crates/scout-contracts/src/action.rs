//! Action identifiers and the action contract handed to an executor.
//!
//! The core never invents actions. Every `ActionContract` it emits names an
//! action taken from the offered set, and its parameters never carry a
//! selector or a raw-DOM handle.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ScoutError, ScoutResult};

/// Parameter keys that would let a contract address raw markup.
///
/// Matched case-insensitively.
pub const FORBIDDEN_PARAMETER_KEYS: [&str; 4] = ["selector", "css_selector", "xpath", "dom"];

/// Opaque identifier of an offered action.
///
/// Uniqueness is only guaranteed within a single offered set.
/// Example: ActionId("click_submit")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub String);

impl ActionId {
    /// Construct an action id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id is empty or only whitespace. Such an id can be
    /// offered but never put in a contract.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Case-insensitive substring match against any of `keywords`.
    pub fn mentions_any(&self, keywords: &[String]) -> bool {
        let lowered = self.0.to_lowercase();
        keywords
            .iter()
            .any(|kw| lowered.contains(kw.to_lowercase().as_str()))
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The wire shape of an `ActionContract` before validation.
#[derive(Deserialize)]
struct RawActionContract {
    action_id: String,
    #[serde(default)]
    parameters: Map<String, Value>,
}

impl TryFrom<RawActionContract> for ActionContract {
    type Error = ScoutError;

    fn try_from(raw: RawActionContract) -> ScoutResult<Self> {
        ActionContract::new(raw.action_id, raw.parameters)
    }
}

/// An action chosen for execution, plus the parameters the executor needs.
///
/// Construction validates the contract; an invalid contract cannot exist,
/// including one read back from persisted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawActionContract")]
pub struct ActionContract {
    action_id: ActionId,
    parameters: Map<String, Value>,
}

impl ActionContract {
    /// Build a validated contract.
    ///
    /// The id is kept exactly as given, so it still matches the offered
    /// set. Returns `ScoutError::EmptyActionId` when it is empty or only
    /// whitespace, and `ScoutError::ForbiddenParameter` for the first
    /// parameter key naming a selector or DOM handle.
    pub fn new(action_id: impl Into<String>, parameters: Map<String, Value>) -> ScoutResult<Self> {
        let action_id = ActionId(action_id.into());
        if action_id.is_blank() {
            return Err(ScoutError::EmptyActionId);
        }

        if let Some(key) = parameters.keys().find(|key| {
            let lowered = key.to_lowercase();
            FORBIDDEN_PARAMETER_KEYS.contains(&lowered.as_str())
        }) {
            return Err(ScoutError::ForbiddenParameter { key: key.clone() });
        }

        Ok(Self {
            action_id,
            parameters,
        })
    }

    /// A contract with no parameters.
    pub fn bare(action_id: &ActionId) -> ScoutResult<Self> {
        Self::new(action_id.0.clone(), Map::new())
    }

    pub fn action_id(&self) -> &ActionId {
        &self.action_id
    }

    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    /// Reject the contract unless its action is in `offered`.
    pub fn ensure_offered(&self, offered: &[ActionId]) -> ScoutResult<()> {
        if offered.contains(&self.action_id) {
            Ok(())
        } else {
            Err(ScoutError::ActionNotOffered {
                action_id: self.action_id.0.clone(),
            })
        }
    }
}
