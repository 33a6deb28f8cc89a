//! Error types for the SCOUT decision core.
//!
//! The decision path itself is total: checks, routing, and selection never
//! fail. Errors exist only at the boundaries: contract construction,
//! configuration and scenario loading, and the audit sink.

use thiserror::Error;

/// The unified error type for the SCOUT crates.
#[derive(Debug, Error)]
pub enum ScoutError {
    /// An `ActionContract` was built with an empty or whitespace-only id.
    #[error("action contract rejected: action_id cannot be empty")]
    EmptyActionId,

    /// An `ActionContract` carried a selector or raw-DOM parameter.
    #[error("action contract rejected: forbidden parameter '{key}' (selectors and DOM references are not allowed)")]
    ForbiddenParameter { key: String },

    /// A contract named an action that is not in the current offered set.
    #[error("action '{action_id}' is not in the offered action set")]
    ActionNotOffered { action_id: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The cycle audit sink could not persist a record.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// A scripted session could not be loaded or replayed.
    #[error("scenario error: {reason}")]
    ScenarioError { reason: String },
}

/// Convenience alias used throughout the SCOUT crates.
pub type ScoutResult<T> = Result<T, ScoutError>;
