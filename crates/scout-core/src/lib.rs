//! # scout-core
//!
//! The single-step reasoning cycle of the SCOUT exploratory-testing core.
//!
//! This crate provides:
//! - The four seam traits (`AnomalyDetector`, `ControlRouter`,
//!   `ActionPlanner`, `CycleAuditWriter`)
//! - Read-only interpretation of a snapshot
//! - Per-action success-rate learning
//! - The `ReasoningCycle` that sequences them over an `AgentState`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scout_core::{ReasoningCycle, traits::{AnomalyDetector, ControlRouter, ActionPlanner}};
//! ```

pub mod cycle;
pub mod interpret;
pub mod learn;
pub mod traits;

pub use cycle::{CycleOutcome, ReasoningCycle};
