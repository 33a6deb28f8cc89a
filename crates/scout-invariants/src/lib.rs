//! # scout-invariants
//!
//! Anomaly detection for SCOUT: five structural invariants plus a
//! baseline stability check over numeric metrics.
//!
//! The invariants validate coherence, not correctness. A check fires when
//! the application behaves inconsistently with itself (a successful action
//! that changed nothing, an entity that vanished without a delete), never
//! when an outcome merely looks wrong for the business.
//!
//! `InvariantEngine` implements `scout_core::traits::AnomalyDetector`.

pub mod baseline;
pub mod checks;
pub mod engine;

pub use engine::InvariantEngine;
