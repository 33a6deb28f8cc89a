//! # scout-policy
//!
//! The decision policies of SCOUT:
//!
//! - `risk`: per-action risk scores learned from attributed anomalies
//! - `exploration`: coverage-guided scoring and selection
//! - `router`: the priority-ordered CONTINUE / DEEP_TEST / TERMINATE router
//! - `planner`: `CoveragePlanner`, combining risk and exploration
//!
//! `PriorityRouter` implements `scout_core::traits::ControlRouter` and
//! `CoveragePlanner` implements `scout_core::traits::ActionPlanner`.

pub mod exploration;
pub mod planner;
pub mod risk;
pub mod router;

pub use planner::CoveragePlanner;
pub use router::{PriorityRouter, RouteReason};
