//! # scout-runtime
//!
//! Puts the SCOUT components together and drives them.
//!
//! - `build_cycle` wires the invariant engine, priority router and coverage
//!   planner from one `ScoutConfig`
//! - `ScoutSession` is the driver-side loop for one test session: decide,
//!   execute elsewhere, then report the next snapshot
//! - `Replayer` runs a `ScoutSession` over a recorded JSON `Scenario`
//!   instead of a live UI
//!
//! ```rust,ignore
//! let scenario = Scenario::from_file(Path::new("scenarios/checkout_stall.json"))?;
//! let replay = Replayer::new(ScoutConfig::default()).replay(&scenario)?;
//! assert!(replay.audit_intact);
//! ```

pub mod replay;
pub mod scenario;
pub mod session;
pub mod wiring;

pub use replay::{Replay, ReplayEnd, ReplayStep, Replayer};
pub use scenario::{Frame, Scenario};
pub use session::ScoutSession;
pub use wiring::build_cycle;
