//! Multi-turn sessions: persistence and the turn engine.

mod engine;
mod store;

pub use engine::{ContinuityEngine, TurnError, TurnMode, TurnOutcome};
pub use store::SessionStore;
