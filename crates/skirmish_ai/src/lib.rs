//! # Skirmish AI
//!
//! Rule-based decision engine for computer-controlled RTS players.
//!
//! Each AI-controlled player owns one [`controller::AiController`]. The host
//! engine calls [`controller::AiController::tick`] once per simulation step;
//! at its configured cadence the controller runs its decision stages in a
//! fixed order (produce, place, mine, explore, attack) against a read-only
//! view of the game and emits unit-command intents.
//!
//! This crate contains **only** deterministic decision logic:
//! - No rendering
//! - No IO
//! - No system randomness (each controller owns a seeded RNG)
//! - No game-state ownership (units live in the host engine)
//!
//! This separation enables:
//! - Headless AI-vs-AI runs for CI
//! - Reproducible games from a recorded seed
//! - Per-player parallelism in the host (controllers share nothing)
//!
//! ## Crate Structure
//!
//! - [`types`] - identifiers and small value types
//! - [`world`] - read-only query surface over the host engine
//! - [`commands`] - command intents the engine consumes
//! - [`events`] - engine notifications the controller subscribes to
//! - [`config`] - cadence, doctrine thresholds and the unit roster
//! - [`controller`] - per-player controller composing the decision stages

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod clock;
pub mod combat;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod explore;
pub mod mining;
pub mod placement;
pub mod production;
pub mod stage;
pub mod types;
pub mod world;

// The inline unit tests below share fixtures with the `skirmish_test_utils`
// crate. Because that crate depends on `skirmish_ai`, using it directly from
// these in-crate tests would compile `skirmish_ai` twice (once plain for the
// helper crate, once with `cfg(test)` for this target) and the two copies'
// types would not unify. To keep a single crate instance, the same fixture
// source is compiled directly into this test target instead. `extern crate
// self` lets that shared source keep referring to the crate by name.
#[cfg(test)]
extern crate self as skirmish_ai;

#[cfg(test)]
#[path = "../../skirmish_test_utils/src/lib.rs"]
mod test_support;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::{DecisionClock, TICK_RATE};
    pub use crate::commands::{CommandSink, UnitCommand};
    pub use crate::config::{AiConfig, CadenceConfig, Doctrine, UnitRoster};
    pub use crate::controller::AiController;
    pub use crate::error::{AiError, Result};
    pub use crate::events::GameEvent;
    pub use crate::stage::{Blackboard, DecisionStage, StageContext, StageOutcome};
    pub use crate::types::{CellPos, PlayerId, ResourceKind, UnitId, UnitTypeId, WorkState};
    pub use crate::world::WorldView;
}
