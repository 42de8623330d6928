//! # Skirmish Headless
//!
//! Runs AI controllers against a small deterministic in-process engine,
//! with no graphics and no IO beyond the final report. Used for AI
//! behavior verification in CI and for reproducing seeded games.
//!
//! The engine here is intentionally tiny: single-cell units, stepwise
//! movement, flat damage. It exists to exercise the decision engine
//! end-to-end, not to be a game.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod engine;
pub mod runner;
pub mod scenario;
