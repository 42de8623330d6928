//! Command intents issued to the host engine.
//!
//! Commands are append-only: the engine queues them and applies them on a
//! later tick, so a stage never observes the effect of its own command
//! within the same decision pass.

use serde::{Deserialize, Serialize};

use crate::types::{CellPos, UnitId, UnitTypeId};

/// A single unit order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitCommand {
    /// Start producing `ty` at `factory`.
    Produce {
        /// Producing unit.
        factory: UnitId,
        /// Type to produce.
        ty: UnitTypeId,
    },
    /// Place `factory`'s finished production at `at`.
    PlaceProduction {
        /// Factory holding a completed production.
        factory: UnitId,
        /// Target cell.
        at: CellPos,
    },
    /// Move without engaging targets on the way.
    Move {
        /// Unit to move.
        unit: UnitId,
        /// Destination cell.
        to: CellPos,
    },
    /// Move and attack anything hostile encountered en route.
    AttackMove {
        /// Unit to move.
        unit: UnitId,
        /// Destination cell.
        to: CellPos,
    },
    /// Harvest the resource at `at`.
    Mine {
        /// Harvester unit.
        unit: UnitId,
        /// Resource cell.
        at: CellPos,
    },
    /// Cancel the unit's current order.
    Stop {
        /// Unit to stop.
        unit: UnitId,
    },
}

/// Receiver for command intents.
///
/// Implemented by the host engine; the recording sink used in tests simply
/// stores everything it is given.
pub trait CommandSink {
    /// Queue one command for the engine to apply on a subsequent tick.
    fn issue(&mut self, command: UnitCommand);
}
