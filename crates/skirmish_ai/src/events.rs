//! Engine notifications the controller subscribes to.
//!
//! The host delivers these through [`crate::controller::AiController::notify`];
//! they replace polling where a reactive path exists (placement) and drive
//! cleanup of per-unit bookkeeping (production cursors).

use serde::{Deserialize, Serialize};

use crate::types::{CellPos, PlayerId, UnitId, UnitTypeId};

/// A game event relevant to AI bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A factory finished producing a unit of `ty`; facilities now wait
    /// for a placement command.
    UnitProduced {
        /// Owning player.
        owner: PlayerId,
        /// Factory position at completion time.
        pos: CellPos,
        /// Produced type.
        ty: UnitTypeId,
        /// Factory that produced it.
        factory: UnitId,
    },
    /// A produced unit was placed on the map.
    UnitPlaced {
        /// The new unit.
        unit: UnitId,
        /// Owning player.
        owner: PlayerId,
        /// Placement cell.
        pos: CellPos,
        /// Unit type.
        ty: UnitTypeId,
    },
    /// A unit was destroyed.
    UnitDestroyed {
        /// The dead unit.
        unit: UnitId,
        /// Player that owned it.
        owner: PlayerId,
        /// Unit type.
        ty: UnitTypeId,
    },
}
