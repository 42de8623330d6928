//! Identifiers and small value types shared across the decision stages.
//!
//! The engine owns all unit state; the AI only ever holds opaque ids and
//! snapshot values read through [`crate::world::WorldView`].

use serde::{Deserialize, Serialize};

/// Numeric identifier for a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Opaque identifier for a unit owned by the host engine.
///
/// A `UnitId` held across cycles may refer to a dead unit; stages must
/// re-check liveness through the query surface before acting on one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Create a new unit ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// Numeric identifier for a producible unit type.
///
/// Values come from the engine's unit data set and are mapped to rule roles
/// by [`crate::config::UnitRoster`]; the AI never interprets the raw number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitTypeId(u32);

impl UnitTypeId {
    /// Create a new unit type ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for UnitTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A map cell coordinate.
///
/// The engine's map is a grid of cells addressed by non-negative
/// coordinates; queries that cannot produce a position return `None`
/// rather than a sentinel value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellPos {
    /// Horizontal cell index.
    pub x: i32,
    /// Vertical cell index.
    pub y: i32,
}

impl CellPos {
    /// Create a cell position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance to another cell (rings of the placement and
    /// exploration searches are square).
    #[must_use]
    pub fn ring_distance(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Clamp both coordinates into `0..width` x `0..height`.
    #[must_use]
    pub fn clamped(self, width: i32, height: i32) -> Self {
        Self {
            x: self.x.clamp(0, width.saturating_sub(1)),
            y: self.y.clamp(0, height.saturating_sub(1)),
        }
    }
}

impl std::fmt::Display for CellPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The two harvestable resource kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Minerals, the primary construction resource.
    Minerals,
    /// Oil, the secondary resource.
    Oil,
}

/// What a unit is currently doing, as reported by the engine.
///
/// Mirrors the engine's per-unit advance-work code. The decision stages
/// only branch on `Idle` (eligible for new orders) and `Producing`
/// (placement pending); everything else is carried through untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WorkState {
    /// No active order.
    #[default]
    Idle,
    /// Moving to a destination.
    Moving,
    /// Attacking or attack-moving.
    Attacking,
    /// Mining a resource cell.
    Mining,
    /// Running a production plugin; finished productions wait here for
    /// placement.
    Producing,
    /// Any other engine work code.
    Other(u8),
}

impl WorkState {
    /// Whether the unit can accept a new order this cycle.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}
