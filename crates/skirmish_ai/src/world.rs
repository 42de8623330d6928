//! Read-only query surface over the host engine.
//!
//! Every decision pass works on synchronous snapshot reads through this
//! trait; nothing is cached across cycles except the ids the stages track
//! themselves (scout, attack target, rotation cursors), and those are
//! re-validated against [`WorldView::is_alive`] before use.
//!
//! Missing data is "not ready", never an error: a query about an unknown or
//! dead unit returns `None` (or an empty list), and the calling stage skips
//! the unit for this cycle.

use crate::types::{CellPos, PlayerId, ResourceKind, UnitId, UnitTypeId, WorkState};

/// Snapshot queries the decision stages are allowed to make.
///
/// Implemented by the host engine (and by the scripted world used in
/// tests). All methods take `&self`; the AI never mutates game state
/// directly.
pub trait WorldView {
    /// Ids of all players in the game, in stable order.
    fn players(&self) -> Vec<PlayerId>;

    /// Whether `other` is hostile to `player`.
    fn is_enemy(&self, player: PlayerId, other: PlayerId) -> bool;

    /// Ids of all living units owned by `player`, in stable order.
    fn player_units(&self, player: PlayerId) -> Vec<UnitId>;

    /// Whether the unit currently exists and is alive.
    fn is_alive(&self, unit: UnitId) -> bool;

    /// Owner of a living unit.
    fn unit_owner(&self, unit: UnitId) -> Option<PlayerId>;

    /// Type of a living unit.
    fn unit_type(&self, unit: UnitId) -> Option<UnitTypeId>;

    /// Position of a living unit that is on the map.
    fn unit_position(&self, unit: UnitId) -> Option<CellPos>;

    /// Current work state of the unit; `None` for unknown units.
    fn unit_work(&self, unit: UnitId) -> Option<WorkState>;

    /// Whether the given producible type is mobile for this player's
    /// faction (immobile types are facilities and need placement).
    fn is_type_mobile(&self, player: PlayerId, ty: UnitTypeId) -> bool;

    /// Whether the unit itself can move.
    fn is_mobile(&self, unit: UnitId) -> bool;

    /// Whether the unit carries a weapon.
    fn can_shoot(&self, unit: UnitId) -> bool;

    /// Whether the unit can harvest the given resource kind.
    fn can_mine(&self, unit: UnitId, kind: ResourceKind) -> bool;

    /// Whether the unit can produce other units.
    fn can_produce(&self, unit: UnitId) -> bool;

    /// Producible type ids for a production-capable unit, in the order the
    /// engine's data files list them. Empty for non-producers.
    fn production_types(&self, unit: UnitId) -> Vec<UnitTypeId>;

    /// Whether the unit's current production has finished and is waiting
    /// to be placed.
    fn has_completed_production(&self, unit: UnitId) -> bool;

    /// Type of the finished production waiting at this factory.
    fn completed_production_type(&self, unit: UnitId) -> Option<UnitTypeId>;

    /// Number of living units of one type owned by `player`.
    fn units_of_type_count(&self, player: PlayerId, ty: UnitTypeId) -> u32;

    /// Current mineral balance.
    fn minerals(&self, player: PlayerId) -> i64;

    /// Current oil balance.
    fn oil(&self, player: PlayerId) -> i64;

    /// Resource balance for a kind.
    fn resource(&self, player: PlayerId, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Minerals => self.minerals(player),
            ResourceKind::Oil => self.oil(player),
        }
    }

    /// Power the player will generate once queued constructions finish.
    fn power_generated(&self, player: PlayerId) -> i64;

    /// Power the player will consume once queued constructions finish.
    fn power_consumed(&self, player: PlayerId) -> i64;

    /// Sight range of a unit, in cells.
    fn sight_range(&self, unit: UnitId) -> u32;

    /// Whether the cell is currently under fog of war for `player`.
    fn is_fogged(&self, player: PlayerId, cell: CellPos) -> bool;

    /// Whether the finished production `ty` may legally be placed at
    /// `cell` by `factory` (terrain, occupancy and build-radius checks are
    /// the engine's).
    fn can_place_production_at(&self, factory: UnitId, ty: UnitTypeId, cell: CellPos) -> bool;

    /// Map dimensions in cells, `(width, height)`.
    fn map_size(&self) -> (i32, i32);

    /// Up to `max` resource cells of `kind` known to `player`, nearest to
    /// `near` first. May be empty on maps without that resource.
    fn nearest_resource_cells(
        &self,
        player: PlayerId,
        kind: ResourceKind,
        near: CellPos,
        max: usize,
    ) -> Vec<CellPos>;
}
