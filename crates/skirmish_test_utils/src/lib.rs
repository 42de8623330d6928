//! Test fixtures for the decision engine.
//!
//! [`ScriptedWorld`] is a hand-built [`WorldView`] snapshot and
//! [`RecordingSink`] captures every command a stage issues, so tests can
//! assert on decisions without a game engine in the loop.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

use std::collections::{BTreeMap, HashMap, HashSet};

use skirmish_ai::commands::{CommandSink, UnitCommand};
use skirmish_ai::types::{CellPos, PlayerId, ResourceKind, UnitId, UnitTypeId, WorkState};
use skirmish_ai::world::WorldView;

/// One scripted unit.
#[derive(Debug, Clone)]
pub struct ScriptedUnit {
    /// Owning player.
    pub owner: PlayerId,
    /// Unit type.
    pub ty: UnitTypeId,
    /// Map position, if on the map.
    pub pos: Option<CellPos>,
    /// Liveness flag.
    pub alive: bool,
    /// Current work state.
    pub work: WorkState,
    /// Whether the unit can move.
    pub mobile: bool,
    /// Whether the unit carries a weapon.
    pub shoots: bool,
    /// Whether the unit harvests minerals.
    pub mines_minerals: bool,
    /// Whether the unit harvests oil.
    pub mines_oil: bool,
    /// Sight range in cells.
    pub sight: u32,
    /// Producible types, empty for non-producers.
    pub production: Vec<UnitTypeId>,
    /// Finished production waiting for placement.
    pub completed: Option<UnitTypeId>,
}

impl ScriptedUnit {
    /// A minimal living unit of `ty` owned by `owner`.
    #[must_use]
    pub fn new(owner: PlayerId, ty: UnitTypeId) -> Self {
        Self {
            owner,
            ty,
            pos: None,
            alive: true,
            work: WorkState::Idle,
            mobile: false,
            shoots: false,
            mines_minerals: false,
            mines_oil: false,
            sight: 3,
            production: Vec::new(),
            completed: None,
        }
    }

    /// Place the unit at a cell.
    #[must_use]
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.pos = Some(CellPos::new(x, y));
        self
    }

    /// Mark the unit mobile.
    #[must_use]
    pub fn mobile(mut self) -> Self {
        self.mobile = true;
        self
    }

    /// Give the unit a weapon.
    #[must_use]
    pub fn shooter(mut self) -> Self {
        self.shoots = true;
        self
    }

    /// Make the unit a harvester of `kind`.
    #[must_use]
    pub fn miner(mut self, kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Minerals => self.mines_minerals = true,
            ResourceKind::Oil => self.mines_oil = true,
        }
        self
    }

    /// Set the sight range.
    #[must_use]
    pub fn sight(mut self, sight: u32) -> Self {
        self.sight = sight;
        self
    }

    /// Set the work state.
    #[must_use]
    pub fn working(mut self, work: WorkState) -> Self {
        self.work = work;
        self
    }

    /// Give the unit a production list.
    #[must_use]
    pub fn produces(mut self, types: &[UnitTypeId]) -> Self {
        self.production = types.to_vec();
        self
    }

    /// Mark a production of `ty` as finished and awaiting placement.
    #[must_use]
    pub fn finished(mut self, ty: UnitTypeId) -> Self {
        self.completed = Some(ty);
        self
    }

    /// Mark the unit dead.
    #[must_use]
    pub fn dead(mut self) -> Self {
        self.alive = false;
        self
    }
}

/// Per-player fog script: a default plus per-cell overrides.
#[derive(Debug, Clone, Default)]
struct FogScript {
    default_fogged: bool,
    overrides: HashMap<CellPos, bool>,
}

/// A hand-built world snapshot implementing [`WorldView`].
///
/// Units are stored in a `BTreeMap` so "all units of a player" comes back
/// in ascending id order, matching the stable iteration the engine
/// guarantees.
#[derive(Debug, Clone)]
pub struct ScriptedWorld {
    map: (i32, i32),
    players: Vec<PlayerId>,
    enemies: HashSet<(PlayerId, PlayerId)>,
    units: BTreeMap<UnitId, ScriptedUnit>,
    minerals: HashMap<PlayerId, i64>,
    oil: HashMap<PlayerId, i64>,
    power_generated: HashMap<PlayerId, i64>,
    power_consumed: HashMap<PlayerId, i64>,
    mobile_types: HashSet<UnitTypeId>,
    fog: HashMap<PlayerId, FogScript>,
    blocked: HashSet<CellPos>,
    resource_cells: HashMap<ResourceKind, Vec<CellPos>>,
}

impl ScriptedWorld {
    /// Empty world with the given map size.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            map: (width, height),
            players: Vec::new(),
            enemies: HashSet::new(),
            units: BTreeMap::new(),
            minerals: HashMap::new(),
            oil: HashMap::new(),
            power_generated: HashMap::new(),
            power_consumed: HashMap::new(),
            mobile_types: HashSet::new(),
            fog: HashMap::new(),
            blocked: HashSet::new(),
            resource_cells: HashMap::new(),
        }
    }

    /// Register a player.
    pub fn add_player(&mut self, player: PlayerId) -> &mut Self {
        if !self.players.contains(&player) {
            self.players.push(player);
        }
        self
    }

    /// Make two players mutual enemies.
    pub fn set_enemies(&mut self, a: PlayerId, b: PlayerId) -> &mut Self {
        self.add_player(a);
        self.add_player(b);
        self.enemies.insert((a, b));
        self.enemies.insert((b, a));
        self
    }

    /// Add a unit under a fixed id.
    pub fn add_unit(&mut self, id: UnitId, unit: ScriptedUnit) -> &mut Self {
        self.add_player(unit.owner);
        self.units.insert(id, unit);
        self
    }

    /// Mutable access to a scripted unit.
    pub fn unit_mut(&mut self, id: UnitId) -> &mut ScriptedUnit {
        self.units.get_mut(&id).expect("unknown scripted unit")
    }

    /// Kill a unit.
    pub fn kill(&mut self, id: UnitId) -> &mut Self {
        self.unit_mut(id).alive = false;
        self
    }

    /// Set a player's mineral and oil balances.
    pub fn set_resources(&mut self, player: PlayerId, minerals: i64, oil: i64) -> &mut Self {
        self.minerals.insert(player, minerals);
        self.oil.insert(player, oil);
        self
    }

    /// Set a player's projected power totals.
    pub fn set_power(&mut self, player: PlayerId, generated: i64, consumed: i64) -> &mut Self {
        self.power_generated.insert(player, generated);
        self.power_consumed.insert(player, consumed);
        self
    }

    /// Declare a producible type mobile.
    pub fn set_mobile_type(&mut self, ty: UnitTypeId) -> &mut Self {
        self.mobile_types.insert(ty);
        self
    }

    /// Set a player's default fog state for all cells.
    pub fn set_fog_default(&mut self, player: PlayerId, fogged: bool) -> &mut Self {
        self.fog.entry(player).or_default().default_fogged = fogged;
        self
    }

    /// Override the fog state of one cell for a player.
    pub fn set_fog(&mut self, player: PlayerId, cell: CellPos, fogged: bool) -> &mut Self {
        self.fog
            .entry(player)
            .or_default()
            .overrides
            .insert(cell, fogged);
        self
    }

    /// Make a cell illegal for placement.
    pub fn block_cell(&mut self, cell: CellPos) -> &mut Self {
        self.blocked.insert(cell);
        self
    }

    /// Register a harvestable resource cell.
    pub fn add_resource_cell(&mut self, kind: ResourceKind, cell: CellPos) -> &mut Self {
        self.resource_cells.entry(kind).or_default().push(cell);
        self
    }

    fn living(&self, id: UnitId) -> Option<&ScriptedUnit> {
        self.units.get(&id).filter(|u| u.alive)
    }
}

impl WorldView for ScriptedWorld {
    fn players(&self) -> Vec<PlayerId> {
        self.players.clone()
    }

    fn is_enemy(&self, player: PlayerId, other: PlayerId) -> bool {
        self.enemies.contains(&(player, other))
    }

    fn player_units(&self, player: PlayerId) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|(_, u)| u.alive && u.owner == player)
            .map(|(id, _)| *id)
            .collect()
    }

    fn is_alive(&self, unit: UnitId) -> bool {
        self.living(unit).is_some()
    }

    fn unit_owner(&self, unit: UnitId) -> Option<PlayerId> {
        self.living(unit).map(|u| u.owner)
    }

    fn unit_type(&self, unit: UnitId) -> Option<UnitTypeId> {
        self.living(unit).map(|u| u.ty)
    }

    fn unit_position(&self, unit: UnitId) -> Option<CellPos> {
        self.living(unit).and_then(|u| u.pos)
    }

    fn unit_work(&self, unit: UnitId) -> Option<WorkState> {
        self.living(unit).map(|u| u.work)
    }

    fn is_type_mobile(&self, _player: PlayerId, ty: UnitTypeId) -> bool {
        self.mobile_types.contains(&ty)
    }

    fn is_mobile(&self, unit: UnitId) -> bool {
        self.living(unit).is_some_and(|u| u.mobile)
    }

    fn can_shoot(&self, unit: UnitId) -> bool {
        self.living(unit).is_some_and(|u| u.shoots)
    }

    fn can_mine(&self, unit: UnitId, kind: ResourceKind) -> bool {
        self.living(unit).is_some_and(|u| match kind {
            ResourceKind::Minerals => u.mines_minerals,
            ResourceKind::Oil => u.mines_oil,
        })
    }

    fn can_produce(&self, unit: UnitId) -> bool {
        self.living(unit).is_some_and(|u| !u.production.is_empty())
    }

    fn production_types(&self, unit: UnitId) -> Vec<UnitTypeId> {
        self.living(unit).map(|u| u.production.clone()).unwrap_or_default()
    }

    fn has_completed_production(&self, unit: UnitId) -> bool {
        self.living(unit).is_some_and(|u| u.completed.is_some())
    }

    fn completed_production_type(&self, unit: UnitId) -> Option<UnitTypeId> {
        self.living(unit).and_then(|u| u.completed)
    }

    fn units_of_type_count(&self, player: PlayerId, ty: UnitTypeId) -> u32 {
        let count = self
            .units
            .values()
            .filter(|u| u.alive && u.owner == player && u.ty == ty)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn minerals(&self, player: PlayerId) -> i64 {
        self.minerals.get(&player).copied().unwrap_or(0)
    }

    fn oil(&self, player: PlayerId) -> i64 {
        self.oil.get(&player).copied().unwrap_or(0)
    }

    fn power_generated(&self, player: PlayerId) -> i64 {
        self.power_generated.get(&player).copied().unwrap_or(0)
    }

    fn power_consumed(&self, player: PlayerId) -> i64 {
        self.power_consumed.get(&player).copied().unwrap_or(0)
    }

    fn sight_range(&self, unit: UnitId) -> u32 {
        self.living(unit).map_or(0, |u| u.sight)
    }

    fn is_fogged(&self, player: PlayerId, cell: CellPos) -> bool {
        self.fog.get(&player).map_or(false, |script| {
            script
                .overrides
                .get(&cell)
                .copied()
                .unwrap_or(script.default_fogged)
        })
    }

    fn can_place_production_at(&self, _factory: UnitId, _ty: UnitTypeId, cell: CellPos) -> bool {
        let (w, h) = self.map;
        cell.x >= 0 && cell.y >= 0 && cell.x < w && cell.y < h && !self.blocked.contains(&cell)
    }

    fn map_size(&self) -> (i32, i32) {
        self.map
    }

    fn nearest_resource_cells(
        &self,
        _player: PlayerId,
        kind: ResourceKind,
        near: CellPos,
        max: usize,
    ) -> Vec<CellPos> {
        let mut cells = self.resource_cells.get(&kind).cloned().unwrap_or_default();
        cells.sort_by_key(|c| c.ring_distance(near));
        cells.truncate(max);
        cells
    }
}

/// A [`CommandSink`] that records everything it is given.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Commands in issue order.
    pub commands: Vec<UnitCommand>,
}

impl RecordingSink {
    /// Empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing was issued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Forget recorded commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Types of all `Produce` commands, in issue order.
    #[must_use]
    pub fn produced_types(&self) -> Vec<UnitTypeId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                UnitCommand::Produce { ty, .. } => Some(*ty),
                _ => None,
            })
            .collect()
    }
}

impl CommandSink for RecordingSink {
    fn issue(&mut self, command: UnitCommand) {
        tracing::debug!(?command, "recorded");
        self.commands.push(command);
    }
}
