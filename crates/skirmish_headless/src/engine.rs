//! A minimal deterministic grid engine.
//!
//! Implements the [`WorldView`] query surface the AI reads and consumes
//! the command intents it emits. Commands queue up during a tick and are
//! applied at the start of the next one, so controllers never see their
//! own orders take effect within a pass.
//!
//! Iteration is always over a `BTreeMap`, so identical scenarios replay
//! identically.

use std::collections::{BTreeMap, HashMap, HashSet};

use skirmish_ai::commands::{CommandSink, UnitCommand};
use skirmish_ai::config::UnitRoster;
use skirmish_ai::events::GameEvent;
use skirmish_ai::types::{CellPos, PlayerId, ResourceKind, UnitId, UnitTypeId, WorkState};
use skirmish_ai::world::WorldView;

/// Static data for one unit type.
#[derive(Debug, Clone)]
pub struct UnitSpec {
    /// Whether units of this type can move.
    pub mobile: bool,
    /// Whether they carry a weapon.
    pub shoots: bool,
    /// Resource kind they can harvest, if any.
    pub mines: Option<ResourceKind>,
    /// Sight range in cells.
    pub sight: u32,
    /// Cells moved per tick.
    pub speed: i32,
    /// Power generated while standing.
    pub power_generated: i64,
    /// Power consumed while standing.
    pub power_consumed: i64,
    /// Types this unit can produce.
    pub production: Vec<UnitTypeId>,
    /// Ticks one production takes.
    pub production_time: u32,
    /// Mineral cost to produce one unit of this type.
    pub cost_minerals: i64,
    /// Oil cost to produce one unit of this type.
    pub cost_oil: i64,
    /// Hit points.
    pub hit_points: i32,
    /// Damage per tick while attacking in range.
    pub damage: i32,
    /// Attack range in cells.
    pub range: i32,
}

impl Default for UnitSpec {
    fn default() -> Self {
        Self {
            mobile: false,
            shoots: false,
            mines: None,
            sight: 3,
            speed: 0,
            power_generated: 0,
            power_consumed: 0,
            production: Vec::new(),
            production_time: 40,
            cost_minerals: 100,
            cost_oil: 0,
            hit_points: 100,
            damage: 0,
            range: 0,
        }
    }
}

/// Stock unit specs covering every type the default roster names.
#[must_use]
pub fn default_specs(roster: &UnitRoster) -> HashMap<UnitTypeId, UnitSpec> {
    let mut specs = HashMap::new();

    let mut facility_production = vec![
        roster.power_plant,
        roster.weapons_factory,
        roster.mineral_refinery,
        roster.oil_refinery,
        roster.comsat,
        roster.helipad,
        roster.tech_center,
    ];
    facility_production.push(roster.turret);

    specs.insert(
        roster.command_center,
        UnitSpec {
            sight: 6,
            production: facility_production,
            production_time: 60,
            cost_minerals: 3000,
            hit_points: 600,
            ..UnitSpec::default()
        },
    );
    specs.insert(
        roster.power_plant,
        UnitSpec {
            power_generated: 2000,
            cost_minerals: 400,
            hit_points: 200,
            ..UnitSpec::default()
        },
    );
    let mut mobile_production = vec![roster.mineral_harvester, roster.oil_harvester];
    mobile_production.extend(roster.battle_units.iter().copied());
    specs.insert(
        roster.weapons_factory,
        UnitSpec {
            power_consumed: 300,
            production: mobile_production,
            production_time: 30,
            cost_minerals: 1000,
            hit_points: 400,
            ..UnitSpec::default()
        },
    );
    specs.insert(
        roster.mineral_refinery,
        UnitSpec {
            power_consumed: 200,
            cost_minerals: 800,
            hit_points: 300,
            ..UnitSpec::default()
        },
    );
    specs.insert(
        roster.oil_refinery,
        UnitSpec {
            power_consumed: 200,
            cost_minerals: 800,
            hit_points: 300,
            ..UnitSpec::default()
        },
    );
    for ty in [roster.comsat, roster.helipad, roster.tech_center] {
        specs.insert(
            ty,
            UnitSpec {
                power_consumed: 100,
                cost_minerals: 1200,
                cost_oil: 200,
                hit_points: 250,
                ..UnitSpec::default()
            },
        );
    }
    for ty in [roster.turret, roster.samsite, roster.air_turret] {
        specs.insert(
            ty,
            UnitSpec {
                shoots: true,
                power_consumed: 50,
                cost_minerals: 500,
                hit_points: 250,
                damage: 8,
                range: 4,
                ..UnitSpec::default()
            },
        );
    }
    specs.insert(
        roster.mineral_harvester,
        UnitSpec {
            mobile: true,
            mines: Some(ResourceKind::Minerals),
            speed: 1,
            cost_minerals: 300,
            ..UnitSpec::default()
        },
    );
    specs.insert(
        roster.oil_harvester,
        UnitSpec {
            mobile: true,
            mines: Some(ResourceKind::Oil),
            speed: 1,
            cost_minerals: 300,
            ..UnitSpec::default()
        },
    );
    for (i, ty) in roster.battle_units.iter().enumerate() {
        specs.insert(
            *ty,
            UnitSpec {
                mobile: true,
                shoots: true,
                sight: 4,
                speed: 1,
                cost_minerals: 400 + 100 * i64::try_from(i).unwrap_or(0),
                cost_oil: 100,
                hit_points: 150,
                damage: 5,
                range: 3,
                ..UnitSpec::default()
            },
        );
    }
    specs
}

/// A production underway at a factory.
#[derive(Debug, Clone, Copy)]
struct ActiveProduction {
    ty: UnitTypeId,
    remaining: u32,
}

/// One live unit.
#[derive(Debug, Clone)]
struct SimUnit {
    owner: PlayerId,
    ty: UnitTypeId,
    pos: CellPos,
    hit_points: i32,
    work: WorkState,
    move_target: Option<CellPos>,
    producing: Option<ActiveProduction>,
    completed: Option<UnitTypeId>,
}

/// Per-player balances.
#[derive(Debug, Clone)]
struct SimPlayer {
    id: PlayerId,
    minerals: i64,
    oil: i64,
}

/// Command buffer handed to a controller as its [`CommandSink`].
#[derive(Debug, Default)]
pub struct CommandBuffer {
    /// Queued intents, in issue order.
    pub commands: Vec<UnitCommand>,
}

impl CommandSink for CommandBuffer {
    fn issue(&mut self, command: UnitCommand) {
        self.commands.push(command);
    }
}

/// The engine.
pub struct SimEngine {
    map: (i32, i32),
    specs: HashMap<UnitTypeId, UnitSpec>,
    units: BTreeMap<UnitId, SimUnit>,
    next_unit: u32,
    players: Vec<SimPlayer>,
    revealed: HashMap<PlayerId, HashSet<CellPos>>,
    resources: HashMap<CellPos, ResourceKind>,
    event_buffer: Vec<GameEvent>,
    tick: u64,
}

impl SimEngine {
    /// Empty engine with the given map size and unit specs.
    #[must_use]
    pub fn new(width: i32, height: i32, specs: HashMap<UnitTypeId, UnitSpec>) -> Self {
        Self {
            map: (width, height),
            specs,
            units: BTreeMap::new(),
            next_unit: 1,
            players: Vec::new(),
            revealed: HashMap::new(),
            resources: HashMap::new(),
            event_buffer: Vec::new(),
            tick: 0,
        }
    }

    /// Current engine tick.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Register a player with starting balances.
    pub fn add_player(&mut self, id: PlayerId, minerals: i64, oil: i64) {
        self.players.push(SimPlayer { id, minerals, oil });
        self.revealed.entry(id).or_default();
    }

    /// Put a resource field at a cell.
    pub fn add_resource(&mut self, kind: ResourceKind, cell: CellPos) {
        self.resources.insert(cell, kind);
    }

    /// Spawn a unit directly (scenario setup).
    pub fn spawn(&mut self, owner: PlayerId, ty: UnitTypeId, pos: CellPos) -> UnitId {
        let id = UnitId::new(self.next_unit);
        self.next_unit += 1;
        self.units.insert(
            id,
            SimUnit {
                owner,
                ty,
                pos,
                hit_points: self.spec(ty).map_or(100, |s| s.hit_points),
                work: WorkState::Idle,
                move_target: None,
                producing: None,
                completed: None,
            },
        );
        self.reveal_around(owner, pos, self.spec(ty).map_or(3, |s| s.sight));
        id
    }

    /// Number of living units owned by a player.
    #[must_use]
    pub fn unit_count(&self, player: PlayerId) -> usize {
        self.units.values().filter(|u| u.owner == player).count()
    }

    /// Cells a player has revealed so far.
    #[must_use]
    pub fn revealed_count(&self, player: PlayerId) -> usize {
        self.revealed.get(&player).map_or(0, HashSet::len)
    }

    fn spec(&self, ty: UnitTypeId) -> Option<&UnitSpec> {
        self.specs.get(&ty)
    }

    fn player_mut(&mut self, id: PlayerId) -> Option<&mut SimPlayer> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    fn reveal_around(&mut self, player: PlayerId, pos: CellPos, sight: u32) {
        let sight = i32::try_from(sight).unwrap_or(0);
        let revealed = self.revealed.entry(player).or_default();
        for x in (pos.x - sight)..=(pos.x + sight) {
            for y in (pos.y - sight)..=(pos.y + sight) {
                if x >= 0 && y >= 0 && x < self.map.0 && y < self.map.1 {
                    revealed.insert(CellPos::new(x, y));
                }
            }
        }
    }

    fn cell_occupied(&self, cell: CellPos) -> bool {
        self.units.values().any(|u| u.pos == cell)
    }

    fn free_cell_near(&self, origin: CellPos) -> Option<CellPos> {
        for radius in 0..8 {
            for x in (origin.x - radius)..=(origin.x + radius) {
                for y in (origin.y - radius)..=(origin.y + radius) {
                    let cell = CellPos::new(x, y);
                    if x >= 0
                        && y >= 0
                        && x < self.map.0
                        && y < self.map.1
                        && !self.cell_occupied(cell)
                        && !self.resources.contains_key(&cell)
                    {
                        return Some(cell);
                    }
                }
            }
        }
        None
    }

    /// Apply one queued command. Illegal or stale commands are dropped;
    /// the AI retries on a later cycle if it still wants the effect.
    fn apply_command(&mut self, command: UnitCommand) {
        match command {
            UnitCommand::Produce { factory, ty } => {
                let Some(cost) = self.spec(ty).map(|s| (s.cost_minerals, s.cost_oil)) else {
                    return;
                };
                let Some(unit) = self.units.get(&factory) else {
                    return;
                };
                if unit.producing.is_some() || unit.completed.is_some() {
                    return;
                }
                if !self.spec(unit.ty).is_some_and(|s| s.production.contains(&ty)) {
                    return;
                }
                let owner = unit.owner;
                let Some(player) = self.player_mut(owner) else {
                    return;
                };
                if player.minerals < cost.0 || player.oil < cost.1 {
                    tracing::debug!(%factory, %ty, "production unaffordable, dropped");
                    return;
                }
                player.minerals -= cost.0;
                player.oil -= cost.1;
                let time = self
                    .units
                    .get(&factory)
                    .and_then(|u| self.spec(u.ty))
                    .map_or(40, |s| s.production_time);
                if let Some(unit) = self.units.get_mut(&factory) {
                    unit.producing = Some(ActiveProduction {
                        ty,
                        remaining: time,
                    });
                    unit.work = WorkState::Producing;
                }
            }
            UnitCommand::PlaceProduction { factory, at } => {
                let Some((ty, owner)) = self
                    .units
                    .get(&factory)
                    .and_then(|u| u.completed.map(|ty| (ty, u.owner)))
                else {
                    return;
                };
                if !self.can_place_production_at(factory, ty, at) {
                    return;
                }
                if let Some(unit) = self.units.get_mut(&factory) {
                    unit.completed = None;
                    unit.work = WorkState::Idle;
                }
                let placed = self.spawn(owner, ty, at);
                self.queue_event(GameEvent::UnitPlaced {
                    unit: placed,
                    owner,
                    pos: at,
                    ty,
                });
            }
            UnitCommand::Move { unit, to } | UnitCommand::AttackMove { unit, to } => {
                let attacking = matches!(command, UnitCommand::AttackMove { .. });
                let mobile = self
                    .units
                    .get(&unit)
                    .and_then(|u| self.spec(u.ty))
                    .is_some_and(|s| s.mobile);
                if !mobile {
                    return;
                }
                if let Some(u) = self.units.get_mut(&unit) {
                    u.move_target = Some(to);
                    u.work = if attacking {
                        WorkState::Attacking
                    } else {
                        WorkState::Moving
                    };
                }
            }
            UnitCommand::Mine { unit, at } => {
                let can = self
                    .units
                    .get(&unit)
                    .and_then(|u| self.spec(u.ty))
                    .is_some_and(|s| s.mobile && s.mines.is_some());
                if !can {
                    return;
                }
                if let Some(u) = self.units.get_mut(&unit) {
                    u.move_target = Some(at);
                    u.work = WorkState::Mining;
                }
            }
            UnitCommand::Stop { unit } => {
                if let Some(u) = self.units.get_mut(&unit) {
                    u.move_target = None;
                    u.work = WorkState::Idle;
                }
            }
        }
    }

    fn queue_event(&mut self, event: GameEvent) {
        self.event_buffer.push(event);
    }

    /// Advance one tick: apply queued commands, then run production,
    /// movement, harvesting and combat. Returns the events of this tick.
    pub fn step(&mut self, commands: Vec<UnitCommand>) -> Vec<GameEvent> {
        self.tick += 1;
        self.event_buffer.clear();

        for command in commands {
            self.apply_command(command);
        }

        self.advance_production();
        self.advance_movement();
        self.advance_harvesting();
        self.advance_combat();

        std::mem::take(&mut self.event_buffer)
    }

    fn advance_production(&mut self) {
        let ids: Vec<UnitId> = self.units.keys().copied().collect();
        for id in ids {
            let Some((owner, pos, active)) = self.units.get(&id).and_then(|u| {
                u.producing.map(|p| (u.owner, u.pos, p))
            }) else {
                continue;
            };
            if active.remaining > 1 {
                if let Some(unit) = self.units.get_mut(&id) {
                    unit.producing = Some(ActiveProduction {
                        ty: active.ty,
                        remaining: active.remaining - 1,
                    });
                }
                continue;
            }

            // Finished this tick.
            if let Some(unit) = self.units.get_mut(&id) {
                unit.producing = None;
            }
            self.queue_event(GameEvent::UnitProduced {
                owner,
                pos,
                ty: active.ty,
                factory: id,
            });
            let mobile = self.spec(active.ty).is_some_and(|s| s.mobile);
            if mobile {
                // Mobiles walk out of the factory on their own.
                if let Some(cell) = self.free_cell_near(pos) {
                    let placed = self.spawn(owner, active.ty, cell);
                    self.queue_event(GameEvent::UnitPlaced {
                        unit: placed,
                        owner,
                        pos: cell,
                        ty: active.ty,
                    });
                }
                if let Some(unit) = self.units.get_mut(&id) {
                    unit.work = WorkState::Idle;
                }
            } else if let Some(unit) = self.units.get_mut(&id) {
                // Facilities wait for the AI's placement command.
                unit.completed = Some(active.ty);
                unit.work = WorkState::Producing;
            }
        }
    }

    fn advance_movement(&mut self) {
        let ids: Vec<UnitId> = self.units.keys().copied().collect();
        for id in ids {
            let Some((target, pos, ty, owner)) = self
                .units
                .get(&id)
                .and_then(|u| u.move_target.map(|t| (t, u.pos, u.ty, u.owner)))
            else {
                continue;
            };
            let (speed, sight) = self.spec(ty).map_or((0, 3), |s| (s.speed, s.sight));
            if speed == 0 {
                continue;
            }
            let mut next = pos;
            for _ in 0..speed {
                if next == target {
                    break;
                }
                next.x += (target.x - next.x).signum();
                next.y += (target.y - next.y).signum();
            }
            let arrived = next == target;
            if let Some(unit) = self.units.get_mut(&id) {
                unit.pos = next;
                if arrived {
                    unit.move_target = None;
                    if unit.work != WorkState::Mining {
                        unit.work = WorkState::Idle;
                    }
                }
            }
            self.reveal_around(owner, next, sight);
        }
    }

    fn advance_harvesting(&mut self) {
        /// Resource credited per tick of standing on the field.
        const GATHER_RATE: i64 = 10;

        let mut credits: Vec<(PlayerId, ResourceKind)> = Vec::new();
        for unit in self.units.values() {
            if unit.work != WorkState::Mining || unit.move_target.is_some() {
                continue;
            }
            if let Some(kind) = self.resources.get(&unit.pos) {
                credits.push((unit.owner, *kind));
            }
        }
        for (owner, kind) in credits {
            if let Some(player) = self.player_mut(owner) {
                match kind {
                    ResourceKind::Minerals => player.minerals += GATHER_RATE,
                    ResourceKind::Oil => player.oil += GATHER_RATE,
                }
            }
        }
    }

    fn advance_combat(&mut self) {
        let ids: Vec<UnitId> = self.units.keys().copied().collect();
        // BTreeMap keeps death events in id order, run after run.
        let mut damage: BTreeMap<UnitId, i32> = BTreeMap::new();

        for id in &ids {
            let Some(unit) = self.units.get(id) else {
                continue;
            };
            let Some(spec) = self.spec(unit.ty) else {
                continue;
            };
            if !spec.shoots || spec.damage == 0 {
                continue;
            }
            // Flat damage to the nearest hostile in range.
            let target = self
                .units
                .iter()
                .filter(|(other_id, other)| {
                    **other_id != *id && other.owner != unit.owner
                })
                .filter(|(_, other)| unit.pos.ring_distance(other.pos) <= spec.range)
                .min_by_key(|(other_id, other)| (unit.pos.ring_distance(other.pos), **other_id));
            if let Some((target_id, _)) = target {
                *damage.entry(*target_id).or_insert(0) += spec.damage;
            }
        }

        let mut destroyed = Vec::new();
        for (id, amount) in damage {
            if let Some(unit) = self.units.get_mut(&id) {
                unit.hit_points -= amount;
                if unit.hit_points <= 0 {
                    destroyed.push((id, unit.owner, unit.ty));
                }
            }
        }
        for (id, owner, ty) in destroyed {
            self.units.remove(&id);
            self.queue_event(GameEvent::UnitDestroyed { unit: id, owner, ty });
        }
    }
}

impl WorldView for SimEngine {
    fn players(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    fn is_enemy(&self, player: PlayerId, other: PlayerId) -> bool {
        // Free-for-all: everyone is hostile to everyone else.
        player != other
    }

    fn player_units(&self, player: PlayerId) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|(_, u)| u.owner == player)
            .map(|(id, _)| *id)
            .collect()
    }

    fn is_alive(&self, unit: UnitId) -> bool {
        self.units.contains_key(&unit)
    }

    fn unit_owner(&self, unit: UnitId) -> Option<PlayerId> {
        self.units.get(&unit).map(|u| u.owner)
    }

    fn unit_type(&self, unit: UnitId) -> Option<UnitTypeId> {
        self.units.get(&unit).map(|u| u.ty)
    }

    fn unit_position(&self, unit: UnitId) -> Option<CellPos> {
        self.units.get(&unit).map(|u| u.pos)
    }

    fn unit_work(&self, unit: UnitId) -> Option<WorkState> {
        self.units.get(&unit).map(|u| u.work)
    }

    fn is_type_mobile(&self, _player: PlayerId, ty: UnitTypeId) -> bool {
        self.spec(ty).is_some_and(|s| s.mobile)
    }

    fn is_mobile(&self, unit: UnitId) -> bool {
        self.units
            .get(&unit)
            .and_then(|u| self.spec(u.ty))
            .is_some_and(|s| s.mobile)
    }

    fn can_shoot(&self, unit: UnitId) -> bool {
        self.units
            .get(&unit)
            .and_then(|u| self.spec(u.ty))
            .is_some_and(|s| s.shoots)
    }

    fn can_mine(&self, unit: UnitId, kind: ResourceKind) -> bool {
        self.units
            .get(&unit)
            .and_then(|u| self.spec(u.ty))
            .is_some_and(|s| s.mines == Some(kind))
    }

    fn can_produce(&self, unit: UnitId) -> bool {
        self.units
            .get(&unit)
            .and_then(|u| self.spec(u.ty))
            .is_some_and(|s| !s.production.is_empty())
    }

    fn production_types(&self, unit: UnitId) -> Vec<UnitTypeId> {
        self.units
            .get(&unit)
            .and_then(|u| self.spec(u.ty))
            .map(|s| s.production.clone())
            .unwrap_or_default()
    }

    fn has_completed_production(&self, unit: UnitId) -> bool {
        self.units.get(&unit).is_some_and(|u| u.completed.is_some())
    }

    fn completed_production_type(&self, unit: UnitId) -> Option<UnitTypeId> {
        self.units.get(&unit).and_then(|u| u.completed)
    }

    fn units_of_type_count(&self, player: PlayerId, ty: UnitTypeId) -> u32 {
        let count = self
            .units
            .values()
            .filter(|u| u.owner == player && u.ty == ty)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn minerals(&self, player: PlayerId) -> i64 {
        self.players
            .iter()
            .find(|p| p.id == player)
            .map_or(0, |p| p.minerals)
    }

    fn oil(&self, player: PlayerId) -> i64 {
        self.players
            .iter()
            .find(|p| p.id == player)
            .map_or(0, |p| p.oil)
    }

    fn power_generated(&self, player: PlayerId) -> i64 {
        // "After constructions": productions underway count as standing.
        self.units
            .values()
            .filter(|u| u.owner == player)
            .map(|u| {
                let own = self.spec(u.ty).map_or(0, |s| s.power_generated);
                let pending = u
                    .producing
                    .and_then(|p| self.spec(p.ty))
                    .map_or(0, |s| s.power_generated);
                own + pending
            })
            .sum()
    }

    fn power_consumed(&self, player: PlayerId) -> i64 {
        self.units
            .values()
            .filter(|u| u.owner == player)
            .map(|u| {
                let own = self.spec(u.ty).map_or(0, |s| s.power_consumed);
                let pending = u
                    .producing
                    .and_then(|p| self.spec(p.ty))
                    .map_or(0, |s| s.power_consumed);
                own + pending
            })
            .sum()
    }

    fn sight_range(&self, unit: UnitId) -> u32 {
        self.units
            .get(&unit)
            .and_then(|u| self.spec(u.ty))
            .map_or(0, |s| s.sight)
    }

    fn is_fogged(&self, player: PlayerId, cell: CellPos) -> bool {
        self.revealed
            .get(&player)
            .map_or(true, |cells| !cells.contains(&cell))
    }

    fn can_place_production_at(&self, _factory: UnitId, _ty: UnitTypeId, cell: CellPos) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && cell.x < self.map.0
            && cell.y < self.map.1
            && !self.cell_occupied(cell)
            && !self.resources.contains_key(&cell)
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
        let mut cells: Vec<CellPos> = self
            .resources
            .iter()
            .filter(|(_, k)| **k == kind)
            .map(|(c, _)| *c)
            .collect();
        cells.sort_by_key(|c| (c.ring_distance(near), c.x, c.y));
        cells.truncate(max);
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P1: PlayerId = PlayerId::new(1);
    const P2: PlayerId = PlayerId::new(2);

    fn engine() -> SimEngine {
        let roster = UnitRoster::default();
        let mut engine = SimEngine::new(64, 64, default_specs(&roster));
        engine.add_player(P1, 10_000, 10_000);
        engine.add_player(P2, 10_000, 10_000);
        engine
    }

    #[test]
    fn test_move_command_steps_toward_target() {
        let roster = UnitRoster::default();
        let mut engine = engine();
        let tank = engine.spawn(P1, roster.battle_units[0], CellPos::new(10, 10));

        let command = UnitCommand::Move {
            unit: tank,
            to: CellPos::new(20, 10),
        };
        engine.step(vec![command]);
        assert_eq!(engine.unit_position(tank), Some(CellPos::new(11, 10)));
        assert_eq!(engine.unit_work(tank), Some(WorkState::Moving));
    }

    #[test]
    fn test_facility_production_waits_for_placement() {
        let roster = UnitRoster::default();
        let mut engine = engine();
        let yard = engine.spawn(P1, roster.command_center, CellPos::new(10, 10));

        let mut produced_event = None;
        engine.step(vec![UnitCommand::Produce {
            factory: yard,
            ty: roster.power_plant,
        }]);
        for _ in 0..120 {
            for event in engine.step(Vec::new()) {
                if matches!(event, GameEvent::UnitProduced { .. }) {
                    produced_event = Some(event);
                }
            }
        }
        let Some(GameEvent::UnitProduced { owner, ty, factory, .. }) = produced_event else {
            panic!("production never completed");
        };
        assert_eq!(owner, P1);
        assert_eq!(ty, roster.power_plant);
        assert_eq!(factory, yard);

        // The facility is not on the map yet; the factory waits.
        assert_eq!(engine.units_of_type_count(P1, roster.power_plant), 0);
        assert_eq!(engine.unit_work(yard), Some(WorkState::Producing));
        assert!(engine.has_completed_production(yard));

        // Placement spawns it and frees the factory.
        let events = engine.step(vec![UnitCommand::PlaceProduction {
            factory: yard,
            at: CellPos::new(12, 10),
        }]);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::UnitPlaced { .. })));
        assert_eq!(engine.units_of_type_count(P1, roster.power_plant), 1);
        assert_eq!(engine.unit_work(yard), Some(WorkState::Idle));
    }

    #[test]
    fn test_mobile_production_places_itself() {
        let roster = UnitRoster::default();
        let mut engine = engine();
        let factory = engine.spawn(P1, roster.weapons_factory, CellPos::new(10, 10));

        engine.step(vec![UnitCommand::Produce {
            factory,
            ty: roster.mineral_harvester,
        }]);
        let mut placed = false;
        for _ in 0..60 {
            for event in engine.step(Vec::new()) {
                if matches!(event, GameEvent::UnitPlaced { .. }) {
                    placed = true;
                }
            }
        }
        assert!(placed);
        assert_eq!(engine.units_of_type_count(P1, roster.mineral_harvester), 1);
        assert_eq!(engine.unit_work(factory), Some(WorkState::Idle));
    }

    #[test]
    fn test_unaffordable_production_is_dropped() {
        let roster = UnitRoster::default();
        let mut engine = SimEngine::new(64, 64, default_specs(&roster));
        engine.add_player(P1, 50, 0);
        let yard = engine.spawn(P1, roster.command_center, CellPos::new(10, 10));

        engine.step(vec![UnitCommand::Produce {
            factory: yard,
            ty: roster.power_plant,
        }]);
        assert_eq!(engine.unit_work(yard), Some(WorkState::Idle));
        assert_eq!(engine.minerals(P1), 50);
    }

    #[test]
    fn test_movement_reveals_fog() {
        let roster = UnitRoster::default();
        let mut engine = engine();
        let tank = engine.spawn(P1, roster.battle_units[0], CellPos::new(10, 10));
        assert!(engine.is_fogged(P1, CellPos::new(30, 10)));

        engine.step(vec![UnitCommand::Move {
            unit: tank,
            to: CellPos::new(30, 10),
        }]);
        for _ in 0..30 {
            engine.step(Vec::new());
        }
        assert!(!engine.is_fogged(P1, CellPos::new(30, 10)));
        assert_eq!(engine.unit_work(tank), Some(WorkState::Idle));
    }

    #[test]
    fn test_mining_credits_resources() {
        let roster = UnitRoster::default();
        let mut engine = engine();
        engine.add_resource(ResourceKind::Minerals, CellPos::new(12, 10));
        let harvester = engine.spawn(P1, roster.mineral_harvester, CellPos::new(10, 10));

        let before = engine.minerals(P1);
        engine.step(vec![UnitCommand::Mine {
            unit: harvester,
            at: CellPos::new(12, 10),
        }]);
        for _ in 0..20 {
            engine.step(Vec::new());
        }
        assert!(engine.minerals(P1) > before);
        assert_eq!(engine.unit_work(harvester), Some(WorkState::Mining));
    }

    #[test]
    fn test_combat_destroys_and_reports() {
        let roster = UnitRoster::default();
        let mut engine = engine();
        let attacker = engine.spawn(P1, roster.battle_units[0], CellPos::new(10, 10));
        let victim = engine.spawn(P2, roster.mineral_harvester, CellPos::new(11, 10));

        let mut destroyed = None;
        for _ in 0..60 {
            for event in engine.step(Vec::new()) {
                if let GameEvent::UnitDestroyed { unit, owner, .. } = event {
                    destroyed = Some((unit, owner));
                }
            }
            if destroyed.is_some() {
                break;
            }
        }
        assert_eq!(destroyed, Some((victim, P2)));
        assert!(!engine.is_alive(victim));
        assert!(engine.is_alive(attacker));
    }
}
