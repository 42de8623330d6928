//! Placement of finished facility productions.
//!
//! Mobile products are placed by the engine itself; facilities wait at
//! their factory until the AI finds a legal cell. The stage learns about
//! finished productions from [`GameEvent::UnitProduced`] and additionally
//! polls for factories stuck in the producing work state, which covers
//! events lost before this controller was attached.
//!
//! The search jitters around the factory with a growing radius. Each
//! failed probe widens the radius by one cell, so early probes stay tight
//! around the factory and later ones reach further out. A per-cycle
//! attempt budget abandons hopeless searches until the next poll; the
//! absolute ceiling exists so a map with no legal cell anywhere cannot
//! spin the search forever.

use std::collections::HashMap;

use rand::Rng;

use crate::commands::UnitCommand;
use crate::events::GameEvent;
use crate::stage::{DecisionStage, StageContext, StageOutcome};
use crate::types::{CellPos, PlayerId, UnitId, UnitTypeId, WorkState};

/// The place stage.
pub struct PlaceStage {
    player: PlayerId,
    /// Factories with a finished production awaiting placement.
    pending: HashMap<UnitId, UnitTypeId>,
}

impl PlaceStage {
    /// Stage for one player.
    #[must_use]
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            pending: HashMap::new(),
        }
    }

    /// Number of queued placements (test hook).
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Search for a legal cell near the factory and place there.
    ///
    /// Returns true when a placement command was issued; false means the
    /// budget ran out and the entry should be retried next cycle.
    fn place_at_factory(
        ctx: &mut StageContext<'_>,
        factory: UnitId,
        ty: UnitTypeId,
        origin: CellPos,
    ) -> bool {
        let attempts = ctx
            .doctrine
            .placement_attempt_budget
            .min(ctx.doctrine.placement_attempt_ceiling);

        for attempt in 0..attempts {
            let radius = i32::try_from(attempt).unwrap_or(i32::MAX);
            let (dx, dy) = if radius == 0 {
                (0, 0)
            } else {
                (
                    ctx.rng.gen_range(-radius..=radius),
                    ctx.rng.gen_range(-radius..=radius),
                )
            };
            // Off-map samples fall back to the factory's own coordinate.
            let x = if origin.x + dx < 0 { origin.x } else { origin.x + dx };
            let y = if origin.y + dy < 0 { origin.y } else { origin.y + dy };
            let cell = CellPos::new(x, y);

            if ctx.world.can_place_production_at(factory, ty, cell) {
                tracing::debug!(%factory, %ty, %cell, attempt, "placing production");
                ctx.sink.issue(UnitCommand::PlaceProduction { factory, at: cell });
                return true;
            }
        }

        tracing::debug!(%factory, %ty, attempts, "no legal placement cell, retrying next cycle");
        false
    }
}

impl DecisionStage for PlaceStage {
    fn name(&self) -> &'static str {
        "place"
    }

    fn run(&mut self, ctx: &mut StageContext<'_>) -> StageOutcome {
        // Fallback poll: factories sitting in the producing state with a
        // completed production also need placement, even if their event
        // was never seen.
        for factory in ctx.world.player_units(ctx.player) {
            if !ctx.world.can_produce(factory) {
                continue;
            }
            if ctx.world.unit_work(factory) != Some(WorkState::Producing) {
                continue;
            }
            if !ctx.world.has_completed_production(factory) {
                continue;
            }
            if let Some(ty) = ctx.world.completed_production_type(factory) {
                self.pending.entry(factory).or_insert(ty);
            }
        }

        let mut issued = 0u32;
        // Sorted ids keep rng consumption deterministic across runs.
        let mut entries: Vec<(UnitId, UnitTypeId)> =
            self.pending.iter().map(|(f, t)| (*f, *t)).collect();
        entries.sort_unstable_by_key(|(factory, _)| *factory);

        for (factory, ty) in entries {
            if !ctx.world.is_alive(factory) {
                self.pending.remove(&factory);
                continue;
            }
            // Mobiles place themselves; nothing for the AI to do.
            if ctx.world.is_type_mobile(ctx.player, ty) {
                self.pending.remove(&factory);
                continue;
            }
            let Some(origin) = ctx.world.unit_position(factory) else {
                // Not ready this cycle; keep the entry and retry.
                continue;
            };
            if Self::place_at_factory(ctx, factory, ty, origin) {
                self.pending.remove(&factory);
                issued += 1;
            }
        }

        if issued > 0 {
            StageOutcome::Acted(issued)
        } else {
            StageOutcome::Idle
        }
    }

    fn on_event(&mut self, event: &GameEvent) {
        match *event {
            // Placements belonging to other players are not ours to make.
            GameEvent::UnitProduced { owner, ty, factory, .. } if owner == self.player => {
                self.pending.insert(factory, ty);
            }
            GameEvent::UnitDestroyed { unit, owner, .. } if owner == self.player => {
                self.pending.remove(&unit);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::test_support::{RecordingSink, ScriptedUnit, ScriptedWorld};

    use super::*;
    use crate::config::{Doctrine, UnitRoster};
    use crate::world::WorldView;

    const P1: PlayerId = PlayerId::new(1);
    const P2: PlayerId = PlayerId::new(2);
    const FACTORY: UnitId = UnitId::new(10);
    const FACILITY: UnitTypeId = UnitTypeId::new(2);

    fn world_with_factory(x: i32, y: i32) -> ScriptedWorld {
        let mut world = ScriptedWorld::new(200, 200);
        world.add_unit(
            FACTORY,
            ScriptedUnit::new(P1, UnitTypeId::new(100))
                .at(x, y)
                .produces(&[FACILITY]),
        );
        world
    }

    fn run_stage(
        stage: &mut PlaceStage,
        world: &ScriptedWorld,
        sink: &mut RecordingSink,
        seed: u64,
    ) -> StageOutcome {
        let doctrine = Doctrine::default();
        let roster = UnitRoster::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut blackboard = crate::stage::Blackboard::default();
        let mut ctx = StageContext {
            player: P1,
            world,
            sink,
            doctrine: &doctrine,
            roster: &roster,
            rng: &mut rng,
            blackboard: &mut blackboard,
        };
        stage.run(&mut ctx)
    }

    fn produced_event(factory: UnitId, ty: UnitTypeId) -> GameEvent {
        GameEvent::UnitProduced {
            owner: P1,
            pos: CellPos::new(100, 100),
            ty,
            factory,
        }
    }

    #[test]
    fn test_places_beside_blocked_factory_cell() {
        // The factory's own cell is occupied; the jitter search widens
        // past radius zero and finds a nearby free cell.
        let mut world = world_with_factory(100, 100);
        world.block_cell(CellPos::new(100, 100));

        let mut stage = PlaceStage::new(P1);
        stage.on_event(&produced_event(FACTORY, FACILITY));

        let mut sink = RecordingSink::new();
        let outcome = run_stage(&mut stage, &world, &mut sink, 3);
        assert_eq!(outcome, StageOutcome::Acted(1));

        match sink.commands[0] {
            UnitCommand::PlaceProduction { factory, at } => {
                assert_eq!(factory, FACTORY);
                assert!(world.can_place_production_at(FACTORY, FACILITY, at));
                assert!(at.ring_distance(CellPos::new(100, 100)) <= 30);
            }
            ref other => panic!("expected PlaceProduction, got {other:?}"),
        }
        assert_eq!(stage.pending_count(), 0);
    }

    #[test]
    fn test_never_places_on_an_occupied_cell() {
        // Only one free cell in a blocked neighborhood: whatever the
        // seed, any issued placement must be legal.
        let mut world = world_with_factory(100, 100);
        for x in 95..=105 {
            for y in 95..=105 {
                if (x, y) != (101, 100) {
                    world.block_cell(CellPos::new(x, y));
                }
            }
        }
        for seed in 0..20 {
            let mut stage = PlaceStage::new(P1);
            stage.on_event(&produced_event(FACTORY, FACILITY));
            let mut sink = RecordingSink::new();
            run_stage(&mut stage, &world, &mut sink, seed);
            for command in &sink.commands {
                match *command {
                    UnitCommand::PlaceProduction { at, .. } => {
                        assert!(world.can_place_production_at(FACTORY, FACILITY, at));
                    }
                    ref other => panic!("expected PlaceProduction, got {other:?}"),
                }
            }
        }
    }

    #[test]
    fn test_fully_blocked_map_terminates_and_retries() {
        let mut world = ScriptedWorld::new(10, 10);
        world.add_unit(
            FACTORY,
            ScriptedUnit::new(P1, UnitTypeId::new(100))
                .at(5, 5)
                .produces(&[FACILITY]),
        );
        for x in 0..10 {
            for y in 0..10 {
                world.block_cell(CellPos::new(x, y));
            }
        }

        let mut stage = PlaceStage::new(P1);
        stage.on_event(&produced_event(FACTORY, FACILITY));

        let mut sink = RecordingSink::new();
        let outcome = run_stage(&mut stage, &world, &mut sink, 1);
        assert_eq!(outcome, StageOutcome::Idle);
        assert!(sink.is_empty());
        // The entry survives for the next cycle.
        assert_eq!(stage.pending_count(), 1);

        // Retry still terminates.
        let outcome = run_stage(&mut stage, &world, &mut sink, 2);
        assert_eq!(outcome, StageOutcome::Idle);
    }

    #[test]
    fn test_mobile_product_is_not_placed() {
        let mobile = UnitTypeId::new(10003);
        let mut world = world_with_factory(100, 100);
        world.set_mobile_type(mobile);

        let mut stage = PlaceStage::new(P1);
        stage.on_event(&produced_event(FACTORY, mobile));

        let mut sink = RecordingSink::new();
        let outcome = run_stage(&mut stage, &world, &mut sink, 1);
        assert_eq!(outcome, StageOutcome::Idle);
        assert!(sink.is_empty());
        assert_eq!(stage.pending_count(), 0);
    }

    #[test]
    fn test_other_players_productions_are_ignored() {
        let mut stage = PlaceStage::new(P1);
        stage.on_event(&GameEvent::UnitProduced {
            owner: P2,
            pos: CellPos::new(10, 10),
            ty: FACILITY,
            factory: UnitId::new(99),
        });
        assert_eq!(stage.pending_count(), 0);
    }

    #[test]
    fn test_poll_discovers_unreported_completion() {
        let mut world = world_with_factory(100, 100);
        world.unit_mut(FACTORY).work = WorkState::Producing;
        world.unit_mut(FACTORY).completed = Some(FACILITY);

        let mut stage = PlaceStage::new(P1);
        let mut sink = RecordingSink::new();
        let outcome = run_stage(&mut stage, &world, &mut sink, 1);
        assert_eq!(outcome, StageOutcome::Acted(1));
        match sink.commands[0] {
            UnitCommand::PlaceProduction { factory, .. } => assert_eq!(factory, FACTORY),
            ref other => panic!("expected PlaceProduction, got {other:?}"),
        }
    }

    #[test]
    fn test_dead_factory_entry_is_dropped() {
        let mut world = world_with_factory(100, 100);
        let mut stage = PlaceStage::new(P1);
        stage.on_event(&produced_event(FACTORY, FACILITY));
        world.kill(FACTORY);

        let mut sink = RecordingSink::new();
        let outcome = run_stage(&mut stage, &world, &mut sink, 1);
        assert_eq!(outcome, StageOutcome::Idle);
        assert_eq!(stage.pending_count(), 0);
    }
}
