//! Fog-of-war exploration.
//!
//! One unit per player is kept on scout duty. When the scout dies (or was
//! never picked) the stage re-acquires one before anything else; a cycle
//! with no scout available is a quiet no-op.
//!
//! Destinations come from an expanding ring search for provably fogged
//! cells: the scan steps outward in increments of twice the scout's sight
//! range and samples a sparse grid rather than every cell, so a single
//! pass stays cheap even on large maps. The first ring that contains any
//! fogged candidate wins; one of its candidates is picked at random.

use rand::seq::SliceRandom;

use crate::commands::UnitCommand;
use crate::config::ExploreStrategy;
use crate::stage::{DecisionStage, StageContext, StageOutcome};
use crate::types::{CellPos, ResourceKind, UnitId};

/// The explore stage.
#[derive(Debug, Default)]
pub struct ExploreStage;

impl ExploreStage {
    /// New explore stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Pick a unit for scout duty: mobile, not a harvester, on the map.
    fn find_explorer(ctx: &StageContext<'_>) -> Option<UnitId> {
        for unit in ctx.world.player_units(ctx.player) {
            if !ctx.world.is_mobile(unit) {
                continue;
            }
            if ctx.world.can_mine(unit, ResourceKind::Minerals)
                || ctx.world.can_mine(unit, ResourceKind::Oil)
            {
                continue;
            }
            if ctx.world.unit_position(unit).is_some() {
                return Some(unit);
            }
        }
        None
    }

    /// Expanding sparse ring scan for fogged cells around the scout.
    fn fogged_destination(ctx: &mut StageContext<'_>, scout: UnitId) -> Option<CellPos> {
        let sight = ctx.world.sight_range(scout);
        if sight < ctx.doctrine.explore_min_sight {
            tracing::debug!(%scout, sight, "sight too short, not exploring");
            return None;
        }
        let pos = ctx.world.unit_position(scout)?;
        let (width, height) = ctx.world.map_size();
        let step = i32::try_from(sight).ok()? * 2;
        if step <= 0 {
            return None;
        }

        for ring in 1..=ctx.doctrine.explore_max_rings {
            let reach = step * i32::try_from(ring).ok()?;
            let mut candidates = Vec::new();

            let mut x = pos.x - reach;
            while x <= pos.x + reach {
                let mut y = pos.y - reach;
                while y <= pos.y + reach {
                    let cell = CellPos::new(x, y);
                    if x >= 0
                        && y >= 0
                        && x < width
                        && y < height
                        && ctx.world.is_fogged(ctx.player, cell)
                    {
                        candidates.push(cell);
                    }
                    y += step;
                }
                x += step;
            }

            if !candidates.is_empty() {
                candidates.shuffle(ctx.rng);
                return candidates.first().copied();
            }
        }

        tracing::debug!(%scout, "no fogged cell within search reach");
        None
    }

    /// Random destination near the scout, ignoring visibility.
    fn naive_destination(ctx: &mut StageContext<'_>, scout: UnitId) -> Option<CellPos> {
        use rand::Rng;

        let pos = ctx.world.unit_position(scout)?;
        let (width, height) = ctx.world.map_size();
        let radius = ctx.doctrine.explore_naive_radius;
        let dx = ctx.rng.gen_range(-radius..=radius);
        let dy = ctx.rng.gen_range(-radius..=radius);
        Some(CellPos::new(pos.x + dx, pos.y + dy).clamped(width, height))
    }
}

impl DecisionStage for ExploreStage {
    fn name(&self) -> &'static str {
        "explore"
    }

    fn run(&mut self, ctx: &mut StageContext<'_>) -> StageOutcome {
        // Drop a dead scout before anything can reference it.
        if let Some(scout) = ctx.blackboard.scout {
            if !ctx.world.is_alive(scout) {
                tracing::debug!(%scout, "scout died, unassigning");
                ctx.blackboard.scout = None;
            }
        }

        if ctx.blackboard.scout.is_none() {
            ctx.blackboard.scout = Self::find_explorer(ctx);
        }
        let Some(scout) = ctx.blackboard.scout else {
            tracing::debug!("no unit available for scout duty");
            return StageOutcome::Idle;
        };

        let destination = match ctx.doctrine.explore_strategy {
            ExploreStrategy::FoggedRings => Self::fogged_destination(ctx, scout),
            ExploreStrategy::Naive => Self::naive_destination(ctx, scout),
        };
        let Some(to) = destination else {
            return StageOutcome::Idle;
        };

        tracing::debug!(%scout, %to, "exploring");
        ctx.sink.issue(UnitCommand::Move { unit: scout, to });
        StageOutcome::Acted(1)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::test_support::{RecordingSink, ScriptedUnit, ScriptedWorld};

    use super::*;
    use crate::config::{Doctrine, UnitRoster};
    use crate::stage::Blackboard;
    use crate::types::{PlayerId, UnitTypeId};
    use crate::world::WorldView;

    const P1: PlayerId = PlayerId::new(1);
    const SCOUT: UnitId = UnitId::new(1);

    fn scout_unit() -> ScriptedUnit {
        ScriptedUnit::new(P1, UnitTypeId::new(10010)).at(50, 50).mobile().shooter().sight(4)
    }

    fn run_stage(
        world: &ScriptedWorld,
        sink: &mut RecordingSink,
        blackboard: &mut Blackboard,
        doctrine: &Doctrine,
    ) -> StageOutcome {
        let roster = UnitRoster::default();
        let mut rng = StdRng::seed_from_u64(9);
        let mut ctx = StageContext {
            player: P1,
            world,
            sink,
            doctrine,
            roster: &roster,
            rng: &mut rng,
            blackboard,
        };
        ExploreStage::new().run(&mut ctx)
    }

    #[test]
    fn test_acquires_scout_and_moves_to_fogged_cell() {
        let mut world = ScriptedWorld::new(200, 200);
        world.add_unit(SCOUT, scout_unit());
        world.set_fog_default(P1, true);

        let mut sink = RecordingSink::new();
        let mut blackboard = Blackboard::default();
        let outcome = run_stage(&world, &mut sink, &mut blackboard, &Doctrine::default());

        assert_eq!(outcome, StageOutcome::Acted(1));
        assert_eq!(blackboard.scout, Some(SCOUT));
        match sink.commands[0] {
            UnitCommand::Move { unit, to } => {
                assert_eq!(unit, SCOUT);
                assert!(world.is_fogged(P1, to));
                // First ring: step 8, so at most 8 cells out.
                assert!(to.ring_distance(CellPos::new(50, 50)) <= 8);
            }
            ref other => panic!("expected Move, got {other:?}"),
        }
    }

    #[test]
    fn test_harvester_never_chosen_as_scout() {
        let mut world = ScriptedWorld::new(200, 200);
        world.add_unit(
            SCOUT,
            ScriptedUnit::new(P1, UnitTypeId::new(10003))
                .at(50, 50)
                .mobile()
                .miner(ResourceKind::Minerals),
        );
        world.set_fog_default(P1, true);

        let mut sink = RecordingSink::new();
        let mut blackboard = Blackboard::default();
        let outcome = run_stage(&world, &mut sink, &mut blackboard, &Doctrine::default());

        assert_eq!(outcome, StageOutcome::Idle);
        assert_eq!(blackboard.scout, None);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_dead_scout_reacquired_before_moving() {
        let mut world = ScriptedWorld::new(200, 200);
        world.add_unit(SCOUT, scout_unit());
        world.add_unit(UnitId::new(2), scout_unit());
        world.set_fog_default(P1, true);

        let mut blackboard = Blackboard::default();
        let mut sink = RecordingSink::new();
        run_stage(&world, &mut sink, &mut blackboard, &Doctrine::default());
        assert_eq!(blackboard.scout, Some(SCOUT));

        world.kill(SCOUT);
        sink.clear();
        let outcome = run_stage(&world, &mut sink, &mut blackboard, &Doctrine::default());
        assert_eq!(outcome, StageOutcome::Acted(1));
        assert_eq!(blackboard.scout, Some(UnitId::new(2)));
        match sink.commands[0] {
            UnitCommand::Move { unit, .. } => assert_eq!(unit, UnitId::new(2)),
            ref other => panic!("expected Move, got {other:?}"),
        }
    }

    #[test]
    fn test_short_sight_does_not_explore() {
        let mut world = ScriptedWorld::new(200, 200);
        world.add_unit(SCOUT, scout_unit().sight(1));
        world.set_fog_default(P1, true);

        let mut sink = RecordingSink::new();
        let mut blackboard = Blackboard::default();
        let outcome = run_stage(&world, &mut sink, &mut blackboard, &Doctrine::default());
        assert_eq!(outcome, StageOutcome::Idle);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_fully_revealed_map_is_a_no_op() {
        let mut world = ScriptedWorld::new(200, 200);
        world.add_unit(SCOUT, scout_unit());
        // Fog default is false: everything already revealed.

        let mut sink = RecordingSink::new();
        let mut blackboard = Blackboard::default();
        let outcome = run_stage(&world, &mut sink, &mut blackboard, &Doctrine::default());
        assert_eq!(outcome, StageOutcome::Idle);
        assert!(sink.is_empty());
        // The scout assignment itself sticks for the next cycle.
        assert_eq!(blackboard.scout, Some(SCOUT));
    }

    #[test]
    fn test_first_ring_with_fog_wins() {
        // Fog only beyond the first ring: the chosen cell must belong to
        // the nearest ring that has any, not a farther one.
        let mut world = ScriptedWorld::new(200, 200);
        world.add_unit(SCOUT, scout_unit());
        // step = 8; ring 2 reaches 16 cells out.
        world.set_fog(P1, CellPos::new(50 + 16, 50), true);
        world.set_fog(P1, CellPos::new(50, 50 + 24), true);

        let mut sink = RecordingSink::new();
        let mut blackboard = Blackboard::default();
        let outcome = run_stage(&world, &mut sink, &mut blackboard, &Doctrine::default());
        assert_eq!(outcome, StageOutcome::Acted(1));
        match sink.commands[0] {
            UnitCommand::Move { to, .. } => assert_eq!(to, CellPos::new(66, 50)),
            ref other => panic!("expected Move, got {other:?}"),
        }
    }

    #[test]
    fn test_naive_strategy_moves_without_fog() {
        let mut world = ScriptedWorld::new(200, 200);
        world.add_unit(SCOUT, scout_unit());
        let doctrine = Doctrine {
            explore_strategy: crate::config::ExploreStrategy::Naive,
            ..Doctrine::default()
        };

        let mut sink = RecordingSink::new();
        let mut blackboard = Blackboard::default();
        let outcome = run_stage(&world, &mut sink, &mut blackboard, &doctrine);
        assert_eq!(outcome, StageOutcome::Acted(1));
        match sink.commands[0] {
            UnitCommand::Move { to, .. } => {
                assert!(to.ring_distance(CellPos::new(50, 50)) <= doctrine.explore_naive_radius);
                assert!(to.x >= 0 && to.y >= 0 && to.x < 200 && to.y < 200);
            }
            ref other => panic!("expected Move, got {other:?}"),
        }
    }
}
