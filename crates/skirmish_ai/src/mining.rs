//! Harvest dispatch.
//!
//! Idle harvesters are pointed at the nearest known resource cell of
//! their kind. The engine handles the actual gather/return loop; this
//! stage only restarts harvesters that have fallen idle.

use crate::commands::UnitCommand;
use crate::stage::{DecisionStage, StageContext, StageOutcome};
use crate::types::ResourceKind;

/// The mine stage.
#[derive(Debug, Default)]
pub struct MineStage;

impl MineStage {
    /// New mine stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DecisionStage for MineStage {
    fn name(&self) -> &'static str {
        "mine"
    }

    fn run(&mut self, ctx: &mut StageContext<'_>) -> StageOutcome {
        let mut issued = 0u32;

        for unit in ctx.world.player_units(ctx.player) {
            if !ctx.world.is_mobile(unit) {
                continue;
            }
            let kind = if ctx.world.can_mine(unit, ResourceKind::Minerals) {
                ResourceKind::Minerals
            } else if ctx.world.can_mine(unit, ResourceKind::Oil) {
                ResourceKind::Oil
            } else {
                continue;
            };
            if !ctx.world.unit_work(unit).is_some_and(|w| w.is_idle()) {
                continue;
            }
            let Some(pos) = ctx.world.unit_position(unit) else {
                continue;
            };

            let cells = ctx.world.nearest_resource_cells(ctx.player, kind, pos, 1);
            if let Some(cell) = cells.first().copied() {
                tracing::debug!(%unit, ?kind, %cell, "sending idle harvester to mine");
                ctx.sink.issue(UnitCommand::Mine { unit, at: cell });
                issued += 1;
            } else {
                tracing::debug!(%unit, ?kind, "no known resource cell for idle harvester");
            }
        }

        if issued > 0 {
            StageOutcome::Acted(issued)
        } else {
            StageOutcome::Idle
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
    use crate::stage::Blackboard;
    use crate::types::{CellPos, PlayerId, UnitId, UnitTypeId, WorkState};

    const P1: PlayerId = PlayerId::new(1);

    fn run_stage(world: &ScriptedWorld, sink: &mut RecordingSink) -> StageOutcome {
        let doctrine = Doctrine::default();
        let roster = UnitRoster::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut blackboard = Blackboard::default();
        let mut ctx = StageContext {
            player: P1,
            world,
            sink,
            doctrine: &doctrine,
            roster: &roster,
            rng: &mut rng,
            blackboard: &mut blackboard,
        };
        MineStage::new().run(&mut ctx)
    }

    #[test]
    fn test_idle_harvester_sent_to_nearest_cell() {
        let mut world = ScriptedWorld::new(100, 100);
        world.add_unit(
            UnitId::new(1),
            ScriptedUnit::new(P1, UnitTypeId::new(10003))
                .at(10, 10)
                .mobile()
                .miner(ResourceKind::Minerals),
        );
        world.add_resource_cell(ResourceKind::Minerals, CellPos::new(50, 50));
        world.add_resource_cell(ResourceKind::Minerals, CellPos::new(12, 10));

        let mut sink = RecordingSink::new();
        let outcome = run_stage(&world, &mut sink);
        assert_eq!(outcome, StageOutcome::Acted(1));
        assert_eq!(
            sink.commands,
            vec![UnitCommand::Mine {
                unit: UnitId::new(1),
                at: CellPos::new(12, 10),
            }]
        );
    }

    #[test]
    fn test_busy_harvester_left_alone() {
        let mut world = ScriptedWorld::new(100, 100);
        world.add_unit(
            UnitId::new(1),
            ScriptedUnit::new(P1, UnitTypeId::new(10002))
                .at(10, 10)
                .mobile()
                .miner(ResourceKind::Oil)
                .working(WorkState::Mining),
        );
        world.add_resource_cell(ResourceKind::Oil, CellPos::new(20, 20));

        let mut sink = RecordingSink::new();
        let outcome = run_stage(&world, &mut sink);
        assert_eq!(outcome, StageOutcome::Idle);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_harvester_kind_matches_resource() {
        // An oil harvester never gets sent to a mineral field.
        let mut world = ScriptedWorld::new(100, 100);
        world.add_unit(
            UnitId::new(1),
            ScriptedUnit::new(P1, UnitTypeId::new(10002))
                .at(10, 10)
                .mobile()
                .miner(ResourceKind::Oil),
        );
        world.add_resource_cell(ResourceKind::Minerals, CellPos::new(20, 20));

        let mut sink = RecordingSink::new();
        let outcome = run_stage(&world, &mut sink);
        assert_eq!(outcome, StageOutcome::Idle);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_non_miner_ignored() {
        let mut world = ScriptedWorld::new(100, 100);
        world.add_unit(
            UnitId::new(1),
            ScriptedUnit::new(P1, UnitTypeId::new(10010)).at(10, 10).mobile().shooter(),
        );
        world.add_resource_cell(ResourceKind::Minerals, CellPos::new(20, 20));

        let mut sink = RecordingSink::new();
        assert_eq!(run_stage(&world, &mut sink), StageOutcome::Idle);
    }
}
