//! Attack target selection and attacker dispatch.
//!
//! The stage keeps one live target per player. Target search walks the
//! enemy players in order and settles on the first one that has any
//! living unit: within that player it prefers the command centre,
//! otherwise it takes the first living unit seen, and it does NOT go on
//! to check the remaining enemies for a command centre. That early
//! return is deliberate; a test pins it.
//!
//! Attackers are drawn from a round-robin cursor over the player's own
//! units so successive calls spread attack orders across the army, one
//! unit per firing. The unit on scout duty is never drafted.

use crate::commands::UnitCommand;
use crate::stage::{DecisionStage, StageContext, StageOutcome};
use crate::types::UnitId;

/// The attack stage.
#[derive(Debug, Default)]
pub struct AttackStage {
    target: Option<UnitId>,
    /// Round-robin position in the player's unit list; `None` after a
    /// wrap (scan restarts from the front next call).
    cursor: Option<usize>,
}

impl AttackStage {
    /// New attack stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current target (test hook).
    #[must_use]
    pub fn target(&self) -> Option<UnitId> {
        self.target
    }

    /// Find something to attack.
    ///
    /// Only the first enemy player with any living unit is consulted;
    /// see the module docs for why this is not a full scan.
    fn find_target(ctx: &StageContext<'_>) -> Option<UnitId> {
        for enemy in ctx.world.players() {
            if !ctx.world.is_enemy(ctx.player, enemy) {
                continue;
            }
            let units = ctx.world.player_units(enemy);
            if units.is_empty() {
                continue;
            }
            for unit in &units {
                if ctx.world.unit_type(*unit) == Some(ctx.roster.command_center) {
                    tracing::debug!(%enemy, target = %unit, "targeting enemy command centre");
                    return Some(*unit);
                }
            }
            let fallback = units.first().copied();
            tracing::debug!(%enemy, ?fallback, "no command centre, targeting first unit");
            return fallback;
        }
        None
    }
}

impl DecisionStage for AttackStage {
    fn name(&self) -> &'static str {
        "attack"
    }

    fn run(&mut self, ctx: &mut StageContext<'_>) -> StageOutcome {
        if self.target.map_or(true, |t| !ctx.world.is_alive(t)) {
            self.target = Self::find_target(ctx);
        }
        let Some(target) = self.target else {
            tracing::debug!("no attack target available");
            return StageOutcome::Idle;
        };
        let Some(target_pos) = ctx.world.unit_position(target) else {
            // Target not ready this cycle; keep it and retry.
            return StageOutcome::Idle;
        };

        let units = ctx.world.player_units(ctx.player);
        let start = self.cursor.map_or(0, |c| c + 1);

        for (idx, unit) in units.iter().enumerate().skip(start) {
            let unit = *unit;
            if !ctx.world.is_mobile(unit) || !ctx.world.can_shoot(unit) {
                continue;
            }
            if ctx.blackboard.scout == Some(unit) {
                continue;
            }
            tracing::debug!(attacker = %unit, %target, %target_pos, "dispatching attacker");
            ctx.sink.issue(UnitCommand::AttackMove {
                unit,
                to: target_pos,
            });
            self.cursor = Some(idx);
            return StageOutcome::Acted(1);
        }

        // Exhausted the list: reset and pick up from the front next call.
        self.cursor = None;
        StageOutcome::Idle
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

    const P1: PlayerId = PlayerId::new(1);
    const P2: PlayerId = PlayerId::new(2);
    const P3: PlayerId = PlayerId::new(3);

    fn tank(owner: PlayerId, x: i32) -> ScriptedUnit {
        ScriptedUnit::new(owner, UnitTypeId::new(10010)).at(x, 10).mobile().shooter()
    }

    fn run_stage(
        stage: &mut AttackStage,
        world: &ScriptedWorld,
        sink: &mut RecordingSink,
        blackboard: &mut Blackboard,
    ) -> StageOutcome {
        let doctrine = Doctrine::default();
        let roster = UnitRoster::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut ctx = StageContext {
            player: P1,
            world,
            sink,
            doctrine: &doctrine,
            roster: &roster,
            rng: &mut rng,
            blackboard,
        };
        stage.run(&mut ctx)
    }

    #[test]
    fn test_command_centre_preferred_regardless_of_id_order() {
        let roster = UnitRoster::default();
        let mut world = ScriptedWorld::new(200, 200);
        world.set_enemies(P1, P2);
        world.add_unit(UnitId::new(1), tank(P1, 10));
        // The ordinary unit has the lower id; the command centre must
        // still win.
        world.add_unit(UnitId::new(50), tank(P2, 100));
        world.add_unit(
            UnitId::new(51),
            ScriptedUnit::new(P2, roster.command_center).at(120, 10),
        );

        let mut stage = AttackStage::new();
        let mut sink = RecordingSink::new();
        let mut blackboard = Blackboard::default();
        run_stage(&mut stage, &world, &mut sink, &mut blackboard);
        assert_eq!(stage.target(), Some(UnitId::new(51)));
    }

    #[test]
    fn test_ordinary_unit_fallback_when_no_command_centre() {
        let mut world = ScriptedWorld::new(200, 200);
        world.set_enemies(P1, P2);
        world.add_unit(UnitId::new(1), tank(P1, 10));
        world.add_unit(UnitId::new(50), tank(P2, 100));

        let mut stage = AttackStage::new();
        let mut sink = RecordingSink::new();
        let mut blackboard = Blackboard::default();
        let outcome = run_stage(&mut stage, &world, &mut sink, &mut blackboard);
        assert_eq!(stage.target(), Some(UnitId::new(50)));
        assert_eq!(outcome, StageOutcome::Acted(1));
        assert_eq!(
            sink.commands,
            vec![UnitCommand::AttackMove {
                unit: UnitId::new(1),
                to: crate::types::CellPos::new(100, 10),
            }]
        );
    }

    #[test]
    fn test_first_enemy_with_units_wins_even_without_command_centre() {
        // The scan stops at the first enemy that has any living unit; a
        // later enemy's command centre is not considered.
        let roster = UnitRoster::default();
        let mut world = ScriptedWorld::new(200, 200);
        world.set_enemies(P1, P2);
        world.set_enemies(P1, P3);
        world.add_unit(UnitId::new(1), tank(P1, 10));
        world.add_unit(UnitId::new(50), tank(P2, 100));
        world.add_unit(
            UnitId::new(60),
            ScriptedUnit::new(P3, roster.command_center).at(150, 10),
        );

        let mut stage = AttackStage::new();
        let mut sink = RecordingSink::new();
        let mut blackboard = Blackboard::default();
        run_stage(&mut stage, &world, &mut sink, &mut blackboard);
        assert_eq!(stage.target(), Some(UnitId::new(50)));
    }

    #[test]
    fn test_dead_target_reacquired() {
        let mut world = ScriptedWorld::new(200, 200);
        world.set_enemies(P1, P2);
        world.add_unit(UnitId::new(1), tank(P1, 10));
        world.add_unit(UnitId::new(50), tank(P2, 100));
        world.add_unit(UnitId::new(51), tank(P2, 120));

        let mut stage = AttackStage::new();
        let mut sink = RecordingSink::new();
        let mut blackboard = Blackboard::default();
        run_stage(&mut stage, &world, &mut sink, &mut blackboard);
        assert_eq!(stage.target(), Some(UnitId::new(50)));

        world.kill(UnitId::new(50));
        sink.clear();
        run_stage(&mut stage, &world, &mut sink, &mut blackboard);
        assert_eq!(stage.target(), Some(UnitId::new(51)));
    }

    #[test]
    fn test_no_enemies_is_a_no_op() {
        let mut world = ScriptedWorld::new(200, 200);
        world.add_unit(UnitId::new(1), tank(P1, 10));

        let mut stage = AttackStage::new();
        let mut sink = RecordingSink::new();
        let mut blackboard = Blackboard::default();
        let outcome = run_stage(&mut stage, &world, &mut sink, &mut blackboard);
        assert_eq!(outcome, StageOutcome::Idle);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_round_robin_dispatches_one_attacker_per_call() {
        let mut world = ScriptedWorld::new(200, 200);
        world.set_enemies(P1, P2);
        world.add_unit(UnitId::new(1), tank(P1, 10));
        world.add_unit(UnitId::new(2), tank(P1, 12));
        world.add_unit(UnitId::new(50), tank(P2, 100));

        let mut stage = AttackStage::new();
        let mut blackboard = Blackboard::default();

        let mut sink = RecordingSink::new();
        assert_eq!(
            run_stage(&mut stage, &world, &mut sink, &mut blackboard),
            StageOutcome::Acted(1)
        );
        let mut sink2 = RecordingSink::new();
        assert_eq!(
            run_stage(&mut stage, &world, &mut sink2, &mut blackboard),
            StageOutcome::Acted(1)
        );

        let first = match sink.commands[0] {
            UnitCommand::AttackMove { unit, .. } => unit,
            ref other => panic!("expected AttackMove, got {other:?}"),
        };
        let second = match sink2.commands[0] {
            UnitCommand::AttackMove { unit, .. } => unit,
            ref other => panic!("expected AttackMove, got {other:?}"),
        };
        assert_eq!(first, UnitId::new(1));
        assert_eq!(second, UnitId::new(2));

        // Third call: nothing past the cursor; wraps exactly once and
        // dispatches nobody.
        let mut sink3 = RecordingSink::new();
        assert_eq!(
            run_stage(&mut stage, &world, &mut sink3, &mut blackboard),
            StageOutcome::Idle
        );
        assert!(sink3.is_empty());

        // Fourth call: back to the front of the list.
        let mut sink4 = RecordingSink::new();
        run_stage(&mut stage, &world, &mut sink4, &mut blackboard);
        match sink4.commands[0] {
            UnitCommand::AttackMove { unit, .. } => assert_eq!(unit, UnitId::new(1)),
            ref other => panic!("expected AttackMove, got {other:?}"),
        }
    }

    #[test]
    fn test_scout_is_never_drafted() {
        let mut world = ScriptedWorld::new(200, 200);
        world.set_enemies(P1, P2);
        world.add_unit(UnitId::new(1), tank(P1, 10));
        world.add_unit(UnitId::new(50), tank(P2, 100));

        let mut stage = AttackStage::new();
        let mut sink = RecordingSink::new();
        let mut blackboard = Blackboard {
            scout: Some(UnitId::new(1)),
        };
        let outcome = run_stage(&mut stage, &world, &mut sink, &mut blackboard);
        assert_eq!(outcome, StageOutcome::Idle);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_immobile_and_unarmed_units_skipped() {
        let mut world = ScriptedWorld::new(200, 200);
        world.set_enemies(P1, P2);
        // A building and an unarmed truck, then a real tank.
        world.add_unit(
            UnitId::new(1),
            ScriptedUnit::new(P1, UnitTypeId::new(3)).at(10, 10).shooter(),
        );
        world.add_unit(
            UnitId::new(2),
            ScriptedUnit::new(P1, UnitTypeId::new(10005)).at(12, 10).mobile(),
        );
        world.add_unit(UnitId::new(3), tank(P1, 14));
        world.add_unit(UnitId::new(50), tank(P2, 100));

        let mut stage = AttackStage::new();
        let mut sink = RecordingSink::new();
        let mut blackboard = Blackboard::default();
        run_stage(&mut stage, &world, &mut sink, &mut blackboard);
        match sink.commands[0] {
            UnitCommand::AttackMove { unit, .. } => assert_eq!(unit, UnitId::new(3)),
            ref other => panic!("expected AttackMove, got {other:?}"),
        }
    }
}
