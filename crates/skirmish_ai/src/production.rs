//! Production planning.
//!
//! For every idle production-capable unit the stage walks two prioritized
//! rule ladders, one for facility types and one for mobile types. Rules
//! are evaluated top to bottom and the first rule that can actually start
//! a production wins; each ladder issues at most one command per unit per
//! pass.
//!
//! The ladders deliberately prefer minerals over oil when both branches of
//! a rule are open: mineral income is the bottleneck early on.

use std::collections::HashMap;

use rand::seq::SliceRandom;

use crate::commands::UnitCommand;
use crate::events::GameEvent;
use crate::stage::{DecisionStage, StageContext, StageOutcome};
use crate::types::{PlayerId, UnitId, UnitTypeId};

/// The produce stage.
///
/// Holds the per-factory rotation cursors used by the optional filler
/// rule. Cursor entries are pruned when the factory's destruction event
/// arrives, so the map stays bounded over a long game.
pub struct ProduceStage {
    player: PlayerId,
    cursors: HashMap<UnitId, usize>,
}

impl ProduceStage {
    /// Stage for one player.
    #[must_use]
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            cursors: HashMap::new(),
        }
    }

    /// Number of live rotation cursors (test hook).
    #[must_use]
    pub fn cursor_count(&self) -> usize {
        self.cursors.len()
    }

    /// Issue a production of `ty` at `factory` if the factory's list
    /// offers it.
    fn try_produce(
        ctx: &mut StageContext<'_>,
        factory: UnitId,
        prod: &[UnitTypeId],
        ty: UnitTypeId,
    ) -> bool {
        if prod.contains(&ty) {
            tracing::debug!(%factory, %ty, "producing");
            ctx.sink.issue(UnitCommand::Produce { factory, ty });
            true
        } else {
            false
        }
    }

    /// Produce toward a defense quota. Quota zero disables the rule.
    fn try_defense_quota(
        ctx: &mut StageContext<'_>,
        factory: UnitId,
        prod: &[UnitTypeId],
        quota: u32,
    ) -> bool {
        if quota == 0 {
            return false;
        }
        let roster = ctx.roster;
        let defenses = [roster.turret, roster.samsite, roster.air_turret];
        let have: u32 = defenses
            .iter()
            .map(|ty| ctx.world.units_of_type_count(ctx.player, *ty))
            .sum();
        if have >= quota {
            return false;
        }
        for ty in defenses {
            if Self::try_produce(ctx, factory, prod, ty) {
                return true;
            }
        }
        tracing::debug!(%factory, "defense rule: quota unmet but factory offers no defense type");
        false
    }

    /// The facility rule ladder. Returns true when a command was issued.
    fn produce_facilities(
        ctx: &mut StageContext<'_>,
        factory: UnitId,
        prod: &[UnitTypeId],
    ) -> bool {
        let player = ctx.player;
        let roster = ctx.roster.clone();
        let doctrine = ctx.doctrine;

        // Rule 1: always generate a fixed margin more power than we
        // consume, counting constructions already underway.
        let generated = ctx.world.power_generated(player);
        let consumed = ctx.world.power_consumed(player);
        if generated < consumed + doctrine.power_reserve_margin {
            tracing::debug!(%factory, generated, consumed, "facility rule 1: power margin unmet");
            if Self::try_produce(ctx, factory, prod, roster.power_plant) {
                return true;
            }
        }

        // Rule 2: one refinery per resource kind, minerals first (they
        // are needed sooner than oil).
        let mineral_refineries = ctx.world.units_of_type_count(player, roster.mineral_refinery);
        let oil_refineries = ctx.world.units_of_type_count(player, roster.oil_refinery);
        if mineral_refineries < 1
            && Self::try_produce(ctx, factory, prod, roster.mineral_refinery)
        {
            return true;
        }
        if oil_refineries < 1 && Self::try_produce(ctx, factory, prod, roster.oil_refinery) {
            return true;
        }

        // Rule 3: one weapons factory.
        if ctx.world.units_of_type_count(player, roster.weapons_factory) < 1
            && Self::try_produce(ctx, factory, prod, roster.weapons_factory)
        {
            return true;
        }

        // Rule 4: when a resource is short and we have no harvester for
        // it, stop building facilities so the harvester can be afforded.
        let minerals = ctx.world.minerals(player);
        let oil = ctx.world.oil(player);
        let mineral_harvesters = ctx.world.units_of_type_count(player, roster.mineral_harvester);
        let oil_harvesters = ctx.world.units_of_type_count(player, roster.oil_harvester);
        if (minerals < doctrine.facility_low_resource_gate && mineral_harvesters == 0)
            || (oil < doctrine.facility_low_resource_gate && oil_harvesters == 0)
        {
            tracing::debug!(%factory, "facility rule 4: deferring to harvester construction");
            return false;
        }

        // Rule 5: minimum defense quota.
        if Self::try_defense_quota(ctx, factory, prod, doctrine.defense_minimum) {
            return true;
        }

        // The expensive facilities below also wait until the economy can
        // recover from them.
        if (minerals < doctrine.facility_high_resource_gate && mineral_harvesters == 0)
            || (oil < doctrine.facility_high_resource_gate && oil_harvesters == 0)
        {
            tracing::debug!(%factory, "facility rule 6: deferring to harvester construction");
            return false;
        }

        // Rule 6: one of each secondary facility.
        for ty in [roster.comsat, roster.helipad, roster.tech_center] {
            if ctx.world.units_of_type_count(player, ty) < 1
                && Self::try_produce(ctx, factory, prod, ty)
            {
                return true;
            }
        }

        // Rule 7: proportional power reserve on top of the fixed margin.
        if generated * 100 < consumed * doctrine.power_headroom_percent {
            tracing::debug!(%factory, generated, consumed, "facility rule 7: power headroom unmet");
            if Self::try_produce(ctx, factory, prod, roster.power_plant) {
                return true;
            }
        }

        // Rule 8: maximum defense quota.
        if Self::try_defense_quota(ctx, factory, prod, doctrine.defense_maximum) {
            return true;
        }

        tracing::debug!(%factory, "facility ladder: no rule left, nothing to produce");
        false
    }

    /// The mobile rule ladder. Returns true when a command was issued.
    fn produce_mobiles(ctx: &mut StageContext<'_>, factory: UnitId, prod: &[UnitTypeId]) -> bool {
        let player = ctx.player;
        let roster = ctx.roster.clone();
        let doctrine = ctx.doctrine;

        let minerals = ctx.world.minerals(player);
        let oil = ctx.world.oil(player);
        let mineral_harvesters = ctx.world.units_of_type_count(player, roster.mineral_harvester);
        let oil_harvesters = ctx.world.units_of_type_count(player, roster.oil_harvester);

        // Rule 1: a first harvester of each kind, minerals preferred. If
        // the factory cannot build the missing harvester, stop producing
        // mobiles entirely: a tank built now may eat the money the
        // harvester needs once a refinery stands. Maps with abundant
        // starting stock are exempt, otherwise a resourceless map would
        // never see any mobile production.
        if mineral_harvesters < 1 || oil_harvesters < 1 {
            if mineral_harvesters < 1
                && Self::try_produce(ctx, factory, prod, roster.mineral_harvester)
            {
                return true;
            }
            if oil_harvesters < 1 && Self::try_produce(ctx, factory, prod, roster.oil_harvester) {
                return true;
            }
            if minerals < doctrine.harvester_abort_exemption
                || oil < doctrine.harvester_abort_exemption
            {
                tracing::debug!(%factory, "mobile rule 1: aborting pass, harvesters come first");
                return false;
            }
        }

        // Rule 2: a second harvester of a kind while its stock is low.
        let need_mineral = mineral_harvesters < 2 && minerals < doctrine.low_stock_threshold;
        let need_oil = oil_harvesters < 2 && oil < doctrine.low_stock_threshold;
        if need_mineral && Self::try_produce(ctx, factory, prod, roster.mineral_harvester) {
            return true;
        }
        if need_oil && Self::try_produce(ctx, factory, prod, roster.oil_harvester) {
            return true;
        }

        // Rule 3: a minimum standing army, type picked at random so the
        // composition is not predictable.
        let battle_count: u32 = roster
            .battle_units
            .iter()
            .map(|ty| ctx.world.units_of_type_count(player, *ty))
            .sum();
        if battle_count < doctrine.battle_unit_minimum {
            let mut candidates = roster.battle_units.clone();
            candidates.shuffle(ctx.rng);
            for ty in candidates {
                if Self::try_produce(ctx, factory, prod, ty) {
                    return true;
                }
            }
            tracing::debug!(%factory, "mobile rule 3: no battle type available here");
        }

        // Rule 4: once a refinery of a kind exists, keep a few harvesters
        // on it.
        let mineral_refineries = ctx.world.units_of_type_count(player, roster.mineral_refinery);
        let oil_refineries = ctx.world.units_of_type_count(player, roster.oil_refinery);
        let need_mineral =
            mineral_refineries > 0 && mineral_harvesters < doctrine.harvesters_with_refinery;
        let need_oil = oil_refineries > 0 && oil_harvesters < doctrine.harvesters_with_refinery;
        if need_mineral && Self::try_produce(ctx, factory, prod, roster.mineral_harvester) {
            return true;
        }
        if need_oil && Self::try_produce(ctx, factory, prod, roster.oil_harvester) {
            return true;
        }

        // Rule 5: scale harvesters with the refinery count, kind order
        // shuffled.
        let need_mineral =
            mineral_harvesters < doctrine.harvesters_per_refinery * mineral_refineries;
        let need_oil = oil_harvesters < doctrine.harvesters_per_refinery * oil_refineries;
        if need_mineral || need_oil {
            let mut kinds = Vec::new();
            if need_oil {
                kinds.push(roster.oil_harvester);
            }
            if need_mineral {
                kinds.push(roster.mineral_harvester);
            }
            kinds.shuffle(ctx.rng);
            for ty in kinds {
                if Self::try_produce(ctx, factory, prod, ty) {
                    return true;
                }
            }
        }

        // Rule 6: build something to fight with - any mobile type except
        // the harvesters, shuffled.
        let mut allowed: Vec<UnitTypeId> = prod
            .iter()
            .copied()
            .filter(|ty| ctx.world.is_type_mobile(player, *ty) && !roster.is_harvester(*ty))
            .collect();
        allowed.shuffle(ctx.rng);
        if let Some(ty) = allowed.first().copied() {
            tracing::debug!(%factory, %ty, "mobile rule 6: filler combat production");
            ctx.sink.issue(UnitCommand::Produce { factory, ty });
            return true;
        }

        tracing::debug!(%factory, "mobile ladder: no rule left, nothing to produce");
        false
    }

    /// Last-resort rotation through the factory's full production list.
    ///
    /// Keeps one cursor per factory so consecutive passes try different
    /// candidates; a wrap resets the cursor to the start of the list.
    fn produce_filler(
        &mut self,
        ctx: &mut StageContext<'_>,
        factory: UnitId,
        prod: &[UnitTypeId],
    ) -> bool {
        if prod.is_empty() {
            return false;
        }
        let cursor = self.cursors.entry(factory).or_insert(0);
        // Rotations survive list changes: out-of-range restarts the list.
        if *cursor >= prod.len() {
            *cursor = 0;
        }
        let ty = prod[*cursor];
        *cursor = (*cursor + 1) % prod.len();
        tracing::debug!(%factory, %ty, "filler rotation production");
        ctx.sink.issue(UnitCommand::Produce { factory, ty });
        true
    }
}

impl DecisionStage for ProduceStage {
    fn name(&self) -> &'static str {
        "produce"
    }

    fn run(&mut self, ctx: &mut StageContext<'_>) -> StageOutcome {
        let mut issued = 0u32;

        for factory in ctx.world.player_units(ctx.player) {
            if !ctx.world.can_produce(factory) {
                continue;
            }
            let idle = ctx.world.unit_work(factory).is_some_and(|w| w.is_idle());
            if !idle {
                continue;
            }
            let prod = ctx.world.production_types(factory);
            if prod.is_empty() {
                continue;
            }

            let can_facilities = prod.iter().any(|ty| !ctx.world.is_type_mobile(ctx.player, *ty));
            let can_mobiles = prod.iter().any(|ty| ctx.world.is_type_mobile(ctx.player, *ty));

            let mut acted = false;
            if can_facilities && Self::produce_facilities(ctx, factory, &prod) {
                issued += 1;
                acted = true;
            }
            if can_mobiles && Self::produce_mobiles(ctx, factory, &prod) {
                issued += 1;
                acted = true;
            }
            if !acted && ctx.doctrine.filler_production && self.produce_filler(ctx, factory, &prod)
            {
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
        if let GameEvent::UnitDestroyed { unit, owner, .. } = event {
            if *owner == self.player {
                self.cursors.remove(unit);
            }
        }
    }
}
