//! Cadence, doctrine thresholds and the unit roster.
//!
//! Every number the rule ladders compare against lives here as a named
//! field with the stock value as its default, so a difficulty preset or a
//! faction data file can override any of them from RON without touching
//! code.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AiError, Result};
use crate::types::UnitTypeId;

/// Decision cadence configuration.
///
/// The base delay is difficulty-derived (easier difficulties use a larger
/// delay). Each stage fires at a whole multiple of the base interval; with
/// the stock values, production and placement run twice as often as
/// exploration and combat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CadenceConfig {
    /// Base decision delay in seconds. A non-positive value disables the
    /// controller entirely.
    pub base_delay_seconds: f32,
    /// Produce stage interval, in multiples of the base interval.
    pub produce: u32,
    /// Place stage interval, in multiples of the base interval.
    pub place: u32,
    /// Mine stage interval, in multiples of the base interval.
    pub mine: u32,
    /// Explore stage interval, in multiples of the base interval.
    pub explore: u32,
    /// Attack stage interval, in multiples of the base interval.
    pub attack: u32,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            base_delay_seconds: 1.0,
            produce: 1,
            place: 1,
            mine: 1,
            explore: 2,
            attack: 2,
        }
    }
}

impl CadenceConfig {
    /// Cadence for a given difficulty delay, keeping the stock stage
    /// multiples.
    #[must_use]
    pub fn with_delay(base_delay_seconds: f32) -> Self {
        Self {
            base_delay_seconds,
            ..Self::default()
        }
    }
}

/// Numeric thresholds and quotas for the production, placement and
/// exploration rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctrine {
    /// Rule: keep generated power at least this far above consumption.
    pub power_reserve_margin: i64,
    /// Rule: keep generated power above consumption times this percentage.
    pub power_headroom_percent: i64,
    /// Below this stock, facility production defers to harvester
    /// construction when no harvester of the kind exists.
    pub facility_low_resource_gate: i64,
    /// Below this stock, the expensive secondary facilities are deferred
    /// when no harvester of the kind exists.
    pub facility_high_resource_gate: i64,
    /// Mobile production is aborted after a failed first-harvester rule
    /// unless both stocks exceed this exemption.
    pub harvester_abort_exemption: i64,
    /// A second harvester of a kind is kept while its stock is below this.
    pub low_stock_threshold: i64,
    /// Minimum number of battle units to keep fielded.
    pub battle_unit_minimum: u32,
    /// Harvesters of a kind to keep once its refinery exists.
    pub harvesters_with_refinery: u32,
    /// Harvesters of a kind to keep per refinery of that kind.
    pub harvesters_per_refinery: u32,
    /// Defense quota for the early defense rule. Zero disables the rule.
    pub defense_minimum: u32,
    /// Defense quota for the late defense rule. Zero disables the rule.
    pub defense_maximum: u32,
    /// Placement attempts per cycle before abandoning until the next poll.
    pub placement_attempt_budget: u32,
    /// Absolute ceiling on placement attempts; reached only on maps with
    /// no legal cell anywhere near the factory.
    pub placement_attempt_ceiling: u32,
    /// Scouts with a sight range below this do not explore.
    pub explore_min_sight: u32,
    /// Ring search extends to this many steps of twice the sight range.
    pub explore_max_rings: u32,
    /// Radius of the naive exploration strategy.
    pub explore_naive_radius: i32,
    /// Exploration destination strategy.
    pub explore_strategy: ExploreStrategy,
    /// Rotate through a factory's production list when no ladder rule
    /// fires. Off by default; the rotation cursors are kept either way.
    pub filler_production: bool,
}

/// How exploration picks a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExploreStrategy {
    /// Expanding ring scan for provably fogged cells.
    #[default]
    FoggedRings,
    /// Random cell near the scout, ignoring visibility.
    Naive,
}

impl Default for Doctrine {
    fn default() -> Self {
        Self {
            power_reserve_margin: 1000,
            power_headroom_percent: 125,
            facility_low_resource_gate: 1500,
            facility_high_resource_gate: 3000,
            harvester_abort_exemption: 10_000,
            low_stock_threshold: 1500,
            battle_unit_minimum: 3,
            harvesters_with_refinery: 3,
            harvesters_per_refinery: 2,
            defense_minimum: 0,
            defense_maximum: 0,
            placement_attempt_budget: 30,
            placement_attempt_ceiling: 300,
            explore_min_sight: 2,
            explore_max_rings: 5,
            explore_naive_radius: 50,
            explore_strategy: ExploreStrategy::FoggedRings,
            filler_production: false,
        }
    }
}

impl Doctrine {
    /// Check value ranges that the stages rely on.
    pub fn validate(&self) -> Result<()> {
        if self.power_headroom_percent < 100 {
            return Err(AiError::InvalidDoctrine {
                field: "power_headroom_percent",
                message: format!("must be >= 100, got {}", self.power_headroom_percent),
            });
        }
        if self.placement_attempt_ceiling < self.placement_attempt_budget {
            return Err(AiError::InvalidDoctrine {
                field: "placement_attempt_ceiling",
                message: format!(
                    "must be >= placement_attempt_budget ({}), got {}",
                    self.placement_attempt_budget, self.placement_attempt_ceiling
                ),
            });
        }
        if self.explore_max_rings == 0 {
            return Err(AiError::InvalidDoctrine {
                field: "explore_max_rings",
                message: "must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// The unit type ids the rules name.
///
/// The defaults follow the stock data set; total-conversion data files
/// remap them through RON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRoster {
    /// Power plant facility.
    pub power_plant: UnitTypeId,
    /// Weapons factory facility.
    pub weapons_factory: UnitTypeId,
    /// Mineral refinery facility.
    pub mineral_refinery: UnitTypeId,
    /// Oil refinery facility.
    pub oil_refinery: UnitTypeId,
    /// Mineral harvester mobile.
    pub mineral_harvester: UnitTypeId,
    /// Oil harvester mobile.
    pub oil_harvester: UnitTypeId,
    /// Ground turret defense.
    pub turret: UnitTypeId,
    /// Surface-to-air site defense.
    pub samsite: UnitTypeId,
    /// Anti-air turret defense.
    pub air_turret: UnitTypeId,
    /// Comsat station.
    pub comsat: UnitTypeId,
    /// Helipad.
    pub helipad: UnitTypeId,
    /// Tech centre.
    pub tech_center: UnitTypeId,
    /// Battle unit types the minimum-army rule draws from.
    pub battle_units: Vec<UnitTypeId>,
    /// The high-value command centre targeted first in combat.
    pub command_center: UnitTypeId,
}

impl Default for UnitRoster {
    fn default() -> Self {
        Self {
            power_plant: UnitTypeId::new(2),
            weapons_factory: UnitTypeId::new(3),
            mineral_refinery: UnitTypeId::new(13),
            oil_refinery: UnitTypeId::new(8),
            mineral_harvester: UnitTypeId::new(10003),
            oil_harvester: UnitTypeId::new(10002),
            turret: UnitTypeId::new(10),
            samsite: UnitTypeId::new(6),
            air_turret: UnitTypeId::new(18),
            comsat: UnitTypeId::new(14),
            helipad: UnitTypeId::new(1),
            tech_center: UnitTypeId::new(12),
            battle_units: vec![
                UnitTypeId::new(10010),
                UnitTypeId::new(10008),
                UnitTypeId::new(10018),
            ],
            command_center: UnitTypeId::new(5),
        }
    }
}

impl UnitRoster {
    /// Whether `ty` is one of the two harvester types.
    #[must_use]
    pub fn is_harvester(&self, ty: UnitTypeId) -> bool {
        ty == self.mineral_harvester || ty == self.oil_harvester
    }

    /// Harvester type for a resource kind.
    #[must_use]
    pub fn harvester_for(&self, kind: crate::types::ResourceKind) -> UnitTypeId {
        match kind {
            crate::types::ResourceKind::Minerals => self.mineral_harvester,
            crate::types::ResourceKind::Oil => self.oil_harvester,
        }
    }

    /// Refinery type for a resource kind.
    #[must_use]
    pub fn refinery_for(&self, kind: crate::types::ResourceKind) -> UnitTypeId {
        match kind {
            crate::types::ResourceKind::Minerals => self.mineral_refinery,
            crate::types::ResourceKind::Oil => self.oil_refinery,
        }
    }
}

/// Full configuration for one AI controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AiConfig {
    /// Decision cadence.
    pub cadence: CadenceConfig,
    /// Rule thresholds.
    pub doctrine: Doctrine,
    /// Unit type mapping.
    pub roster: UnitRoster,
}

impl AiConfig {
    /// Config for a difficulty-derived base delay, stock everything else.
    #[must_use]
    pub fn with_delay(base_delay_seconds: f32) -> Self {
        Self {
            cadence: CadenceConfig::with_delay(base_delay_seconds),
            ..Self::default()
        }
    }

    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| AiError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded presets).
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron)?;
        config.doctrine.validate()?;
        Ok(config)
    }
}
