//! Per-player AI controller.
//!
//! One `AiController` exists per computer-controlled player. The host
//! engine calls [`AiController::tick`] every simulation step and
//! [`AiController::notify`] for each game event; everything else is
//! internal. Controllers share no state with each other, so the host may
//! drive different players' controllers from different threads.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clock::DecisionClock;
use crate::combat::AttackStage;
use crate::commands::CommandSink;
use crate::config::AiConfig;
use crate::error::Result;
use crate::events::GameEvent;
use crate::explore::ExploreStage;
use crate::mining::MineStage;
use crate::placement::PlaceStage;
use crate::production::ProduceStage;
use crate::stage::{Blackboard, DecisionStage, StageContext, StageOutcome};
use crate::types::{PlayerId, UnitId};
use crate::world::WorldView;

/// One stage plus its own firing cadence.
struct StageSlot {
    stage: Box<dyn DecisionStage>,
    clock: DecisionClock,
}

/// What one controller tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Stages whose clocks fired this tick.
    pub stages_fired: u32,
    /// Commands issued across all fired stages.
    pub commands_issued: u32,
}

/// Decision engine for one computer-controlled player.
pub struct AiController {
    player: PlayerId,
    config: AiConfig,
    rng: StdRng,
    blackboard: Blackboard,
    slots: Vec<StageSlot>,
    disabled: bool,
    tick: u64,
}

impl AiController {
    /// Build a controller for `player`.
    ///
    /// A base delay that rounds to a non-positive tick count leaves the
    /// controller permanently disabled: it will accept ticks and events
    /// but never issue a command. That is a reported condition, not an
    /// error.
    pub fn new(player: PlayerId, config: AiConfig, seed: u64) -> Result<Self> {
        config.doctrine.validate()?;

        let base = DecisionClock::from_delay(config.cadence.base_delay_seconds);
        let mut slots = Vec::new();
        let mut disabled = false;

        match base {
            Some(base) => {
                let cadence = config.cadence;
                let stage_plan: Vec<(Box<dyn DecisionStage>, u32)> = vec![
                    (Box::new(ProduceStage::new(player)), cadence.produce),
                    (Box::new(PlaceStage::new(player)), cadence.place),
                    (Box::new(MineStage::new()), cadence.mine),
                    (Box::new(ExploreStage::new()), cadence.explore),
                    (Box::new(AttackStage::new()), cadence.attack),
                ];
                for (stage, multiple) in stage_plan {
                    let interval = base.interval().saturating_mul(multiple);
                    match DecisionClock::from_interval(interval) {
                        Some(clock) => slots.push(StageSlot { stage, clock }),
                        None => {
                            tracing::debug!(player = %player, stage = stage.name(),
                                "stage cadence is zero, stage disabled");
                        }
                    }
                }
            }
            None => {
                tracing::warn!(player = %player,
                    delay = config.cadence.base_delay_seconds,
                    "decision delay resolves to no ticks, AI disabled");
                disabled = true;
            }
        }

        Ok(Self {
            player,
            config,
            rng: StdRng::seed_from_u64(seed),
            blackboard: Blackboard::default(),
            slots,
            disabled,
            tick: 0,
        })
    }

    /// The player this controller plays for.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// Whether the controller was disabled by its configuration.
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Ticks seen so far.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Unit currently on scout duty, if any.
    #[must_use]
    pub const fn scout(&self) -> Option<UnitId> {
        self.blackboard.scout
    }

    /// Advance one simulation step.
    ///
    /// Runs every stage whose clock fires this tick, in pipeline order:
    /// produce, place, mine, explore, attack. Stages that find nothing to
    /// do contribute nothing; the report distinguishes "no stage fired"
    /// from "stages fired but stayed idle" through the two counters.
    pub fn tick(&mut self, world: &dyn WorldView, sink: &mut dyn CommandSink) -> TickReport {
        if self.disabled {
            return TickReport::default();
        }
        self.tick += 1;

        let mut report = TickReport::default();
        for slot in &mut self.slots {
            if !slot.clock.tick() {
                continue;
            }
            report.stages_fired += 1;

            let mut ctx = StageContext {
                player: self.player,
                world,
                sink,
                doctrine: &self.config.doctrine,
                roster: &self.config.roster,
                rng: &mut self.rng,
                blackboard: &mut self.blackboard,
            };
            let outcome = slot.stage.run(&mut ctx);
            if let StageOutcome::Acted(n) = outcome {
                tracing::debug!(player = %self.player, stage = slot.stage.name(),
                    commands = n, tick = self.tick, "stage acted");
            }
            report.commands_issued += outcome.commands();
        }
        report
    }

    /// Deliver a game event to every stage.
    pub fn notify(&mut self, event: &GameEvent) {
        for slot in &mut self.slots {
            slot.stage.on_event(event);
        }
    }
}
