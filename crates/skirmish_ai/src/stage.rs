//! The decision-stage abstraction.
//!
//! Each stage is one strategy object with its own private state (rotation
//! cursors, the scout id, the attack target). The controller owns an
//! ordered list of stages and runs the ones whose clocks fire, always in
//! pipeline order.

use rand::rngs::StdRng;

use crate::commands::CommandSink;
use crate::config::{Doctrine, UnitRoster};
use crate::events::GameEvent;
use crate::types::{PlayerId, UnitId};
use crate::world::WorldView;

/// Controller-owned state visible to every stage.
///
/// The one cross-stage fact the pipeline needs: which unit is on scout
/// duty, written by the explore stage and honored by the attack stage so
/// the scout is never pulled into a fight.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blackboard {
    /// Unit currently assigned to exploration, if any.
    pub scout: Option<UnitId>,
}

/// Everything a stage may touch during one run.
///
/// The world reference is a snapshot valid for the duration of the pass;
/// commands pushed into the sink take effect on a later engine tick.
pub struct StageContext<'a> {
    /// The player this controller plays for.
    pub player: PlayerId,
    /// Read-only game state.
    pub world: &'a dyn WorldView,
    /// Command intent receiver.
    pub sink: &'a mut dyn CommandSink,
    /// Rule thresholds.
    pub doctrine: &'a Doctrine,
    /// Unit type mapping.
    pub roster: &'a UnitRoster,
    /// Controller-owned seeded randomness.
    pub rng: &'a mut StdRng,
    /// Cross-stage shared state.
    pub blackboard: &'a mut Blackboard,
}

/// What a stage did with its turn.
///
/// "Nothing to do" is an expected outcome, distinguishable from "issued
/// commands" so callers and tests never have to infer it from side
/// effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage issued this many commands.
    Acted(u32),
    /// Nothing to do this cycle.
    Idle,
}

impl StageOutcome {
    /// Commands issued by this run.
    #[must_use]
    pub const fn commands(self) -> u32 {
        match self {
            Self::Acted(n) => n,
            Self::Idle => 0,
        }
    }
}

/// One stage of the decision pipeline.
pub trait DecisionStage {
    /// Stable stage name for logs and reports.
    fn name(&self) -> &'static str;

    /// Run one pass. Must complete promptly: every internal loop is
    /// bounded, and a stage that cannot make progress returns
    /// [`StageOutcome::Idle`] rather than retrying within the pass.
    fn run(&mut self, ctx: &mut StageContext<'_>) -> StageOutcome;

    /// Engine notification delivered between passes. Default: ignored.
    fn on_event(&mut self, event: &GameEvent) {
        let _ = event;
    }
}
