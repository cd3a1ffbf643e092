//! The units of work the scheduler runs.
//!
//! Every phase is a self-contained step. Phases that take part in a move
//! (`Move`, `MoveEffect`) write move history and PP only for their own actor;
//! see [`MutationScope`](crate::battle::commands::MutationScope).

mod field;
mod move_effect;
mod move_phase;
mod turn;

pub(crate) use field::switch_commands;

use crate::battle::scheduler::PhaseContext;
use crate::errors::BattleResult;
use schema::{BattlerIndex, Move, Side};

/// Why a move phase is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSource {
    /// Chosen by the player this turn.
    Selected,
    /// Second turn of a two-turn move; no choice was made.
    Forced,
    /// Repeated out of order at another combatant's instruction.
    Instructed { by: BattlerIndex },
    /// A reaction to another combatant's move. Recorded as virtual.
    Reactive { copied_from: BattlerIndex },
}

/// The start of a move: gates, target resolution and resource cost.
#[derive(Debug, Clone, PartialEq)]
pub struct MovePhase {
    pub battler: BattlerIndex,
    pub move_: Move,
    /// Requested targets. Empty means "let the move decide".
    pub targets: Vec<BattlerIndex>,
    pub source: MoveSource,
}

/// The part of a move that lands: protection, damage, effects, history.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveEffectPhase {
    pub battler: BattlerIndex,
    pub move_: Move,
    pub targets: Vec<BattlerIndex>,
    pub source: MoveSource,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BattlePhase {
    TurnStart,
    Move(MovePhase),
    MoveEffect(MoveEffectPhase),
    Faint {
        battler: BattlerIndex,
    },
    Switch {
        battler: BattlerIndex,
        team_index: usize,
    },
    Forfeit {
        side: Side,
    },
    ToggleDoublePosition {
        side: Side,
        wants_double: bool,
    },
    TurnEnd,
}

impl BattlePhase {
    pub fn name(&self) -> &'static str {
        match self {
            BattlePhase::TurnStart => "TurnStart",
            BattlePhase::Move(_) => "Move",
            BattlePhase::MoveEffect(_) => "MoveEffect",
            BattlePhase::Faint { .. } => "Faint",
            BattlePhase::Switch { .. } => "Switch",
            BattlePhase::Forfeit { .. } => "Forfeit",
            BattlePhase::ToggleDoublePosition { .. } => "ToggleDoublePosition",
            BattlePhase::TurnEnd => "TurnEnd",
        }
    }

    pub async fn run(self, ctx: &mut PhaseContext<'_>) -> BattleResult<()> {
        match self {
            BattlePhase::TurnStart => turn::start_turn(ctx),
            BattlePhase::Move(phase) => move_phase::begin_move(phase, ctx).await,
            BattlePhase::MoveEffect(phase) => move_effect::apply_move(phase, ctx).await,
            BattlePhase::Faint { battler } => field::faint(battler, ctx).await,
            BattlePhase::Switch {
                battler,
                team_index,
            } => field::switch(battler, team_index, ctx).await,
            BattlePhase::Forfeit { side } => field::forfeit(side, ctx),
            BattlePhase::ToggleDoublePosition { side, wants_double } => {
                crate::battle::position::toggle_double_position(side, wants_double, ctx).await
            }
            BattlePhase::TurnEnd => turn::end_turn(ctx),
        }
    }
}
