use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

impl fmt::Display for MoveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveCategory::Physical => write!(f, "Physical"),
            MoveCategory::Special => write!(f, "Special"),
            MoveCategory::Status => write!(f, "Status"),
        }
    }
}

/// How the turn engine treats a move when scheduling and replaying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ActionCategory {
    #[default]
    Ordinary,
    /// Forces another combatant to repeat its last move (Instruct).
    Replay,
    /// Spans two turns: charge-then-hit or hit-then-recharge.
    TwoTurn,
    /// Only ever performed as a reaction to another combatant's move.
    ReactiveOnly,
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionCategory::Ordinary => write!(f, "ordinary"),
            ActionCategory::Replay => write!(f, "replay"),
            ActionCategory::TwoTurn => write!(f, "two-turn"),
            ActionCategory::ReactiveOnly => write!(f, "reactive-only"),
        }
    }
}

/// Which combatants a move is declared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveTarget {
    User,
    /// One adjacent combatant, ally or opponent.
    NearOther,
    AllNearEnemies,
}

impl MoveTarget {
    pub fn is_single_target(self) -> bool {
        matches!(self, MoveTarget::NearOther)
    }
}

/// What happens to a recorded target that is no longer able to battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RedirectPolicy {
    /// Retarget to the next eligible combatant on the same side, by slot order.
    #[default]
    NextInSlotOrder,
    /// Drop the target; the move fails if nothing is left.
    NoRedirect,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct MoveFlags: u8 {
        /// Blocked by Protect-class effects on the target.
        const PROTECTABLE = 1 << 0;
        /// Ignores the target's Substitute.
        const BYPASS_SUBSTITUTE = 1 << 1;
        /// Copied by combatants with the Dancer ability.
        const DANCE = 1 << 2;
        /// Can never be the subject of a replay.
        const NO_REPLAY = 1 << 3;
    }
}

impl Default for MoveFlags {
    fn default() -> Self {
        MoveFlags::PROTECTABLE
    }
}
