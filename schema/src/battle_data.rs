use serde::{Deserialize, Serialize};
use std::fmt;
use strum::EnumIter;

/// Which side of the field a combatant fights for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub fn to_index(self) -> usize {
        match self {
            Side::Player => 0,
            Side::Enemy => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player => write!(f, "Player"),
            Side::Enemy => write!(f, "Enemy"),
        }
    }
}

/// Stable identifier of a field slot for the duration of a battle.
///
/// `Player`/`Enemy` are field index 0 of their side, `Player2`/`Enemy2` are
/// field index 1 and only exist in double battles.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum BattlerIndex {
    Player,
    Player2,
    Enemy,
    Enemy2,
}

impl BattlerIndex {
    pub fn new(side: Side, field_index: usize) -> Option<BattlerIndex> {
        match (side, field_index) {
            (Side::Player, 0) => Some(BattlerIndex::Player),
            (Side::Player, 1) => Some(BattlerIndex::Player2),
            (Side::Enemy, 0) => Some(BattlerIndex::Enemy),
            (Side::Enemy, 1) => Some(BattlerIndex::Enemy2),
            _ => None,
        }
    }

    pub fn side(self) -> Side {
        match self {
            BattlerIndex::Player | BattlerIndex::Player2 => Side::Player,
            BattlerIndex::Enemy | BattlerIndex::Enemy2 => Side::Enemy,
        }
    }

    pub fn field_index(self) -> usize {
        match self {
            BattlerIndex::Player | BattlerIndex::Enemy => 0,
            BattlerIndex::Player2 | BattlerIndex::Enemy2 => 1,
        }
    }

    /// Numeric order used as the last, deterministic tie-break.
    pub fn to_index(self) -> usize {
        self.side().to_index() * 2 + self.field_index()
    }

    pub fn is_opponent_of(self, other: BattlerIndex) -> bool {
        self.side() != other.side()
    }
}

impl fmt::Display for BattlerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattlerIndex::Player => write!(f, "Player #1"),
            BattlerIndex::Player2 => write!(f, "Player #2"),
            BattlerIndex::Enemy => write!(f, "Enemy #1"),
            BattlerIndex::Enemy2 => write!(f, "Enemy #2"),
        }
    }
}

/// Visual slot a combatant occupies on its side of the field.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldPosition {
    #[default]
    Center,
    Left,
    Right,
}

impl fmt::Display for FieldPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPosition::Center => write!(f, "center"),
            FieldPosition::Left => write!(f, "left"),
            FieldPosition::Right => write!(f, "right"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BattleFormat {
    #[default]
    Single,
    Double,
}

impl BattleFormat {
    /// Number of field slots per side.
    pub fn slots_per_side(self) -> usize {
        match self {
            BattleFormat::Single => 1,
            BattleFormat::Double => 2,
        }
    }

    pub fn is_double(self) -> bool {
        matches!(self, BattleFormat::Double)
    }
}

/// Outcome recorded in a combatant's move history.
///
/// `None` is only ever reported for placeholder entries, i.e. phases in which
/// the combatant did not get to execute a move at all.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveResult {
    Success,
    Fail,
    Blocked,
    None,
}

impl fmt::Display for MoveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveResult::Success => write!(f, "SUCCESS"),
            MoveResult::Fail => write!(f, "FAIL"),
            MoveResult::Blocked => write!(f, "BLOCKED"),
            MoveResult::None => write!(f, "NONE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusType {
    Sleep,
    Poison,
    Burn,
    Freeze,
    Paralysis,
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
