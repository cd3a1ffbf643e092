//! Per-combatant move history.
//!
//! Every move phase a combatant takes part in appends exactly one entry, even
//! when no move ran. Entries are never edited after the fact; the only
//! mutation besides `push` is trimming the oldest entry once the bound is hit.

use crate::config::DEFAULT_MOVE_HISTORY_LIMIT;
use schema::{BattlerIndex, Move, MoveResult, StatusType};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Why a phase ran without executing a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    Immobilized(StatusType),
    Recharging,
}

/// A move the combatant actually attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMove {
    #[serde(rename = "move")]
    pub move_: Move,
    pub targets: Vec<BattlerIndex>,
    pub result: MoveResult,
    /// Set for reactive copies (e.g. Dancer) that were never selected.
    #[serde(rename = "virtual", default)]
    pub virtual_: bool,
}

impl TurnMove {
    pub fn new(move_: Move, targets: Vec<BattlerIndex>, result: MoveResult) -> Self {
        Self {
            move_,
            targets,
            result,
            virtual_: false,
        }
    }

    pub fn reactive(move_: Move, targets: Vec<BattlerIndex>, result: MoveResult) -> Self {
        Self {
            virtual_: true,
            ..Self::new(move_, targets, result)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryEntry {
    Placeholder { reason: SkipReason },
    Move(TurnMove),
}

impl HistoryEntry {
    pub fn outcome(&self) -> MoveResult {
        match self {
            HistoryEntry::Placeholder { .. } => MoveResult::None,
            HistoryEntry::Move(turn_move) => turn_move.result,
        }
    }

    pub fn as_move(&self) -> Option<&TurnMove> {
        match self {
            HistoryEntry::Move(turn_move) => Some(turn_move),
            HistoryEntry::Placeholder { .. } => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, HistoryEntry::Placeholder { .. })
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryEntry::Placeholder { .. } => write!(f, "(none)"),
            HistoryEntry::Move(turn_move) => {
                write!(f, "{} {}", turn_move.move_, turn_move.result)?;
                if turn_move.virtual_ {
                    write!(f, " (copied)")?;
                }
                Ok(())
            }
        }
    }
}

/// Bounded, append-only, most-recent-last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveHistory {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl Default for MoveHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MOVE_HISTORY_LIMIT)
    }
}

impl MoveHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Positionally last entry. Placeholders count.
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Most recent entry that is an actual move, skipping placeholders.
    pub fn last_move(&self) -> Option<&TurnMove> {
        self.entries.iter().rev().find_map(HistoryEntry::as_move)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Change the bound, trimming the oldest entries if needed.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }
}
