//! Error taxonomy for the turn engine.
//!
//! Fatal failures (`BattleEngineError`) surface to the host from
//! `BattleEngine::resolve_turn`. Everything an individual action can run
//! into is a [`ReplayFailure`] or an [`ActionFailureReason`] instead, which
//! the phases fold into move history and never propagate.
//!
//! [`ActionFailureReason`]: crate::battle::state::ActionFailureReason

use crate::battle::commands::ExecutionError;
use crate::battle::presentation::CompletionToken;
use schema::{BattlerIndex, Move, Side};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the turn engine.
#[derive(Debug, Error)]
pub enum BattleEngineError {
    /// An awaited completion never resolved. The turn cannot continue.
    #[error("scheduler stalled waiting on {token}")]
    SchedulerStall { token: CompletionToken },

    #[error(transparent)]
    MoveData(#[from] MoveDataError),

    #[error(transparent)]
    BattleState(#[from] BattleStateError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("command execution failed: {0}")]
    Execution(#[from] ExecutionError),
}

/// Errors related to move catalogue lookups and loading.
#[derive(Debug, Error)]
pub enum MoveDataError {
    #[error("move not found in catalogue: {0}")]
    MoveNotFound(Move),

    #[error("failed to read move catalogue {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed move catalogue: {0}")]
    Malformed(#[from] ron::error::SpannedError),
}

/// Errors related to battle state validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BattleStateError {
    #[error("no active Pokemon found on the {0} side")]
    NoActivePokemon(Side),

    #[error("no Pokemon occupies {0}")]
    EmptyBattler(BattlerIndex),

    #[error("invalid party index {index} for the {side} side")]
    InvalidPartyIndex { side: Side, index: usize },

    #[error("battle is not accepting actions in its current state")]
    NotAcceptingActions,

    #[error("inconsistent battle state: {0}")]
    InconsistentState(String),
}

/// Errors related to submitted player actions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("{0} already has an action queued this turn")]
    AlreadySubmitted(BattlerIndex),

    #[error("invalid move slot {0}")]
    InvalidMoveIndex(usize),

    #[error("{battler} cannot target {target} with that move")]
    InvalidTarget {
        battler: BattlerIndex,
        target: BattlerIndex,
    },

    #[error("invalid action: {0}")]
    InvalidAction(String),
}

/// Errors raised while loading engine configuration or scenario files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse RON")]
    Parse(#[from] ron::error::SpannedError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Why a replay (Instruct) could not re-execute the target's last move.
///
/// These never abort a turn; the resolver records them as FAIL outcomes.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayFailure {
    #[error("action ineligible for replay: {0}")]
    ActionIneligible(IneligibleReason),

    #[error("{move_} has no PP left to replay")]
    ResourceExhausted { move_: Move },

    #[error("no eligible target remains for {move_}")]
    NoEligibleTarget { move_: Move },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IneligibleReason {
    NoPriorAction,
    TwoTurnMove,
    ChargingInProgress,
    ReactiveOnly,
    ReplayMove,
    NotRepeatable,
    VirtualCopy,
    MoveNotKnown,
}

impl std::fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            IneligibleReason::NoPriorAction => "no prior action",
            IneligibleReason::TwoTurnMove => "two-turn move",
            IneligibleReason::ChargingInProgress => "charging in progress",
            IneligibleReason::ReactiveOnly => "reactive-only move",
            IneligibleReason::ReplayMove => "replay move",
            IneligibleReason::NotRepeatable => "move cannot be repeated",
            IneligibleReason::VirtualCopy => "last move was a reactive copy",
            IneligibleReason::MoveNotKnown => "move not known",
        };
        write!(f, "{}", text)
    }
}

/// Type alias for Results using BattleEngineError
pub type BattleResult<T> = Result<T, BattleEngineError>;

/// Type alias for Results using MoveDataError
pub type MoveDataResult<T> = Result<T, MoveDataError>;
