//! Pokemon Turn Engine
//!
//! The turn core of a Pokemon-style battle system: a phase scheduler that
//! runs one phase at a time and suspends on presentation completions, move
//! history tracking, the "Instruct" replay rules, and field positioning for
//! single and double battles.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod config;
pub mod errors;
pub mod move_data;
pub mod player;
pub mod pokemon;
pub mod scenario;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{
    ActionCategory, BattleFormat, BattlerIndex, FieldPosition, Move, MoveCategory, MoveFlags,
    MoveResult, MoveTarget, RedirectPolicy, Side, StatusType,
};

// --- From this crate's modules (`src/`) ---

// Core battle engine and state.
pub use battle::engine::{ready_for_turn_resolution, BattleEngine, TurnResult};
pub use battle::history::{HistoryEntry, MoveHistory, TurnMove};
pub use battle::instruct::{MoveRepetitionResolver, ReplayOutcome};
pub use battle::presentation::{
    ChannelPresentation, CompletionToken, InstantPresentation, PendingCompletion, Presentation,
    TimedPresentation,
};
pub use battle::scheduler::SchedulerState;
pub use battle::state::{BattleEvent, BattleState, EventBus, GameState, TurnRng};

// Core runtime types for a battle.
pub use player::{BattlePlayer, PlayerAction};
pub use pokemon::{Ability, PokemonInst, StatusCondition};

// Primary data access.
pub use config::EngineConfig;
pub use move_data::{get_move_data, MoveCatalogue, MoveData};

// Crate-specific error and result types.
pub use errors::{
    ActionError, BattleEngineError, BattleResult, BattleStateError, ConfigError, MoveDataError,
    MoveDataResult, ReplayFailure,
};
