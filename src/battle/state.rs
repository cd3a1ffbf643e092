use crate::battle::action_queue::ActionQueue;
use crate::battle::conditions::PokemonCondition;
use crate::errors::{BattleStateError, ReplayFailure};
use crate::player::BattlePlayer;
use crate::pokemon::{PokemonInst, StatusCondition};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use schema::{BattleFormat, BattlerIndex, FieldPosition, Move, Side};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::{trace, warn};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Copy)]
pub enum GameState {
    WaitingForActions,
    TurnInProgress,
    WaitingForPlayer1Replacement, // Player 1 needs to send out a new Pokemon after faint
    WaitingForPlayer2Replacement, // Player 2 needs to send out a new Pokemon after faint
    WaitingForBothReplacements,   // Both players need to send out new Pokemon after faints
    Player1Win,
    Player2Win,
    Draw,
}

impl GameState {
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            GameState::Player1Win | GameState::Player2Win | GameState::Draw
        )
    }

    pub fn winner(self) -> Option<Side> {
        match self {
            GameState::Player1Win => Some(Side::Player),
            GameState::Player2Win => Some(Side::Enemy),
            _ => None,
        }
    }

    pub fn win_for(side: Side) -> GameState {
        match side {
            Side::Player => GameState::Player1Win,
            Side::Enemy => GameState::Player2Win,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Turn Management
    TurnStarted {
        turn_number: u32,
    },
    TurnEnded,

    // Pokemon Actions
    PokemonSwitched {
        battler: BattlerIndex,
        old_pokemon: String,
        new_pokemon: String,
    },
    MoveUsed {
        battler: BattlerIndex,
        pokemon: String,
        move_used: Move,
    },
    MoveCopied {
        battler: BattlerIndex,
        pokemon: String,
        move_used: Move,
        copied_from: BattlerIndex,
    },
    MoveInstructed {
        instructor: BattlerIndex,
        target: BattlerIndex,
        move_used: Move,
    },
    MoveCharging {
        battler: BattlerIndex,
        pokemon: String,
        move_used: Move,
    },
    TargetRedirected {
        battler: BattlerIndex,
        from: BattlerIndex,
        to: BattlerIndex,
    },
    MoveBlocked {
        attacker: BattlerIndex,
        defender: BattlerIndex,
        move_used: Move,
    },
    SubstituteDamaged {
        target: BattlerIndex,
        damage: u16,
        broken: bool,
    },
    DamageDealt {
        target: BattlerIndex,
        pokemon: String,
        damage: u16,
        remaining_hp: u16,
    },
    PokemonFainted {
        battler: BattlerIndex,
        pokemon: String,
    },

    // Status and conditions
    PokemonStatusRemoved {
        target: BattlerIndex,
        pokemon: String,
        status: StatusCondition,
    },
    ConditionApplied {
        target: BattlerIndex,
        pokemon: String,
        condition: PokemonCondition,
    },
    ConditionExpired {
        target: BattlerIndex,
        pokemon: String,
        condition: PokemonCondition,
    },

    // Action Failures
    ActionFailed {
        battler: BattlerIndex,
        pokemon: String,
        reason: ActionFailureReason,
    },

    // Field layout
    FieldPositionChanged {
        side: Side,
        pokemon: String,
        position: FieldPosition,
    },
    PartyReordered {
        side: Side,
        leader: String,
    },

    // Battle End
    PlayerDefeated {
        side: Side,
    },
    BattleEnded {
        winner: Option<Side>,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable string using battle context.
    /// Returns None for silent events that should not produce user-visible text.
    pub fn format(&self, battle_state: &BattleState) -> Option<String> {
        match self {
            BattleEvent::TurnStarted { turn_number } => {
                Some(format!("=== Turn {} ===", turn_number))
            }
            BattleEvent::TurnEnded => None,

            BattleEvent::PokemonSwitched {
                battler,
                old_pokemon,
                new_pokemon,
            } => {
                let player_name = &battle_state.player(battler.side()).player_name;
                Some(format!(
                    "{} recalled {} and sent out {}!",
                    player_name, old_pokemon, new_pokemon
                ))
            }

            BattleEvent::MoveUsed {
                battler,
                pokemon,
                move_used,
            } => {
                let player_name = &battle_state.player(battler.side()).player_name;
                Some(format!("{}'s {} used {}!", player_name, pokemon, move_used))
            }
            BattleEvent::MoveCopied {
                pokemon, move_used, ..
            } => Some(format!("{} joined in with {}!", pokemon, move_used)),
            BattleEvent::MoveInstructed { .. } => None, // The follow-up MoveUsed says enough
            BattleEvent::MoveCharging { pokemon, .. } => {
                Some(format!("{} is absorbing light!", pokemon))
            }
            BattleEvent::TargetRedirected { .. } => None,
            BattleEvent::MoveBlocked { defender, .. } => {
                let name = battle_state
                    .pokemon(*defender)
                    .map(|p| p.name.as_str())
                    .unwrap_or("The target");
                Some(format!("{} protected itself!", name))
            }
            BattleEvent::SubstituteDamaged { broken, .. } => {
                if *broken {
                    Some("The substitute broke!".to_string())
                } else {
                    Some("The substitute took damage for it!".to_string())
                }
            }

            BattleEvent::DamageDealt {
                pokemon, damage, ..
            } => Some(format!("{} took {} damage!", pokemon, damage)),
            BattleEvent::PokemonFainted { pokemon, .. } => {
                Some(format!("{} fainted!", pokemon))
            }

            BattleEvent::PokemonStatusRemoved {
                pokemon, status, ..
            } => match status {
                StatusCondition::Sleep(_) => Some(format!("{} woke up!", pokemon)),
                StatusCondition::Freeze => Some(format!("{} thawed out!", pokemon)),
                _ => Some(format!("{} was cured of its {}!", pokemon, status)),
            },
            BattleEvent::ConditionApplied {
                pokemon, condition, ..
            } => Some(format!("{} was affected by {}!", pokemon, condition)),
            BattleEvent::ConditionExpired {
                pokemon, condition, ..
            } => Some(format!("{}'s {} wore off.", pokemon, condition)),

            BattleEvent::ActionFailed {
                pokemon, reason, ..
            } => Some(format!("{} {}", pokemon, reason.describe())),

            BattleEvent::FieldPositionChanged {
                pokemon, position, ..
            } => Some(format!("{} moved to the {}.", pokemon, position)),
            BattleEvent::PartyReordered { .. } => None,

            BattleEvent::PlayerDefeated { side } => {
                let player_name = &battle_state.player(*side).player_name;
                Some(format!("{} is out of usable Pokémon!", player_name))
            }
            BattleEvent::BattleEnded { winner } => match winner {
                Some(side) => Some(format!(
                    "{} has won the battle!",
                    battle_state.player(*side).player_name
                )),
                None => Some("The battle ended in a draw!".to_string()),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ActionFailureReason {
    IsAsleep,
    IsFrozen,
    IsParalyzed,
    MustRecharge,
    MoveDisabled,
    NoPPRemaining,
    NoTargets, // Every candidate target is gone
    ReplayFailed(ReplayFailure),
    MoveFailedToExecute,
}

impl ActionFailureReason {
    fn describe(&self) -> String {
        match self {
            ActionFailureReason::IsAsleep => "is fast asleep.".to_string(),
            ActionFailureReason::IsFrozen => "is frozen solid!".to_string(),
            ActionFailureReason::IsParalyzed => "is fully paralyzed!".to_string(),
            ActionFailureReason::MustRecharge => "must recharge!".to_string(),
            ActionFailureReason::MoveDisabled => "can't use a disabled move!".to_string(),
            ActionFailureReason::NoPPRemaining => "has no PP left for that move!".to_string(),
            ActionFailureReason::NoTargets => "has no target. But it failed!".to_string(),
            ActionFailureReason::ReplayFailed(failure) => format!("failed to comply ({}).", failure),
            ActionFailureReason::MoveFailedToExecute => "tried, but it failed!".to_string(),
        }
    }
}

/// Event bus for collecting and managing battle events.
///
/// Phases push onto it through `execute_command`; the scheduler reads its
/// length when stamping completion tokens.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<BattleEvent> {
        self.events
    }

    /// Return true if the event bus contains no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Return the number of events in the bus.
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl std::fmt::Display for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}

/// Pre-rolled 1..=100 outcomes for one turn.
#[derive(Debug, Clone)]
pub struct TurnRng {
    outcomes: Vec<u8>,
    index: usize,
}

const OUTCOMES_PER_TURN: usize = 100;

/// Handed out once the pre-rolled outcomes run dry. Clears every 25% check.
const EXHAUSTED_OUTCOME: u8 = 50;

impl TurnRng {
    pub fn new_for_test(outcomes: Vec<u8>) -> Self {
        Self { outcomes, index: 0 }
    }

    /// For phase runs that never roll, such as field repositioning.
    pub fn idle() -> Self {
        Self {
            outcomes: Vec::new(),
            index: 0,
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self::from_rng(&mut StdRng::seed_from_u64(seed))
    }

    /// Pre-generate a turn's worth of outcomes from `rng`.
    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let outcomes: Vec<u8> = (0..OUTCOMES_PER_TURN)
            .map(|_| rng.random_range(1..=100))
            .collect();
        Self { outcomes, index: 0 }
    }

    pub fn next_outcome(&mut self, reason: &str) -> u8 {
        let Some(&outcome) = self.outcomes.get(self.index) else {
            warn!(
                reason,
                consumed = self.index,
                "[RNG] exhausted, using a fixed outcome"
            );
            return EXHAUSTED_OUTCOME;
        };
        trace!(outcome, reason, "[RNG] consumed");
        self.index += 1;
        outcome
    }

    /// True once every pre-rolled outcome has been handed out.
    pub fn is_exhausted(&self) -> bool {
        self.index >= self.outcomes.len()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BattleState {
    pub battle_id: String,
    pub format: BattleFormat,
    pub players: [BattlePlayer; 2],
    pub turn_number: u32,
    pub game_state: GameState,
    pub action_queue: ActionQueue,
}

impl BattleState {
    pub fn new(id: String, format: BattleFormat, player1: BattlePlayer, player2: BattlePlayer) -> Self {
        Self {
            battle_id: id,
            format,
            players: [player1, player2],
            turn_number: 1,
            game_state: GameState::WaitingForActions,
            action_queue: ActionQueue::new(),
        }
    }

    pub fn player(&self, side: Side) -> &BattlePlayer {
        &self.players[side.to_index()]
    }

    pub fn player_mut(&mut self, side: Side) -> &mut BattlePlayer {
        &mut self.players[side.to_index()]
    }

    /// Occupant of a field slot, fainted or not.
    pub fn pokemon(&self, battler: BattlerIndex) -> Option<&PokemonInst> {
        self.player(battler.side())
            .field_pokemon(self.format, battler.field_index())
    }

    pub fn pokemon_mut(&mut self, battler: BattlerIndex) -> Option<&mut PokemonInst> {
        let format = self.format;
        self.player_mut(battler.side())
            .field_pokemon_mut(format, battler.field_index())
    }

    pub fn require_pokemon(&self, battler: BattlerIndex) -> Result<&PokemonInst, BattleStateError> {
        self.pokemon(battler)
            .ok_or(BattleStateError::EmptyBattler(battler))
    }

    /// On the field and not fainted.
    pub fn is_active(&self, battler: BattlerIndex) -> bool {
        self.pokemon(battler).is_some_and(|p| !p.is_fainted())
    }

    /// Every active battler, in battler index order.
    pub fn active_battlers(&self) -> Vec<BattlerIndex> {
        BattlerIndex::iter()
            .filter(|battler| self.is_active(*battler))
            .collect()
    }

    pub fn active_battlers_on(&self, side: Side) -> Vec<BattlerIndex> {
        self.player(side).active_battlers(side, self.format)
    }

    pub fn player_party(&self) -> &[PokemonInst] {
        &self.player(Side::Player).team
    }

    pub fn enemy_party(&self) -> &[PokemonInst] {
        &self.player(Side::Enemy).team
    }

    pub fn player_field(&self) -> &[PokemonInst] {
        self.player(Side::Player).field(self.format)
    }

    pub fn enemy_field(&self) -> &[PokemonInst] {
        self.player(Side::Enemy).field(self.format)
    }

    /// First active combatant on the player's field.
    pub fn player_pokemon(&self) -> Option<&PokemonInst> {
        self.player_field().iter().find(|p| !p.is_fainted())
    }

    /// First active combatant on the enemy's field.
    pub fn enemy_pokemon(&self) -> Option<&PokemonInst> {
        self.enemy_field().iter().find(|p| !p.is_fainted())
    }

    /// Apply a new history bound to every party member.
    pub fn set_history_limit(&mut self, limit: usize) {
        for player in &mut self.players {
            for pokemon in &mut player.team {
                pokemon.summon_data.move_history.set_limit(limit);
            }
        }
    }
}
