use crate::battle::conditions::{PokemonCondition, PokemonConditionType};
use crate::battle::history::HistoryEntry;
use crate::battle::instruct::TargetHandle;
use crate::battle::state::{BattleEvent, BattleState, EventBus, GameState};
use crate::pokemon::{ChargingAction, PokemonInst, StatusCondition};
use schema::{BattlerIndex, FieldPosition, Move, Side};
use thiserror::Error;
use tracing::trace;

/// Atomic commands representing final state changes
#[derive(Debug, Clone)]
pub enum BattleCommand {
    // Direct state changes
    SetGameState(GameState),
    IncrementTurnNumber,
    ClearActionQueue,

    // Pokemon modifications
    DealDamage {
        target: BattlerIndex,
        amount: u16,
    },
    DamageSubstitute {
        target: BattlerIndex,
        amount: u16,
    },
    SetPokemonStatus {
        target: BattlerIndex,
        status: Option<StatusCondition>,
    },
    AddCondition {
        target: BattlerIndex,
        condition: PokemonCondition,
    },
    SetCharging {
        battler: BattlerIndex,
        action: Option<ChargingAction>,
    },
    /// End-of-turn upkeep: drop protection, count down timed conditions.
    TickConditions {
        target: BattlerIndex,
    },

    // Scoped: only the running phase's actor (or a granted target)
    RecordMove {
        battler: BattlerIndex,
        entry: HistoryEntry,
    },
    DeductPp {
        battler: BattlerIndex,
        move_: Move,
        amount: u8,
    },

    // Party layout
    SetFieldPosition {
        side: Side,
        party_index: usize,
        position: FieldPosition,
    },
    SwapPartySlots {
        side: Side,
        a: usize,
        b: usize,
    },
    ResetSummonData {
        side: Side,
        party_index: usize,
    },

    // Battle flow
    EmitEvent(BattleEvent),
}

/// Error types for command execution
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("no Pokemon occupies {0}")]
    NoPokemon(BattlerIndex),

    #[error("{battler} does not know {move_}")]
    MoveNotKnown { battler: BattlerIndex, move_: Move },

    #[error("invalid party index {index} for the {side} side")]
    InvalidPartyIndex { side: Side, index: usize },

    #[error("{battler} is outside the mutation scope of the running phase")]
    MutationOutOfScope { battler: BattlerIndex },
}

/// Which battlers' history and PP the running phase may touch.
///
/// A move phase may only write to its own actor. The replay resolver widens
/// that to its target by presenting a [`TargetHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MutationScope {
    actor: Option<BattlerIndex>,
    granted: Option<BattlerIndex>,
}

impl MutationScope {
    /// No battler's history or PP may change.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn actor(battler: BattlerIndex) -> Self {
        Self {
            actor: Some(battler),
            granted: None,
        }
    }

    pub fn with_grant(self, handle: &TargetHandle) -> Self {
        Self {
            granted: Some(handle.battler()),
            ..self
        }
    }

    pub fn permits(&self, battler: BattlerIndex) -> bool {
        self.actor == Some(battler) || self.granted == Some(battler)
    }

    fn check(&self, battler: BattlerIndex) -> Result<(), ExecutionError> {
        if self.permits(battler) {
            Ok(())
        } else {
            Err(ExecutionError::MutationOutOfScope { battler })
        }
    }
}

pub fn execute_command_batch(
    commands: Vec<BattleCommand>,
    state: &mut BattleState,
    bus: &mut EventBus,
    scope: MutationScope,
) -> Result<(), ExecutionError> {
    for command in commands {
        execute_command(command, state, bus, scope)?;
    }
    Ok(())
}

pub fn execute_command(
    command: BattleCommand,
    state: &mut BattleState,
    bus: &mut EventBus,
    scope: MutationScope,
) -> Result<(), ExecutionError> {
    trace!(?command, "executing command");
    match command {
        BattleCommand::SetGameState(game_state) => {
            state.game_state = game_state;
            Ok(())
        }
        BattleCommand::IncrementTurnNumber => {
            state.turn_number += 1;
            Ok(())
        }
        BattleCommand::ClearActionQueue => {
            state.action_queue.clear();
            Ok(())
        }
        BattleCommand::DealDamage { target, amount } => {
            let pokemon = pokemon_mut(state, target)?;
            pokemon.take_damage(amount);
            let event = BattleEvent::DamageDealt {
                target,
                pokemon: pokemon.name.clone(),
                damage: amount,
                remaining_hp: pokemon.current_hp(),
            };
            bus.push(event);
            Ok(())
        }
        BattleCommand::DamageSubstitute { target, amount } => {
            let pokemon = pokemon_mut(state, target)?;
            let conditions = &mut pokemon.summon_data.conditions;
            if let Some(PokemonCondition::Substitute { hp }) =
                conditions.get_mut(&PokemonConditionType::Substitute)
            {
                *hp = hp.saturating_sub(amount);
                let broken = *hp == 0;
                if broken {
                    conditions.remove(&PokemonConditionType::Substitute);
                }
                bus.push(BattleEvent::SubstituteDamaged {
                    target,
                    damage: amount,
                    broken,
                });
            }
            Ok(())
        }
        BattleCommand::SetPokemonStatus { target, status } => {
            let pokemon = pokemon_mut(state, target)?;
            let previous = std::mem::replace(&mut pokemon.status, status);
            if let (Some(old), None) = (previous, status) {
                let event = BattleEvent::PokemonStatusRemoved {
                    target,
                    pokemon: pokemon.name.clone(),
                    status: old,
                };
                bus.push(event);
            }
            Ok(())
        }
        BattleCommand::AddCondition { target, condition } => {
            let pokemon = pokemon_mut(state, target)?;
            pokemon
                .summon_data
                .conditions
                .insert(condition.get_type(), condition.clone());
            let event = BattleEvent::ConditionApplied {
                target,
                pokemon: pokemon.name.clone(),
                condition,
            };
            bus.push(event);
            Ok(())
        }
        BattleCommand::SetCharging { battler, action } => {
            pokemon_mut(state, battler)?.summon_data.charging = action;
            Ok(())
        }
        BattleCommand::TickConditions { target } => {
            let pokemon = pokemon_mut(state, target)?;
            let conditions = &mut pokemon.summon_data.conditions;
            conditions.remove(&PokemonConditionType::Protected);

            let mut expired = Vec::new();
            for (condition_type, condition) in conditions.iter_mut() {
                match condition.tick() {
                    Some(next) => *condition = next,
                    None => expired.push(*condition_type),
                }
            }
            expired.sort_by_key(|condition_type| *condition_type as u8);
            for condition_type in expired {
                if let Some(condition) = conditions.remove(&condition_type) {
                    bus.push(BattleEvent::ConditionExpired {
                        target,
                        pokemon: pokemon.name.clone(),
                        condition,
                    });
                }
            }
            Ok(())
        }
        BattleCommand::RecordMove { battler, entry } => {
            scope.check(battler)?;
            pokemon_mut(state, battler)?
                .summon_data
                .move_history
                .push(entry);
            Ok(())
        }
        BattleCommand::DeductPp {
            battler,
            move_,
            amount,
        } => {
            scope.check(battler)?;
            pokemon_mut(state, battler)?
                .move_instance_mut(move_)
                .ok_or(ExecutionError::MoveNotKnown { battler, move_ })?
                .charge_pp(amount);
            Ok(())
        }
        BattleCommand::SetFieldPosition {
            side,
            party_index,
            position,
        } => {
            party_member_mut(state, side, party_index)?.field_position = position;
            Ok(())
        }
        BattleCommand::SwapPartySlots { side, a, b } => {
            let team = &mut state.player_mut(side).team;
            let len = team.len();
            if a >= len || b >= len {
                return Err(ExecutionError::InvalidPartyIndex {
                    side,
                    index: a.max(b),
                });
            }
            team.swap(a, b);
            Ok(())
        }
        BattleCommand::ResetSummonData { side, party_index } => {
            party_member_mut(state, side, party_index)?.reset_summon_data();
            Ok(())
        }
        BattleCommand::EmitEvent(event) => {
            bus.push(event);
            Ok(())
        }
    }
}

fn pokemon_mut(state: &mut BattleState, battler: BattlerIndex) -> Result<&mut PokemonInst, ExecutionError> {
    state
        .pokemon_mut(battler)
        .ok_or(ExecutionError::NoPokemon(battler))
}

fn party_member_mut(
    state: &mut BattleState,
    side: Side,
    party_index: usize,
) -> Result<&mut PokemonInst, ExecutionError> {
    state
        .player_mut(side)
        .team
        .get_mut(party_index)
        .ok_or(ExecutionError::InvalidPartyIndex {
            side,
            index: party_index,
        })
}
