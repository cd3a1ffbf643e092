use schema::Move;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Volatile conditions tied to the current summon.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum PokemonCondition {
    /// Blocks protectable moves until the end of the turn.
    Protected,
    Substitute {
        hp: u16,
    },
    Disabled {
        pokemon_move: Move,
        turns_remaining: u8,
    }, // Counts down each turn
}

/// Condition key without its payload; one condition of each type at most
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PokemonConditionType {
    Protected,
    Substitute,
    Disabled,
}

impl PokemonCondition {
    pub fn get_type(&self) -> PokemonConditionType {
        match self {
            PokemonCondition::Protected => PokemonConditionType::Protected,
            PokemonCondition::Substitute { .. } => PokemonConditionType::Substitute,
            PokemonCondition::Disabled { .. } => PokemonConditionType::Disabled,
        }
    }

    /// Advance a turn-limited condition by one turn.
    ///
    /// Returns the condition to keep, or `None` once it has run out. Conditions
    /// without a counter are returned unchanged.
    pub fn tick(&self) -> Option<PokemonCondition> {
        match self {
            PokemonCondition::Disabled {
                pokemon_move,
                turns_remaining,
            } => {
                if *turns_remaining > 1 {
                    Some(PokemonCondition::Disabled {
                        pokemon_move: *pokemon_move,
                        turns_remaining: turns_remaining - 1,
                    })
                } else {
                    None
                }
            }
            other => Some(other.clone()),
        }
    }
}

impl fmt::Display for PokemonCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PokemonCondition::Protected => write!(f, "protection"),
            PokemonCondition::Substitute { .. } => write!(f, "substitute"),
            PokemonCondition::Disabled { pokemon_move, .. } => {
                write!(f, "disable ({})", pokemon_move)
            }
        }
    }
}
