use crate::battle::state::TurnRng;
use crate::pokemon::{PokemonInst, StatusCondition};
use serde::{Deserialize, Serialize};

/// Result of a combatant's once-per-turn status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusActivation {
    /// The status stops the combatant from acting this turn.
    pub immobilized: bool,
    /// The status wears off before the combatant acts.
    pub cured: bool,
}

impl StatusActivation {
    pub const CLEAR: StatusActivation = StatusActivation {
        immobilized: false,
        cured: false,
    };
}

/// Decides whether a combatant's major status stops it from acting.
pub trait StatusEvaluator: Send {
    fn roll_activation(&mut self, pokemon: &PokemonInst, rng: &mut TurnRng) -> StatusActivation;
}

/// Sleep counts down, Freeze thaws 25% of the time, Paralysis immobilizes
/// 25% of the time. Poison and Burn never stop a combatant from acting.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardStatusEvaluator;

impl StatusEvaluator for StandardStatusEvaluator {
    fn roll_activation(&mut self, pokemon: &PokemonInst, rng: &mut TurnRng) -> StatusActivation {
        match pokemon.status {
            Some(StatusCondition::Sleep(turns)) => StatusActivation {
                immobilized: turns > 0,
                cured: turns == 0,
            },
            Some(StatusCondition::Freeze) => {
                // 25% chance to thaw out when trying to act
                let thawed = rng.next_outcome("Defrost Check") < 25;
                StatusActivation {
                    immobilized: !thawed,
                    cured: thawed,
                }
            }
            Some(StatusCondition::Paralysis) => StatusActivation {
                immobilized: rng.next_outcome("Paralysis Check") < 25,
                cured: false,
            },
            Some(StatusCondition::Poison) | Some(StatusCondition::Burn) | None => {
                StatusActivation::CLEAR
            }
        }
    }
}

/// Forces every status to either always or never activate, consuming no RNG.
#[derive(Debug, Clone, Copy)]
pub struct FixedStatusEvaluator {
    pub activates: bool,
}

impl FixedStatusEvaluator {
    pub fn new(activates: bool) -> Self {
        Self { activates }
    }
}

impl StatusEvaluator for FixedStatusEvaluator {
    fn roll_activation(&mut self, pokemon: &PokemonInst, _rng: &mut TurnRng) -> StatusActivation {
        match pokemon.status {
            Some(StatusCondition::Sleep(_))
            | Some(StatusCondition::Freeze)
            | Some(StatusCondition::Paralysis) => StatusActivation {
                immobilized: self.activates,
                cured: !self.activates && !matches!(pokemon.status, Some(StatusCondition::Paralysis)),
            },
            _ => StatusActivation::CLEAR,
        }
    }
}
