use crate::pokemon::PokemonInst;
use schema::{BattleFormat, BattlerIndex, Side};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum PlayerAction {
    // The index refers to the move's position (0-3) in the battler's move list.
    // `target` is required for single-target moves in double battles.
    UseMove {
        move_index: usize,
        #[serde(default)]
        target: Option<BattlerIndex>,
    },

    // The index refers to the Pokémon's position in the player's party.
    SwitchPokemon { team_index: usize },

    Forfeit,
}

impl PlayerAction {
    pub fn use_move(move_index: usize) -> Self {
        PlayerAction::UseMove {
            move_index,
            target: None,
        }
    }

    pub fn use_move_on(move_index: usize, target: BattlerIndex) -> Self {
        PlayerAction::UseMove {
            move_index,
            target: Some(target),
        }
    }
}

/// One side of the battle. The leading party members occupy the field: index
/// 0 in single battles, indices 0 and 1 in double battles.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattlePlayer {
    // A unique identifier. For a human, this could be their UserID.
    // For an NPC, this could be "AI_YoungsterJoey".
    pub player_id: String,
    pub player_name: String,
    pub team: Vec<PokemonInst>,
}

impl BattlePlayer {
    /// Create a new BattlePlayer
    pub fn new(player_id: String, player_name: String, team: Vec<PokemonInst>) -> Self {
        BattlePlayer {
            player_id,
            player_name,
            team,
        }
    }

    /// Party members currently on the field, in field slot order.
    pub fn field(&self, format: BattleFormat) -> &[PokemonInst] {
        let len = format.slots_per_side().min(self.team.len());
        &self.team[..len]
    }

    /// Field occupant for a slot, fainted or not.
    pub fn field_pokemon(&self, format: BattleFormat, field_index: usize) -> Option<&PokemonInst> {
        self.field(format).get(field_index)
    }

    pub fn field_pokemon_mut(
        &mut self,
        format: BattleFormat,
        field_index: usize,
    ) -> Option<&mut PokemonInst> {
        if field_index < format.slots_per_side() {
            self.team.get_mut(field_index)
        } else {
            None
        }
    }

    /// Battlers of `side` whose occupant is on the field and still standing.
    pub fn active_battlers(&self, side: Side, format: BattleFormat) -> Vec<BattlerIndex> {
        self.field(format)
            .iter()
            .enumerate()
            .filter(|(_, pokemon)| !pokemon.is_fainted())
            .filter_map(|(index, _)| BattlerIndex::new(side, index))
            .collect()
    }

    /// Number of party members still able to battle.
    pub fn battle_eligible_count(&self) -> usize {
        self.team.iter().filter(|p| !p.is_fainted()).count()
    }

    pub fn has_usable_pokemon(&self) -> bool {
        self.battle_eligible_count() > 0
    }

    /// Whether a bench member could replace a fainted field occupant.
    pub fn needs_replacement(&self, format: BattleFormat) -> bool {
        let slots = format.slots_per_side();
        let fainted_on_field = self.field(format).iter().any(|p| p.is_fainted());
        let bench_available = self.team.iter().skip(slots).any(|p| !p.is_fainted());
        fainted_on_field && bench_available
    }
}
