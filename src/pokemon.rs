use crate::battle::conditions::{PokemonCondition, PokemonConditionType};
use crate::battle::history::{HistoryEntry, MoveHistory};
use crate::move_data::get_move_max_pp;
use schema::{BattlerIndex, FieldPosition, Move, StatusType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCondition {
    Sleep(u8), // turns left asleep
    Poison,
    Burn,
    Freeze,
    Paralysis,
}

impl StatusCondition {
    pub fn status_type(&self) -> StatusType {
        match self {
            StatusCondition::Sleep(_) => StatusType::Sleep,
            StatusCondition::Poison => StatusType::Poison,
            StatusCondition::Burn => StatusType::Burn,
            StatusCondition::Freeze => StatusType::Freeze,
            StatusCondition::Paralysis => StatusType::Paralysis,
        }
    }
}

impl fmt::Display for StatusCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCondition::Sleep(_) => write!(f, "sleep"),
            StatusCondition::Poison => write!(f, "poison"),
            StatusCondition::Burn => write!(f, "burn"),
            StatusCondition::Freeze => write!(f, "freeze"),
            StatusCondition::Paralysis => write!(f, "paralysis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Ability {
    #[default]
    None,
    /// Copies dance moves used by any other combatant on the field.
    Dancer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveInstance {
    pub move_: Move,
    pub pp: u8,
}

impl MoveInstance {
    /// Create a new move instance with max PP
    pub fn new(move_: Move) -> Self {
        MoveInstance {
            move_,
            pp: get_move_max_pp(move_),
        }
    }

    pub fn with_pp(move_: Move, pp: u8) -> Self {
        MoveInstance { move_, pp }
    }

    /// Use the move (decrease PP)
    pub fn use_move(&mut self) -> bool {
        if self.pp > 0 {
            self.pp -= 1;
            true
        } else {
            false
        }
    }

    /// Charge `cost` PP, never going below zero.
    pub fn charge_pp(&mut self, cost: u8) {
        self.pp = self.pp.saturating_sub(cost);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargingKind {
    /// Charged this turn; the hit lands next turn.
    ChargeUp,
    /// Hit this turn; the next turn is spent recharging.
    Recharge,
}

/// A two-turn move in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingAction {
    pub move_: Move,
    pub targets: Vec<BattlerIndex>,
    pub kind: ChargingKind,
}

/// Per-summon battle state. Created on entry to the field and reset on
/// switch-out or replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SummonData {
    pub move_history: MoveHistory,
    pub conditions: HashMap<PokemonConditionType, PokemonCondition>,
    pub charging: Option<ChargingAction>,
}

impl SummonData {
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            move_history: MoveHistory::new(limit),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokemonInst {
    pub name: String,
    pub level: u8,
    pub max_hp: u16,
    current_hp: u16,
    pub speed: u16,
    pub moves: [Option<MoveInstance>; 4], // Up to 4 moves
    pub status: Option<StatusCondition>,
    #[serde(default)]
    pub ability: Ability,
    #[serde(default)]
    pub field_position: FieldPosition,
    #[serde(default)]
    pub summon_data: SummonData,
}

impl PokemonInst {
    pub fn new(name: impl Into<String>, level: u8, max_hp: u16, speed: u16, moves: &[Move]) -> Self {
        let mut move_array = [const { None }; 4];
        for (i, move_) in moves.iter().take(4).enumerate() {
            move_array[i] = Some(MoveInstance::new(*move_));
        }

        PokemonInst {
            name: name.into(),
            level,
            max_hp,
            current_hp: max_hp,
            speed,
            moves: move_array,
            status: None,
            ability: Ability::None,
            field_position: FieldPosition::Center,
            summon_data: SummonData::default(),
        }
    }

    pub fn current_hp(&self) -> u16 {
        self.current_hp
    }

    pub fn set_hp(&mut self, hp: u16) {
        self.current_hp = hp.min(self.max_hp);
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    /// Apply damage and report whether this knocked the Pokemon out.
    pub fn take_damage(&mut self, damage: u16) -> bool {
        let was_standing = !self.is_fainted();
        self.current_hp = self.current_hp.saturating_sub(damage);
        was_standing && self.is_fainted()
    }

    /// Slot index of `move_` in the moveset, if known.
    pub fn move_slot(&self, move_: Move) -> Option<usize> {
        self.moves
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|m| m.move_ == move_))
    }

    pub fn knows_move(&self, move_: Move) -> bool {
        self.move_slot(move_).is_some()
    }

    pub fn move_instance(&self, move_: Move) -> Option<&MoveInstance> {
        self.moves.iter().flatten().find(|m| m.move_ == move_)
    }

    pub fn move_instance_mut(&mut self, move_: Move) -> Option<&mut MoveInstance> {
        self.moves.iter_mut().flatten().find(|m| m.move_ == move_)
    }

    pub fn has_usable_moves(&self) -> bool {
        self.moves.iter().flatten().any(|m| m.pp > 0)
    }

    pub fn has_condition(&self, condition_type: PokemonConditionType) -> bool {
        self.summon_data.conditions.contains_key(&condition_type)
    }

    pub fn condition(&self, condition_type: PokemonConditionType) -> Option<&PokemonCondition> {
        self.summon_data.conditions.get(&condition_type)
    }

    pub fn is_move_disabled(&self, move_: Move) -> bool {
        matches!(
            self.condition(PokemonConditionType::Disabled),
            Some(PokemonCondition::Disabled { pokemon_move, .. }) if *pokemon_move == move_
        )
    }

    pub fn move_history(&self) -> &MoveHistory {
        &self.summon_data.move_history
    }

    /// The most recent history entry, placeholders included.
    pub fn last_history_entry(&self) -> Option<&HistoryEntry> {
        self.summon_data.move_history.last()
    }

    pub fn is_charging(&self) -> bool {
        self.summon_data.charging.is_some()
    }

    /// Drop everything tied to the current summon, keeping the history bound.
    pub fn reset_summon_data(&mut self) {
        let limit = self.summon_data.move_history.limit();
        self.summon_data = SummonData::with_history_limit(limit);
    }
}
