use crate::errors::{MoveDataError, MoveDataResult};
use schema::{ActionCategory, Move, MoveCategory, MoveFlags, MoveTarget, RedirectPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

// Built-in catalogue - constructed once on first lookup
static BUILTIN_CATALOGUE: LazyLock<MoveCatalogue> = LazyLock::new(MoveCatalogue::standard);

/// Get move data for a specific move from the built-in catalogue
pub fn get_move_data(move_: Move) -> Option<&'static MoveData> {
    BUILTIN_CATALOGUE.get(move_)
}

/// Get max PP for a specific move
pub fn get_move_max_pp(move_: Move) -> u8 {
    get_move_data(move_).map(|data| data.max_pp).unwrap_or(30) // Default fallback
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    User,
    Target,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MoveEffect {
    SetDamage(u16), // fixed damage
    Protect,        // block protectable moves aimed at the user this turn
    Substitute,     // create substitute with 25% HP
    Disable(u8),    // disable target's last move for X turns
    CureStatus(Target),
    ChargeUp, // charge for 1 turn, hit on the next
    Recharge, // hit now, skip the next turn
    Instruct, // force the target to repeat its last move
}

/// Static description of a move as the turn engine sees it.
///
/// Damage numerics are not modelled here: a damaging move removes either its
/// `SetDamage` amount or its base power as HP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveData {
    #[serde(rename = "move")]
    pub move_: Move,
    pub category: MoveCategory,
    #[serde(default)]
    pub action_category: ActionCategory,
    pub target: MoveTarget,
    #[serde(default)]
    pub redirect: RedirectPolicy,
    pub power: Option<u16>, // None for no damage moves
    pub max_pp: u8,
    #[serde(default = "default_pp_cost")]
    pub pp_cost: u8,
    #[serde(default)]
    pub priority: i8,
    #[serde(default)]
    pub flags: MoveFlags,
    #[serde(default)]
    pub effects: Vec<MoveEffect>,
}

fn default_pp_cost() -> u8 {
    1
}

impl MoveData {
    fn new(move_: Move, category: MoveCategory, target: MoveTarget, max_pp: u8) -> Self {
        Self {
            move_,
            category,
            action_category: ActionCategory::Ordinary,
            target,
            redirect: RedirectPolicy::NextInSlotOrder,
            power: None,
            max_pp,
            pp_cost: 1,
            priority: 0,
            flags: MoveFlags::PROTECTABLE,
            effects: Vec::new(),
        }
    }

    fn power(mut self, power: u16) -> Self {
        self.power = Some(power);
        self
    }

    fn action_category(mut self, category: ActionCategory) -> Self {
        self.action_category = category;
        self
    }

    fn priority(mut self, priority: i8) -> Self {
        self.priority = priority;
        self
    }

    fn flags(mut self, flags: MoveFlags) -> Self {
        self.flags = flags;
        self
    }

    fn effect(mut self, effect: MoveEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn is_damaging(&self) -> bool {
        self.category != MoveCategory::Status
    }

    pub fn has_effect(&self, effect: &MoveEffect) -> bool {
        self.effects.contains(effect)
    }

    pub fn has_flag(&self, flag: MoveFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_protectable(&self) -> bool {
        self.has_flag(MoveFlags::PROTECTABLE)
    }

    /// HP this move removes from an unprotected target.
    pub fn flat_damage(&self) -> Option<u16> {
        if !self.is_damaging() {
            return None;
        }
        self.effects
            .iter()
            .find_map(|effect| match effect {
                MoveEffect::SetDamage(amount) => Some(*amount),
                _ => None,
            })
            .or(self.power)
    }
}

/// Read-only move lookup consulted by the phases and the replay resolver.
#[derive(Debug, Clone, Default)]
pub struct MoveCatalogue {
    moves: HashMap<Move, MoveData>,
}

impl MoveCatalogue {
    /// The shared built-in catalogue.
    pub fn builtin() -> &'static MoveCatalogue {
        &BUILTIN_CATALOGUE
    }

    /// Builds the standard move table.
    pub fn standard() -> Self {
        use MoveCategory::*;
        use MoveTarget::*;

        let moves = vec![
            MoveData::new(Move::Tackle, Physical, NearOther, 35).power(40),
            MoveData::new(Move::QuickAttack, Physical, NearOther, 30)
                .power(40)
                .priority(1),
            MoveData::new(Move::SonicBoom, Special, NearOther, 20)
                .effect(MoveEffect::SetDamage(20)),
            MoveData::new(Move::VineWhip, Physical, NearOther, 25).power(45),
            MoveData::new(Move::RockSlide, Physical, AllNearEnemies, 10).power(75),
            MoveData::new(Move::FieryDance, Special, NearOther, 10)
                .power(80)
                .flags(MoveFlags::PROTECTABLE | MoveFlags::DANCE),
            MoveData::new(Move::GigatonHammer, Physical, NearOther, 5).power(160),
            MoveData::new(Move::HyperBeam, Special, NearOther, 5)
                .power(150)
                .action_category(ActionCategory::TwoTurn)
                .effect(MoveEffect::Recharge),
            MoveData::new(Move::SolarBeam, Special, NearOther, 10)
                .power(120)
                .action_category(ActionCategory::TwoTurn)
                .effect(MoveEffect::ChargeUp),
            MoveData {
                pp_cost: 0,
                flags: MoveFlags::PROTECTABLE | MoveFlags::NO_REPLAY,
                ..MoveData::new(Move::Struggle, Physical, NearOther, 0).power(50)
            },
            MoveData::new(Move::Instruct, Status, NearOther, 15)
                .action_category(ActionCategory::Replay)
                .flags(
                    MoveFlags::PROTECTABLE | MoveFlags::BYPASS_SUBSTITUTE | MoveFlags::NO_REPLAY,
                )
                .effect(MoveEffect::Instruct),
            MoveData {
                redirect: RedirectPolicy::NoRedirect,
                ..MoveData::new(Move::Protect, Status, User, 10)
                    .priority(4)
                    .flags(MoveFlags::empty())
                    .effect(MoveEffect::Protect)
            },
            MoveData {
                redirect: RedirectPolicy::NoRedirect,
                ..MoveData::new(Move::Substitute, Status, User, 10)
                    .flags(MoveFlags::empty())
                    .effect(MoveEffect::Substitute)
            },
            MoveData::new(Move::Disable, Status, NearOther, 20)
                .flags(MoveFlags::PROTECTABLE | MoveFlags::BYPASS_SUBSTITUTE)
                .effect(MoveEffect::Disable(4)),
            MoveData::new(Move::Purify, Status, NearOther, 20)
                .effect(MoveEffect::CureStatus(Target::Target)),
            MoveData {
                redirect: RedirectPolicy::NoRedirect,
                ..MoveData::new(Move::Splash, Status, User, 40).flags(MoveFlags::empty())
            },
        ];

        Self::from_entries(moves)
    }

    pub fn insert(&mut self, data: MoveData) -> Option<MoveData> {
        self.moves.insert(data.move_, data)
    }

    pub fn get(&self, move_: Move) -> Option<&MoveData> {
        self.moves.get(&move_)
    }

    /// Like [`MoveCatalogue::get`], but a missing entry is an error.
    pub fn lookup(&self, move_: Move) -> MoveDataResult<&MoveData> {
        self.get(move_).ok_or(MoveDataError::MoveNotFound(move_))
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = MoveData>) -> Self {
        let mut catalogue = MoveCatalogue::default();
        for data in entries {
            catalogue.insert(data);
        }
        catalogue
    }

    pub fn into_entries(self) -> Vec<MoveData> {
        self.moves.into_values().collect()
    }

    /// Parses a RON list of move entries.
    pub fn from_ron_str(source: &str) -> MoveDataResult<Self> {
        let entries: Vec<MoveData> = ron::from_str(source)?;
        Ok(Self::from_entries(entries))
    }

    /// Load move entries from a RON file
    pub fn load(path: &Path) -> MoveDataResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| MoveDataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&content)
    }

    /// Replaces entries of `self` with every entry from `overrides`.
    pub fn with_overrides(mut self, overrides: MoveCatalogue) -> Self {
        self.moves.extend(overrides.moves);
        self
    }
}
