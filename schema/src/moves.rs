use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{EnumIter, IntoEnumIterator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum Move {
    // Attacks
    Tackle,
    QuickAttack,
    SonicBoom,
    VineWhip,
    RockSlide,
    FieryDance,
    GigatonHammer,
    HyperBeam,
    SolarBeam,
    Struggle,

    // Status moves
    Instruct,
    Protect,
    Substitute,
    Disable,
    Purify,
    Splash,
}

impl Move {
    /// Human-readable move name, e.g. "Sonic Boom".
    pub fn name(self) -> &'static str {
        match self {
            Move::Tackle => "Tackle",
            Move::QuickAttack => "Quick Attack",
            Move::SonicBoom => "Sonic Boom",
            Move::VineWhip => "Vine Whip",
            Move::RockSlide => "Rock Slide",
            Move::FieryDance => "Fiery Dance",
            Move::GigatonHammer => "Gigaton Hammer",
            Move::HyperBeam => "Hyper Beam",
            Move::SolarBeam => "Solar Beam",
            Move::Struggle => "Struggle",
            Move::Instruct => "Instruct",
            Move::Protect => "Protect",
            Move::Substitute => "Substitute",
            Move::Disable => "Disable",
            Move::Purify => "Purify",
            Move::Splash => "Splash",
        }
    }

    /// Looks a move up by its display name, ignoring case and spaces.
    pub fn from_name(name: &str) -> Option<Move> {
        let wanted: String = name
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect();
        Move::iter().find(|m| {
            m.name()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .eq_ignore_ascii_case(&wanted)
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
