//! Scripted battles, loadable from RON.
//!
//! ```ron
//! Scenario(
//!     name: "Instruct repeats an ally's attack",
//!     format: Double,
//!     player: (name: "Player 1", team: [(name: "Amoonguss", max_hp: 300, speed: 30, moves: [Instruct])]),
//!     enemy: (name: "Player 2", team: [(name: "Kartana", max_hp: 250, speed: 109, moves: [SonicBoom])]),
//!     turns: [[(battler: Player, action: UseMove(move_index: 0, target: Some(Enemy)))]],
//! )
//! ```

use crate::battle::action_queue::{FixedTurnOrder, QueuedAction};
use crate::battle::engine::{BattleEngine, TurnResult};
use crate::battle::state::{BattleState, GameState};
use crate::config::EngineConfig;
use crate::errors::{BattleResult, ConfigError};
use crate::move_data::{MoveCatalogue, MoveData};
use crate::player::{BattlePlayer, PlayerAction};
use crate::pokemon::{Ability, PokemonInst, StatusCondition};
use schema::{BattleFormat, BattlerIndex, Move, Side};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokemonSetup {
    pub name: String,
    #[serde(default = "default_level")]
    pub level: u8,
    pub max_hp: u16,
    /// Starting HP; full when absent.
    #[serde(default)]
    pub hp: Option<u16>,
    pub speed: u16,
    pub moves: Vec<Move>,
    #[serde(default)]
    pub status: Option<StatusCondition>,
    #[serde(default)]
    pub ability: Ability,
}

fn default_level() -> u8 {
    50
}

impl PokemonSetup {
    /// Builds the Pokemon with full PP as `catalogue` defines it.
    pub fn build(&self, catalogue: &MoveCatalogue) -> PokemonInst {
        let mut pokemon = PokemonInst::new(
            self.name.clone(),
            self.level,
            self.max_hp,
            self.speed,
            &self.moves,
        );
        for instance in pokemon.moves.iter_mut().flatten() {
            if let Some(data) = catalogue.get(instance.move_) {
                instance.pp = data.max_pp;
            }
        }
        if let Some(hp) = self.hp {
            pokemon.set_hp(hp);
        }
        pokemon.status = self.status;
        pokemon.ability = self.ability;
        pokemon
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideSetup {
    pub name: String,
    pub team: Vec<PokemonSetup>,
}

impl SideSetup {
    fn build(&self, id: &str, catalogue: &MoveCatalogue) -> BattlePlayer {
        BattlePlayer::new(
            id.to_string(),
            self.name.clone(),
            self.team.iter().map(|setup| setup.build(catalogue)).collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub format: BattleFormat,
    pub player: SideSetup,
    pub enemy: SideSetup,
    /// Battlers listed here act first, in this order, every turn.
    #[serde(default)]
    pub turn_order: Option<Vec<BattlerIndex>>,
    /// Move entries that replace the standard ones for this battle.
    #[serde(default)]
    pub moves: Vec<MoveData>,
    /// One list of choices per turn.
    pub turns: Vec<Vec<QueuedAction>>,
}

impl Scenario {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let scenario: Scenario = ron::from_str(source)?;
        if scenario.player.team.is_empty() || scenario.enemy.team.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "scenario '{}' needs at least one Pokemon per side",
                scenario.name
            )));
        }
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&content)
    }

    /// Double battle where Amoonguss instructs its ally to repeat an attack.
    pub fn instruct_demo() -> Self {
        let mon = |name: &str, max_hp: u16, speed: u16, moves: &[Move]| PokemonSetup {
            name: name.to_string(),
            level: default_level(),
            max_hp,
            hp: None,
            speed,
            moves: moves.to_vec(),
            status: None,
            ability: Ability::None,
        };
        Scenario {
            name: "Instruct repeats an ally's attack".to_string(),
            format: BattleFormat::Double,
            player: SideSetup {
                name: "Player 1".to_string(),
                team: vec![
                    mon("Amoonguss", 300, 30, &[Move::Instruct, Move::Protect]),
                    mon("Lucario", 250, 90, &[Move::SonicBoom, Move::VineWhip]),
                ],
            },
            enemy: SideSetup {
                name: "Player 2".to_string(),
                team: vec![
                    mon("Kartana", 250, 109, &[Move::Splash]),
                    mon("Avalugg", 150, 28, &[Move::Splash]),
                ],
            },
            turn_order: Some(vec![BattlerIndex::Player2, BattlerIndex::Player]),
            moves: Vec::new(),
            turns: vec![vec![
                QueuedAction {
                    battler: BattlerIndex::Player2,
                    action: PlayerAction::use_move_on(0, BattlerIndex::Enemy),
                },
                QueuedAction {
                    battler: BattlerIndex::Player,
                    action: PlayerAction::use_move_on(0, BattlerIndex::Player2),
                },
                QueuedAction {
                    battler: BattlerIndex::Enemy,
                    action: PlayerAction::use_move(0),
                },
                QueuedAction {
                    battler: BattlerIndex::Enemy2,
                    action: PlayerAction::use_move(0),
                },
            ]],
        }
    }

    /// Later entries win over earlier ones for the same move.
    pub fn with_move_overrides(mut self, overrides: MoveCatalogue) -> Self {
        self.moves.extend(overrides.into_entries());
        self
    }

    /// The standard catalogue with this scenario's move entries applied.
    pub fn catalogue(&self) -> MoveCatalogue {
        MoveCatalogue::standard().with_overrides(MoveCatalogue::from_entries(self.moves.clone()))
    }

    pub fn build_state(&self, catalogue: &MoveCatalogue) -> BattleState {
        BattleState::new(
            self.name.clone(),
            self.format,
            self.player.build("p1", catalogue),
            self.enemy.build("p2", catalogue),
        )
    }

    pub fn build_engine(&self, config: EngineConfig) -> BattleEngine {
        let catalogue = self.catalogue();
        let engine = BattleEngine::new(self.build_state(&catalogue), config)
            .with_catalogue(Arc::new(catalogue));
        match &self.turn_order {
            Some(order) => engine.with_turn_order(FixedTurnOrder::new(order.clone())),
            None => engine,
        }
    }

    /// Play the scripted turns until they run out or the battle ends.
    ///
    /// Choices for battlers that cannot act (fainted, or locked into a
    /// two-turn move) are skipped. Fainted field occupants are replaced by
    /// the first healthy bench member between turns.
    pub async fn run(&self, engine: &mut BattleEngine) -> BattleResult<Vec<TurnResult>> {
        let mut results = Vec::new();
        for (turn, choices) in self.turns.iter().enumerate() {
            if engine.state().game_state.is_finished() {
                break;
            }
            for choice in choices {
                if !engine.battlers_awaiting_action().contains(&choice.battler) {
                    warn!(turn, battler = %choice.battler, "skipping scripted choice");
                    continue;
                }
                engine.submit_action(choice.battler, choice.action.clone())?;
            }
            let result = engine.resolve_turn().await?;
            info!(turn, events = result.events.len(), "scripted turn resolved");
            results.push(result);
            auto_replace(engine)?;
        }
        Ok(results)
    }
}

fn auto_replace(engine: &mut BattleEngine) -> BattleResult<()> {
    while matches!(
        engine.state().game_state,
        GameState::WaitingForPlayer1Replacement
            | GameState::WaitingForPlayer2Replacement
            | GameState::WaitingForBothReplacements
    ) {
        let state = engine.state();
        let slots = state.format.slots_per_side();
        let next = Side::iter().find_map(|side| {
            let team = &state.player(side).team;
            let fainted = (0..slots.min(team.len())).find(|i| team[*i].is_fainted())?;
            let bench = (slots..team.len()).find(|i| !team[*i].is_fainted())?;
            Some((BattlerIndex::new(side, fainted)?, bench))
        });
        match next {
            Some((battler, bench)) => {
                engine.replace_fainted(battler, bench)?;
            }
            None => break,
        }
    }
    Ok(())
}
