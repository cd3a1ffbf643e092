use crate::battle::action_queue::FixedTurnOrder;
use crate::battle::engine::BattleEngine;
use crate::battle::history::TurnMove;
use crate::battle::presentation::{CompletionToken, PendingCompletion};
use crate::battle::state::{BattleEvent, BattleState, TurnRng};
use crate::battle::status::FixedStatusEvaluator;
use crate::config::EngineConfig;
use crate::errors::BattleResult;
use crate::player::{BattlePlayer, PlayerAction};
use crate::pokemon::{Ability, PokemonInst, StatusCondition};
use schema::{BattleFormat, BattlerIndex, Move, MoveResult};
use std::future::Future;
use tokio::sync::mpsc;

/// A builder for creating test Pokemon instances with common defaults.
///
/// # Example
/// ```ignore
/// let pokemon = TestPokemonBuilder::new("Kartana", 250)
///     .with_moves(vec![Move::SonicBoom])
///     .with_status(StatusCondition::Paralysis)
///     .build();
/// ```
pub struct TestPokemonBuilder {
    name: String,
    max_hp: u16,
    speed: u16,
    moves: Vec<Move>,
    status: Option<StatusCondition>,
    current_hp: Option<u16>,
    ability: Ability,
}

impl TestPokemonBuilder {
    /// Creates a new builder with the given name and max HP.
    pub fn new(name: &str, max_hp: u16) -> Self {
        Self {
            name: name.to_string(),
            max_hp,
            speed: 50,
            moves: vec![Move::Splash],
            status: None,
            current_hp: None,
            ability: Ability::None,
        }
    }

    pub fn with_moves(mut self, moves: Vec<Move>) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_speed(mut self, speed: u16) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_status(mut self, status: StatusCondition) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the current HP for the test Pokemon. If not set, HP will be max.
    pub fn with_hp(mut self, hp: u16) -> Self {
        self.current_hp = Some(hp);
        self
    }

    pub fn with_ability(mut self, ability: Ability) -> Self {
        self.ability = ability;
        self
    }

    pub fn build(self) -> PokemonInst {
        let mut pokemon = PokemonInst::new(self.name, 50, self.max_hp, self.speed, &self.moves);
        pokemon.status = self.status;
        pokemon.ability = self.ability;
        if let Some(hp) = self.current_hp {
            pokemon.set_hp(hp);
        }
        pokemon
    }
}

pub fn create_test_player(id: &str, name: &str, team: Vec<PokemonInst>) -> BattlePlayer {
    BattlePlayer::new(id.to_string(), name.to_string(), team)
}

/// Creates a 1v1 battle with no bench.
pub fn create_test_battle(p1_pokemon: PokemonInst, p2_pokemon: PokemonInst) -> BattleState {
    create_battle(BattleFormat::Single, vec![p1_pokemon], vec![p2_pokemon])
}

pub fn create_double_battle(player_team: Vec<PokemonInst>, enemy_team: Vec<PokemonInst>) -> BattleState {
    create_battle(BattleFormat::Double, player_team, enemy_team)
}

pub fn create_battle(
    format: BattleFormat,
    player_team: Vec<PokemonInst>,
    enemy_team: Vec<PokemonInst>,
) -> BattleState {
    let player1 = create_test_player("p1", "Player 1", player_team);
    let player2 = create_test_player("p2", "Player 2", enemy_team);
    BattleState::new("test_battle".to_string(), format, player1, player2)
}

/// Creates a `TurnRng` with a generous buffer of middling outcomes.
pub fn predictable_rng() -> TurnRng {
    TurnRng::new_for_test(vec![50; 100])
}

pub fn test_config() -> EngineConfig {
    EngineConfig {
        rng_seed: Some(7),
        ..EngineConfig::default()
    }
}

/// Engine with instant presentation where every blocking status always
/// immobilizes.
pub fn test_engine(state: BattleState) -> BattleEngine {
    BattleEngine::new(state, test_config()).with_status_evaluator(FixedStatusEvaluator::new(true))
}

/// Like [`test_engine`], but the listed battlers act first, in order.
pub fn ordered_engine(state: BattleState, order: &[BattlerIndex]) -> BattleEngine {
    test_engine(state).with_turn_order(FixedTurnOrder::new(order.to_vec()))
}

/// Queue every choice, then resolve the turn.
pub async fn play_turn(
    engine: &mut BattleEngine,
    choices: &[(BattlerIndex, PlayerAction)],
) -> Vec<BattleEvent> {
    for (battler, action) in choices {
        assert_ok(engine.submit_action(*battler, action.clone()));
    }
    assert_ok(engine.resolve_turn_with_rng(predictable_rng()).await).events
}

/// Drive `work` to completion, firing every presentation cue as it arrives.
pub async fn complete_cues<F: Future>(
    work: F,
    cues: &mut mpsc::UnboundedReceiver<PendingCompletion>,
) -> (F::Output, Vec<CompletionToken>) {
    let mut tokens = Vec::new();
    tokio::pin!(work);
    loop {
        tokio::select! {
            output = &mut work => return (output, tokens),
            Some(pending) = cues.recv() => {
                tokens.push(pending.token.clone());
                pending.complete();
            }
        }
    }
}

pub fn on_field<'a>(engine: &'a BattleEngine, battler: BattlerIndex) -> &'a PokemonInst {
    match engine.state().pokemon(battler) {
        Some(pokemon) => pokemon,
        None => panic!("no Pokemon at {}", battler),
    }
}

/// Outcomes of every history entry, oldest first.
pub fn outcomes(pokemon: &PokemonInst) -> Vec<MoveResult> {
    pokemon.move_history().iter().map(|entry| entry.outcome()).collect()
}

pub fn last_move(pokemon: &PokemonInst) -> Option<&TurnMove> {
    pokemon.last_history_entry().and_then(|entry| entry.as_move())
}

pub fn pp(pokemon: &PokemonInst, move_: Move) -> Option<u8> {
    pokemon.move_instance(move_).map(|instance| instance.pp)
}

/// Battlers named by `MoveUsed`/`MoveCopied` events, in emission order.
pub fn move_users(events: &[BattleEvent]) -> Vec<(BattlerIndex, Move)> {
    events
        .iter()
        .filter_map(|event| match event {
            BattleEvent::MoveUsed {
                battler, move_used, ..
            }
            | BattleEvent::MoveCopied {
                battler, move_used, ..
            } => Some((*battler, *move_used)),
            _ => None,
        })
        .collect()
}

/// Helper function to assert that a Result is Ok and return the value.
pub fn assert_ok<T>(result: BattleResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("Expected Ok but got error: {}", err),
    }
}
