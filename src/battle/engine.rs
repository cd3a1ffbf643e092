//! Host-facing battle driver.
//!
//! The engine owns the battle state and every collaborator a turn needs. A
//! host submits one action per active battler, then awaits
//! [`BattleEngine::resolve_turn`].

use crate::battle::action_queue::{SpeedPriorityOrder, TurnOrderResolver};
use crate::battle::commands::{execute_command_batch, BattleCommand, MutationScope};
use crate::battle::phases::{switch_commands, BattlePhase};
use crate::battle::presentation::{InstantPresentation, Presentation, TimedPresentation};
use crate::battle::scheduler::{PhaseContext, PhaseScheduler, SchedulerMonitor, SchedulerState};
use crate::battle::state::{BattleEvent, BattleState, EventBus, GameState, TurnRng};
use crate::battle::status::{StandardStatusEvaluator, StatusEvaluator};
use crate::battle::targeting::validate_target;
use crate::config::EngineConfig;
use crate::errors::{ActionError, BattleResult, BattleStateError};
use crate::move_data::MoveCatalogue;
use crate::player::PlayerAction;
use crate::pokemon::PokemonInst;
use rand::rngs::StdRng;
use rand::SeedableRng;
use schema::{BattleFormat, BattlerIndex, FieldPosition, Side};
use std::sync::Arc;
use strum::IntoEnumIterator;
use tokio::sync::watch;
use tracing::{debug, info};

/// Everything a resolved turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResult {
    pub events: Vec<BattleEvent>,
    pub new_state: GameState,
    pub battle_ended: bool,
    pub winner: Option<Side>,
}

impl TurnResult {
    pub fn new(events: Vec<BattleEvent>, new_state: GameState) -> Self {
        Self {
            events,
            new_state,
            battle_ended: new_state.is_finished(),
            winner: new_state.winner(),
        }
    }
}

/// Whether every battler that must choose this turn has chosen.
pub fn ready_for_turn_resolution(battle_state: &BattleState) -> bool {
    battle_state.game_state == GameState::WaitingForActions
        && battlers_awaiting_action(battle_state).is_empty()
}

/// Active battlers with no queued action. Battlers locked into a two-turn
/// move are not asked; their action is implied.
pub fn battlers_awaiting_action(battle_state: &BattleState) -> Vec<BattlerIndex> {
    battle_state
        .active_battlers()
        .into_iter()
        .filter(|battler| !battle_state.action_queue.has_action(*battler))
        .filter(|battler| {
            battle_state
                .pokemon(*battler)
                .is_some_and(|p| !p.is_charging())
        })
        .collect()
}

pub struct BattleEngine {
    state: BattleState,
    config: EngineConfig,
    catalogue: Arc<MoveCatalogue>,
    turn_order: Box<dyn TurnOrderResolver>,
    status_evaluator: Box<dyn StatusEvaluator>,
    presentation: Arc<dyn Presentation>,
    monitor: SchedulerMonitor,
    rng: StdRng,
    log: EventBus,
}

impl BattleEngine {
    pub fn new(mut state: BattleState, config: EngineConfig) -> Self {
        state.set_history_limit(config.move_history_limit);
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let presentation: Arc<dyn Presentation> = if config.instant_presentation {
            Arc::new(InstantPresentation)
        } else {
            Arc::new(TimedPresentation)
        };
        Self {
            state,
            config,
            catalogue: Arc::new(MoveCatalogue::standard()),
            turn_order: Box::new(SpeedPriorityOrder),
            status_evaluator: Box::new(StandardStatusEvaluator),
            presentation,
            monitor: SchedulerMonitor::new(),
            rng,
            log: EventBus::new(),
        }
    }

    pub fn with_catalogue(mut self, catalogue: Arc<MoveCatalogue>) -> Self {
        self.catalogue = catalogue;
        self
    }

    pub fn with_turn_order(mut self, turn_order: impl TurnOrderResolver + 'static) -> Self {
        self.turn_order = Box::new(turn_order);
        self
    }

    pub fn with_status_evaluator(mut self, evaluator: impl StatusEvaluator + 'static) -> Self {
        self.status_evaluator = Box::new(evaluator);
        self
    }

    pub fn with_presentation(mut self, presentation: Arc<dyn Presentation>) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut BattleState {
        &mut self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalogue(&self) -> &MoveCatalogue {
        &self.catalogue
    }

    /// Every event emitted since the engine was created.
    pub fn event_log(&self) -> &EventBus {
        &self.log
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.monitor.current()
    }

    pub fn subscribe_scheduler(&self) -> watch::Receiver<SchedulerState> {
        self.monitor.subscribe()
    }

    pub fn player_party(&self) -> &[PokemonInst] {
        self.state.player_party()
    }

    pub fn enemy_party(&self) -> &[PokemonInst] {
        self.state.enemy_party()
    }

    pub fn player_pokemon(&self) -> Option<&PokemonInst> {
        self.state.player_pokemon()
    }

    pub fn enemy_pokemon(&self) -> Option<&PokemonInst> {
        self.state.enemy_pokemon()
    }

    pub fn battlers_awaiting_action(&self) -> Vec<BattlerIndex> {
        battlers_awaiting_action(&self.state)
    }

    pub fn ready_for_turn_resolution(&self) -> bool {
        ready_for_turn_resolution(&self.state)
    }

    /// Validate and queue one battler's action for the coming turn.
    pub fn submit_action(&mut self, battler: BattlerIndex, action: PlayerAction) -> BattleResult<()> {
        if self.state.game_state != GameState::WaitingForActions {
            return Err(BattleStateError::NotAcceptingActions.into());
        }
        let pokemon = self
            .state
            .pokemon(battler)
            .filter(|p| !p.is_fainted())
            .ok_or(BattleStateError::EmptyBattler(battler))?;
        if let Some(charging) = &pokemon.summon_data.charging {
            return Err(ActionError::InvalidAction(format!(
                "{} is locked into {}",
                battler, charging.move_
            ))
            .into());
        }

        match &action {
            PlayerAction::UseMove { move_index, target } => {
                let instance = pokemon
                    .moves
                    .get(*move_index)
                    .and_then(|slot| slot.as_ref())
                    .ok_or(ActionError::InvalidMoveIndex(*move_index))?;
                if instance.pp == 0 && pokemon.has_usable_moves() {
                    return Err(ActionError::InvalidAction(format!(
                        "{} has no PP remaining",
                        instance.move_
                    ))
                    .into());
                }
                if let Some(target) = target {
                    let data = self.catalogue.lookup(instance.move_)?;
                    validate_target(&self.state, battler, data, *target)?;
                }
            }
            PlayerAction::SwitchPokemon { team_index } => {
                self.validate_switch(battler, *team_index)?;
            }
            PlayerAction::Forfeit => {}
        }

        debug!(%battler, ?action, "action queued");
        self.state.action_queue.submit(battler, action)?;
        Ok(())
    }

    fn validate_switch(&self, battler: BattlerIndex, team_index: usize) -> BattleResult<()> {
        let side = battler.side();
        let slots = self.state.format.slots_per_side();
        let invalid = BattleStateError::InvalidPartyIndex {
            side,
            index: team_index,
        };
        let bench = self.state.player(side).team.get(team_index);
        if team_index < slots || bench.map_or(true, |p| p.is_fainted()) {
            return Err(invalid.into());
        }
        let already_claimed = self.state.action_queue.iter().any(|queued| {
            queued.battler.side() == side
                && queued.action == PlayerAction::SwitchPokemon { team_index }
        });
        if already_claimed {
            return Err(ActionError::InvalidAction(format!(
                "party member {} is already switching in",
                team_index
            ))
            .into());
        }
        Ok(())
    }

    /// Run the queued turn with RNG drawn from the engine's generator.
    pub async fn resolve_turn(&mut self) -> BattleResult<TurnResult> {
        let rng = TurnRng::from_rng(&mut self.rng);
        self.resolve_turn_with_rng(rng).await
    }

    pub async fn resolve_turn_with_rng(&mut self, mut rng: TurnRng) -> BattleResult<TurnResult> {
        if !self.ready_for_turn_resolution() {
            return Err(BattleStateError::NotAcceptingActions.into());
        }
        self.queue_forced_actions()?;

        let ordered = self
            .turn_order
            .order_actions(&self.state.action_queue, &self.state, &self.catalogue);
        info!(
            turn = self.state.turn_number,
            actions = ordered.len(),
            "resolving turn"
        );

        let mut bus = EventBus::new();
        let outcome = {
            let ctx = PhaseContext::new(
                &mut self.state,
                &mut bus,
                &mut rng,
                &self.catalogue,
                &self.config,
                self.status_evaluator.as_mut(),
                self.presentation.as_ref(),
                &self.monitor,
            );
            PhaseScheduler::for_turn(ctx, ordered).run().await
        };
        for event in bus.events() {
            self.log.push(event.clone());
        }
        outcome?;

        Ok(TurnResult::new(bus.into_events(), self.state.game_state))
    }

    /// Queue the implied action of every battler mid two-turn move.
    fn queue_forced_actions(&mut self) -> BattleResult<()> {
        let forced: Vec<(BattlerIndex, usize)> = self
            .state
            .active_battlers()
            .into_iter()
            .filter(|battler| !self.state.action_queue.has_action(*battler))
            .filter_map(|battler| {
                let pokemon = self.state.pokemon(battler)?;
                let charging = pokemon.summon_data.charging.as_ref()?;
                Some((battler, pokemon.move_slot(charging.move_).unwrap_or(0)))
            })
            .collect();
        for (battler, move_index) in forced {
            self.state
                .action_queue
                .submit(battler, PlayerAction::use_move(move_index))?;
        }
        Ok(())
    }

    /// Place `side`'s first active combatant for a single or double layout.
    pub async fn set_active(&mut self, side: Side, wants_double: bool) -> BattleResult<Vec<BattleEvent>> {
        self.run_standalone(vec![BattlePhase::ToggleDoublePosition { side, wants_double }])
            .await
    }

    /// Switch the battle to `format`, repositioning both sides first.
    pub async fn start_encounter(&mut self, format: BattleFormat) -> BattleResult<Vec<BattleEvent>> {
        let mut events = Vec::new();
        for side in Side::iter() {
            events.extend(self.set_active(side, format.is_double()).await?);
        }
        self.state.format = format;

        if format.is_double() {
            for side in Side::iter() {
                let partner_active = self
                    .state
                    .player(side)
                    .team
                    .get(1)
                    .is_some_and(|p| !p.is_fainted());
                if partner_active {
                    self.state.player_mut(side).team[1].field_position = FieldPosition::Right;
                }
            }
        }
        info!(?format, "encounter started");
        Ok(events)
    }

    /// Send in a bench member for a fainted field occupant between turns.
    pub fn replace_fainted(&mut self, battler: BattlerIndex, team_index: usize) -> BattleResult<Vec<BattleEvent>> {
        let side = battler.side();
        let awaiting = match self.state.game_state {
            GameState::WaitingForBothReplacements => true,
            GameState::WaitingForPlayer1Replacement => side == Side::Player,
            GameState::WaitingForPlayer2Replacement => side == Side::Enemy,
            _ => false,
        };
        if !awaiting {
            return Err(BattleStateError::NotAcceptingActions.into());
        }
        let outgoing = self.state.require_pokemon(battler)?;
        if !outgoing.is_fainted() {
            return Err(ActionError::InvalidAction(format!("{} has not fainted", battler)).into());
        }
        self.validate_switch(battler, team_index)?;

        let incoming = &self.state.player(side).team[team_index];
        let event = BattleEvent::PokemonSwitched {
            battler,
            old_pokemon: outgoing.name.clone(),
            new_pokemon: incoming.name.clone(),
        };
        let commands = switch_commands(
            side,
            battler.field_index(),
            team_index,
            outgoing.field_position,
            event,
        );

        let mut bus = EventBus::new();
        execute_command_batch(commands.to_vec(), &mut self.state, &mut bus, MutationScope::none())?;

        let format = self.state.format;
        let next_state = match (
            self.state.player(Side::Player).needs_replacement(format),
            self.state.player(Side::Enemy).needs_replacement(format),
        ) {
            (true, true) => GameState::WaitingForBothReplacements,
            (true, false) => GameState::WaitingForPlayer1Replacement,
            (false, true) => GameState::WaitingForPlayer2Replacement,
            (false, false) => GameState::WaitingForActions,
        };
        execute_command_batch(
            vec![BattleCommand::SetGameState(next_state)],
            &mut self.state,
            &mut bus,
            MutationScope::none(),
        )?;

        for event in bus.events() {
            self.log.push(event.clone());
        }
        Ok(bus.into_events())
    }

    async fn run_standalone(&mut self, phases: Vec<BattlePhase>) -> BattleResult<Vec<BattleEvent>> {
        let mut bus = EventBus::new();
        let mut rng = TurnRng::idle();
        let outcome = {
            let ctx = PhaseContext::new(
                &mut self.state,
                &mut bus,
                &mut rng,
                &self.catalogue,
                &self.config,
                self.status_evaluator.as_mut(),
                self.presentation.as_ref(),
                &self.monitor,
            );
            let mut scheduler = PhaseScheduler::new(ctx);
            for phase in phases {
                scheduler.push(phase);
            }
            scheduler.run().await
        };
        for event in bus.events() {
            self.log.push(event.clone());
        }
        outcome?;
        Ok(bus.into_events())
    }
}
