//! Single-driver phase pipeline.
//!
//! A turn is expanded into [`BattlePhase`]s that run strictly one at a time.
//! A phase may inject follow-up phases (the move effect after a move begins,
//! faints, replays, reactive copies); those run before anything already
//! queued, so one actor's action resolves completely before the next starts.
//! Suspension happens only inside [`PhaseContext::suspend`], which parks the
//! whole pipeline on a single completion.

use crate::battle::action_queue::OrderedActionList;
use crate::battle::commands::{execute_command, BattleCommand, ExecutionError, MutationScope};
use crate::battle::phases::{BattlePhase, MovePhase, MoveSource};
use crate::battle::presentation::{CompletionToken, Presentation, PresentationCue};
use crate::battle::state::{BattleState, EventBus, TurnRng};
use crate::battle::status::{StatusActivation, StatusEvaluator};
use crate::config::EngineConfig;
use crate::errors::{BattleEngineError, BattleResult};
use crate::move_data::MoveCatalogue;
use crate::player::PlayerAction;
use crate::pokemon::StatusCondition;
use schema::BattlerIndex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Observable scheduler progress:
/// `Idle -> Running -> (Suspended -> Running)* -> Done`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerState {
    Idle,
    Running { phase_index: usize },
    Suspended { phase_index: usize, token: CompletionToken },
    Done,
}

/// Publishes [`SchedulerState`] changes and hands out completion ids.
#[derive(Debug)]
pub struct SchedulerMonitor {
    tx: watch::Sender<SchedulerState>,
    next_token: AtomicU64,
}

impl Default for SchedulerMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerMonitor {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SchedulerState::Idle);
        Self {
            tx,
            next_token: AtomicU64::new(1),
        }
    }

    pub fn current(&self) -> SchedulerState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.tx.subscribe()
    }

    fn set(&self, state: SchedulerState) {
        self.tx.send_replace(state);
    }

    fn next_token_id(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::Relaxed)
    }
}

/// Everything a running phase may read or change.
pub struct PhaseContext<'a> {
    pub state: &'a mut BattleState,
    pub bus: &'a mut EventBus,
    pub rng: &'a mut TurnRng,
    pub catalogue: &'a MoveCatalogue,
    pub config: &'a EngineConfig,
    status_evaluator: &'a mut dyn StatusEvaluator,
    presentation: &'a dyn Presentation,
    monitor: &'a SchedulerMonitor,
    status_rolls: HashMap<BattlerIndex, StatusActivation>,
    injected: Vec<BattlePhase>,
    phase_index: usize,
}

impl<'a> PhaseContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: &'a mut BattleState,
        bus: &'a mut EventBus,
        rng: &'a mut TurnRng,
        catalogue: &'a MoveCatalogue,
        config: &'a EngineConfig,
        status_evaluator: &'a mut dyn StatusEvaluator,
        presentation: &'a dyn Presentation,
        monitor: &'a SchedulerMonitor,
    ) -> Self {
        Self {
            state,
            bus,
            rng,
            catalogue,
            config,
            status_evaluator,
            presentation,
            monitor,
            status_rolls: HashMap::new(),
            injected: Vec::new(),
            phase_index: 0,
        }
    }

    pub fn execute(&mut self, command: BattleCommand, scope: MutationScope) -> Result<(), ExecutionError> {
        execute_command(command, self.state, self.bus, scope)
    }

    pub fn execute_all(
        &mut self,
        commands: impl IntoIterator<Item = BattleCommand>,
        scope: MutationScope,
    ) -> Result<(), ExecutionError> {
        for command in commands {
            self.execute(command, scope)?;
        }
        Ok(())
    }

    /// Queue a phase to run right after the current one. Injected phases keep
    /// their injection order.
    pub fn inject(&mut self, phase: BattlePhase) {
        self.injected.push(phase);
    }

    /// Forget last turn's status rolls.
    pub fn begin_turn(&mut self) {
        self.status_rolls.clear();
    }

    /// The battler's status check for this turn, rolled on first use and then
    /// reused by every later phase of the same turn.
    pub fn status_activation(&mut self, battler: BattlerIndex) -> Result<StatusActivation, ExecutionError> {
        if let Some(activation) = self.status_rolls.get(&battler) {
            return Ok(*activation);
        }
        let Some(pokemon) = self.state.pokemon(battler) else {
            return Ok(StatusActivation::CLEAR);
        };
        let status = pokemon.status;
        let activation = self.status_evaluator.roll_activation(pokemon, self.rng);

        if activation.immobilized {
            if let Some(StatusCondition::Sleep(turns)) = status {
                self.execute(
                    BattleCommand::SetPokemonStatus {
                        target: battler,
                        status: Some(StatusCondition::Sleep(turns.saturating_sub(1))),
                    },
                    MutationScope::none(),
                )?;
            }
        }

        debug!(%battler, ?status, ?activation, "status rolled");
        self.status_rolls.insert(battler, activation);
        Ok(activation)
    }

    fn cue_duration(&self, cue: &PresentationCue) -> Duration {
        match cue {
            PresentationCue::FieldPosition { .. } => self.config.position_transition(),
            _ => Duration::ZERO,
        }
    }

    /// Park the pipeline until the presentation layer reports `cue` done.
    ///
    /// A completion that fails, or does not arrive within the configured
    /// timeout, is a [`BattleEngineError::SchedulerStall`].
    pub async fn suspend(&mut self, cue: PresentationCue) -> BattleResult<()> {
        let token = CompletionToken {
            id: self.monitor.next_token_id(),
            duration: self.cue_duration(&cue),
            cue,
            events_flushed: self.bus.len(),
        };
        let phase_index = self.phase_index;
        self.monitor.set(SchedulerState::Suspended {
            phase_index,
            token: token.clone(),
        });
        debug!(%token, phase_index, "phase suspended");

        let completion = self.presentation.await_completion(&token);
        let outcome = match self.config.completion_timeout() {
            Some(limit) => tokio::time::timeout(limit, completion).await.ok(),
            None => Some(completion.await),
        };

        match outcome {
            Some(Ok(())) => {
                self.monitor.set(SchedulerState::Running { phase_index });
                Ok(())
            }
            Some(Err(error)) => {
                warn!(%token, %error, "completion failed; turn stalled");
                Err(BattleEngineError::SchedulerStall { token })
            }
            None => {
                warn!(%token, "completion timed out; turn stalled");
                Err(BattleEngineError::SchedulerStall { token })
            }
        }
    }
}

/// Runs phases to completion, one at a time.
pub struct PhaseScheduler<'a> {
    ctx: PhaseContext<'a>,
    queue: VecDeque<BattlePhase>,
}

impl<'a> PhaseScheduler<'a> {
    pub fn new(ctx: PhaseContext<'a>) -> Self {
        Self {
            ctx,
            queue: VecDeque::new(),
        }
    }

    /// Expand an ordered action list into a full turn: turn start, one phase
    /// per action, turn end.
    pub fn for_turn(ctx: PhaseContext<'a>, turn: OrderedActionList) -> Self {
        let mut scheduler = Self::new(ctx);
        scheduler.push(BattlePhase::TurnStart);
        for queued in turn {
            let phase = action_phase(scheduler.ctx.state, queued.battler, &queued.action);
            scheduler.push(phase);
        }
        scheduler.push(BattlePhase::TurnEnd);
        scheduler
    }

    pub fn push(&mut self, phase: BattlePhase) {
        self.queue.push_back(phase);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub async fn run(mut self) -> BattleResult<()> {
        while let Some(phase) = self.queue.pop_front() {
            self.ctx.phase_index += 1;
            let phase_index = self.ctx.phase_index;
            self.ctx.monitor.set(SchedulerState::Running { phase_index });
            debug!(phase_index, phase = phase.name(), "running phase");

            phase.run(&mut self.ctx).await?;

            for injected in self.ctx.injected.drain(..).rev() {
                self.queue.push_front(injected);
            }

            // A forfeit ends the battle on the spot; only the turn's wrap-up remains.
            if self.ctx.state.game_state.is_finished() {
                self.queue.retain(|phase| matches!(phase, BattlePhase::TurnEnd));
            }
        }
        self.ctx.monitor.set(SchedulerState::Done);
        Ok(())
    }
}

fn action_phase(state: &BattleState, battler: BattlerIndex, action: &PlayerAction) -> BattlePhase {
    match action {
        PlayerAction::Forfeit => BattlePhase::Forfeit {
            side: battler.side(),
        },
        PlayerAction::SwitchPokemon { team_index } => BattlePhase::Switch {
            battler,
            team_index: *team_index,
        },
        PlayerAction::UseMove { move_index, target } => {
            let pokemon = state.pokemon(battler);
            if let Some(charging) = pokemon.and_then(|p| p.summon_data.charging.as_ref()) {
                return BattlePhase::Move(MovePhase {
                    battler,
                    move_: charging.move_,
                    targets: charging.targets.clone(),
                    source: MoveSource::Forced,
                });
            }
            let move_ = pokemon
                .and_then(|p| p.moves.get(*move_index))
                .and_then(|slot| slot.as_ref())
                .map(|instance| instance.move_)
                .unwrap_or(schema::Move::Struggle);
            BattlePhase::Move(MovePhase {
                battler,
                move_,
                targets: target.iter().copied().collect(),
                source: MoveSource::Selected,
            })
        }
    }
}
