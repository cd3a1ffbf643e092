//! Move repetition ("Instruct").
//!
//! The resolver checks whether a target's most recent move may be executed
//! again, out of turn order, and produces the [`MovePhase`] that does so. It
//! runs inside the instructing combatant's move phase, so every write it makes
//! to the target goes through a [`TargetHandle`] grant.

use crate::battle::commands::{execute_command, BattleCommand, MutationScope};
use crate::battle::history::{HistoryEntry, TurnMove};
use crate::battle::phases::{MovePhase, MoveSource};
use crate::battle::state::{ActionFailureReason, BattleEvent, BattleState, EventBus};
use crate::battle::targeting::resolve_targets;
use crate::errors::{BattleResult, IneligibleReason, ReplayFailure};
use crate::move_data::{MoveCatalogue, MoveData};
use crate::pokemon::PokemonInst;
use schema::{ActionCategory, BattlerIndex, Move, MoveFlags, MoveResult};
use tracing::debug;

/// Proof that the replay resolver is acting on a specific target.
///
/// Only this module can mint one; presenting it widens a [`MutationScope`]
/// to cover the target's history and PP.
#[derive(Debug)]
pub struct TargetHandle {
    battler: BattlerIndex,
}

impl TargetHandle {
    fn new(battler: BattlerIndex) -> Self {
        Self { battler }
    }

    pub fn battler(&self) -> BattlerIndex {
        self.battler
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplayOutcome {
    /// The target repeats its move in the returned phase.
    Replayed(MovePhase),
    /// The instruction took, but the target's repeat failed on the spot
    /// (the move is disabled). The target already has its FAIL entry.
    TargetFailed { move_: Move },
    Failed(ReplayFailure),
}

impl ReplayOutcome {
    /// What the instructing combatant records for its own move.
    pub fn actor_result(&self) -> MoveResult {
        match self {
            ReplayOutcome::Replayed(_) | ReplayOutcome::TargetFailed { .. } => MoveResult::Success,
            ReplayOutcome::Failed(_) => MoveResult::Fail,
        }
    }
}

pub struct MoveRepetitionResolver<'c> {
    catalogue: &'c MoveCatalogue,
}

impl<'c> MoveRepetitionResolver<'c> {
    pub fn new(catalogue: &'c MoveCatalogue) -> Self {
        Self { catalogue }
    }

    /// Make `target` repeat its last move on behalf of `actor`.
    ///
    /// Checks run in a fixed order; the first failing check decides the
    /// outcome. Only a disabled move or an exhausted one touches the target.
    pub fn replay(
        &self,
        actor: BattlerIndex,
        target: BattlerIndex,
        state: &mut BattleState,
        bus: &mut EventBus,
    ) -> BattleResult<ReplayOutcome> {
        let pokemon = state.require_pokemon(target)?;
        if pokemon.is_fainted() {
            return Ok(self.reject(
                actor,
                target,
                ReplayFailure::NoEligibleTarget {
                    move_: Move::Instruct,
                },
            ));
        }

        let (last, data) = match self.check_eligibility(pokemon) {
            Ok(eligible) => eligible,
            Err(reason) => {
                return Ok(self.reject(actor, target, ReplayFailure::ActionIneligible(reason)));
            }
        };
        let move_ = last.move_;
        let handle = TargetHandle::new(target);
        let scope = MutationScope::actor(actor).with_grant(&handle);

        if pokemon.is_move_disabled(move_) {
            let name = pokemon.name.clone();
            debug!(%actor, %target, %move_, "instructed move is disabled");
            execute_command(
                BattleCommand::RecordMove {
                    battler: target,
                    entry: HistoryEntry::Move(TurnMove::new(move_, last.targets.clone(), MoveResult::Fail)),
                },
                state,
                bus,
                scope,
            )?;
            execute_command(
                BattleCommand::EmitEvent(BattleEvent::ActionFailed {
                    battler: target,
                    pokemon: name,
                    reason: ActionFailureReason::MoveDisabled,
                }),
                state,
                bus,
                scope,
            )?;
            return Ok(ReplayOutcome::TargetFailed { move_ });
        }

        let pp = pokemon.move_instance(move_).map_or(0, |instance| instance.pp);
        if pp == 0 {
            // Charging an empty move leaves it at zero.
            execute_command(
                BattleCommand::DeductPp {
                    battler: target,
                    move_,
                    amount: data.pp_cost,
                },
                state,
                bus,
                scope,
            )?;
            return Ok(self.reject(actor, target, ReplayFailure::ResourceExhausted { move_ }));
        }

        let resolution = resolve_targets(state, target, data, &last.targets);
        if resolution.is_empty() {
            return Ok(self.reject(actor, target, ReplayFailure::NoEligibleTarget { move_ }));
        }
        for (from, to) in &resolution.redirected {
            bus.push(BattleEvent::TargetRedirected {
                battler: target,
                from: *from,
                to: *to,
            });
        }

        debug!(%actor, %target, %move_, targets = ?resolution.targets, "replaying move");
        bus.push(BattleEvent::MoveInstructed {
            instructor: actor,
            target,
            move_used: move_,
        });
        Ok(ReplayOutcome::Replayed(MovePhase {
            battler: target,
            move_,
            targets: resolution.targets,
            source: MoveSource::Instructed { by: actor },
        }))
    }

    /// Checks that only read the target: it has a replayable last move.
    fn check_eligibility(&self, pokemon: &PokemonInst) -> Result<(TurnMove, &'c MoveData), IneligibleReason> {
        // A placeholder means the last phase produced no move at all.
        let last = match pokemon.last_history_entry() {
            Some(HistoryEntry::Move(turn_move)) => turn_move.clone(),
            Some(HistoryEntry::Placeholder { .. }) | None => {
                return Err(IneligibleReason::NoPriorAction)
            }
        };
        let data = self
            .catalogue
            .get(last.move_)
            .ok_or(IneligibleReason::NotRepeatable)?;

        match data.action_category {
            ActionCategory::TwoTurn => return Err(IneligibleReason::TwoTurnMove),
            ActionCategory::ReactiveOnly => return Err(IneligibleReason::ReactiveOnly),
            ActionCategory::Replay => return Err(IneligibleReason::ReplayMove),
            ActionCategory::Ordinary => {}
        }
        if data.has_flag(MoveFlags::NO_REPLAY) {
            return Err(IneligibleReason::NotRepeatable);
        }
        if pokemon.is_charging() {
            return Err(IneligibleReason::ChargingInProgress);
        }
        if last.virtual_ {
            return Err(IneligibleReason::VirtualCopy);
        }
        if !pokemon.knows_move(last.move_) {
            return Err(IneligibleReason::MoveNotKnown);
        }
        Ok((last, data))
    }

    fn reject(&self, actor: BattlerIndex, target: BattlerIndex, failure: ReplayFailure) -> ReplayOutcome {
        debug!(%actor, %target, %failure, "replay rejected");
        ReplayOutcome::Failed(failure)
    }
}
