use super::{BattlePhase, MoveEffectPhase, MovePhase, MoveSource};
use crate::battle::commands::{BattleCommand, MutationScope};
use crate::battle::history::{HistoryEntry, SkipReason, TurnMove};
use crate::battle::scheduler::PhaseContext;
use crate::battle::state::{ActionFailureReason, BattleEvent};
use crate::battle::targeting::{requested_targets, resolve_targets};
use crate::errors::BattleResult;
use crate::move_data::MoveEffect;
use crate::pokemon::{ChargingAction, ChargingKind, StatusCondition};
use schema::{BattlerIndex, Move, MoveResult, StatusType};
use tracing::debug;

/// Gate the move, settle its targets, pay for it, then hand over to the
/// effect phase. Every way out of here leaves exactly one history entry
/// for the actor, except when the actor is no longer on the field.
pub(super) async fn begin_move(phase: MovePhase, ctx: &mut PhaseContext<'_>) -> BattleResult<()> {
    let MovePhase {
        battler,
        mut move_,
        mut targets,
        source,
    } = phase;
    let scope = MutationScope::actor(battler);
    let reactive = matches!(source, MoveSource::Reactive { .. });

    let Some(pokemon) = ctx.state.pokemon(battler).filter(|p| !p.is_fainted()) else {
        debug!(%battler, %move_, "actor left the field before acting");
        return Ok(());
    };
    let name = pokemon.name.clone();
    let charging = pokemon.summon_data.charging.clone();

    // Two-turn moves: the second turn replaces whatever was queued
    let mut releasing_charge = false;
    if matches!(source, MoveSource::Selected | MoveSource::Forced) {
        if let Some(charging) = charging {
            ctx.execute(BattleCommand::SetCharging { battler, action: None }, scope)?;
            match charging.kind {
                ChargingKind::Recharge => {
                    return skip_turn(ctx, battler, name, SkipReason::Recharging);
                }
                ChargingKind::ChargeUp => {
                    releasing_charge = true;
                    move_ = charging.move_;
                    targets = charging.targets;
                }
            }
        }
    }

    // Reactions are not actions, so status never stops them
    if !reactive && has_blocking_status(ctx, battler) {
        let activation = ctx.status_activation(battler)?;
        let status = ctx.state.pokemon(battler).and_then(|p| p.status);
        if activation.cured {
            if status.is_some() {
                ctx.execute(
                    BattleCommand::SetPokemonStatus {
                        target: battler,
                        status: None,
                    },
                    scope,
                )?;
            }
        } else if activation.immobilized {
            if let Some(status) = status {
                return skip_turn(
                    ctx,
                    battler,
                    name,
                    SkipReason::Immobilized(status.status_type()),
                );
            }
        }
    }

    if source == MoveSource::Selected && !releasing_charge {
        let pokemon = ctx.state.require_pokemon(battler)?;
        let out_of_pp = pokemon.move_instance(move_).map_or(true, |m| m.pp == 0);
        if out_of_pp && !pokemon.has_usable_moves() {
            debug!(%battler, "no PP left anywhere; struggling");
            move_ = Move::Struggle;
        } else if pokemon.is_move_disabled(move_) {
            record(ctx, battler, TurnMove::new(move_, Vec::new(), MoveResult::Fail))?;
            return fail(ctx, battler, name, ActionFailureReason::MoveDisabled);
        } else if out_of_pp {
            record(ctx, battler, TurnMove::new(move_, Vec::new(), MoveResult::Fail))?;
            return fail(ctx, battler, name, ActionFailureReason::NoPPRemaining);
        }
    }

    let catalogue = ctx.catalogue;
    let data = catalogue.lookup(move_)?;

    let requested = if source == MoveSource::Selected && !releasing_charge {
        requested_targets(ctx.state, battler, data, targets.first().copied())
    } else if targets.is_empty() {
        requested_targets(ctx.state, battler, data, None)
    } else {
        targets
    };
    let resolution = resolve_targets(ctx.state, battler, data, &requested);
    for (from, to) in &resolution.redirected {
        ctx.bus.push(BattleEvent::TargetRedirected {
            battler,
            from: *from,
            to: *to,
        });
    }
    if resolution.is_empty() {
        let entry = turn_move(move_, Vec::new(), MoveResult::Fail, reactive);
        record(ctx, battler, entry)?;
        return fail(ctx, battler, name, ActionFailureReason::NoTargets);
    }

    let pays = matches!(source, MoveSource::Selected | MoveSource::Instructed { .. });
    if pays && !releasing_charge && data.pp_cost > 0 {
        ctx.execute(
            BattleCommand::DeductPp {
                battler,
                move_,
                amount: data.pp_cost,
            },
            scope,
        )?;
    }

    let announcement = match source {
        MoveSource::Reactive { copied_from } => BattleEvent::MoveCopied {
            battler,
            pokemon: name.clone(),
            move_used: move_,
            copied_from,
        },
        _ => BattleEvent::MoveUsed {
            battler,
            pokemon: name.clone(),
            move_used: move_,
        },
    };
    ctx.bus.push(announcement);

    if data.has_effect(&MoveEffect::ChargeUp) && !releasing_charge {
        ctx.execute_all(
            [
                BattleCommand::SetCharging {
                    battler,
                    action: Some(ChargingAction {
                        move_,
                        targets: resolution.targets.clone(),
                        kind: ChargingKind::ChargeUp,
                    }),
                },
                BattleCommand::EmitEvent(BattleEvent::MoveCharging {
                    battler,
                    pokemon: name,
                    move_used: move_,
                }),
            ],
            scope,
        )?;
        record(
            ctx,
            battler,
            turn_move(move_, resolution.targets, MoveResult::Success, reactive),
        )?;
        return Ok(());
    }

    ctx.inject(BattlePhase::MoveEffect(MoveEffectPhase {
        battler,
        move_,
        targets: resolution.targets,
        source,
    }));
    Ok(())
}

fn has_blocking_status(ctx: &PhaseContext<'_>, battler: BattlerIndex) -> bool {
    matches!(
        ctx.state.pokemon(battler).and_then(|p| p.status),
        Some(StatusCondition::Sleep(_) | StatusCondition::Freeze | StatusCondition::Paralysis)
    )
}

fn turn_move(move_: Move, targets: Vec<BattlerIndex>, result: MoveResult, reactive: bool) -> TurnMove {
    if reactive {
        TurnMove::reactive(move_, targets, result)
    } else {
        TurnMove::new(move_, targets, result)
    }
}

fn record(ctx: &mut PhaseContext<'_>, battler: BattlerIndex, entry: TurnMove) -> BattleResult<()> {
    ctx.execute(
        BattleCommand::RecordMove {
            battler,
            entry: HistoryEntry::Move(entry),
        },
        MutationScope::actor(battler),
    )?;
    Ok(())
}

fn fail(
    ctx: &mut PhaseContext<'_>,
    battler: BattlerIndex,
    pokemon: String,
    reason: ActionFailureReason,
) -> BattleResult<()> {
    ctx.bus.push(BattleEvent::ActionFailed {
        battler,
        pokemon,
        reason,
    });
    Ok(())
}

/// The actor loses its phase without executing anything.
fn skip_turn(
    ctx: &mut PhaseContext<'_>,
    battler: BattlerIndex,
    pokemon: String,
    reason: SkipReason,
) -> BattleResult<()> {
    let failure = match reason {
        SkipReason::Recharging => ActionFailureReason::MustRecharge,
        SkipReason::Immobilized(StatusType::Sleep) => ActionFailureReason::IsAsleep,
        SkipReason::Immobilized(StatusType::Freeze) => ActionFailureReason::IsFrozen,
        SkipReason::Immobilized(_) => ActionFailureReason::IsParalyzed,
    };
    debug!(%battler, ?reason, "phase skipped");
    ctx.execute(
        BattleCommand::RecordMove {
            battler,
            entry: HistoryEntry::Placeholder { reason },
        },
        MutationScope::actor(battler),
    )?;
    fail(ctx, battler, pokemon, failure)
}
