use super::{BattlePhase, MoveEffectPhase, MovePhase, MoveSource};
use crate::battle::commands::{BattleCommand, MutationScope};
use crate::battle::conditions::{PokemonCondition, PokemonConditionType};
use crate::battle::history::{HistoryEntry, TurnMove};
use crate::battle::instruct::{MoveRepetitionResolver, ReplayOutcome};
use crate::battle::presentation::PresentationCue;
use crate::battle::scheduler::PhaseContext;
use crate::battle::state::{ActionFailureReason, BattleEvent};
use crate::errors::BattleResult;
use crate::move_data::{MoveData, MoveEffect, Target};
use crate::pokemon::{Ability, ChargingAction, ChargingKind};
use schema::{BattlerIndex, MoveFlags, MoveResult, MoveTarget};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Landing {
    Landed,
    Blocked,
    Failed,
}

/// Resolve a started move against each target, record the actor's outcome,
/// then queue whatever follows from it: faints first, then a replay, then
/// reactive copies.
pub(super) async fn apply_move(phase: MoveEffectPhase, ctx: &mut PhaseContext<'_>) -> BattleResult<()> {
    let MoveEffectPhase {
        battler,
        move_,
        targets,
        source,
    } = phase;
    let catalogue = ctx.catalogue;
    let data = catalogue.lookup(move_)?;

    ctx.suspend(PresentationCue::MoveAnimation { battler, move_ }).await?;

    let mut landings = Vec::with_capacity(targets.len());
    let mut fainted = Vec::new();
    let mut follow_ups = Vec::new();

    for &target in &targets {
        let landing = hit_target(ctx, battler, target, data, &mut follow_ups)?;
        if landing == Landing::Landed
            && ctx.state.pokemon(target).is_some_and(|p| p.is_fainted())
            && !fainted.contains(&target)
        {
            fainted.push(target);
        }
        landings.push(landing);
    }

    let result = if !landings.is_empty() && landings.iter().all(|l| *l == Landing::Blocked) {
        MoveResult::Blocked
    } else if landings.contains(&Landing::Landed) {
        MoveResult::Success
    } else {
        MoveResult::Fail
    };

    if result == MoveResult::Success && data.has_effect(&MoveEffect::Recharge) {
        ctx.execute(
            BattleCommand::SetCharging {
                battler,
                action: Some(ChargingAction {
                    move_,
                    targets: targets.clone(),
                    kind: ChargingKind::Recharge,
                }),
            },
            MutationScope::actor(battler),
        )?;
    }
    if result == MoveResult::Fail {
        let name = actor_name(ctx, battler);
        ctx.bus.push(BattleEvent::ActionFailed {
            battler,
            pokemon: name,
            reason: ActionFailureReason::MoveFailedToExecute,
        });
    }

    let reactive = matches!(source, MoveSource::Reactive { .. });
    let entry = if reactive {
        TurnMove::reactive(move_, targets.clone(), result)
    } else {
        TurnMove::new(move_, targets.clone(), result)
    };
    debug!(%battler, %move_, %result, ?source, "move resolved");
    ctx.execute(
        BattleCommand::RecordMove {
            battler,
            entry: HistoryEntry::Move(entry),
        },
        MutationScope::actor(battler),
    )?;

    for target in fainted {
        ctx.inject(BattlePhase::Faint { battler: target });
    }
    for phase in follow_ups {
        ctx.inject(phase);
    }
    if result == MoveResult::Success && data.has_flag(MoveFlags::DANCE) && !reactive {
        for phase in dancer_copies(ctx, battler, data, &targets) {
            ctx.inject(phase);
        }
    }
    Ok(())
}

fn hit_target(
    ctx: &mut PhaseContext<'_>,
    battler: BattlerIndex,
    target: BattlerIndex,
    data: &MoveData,
    follow_ups: &mut Vec<BattlePhase>,
) -> BattleResult<Landing> {
    let Some(defender) = ctx.state.pokemon(target).filter(|p| !p.is_fainted()) else {
        return Ok(Landing::Failed);
    };
    let scope = MutationScope::actor(battler);
    let aimed_at_other = target != battler;

    if aimed_at_other && data.is_protectable() && defender.has_condition(PokemonConditionType::Protected) {
        ctx.bus.push(BattleEvent::MoveBlocked {
            attacker: battler,
            defender: target,
            move_used: data.move_,
        });
        return Ok(Landing::Blocked);
    }

    let behind_substitute = aimed_at_other
        && defender.has_condition(PokemonConditionType::Substitute)
        && !data.has_flag(MoveFlags::BYPASS_SUBSTITUTE);

    if let Some(damage) = data.flat_damage() {
        let command = if behind_substitute {
            BattleCommand::DamageSubstitute {
                target,
                amount: damage,
            }
        } else {
            BattleCommand::DealDamage {
                target,
                amount: damage,
            }
        };
        ctx.execute(command, scope)?;
        return Ok(Landing::Landed);
    }

    if behind_substitute {
        debug!(%battler, %target, move_ = %data.move_, "stopped by substitute");
        return Ok(Landing::Failed);
    }

    let mut landing = Landing::Landed;
    for effect in &data.effects {
        if apply_effect(ctx, battler, target, effect, follow_ups)? == Landing::Failed {
            landing = Landing::Failed;
        }
    }
    Ok(landing)
}

fn apply_effect(
    ctx: &mut PhaseContext<'_>,
    battler: BattlerIndex,
    target: BattlerIndex,
    effect: &MoveEffect,
    follow_ups: &mut Vec<BattlePhase>,
) -> BattleResult<Landing> {
    let scope = MutationScope::actor(battler);
    let landing = match effect {
        MoveEffect::Protect => {
            ctx.execute(
                BattleCommand::AddCondition {
                    target: battler,
                    condition: PokemonCondition::Protected,
                },
                scope,
            )?;
            Landing::Landed
        }
        MoveEffect::Substitute => {
            let user = ctx.state.require_pokemon(battler)?;
            let cost = user.max_hp / 4;
            if user.has_condition(PokemonConditionType::Substitute) || user.current_hp() <= cost {
                Landing::Failed
            } else {
                ctx.execute_all(
                    [
                        BattleCommand::DealDamage {
                            target: battler,
                            amount: cost,
                        },
                        BattleCommand::AddCondition {
                            target: battler,
                            condition: PokemonCondition::Substitute { hp: cost },
                        },
                    ],
                    scope,
                )?;
                Landing::Landed
            }
        }
        MoveEffect::Disable(turns) => {
            let defender = ctx.state.require_pokemon(target)?;
            let last = defender.move_history().last_move().map(|m| m.move_);
            match last {
                Some(pokemon_move) if !defender.has_condition(PokemonConditionType::Disabled) => {
                    ctx.execute(
                        BattleCommand::AddCondition {
                            target,
                            condition: PokemonCondition::Disabled {
                                pokemon_move,
                                turns_remaining: *turns,
                            },
                        },
                        scope,
                    )?;
                    Landing::Landed
                }
                _ => Landing::Failed,
            }
        }
        MoveEffect::CureStatus(who) => {
            let patient = match who {
                Target::User => battler,
                Target::Target => target,
            };
            if ctx.state.require_pokemon(patient)?.status.is_some() {
                ctx.execute(
                    BattleCommand::SetPokemonStatus {
                        target: patient,
                        status: None,
                    },
                    scope,
                )?;
                Landing::Landed
            } else {
                Landing::Failed
            }
        }
        MoveEffect::Instruct => {
            let resolver = MoveRepetitionResolver::new(ctx.catalogue);
            let outcome = resolver.replay(battler, target, ctx.state, ctx.bus)?;
            match outcome {
                ReplayOutcome::Replayed(phase) => {
                    follow_ups.push(BattlePhase::Move(phase));
                    Landing::Landed
                }
                ReplayOutcome::TargetFailed { .. } => Landing::Landed,
                ReplayOutcome::Failed(failure) => {
                    let name = actor_name(ctx, battler);
                    ctx.bus.push(BattleEvent::ActionFailed {
                        battler,
                        pokemon: name,
                        reason: ActionFailureReason::ReplayFailed(failure),
                    });
                    Landing::Failed
                }
            }
        }
        // Damage and two-turn bookkeeping are handled around the effect list
        MoveEffect::SetDamage(_) | MoveEffect::ChargeUp | MoveEffect::Recharge => Landing::Landed,
    };
    Ok(landing)
}

/// Combatants with Dancer copy a dance right after it lands. An opponent
/// copies it back at the dancer; an ally reuses the original targets.
fn dancer_copies(
    ctx: &PhaseContext<'_>,
    battler: BattlerIndex,
    data: &MoveData,
    targets: &[BattlerIndex],
) -> Vec<BattlePhase> {
    ctx.state
        .active_battlers()
        .into_iter()
        .filter(|dancer| *dancer != battler)
        .filter(|dancer| {
            ctx.state
                .pokemon(*dancer)
                .is_some_and(|p| p.ability == Ability::Dancer && !p.is_charging())
        })
        .map(|dancer| {
            let copy_targets = if data.target == MoveTarget::NearOther && dancer.is_opponent_of(battler) {
                vec![battler]
            } else if data.target == MoveTarget::User {
                vec![dancer]
            } else {
                targets.to_vec()
            };
            BattlePhase::Move(MovePhase {
                battler: dancer,
                move_: data.move_,
                targets: copy_targets,
                source: MoveSource::Reactive {
                    copied_from: battler,
                },
            })
        })
        .collect()
}

fn actor_name(ctx: &PhaseContext<'_>, battler: BattlerIndex) -> String {
    ctx.state
        .pokemon(battler)
        .map(|p| p.name.clone())
        .unwrap_or_default()
}
