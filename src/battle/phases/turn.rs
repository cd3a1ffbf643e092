use crate::battle::commands::{BattleCommand, MutationScope};
use crate::battle::scheduler::PhaseContext;
use crate::battle::state::{BattleEvent, GameState};
use crate::errors::BattleResult;
use schema::Side;
use strum::IntoEnumIterator;
use tracing::info;

pub(super) fn start_turn(ctx: &mut PhaseContext<'_>) -> BattleResult<()> {
    ctx.begin_turn();
    let turn_number = ctx.state.turn_number;
    info!(turn_number, "turn started");
    ctx.execute_all(
        [
            BattleCommand::SetGameState(GameState::TurnInProgress),
            BattleCommand::EmitEvent(BattleEvent::TurnStarted { turn_number }),
        ],
        MutationScope::none(),
    )?;
    Ok(())
}

pub(super) fn end_turn(ctx: &mut PhaseContext<'_>) -> BattleResult<()> {
    let scope = MutationScope::none();

    // 1. Upkeep for everyone still standing, unless the battle is already over
    if !ctx.state.game_state.is_finished() {
        for battler in ctx.state.active_battlers() {
            ctx.execute(BattleCommand::TickConditions { target: battler }, scope)?;
        }

        // 2. Check for win conditions, which override everything else
        check_win_conditions(ctx)?;
    }

    // 3. Advance the turn if it was a real battle turn
    if ctx.state.game_state == GameState::TurnInProgress {
        ctx.execute_all(
            [
                BattleCommand::IncrementTurnNumber,
                BattleCommand::SetGameState(GameState::WaitingForActions),
            ],
            scope,
        )?;
    }

    // 4. Override the default if a replacement is due
    check_for_pending_replacements(ctx)?;

    // 5. Clear the queue and announce the end of the turn
    ctx.execute_all(
        [
            BattleCommand::ClearActionQueue,
            BattleCommand::EmitEvent(BattleEvent::TurnEnded),
        ],
        scope,
    )?;
    Ok(())
}

fn check_win_conditions(ctx: &mut PhaseContext<'_>) -> BattleResult<()> {
    let standing: Vec<bool> = Side::iter()
        .map(|side| ctx.state.player(side).has_usable_pokemon())
        .collect();

    let (game_state, defeated) = match (standing[0], standing[1]) {
        (true, true) => return Ok(()),
        (false, false) => (GameState::Draw, Vec::new()),
        (false, true) => (GameState::Player2Win, vec![Side::Player]),
        (true, false) => (GameState::Player1Win, vec![Side::Enemy]),
    };
    info!(?game_state, "battle decided");

    let mut commands = vec![BattleCommand::SetGameState(game_state)];
    commands.extend(
        defeated
            .into_iter()
            .map(|side| BattleCommand::EmitEvent(BattleEvent::PlayerDefeated { side })),
    );
    commands.push(BattleCommand::EmitEvent(BattleEvent::BattleEnded {
        winner: game_state.winner(),
    }));
    ctx.execute_all(commands, MutationScope::none())?;
    Ok(())
}

/// Fainted field occupants with a healthy bench behind them must be replaced
/// before the next turn.
fn check_for_pending_replacements(ctx: &mut PhaseContext<'_>) -> BattleResult<()> {
    if ctx.state.game_state.is_finished() {
        return Ok(());
    }
    let format = ctx.state.format;
    let p1_needs_replacement = ctx.state.player(Side::Player).needs_replacement(format);
    let p2_needs_replacement = ctx.state.player(Side::Enemy).needs_replacement(format);

    let new_game_state = match (p1_needs_replacement, p2_needs_replacement) {
        (true, true) => Some(GameState::WaitingForBothReplacements),
        (true, false) => Some(GameState::WaitingForPlayer1Replacement),
        (false, true) => Some(GameState::WaitingForPlayer2Replacement),
        (false, false) => None,
    };

    if let Some(state) = new_game_state {
        ctx.execute(BattleCommand::SetGameState(state), MutationScope::none())?;
    }
    Ok(())
}
