use crate::battle::commands::{BattleCommand, MutationScope};
use crate::battle::presentation::PresentationCue;
use crate::battle::scheduler::PhaseContext;
use crate::battle::state::{BattleEvent, GameState};
use crate::errors::BattleResult;
use schema::{BattlerIndex, Side};
use tracing::{debug, info, warn};

pub(super) async fn faint(battler: BattlerIndex, ctx: &mut PhaseContext<'_>) -> BattleResult<()> {
    let Some(pokemon) = ctx.state.pokemon(battler).filter(|p| p.is_fainted()) else {
        return Ok(());
    };
    let name = pokemon.name.clone();
    info!(%battler, pokemon = %name, "fainted");

    ctx.suspend(PresentationCue::Faint { battler }).await?;
    ctx.execute_all(
        [
            BattleCommand::SetCharging {
                battler,
                action: None,
            },
            BattleCommand::EmitEvent(BattleEvent::PokemonFainted {
                battler,
                pokemon: name,
            }),
        ],
        MutationScope::none(),
    )?;
    Ok(())
}

/// Swap a field occupant for a bench member. The newcomer takes over the
/// outgoing occupant's field position; the outgoing one loses its summon data.
pub(super) async fn switch(
    battler: BattlerIndex,
    team_index: usize,
    ctx: &mut PhaseContext<'_>,
) -> BattleResult<()> {
    let side = battler.side();
    let field_index = battler.field_index();
    let slots = ctx.state.format.slots_per_side();
    let team = &ctx.state.player(side).team;

    let (Some(outgoing), Some(incoming)) = (team.get(field_index), team.get(team_index)) else {
        warn!(%battler, team_index, "switch target vanished");
        return Ok(());
    };
    if outgoing.is_fainted() || team_index < slots || incoming.is_fainted() {
        debug!(%battler, team_index, "switch no longer possible");
        return Ok(());
    }
    let position = outgoing.field_position;
    let event = BattleEvent::PokemonSwitched {
        battler,
        old_pokemon: outgoing.name.clone(),
        new_pokemon: incoming.name.clone(),
    };

    ctx.execute_all(
        switch_commands(side, field_index, team_index, position, event),
        MutationScope::none(),
    )?;
    ctx.suspend(PresentationCue::SwitchIn { battler }).await
}

pub(crate) fn switch_commands(
    side: Side,
    field_index: usize,
    team_index: usize,
    position: schema::FieldPosition,
    event: BattleEvent,
) -> [BattleCommand; 4] {
    [
        BattleCommand::ResetSummonData {
            side,
            party_index: field_index,
        },
        BattleCommand::SwapPartySlots {
            side,
            a: field_index,
            b: team_index,
        },
        BattleCommand::SetFieldPosition {
            side,
            party_index: field_index,
            position,
        },
        BattleCommand::EmitEvent(event),
    ]
}

pub(super) fn forfeit(side: Side, ctx: &mut PhaseContext<'_>) -> BattleResult<()> {
    if ctx.state.game_state.is_finished() {
        return Ok(());
    }
    let game_state = GameState::win_for(side.opponent());
    info!(%side, "forfeit");
    ctx.execute_all(
        [
            BattleCommand::SetGameState(game_state),
            BattleCommand::EmitEvent(BattleEvent::PlayerDefeated { side }),
            BattleCommand::EmitEvent(BattleEvent::BattleEnded {
                winner: game_state.winner(),
            }),
        ],
        MutationScope::none(),
    )?;
    Ok(())
}
