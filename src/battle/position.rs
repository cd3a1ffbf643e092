//! Field slot assignment for a side's lead combatant.

use crate::battle::commands::{BattleCommand, MutationScope};
use crate::battle::presentation::PresentationCue;
use crate::battle::scheduler::PhaseContext;
use crate::battle::state::BattleEvent;
use crate::errors::BattleResult;
use schema::{FieldPosition, Side};
use tracing::debug;

/// LEFT when the side is going double and has a partner to fill RIGHT,
/// CENTER otherwise.
pub fn assign_position(wants_double: bool, battle_eligible: usize) -> FieldPosition {
    if wants_double && battle_eligible > 1 {
        FieldPosition::Left
    } else {
        FieldPosition::Center
    }
}

/// Move `side`'s first active combatant to its slot for the coming layout.
///
/// The position is set immediately; the party reorder that keeps index 0 on
/// the LEFT occupant waits for the transition's completion. A side with no
/// active combatant is left untouched.
pub(crate) async fn toggle_double_position(
    side: Side,
    wants_double: bool,
    ctx: &mut PhaseContext<'_>,
) -> BattleResult<()> {
    let format = ctx.state.format;
    let player = ctx.state.player(side);
    let Some(party_index) = player.field(format).iter().position(|p| !p.is_fainted()) else {
        debug!(%side, "no active combatant to position");
        return Ok(());
    };
    let position = assign_position(wants_double, player.battle_eligible_count());
    let name = player.team[party_index].name.clone();
    debug!(%side, party_index, %position, "repositioning");

    ctx.execute_all(
        [
            BattleCommand::SetFieldPosition {
                side,
                party_index,
                position,
            },
            BattleCommand::EmitEvent(BattleEvent::FieldPositionChanged {
                side,
                pokemon: name.clone(),
                position,
            }),
        ],
        MutationScope::none(),
    )?;

    ctx.suspend(PresentationCue::FieldPosition { side, position }).await?;

    if party_index == 1 {
        ctx.execute_all(
            [
                BattleCommand::SwapPartySlots { side, a: 0, b: 1 },
                BattleCommand::EmitEvent(BattleEvent::PartyReordered { side, leader: name }),
            ],
            MutationScope::none(),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("double with a partner", true, 2, FieldPosition::Left)]
    #[case("double with a full party", true, 6, FieldPosition::Left)]
    #[case("double but alone", true, 1, FieldPosition::Center)]
    #[case("single layout", false, 6, FieldPosition::Center)]
    fn test_left_needs_a_partner(
        #[case] desc: &str,
        #[case] wants_double: bool,
        #[case] battle_eligible: usize,
        #[case] expected: FieldPosition,
    ) {
        assert_eq!(
            assign_position(wants_double, battle_eligible),
            expected,
            "{}",
            desc
        );
    }
}
