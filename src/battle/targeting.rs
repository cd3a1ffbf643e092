use crate::battle::state::BattleState;
use crate::errors::ActionError;
use crate::move_data::MoveData;
use schema::{BattlerIndex, MoveTarget, RedirectPolicy};

/// Targets a move will actually hit, plus any redirections applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetResolution {
    pub targets: Vec<BattlerIndex>,
    pub redirected: Vec<(BattlerIndex, BattlerIndex)>,
}

impl TargetResolution {
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Next eligible combatant on `original`'s side, scanning field slots in
/// order from the one after `original` and wrapping around. `user` is never
/// chosen.
pub fn redirect_target(
    state: &BattleState,
    original: BattlerIndex,
    user: BattlerIndex,
) -> Option<BattlerIndex> {
    let side = original.side();
    let slots = state.format.slots_per_side();
    (1..=slots)
        .map(|offset| (original.field_index() + offset) % slots)
        .filter_map(|field_index| BattlerIndex::new(side, field_index))
        .find(|candidate| *candidate != user && state.is_active(*candidate))
}

/// The first active opponent in slot order.
pub fn default_opponent(state: &BattleState, user: BattlerIndex) -> Option<BattlerIndex> {
    state
        .active_battlers_on(user.side().opponent())
        .into_iter()
        .next()
}

/// Targets for a freshly selected move, before redirection.
pub fn requested_targets(
    state: &BattleState,
    user: BattlerIndex,
    data: &MoveData,
    chosen: Option<BattlerIndex>,
) -> Vec<BattlerIndex> {
    match data.target {
        MoveTarget::User => vec![user],
        MoveTarget::AllNearEnemies => state.active_battlers_on(user.side().opponent()),
        MoveTarget::NearOther => chosen
            .or_else(|| default_opponent(state, user))
            .into_iter()
            .collect(),
    }
}

/// Re-validate `requested` against the current field.
///
/// Incapacitated targets of a single-target move are redirected when the
/// move's policy allows it; everything else that is no longer active is
/// dropped.
pub fn resolve_targets(
    state: &BattleState,
    user: BattlerIndex,
    data: &MoveData,
    requested: &[BattlerIndex],
) -> TargetResolution {
    let mut resolution = TargetResolution::default();

    if data.target == MoveTarget::User {
        if state.is_active(user) {
            resolution.targets.push(user);
        }
        return resolution;
    }

    let may_redirect = data.target.is_single_target() && data.redirect == RedirectPolicy::NextInSlotOrder;
    for &target in requested {
        let resolved = if state.is_active(target) && target != user {
            Some(target)
        } else if may_redirect {
            let redirected = redirect_target(state, target, user);
            if let Some(to) = redirected {
                resolution.redirected.push((target, to));
            }
            redirected
        } else {
            None
        };

        if let Some(target) = resolved {
            if !resolution.targets.contains(&target) {
                resolution.targets.push(target);
            }
        }
    }
    resolution
}

/// Check a target submitted with a `UseMove` action.
pub fn validate_target(
    state: &BattleState,
    user: BattlerIndex,
    data: &MoveData,
    target: BattlerIndex,
) -> Result<(), ActionError> {
    let invalid = ActionError::InvalidTarget {
        battler: user,
        target,
    };
    match data.target {
        MoveTarget::NearOther if target == user => Err(invalid),
        MoveTarget::NearOther if state.pokemon(target).is_none() => Err(invalid),
        MoveTarget::NearOther => Ok(()),
        // Fixed target shapes ignore the choice, but only the natural one is accepted.
        MoveTarget::User if target == user => Ok(()),
        MoveTarget::AllNearEnemies if target.is_opponent_of(user) => Ok(()),
        _ => Err(invalid),
    }
}
