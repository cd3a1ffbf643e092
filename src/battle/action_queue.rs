use crate::battle::state::BattleState;
use crate::errors::ActionError;
use crate::move_data::MoveCatalogue;
use crate::player::PlayerAction;
use schema::{BattlerIndex, Move};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An action chosen for the current turn, bound to the battler performing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    pub battler: BattlerIndex,
    pub action: PlayerAction,
}

/// Actions in the order they will be executed.
pub type OrderedActionList = Vec<QueuedAction>;

/// Actions collected for the current turn, at most one per battler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionQueue {
    actions: Vec<QueuedAction>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, battler: BattlerIndex, action: PlayerAction) -> Result<(), ActionError> {
        if self.has_action(battler) {
            return Err(ActionError::AlreadySubmitted(battler));
        }
        self.actions.push(QueuedAction { battler, action });
        Ok(())
    }

    pub fn has_action(&self, battler: BattlerIndex) -> bool {
        self.actions.iter().any(|queued| queued.battler == battler)
    }

    pub fn get(&self, battler: BattlerIndex) -> Option<&PlayerAction> {
        self.actions
            .iter()
            .find(|queued| queued.battler == battler)
            .map(|queued| &queued.action)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedAction> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }
}

/// Computes the execution order of a turn's actions.
pub trait TurnOrderResolver: Send + Sync {
    fn order_actions(
        &self,
        queue: &ActionQueue,
        state: &BattleState,
        catalogue: &MoveCatalogue,
    ) -> OrderedActionList;
}

// A helper struct local to this implementation detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActionPriority {
    action_priority: i8, // Forfeit: 10, Switch: 6, Move: 0
    move_priority: i8,   // Priority from move data (e.g., Quick Attack)
    speed: u16,          // Pokémon's speed for tiebreaking
}

impl ActionPriority {
    /// Higher values act first.
    fn cmp_descending(&self, other: &Self) -> Ordering {
        other
            .action_priority
            .cmp(&self.action_priority)
            .then_with(|| other.move_priority.cmp(&self.move_priority))
            .then_with(|| other.speed.cmp(&self.speed))
    }
}

/// The move a queued `UseMove` will end up executing.
pub(crate) fn effective_move(state: &BattleState, battler: BattlerIndex, move_index: usize) -> Option<Move> {
    let pokemon = state.pokemon(battler)?;
    if let Some(charging) = &pokemon.summon_data.charging {
        return Some(charging.move_);
    }
    let instance = pokemon.moves.get(move_index)?.as_ref()?;
    if instance.pp == 0 {
        Some(Move::Struggle)
    } else {
        Some(instance.move_)
    }
}

fn calculate_action_priority(
    queued: &QueuedAction,
    state: &BattleState,
    catalogue: &MoveCatalogue,
) -> ActionPriority {
    let speed = state.pokemon(queued.battler).map(|p| p.speed).unwrap_or(0);
    match &queued.action {
        PlayerAction::Forfeit => ActionPriority {
            action_priority: 10, // Forfeit goes first, before everything else
            move_priority: 0,
            speed: 0,
        },
        PlayerAction::SwitchPokemon { .. } => ActionPriority {
            action_priority: 6, // Switches go before moves
            move_priority: 0,
            speed,
        },
        PlayerAction::UseMove { move_index, .. } => {
            let move_priority = effective_move(state, queued.battler, *move_index)
                .and_then(|move_| catalogue.get(move_))
                .map(|data| data.priority)
                .unwrap_or(0);
            ActionPriority {
                action_priority: 0,
                move_priority,
                speed,
            }
        }
    }
}

/// Orders by action class, then move priority, then speed, then battler index.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeedPriorityOrder;

impl TurnOrderResolver for SpeedPriorityOrder {
    fn order_actions(
        &self,
        queue: &ActionQueue,
        state: &BattleState,
        catalogue: &MoveCatalogue,
    ) -> OrderedActionList {
        let mut prioritized: Vec<(ActionPriority, &QueuedAction)> = queue
            .iter()
            .map(|queued| (calculate_action_priority(queued, state, catalogue), queued))
            .collect();

        prioritized.sort_by(|(a_priority, a), (b_priority, b)| {
            a_priority
                .cmp_descending(b_priority)
                .then_with(|| a.battler.cmp(&b.battler))
        });

        prioritized
            .into_iter()
            .map(|(_, queued)| queued.clone())
            .collect()
    }
}

/// Executes battlers in a fixed order, ignoring priority and speed. Battlers
/// missing from the list act afterwards in [`SpeedPriorityOrder`].
#[derive(Debug, Clone, Default)]
pub struct FixedTurnOrder {
    order: Vec<BattlerIndex>,
}

impl FixedTurnOrder {
    pub fn new(order: Vec<BattlerIndex>) -> Self {
        Self { order }
    }
}

impl TurnOrderResolver for FixedTurnOrder {
    fn order_actions(
        &self,
        queue: &ActionQueue,
        state: &BattleState,
        catalogue: &MoveCatalogue,
    ) -> OrderedActionList {
        let mut ordered: OrderedActionList = self
            .order
            .iter()
            .filter_map(|battler| {
                queue.get(*battler).map(|action| QueuedAction {
                    battler: *battler,
                    action: action.clone(),
                })
            })
            .collect();

        let rest = SpeedPriorityOrder.order_actions(queue, state, catalogue);
        ordered.extend(
            rest.into_iter()
                .filter(|queued| !self.order.contains(&queued.battler)),
        );
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::BattlePlayer;
    use crate::pokemon::PokemonInst;
    use pretty_assertions::assert_eq;
    use schema::BattleFormat;

    fn double_battle() -> BattleState {
        let player = BattlePlayer::new(
            "p1".to_string(),
            "Player 1".to_string(),
            vec![
                PokemonInst::new("Amoonguss", 100, 300, 30, &[Move::Instruct, Move::Tackle]),
                PokemonInst::new("Shuckle", 100, 200, 5, &[Move::SonicBoom, Move::QuickAttack]),
            ],
        );
        let enemy = BattlePlayer::new(
            "p2".to_string(),
            "Player 2".to_string(),
            vec![
                PokemonInst::new("Kartana", 100, 250, 109, &[Move::SonicBoom, Move::Protect]),
                PokemonInst::new("Kartana", 100, 250, 30, &[Move::SonicBoom]),
            ],
        );
        BattleState::new("order".to_string(), BattleFormat::Double, player, enemy)
    }

    fn battlers(list: &OrderedActionList) -> Vec<BattlerIndex> {
        list.iter().map(|queued| queued.battler).collect()
    }

    #[test]
    fn test_priority_then_speed_then_index() {
        let state = double_battle();
        let mut queue = ActionQueue::new();
        queue.submit(BattlerIndex::Player, PlayerAction::use_move(0)).unwrap();
        queue.submit(BattlerIndex::Player2, PlayerAction::use_move(1)).unwrap(); // Quick Attack
        queue.submit(BattlerIndex::Enemy, PlayerAction::use_move(0)).unwrap();
        queue.submit(BattlerIndex::Enemy2, PlayerAction::use_move(0)).unwrap();

        let ordered = SpeedPriorityOrder.order_actions(&queue, &state, MoveCatalogue::builtin());
        // Amoonguss and the second Kartana tie on speed; battler index breaks it.
        assert_eq!(
            battlers(&ordered),
            vec![
                BattlerIndex::Player2,
                BattlerIndex::Enemy,
                BattlerIndex::Player,
                BattlerIndex::Enemy2
            ]
        );
    }

    #[test]
    fn test_switch_and_forfeit_go_first() {
        let state = double_battle();
        let mut queue = ActionQueue::new();
        queue.submit(BattlerIndex::Enemy, PlayerAction::use_move(1)).unwrap(); // Protect
        queue
            .submit(BattlerIndex::Player, PlayerAction::SwitchPokemon { team_index: 1 })
            .unwrap();
        queue.submit(BattlerIndex::Enemy2, PlayerAction::Forfeit).unwrap();

        let ordered = SpeedPriorityOrder.order_actions(&queue, &state, MoveCatalogue::builtin());
        assert_eq!(
            battlers(&ordered),
            vec![BattlerIndex::Enemy2, BattlerIndex::Player, BattlerIndex::Enemy]
        );
    }

    #[test]
    fn test_fixed_order_overrides_priority() {
        let state = double_battle();
        let mut queue = ActionQueue::new();
        queue.submit(BattlerIndex::Enemy, PlayerAction::use_move(1)).unwrap(); // Protect
        queue.submit(BattlerIndex::Player, PlayerAction::use_move(0)).unwrap();
        queue.submit(BattlerIndex::Player2, PlayerAction::use_move(0)).unwrap();

        let order = FixedTurnOrder::new(vec![BattlerIndex::Player, BattlerIndex::Enemy]);
        let ordered = order.order_actions(&queue, &state, MoveCatalogue::builtin());
        assert_eq!(
            battlers(&ordered),
            vec![BattlerIndex::Player, BattlerIndex::Enemy, BattlerIndex::Player2]
        );
    }

    #[test]
    fn test_duplicate_submission_is_rejected() {
        let mut queue = ActionQueue::new();
        queue.submit(BattlerIndex::Player, PlayerAction::Forfeit).unwrap();
        assert_eq!(
            queue.submit(BattlerIndex::Player, PlayerAction::use_move(0)),
            Err(ActionError::AlreadySubmitted(BattlerIndex::Player))
        );
    }
}
