#[cfg(test)]
mod tests {
    use crate::battle::action_queue::FixedTurnOrder;
    use crate::battle::conditions::{PokemonCondition, PokemonConditionType};
    use crate::battle::engine::BattleEngine;
    use crate::battle::state::{ActionFailureReason, BattleEvent, BattleState, GameState};
    use crate::battle::status::FixedStatusEvaluator;
    use crate::battle::tests::common::{
        create_double_battle, create_test_battle, last_move, move_users, on_field, ordered_engine,
        outcomes, play_turn, pp, test_config, test_engine, TestPokemonBuilder,
    };
    use crate::errors::{IneligibleReason, ReplayFailure};
    use crate::player::PlayerAction;
    use crate::pokemon::{Ability, PokemonInst, StatusCondition};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use schema::BattlerIndex::{self, Enemy, Enemy2, Player, Player2};
    use schema::{Move, MoveResult};

    // Amoonguss: Instruct, Protect, Splash, Purify
    fn amoonguss() -> PokemonInst {
        TestPokemonBuilder::new("Amoonguss", 300)
            .with_speed(30)
            .with_moves(vec![Move::Instruct, Move::Protect, Move::Splash, Move::Purify])
            .build()
    }

    // Lucario: SonicBoom, GigatonHammer, Protect, Splash
    fn lucario() -> PokemonInst {
        TestPokemonBuilder::new("Lucario", 250)
            .with_speed(90)
            .with_moves(vec![Move::SonicBoom, Move::GigatonHammer, Move::Protect, Move::Splash])
            .build()
    }

    // Kartana: SonicBoom, HyperBeam, Substitute, Splash
    fn kartana() -> PokemonInst {
        TestPokemonBuilder::new("Kartana", 250)
            .with_speed(109)
            .with_moves(vec![Move::SonicBoom, Move::HyperBeam, Move::Substitute, Move::Splash])
            .build()
    }

    // Avalugg: Splash, Disable, Purify
    fn avalugg() -> PokemonInst {
        TestPokemonBuilder::new("Avalugg", 150)
            .with_speed(28)
            .with_moves(vec![Move::Splash, Move::Disable, Move::Purify])
            .build()
    }

    fn double_battle(kartana: PokemonInst) -> BattleState {
        create_double_battle(vec![amoonguss(), lucario()], vec![kartana, avalugg()])
    }

    fn replay_failures(events: &[BattleEvent]) -> Vec<(BattlerIndex, ReplayFailure)> {
        events
            .iter()
            .filter_map(|event| match event {
                BattleEvent::ActionFailed {
                    battler,
                    reason: ActionFailureReason::ReplayFailed(failure),
                    ..
                } => Some((*battler, failure.clone())),
                _ => None,
            })
            .collect()
    }

    fn ineligible(reason: IneligibleReason) -> ReplayFailure {
        ReplayFailure::ActionIneligible(reason)
    }

    #[tokio::test]
    async fn test_instruct_repeats_target_attack() {
        let mut engine = test_engine(create_test_battle(amoonguss(), kartana()));

        let events = play_turn(
            &mut engine,
            &[
                (Enemy, PlayerAction::use_move_on(0, Player)),
                (Player, PlayerAction::use_move_on(0, Enemy)),
            ],
        )
        .await;

        // Sonic Boom lands twice: once chosen, once instructed.
        let amoonguss = on_field(&engine, Player);
        let kartana = on_field(&engine, Enemy);
        assert_eq!(amoonguss.current_hp(), 260);
        assert_eq!(pp(kartana, Move::SonicBoom), Some(18));
        assert_eq!(outcomes(kartana), vec![MoveResult::Success, MoveResult::Success]);
        assert_eq!(last_move(kartana).map(|m| m.targets.clone()), Some(vec![Player]));

        let instruct = last_move(amoonguss).expect("Amoonguss should have a move entry");
        assert_eq!(instruct.move_, Move::Instruct);
        assert_eq!(instruct.result, MoveResult::Success);
        assert_eq!(instruct.targets, vec![Enemy]);
        assert_eq!(pp(amoonguss, Move::Instruct), Some(14));

        assert!(events.contains(&BattleEvent::MoveInstructed {
            instructor: Player,
            target: Enemy,
            move_used: Move::SonicBoom,
        }));
        assert_eq!(
            move_users(&events),
            vec![
                (Enemy, Move::SonicBoom),
                (Player, Move::Instruct),
                (Enemy, Move::SonicBoom)
            ]
        );
    }

    #[tokio::test]
    async fn test_instruct_reaches_target_behind_substitute() {
        let mut engine = test_engine(create_test_battle(amoonguss(), kartana()));

        play_turn(
            &mut engine,
            &[(Enemy, PlayerAction::use_move(2)), (Player, PlayerAction::use_move(2))],
        )
        .await;
        assert_eq!(on_field(&engine, Enemy).current_hp(), 188);

        play_turn(
            &mut engine,
            &[
                (Enemy, PlayerAction::use_move_on(0, Player)),
                (Player, PlayerAction::use_move_on(0, Enemy)),
            ],
        )
        .await;

        let kartana = on_field(&engine, Enemy);
        assert_eq!(on_field(&engine, Player).current_hp(), 260);
        assert_eq!(pp(kartana, Move::SonicBoom), Some(18));
        assert_eq!(kartana.current_hp(), 188);
        assert_eq!(
            kartana.condition(PokemonConditionType::Substitute),
            Some(&PokemonCondition::Substitute { hp: 62 })
        );
    }

    #[tokio::test]
    async fn test_instruct_repeats_ally_attack() {
        let mut engine = test_engine(double_battle(kartana()));

        let events = play_turn(
            &mut engine,
            &[
                (Player, PlayerAction::use_move_on(0, Player2)),
                (Player2, PlayerAction::use_move_on(0, Enemy)),
                (Enemy, PlayerAction::use_move(3)),
                (Enemy2, PlayerAction::use_move(0)),
            ],
        )
        .await;

        let lucario = on_field(&engine, Player2);
        assert_eq!(on_field(&engine, Enemy).current_hp(), 210);
        assert_eq!(pp(lucario, Move::SonicBoom), Some(18));
        assert_eq!(outcomes(lucario), vec![MoveResult::Success, MoveResult::Success]);
        assert_eq!(last_move(lucario).map(|m| m.targets.clone()), Some(vec![Enemy]));
        // The replay runs inside Amoonguss's action, before Avalugg moves.
        assert_eq!(
            move_users(&events),
            vec![
                (Enemy, Move::Splash),
                (Player2, Move::SonicBoom),
                (Player, Move::Instruct),
                (Player2, Move::SonicBoom),
                (Enemy2, Move::Splash),
            ]
        );
    }

    #[tokio::test]
    async fn test_replay_redirects_when_original_target_fainted() {
        let weakened = TestPokemonBuilder::new("Kartana", 250)
            .with_speed(109)
            .with_hp(100)
            .with_moves(vec![Move::Splash])
            .build();
        let mut engine = ordered_engine(double_battle(weakened), &[Player2, Player]);

        let events = play_turn(
            &mut engine,
            &[
                (Player2, PlayerAction::use_move_on(1, Enemy)),
                (Player, PlayerAction::use_move_on(0, Player2)),
                (Enemy, PlayerAction::use_move(0)),
                (Enemy2, PlayerAction::use_move(0)),
            ],
        )
        .await;

        assert!(events.contains(&BattleEvent::TargetRedirected {
            battler: Player2,
            from: Enemy,
            to: Enemy2,
        }));
        let lucario = on_field(&engine, Player2);
        let targets: Vec<Vec<BattlerIndex>> = lucario
            .move_history()
            .iter()
            .filter_map(|entry| entry.as_move())
            .map(|m| m.targets.clone())
            .collect();
        assert_eq!(targets, vec![vec![Enemy], vec![Enemy2]]);
        assert_eq!(outcomes(lucario), vec![MoveResult::Success, MoveResult::Success]);
        assert_eq!(pp(lucario, Move::GigatonHammer), Some(3));

        // Both enemies went down before their own turn came up.
        assert!(on_field(&engine, Enemy).move_history().is_empty());
        assert!(on_field(&engine, Enemy2).is_fainted());
        assert_eq!(engine.state().game_state, GameState::Player1Win);
    }

    #[tokio::test]
    async fn test_friendly_fire_is_repeated() {
        let mut engine = ordered_engine(double_battle(kartana()), &[Player2, Player]);

        play_turn(
            &mut engine,
            &[
                (Player2, PlayerAction::use_move_on(0, Player)),
                (Player, PlayerAction::use_move_on(0, Player2)),
                (Enemy, PlayerAction::use_move(3)),
                (Enemy2, PlayerAction::use_move(0)),
            ],
        )
        .await;

        assert_eq!(on_field(&engine, Player).current_hp(), 260);
        assert_eq!(
            last_move(on_field(&engine, Player2)).map(|m| m.targets.clone()),
            Some(vec![Player])
        );
    }

    #[rstest]
    #[case("frozen", StatusCondition::Freeze, ActionFailureReason::IsFrozen)]
    #[case("fully paralyzed", StatusCondition::Paralysis, ActionFailureReason::IsParalyzed)]
    #[case("asleep", StatusCondition::Sleep(3), ActionFailureReason::IsAsleep)]
    #[tokio::test]
    async fn test_immobilized_target_cannot_be_instructed(
        #[case] desc: &str,
        #[case] status: StatusCondition,
        #[case] reason: ActionFailureReason,
    ) {
        let mut engine = test_engine(create_test_battle(amoonguss(), kartana()));

        play_turn(
            &mut engine,
            &[
                (Enemy, PlayerAction::use_move_on(0, Player)),
                (Player, PlayerAction::use_move(2)),
            ],
        )
        .await;
        if let Some(kartana) = engine.state_mut().pokemon_mut(Enemy) {
            kartana.status = Some(status);
        }

        let events = play_turn(
            &mut engine,
            &[
                (Enemy, PlayerAction::use_move_on(0, Player)),
                (Player, PlayerAction::use_move_on(0, Enemy)),
            ],
        )
        .await;

        let kartana = on_field(&engine, Enemy);
        assert_eq!(outcomes(kartana), vec![MoveResult::Success, MoveResult::None]);
        assert_eq!(pp(kartana, Move::SonicBoom), Some(19));

        let amoonguss = on_field(&engine, Player);
        assert_eq!(outcomes(amoonguss), vec![MoveResult::Success, MoveResult::Fail]);
        assert_eq!(amoonguss.current_hp(), 280);

        assert!(
            events.contains(&BattleEvent::ActionFailed {
                battler: Enemy,
                pokemon: "Kartana".to_string(),
                reason,
            }),
            "{}",
            desc
        );
        assert_eq!(
            replay_failures(&events),
            vec![(Player, ineligible(IneligibleReason::NoPriorAction))]
        );
    }

    #[tokio::test]
    async fn test_cure_after_immobilization_still_blocks_replay() {
        let mut engine = test_engine(double_battle(kartana()));
        play_turn(
            &mut engine,
            &[
                (Enemy, PlayerAction::use_move_on(0, Player)),
                (Enemy2, PlayerAction::use_move(0)),
                (Player, PlayerAction::use_move(2)),
                (Player2, PlayerAction::use_move(3)),
            ],
        )
        .await;
        if let Some(kartana) = engine.state_mut().pokemon_mut(Enemy) {
            kartana.status = Some(StatusCondition::Paralysis);
        }

        let mut engine_turn_two =
            engine.with_turn_order(FixedTurnOrder::new(vec![Enemy, Enemy2, Player]));
        let events = play_turn(
            &mut engine_turn_two,
            &[
                (Enemy, PlayerAction::use_move_on(0, Player)),
                (Enemy2, PlayerAction::use_move_on(2, Enemy)),
                (Player, PlayerAction::use_move_on(0, Enemy)),
                (Player2, PlayerAction::use_move(3)),
            ],
        )
        .await;

        let kartana = on_field(&engine_turn_two, Enemy);
        assert_eq!(kartana.status, None);
        assert_eq!(outcomes(kartana), vec![MoveResult::Success, MoveResult::None]);
        assert_eq!(
            last_move(on_field(&engine_turn_two, Player)).map(|m| (m.move_, m.result)),
            Some((Move::Instruct, MoveResult::Fail))
        );
        assert_eq!(
            replay_failures(&events),
            vec![(Player, ineligible(IneligibleReason::NoPriorAction))]
        );
    }

    #[tokio::test]
    async fn test_thawed_target_can_be_instructed() {
        let frozen = TestPokemonBuilder::new("Kartana", 250)
            .with_speed(109)
            .with_status(StatusCondition::Freeze)
            .with_moves(vec![Move::SonicBoom])
            .build();
        let mut engine = BattleEngine::new(create_test_battle(amoonguss(), frozen), test_config())
            .with_status_evaluator(FixedStatusEvaluator::new(false));

        let events = play_turn(
            &mut engine,
            &[
                (Enemy, PlayerAction::use_move_on(0, Player)),
                (Player, PlayerAction::use_move_on(0, Enemy)),
            ],
        )
        .await;

        assert!(events
            .iter()
            .any(|event| matches!(event, BattleEvent::PokemonStatusRemoved { target: Enemy, .. })));
        assert_eq!(on_field(&engine, Player).current_hp(), 260);
        assert_eq!(
            outcomes(on_field(&engine, Enemy)),
            vec![MoveResult::Success, MoveResult::Success]
        );
    }

    #[tokio::test]
    async fn test_last_pp_is_replayed_once() {
        let mut low_pp = kartana();
        if let Some(instance) = low_pp.move_instance_mut(Move::SonicBoom) {
            instance.pp = 2;
        }
        let instructing_lucario = TestPokemonBuilder::new("Lucario", 250)
            .with_speed(90)
            .with_moves(vec![Move::Instruct])
            .build();
        let state = create_double_battle(vec![amoonguss(), instructing_lucario], vec![low_pp, avalugg()]);
        let mut engine = ordered_engine(state, &[Enemy, Player, Player2]);

        let events = play_turn(
            &mut engine,
            &[
                (Enemy, PlayerAction::use_move_on(0, Player)),
                (Player, PlayerAction::use_move_on(0, Enemy)),
                (Player2, PlayerAction::use_move_on(0, Enemy)),
                (Enemy2, PlayerAction::use_move(0)),
            ],
        )
        .await;

        let kartana = on_field(&engine, Enemy);
        assert_eq!(pp(kartana, Move::SonicBoom), Some(0));
        assert_eq!(outcomes(kartana), vec![MoveResult::Success, MoveResult::Success]);
        assert_eq!(on_field(&engine, Player).current_hp(), 260);
        assert_eq!(
            last_move(on_field(&engine, Player)).map(|m| m.result),
            Some(MoveResult::Success)
        );
        assert_eq!(
            last_move(on_field(&engine, Player2)).map(|m| m.result),
            Some(MoveResult::Fail)
        );
        assert_eq!(
            replay_failures(&events),
            vec![(
                Player2,
                ReplayFailure::ResourceExhausted {
                    move_: Move::SonicBoom
                }
            )]
        );
    }

    #[tokio::test]
    async fn test_instruct_without_history_fails() {
        let mut engine = ordered_engine(create_test_battle(amoonguss(), kartana()), &[Player, Enemy]);

        let events = play_turn(
            &mut engine,
            &[
                (Player, PlayerAction::use_move_on(0, Enemy)),
                (Enemy, PlayerAction::use_move_on(0, Player)),
            ],
        )
        .await;

        assert_eq!(
            last_move(on_field(&engine, Player)).map(|m| m.result),
            Some(MoveResult::Fail)
        );
        assert_eq!(outcomes(on_field(&engine, Enemy)), vec![MoveResult::Success]);
        assert_eq!(on_field(&engine, Player).current_hp(), 280);
        assert_eq!(
            replay_failures(&events),
            vec![(Player, ineligible(IneligibleReason::NoPriorAction))]
        );
    }

    #[tokio::test]
    async fn test_disabled_move_fails_for_the_target() {
        let mut engine = ordered_engine(double_battle(kartana()), &[Enemy, Enemy2, Player, Player2]);

        let events = play_turn(
            &mut engine,
            &[
                (Enemy, PlayerAction::use_move_on(0, Player)),
                (Enemy2, PlayerAction::use_move_on(1, Enemy)),
                (Player, PlayerAction::use_move_on(0, Enemy)),
                (Player2, PlayerAction::use_move(3)),
            ],
        )
        .await;

        let kartana = on_field(&engine, Enemy);
        assert_eq!(outcomes(kartana), vec![MoveResult::Success, MoveResult::Fail]);
        assert_eq!(
            last_move(kartana).map(|m| (m.move_, m.targets.clone())),
            Some((Move::SonicBoom, vec![Player]))
        );
        assert_eq!(pp(kartana, Move::SonicBoom), Some(19));

        let amoonguss = on_field(&engine, Player);
        assert_eq!(amoonguss.current_hp(), 280);
        assert_eq!(last_move(amoonguss).map(|m| m.result), Some(MoveResult::Success));
        assert!(events.contains(&BattleEvent::ActionFailed {
            battler: Enemy,
            pokemon: "Kartana".to_string(),
            reason: ActionFailureReason::MoveDisabled,
        }));
    }

    #[tokio::test]
    async fn test_replay_into_protect_is_blocked_again() {
        let mut engine = ordered_engine(double_battle(kartana()), &[Player2, Enemy, Player]);

        let events = play_turn(
            &mut engine,
            &[
                (Player2, PlayerAction::use_move(2)),
                (Enemy, PlayerAction::use_move_on(0, Player2)),
                (Player, PlayerAction::use_move_on(0, Enemy)),
                (Enemy2, PlayerAction::use_move(0)),
            ],
        )
        .await;

        let kartana = on_field(&engine, Enemy);
        assert_eq!(outcomes(kartana), vec![MoveResult::Blocked, MoveResult::Blocked]);
        assert_eq!(pp(kartana, Move::SonicBoom), Some(18));
        assert_eq!(on_field(&engine, Player2).current_hp(), 250);
        assert_eq!(
            last_move(on_field(&engine, Player)).map(|m| m.result),
            Some(MoveResult::Success)
        );
        let blocked = events
            .iter()
            .filter(|event| matches!(event, BattleEvent::MoveBlocked { defender: Player2, .. }))
            .count();
        assert_eq!(blocked, 2);
    }

    #[tokio::test]
    async fn test_recharging_target_cannot_be_instructed() {
        let mut engine = test_engine(create_test_battle(amoonguss(), kartana()));

        let events = play_turn(
            &mut engine,
            &[
                (Enemy, PlayerAction::use_move_on(1, Player)),
                (Player, PlayerAction::use_move_on(0, Enemy)),
            ],
        )
        .await;
        assert!(on_field(&engine, Enemy).is_charging());
        assert_eq!(
            replay_failures(&events),
            vec![(Player, ineligible(IneligibleReason::TwoTurnMove))]
        );

        // Kartana's recharge turn is implied; only Amoonguss chooses.
        assert_eq!(engine.battlers_awaiting_action(), vec![Player]);
        let events = play_turn(&mut engine, &[(Player, PlayerAction::use_move_on(0, Enemy))]).await;

        let kartana = on_field(&engine, Enemy);
        assert_eq!(outcomes(kartana), vec![MoveResult::Success, MoveResult::None]);
        assert_eq!(pp(kartana, Move::HyperBeam), Some(4));
        assert!(!kartana.is_charging());

        let amoonguss = on_field(&engine, Player);
        assert_eq!(amoonguss.current_hp(), 150);
        assert_eq!(outcomes(amoonguss), vec![MoveResult::Fail, MoveResult::Fail]);
        assert_eq!(
            replay_failures(&events),
            vec![(Player, ineligible(IneligibleReason::NoPriorAction))]
        );
    }

    #[tokio::test]
    async fn test_dancer_copy_is_not_replayable() {
        let oricorio = TestPokemonBuilder::new("Oricorio", 260)
            .with_speed(93)
            .with_ability(Ability::Dancer)
            .with_moves(vec![Move::FieryDance, Move::Splash])
            .build();
        let instructor = TestPokemonBuilder::new("Amoonguss", 300)
            .with_speed(30)
            .with_moves(vec![Move::Instruct, Move::Splash])
            .build();
        let volcarona = TestPokemonBuilder::new("Volcarona", 300)
            .with_speed(100)
            .with_moves(vec![Move::FieryDance, Move::Splash])
            .build();
        let snorlax = TestPokemonBuilder::new("Snorlax", 400).with_speed(30).build();
        let state = create_double_battle(vec![oricorio, instructor], vec![volcarona, snorlax]);
        let mut engine = ordered_engine(state, &[Enemy, Player2, Player, Enemy2]);

        let events = play_turn(
            &mut engine,
            &[
                (Enemy, PlayerAction::use_move_on(0, Player2)),
                (Player2, PlayerAction::use_move_on(0, Player)),
                (Player, PlayerAction::use_move(1)),
                (Enemy2, PlayerAction::use_move(0)),
            ],
        )
        .await;

        assert!(events.contains(&BattleEvent::MoveCopied {
            battler: Player,
            pokemon: "Oricorio".to_string(),
            move_used: Move::FieryDance,
            copied_from: Enemy,
        }));
        assert_eq!(
            move_users(&events),
            vec![
                (Enemy, Move::FieryDance),
                (Player, Move::FieryDance),
                (Player2, Move::Instruct),
                (Player, Move::Splash),
                (Enemy2, Move::Splash),
            ]
        );

        let oricorio = on_field(&engine, Player);
        let copy = oricorio
            .move_history()
            .iter()
            .next()
            .and_then(|entry| entry.as_move())
            .expect("the copy should be recorded");
        assert!(copy.virtual_);
        assert_eq!(copy.targets, vec![Enemy]);
        assert_eq!(outcomes(oricorio), vec![MoveResult::Success, MoveResult::Success]);
        assert_eq!(pp(oricorio, Move::FieryDance), Some(10));

        assert_eq!(on_field(&engine, Enemy).current_hp(), 220);
        assert_eq!(on_field(&engine, Player2).current_hp(), 220);
        assert_eq!(
            replay_failures(&events),
            vec![(Player2, ineligible(IneligibleReason::VirtualCopy))]
        );
    }
}
