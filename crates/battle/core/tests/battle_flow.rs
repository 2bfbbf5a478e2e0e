//! End-to-end resolution scenarios driven through the public controller API.

use std::sync::Arc;

use battle_core::{
    BattleConfig, BattleController, BattleEvent, BattleInput, BattleOutcome, BattleRow,
    BattleState, Combatant, CombatantId, Direction4, EventRecorder, ParticipantType, Side, Skill,
    SkillBook, SkillEffect, SkillId, StateAlteredKind, StatKind, StatSheet, StatusKind,
    StatusTemplate, TargetingStrategy, TransitionKind,
};

const ALLY: CombatantId = CombatantId(1);
const ALLY_TWO: CombatantId = CombatantId(2);
const ENEMY: CombatantId = CombatantId(10);
const ENEMY_TWO: CombatantId = CombatantId(11);
const ENEMY_THREE: CombatantId = CombatantId(12);

fn unit(id: CombatantId, side: Side, hp: f32, skills: &[&str]) -> Combatant {
    let stats = StatSheet::new()
        .with(StatKind::Hp, hp)
        .with(StatKind::Ap, 20.0)
        .with(StatKind::CooldownMultiplier, 1.5)
        .with(StatKind::ExperienceReward, 12.0);
    Combatant::new(id, format!("unit{}", id.0), side, Arc::new(stats))
        .with_skills(skills.iter().map(|s| SkillId::from(*s)))
}

fn skills() -> SkillBook {
    [
        Skill::new("strike", "Strike")
            .with_cost(5.0)
            .with_cooldown(2.0)
            .with_effect(SkillEffect::HealthDelta { amount: -20.0 }),
        Skill::new("flurry", "Flurry")
            .with_hits(3)
            .with_effect(SkillEffect::HealthDelta { amount: -10.0 }),
        Skill::new("maul", "Maul").with_effect(SkillEffect::HealthDelta { amount: -40.0 }),
        Skill::new("sweep", "Sweep")
            .with_cost(5.0)
            .with_cooldown(2.0)
            .with_targeting(ParticipantType::Opposing, TargetingStrategy::All)
            .with_effect(SkillEffect::HealthDelta { amount: -20.0 }),
        Skill::new("fortify", "Fortify")
            .with_targeting(ParticipantType::Friendly, TargetingStrategy::SelfOnly)
            .with_effect(SkillEffect::ApplyStatus(StatusTemplate::new(
                StatusKind::StatModifier {
                    stat: StatKind::Hp,
                    value: 50.0,
                },
                Some(2.0),
            ))),
        Skill::new("mend", "Mend")
            .with_targeting(ParticipantType::Friendly, TargetingStrategy::SelfOnly)
            .with_effect(SkillEffect::HealthDelta { amount: 50.0 }),
        Skill::new("rally", "Rally")
            .with_targeting(ParticipantType::Friendly, TargetingStrategy::SelfOnly)
            .with_effect(SkillEffect::ApplyStatus(StatusTemplate::new(
                StatusKind::StatModifier {
                    stat: StatKind::PhysicalAdder,
                    value: 7.0,
                },
                Some(30.0),
            ))),
    ]
    .into_iter()
    .collect()
}

fn controller(
    allies: Vec<Combatant>,
    enemies: Vec<Combatant>,
    transition: TransitionKind,
) -> (BattleController, EventRecorder) {
    let mut controller = BattleController::new(BattleConfig::new().with_seed(5), skills()).unwrap();
    let recorder = EventRecorder::new();
    controller.add_listener(recorder.clone());
    let enemies = enemies.into_iter().map(|e| (e, BattleRow::Any)).collect();
    let unplaced = controller.setup(allies, enemies, transition).unwrap();
    assert!(unplaced.is_empty());

    assert_eq!(controller.advance(0.0), BattleState::Intro);
    assert_eq!(controller.advance(1.0), BattleState::Combat);
    (controller, recorder)
}

fn position(events: &[BattleEvent], pred: impl Fn(&BattleEvent) -> bool) -> Option<usize> {
    events.iter().position(pred)
}

fn count(events: &[BattleEvent], pred: impl Fn(&BattleEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

fn processed(event: &BattleEvent) -> bool {
    matches!(event, BattleEvent::SequenceProcessed(_))
}

fn hp_changed(id: CombatantId) -> impl Fn(&BattleEvent) -> bool {
    move |event| {
        matches!(
            event,
            BattleEvent::CombatantAltered {
                combatant,
                kind: StateAlteredKind::HpChanged { .. },
            } if *combatant == id
        )
    }
}

#[test]
fn selected_strike_resolves_and_wins() {
    let (mut battle, recorder) = controller(
        vec![unit(ALLY, Side::Ally, 100.0, &["strike"])],
        vec![unit(ENEMY, Side::Enemy, 20.0, &[])],
        TransitionKind::Advantage,
    );

    assert!(battle.set_selected_combatant(Some(ALLY)).unwrap());
    assert!(battle.set_selected_skill(Some(&"strike".into())).unwrap());
    assert_eq!(battle.selection().action().unwrap().targets(), &[ENEMY]);
    assert!(battle.handle_input(BattleInput::Execute));
    assert!(battle.selection().is_empty());
    assert_eq!(battle.queue_len(), 1);

    battle.advance(0.016);

    let enemy = battle.combatant(ENEMY).unwrap();
    assert_eq!(enemy.hp(), enemy.max_hp() - 20.0);
    assert!(!enemy.is_alive());
    let ally = battle.combatant(ALLY).unwrap();
    assert_eq!(ally.ap(), ally.max_ap() - 5.0);
    assert_eq!(ally.cooldown(), 2.0 * 1.5);

    let events = recorder.events();
    assert_eq!(count(&events, processed), 1);
    let won = position(&events, |e| {
        matches!(
            e,
            BattleEvent::StateChanged {
                state: BattleState::Outro,
                outcome: BattleOutcome::Won,
                ..
            }
        )
    })
    .expect("outro with a win");
    assert!(position(&events, processed).unwrap() < won);
    assert_eq!(battle.outcome(), BattleOutcome::Won);
    assert_eq!(battle.experience_reward(), 12.0);

    assert_eq!(battle.advance(1.0), BattleState::Complete);
    assert_eq!(battle.queue_len(), 0);
}

#[test]
fn surviving_enemy_takes_instant_damage() {
    let (mut battle, _) = controller(
        vec![unit(ALLY, Side::Ally, 100.0, &["strike"])],
        vec![unit(ENEMY, Side::Enemy, 100.0, &[])],
        TransitionKind::Advantage,
    );
    assert!(battle.enqueue(ALLY, ENEMY, &"strike".into()).unwrap());
    assert!(!battle.combatant(ALLY).unwrap().is_ready());

    battle.advance(0.016);
    assert_eq!(battle.combatant(ENEMY).unwrap().hp(), 80.0);
    assert_eq!(battle.state(), BattleState::Combat);
    assert_eq!(battle.experience_reward(), 0.0);
}

#[test]
fn entry_against_a_fallen_recipient_is_skipped() {
    let (mut battle, recorder) = controller(
        vec![
            unit(ALLY, Side::Ally, 100.0, &["strike"]),
            unit(ALLY_TWO, Side::Ally, 100.0, &["strike"]),
        ],
        vec![
            unit(ENEMY, Side::Enemy, 20.0, &[]),
            unit(ENEMY_TWO, Side::Enemy, 100.0, &[]),
        ],
        TransitionKind::Advantage,
    );
    let strike = SkillId::from("strike");
    assert!(battle.enqueue(ALLY, ENEMY, &strike).unwrap());
    assert!(battle.enqueue(ALLY_TWO, ENEMY, &strike).unwrap());

    battle.advance(0.016);
    assert!(!battle.combatant(ENEMY).unwrap().is_alive());
    assert!(battle.is_halted());

    battle.advance(0.5);
    assert!(!battle.is_halted());
    assert_eq!(battle.queue_len(), 0);

    let second = battle.combatant(ALLY_TWO).unwrap();
    assert_eq!(second.ap(), 20.0);
    assert!(second.is_ready());
    assert_eq!(battle.combatant(ENEMY_TWO).unwrap().hp(), 100.0);
    assert_eq!(count(&recorder.events(), processed), 1);
    assert_eq!(battle.state(), BattleState::Combat);
}

#[test]
fn area_action_pays_once_and_stays_locked_until_its_last_entry() {
    let (mut battle, recorder) = controller(
        vec![
            unit(ALLY, Side::Ally, 100.0, &["sweep"]),
            unit(ALLY_TWO, Side::Ally, 100.0, &["maul"]),
        ],
        vec![
            unit(ENEMY, Side::Enemy, 40.0, &[]),
            unit(ENEMY_TWO, Side::Enemy, 100.0, &[]),
            unit(ENEMY_THREE, Side::Enemy, 100.0, &[]),
        ],
        TransitionKind::Advantage,
    );
    assert!(battle.enqueue(ALLY_TWO, ENEMY, &"maul".into()).unwrap());
    assert!(
        battle
            .enqueue_action(ALLY, &"sweep".into(), &[ENEMY, ENEMY_TWO, ENEMY_THREE])
            .unwrap()
    );
    assert_eq!(battle.queue_len(), 4);
    assert_eq!(battle.combatant(ALLY).unwrap().cooldown(), f32::INFINITY);

    // The maul kills the sweep's first recipient before it resolves.
    battle.advance(0.016);
    assert!(!battle.combatant(ENEMY).unwrap().is_alive());

    // Its cost passes to the next entry, which resolves on the same tick.
    battle.advance(0.5);
    let sender = battle.combatant(ALLY).unwrap();
    assert_eq!(sender.ap(), 15.0);
    assert_eq!(sender.cooldown(), f32::INFINITY);
    assert_eq!(battle.combatant(ENEMY_TWO).unwrap().hp(), 80.0);
    assert_eq!(battle.queue_len(), 1);

    battle.advance(0.5);
    let sender = battle.combatant(ALLY).unwrap();
    assert_eq!(battle.queue_len(), 0);
    assert_eq!(sender.ap(), 15.0);
    assert_eq!(sender.cooldown(), 2.0 * 1.5);
    assert_eq!(battle.combatant(ENEMY_THREE).unwrap().hp(), 80.0);

    let events = recorder.events();
    let ap_paid = count(&events, |e| {
        matches!(
            e,
            BattleEvent::CombatantAltered {
                combatant: ALLY,
                kind: StateAlteredKind::ApChanged { .. },
            }
        )
    });
    assert_eq!(ap_paid, 1);
    assert_eq!(count(&events, processed), 3);
}

#[test]
fn skipped_last_entry_still_applies_the_landed_cooldown() {
    let (mut battle, _) = controller(
        vec![
            unit(ALLY, Side::Ally, 100.0, &["sweep"]),
            unit(ALLY_TWO, Side::Ally, 100.0, &["maul"]),
        ],
        vec![
            unit(ENEMY, Side::Enemy, 40.0, &[]),
            unit(ENEMY_TWO, Side::Enemy, 100.0, &[]),
        ],
        TransitionKind::Advantage,
    );
    assert!(battle.enqueue(ALLY_TWO, ENEMY, &"maul".into()).unwrap());
    assert!(
        battle
            .enqueue_action(ALLY, &"sweep".into(), &[ENEMY_TWO, ENEMY])
            .unwrap()
    );

    battle.advance(0.016);
    battle.advance(0.5);
    assert_eq!(battle.combatant(ENEMY_TWO).unwrap().hp(), 80.0);
    assert_eq!(battle.combatant(ALLY).unwrap().cooldown(), f32::INFINITY);

    battle.advance(0.5);
    let sender = battle.combatant(ALLY).unwrap();
    assert_eq!(battle.queue_len(), 0);
    assert!(!battle.is_halted());
    assert_eq!(sender.ap(), 15.0);
    assert_eq!(sender.cooldown(), 2.0 * 1.5);
}

#[test]
fn multi_hit_applies_each_hit_after_the_delay() {
    let (mut battle, recorder) = controller(
        vec![unit(ALLY, Side::Ally, 100.0, &["flurry"])],
        vec![unit(ENEMY, Side::Enemy, 100.0, &[])],
        TransitionKind::Advantage,
    );
    assert!(battle.enqueue(ALLY, ENEMY, &"flurry".into()).unwrap());

    battle.advance(0.016);
    assert_eq!(battle.combatant(ENEMY).unwrap().hp(), 90.0);
    battle.advance(0.25);
    assert_eq!(battle.combatant(ENEMY).unwrap().hp(), 90.0);
    battle.advance(0.25);
    assert_eq!(battle.combatant(ENEMY).unwrap().hp(), 80.0);
    battle.advance(0.5);
    assert_eq!(battle.combatant(ENEMY).unwrap().hp(), 70.0);
    assert!(battle.is_halted());
    // Input cannot interleave with an in-flight sequence.
    assert!(!battle.handle_input(BattleInput::Cancel));

    battle.advance(0.5);
    assert!(!battle.is_halted());
    assert_eq!(count(&recorder.events(), hp_changed(ENEMY)), 3);
}

#[test]
fn hits_after_the_recipient_dies_are_skipped() {
    let (mut battle, recorder) = controller(
        vec![unit(ALLY, Side::Ally, 100.0, &["flurry"])],
        vec![
            unit(ENEMY, Side::Enemy, 15.0, &[]),
            unit(ENEMY_TWO, Side::Enemy, 100.0, &[]),
        ],
        TransitionKind::Advantage,
    );
    assert!(battle.enqueue(ALLY, ENEMY, &"flurry".into()).unwrap());

    for _ in 0..4 {
        battle.advance(0.5);
    }
    assert!(!battle.combatant(ENEMY).unwrap().is_alive());
    assert!(!battle.is_halted());
    assert_eq!(count(&recorder.events(), hp_changed(ENEMY)), 2);
    assert_eq!(battle.state(), BattleState::Combat);
}

#[test]
fn ally_hp_scrolls_toward_its_target() {
    let (mut battle, _) = controller(
        vec![unit(ALLY, Side::Ally, 100.0, &[])],
        vec![unit(ENEMY, Side::Enemy, 100.0, &["maul"])],
        TransitionKind::Disadvantage,
    );
    assert!(battle.enqueue(ENEMY, ALLY, &"maul".into()).unwrap());

    battle.advance(0.016);
    let ally = battle.combatant(ALLY).unwrap();
    assert_eq!(ally.hp(), 100.0);
    assert_eq!(ally.target_hp(), 60.0);

    battle.advance(0.5);
    assert!((battle.combatant(ALLY).unwrap().hp() - 80.0).abs() < 1e-3);
    battle.advance(0.5);
    assert_eq!(battle.combatant(ALLY).unwrap().hp(), 60.0);
}

#[test]
fn losing_the_last_ally_ends_in_defeat_despite_assists() {
    let (mut battle, recorder) = controller(
        vec![
            unit(ALLY, Side::Ally, 30.0, &[]),
            unit(ALLY_TWO, Side::Assist, 100.0, &[]),
        ],
        vec![unit(ENEMY, Side::Enemy, 100.0, &["maul"])],
        TransitionKind::Disadvantage,
    );
    assert!(battle.enqueue(ENEMY, ALLY, &"maul".into()).unwrap());

    battle.advance(0.016);
    assert!(battle.combatant(ALLY).unwrap().is_alive());
    battle.advance(0.6);
    assert_eq!(battle.state(), BattleState::Combat);
    battle.advance(0.6);

    assert_eq!(battle.outcome(), BattleOutcome::Lost);
    assert_eq!(battle.state(), BattleState::Outro);
    let deaths = count(&recorder.events(), |e| {
        matches!(
            e,
            BattleEvent::CombatantAltered {
                kind: StateAlteredKind::Died,
                ..
            }
        )
    });
    assert_eq!(deaths, 1);
}

#[test]
fn cancel_pauses_and_either_confirm_resumes() {
    let (mut battle, _) = controller(
        vec![unit(ALLY, Side::Ally, 100.0, &["strike"])],
        vec![unit(ENEMY, Side::Enemy, 100.0, &[])],
        TransitionKind::Advantage,
    );

    assert!(battle.set_selected_combatant(Some(ALLY)).unwrap());
    assert!(battle.handle_input(BattleInput::Cancel));
    assert!(battle.selection().is_empty());
    assert_eq!(battle.state(), BattleState::Combat);

    assert!(battle.handle_input(BattleInput::Cancel));
    assert_eq!(battle.state(), BattleState::PreCombat);
    assert!(battle.is_paused());
    assert_eq!(battle.advance(5.0), BattleState::PreCombat);
    assert!(!battle.combatant(ALLY).unwrap().is_in_combat());
    assert!(!battle.handle_input(BattleInput::Navigate(Direction4::Up)));

    assert!(battle.handle_input(BattleInput::Execute));
    assert_eq!(battle.state(), BattleState::Combat);
    assert!(battle.combatant(ALLY).unwrap().is_in_combat());
}

#[test]
fn navigation_walks_the_enemy_line() {
    let (mut battle, _) = controller(
        vec![unit(ALLY, Side::Ally, 100.0, &["strike"])],
        vec![
            unit(ENEMY, Side::Enemy, 100.0, &[]),
            unit(ENEMY_TWO, Side::Enemy, 100.0, &[]),
        ],
        TransitionKind::Advantage,
    );
    battle.set_selected_combatant(Some(ALLY)).unwrap();
    battle.set_selected_skill(Some(&"strike".into())).unwrap();
    let target = |b: &BattleController| b.selection().action().unwrap().targets()[0];

    assert_eq!(target(&battle), ENEMY);
    assert!(battle.handle_input(BattleInput::Navigate(Direction4::Down)));
    assert_eq!(target(&battle), ENEMY_TWO);
    assert!(battle.handle_input(BattleInput::Navigate(Direction4::Right)));
    assert_eq!(target(&battle), ENEMY);
    assert!(battle.handle_input(BattleInput::Navigate(Direction4::Up)));
    assert_eq!(target(&battle), ENEMY_TWO);

    assert!(battle.set_selected_target(ENEMY).unwrap());
    assert_eq!(target(&battle), ENEMY);
    assert!(!battle.set_selected_target(ALLY).unwrap());
    assert_eq!(target(&battle), ENEMY);
}

#[test]
fn status_modifier_lives_until_battle_end() {
    let (mut battle, _) = controller(
        vec![unit(ALLY, Side::Ally, 100.0, &["rally"])],
        vec![unit(ENEMY, Side::Enemy, 100.0, &[])],
        TransitionKind::Advantage,
    );
    assert!(battle.enqueue(ALLY, ALLY, &"rally".into()).unwrap());
    battle.advance(0.016);
    assert_eq!(battle.combatant(ALLY).unwrap().stat(StatKind::PhysicalAdder), 7.0);
    assert_eq!(battle.statuses().for_owner(ALLY).count(), 1);

    battle.remove_enemy(ENEMY).unwrap();
    assert_eq!(battle.outcome(), BattleOutcome::Won);
    battle.advance(1.0);
    assert_eq!(battle.state(), BattleState::Complete);
    assert!(battle.statuses().is_empty());
    assert_eq!(battle.combatant(ALLY).unwrap().stat(StatKind::PhysicalAdder), 0.0);
}

#[test]
fn expiring_max_hp_buff_pulls_hp_back_under_the_cap() {
    let (mut battle, recorder) = controller(
        vec![unit(ALLY, Side::Ally, 100.0, &["fortify", "mend"])],
        vec![unit(ENEMY, Side::Enemy, 100.0, &[])],
        TransitionKind::Advantage,
    );
    assert!(battle.enqueue(ALLY, ALLY, &"fortify".into()).unwrap());
    battle.advance(0.016);
    assert_eq!(battle.combatant(ALLY).unwrap().max_hp(), 150.0);

    assert!(battle.enqueue(ALLY, ALLY, &"mend".into()).unwrap());
    battle.advance(0.5);
    battle.advance(1.0);
    let ally = battle.combatant(ALLY).unwrap();
    assert_eq!(ally.hp(), 150.0);
    assert!(!ally.is_hp_rolling());
    recorder.take();

    battle.advance(1.0);
    let ally = battle.combatant(ALLY).unwrap();
    assert!(battle.statuses().for_owner(ALLY).next().is_none());
    assert_eq!(ally.max_hp(), 100.0);
    assert_eq!(ally.hp(), 100.0);
    assert_eq!(ally.target_hp(), 100.0);
    assert!(recorder.events().contains(&BattleEvent::CombatantAltered {
        combatant: ALLY,
        kind: StateAlteredKind::HpChanged {
            delta: -50.0,
            hp: 100.0,
        },
    }));
}

#[test]
fn cooldown_lock_freezes_the_owner() {
    let mut book = skills();
    book.insert(
        Skill::new("stun", "Stun").with_effect(SkillEffect::ApplyStatus(StatusTemplate::new(
            StatusKind::CooldownLock {
                cancel_on_damage_chance: 0.0,
            },
            Some(2.0),
        ))),
    );
    let mut battle = BattleController::new(BattleConfig::new(), book).unwrap();
    battle
        .setup(
            vec![unit(ALLY, Side::Ally, 100.0, &["stun"])],
            vec![(unit(ENEMY, Side::Enemy, 100.0, &[]), BattleRow::Top)],
            TransitionKind::Advantage,
        )
        .unwrap();
    battle.advance(0.0);
    battle.advance(1.0);

    assert!(battle.enqueue(ALLY, ENEMY, &"stun".into()).unwrap());
    battle.advance(0.016);
    let before = battle.combatant(ENEMY).unwrap().cooldown();
    battle.advance(1.0);
    assert_eq!(battle.combatant(ENEMY).unwrap().cooldown(), before);

    battle.advance(1.0);
    battle.advance(0.5);
    assert!(battle.combatant(ENEMY).unwrap().cooldown() < before);
}
