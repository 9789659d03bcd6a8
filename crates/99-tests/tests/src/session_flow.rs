//! A whole session: milestones feed the ability gate while a caller waits for content.

use aggregator::presets::{pawn_ready, player_ready};
use aggregator::ReadinessAggregator;
use app::{App, ReadyActionState};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use world::{ContentDefinition, EntityId};

const HERO: EntityId = EntityId(1);

#[derive(Debug, PartialEq, Eq)]
enum Event {
    GrantAbilities(bool),
    ContentReady(u64),
}

/// Pawn milestones drive the ability gate, and the caller hears about content once.
#[test]
fn session_reaches_ready_in_order() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut app = App::default();
    let scheduler = app.scheduler().clone();
    let events = Rc::new(RefCell::new(Vec::new()));

    let sink = Rc::clone(&events);
    let steps = scheduler.clone();
    assert_eq!(
        app.wait_for_content_ready(move || {
            sink.borrow_mut()
                .push(Event::ContentReady(steps.current_step()))
        }),
        ReadyActionState::WaitingForContext
    );

    let context = app.establish_context(HERO).expect("context");
    let sink = Rc::clone(&events);
    context
        .ability()
        .observe_transitions(move |ready| sink.borrow_mut().push(Event::GrantAbilities(ready)));

    let pawn: ReadinessAggregator = pawn_ready::builder(scheduler.clone())
        .build()
        .expect("pawn preset");
    let gate = Rc::clone(&context);
    pawn.observe_transitions(move |ready| {
        gate.ability().set_pawn_ready(ready).expect("pawn_ready flag");
    });

    app.run_once();
    context
        .content()
        .begin_load(ContentDefinition::new("arena", "Arena"))
        .expect("begin");

    pawn.set_flags(&[
        (pawn_ready::GAMEPLAY, true),
        (pawn_ready::PAWN_DATA, true),
        (pawn_ready::ABILITY, true),
    ])
    .expect("milestones");
    pawn.set_flag(pawn_ready::POSSESSED, true).expect("possessed");
    context
        .ability()
        .handle_possession_change(None, Some(HERO))
        .expect("possess");
    context
        .ability()
        .set_ability_system_attached(true)
        .expect("asc");
    assert!(!context.ability().may_grant_abilities());

    app.run_once();
    assert!(context.ability().may_grant_abilities());
    context.content().finish_load().expect("finish");
    let finished_at = scheduler.current_step();
    app.run_until_idle(8);

    assert_eq!(
        *events.borrow(),
        vec![
            Event::GrantAbilities(true),
            Event::ContentReady(finished_at + 1),
        ]
    );
    assert_eq!(app.pending_actions(), 0);

    let snapshot = serde_json::to_value(context.ability().snapshot()).expect("json");
    assert_eq!(snapshot["may_proceed"], serde_json::Value::Bool(true));
}

/// Hopping out of and back into the entity flickers the gate within one step and reports both edges.
#[test]
fn possession_swap_reports_both_edges() {
    let app = App::default();
    let context = app.establish_context(HERO).expect("context");
    let ability = context.ability();
    ability.set_ability_system_attached(true).expect("asc");
    ability.set_pawn_ready(true).expect("pawn");
    ability
        .handle_possession_change(None, Some(HERO))
        .expect("possess");
    app.scheduler().run_until_idle(4);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    ability.observe_transitions(move |ready| sink.borrow_mut().push(ready));
    app.scheduler().run_step();
    assert_eq!(*seen.borrow(), vec![true]);

    let vehicle = EntityId(2);
    ability
        .handle_possession_change(Some(HERO), Some(vehicle))
        .expect("enter vehicle");
    ability
        .handle_possession_change(Some(vehicle), Some(HERO))
        .expect("leave vehicle");
    app.scheduler().run_step();
    assert_eq!(*seen.borrow(), vec![true, false, true]);
}

/// Player milestones pick up the ability gate and report what is still missing.
#[test]
fn player_ready_follows_the_ability_gate() {
    let app = App::default();
    let scheduler = app.scheduler().clone();
    let context = app.establish_context(HERO).expect("context");
    let player = Rc::new(
        player_ready::builder(scheduler.clone())
            .build()
            .expect("player preset"),
    );

    let sink = Rc::clone(&player);
    context.ability().observe_transitions(move |ready| {
        sink.set_flag(player_ready::ABILITY, ready)
            .expect("ability flag");
    });
    let counts = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&counts);
    player.observe_state(move |mask| seen.borrow_mut().push(mask.count()));

    player
        .set_flags(&[
            (player_ready::CONTROLLER, true),
            (player_ready::PLAYER_STATE, true),
            (player_ready::POSSESSION, true),
        ])
        .expect("player milestones");
    let ability = context.ability();
    ability.set_ability_system_attached(true).expect("asc");
    ability.set_pawn_ready(true).expect("pawn");
    ability
        .handle_possession_change(None, Some(HERO))
        .expect("possess");
    scheduler.run_until_idle(8);

    assert!(!player.evaluate());
    assert_eq!(player.snapshot().missing(), vec![player_ready::GAMEPLAY]);

    player
        .set_flag(player_ready::GAMEPLAY, true)
        .expect("gameplay");
    scheduler.run_until_idle(8);
    assert!(player.evaluate());
    assert_eq!(*counts.borrow(), vec![0, 3, 4, 5]);
}
