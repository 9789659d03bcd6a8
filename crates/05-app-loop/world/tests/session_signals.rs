//! Coverage for the session-level signal sources.

use pretty_assertions::assert_eq;
use signal_abi::ReadinessError;
use std::cell::RefCell;
use std::rc::Rc;
use step_scheduler::StepScheduler;
use world::{ContentDefinition, EntityId, GameContext, World};

fn world() -> (StepScheduler, World) {
    let _ = env_logger::builder().is_test(true).try_init();
    let scheduler = StepScheduler::default();
    (scheduler.clone(), World::new(scheduler))
}

/// Context-established subscribers hear about the context on the step after it appears.
#[test]
fn context_signal_delivers_after_establishment() {
    let (scheduler, world) = world();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    world
        .context_signal()
        .call_or_register(move |_context| sink.borrow_mut().push("context"));

    let context = GameContext::standard(scheduler.clone(), EntityId(7)).expect("context");
    world.establish_context(context).expect("establish");
    assert!(world.context().is_some());
    assert!(seen.borrow().is_empty());

    scheduler.run_step();
    assert_eq!(*seen.borrow(), vec!["context"]);
}

/// A world's context is established once.
#[test]
fn second_context_is_rejected() {
    let (scheduler, world) = world();
    let first = world
        .establish_context(GameContext::standard(scheduler.clone(), EntityId(1)).expect("ctx"))
        .expect("first");

    let err = world
        .establish_context(GameContext::standard(scheduler, EntityId(2)).expect("ctx"))
        .expect_err("second");
    assert_eq!(
        err,
        ReadinessError::AlreadySatisfied {
            signal: "context_established".into()
        }
    );
    let current = world.context().expect("context kept");
    assert!(Rc::ptr_eq(&first, &current));
    assert_eq!(current.ability().entity(), EntityId(1));
}

/// Content waiters registered through the context receive the loaded definition.
#[test]
fn content_waiters_receive_the_loaded_definition() {
    let (scheduler, world) = world();
    let context = world
        .establish_context(GameContext::standard(scheduler.clone(), EntityId(3)).expect("ctx"))
        .expect("establish");

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    context
        .content()
        .call_or_register_loaded(move |content| sink.borrow_mut().push(content.id.clone()));

    context
        .content()
        .begin_load(ContentDefinition::new("arena", "Arena"))
        .expect("begin");
    scheduler.run_step();
    assert!(seen.borrow().is_empty(), "nothing until the load completes");

    context.content().finish_load().expect("finish");
    scheduler.run_step();
    assert_eq!(*seen.borrow(), vec!["arena".to_string()]);
}

/// The ability gate's view tracks the three collaborators.
#[test]
fn ability_view_observes_grant_transitions() {
    let (scheduler, world) = world();
    let context = world
        .establish_context(GameContext::standard(scheduler.clone(), EntityId(9)).expect("ctx"))
        .expect("establish");
    let ability = context.ability();
    let view = ability.view();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    view.observe_transitions(move |ready| sink.borrow_mut().push(ready));

    ability.set_pawn_ready(true).expect("pawn");
    ability
        .handle_possession_change(None, Some(EntityId(9)))
        .expect("possess");
    ability.set_ability_system_attached(true).expect("asc");
    assert!(view.evaluate());

    ability
        .handle_possession_change(Some(EntityId(9)), None)
        .expect("unpossess");
    scheduler.run_until_idle(4);
    assert_eq!(*seen.borrow(), vec![true, false]);
    assert_eq!(ability.snapshot().missing().len(), 1);
}
