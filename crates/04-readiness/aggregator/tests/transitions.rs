//! Transition-notification semantics of the readiness aggregator.

use aggregator::presets::ability_grant::{self, ABILITY_SYSTEM_ATTACHED, PAWN_READY, POSSESSED};
use aggregator::{FlagMask, FlagName, ReadinessAggregator, ReadinessError, ReadinessPolicy};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use step_scheduler::StepScheduler;

fn ability_gate() -> (StepScheduler, ReadinessAggregator) {
    let _ = env_logger::builder().is_test(true).try_init();
    let scheduler = StepScheduler::default();
    let aggregator = ability_grant::builder(scheduler.clone())
        .build()
        .expect("ability preset");
    (scheduler, aggregator)
}

fn collect(aggregator: &ReadinessAggregator) -> Rc<RefCell<Vec<bool>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    aggregator.observe_transitions(move |value| sink.borrow_mut().push(value));
    seen
}

/// Three required flags set one by one produce a single false→true notification.
#[test]
fn all_required_flags_yield_one_transition() {
    let (scheduler, aggregator) = ability_gate();
    let seen = collect(&aggregator);

    assert_eq!(aggregator.set_flag(PAWN_READY, true), Ok(false));
    scheduler.run_step();
    assert_eq!(aggregator.set_flag(POSSESSED, true), Ok(false));
    scheduler.run_step();
    assert_eq!(aggregator.set_flag(ABILITY_SYSTEM_ATTACHED, true), Ok(true));
    assert!(seen.borrow().is_empty(), "notifications are never inline");

    scheduler.run_until_idle(4);
    assert_eq!(*seen.borrow(), vec![true]);
}

/// Clearing any required flag flips evaluate() at once and emits exactly one transition.
#[test]
fn clearing_a_required_flag_emits_one_transition() {
    let (scheduler, aggregator) = ability_gate();
    aggregator
        .set_flags(&[
            (ABILITY_SYSTEM_ATTACHED, true),
            (PAWN_READY, true),
            (POSSESSED, true),
        ])
        .expect("batch");
    let seen = collect(&aggregator);
    scheduler.run_step();
    assert_eq!(*seen.borrow(), vec![true], "late observer is told the current value");

    assert_eq!(aggregator.set_flag(POSSESSED, false), Ok(true));
    assert!(!aggregator.evaluate());
    assert_eq!(aggregator.set_flag(PAWN_READY, false), Ok(false));

    scheduler.run_until_idle(4);
    assert_eq!(*seen.borrow(), vec![true, false]);
}

/// Re-setting a flag to its current value is not a change at all.
#[test]
fn redundant_updates_do_not_notify() {
    let (scheduler, aggregator) = ability_gate();
    let seen = collect(&aggregator);
    let masks = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&masks);
    aggregator.observe_state(move |mask| sink.borrow_mut().push(mask));

    aggregator.set_flag(PAWN_READY, false).expect("noop");
    scheduler.run_until_idle(4);

    assert!(seen.borrow().is_empty());
    assert_eq!(*masks.borrow(), vec![FlagMask::NONE], "only the initial mask");
}

/// Undeclared names are rejected at the call site and leave the mask untouched.
#[test]
fn unknown_flag_rejects_the_whole_batch() {
    let (_scheduler, aggregator) = ability_gate();
    let typo = FlagName::new("posessed");

    let err = aggregator
        .set_flags(&[(PAWN_READY, true), (typo, true)])
        .expect_err("typo is undeclared");
    assert_eq!(err, ReadinessError::unknown_flag("ability_grant", "posessed"));
    assert_eq!(aggregator.mask(), FlagMask::NONE);
    assert!(aggregator.flag(typo).is_err());
}

/// Flags default to false; nothing is optimistic before a report arrives.
#[test]
fn unset_flags_default_to_false() {
    let (_scheduler, aggregator) = ability_gate();
    for flag in ability_grant::FLAGS {
        assert_eq!(aggregator.flag(flag), Ok(false));
    }
    assert!(!aggregator.evaluate());
    assert_eq!(aggregator.snapshot().missing(), ability_grant::FLAGS.to_vec());
}

/// A transition that reverts within the same step still reports both edges.
#[test]
fn flicker_within_a_step_reports_both_edges() {
    let (scheduler, aggregator) = ability_gate();
    aggregator
        .set_flags(&[(ABILITY_SYSTEM_ATTACHED, true), (PAWN_READY, true)])
        .expect("batch");
    let seen = collect(&aggregator);

    aggregator.set_flag(POSSESSED, true).expect("possess");
    aggregator.set_flag(POSSESSED, false).expect("unpossess");
    scheduler.run_step();

    assert_eq!(*seen.borrow(), vec![true, false]);
    assert!(!aggregator.evaluate());
}

/// Cancelling an observer before its delivery step suppresses the pending notification.
#[test]
fn cancelled_observer_hears_nothing() {
    let (scheduler, aggregator) = ability_gate();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let handle = aggregator.observe_transitions(move |value| sink.borrow_mut().push(value));

    aggregator
        .set_flags(&[
            (ABILITY_SYSTEM_ATTACHED, true),
            (PAWN_READY, true),
            (POSSESSED, true),
        ])
        .expect("batch");
    assert!(aggregator.cancel(handle));
    assert!(!aggregator.cancel(handle));

    scheduler.run_until_idle(4);
    assert!(seen.borrow().is_empty());
    assert_eq!(aggregator.observer_count(), 0);
}

/// An OR policy transitions on the first satisfied branch only.
#[test]
fn any_policy_transitions_once_per_edge() {
    const LOCAL: FlagName = FlagName::new("local_input");
    const REMOTE: FlagName = FlagName::new("remote_input");
    let scheduler = StepScheduler::default();
    let aggregator = ReadinessAggregator::builder("input", scheduler.clone())
        .flags([LOCAL, REMOTE])
        .policy(ReadinessPolicy::any_of([LOCAL, REMOTE]))
        .build()
        .expect("build");
    let seen = collect(&aggregator);

    assert_eq!(aggregator.set_flag(REMOTE, true), Ok(true));
    assert_eq!(aggregator.set_flag(LOCAL, true), Ok(false));
    assert_eq!(aggregator.set_flag(REMOTE, false), Ok(false));
    assert_eq!(aggregator.set_flag(LOCAL, false), Ok(true));

    scheduler.run_until_idle(4);
    assert_eq!(*seen.borrow(), vec![true, false]);
}

/// State observers see every mask change, transition observers only predicate edges.
#[test]
fn state_observers_see_every_mask() {
    let (scheduler, aggregator) = ability_gate();
    let masks = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&masks);
    aggregator.observe_state(move |mask| sink.borrow_mut().push(mask.bits()));

    aggregator.set_flag(ABILITY_SYSTEM_ATTACHED, true).expect("asc");
    scheduler.run_step();
    aggregator.set_flag(POSSESSED, true).expect("possess");
    scheduler.run_step();

    assert_eq!(*masks.borrow(), vec![0b000, 0b001, 0b101]);
}

/// Views observe and read without owning; a dropped aggregator reads as not ready.
#[test]
fn view_reads_through_and_degrades_when_owner_drops() {
    let (scheduler, aggregator) = ability_gate();
    let view = aggregator.view();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    view.observe_transitions(move |value| sink.borrow_mut().push(value));

    aggregator
        .set_flags(&[
            (ABILITY_SYSTEM_ATTACHED, true),
            (PAWN_READY, true),
            (POSSESSED, true),
        ])
        .expect("batch");
    assert!(view.evaluate());
    scheduler.run_step();
    assert_eq!(*seen.borrow(), vec![true]);

    drop(aggregator);
    assert!(!view.is_connected());
    assert!(!view.evaluate());
    assert!(view.snapshot().is_none());
    assert!(view.observe_transitions(|_| {}).is_dead());
}

/// Snapshots serialize into the debug JSON shape.
#[test]
fn snapshot_serializes_for_debug_dumps() {
    let (scheduler, aggregator) = ability_gate();
    aggregator.set_flag(PAWN_READY, true).expect("pawn");
    scheduler.run_step();

    let json = serde_json::to_value(aggregator.snapshot()).expect("serialize");
    assert_eq!(json["aggregator"], "ability_grant");
    assert_eq!(json["step"], 1);
    assert_eq!(json["mask"], 0b010);
    assert_eq!(json["flags"][1]["name"], "pawn_ready");
    assert_eq!(json["flags"][1]["set"], true);
    assert_eq!(json["may_proceed"], false);
}

/// Observer handles of one aggregator never cancel observers of another.
#[test]
fn foreign_observer_handles_are_rejected() {
    let (scheduler, first) = ability_gate();
    let second = ability_grant::builder(scheduler.clone())
        .build()
        .expect("second gate");
    let foreign = first.observe_transitions(|_| {});
    let seen = collect(&second);

    assert!(!second.cancel(foreign));
    assert_eq!(second.observer_count(), 1);

    second
        .set_flags(&[
            (ABILITY_SYSTEM_ATTACHED, true),
            (PAWN_READY, true),
            (POSSESSED, true),
        ])
        .expect("flags");
    scheduler.run_until_idle(4);
    assert_eq!(*seen.borrow(), vec![true]);
    assert!(first.cancel(foreign));
}
