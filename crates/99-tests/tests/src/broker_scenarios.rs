//! Delivery guarantees of the one-shot broker, observed through the scheduler.

use broker::CallOrRegisterBroker;
use pretty_assertions::assert_eq;
use signal_abi::ReadinessError;
use std::cell::RefCell;
use std::rc::Rc;
use step_scheduler::StepScheduler;

type Log = Rc<RefCell<Vec<(&'static str, u32, u64)>>>;

fn record(log: &Log, scheduler: &StepScheduler, who: &'static str) -> impl FnOnce(u32) + 'static {
    let log = Rc::clone(log);
    let scheduler = scheduler.clone();
    move |value| log.borrow_mut().push((who, value, scheduler.current_step()))
}

/// Early and late subscribers both see the single payload, early ones first.
#[test]
fn early_and_late_subscribers_share_one_payload() {
    let _ = env_logger::builder().is_test(true).try_init();
    let scheduler = StepScheduler::default();
    let signal = CallOrRegisterBroker::new("content_loaded", scheduler.clone());
    let log: Log = Rc::default();

    signal.call_or_register(record(&log, &scheduler, "s1"));
    let fired_at = scheduler.current_step();
    assert_eq!(signal.fire(42), Ok(1));
    signal.call_or_register(record(&log, &scheduler, "s2"));
    assert!(log.borrow().is_empty(), "never delivered inline");

    assert_eq!(
        signal.fire(7),
        Err(ReadinessError::AlreadySatisfied {
            signal: "content_loaded".into()
        })
    );

    scheduler.run_until_idle(4);
    assert_eq!(
        *log.borrow(),
        vec![("s1", 42, fired_at + 1), ("s2", 42, fired_at + 1)]
    );
}

/// A cancel issued by a sibling in the delivering step suppresses the later callback.
#[test]
fn cancel_from_an_earlier_callback_wins() {
    let scheduler = StepScheduler::default();
    let signal = Rc::new(CallOrRegisterBroker::new("context", scheduler.clone()));
    let log: Log = Rc::default();
    let victim = Rc::new(RefCell::new(None));

    let owner = Rc::clone(&signal);
    let target = Rc::clone(&victim);
    let sink = Rc::clone(&log);
    signal.call_or_register(move |value: u32| {
        sink.borrow_mut().push(("canceller", value, 0));
        if let Some(handle) = target.borrow_mut().take() {
            assert!(owner.cancel(handle));
        }
    });
    let handle = signal.call_or_register(record(&log, &scheduler, "victim"));
    victim.replace(Some(handle));

    signal.fire(1).expect("fire");
    scheduler.run_until_idle(4);
    assert_eq!(*log.borrow(), vec![("canceller", 1, 0)]);
}
