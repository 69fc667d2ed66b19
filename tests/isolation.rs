//! Scope and operator-instance isolation.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use async_io::block_on;
use quiesce::{debounce, DebounceOptions, Event, Scope, Store, Unit};

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn recorder<T: Copy + 'static>(unit: &impl Unit<T>) -> Rc<RefCell<Vec<T>>> {
    let calls = Rc::new(RefCell::new(Vec::new()));
    unit.watch({
        let calls = calls.clone();
        move |payload| calls.borrow_mut().push(*payload)
    });
    calls
}

#[test_log::test]
fn debounced_update_lands_in_the_scope() {
    block_on(async {
        let counter = Store::new("counter", 0);
        let trigger = Event::<i32>::new("trigger");
        let debounced = debounce(&trigger, 40.0, DebounceOptions::default()).unwrap();
        counter.on(&debounced, |count, _| count + 1);

        let scope = Scope::new();
        scope.all_settled(&trigger, 0).await;

        assert_eq!(counter.get(&scope), 1);
    })
}

#[test_log::test]
fn scopes_do_not_affect_each_other() {
    block_on(async {
        let counter = Store::new("counter", 0);
        let trigger = Event::<i32>::new("trigger");
        let debounced = debounce(&trigger, 40.0, DebounceOptions::default()).unwrap();
        counter.on(&debounced, |count, add| count + add);

        let scope_a = Scope::new();
        let scope_b = Scope::new();

        scope_a.all_settled(&trigger, 1).await;
        scope_b.all_settled(&trigger, 100).await;
        scope_a.all_settled(&trigger, 1).await;
        scope_b.all_settled(&trigger, 100).await;

        assert_eq!(counter.get(&scope_a), 2);
        assert_eq!(counter.get(&scope_b), 200);
    })
}

#[test_log::test]
fn initial_value_stays_untouched() {
    block_on(async {
        let counter = Store::new("counter", 0);
        let trigger = Event::<i32>::new("trigger");
        let debounced = debounce(&trigger, 40.0, DebounceOptions::default()).unwrap();
        counter.on(&debounced, |count, add| count + add);

        let scope = Scope::new();
        scope.all_settled(&trigger, 1).await;
        scope.all_settled(&trigger, 1).await;

        assert_eq!(counter.get(&scope), 2);
        assert_eq!(counter.initial(), 0);
    })
}

#[test_log::test]
fn triggering_one_scope_is_silent_in_another() {
    block_on(async {
        let trigger = Event::<i32>::new("trigger");
        let debounced = debounce(&trigger, 40.0, DebounceOptions::default()).unwrap();

        let scope_a = Scope::new();
        let scope_b = Scope::new();
        let heard_b = debounced.listen(&scope_b);

        trigger.emit(&scope_a, 5);
        scope_a.settle().await;
        scope_b.run_for(ms(80)).await;

        assert_eq!(heard_b.try_next(), None);
        assert_eq!(scope_b.pending(), 0);
    })
}

#[test_log::test]
fn operators_never_share_timers() {
    block_on(async {
        let scope = Scope::new();
        let fast_trigger = Event::<i32>::new("fast");
        let slow_trigger = Event::<i32>::new("slow");
        let fast = debounce(&fast_trigger, 40.0, DebounceOptions::default()).unwrap();
        let slow = debounce(&slow_trigger, 100.0, DebounceOptions::default()).unwrap();
        let fast_calls = recorder(&fast);
        let slow_calls = recorder(&slow);

        fast_trigger.emit(&scope, 1);
        slow_trigger.emit(&scope, 10);
        scope.run_for(ms(60)).await;
        assert_eq!(*fast_calls.borrow(), vec![1]);
        assert!(slow_calls.borrow().is_empty());

        fast_trigger.emit(&scope, 2);
        scope.run_for(ms(60)).await;
        assert_eq!(*fast_calls.borrow(), vec![1, 2]);
        assert_eq!(*slow_calls.borrow(), vec![10]);
    })
}
