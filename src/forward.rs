//! The graph connector piping emissions between units.

use std::rc::Rc;

use crate::scope::Scope;
use crate::unit::{Effect, Event, Store, Unit};

/// A unit payloads can be pushed into within a scope.
///
/// This is the receiving half of [`forward`]: events emit the payload,
/// effects run with it, stores replace their scope-local value with it.
pub trait Target<T> {
    /// Delivers `payload` into this unit within `scope`.
    fn push(&self, scope: &Scope, payload: T);
}

impl<T: 'static> Target<T> for Event<T> {
    fn push(&self, scope: &Scope, payload: T) {
        self.emit(scope, payload);
    }
}

impl<P: 'static, R: 'static> Target<P> for Effect<P, R> {
    fn push(&self, scope: &Scope, payload: P) {
        self.run(scope, payload);
    }
}

impl<T: Clone + 'static> Target<T> for Store<T> {
    fn push(&self, scope: &Scope, payload: T) {
        self.set(scope, payload);
    }
}

/// Pipes every emission of `from` into `to`, in whatever scope the emission
/// happens.
pub fn forward<T, S, D>(from: &S, to: &D)
where
    T: Clone + 'static,
    S: Unit<T>,
    D: Target<T> + Clone + 'static,
{
    let to = to.clone();
    from.subscribe_raw(Rc::new(move |scope: &Scope, payload: &T| {
        to.push(scope, payload.clone())
    }));
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn pipes_event_to_event() {
        let scope = Scope::new();
        let source = Event::<i32>::new("source");
        let sink = Event::<i32>::new("sink");
        forward(&source, &sink);
        let seen = Rc::new(RefCell::new(Vec::new()));
        sink.watch({
            let seen = seen.clone();
            move |n| seen.borrow_mut().push(*n)
        });
        source.emit(&scope, 4);
        assert_eq!(*seen.borrow(), vec![4]);
    }

    #[test]
    fn pipes_event_to_store() {
        let scope = Scope::new();
        let source = Event::<i32>::new("source");
        let latest = Store::new("latest", 0);
        forward(&source, &latest);
        source.emit(&scope, 9);
        assert_eq!(latest.get(&scope), 9);
        assert_eq!(latest.initial(), 0);
    }
}
