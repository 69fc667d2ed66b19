use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{next_unit_id, sealed::Sealed, Subscriber, Unit, UnitId};
use crate::scope::Scope;

/// A named state container with per-scope values.
///
/// The store definition carries an initial value; each [`Scope`] folds its
/// own current value independently, starting from a copy of the initial.
/// Updating the value in one scope never leaks into another, and never
/// touches the initial.
///
/// As a [`Unit`], a store exposes its updates: subscribing observes every new
/// value, in the scope it was written in.
pub struct Store<T> {
    inner: Rc<Inner<T>>,
}

struct Inner<T> {
    id: UnitId,
    name: String,
    initial: T,
    subscribers: RefCell<Vec<Subscriber<T>>>,
}

impl<T: Clone + 'static> Store<T> {
    /// Creates a new named store with an initial value.
    pub fn new(name: impl Into<String>, initial: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                id: next_unit_id(),
                name: name.into(),
                initial,
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Human-readable identifier for this store.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The value every fresh scope starts from.
    pub fn initial(&self) -> T {
        self.inner.initial.clone()
    }

    /// Current value within `scope`.
    pub fn get(&self, scope: &Scope) -> T {
        let initial = &self.inner.initial;
        scope.get_state(self.inner.id, || initial.clone())
    }

    /// Replaces the value within `scope` and notifies subscribers.
    pub fn set(&self, scope: &Scope, value: T) {
        scope.set_state(self.inner.id, value.clone());
        tracing::trace!(unit = %self.inner.name, scope = scope.id(), "store updated");
        let subscribers: Vec<Subscriber<T>> = self.inner.subscribers.borrow().clone();
        for subscriber in &subscribers {
            subscriber(scope, &value);
        }
    }

    /// Folds every emission of `trigger` into the scope-local value.
    pub fn on<P, U>(&self, trigger: &U, reducer: impl Fn(&T, &P) -> T + 'static) -> &Self
    where
        P: 'static,
        U: Unit<P>,
    {
        let store = self.clone();
        trigger.subscribe_raw(Rc::new(move |scope: &Scope, payload: &P| {
            let current = store.get(scope);
            store.set(scope, reducer(&current, payload));
        }));
        self
    }
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

impl<T> Sealed for Store<T> {}

impl<T: Clone + 'static> Unit<T> for Store<T> {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn subscribe_raw(&self, subscriber: Subscriber<T>) {
        self.inner.subscribers.borrow_mut().push(subscriber);
    }
}
