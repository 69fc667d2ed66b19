//! Units of the reactive graph: events, effects, and stores.
//!
//! Every unit is a named node that can be observed. [`Event`]s emit payloads,
//! [`Effect`]s run async work and announce their invocations and completions,
//! and [`Store`]s hold per-scope state and announce updates. The common
//! observation surface is the [`Unit`] trait, which is what operators like
//! [`debounce`] accept as a trigger.
//!
//! [`debounce`]: crate::debounce

mod effect;
mod event;
mod store;

pub use effect::Effect;
pub use event::{Event, Subscription};
pub use store::Store;

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::scope::Scope;

/// Unique identifier for a unit definition; also keys scope-local state.
pub(crate) type UnitId = u64;

pub(crate) fn next_unit_id() -> UnitId {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// A subscriber invoked for every emission of a unit, tagged with the scope
/// the emission happened in.
#[doc(hidden)]
pub type Subscriber<T> = Rc<dyn Fn(&Scope, &T)>;

#[doc(hidden)]
pub mod sealed {
    pub trait Sealed {}
}

pub(crate) use sealed::Sealed;

/// A named node in the reactive graph which emits payloads of type `T`.
///
/// Implemented by [`Event<T>`] (its emissions), [`Effect<P, R>`] as
/// `Unit<P>` (its invocations), and [`Store<T>`] (its updates). The trait is
/// sealed: only the unit types of this crate can act as triggers, which makes
/// "not a valid unit" unrepresentable at the type level.
pub trait Unit<T: 'static>: Sealed {
    /// Human-readable identifier for this unit.
    fn name(&self) -> &str;

    #[doc(hidden)]
    fn subscribe_raw(&self, subscriber: Subscriber<T>);

    /// Calls `watcher` with the payload of every emission, in every scope.
    ///
    /// For scope-filtered observation use [`Event::listen`] or a
    /// [`Store`].
    fn watch<F>(&self, watcher: F)
    where
        Self: Sized,
        F: Fn(&T) + 'static,
    {
        self.subscribe_raw(Rc::new(move |_scope: &Scope, payload: &T| watcher(payload)));
    }
}
