#![forbid(unsafe_code)]
#![deny(missing_debug_implementations)]
#![warn(missing_docs, future_incompatible, unreachable_pub)]

//! # Trailing-edge debounce for scoped reactive event graphs.
//!
//! This crate provides one reusable operator, [`debounce`], for graphs built
//! from composable units: [`Event`]s, async [`Effect`]s, and [`Store`]s.
//! Given any unit acting as a trigger and a timeout, `debounce` derives a new
//! event that fires with the trigger's latest payload once the trigger has
//! been quiet for the configured duration. Rapid repeated triggers collapse
//! into a single emission carrying the most recent value.
//!
//! Everything runs on a single-threaded cooperative loop: emissions are
//! delivered synchronously, and the only suspension point is the timer behind
//! each pending debounce window. Execution state lives in [`Scope`]s, so the
//! same graph definition can serve many isolated sessions concurrently:
//! a timer started in one scope is never cancelled by, and never emits into,
//! another scope.
//!
//! # Examples
//!
//! __Collapse a burst of emissions into one tick__
//!
//! ```
//! use quiesce::{debounce, DebounceOptions, Event, Scope, Unit};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! fn main() {
//!     async_io::block_on(async {
//!         let scope = Scope::new();
//!         let keystrokes = Event::<u32>::new("keystrokes");
//!         let quiet = debounce(&keystrokes, 40.0, DebounceOptions::default()).unwrap();
//!
//!         let last = Rc::new(Cell::new(None));
//!         quiet.watch({
//!             let last = last.clone();
//!             move |payload| last.set(Some(*payload))
//!         });
//!
//!         keystrokes.emit(&scope, 1);
//!         keystrokes.emit(&scope, 2);
//!         keystrokes.emit(&scope, 3);
//!         scope.settle().await;
//!
//!         assert_eq!(last.get(), Some(3));
//!     })
//! }
//! ```
//!
//! __Scopes keep parallel sessions independent__
//!
//! ```
//! use quiesce::{debounce, DebounceOptions, Event, Scope, Store};
//!
//! fn main() {
//!     async_io::block_on(async {
//!         let saved = Store::new("saved", 0);
//!         let edits = Event::<i32>::new("edits");
//!         let quiet = debounce(&edits, 10.0, DebounceOptions::default()).unwrap();
//!         saved.on(&quiet, |total, edit| total + edit);
//!
//!         let alice = Scope::new();
//!         let bob = Scope::new();
//!         alice.all_settled(&edits, 5).await;
//!         bob.all_settled(&edits, 7).await;
//!
//!         assert_eq!(saved.get(&alice), 5);
//!         assert_eq!(saved.get(&bob), 7);
//!         assert_eq!(saved.initial(), 0);
//!     })
//! }
//! ```
//!
//! # Cancellation
//!
//! The debounce protocol is cancel-and-restart: every trigger emission
//! synchronously drops the previously pending timer before scheduling a new
//! one. Cancellation is an explicit [`TaskHandle`] passed to
//! [`Scope::cancel`], never an error value travelling through the graph. A
//! cancelled timer simply produces no tick.

pub mod scope;
pub mod task;
pub mod unit;

mod debounce;
mod error;
mod forward;

pub use debounce::{debounce, DebounceOptions};
pub use error::Error;
pub use forward::{forward, Target};
pub use scope::{RunFor, Scope, Settle, TaskHandle};
pub use unit::{Effect, Event, Store, Subscription, Unit};

/// The `quiesce` prelude.
pub mod prelude {
    pub use super::forward::Target as _;
    pub use super::unit::Unit as _;
}
