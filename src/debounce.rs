//! The trailing-edge debounce operator.

use std::rc::Rc;
use std::time::Duration;

use crate::error::Error;
use crate::forward::forward;
use crate::scope::{Scope, TaskHandle};
use crate::task;
use crate::unit::{next_unit_id, Effect, Event, Unit};

/// Configuration accepted by [`debounce`].
#[derive(Debug, Clone, Default)]
pub struct DebounceOptions {
    /// Overrides the name used for the internally created units. Defaults to
    /// the trigger's own name. Affects identifiers only, never semantics.
    pub name: Option<String>,
}

impl DebounceOptions {
    /// Options carrying an explicit `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// Derives an event that fires with the trigger's latest payload once the
/// trigger has been quiet for `timeout_ms` milliseconds.
///
/// Every trigger emission cancels the previously pending timer, if any, and
/// starts a fresh one carrying the new payload; the window is measured from
/// the most recent emission. A burst of emissions arriving within the window
/// therefore collapses into a single tick carrying the last payload.
/// Cancellation is silent: a superseded timer produces no tick and no error.
///
/// The trigger may be any [`Unit`]: an [`Event`] (its emissions), an
/// [`Effect`] (its invocations), or a [`Store`](crate::Store) (its updates).
/// The returned event never fires synchronously, neither during construction
/// nor during `emit`.
///
/// Each [`Scope`](crate::Scope) keeps its own pending timer, so parallel
/// scopes of one graph debounce independently, as do separately constructed
/// operators.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `timeout_ms` is not a finite number
/// of milliseconds `>= 0` representable as a duration. Validation happens
/// before any wiring, so a failed call leaves the graph untouched.
///
/// # Examples
///
/// ```
/// use quiesce::{debounce, DebounceOptions, Event};
///
/// let search = Event::<String>::new("search");
/// let quiet = debounce(&search, 300.0, DebounceOptions::default()).unwrap();
/// assert_eq!(quiet.name(), "searchDebounceTick");
/// ```
pub fn debounce<T, U>(
    trigger: &U,
    timeout_ms: f64,
    options: DebounceOptions,
) -> Result<Event<T>, Error>
where
    T: Clone + 'static,
    U: Unit<T>,
{
    if !timeout_ms.is_finite() || timeout_ms < 0.0 {
        return Err(Error::InvalidArgument(format!(
            "timeout must be a finite number of milliseconds >= 0, got {timeout_ms}"
        )));
    }
    let timeout = Duration::try_from_secs_f64(timeout_ms / 1000.0)
        .map_err(|err| Error::InvalidArgument(format!("timeout out of range: {err}")))?;

    let name = options.name.unwrap_or_else(|| trigger.name().to_owned());
    let tick = Event::new(format!("{name}DebounceTick"));
    let timer: Effect<T, T> = Effect::new(format!("{name}DebounceTimer"));
    timer.use_handler(move |payload: T| async move {
        task::sleep(timeout).await;
        payload
    });
    forward(timer.done(), &tick);

    // Scope-local slot holding the cancellation handle of the pending timer
    // instance. At most one instance is live per operator per scope; the slot
    // is only ever touched here.
    let slot = next_unit_id();
    let timer = timer.clone();
    trigger.subscribe_raw(Rc::new(move |scope: &Scope, payload: &T| {
        if let Some(previous) = scope.take_state::<TaskHandle>(slot) {
            scope.cancel(previous);
        }
        let handle = timer.run(scope, payload.clone());
        scope.set_state(slot, handle);
    }));

    tracing::debug!(name = %name, timeout_ms, "debounce operator wired");
    Ok(tick)
}
