//! Isolated execution scopes.
//!
//! A [`Scope`] is an independently-stateful instantiation of a shared graph
//! definition. Stores read and write their values per scope, and every timer
//! started by an operator is confined to the scope it was triggered in. This
//! is what lets one graph definition serve many concurrent logical sessions
//! without sharing timers or state.
//!
//! Scopes also own the in-flight async work of their units. Emitting into a
//! scope only queues that work; one of the driver futures, [`Scope::settle`]
//! or [`Scope::run_for`], must be awaited to make it progress.

mod drive;

pub use drive::{RunFor, Settle};

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use crate::forward::Target;

/// An isolated, independently-stateful instantiation of a graph definition.
///
/// Cloning a `Scope` yields another handle to the same instantiation; create
/// a fresh one with [`Scope::new`] to get an isolated session.
pub struct Scope {
    inner: Rc<Inner>,
}

struct Inner {
    id: u64,
    next_task_id: Cell<u64>,
    tasks: RefCell<Vec<Task>>,
    /// Ids cancelled while the driver had the task list checked out.
    doomed: RefCell<Vec<u64>>,
    polling: Cell<bool>,
    state: RefCell<HashMap<u64, Box<dyn Any>>>,
}

struct Task {
    id: u64,
    future: Pin<Box<dyn Future<Output = ()>>>,
}

/// Cancellation handle for a task spawned into a [`Scope`].
///
/// Task ids are never reused within a scope, so cancelling a finished or
/// already-cancelled task is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle {
    id: u64,
}

impl Scope {
    /// Creates a fresh scope with no state and no pending tasks.
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self {
            inner: Rc::new(Inner {
                id: NEXT.fetch_add(1, Ordering::Relaxed),
                next_task_id: Cell::new(0),
                tasks: RefCell::new(Vec::new()),
                doomed: RefCell::new(Vec::new()),
                polling: Cell::new(false),
                state: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.inner.id
    }

    pub(crate) fn downgrade(&self) -> WeakScope {
        WeakScope {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Number of in-flight tasks.
    pub fn pending(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    /// Queues a future onto this scope's task set.
    ///
    /// The future is not polled until one of the driver futures is awaited.
    pub(crate) fn spawn(&self, future: impl Future<Output = ()> + 'static) -> TaskHandle {
        let id = self.inner.next_task_id.get();
        self.inner.next_task_id.set(id + 1);
        self.inner.tasks.borrow_mut().push(Task {
            id,
            future: Box::pin(future),
        });
        tracing::trace!(scope = self.inner.id, task = id, "task spawned");
        TaskHandle { id }
    }

    /// Cancels a pending task, synchronously dropping its future.
    ///
    /// Dropping releases whatever the task was waiting on, so a cancelled
    /// timer can never resolve late. Cancelling a task that already finished
    /// or was already cancelled is a no-op.
    pub fn cancel(&self, handle: TaskHandle) {
        let mut tasks = self.inner.tasks.borrow_mut();
        if let Some(index) = tasks.iter().position(|task| task.id == handle.id) {
            tasks.remove(index);
            tracing::trace!(scope = self.inner.id, task = handle.id, "task cancelled");
        } else if self.inner.polling.get() {
            // The driver has the task list checked out; mark the id so the
            // task is dropped as soon as the list is handed back.
            self.inner.doomed.borrow_mut().push(handle.id);
        }
    }

    /// Drives this scope's tasks until none remain.
    ///
    /// This is how a caller waits for everything a trigger set in motion,
    /// including pending debounce timers, to finish.
    pub fn settle(&self) -> Settle {
        Settle::new(self.clone())
    }

    /// Drives this scope's tasks for a wall-clock window.
    ///
    /// Completes once the window elapses, whether or not tasks remain
    /// pending. Useful for letting part of a debounce window pass before
    /// triggering again.
    pub fn run_for(&self, duration: Duration) -> RunFor {
        RunFor::new(self.clone(), duration)
    }

    /// Pushes `payload` into `unit` within this scope, then settles.
    pub async fn all_settled<T, D>(&self, unit: &D, payload: T)
    where
        D: Target<T>,
    {
        unit.push(self, payload);
        self.settle().await;
    }

    /// Polls every pending task once, absorbing completions, cancellations,
    /// and spawns they cause. Returns the number of tasks still pending.
    pub(crate) fn poll_tasks(&self, cx: &mut Context<'_>) -> usize {
        loop {
            let batch = std::mem::take(&mut *self.inner.tasks.borrow_mut());
            if batch.is_empty() {
                break;
            }
            self.inner.polling.set(true);
            let mut progressed = false;
            let mut still_pending = Vec::with_capacity(batch.len());
            for mut task in batch {
                if self.take_doomed(task.id) {
                    progressed = true;
                    continue;
                }
                match task.future.as_mut().poll(cx) {
                    Poll::Ready(()) => progressed = true,
                    Poll::Pending => still_pending.push(task),
                }
            }
            self.inner.polling.set(false);
            // A completion may have cancelled a task polled earlier in this
            // pass, or spawned new ones.
            let doomed = std::mem::take(&mut *self.inner.doomed.borrow_mut());
            if !doomed.is_empty() {
                still_pending.retain(|task| !doomed.contains(&task.id));
            }
            let spawned = std::mem::take(&mut *self.inner.tasks.borrow_mut());
            let has_new = !spawned.is_empty();
            let mut tasks = self.inner.tasks.borrow_mut();
            *tasks = still_pending;
            tasks.extend(spawned);
            drop(tasks);
            if !progressed && !has_new {
                break;
            }
        }
        self.inner.tasks.borrow().len()
    }

    fn take_doomed(&self, id: u64) -> bool {
        let mut doomed = self.inner.doomed.borrow_mut();
        match doomed.iter().position(|&doomed_id| doomed_id == id) {
            Some(index) => {
                doomed.remove(index);
                true
            }
            None => false,
        }
    }

    /// Reads the scope-local state under `key`, inserting `init()` first if
    /// the scope has none yet.
    pub(crate) fn get_state<S: Clone + 'static>(&self, key: u64, init: impl FnOnce() -> S) -> S {
        let mut state = self.inner.state.borrow_mut();
        let entry = state.entry(key).or_insert_with(|| Box::new(init()));
        entry
            .downcast_ref::<S>()
            .expect("scope state entry changed type")
            .clone()
    }

    pub(crate) fn set_state<S: 'static>(&self, key: u64, value: S) {
        self.inner.state.borrow_mut().insert(key, Box::new(value));
    }

    pub(crate) fn take_state<S: 'static>(&self, key: u64) -> Option<S> {
        let boxed = self.inner.state.borrow_mut().remove(&key)?;
        boxed.downcast::<S>().ok().map(|value| *value)
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Scope {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Weak handle held by spawned tasks so a dropped scope is not kept alive by
/// its own pending work.
pub(crate) struct WeakScope {
    inner: Weak<Inner>,
}

impl WeakScope {
    pub(crate) fn upgrade(&self) -> Option<Scope> {
        self.inner.upgrade().map(|inner| Scope { inner })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::task::sleep;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    #[test]
    fn cancel_drops_pending_task() {
        async_io::block_on(async {
            let scope = Scope::new();
            let fired = Rc::new(Cell::new(false));
            let handle = scope.spawn({
                let fired = fired.clone();
                async move {
                    sleep(Duration::from_millis(10)).await;
                    fired.set(true);
                }
            });
            scope.cancel(handle);
            assert_eq!(scope.pending(), 0);
            scope.run_for(Duration::from_millis(30)).await;
            assert!(!fired.get());
        })
    }

    #[test]
    fn cancel_after_completion_is_noop() {
        async_io::block_on(async {
            let scope = Scope::new();
            let handle = scope.spawn(async {});
            scope.settle().await;
            scope.cancel(handle);
            scope.cancel(handle);
            assert_eq!(scope.pending(), 0);
        })
    }

    #[test]
    fn state_is_per_scope() {
        let scope_a = Scope::new();
        let scope_b = Scope::new();
        scope_a.set_state(1, 10u32);
        assert_eq!(scope_a.get_state(1, || 0u32), 10);
        assert_eq!(scope_b.get_state(1, || 0u32), 0);
    }

    #[test]
    fn settle_waits_for_spawned_chains() {
        async_io::block_on(async {
            let scope = Scope::new();
            let done = Rc::new(Cell::new(false));
            let weak = scope.downgrade();
            let done_inner = done.clone();
            scope.spawn(async move {
                sleep(Duration::from_millis(5)).await;
                if let Some(scope) = weak.upgrade() {
                    scope.spawn(async move {
                        sleep(Duration::from_millis(5)).await;
                        done_inner.set(true);
                    });
                }
            });
            scope.settle().await;
            assert!(done.get());
        })
    }
}
