use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use super::{sealed::Sealed, Event, Subscriber, Unit};
use crate::scope::{Scope, TaskHandle};

type Handler<P, R> = Rc<dyn Fn(P) -> Pin<Box<dyn Future<Output = R>>>>;

/// A named asynchronous task unit.
///
/// Running an effect notifies its subscribers with the parameters
/// synchronously, then queues the installed handler onto the scope's task
/// set. When the handler completes, its result is emitted on the effect's
/// [`done`] event in the same scope. A run can be cancelled through the
/// returned [`TaskHandle`]; a cancelled run never reaches `done`.
///
/// As a [`Unit`], an effect exposes its invocations: subscribing observes the
/// parameters of every [`run`], which is what lets an effect act as a
/// debounce trigger.
///
/// [`done`]: Effect::done
/// [`run`]: Effect::run
pub struct Effect<P, R> {
    inner: Rc<Inner<P, R>>,
}

struct Inner<P, R> {
    name: String,
    handler: RefCell<Option<Handler<P, R>>>,
    started: RefCell<Vec<Subscriber<P>>>,
    done: Event<R>,
}

impl<P: 'static, R: 'static> Effect<P, R> {
    /// Creates a new named effect with no handler installed.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let done = Event::new(format!("{name}Done"));
        Self {
            inner: Rc::new(Inner {
                name,
                handler: RefCell::new(None),
                started: RefCell::new(Vec::new()),
                done,
            }),
        }
    }

    /// Human-readable identifier for this effect.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Installs the async handler backing this effect, replacing any
    /// previous one.
    pub fn use_handler<F, Fut>(&self, handler: F)
    where
        F: Fn(P) -> Fut + 'static,
        Fut: Future<Output = R> + 'static,
    {
        *self.inner.handler.borrow_mut() = Some(Rc::new(move |params| Box::pin(handler(params))));
    }

    /// Event fired with the handler's result every time a run completes.
    pub fn done(&self) -> &Event<R> {
        &self.inner.done
    }

    /// Invokes the effect in `scope`.
    ///
    /// Subscribers are notified with the parameters synchronously; the
    /// handler itself runs when the scope is next driven. The returned handle
    /// cancels this run when passed to [`Scope::cancel`].
    ///
    /// # Panics
    ///
    /// Panics if no handler has been installed with [`Effect::use_handler`].
    pub fn run(&self, scope: &Scope, params: P) -> TaskHandle {
        tracing::trace!(unit = %self.inner.name, scope = scope.id(), "effect run");
        let subscribers: Vec<Subscriber<P>> = self.inner.started.borrow().clone();
        for subscriber in &subscribers {
            subscriber(scope, &params);
        }
        let handler = self.inner.handler.borrow().clone();
        let Some(handler) = handler else {
            panic!("effect `{}` run without a handler", self.inner.name);
        };
        let future = handler(params);
        let done = self.inner.done.clone();
        let weak = scope.downgrade();
        scope.spawn(async move {
            let result = future.await;
            if let Some(scope) = weak.upgrade() {
                done.emit(&scope, result);
            }
        })
    }
}

impl<P, R> Clone for Effect<P, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P, R> fmt::Debug for Effect<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

impl<P, R> Sealed for Effect<P, R> {}

impl<P: 'static, R: 'static> Unit<P> for Effect<P, R> {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn subscribe_raw(&self, subscriber: Subscriber<P>) {
        self.inner.started.borrow_mut().push(subscriber);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn done_fires_with_result() {
        async_io::block_on(async {
            let scope = Scope::new();
            let double = Effect::<i32, i32>::new("double");
            double.use_handler(|n| async move { n * 2 });
            let seen = Rc::new(RefCell::new(Vec::new()));
            double.done().watch({
                let seen = seen.clone();
                move |n| seen.borrow_mut().push(*n)
            });
            double.run(&scope, 21);
            assert!(seen.borrow().is_empty());
            scope.settle().await;
            assert_eq!(*seen.borrow(), vec![42]);
        })
    }

    #[test]
    fn cancelled_run_never_reaches_done() {
        async_io::block_on(async {
            let scope = Scope::new();
            let noop = Effect::<(), ()>::new("noop");
            noop.use_handler(|_| async {});
            let seen = Rc::new(RefCell::new(0));
            noop.done().watch({
                let seen = seen.clone();
                move |_| *seen.borrow_mut() += 1
            });
            let handle = noop.run(&scope, ());
            scope.cancel(handle);
            scope.settle().await;
            assert_eq!(*seen.borrow(), 0);
        })
    }

    #[test]
    #[should_panic(expected = "run without a handler")]
    fn run_without_handler_panics() {
        let scope = Scope::new();
        Effect::<(), ()>::new("nope").run(&scope, ());
    }
}
