use std::cell::RefCell;
use std::fmt;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures_core::stream::Stream;

use super::{sealed::Sealed, Subscriber, Unit};
use crate::scope::Scope;

/// A named emitter delivering payloads synchronously to its subscribers.
///
/// Events are definition-level: one `Event` can be emitted into any number of
/// [`Scope`]s, and every delivery is tagged with the scope it happened in.
/// Cloning an `Event` yields another handle to the same node.
pub struct Event<T> {
    inner: Rc<Inner<T>>,
}

struct Inner<T> {
    name: String,
    subscribers: RefCell<Vec<Subscriber<T>>>,
}

impl<T: 'static> Event<T> {
    /// Creates a new named event.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(Inner {
                name: name.into(),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Human-readable identifier for this event.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Emits `payload` within `scope`.
    ///
    /// Subscribers run synchronously, in registration order, before this
    /// method returns.
    pub fn emit(&self, scope: &Scope, payload: T) {
        tracing::trace!(unit = %self.inner.name, scope = scope.id(), "emit");
        // Snapshot so subscribers registered mid-emission do not disturb the
        // in-flight delivery.
        let subscribers: Vec<Subscriber<T>> = self.inner.subscribers.borrow().clone();
        for subscriber in &subscribers {
            subscriber(scope, &payload);
        }
    }

    /// Returns a stream of the payloads emitted in `scope`.
    ///
    /// Emissions in other scopes are not observed. Payloads emitted while the
    /// subscription exists are buffered until read.
    pub fn listen(&self, scope: &Scope) -> Subscription<T>
    where
        T: Clone,
    {
        let (sender, receiver) = async_channel::unbounded();
        let scope_id = scope.id();
        self.push_subscriber(Rc::new(move |scope: &Scope, payload: &T| {
            if scope.id() == scope_id {
                // The receiving side may be gone; late emissions are dropped.
                let _ = sender.try_send(payload.clone());
            }
        }));
        Subscription { receiver }
    }

    fn push_subscriber(&self, subscriber: Subscriber<T>) {
        self.inner.subscribers.borrow_mut().push(subscriber);
    }
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

impl<T> Sealed for Event<T> {}

impl<T: 'static> Unit<T> for Event<T> {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn subscribe_raw(&self, subscriber: Subscriber<T>) {
        self.push_subscriber(subscriber);
    }
}

/// A stream of payloads emitted by an [`Event`] within one scope.
///
/// Created by [`Event::listen`].
#[derive(Debug)]
pub struct Subscription<T> {
    receiver: async_channel::Receiver<T>,
}

impl<T> Subscription<T> {
    /// Waits for the next payload.
    pub async fn recv(&self) -> Option<T> {
        self.receiver.recv().await.ok()
    }

    /// Returns the next payload if one is already buffered.
    pub fn try_next(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}
