use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use pin_project_lite::pin_project;

use super::Scope;
use crate::task::{sleep, Sleep};

/// Drives a scope's tasks until none remain.
///
/// This future is created by the [`settle`] method on [`Scope`]. See its
/// documentation for more.
///
/// [`settle`]: Scope::settle
#[derive(Debug)]
#[must_use = "futures do nothing unless polled or .awaited"]
pub struct Settle {
    scope: Scope,
}

impl Settle {
    pub(crate) fn new(scope: Scope) -> Self {
        Self { scope }
    }
}

impl Future for Settle {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.scope.poll_tasks(cx) {
            0 => Poll::Ready(()),
            _ => Poll::Pending,
        }
    }
}

pin_project! {
    /// Drives a scope's tasks for a wall-clock window.
    ///
    /// This future is created by the [`run_for`] method on [`Scope`]. It
    /// completes when the window elapses, whether or not tasks remain
    /// pending.
    ///
    /// [`run_for`]: Scope::run_for
    #[derive(Debug)]
    #[must_use = "futures do nothing unless polled or .awaited"]
    pub struct RunFor {
        scope: Scope,
        #[pin]
        window: Sleep,
    }
}

impl RunFor {
    pub(crate) fn new(scope: Scope, duration: Duration) -> Self {
        Self {
            scope,
            window: sleep(duration),
        }
    }
}

impl Future for RunFor {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        this.scope.poll_tasks(cx);
        this.window.poll(cx).map(drop)
    }
}
