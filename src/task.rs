//! The timer primitive backing debounce windows.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use async_io::Timer;
use pin_project_lite::pin_project;

/// Sleeps for the specified amount of time.
///
/// This is the only suspension point in the crate: a pending [`Sleep`] yields
/// to the event loop until its duration elapses or the future is dropped.
/// Dropping the future releases the underlying timer, which is how pending
/// debounce windows are cancelled.
pub fn sleep(dur: Duration) -> Sleep {
    Sleep {
        timer: Timer::after(dur),
        completed: false,
    }
}

pin_project! {
    /// Sleeps for the specified amount of time.
    #[must_use = "futures do nothing unless polled or .awaited"]
    #[derive(Debug)]
    pub struct Sleep {
        #[pin]
        timer: Timer,
        completed: bool,
    }
}

impl Future for Sleep {
    type Output = Instant;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        assert!(!self.completed, "future polled after completing");
        let this = self.project();
        match this.timer.poll(cx) {
            Poll::Ready(instant) => {
                *this.completed = true;
                Poll::Ready(instant)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::{Duration, Instant};

    #[test]
    fn sleeps_at_least_the_duration() {
        async_io::block_on(async {
            let start = Instant::now();
            super::sleep(Duration::from_millis(20)).await;
            assert!(start.elapsed() >= Duration::from_millis(20));
        })
    }
}
