use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use pin_project_lite::pin_project;
use tokio::time::Sleep;
use tokio_util::sync::WaitForCancellationFutureOwned;

pin_project! {
    /// Future that resolves once a [`Context`](super::Context) expires
    ///
    /// Races explicit cancellation against the deadline timer, whichever
    /// fires first. A context without a deadline only resolves on cancel.
    #[must_use = "futures do nothing unless polled"]
    pub struct Done {
        #[pin]
        cancelled: WaitForCancellationFutureOwned,
        #[pin]
        deadline: Option<Sleep>,
    }
}

impl Done {
    pub(super) fn new(cancelled: WaitForCancellationFutureOwned, deadline: Option<Sleep>) -> Self {
        Self {
            cancelled,
            deadline,
        }
    }
}

impl Future for Done {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if this.cancelled.poll(cx).is_ready() {
            return Poll::Ready(());
        }

        match this.deadline.as_pin_mut() {
            Some(sleep) => sleep.poll(cx),
            None => Poll::Pending,
        }
    }
}
