use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use super::done::Done;
use super::error::ContextError;

/// Caller-owned execution context carrying a deadline and a cancellation signal
///
/// Cloning is cheap and every clone observes the same state. Stages only
/// query a context; expiring it is up to whoever created it, either by
/// calling [`Context::cancel`] or by letting the deadline pass.
///
/// # Example
/// ```rust,ignore
/// let ctx = Context::with_timeout(Duration::from_secs(5));
/// let request_ctx = ctx.child_with_timeout(Duration::from_millis(200));
///
/// assert!(!request_ctx.is_expired());
/// ctx.cancel();
/// assert_eq!(request_ctx.err(), Some(ContextError::Canceled));
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    token: CancellationToken,
    deadline: Option<Instant>,
    reason: OnceLock<ContextError>,
    parent: Option<Arc<Inner>>,
}

impl Inner {
    fn root(deadline: Option<Instant>) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline,
            reason: OnceLock::new(),
            parent: None,
        }
    }

    /// Liveness is re-evaluated on every call; only the outcome is latched
    fn err(&self) -> Option<ContextError> {
        if let Some(reason) = self.reason.get() {
            return Some(*reason);
        }

        if let Some(parent) = &self.parent
            && let Some(reason) = parent.err()
        {
            return Some(*self.reason.get_or_init(|| reason));
        }

        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Some(*self.reason.get_or_init(|| ContextError::DeadlineExceeded));
        }

        None
    }
}

impl Context {
    /// Context that never expires on its own
    pub fn background() -> Self {
        Self {
            inner: Arc::new(Inner::root(None)),
        }
    }

    /// Context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Context that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            inner: Arc::new(Inner::root(Some(deadline))),
        }
    }

    /// Derived context that expires together with `self`
    pub fn child(&self) -> Self {
        self.derive(None)
    }

    /// Derived context that expires after `timeout` or with `self`, whichever is first
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        self.derive(Some(Instant::now() + timeout))
    }

    /// Derived context that expires at `deadline` or with `self`, whichever is first
    pub fn child_with_deadline(&self, deadline: Instant) -> Self {
        self.derive(Some(deadline))
    }

    fn derive(&self, deadline: Option<Instant>) -> Self {
        let deadline = match (self.inner.deadline, deadline) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, own) => parent.or(own),
        };

        Self {
            inner: Arc::new(Inner {
                token: self.inner.token.child_token(),
                deadline,
                reason: OnceLock::new(),
                parent: Some(Arc::clone(&self.inner)),
            }),
        }
    }

    /// Expire this context (and every context derived from it)
    ///
    /// Has no effect on the reported reason if the context already expired.
    pub fn cancel(&self) {
        if self.inner.err().is_none() {
            self.inner.reason.get_or_init(|| ContextError::Canceled);
        }
        self.inner.token.cancel();
    }

    /// Why the context expired, or `None` while it is still live
    pub fn err(&self) -> Option<ContextError> {
        self.inner.err()
    }

    pub fn is_expired(&self) -> bool {
        self.err().is_some()
    }

    /// Effective deadline, including any inherited from a parent
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Resolves once the context expires
    pub fn done(&self) -> Done {
        Done::new(
            self.inner.token.clone().cancelled_owned(),
            self.inner.deadline.map(sleep_until),
        )
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
