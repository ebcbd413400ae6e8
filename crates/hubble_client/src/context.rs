//! Cancellation and deadlines attached to every request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{HubbleError, Result};

/// Shared flag a caller flips to cancel requests that carry it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Per-request cancellation scope: an optional deadline plus an optional
/// cancel token.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<CancelToken>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().deadline(Instant::now() + timeout)
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// True when a cancel token is attached.
    pub fn is_cancellable(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn has_deadline(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Time left before the deadline, `None` without one.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fails if the context is cancelled or its deadline has passed.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(HubbleError::Cancelled);
        }
        if self.remaining().is_some_and(|left| left.is_zero()) {
            return Err(HubbleError::DeadlineExceeded);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_never_fails() {
        let ctx = Context::background();
        assert!(ctx.check().is_ok());
        assert!(!ctx.is_cancellable());
        assert!(ctx.remaining().is_none());
        assert!(!ctx.has_deadline());
    }

    #[test]
    fn test_cancel_token_shared_between_clones() {
        let token = CancelToken::new();
        let ctx = Context::background().cancel_token(token.clone());
        assert!(ctx.is_cancellable());
        assert!(ctx.check().is_ok());

        token.cancel();
        assert!(ctx.is_cancelled());
        assert!(matches!(ctx.check(), Err(HubbleError::Cancelled)));
    }

    #[test]
    fn test_expired_deadline() {
        let ctx = Context::background().deadline(Instant::now() - Duration::from_millis(1));
        assert!(matches!(ctx.check(), Err(HubbleError::DeadlineExceeded)));
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_earliest_deadline_wins() {
        let soon = Instant::now() + Duration::from_secs(1);
        let later = soon + Duration::from_secs(60);
        let ctx = Context::background().deadline(soon).deadline(later);
        assert!(ctx.remaining().unwrap() <= Duration::from_secs(1));
    }

    #[test]
    fn test_cancel_takes_precedence_over_deadline() {
        let token = CancelToken::new();
        token.cancel();
        let ctx = Context::with_timeout(Duration::ZERO).cancel_token(token);
        assert!(matches!(ctx.check(), Err(HubbleError::Cancelled)));
    }
}
