//! Cancellation boundary for one dispatch
//!
//! A [`CancelScope`] combines an optional deadline with an explicit
//! cancellation token. The quorum collector races the next outcome against
//! [`CancelScope::fired`]; whichever completes first decides the result.
//! Firing the scope does not abort calls that are already in flight.

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a scope fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The deadline passed before quorum
    DeadlineExceeded,
    /// Someone called [`CancelScope::cancel`]
    Requested,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::DeadlineExceeded => write!(f, "deadline exceeded"),
            CancelReason::Requested => write!(f, "cancelled"),
        }
    }
}

/// Deadline and cancellation trigger for an `execute` call
///
/// Clones share the same token, so a clone handed to a signal handler can
/// cancel the dispatch it was cloned from.
#[derive(Debug, Clone, Default)]
pub struct CancelScope {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl CancelScope {
    /// Scope without a deadline; fires only when cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope that fires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Scope that fires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            token: CancellationToken::new(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fire the scope now
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the scope fires
    ///
    /// An explicit cancellation that is already pending wins over an expired
    /// deadline.
    pub async fn fired(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => CancelReason::Requested,
                    _ = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                CancelReason::Requested
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires() {
        let scope = CancelScope::with_timeout(Duration::from_secs(5));
        let start = Instant::now();

        assert_eq!(scope.fired().await, CancelReason::DeadlineExceeded);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_from_clone() {
        let scope = CancelScope::with_timeout(Duration::from_secs(60));
        let handle = scope.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            handle.cancel();
        });

        assert_eq!(scope.fired().await, CancelReason::Requested);
        assert!(scope.is_cancelled());
    }

    #[tokio::test]
    async fn test_no_deadline_waits_for_cancel() {
        let scope = CancelScope::new();
        assert!(scope.deadline().is_none());

        scope.cancel();
        assert_eq!(scope.fired().await, CancelReason::Requested);
    }
}
