//! Cancellation scopes bounding runtime commands and poll loops.
//!
//! A [`CancelScope`] combines an explicit cancellation token with an optional
//! deadline. Poll loops check it at every tick boundary and runtime commands
//! are killed when it fires.

use std::fmt;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Why a [`CancelScope`] stopped admitting work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The scope was cancelled explicitly.
    Cancelled,
    /// The scope's deadline elapsed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("operation cancelled"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Cancellation signal with an optional deadline.
///
/// Cloning a scope shares its token: cancelling any clone cancels all of them.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use fixtainer::engine::CancelScope;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let scope = CancelScope::with_timeout(Duration::from_secs(30));
/// assert!(scope.expiry().is_none());
/// scope.cancel();
/// assert!(scope.expiry().is_some());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelScope {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelScope {
    /// Create a scope that only ends when cancelled explicitly.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Wrap an existing cancellation token without a deadline.
    #[must_use]
    pub const fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a scope that ends with this one or after `timeout`, whichever
    /// comes first. Cancelling the child does not cancel the parent.
    #[must_use]
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = self
            .deadline
            .map_or(candidate, |current| current.min(candidate));

        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Cancel this scope and every clone or child of it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Return the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Report whether the scope has already ended, without waiting.
    #[must_use]
    pub fn expiry(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            return Some(CancelReason::Cancelled);
        }

        self.deadline
            .filter(|deadline| Instant::now() >= *deadline)
            .map(|_| CancelReason::DeadlineExceeded)
    }

    /// Wait until the scope ends and report why.
    pub async fn expired(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.token.cancelled() => CancelReason::Cancelled,
                    () = sleep_until(deadline) => CancelReason::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                CancelReason::Cancelled
            }
        }
    }
}
