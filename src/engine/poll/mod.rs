//! Shared driver for the engine's fixed-interval poll loops.
//!
//! Each loop runs as its own task. It ticks at a fixed interval, stops at the
//! first terminal outcome, and sends that outcome once over a one-shot
//! channel. The caller waits for the message or for its own scope to end.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::debug;

use super::scope::{CancelReason, CancelScope};
use crate::error::ContainerError;

/// Smallest interval accepted by the driver; `tokio` rejects a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// A polling phase that can be cancelled by the caller's scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPhase {
    /// Waiting for published host ports to appear.
    PortDiscovery,
    /// Waiting for a caller-supplied probe to succeed.
    Probe,
}

impl fmt::Display for WaitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PortDiscovery => f.write_str("port discovery"),
            Self::Probe => f.write_str("wait probe"),
        }
    }
}

/// Result of a single tick.
#[derive(Debug)]
pub(crate) enum Tick<T> {
    /// Not there yet; tick again.
    Pending,
    /// Terminal success.
    Ready(T),
}

/// Why a poll loop ended without a value.
#[derive(Debug)]
pub(crate) enum PollFailure {
    /// The scope ended first.
    Expired(CancelReason),
    /// A tick reported a terminal error.
    Failed(ContainerError),
}

/// One step of a poll loop.
pub(crate) trait Poller: Send + 'static {
    /// Value produced on success.
    type Output: Send + 'static;

    /// Perform one observation.
    fn tick(&mut self) -> impl Future<Output = Result<Tick<Self::Output>, ContainerError>> + Send + '_;
}

/// Run `poller` every `interval` until it resolves or `scope` ends.
///
/// The first tick happens one interval after the call, never immediately.
pub(crate) async fn drive<P: Poller>(
    poller: P,
    interval: Duration,
    scope: &CancelScope,
) -> Result<P::Output, PollFailure> {
    let (sender, receiver) = oneshot::channel();
    tokio::spawn(run_loop(poller, interval.max(MIN_INTERVAL), scope.clone(), sender));

    tokio::select! {
        biased;
        outcome = receiver => {
            // The sender is only dropped without a message when the runtime
            // is shutting down, which callers observe as cancellation.
            outcome.unwrap_or(Err(PollFailure::Expired(CancelReason::Cancelled)))
        }
        reason = scope.expired() => Err(PollFailure::Expired(reason)),
    }
}

async fn run_loop<P: Poller>(
    mut poller: P,
    interval: Duration,
    scope: CancelScope,
    sender: oneshot::Sender<Result<P::Output, PollFailure>>,
) {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let outcome = loop {
        tokio::select! {
            biased;
            reason = scope.expired() => break Err(PollFailure::Expired(reason)),
            _ = ticker.tick() => {}
        }

        match poller.tick().await {
            Ok(Tick::Pending) => {}
            Ok(Tick::Ready(value)) => break Ok(value),
            // A command interrupted by the scope surfaces as a failed tick;
            // report the interruption, not the symptom.
            Err(error) => match scope.expiry() {
                Some(reason) => break Err(PollFailure::Expired(reason)),
                None => break Err(PollFailure::Failed(error)),
            },
        }
    };

    if sender.send(outcome).is_err() {
        debug!("poll outcome dropped; caller already returned");
    }
}
