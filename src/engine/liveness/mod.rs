//! Liveness polling for freshly started containers.
//!
//! The runtime reports status as a single-quoted word followed by a newline
//! (`'running'\n`). Matching is done on that exact text.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::poll::{PollFailure, Poller, Tick, drive};
use super::runtime::{CommandRunner, Invocation};
use super::scope::CancelScope;
use crate::error::ContainerError;

/// Go template passed to `inspect` to print the container status.
const STATUS_FORMAT: &str = "'{{.State.Status}}'";

/// Coarse lifecycle state derived from the runtime's status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessState {
    /// Created or otherwise not yet in a terminal state.
    Starting,
    /// Running and ready to be queried.
    Running,
    /// Dead, exited, paused or restarting.
    Failed,
}

impl LivenessState {
    /// Classify the raw output of the status inspection.
    ///
    /// Unknown statuses are treated as [`Self::Starting`] so that polling
    /// continues rather than succeeding by accident.
    ///
    /// # Example
    ///
    /// ```
    /// use fixtainer::engine::LivenessState;
    ///
    /// assert_eq!(LivenessState::from_status("'running'\n"), LivenessState::Running);
    /// assert_eq!(LivenessState::from_status("'exited'\n"), LivenessState::Failed);
    /// assert_eq!(LivenessState::from_status("'created'\n"), LivenessState::Starting);
    /// ```
    #[must_use]
    pub fn from_status(raw: &str) -> Self {
        let status = raw.strip_suffix('\n').unwrap_or(raw);
        match status {
            "'running'" => Self::Running,
            "'dead'" | "'exited'" | "'paused'" | "'restarting'" => Self::Failed,
            _ => Self::Starting,
        }
    }
}

struct LivenessPoller<R> {
    runner: Arc<R>,
    container_id: String,
    scope: CancelScope,
}

impl<R: CommandRunner + 'static> Poller for LivenessPoller<R> {
    type Output = ();

    async fn tick(&mut self) -> Result<Tick<()>, ContainerError> {
        let output = self
            .runner
            .run(
                Invocation::runtime(["inspect", "-f", STATUS_FORMAT, self.container_id.as_str()]),
                self.scope.clone(),
            )
            .await;

        if !output.succeeded() {
            return Err(ContainerError::InspectFailed {
                container_id: self.container_id.clone(),
                message: output.failure_detail(),
            });
        }

        match LivenessState::from_status(&output.stdout) {
            LivenessState::Running => Ok(Tick::Ready(())),
            LivenessState::Starting => {
                debug!(container_id = %self.container_id, status = %output.stdout.trim_end(), "container not running yet");
                Ok(Tick::Pending)
            }
            LivenessState::Failed => Err(ContainerError::LivenessFailedState {
                container_id: self.container_id.clone(),
                status: String::from(output.stdout.trim_end()),
                stdout: output.stdout,
                stderr: output.stderr,
            }),
        }
    }
}

/// Poll until `container_id` is running, has failed, or `scope` ends.
///
/// # Errors
///
/// Returns `ContainerError::LivenessFailedState` for a terminal status,
/// `ContainerError::InspectFailed` when the status cannot be read, and
/// `ContainerError::LivenessTimeout` when `scope` ends first.
pub(crate) async fn await_running<R: CommandRunner + 'static>(
    runner: &Arc<R>,
    container_id: &str,
    interval: Duration,
    scope: &CancelScope,
) -> Result<(), ContainerError> {
    let poller = LivenessPoller {
        runner: Arc::clone(runner),
        container_id: String::from(container_id),
        scope: scope.clone(),
    };

    drive(poller, interval, scope).await.map_err(|failure| match failure {
        PollFailure::Failed(error) => error,
        PollFailure::Expired(reason) => ContainerError::LivenessTimeout {
            container_id: String::from(container_id),
            reason,
        },
    })
}
