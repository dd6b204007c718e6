//! Conditional waits on a caller-supplied probe.
//!
//! A probe is an argv run either on the host or inside the container. Its
//! output is handed to a predicate once per tick until the predicate accepts
//! it. A probe that cannot be started at all ends the wait immediately.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::poll::{PollFailure, Poller, Tick, WaitPhase, drive};
use super::runtime::{CommandRunner, Invocation};
use super::scope::CancelScope;
use crate::config::WaitConfig;
use crate::error::ContainerError;

struct ProbePoller<R, P> {
    runner: Arc<R>,
    container_id: String,
    command: Vec<String>,
    in_container: bool,
    predicate: P,
    scope: CancelScope,
}

impl<R, P> ProbePoller<R, P> {
    fn invocation(&self) -> Invocation {
        if self.in_container {
            Invocation::InContainer {
                container_id: self.container_id.clone(),
                argv: self.command.clone(),
            }
        } else {
            Invocation::Host(self.command.clone())
        }
    }
}

impl<R, P> Poller for ProbePoller<R, P>
where
    R: CommandRunner + 'static,
    P: FnMut(&str, &str, i32) -> bool + Send + 'static,
{
    type Output = ();

    async fn tick(&mut self) -> Result<Tick<()>, ContainerError> {
        let output = self.runner.run(self.invocation(), self.scope.clone()).await;

        if output.is_unrunnable() {
            return Err(ContainerError::ProbeUnrunnable {
                container_id: self.container_id.clone(),
                message: output.failure_detail(),
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        if (self.predicate)(&output.stdout, &output.stderr, output.exit_code) {
            return Ok(Tick::Ready(()));
        }

        debug!(
            container_id = %self.container_id,
            exit_code = output.exit_code,
            "wait predicate not satisfied"
        );
        Ok(Tick::Pending)
    }
}

/// Everything needed to run one conditional wait.
pub(crate) struct ProbeRequest<'a> {
    pub(crate) container_id: &'a str,
    pub(crate) command: Vec<String>,
    pub(crate) config: &'a WaitConfig,
    pub(crate) interval: Duration,
}

/// Run the probe every `interval` until `predicate` accepts its output.
///
/// # Errors
///
/// Returns `ContainerError::ProbeUnrunnable` when the probe cannot be started
/// and `ContainerError::WaitCancelled` when `scope` ends first.
pub(crate) async fn wait_for<R, P>(
    runner: &Arc<R>,
    request: ProbeRequest<'_>,
    predicate: P,
    scope: &CancelScope,
) -> Result<(), ContainerError>
where
    R: CommandRunner + 'static,
    P: FnMut(&str, &str, i32) -> bool + Send + 'static,
{
    let poller = ProbePoller {
        runner: Arc::clone(runner),
        container_id: String::from(request.container_id),
        command: request.command,
        in_container: request.config.execute_in_container(),
        predicate,
        scope: scope.clone(),
    };

    drive(poller, request.interval, scope)
        .await
        .map_err(|failure| match failure {
            PollFailure::Failed(error) => error,
            PollFailure::Expired(reason) => ContainerError::WaitCancelled {
                container_id: String::from(request.container_id),
                phase: WaitPhase::Probe,
                reason,
            },
        })
}
