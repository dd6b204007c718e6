//! Discovery of published host ports.
//!
//! The runtime's `port` command prints one line per binding:
//!
//! ```text
//! 80/tcp -> 0.0.0.0:49155
//! 80/tcp -> [::]:49155
//! ```
//!
//! A port may be bound on several host addresses; all of them are kept in
//! the order the runtime printed them.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::poll::{PollFailure, Poller, Tick, WaitPhase, drive};
use super::runtime::{CommandRunner, Invocation};
use super::scope::CancelScope;
use crate::error::ContainerError;

/// Internal port number to the host addresses it is published on.
pub type PortMappings = BTreeMap<u16, Vec<String>>;

const BINDING_SEPARATOR: &str = " -> ";
const TCP_SUFFIX: &str = "/tcp";

/// Parse the output of the runtime's `port` command.
///
/// Blank lines are ignored and non-TCP bindings are skipped.
///
/// # Errors
///
/// Returns a description of the first line that does not match the
/// `<port>/tcp -> <host>:<port>` format.
///
/// # Example
///
/// ```
/// use fixtainer::engine::parse_published_ports;
///
/// let mappings = parse_published_ports("80/tcp -> 0.0.0.0:49155\n").unwrap();
/// assert_eq!(mappings[&80], vec![String::from("0.0.0.0:49155")]);
/// ```
pub fn parse_published_ports(stdout: &str) -> Result<PortMappings, String> {
    let mut mappings = PortMappings::new();

    for line in stdout.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let Some((container_side, host_address)) = line.split_once(BINDING_SEPARATOR) else {
            return Err(format!("unexpected port line: {line:?}"));
        };

        if container_side.contains('/') && !container_side.ends_with(TCP_SUFFIX) {
            debug!(binding = line, "skipping non-TCP port binding");
            continue;
        }

        let internal = container_side
            .strip_suffix(TCP_SUFFIX)
            .unwrap_or(container_side)
            .parse::<u16>()
            .map_err(|error| format!("invalid port in line {line:?}: {error}"))?;

        mappings
            .entry(internal)
            .or_default()
            .push(String::from(host_address));
    }

    Ok(mappings)
}

struct PortPoller<R> {
    runner: Arc<R>,
    container_id: String,
    scope: CancelScope,
}

impl<R: CommandRunner + 'static> Poller for PortPoller<R> {
    type Output = PortMappings;

    async fn tick(&mut self) -> Result<Tick<PortMappings>, ContainerError> {
        let output = self
            .runner
            .run(
                Invocation::runtime(["port", self.container_id.as_str()]),
                self.scope.clone(),
            )
            .await;

        if !output.succeeded() {
            return Err(self.failure(output.failure_detail()));
        }

        let mappings = parse_published_ports(&output.stdout).map_err(|message| self.failure(message))?;
        if mappings.is_empty() {
            return Ok(Tick::Pending);
        }
        Ok(Tick::Ready(mappings))
    }
}

impl<R> PortPoller<R> {
    fn failure(&self, message: String) -> ContainerError {
        ContainerError::PortDiscoveryFailed {
            container_id: self.container_id.clone(),
            message,
        }
    }
}

/// Poll until the runtime reports at least one published port.
///
/// The first non-empty mapping is final; it is never refreshed.
///
/// # Errors
///
/// Returns `ContainerError::PortDiscoveryFailed` when the query fails or its
/// output cannot be parsed, and `ContainerError::WaitCancelled` when `scope`
/// ends first.
pub(crate) async fn discover<R: CommandRunner + 'static>(
    runner: &Arc<R>,
    container_id: &str,
    interval: Duration,
    scope: &CancelScope,
) -> Result<PortMappings, ContainerError> {
    let poller = PortPoller {
        runner: Arc::clone(runner),
        container_id: String::from(container_id),
        scope: scope.clone(),
    };

    let mappings = drive(poller, interval, scope).await.map_err(|failure| match failure {
        PollFailure::Failed(error) => error,
        PollFailure::Expired(reason) => ContainerError::WaitCancelled {
            container_id: String::from(container_id),
            phase: WaitPhase::PortDiscovery,
            reason,
        },
    })?;

    info!(container_id, ports = ?mappings, "published ports adopted");
    Ok(mappings)
}
