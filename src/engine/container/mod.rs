//! Handle to a launched container.

use std::sync::Arc;

use super::ports::PortMappings;
use super::runtime::{CommandRunner, Invocation};
use super::scope::CancelScope;
use super::settings::EngineSettings;
use super::teardown::teardown;
use super::wait::{ProbeRequest, wait_for};
use crate::config::WaitConfig;
use crate::error::ContainerError;

/// A container that reached the running state.
///
/// Port mappings are captured once at launch and never refreshed. The handle
/// does not track whether the container has been stopped; operations after
/// [`Container::stop`] fail because the runtime no longer knows the id.
#[derive(Debug)]
pub struct Container<R> {
    id: String,
    port_mappings: PortMappings,
    runner: Arc<R>,
    settings: EngineSettings,
}

impl<R: CommandRunner + 'static> Container<R> {
    pub(crate) const fn new(
        id: String,
        port_mappings: PortMappings,
        runner: Arc<R>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            id,
            port_mappings,
            runner,
            settings,
        }
    }

    /// The runtime's identifier for this container.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Every published port and its host addresses.
    #[must_use]
    pub const fn port_mappings(&self) -> &PortMappings {
        &self.port_mappings
    }

    /// Host addresses (`<ip>:<port>`) that `port` is published on.
    ///
    /// Returns `None` when `port` was not published.
    #[must_use]
    pub fn exposed_port_addresses(&self, port: u16) -> Option<&[String]> {
        self.port_mappings.get(&port).map(Vec::as_slice)
    }

    /// Host port numbers that `port` is published on.
    ///
    /// Returns `None` when `port` was not published or an address does not
    /// end in a valid port number.
    #[must_use]
    pub fn exposed_ports(&self, port: u16) -> Option<Vec<u16>> {
        self.exposed_port_addresses(port)?
            .iter()
            .map(|address| {
                address
                    .rsplit_once(':')
                    .and_then(|(_, host_port)| host_port.parse::<u16>().ok())
            })
            .collect()
    }

    /// Combined standard output and standard error of the container.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::LogsUnavailable` when the runtime cannot
    /// produce logs, for example after the container has been removed.
    pub async fn logs(&self, scope: &CancelScope) -> Result<String, ContainerError> {
        fetch_logs(self.runner.as_ref(), &self.id, scope).await
    }

    /// Block until `predicate` accepts the output of `command`.
    ///
    /// The command runs once per probe interval, on the host or inside the
    /// container as `config` selects. `predicate` receives standard output,
    /// standard error and the exit code, and is never called concurrently.
    ///
    /// The predicate is moved onto the polling task, so it cannot borrow from
    /// the caller. State the caller needs afterwards, such as the last output
    /// seen, has to be shared through an `Arc<Mutex<_>>`.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::ProbeUnrunnable` when the command cannot be
    /// started, and `ContainerError::WaitCancelled` when `scope` ends before
    /// the predicate is satisfied.
    pub async fn wait_cmd<P>(
        &self,
        scope: &CancelScope,
        command: Vec<String>,
        predicate: P,
        config: &WaitConfig,
    ) -> Result<(), ContainerError>
    where
        P: FnMut(&str, &str, i32) -> bool + Send + 'static,
    {
        let request = ProbeRequest {
            container_id: &self.id,
            command,
            config,
            interval: self.settings.probe_interval,
        };
        wait_for(&self.runner, request, predicate, scope).await
    }

    /// Stop and remove the container, then remove its volumes.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::TeardownStepFailed` naming the first step that
    /// failed. The container or its volumes may be left behind.
    pub async fn stop(&self, scope: &CancelScope) -> Result<(), ContainerError> {
        teardown(self.runner.as_ref(), &self.id, scope).await
    }
}

/// Run the runtime's `logs` command for `container_id`.
pub(crate) async fn fetch_logs<R: CommandRunner>(
    runner: &R,
    container_id: &str,
    scope: &CancelScope,
) -> Result<String, ContainerError> {
    let output = runner
        .run(Invocation::runtime(["logs", container_id]), scope.clone())
        .await;

    if !output.succeeded() {
        return Err(ContainerError::LogsUnavailable {
            container_id: String::from(container_id),
            message: output.failure_detail(),
        });
    }

    let mut combined = output.stdout;
    combined.push_str(&output.stderr);
    Ok(combined)
}
