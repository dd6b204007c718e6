//! Container start-up: run, liveness, port discovery.
//!
//! A container that fails after it has been started is never handed back.
//! Its logs are captured and it is torn down before the error is returned,
//! on a budget of its own, since the caller's scope has usually already ended.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::container::{Container, fetch_logs};
use super::liveness::await_running;
use super::ports::{PortMappings, discover};
use super::runtime::{CommandOutput, CommandRunner, Invocation};
use super::scope::CancelScope;
use super::settings::EngineSettings;
use super::teardown::teardown;
use crate::config::LaunchConfig;
use crate::error::{ConfigError, ContainerError, FixtainerError};

/// Number of leading characters of the start command's output used as the
/// container id.
pub const CONTAINER_ID_LENGTH: usize = 12;

/// Launches containers through a [`CommandRunner`].
#[derive(Debug)]
pub struct ContainerEngine<R> {
    runner: Arc<R>,
    settings: EngineSettings,
}

impl<R> Clone for ContainerEngine<R> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            settings: self.settings,
        }
    }
}

impl<R: CommandRunner + 'static> ContainerEngine<R> {
    /// Create an engine that owns `runner`.
    #[must_use]
    pub fn new(runner: R, settings: EngineSettings) -> Self {
        Self::from_shared(Arc::new(runner), settings)
    }

    /// Create an engine around an already shared runner.
    #[must_use]
    pub const fn from_shared(runner: Arc<R>, settings: EngineSettings) -> Self {
        Self { runner, settings }
    }

    /// The timing settings applied to every launched container.
    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The runner used for every runtime command.
    #[must_use]
    pub const fn runner(&self) -> &Arc<R> {
        &self.runner
    }

    /// Start `image` and wait until it is running and its ports are published.
    ///
    /// Port discovery only runs when `config` requests port exposures; the
    /// returned handle otherwise has no port mappings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRequired` for an empty image name,
    /// `ContainerError::LaunchFailed` when the runtime refuses to start the
    /// container, `ContainerError::InvalidContainerId` when it prints no id,
    /// and `ContainerError::StartupAborted` wrapping the underlying failure
    /// when the started container never becomes usable.
    pub async fn launch(
        &self,
        scope: &CancelScope,
        image: &str,
        config: &LaunchConfig,
    ) -> Result<Container<R>, FixtainerError> {
        if image.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: String::from("image"),
            }
            .into());
        }

        let args = run_arguments(image, config);
        info!(image, "starting container");
        let output = self
            .runner
            .run(Invocation::Runtime(args.clone()), scope.clone())
            .await;

        if !output.succeeded() {
            return Err(ContainerError::LaunchFailed {
                image: String::from(image),
                stderr: failure_stderr(&output),
                stdout: output.stdout,
                args: args.join(" "),
            }
            .into());
        }

        let Some(container_id) = output.stdout.get(..CONTAINER_ID_LENGTH).map(String::from) else {
            // The runtime reported success, so a container may exist that
            // nothing will clean up.
            warn!(image, stdout = ?output.stdout, "start command printed no container id");
            return Err(ContainerError::InvalidContainerId {
                image: String::from(image),
                stdout: output.stdout,
            }
            .into());
        };
        debug!(image, container_id = %container_id, "container started");

        match self.await_ready(scope, &container_id, config).await {
            Ok(port_mappings) => {
                info!(image, container_id = %container_id, "container ready");
                Ok(Container::new(
                    container_id,
                    port_mappings,
                    Arc::clone(&self.runner),
                    self.settings,
                ))
            }
            Err(error) => Err(self.abort_startup(image, container_id, error).await.into()),
        }
    }

    async fn await_ready(
        &self,
        scope: &CancelScope,
        container_id: &str,
        config: &LaunchConfig,
    ) -> Result<PortMappings, ContainerError> {
        await_running(&self.runner, container_id, self.settings.liveness_interval, scope).await?;

        if config.exposed_ports().is_empty() {
            return Ok(PortMappings::new());
        }
        discover(&self.runner, container_id, self.settings.port_interval, scope).await
    }

    /// Capture logs, tear the container down, and wrap `error` with the
    /// context needed to diagnose it.
    ///
    /// Both steps run on a scope of their own bounded by the cleanup budget,
    /// since the caller's scope has usually already ended. A failed teardown
    /// is logged, never returned.
    async fn abort_startup(
        &self,
        image: &str,
        container_id: String,
        error: ContainerError,
    ) -> ContainerError {
        warn!(image, container_id = %container_id, %error, "container failed to become ready");

        let cleanup_scope = CancelScope::with_timeout(self.settings.cleanup_timeout);
        let logs = fetch_logs(self.runner.as_ref(), &container_id, &cleanup_scope)
            .await
            .unwrap_or_else(|log_error| log_error.to_string());

        match teardown(self.runner.as_ref(), &container_id, &cleanup_scope).await {
            Ok(()) => info!(container_id = %container_id, "abandoned container cleaned up"),
            Err(cleanup_error) => {
                warn!(container_id = %container_id, error = %cleanup_error, "cleanup of abandoned container failed");
            }
        }

        ContainerError::StartupAborted {
            image: String::from(image),
            container_id,
            logs,
            source: Box::new(error),
        }
    }
}

/// Captured stderr of a failed start, followed by the runner's error if the
/// command did not run to completion.
fn failure_stderr(output: &CommandOutput) -> String {
    match &output.error {
        Some(error) if output.stderr.is_empty() => error.clone(),
        Some(error) => format!("{}\n{error}", output.stderr.trim_end()),
        None => output.stderr.clone(),
    }
}

/// Render the runtime arguments that start `image` with `config`.
fn run_arguments(image: &str, config: &LaunchConfig) -> Vec<String> {
    let mut args = vec![String::from("run"), String::from("-d")];

    for exposure in config.exposed_ports() {
        args.push(String::from("-p"));
        args.push(exposure.publish_flag());
    }
    for variable in config.environment() {
        args.push(String::from("-e"));
        args.push(variable.clone());
    }
    for mount in config.mounts() {
        args.push(String::from("--mount"));
        args.push(mount.mount_flag());
    }

    args.push(String::from(image));
    args.extend(config.arguments().iter().cloned());
    args
}
