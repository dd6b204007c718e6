//! Orchestration API for fixtainer commands.
//!
//! These functions hold the logic behind the `fixtainer` subcommands so that
//! library embedders get the same behaviour as the CLI. They accept
//! library-owned types (not clap types), return
//! [`crate::error::Result`], and never print.

use std::time::Duration;

use camino::Utf8PathBuf;
use tracing::{info, warn};

use crate::config::{AppConfig, LaunchConfig, WaitConfig};
use crate::engine::{
    CancelScope, CliRunner, CommandRunner, Container, ContainerEngine, EngineSettings,
    RuntimeLocator,
};
use crate::error::Result as FixtainerResult;

/// A readiness probe that must exit zero before a fixture is handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    /// The probe's argv.
    pub command: Vec<String>,
    /// Where the probe runs.
    pub wait: WaitConfig,
}

/// Everything needed to bring up one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureRequest {
    /// Image to start.
    pub image: String,
    /// How to start it.
    pub launch: LaunchConfig,
    /// Optional readiness probe run after start-up.
    pub probe: Option<Probe>,
}

/// Resolve the runtime executable named by `config` (or the environment).
///
/// # Errors
///
/// Returns `ContainerError::RuntimeUnavailable` when the executable cannot
/// be found.
pub fn check_runtime<E: mockable::Env>(config: &AppConfig, env: &E) -> FixtainerResult<Utf8PathBuf> {
    let locator = RuntimeLocator::new(env);
    let binary = locator.resolve_binary(config.runtime.as_deref());
    locator.ensure_available(&binary)
}

/// Build an engine driving the resolved runtime executable.
///
/// # Errors
///
/// Returns `ContainerError::RuntimeUnavailable` when the executable cannot
/// be found.
pub fn connect_engine<E: mockable::Env>(
    config: &AppConfig,
    env: &E,
) -> FixtainerResult<ContainerEngine<CliRunner>> {
    let binary = check_runtime(config, env)?;
    info!(runtime = %binary, "using container runtime");
    Ok(ContainerEngine::new(
        CliRunner::new(binary.into_string()),
        EngineSettings::from_timing(&config.timing),
    ))
}

/// Launch a fixture and, if requested, wait for its probe to exit zero.
///
/// A fixture whose probe never succeeds is torn down before the error is
/// returned; a teardown failure at that point is logged, not returned.
///
/// # Errors
///
/// Returns any launch error, or the probe's `ContainerError::ProbeUnrunnable`
/// or `ContainerError::WaitCancelled`.
pub async fn launch_fixture<R: CommandRunner + 'static>(
    engine: &ContainerEngine<R>,
    request: FixtureRequest,
    scope: &CancelScope,
) -> FixtainerResult<Container<R>> {
    let container = engine.launch(scope, &request.image, &request.launch).await?;

    let Some(probe) = request.probe else {
        return Ok(container);
    };

    let outcome = container
        .wait_cmd(scope, probe.command, |_: &str, _: &str, code: i32| code == 0, &probe.wait)
        .await;

    match outcome {
        Ok(()) => Ok(container),
        Err(wait_error) => {
            let cleanup = CancelScope::with_timeout(engine.settings().cleanup_timeout);
            if let Err(teardown_error) = container.stop(&cleanup).await {
                warn!(
                    container_id = container.id(),
                    error = %teardown_error,
                    "teardown after failed probe did not complete"
                );
            }
            Err(wait_error.into())
        }
    }
}

/// Tear a fixture down within `timeout`.
///
/// # Errors
///
/// Returns `ContainerError::TeardownStepFailed` naming the step that failed.
pub async fn stop_fixture<R: CommandRunner + 'static>(
    container: &Container<R>,
    timeout: Duration,
) -> FixtainerResult<()> {
    container
        .stop(&CancelScope::with_timeout(timeout))
        .await?;
    info!(container_id = container.id(), "fixture stopped");
    Ok(())
}
