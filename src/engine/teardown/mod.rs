//! Ordered teardown of a container and the volumes it owns.
//!
//! Steps run strictly in sequence and the first failure ends the teardown:
//!
//! 1. stop the container;
//! 2. list its `volume`-type mounts (bind mounts are host paths and are left
//!    alone);
//! 3. remove the container;
//! 4. remove the listed volumes in a single call, if there were any.

use std::fmt;

use tracing::{debug, info};

use super::runtime::{CommandOutput, CommandRunner, Invocation};
use super::scope::CancelScope;
use crate::error::ContainerError;

/// Go template printing the name of every volume-type mount, one per line.
const VOLUME_FORMAT: &str =
    r#"{{ range .Mounts }}{{if eq .Type "volume"}}{{ .Name }}{{"\n"}}{{ end }}{{ end }}"#;

/// A step of the teardown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    /// Stopping the container.
    Stop,
    /// Listing the container's volumes.
    InspectVolumes,
    /// Removing the container.
    RemoveContainer,
    /// Removing the container's volumes.
    RemoveVolumes,
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => f.write_str("stop"),
            Self::InspectVolumes => f.write_str("inspect volumes"),
            Self::RemoveContainer => f.write_str("remove container"),
            Self::RemoveVolumes => f.write_str("remove volumes"),
        }
    }
}

struct Teardown<'a, R> {
    runner: &'a R,
    container_id: &'a str,
    scope: &'a CancelScope,
}

impl<R: CommandRunner> Teardown<'_, R> {
    async fn step<I, S>(&self, step: TeardownStep, args: I) -> Result<CommandOutput, ContainerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        debug!(container_id = self.container_id, %step, "teardown step");
        let output = self
            .runner
            .run(Invocation::runtime(args), self.scope.clone())
            .await;

        if output.succeeded() {
            Ok(output)
        } else {
            Err(ContainerError::TeardownStepFailed {
                container_id: String::from(self.container_id),
                step,
                message: output.failure_detail(),
            })
        }
    }
}

/// Run the teardown sequence for `container_id`.
///
/// # Errors
///
/// Returns `ContainerError::TeardownStepFailed` naming the first step that
/// failed. Later steps are not attempted.
pub(crate) async fn teardown<R: CommandRunner>(
    runner: &R,
    container_id: &str,
    scope: &CancelScope,
) -> Result<(), ContainerError> {
    let sequence = Teardown {
        runner,
        container_id,
        scope,
    };

    sequence
        .step(TeardownStep::Stop, ["container", "stop", container_id])
        .await?;

    let listing = sequence
        .step(
            TeardownStep::InspectVolumes,
            ["inspect", "-f", VOLUME_FORMAT, container_id],
        )
        .await?;
    let volumes = volume_names(&listing.stdout);

    sequence
        .step(TeardownStep::RemoveContainer, ["container", "remove", container_id])
        .await?;

    if !volumes.is_empty() {
        let args = ["volume", "rm"]
            .into_iter()
            .map(String::from)
            .chain(volumes.iter().cloned());
        sequence.step(TeardownStep::RemoveVolumes, args).await?;
    }

    info!(container_id, volumes = volumes.len(), "container torn down");
    Ok(())
}

fn volume_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}
