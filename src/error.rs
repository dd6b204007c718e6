//! Semantic error types for fixtainer.
//!
//! Conditions a caller might inspect or act on (a container stuck in a failed
//! state, a teardown that stopped half way) are modelled as `thiserror`
//! enums. Opaque `eyre::Report` values only appear at the binary boundary.

use std::sync::Arc;

use thiserror::Error;

use crate::engine::{CancelReason, TeardownStep, WaitPhase};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file: {message}")]
    ParseError {
        /// A description of the parse error.
        message: String,
    },

    /// A required configuration value is missing.
    #[error("missing required configuration: {field}")]
    MissingRequired {
        /// The name of the missing field.
        field: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// The `OrthoConfig` library returned an error during configuration loading.
    #[error("configuration loading failed: {0}")]
    OrthoConfig(Arc<ortho_config::OrthoError>),
}

/// Errors raised while driving a container through its lifecycle.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The container runtime executable could not be found.
    #[error("container runtime '{binary}' not found on PATH")]
    RuntimeUnavailable {
        /// The executable name or path that was searched for.
        binary: String,
    },

    /// The runtime refused to start the container.
    #[error("unable to start container from '{image}':\n{stdout}\n{stderr}\nargs: {args}")]
    LaunchFailed {
        /// The image that was requested.
        image: String,
        /// Captured standard output of the start command.
        stdout: String,
        /// Captured standard error of the start command.
        stderr: String,
        /// The fully rendered runtime argument list.
        args: String,
    },

    /// The start command succeeded but printed no usable container id.
    #[error("runtime printed no container id for '{image}': {stdout:?}")]
    InvalidContainerId {
        /// The image that was started.
        image: String,
        /// The raw standard output of the start command.
        stdout: String,
    },

    /// Inspecting the container's status failed.
    #[error("unable to inspect container '{container_id}': {message}")]
    InspectFailed {
        /// The container being inspected.
        container_id: String,
        /// A description of the inspection failure.
        message: String,
    },

    /// The container reached a terminal state other than running.
    #[error("container in invalid state: {status}\nstdout: {stdout}\nstderr: {stderr}")]
    LivenessFailedState {
        /// The container that failed.
        container_id: String,
        /// The raw quoted status reported by the runtime.
        status: String,
        /// Captured standard output of the inspection.
        stdout: String,
        /// Captured standard error of the inspection.
        stderr: String,
    },

    /// The liveness poller was cancelled before the container was running.
    #[error("container '{container_id}' did not reach the running state: {reason}")]
    LivenessTimeout {
        /// The container being polled.
        container_id: String,
        /// Why polling stopped.
        reason: CancelReason,
    },

    /// Querying published ports failed.
    #[error("unable to retrieve ports for container '{container_id}': {message}")]
    PortDiscoveryFailed {
        /// The container being queried.
        container_id: String,
        /// A description of the query failure.
        message: String,
    },

    /// The wait probe could not be executed at all.
    #[error(
        "wait command for container '{container_id}' could not run: {message}\n\tstderr: {stderr}\n\tstdout: {stdout}"
    )]
    ProbeUnrunnable {
        /// The container the probe targets.
        container_id: String,
        /// Why the probe could not run.
        message: String,
        /// Captured standard output, if any.
        stdout: String,
        /// Captured standard error, if any.
        stderr: String,
    },

    /// A polling phase was cancelled or ran out of time.
    #[error("{phase} for container '{container_id}' stopped: {reason}")]
    WaitCancelled {
        /// The container being polled.
        container_id: String,
        /// The phase that was interrupted.
        phase: WaitPhase,
        /// Why polling stopped.
        reason: CancelReason,
    },

    /// A teardown step failed; later steps were not attempted.
    #[error("teardown of container '{container_id}' failed at step '{step}': {message}")]
    TeardownStepFailed {
        /// The container being torn down.
        container_id: String,
        /// The step that failed.
        step: TeardownStep,
        /// A description of the failure.
        message: String,
    },

    /// Container logs could not be retrieved.
    #[error("unable to retrieve logs for container '{container_id}': {message}")]
    LogsUnavailable {
        /// The container whose logs were requested.
        container_id: String,
        /// A description of the failure.
        message: String,
    },

    /// A started container never became usable and was handed to cleanup.
    #[error("[{image}]({container_id}) {source}\nlogs:{logs}")]
    StartupAborted {
        /// The image that was started.
        image: String,
        /// The identifier of the abandoned container.
        container_id: String,
        /// The latest logs captured before cleanup.
        logs: String,
        /// The failure that aborted startup.
        #[source]
        source: Box<ContainerError>,
    },
}

impl ContainerError {
    /// Return the innermost error, looking through [`Self::StartupAborted`].
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::StartupAborted { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Top-level error type for fixtainer.
#[derive(Debug, Error)]
pub enum FixtainerError {
    /// An error occurred during configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred while managing a container.
    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// A specialised `Result` type for fixtainer operations.
pub type Result<T> = std::result::Result<T, FixtainerError>;
