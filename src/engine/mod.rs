//! Container lifecycle and readiness coordination.
//!
//! Every interaction with the container runtime goes through a
//! [`CommandRunner`], which runs one command and captures its textual output.
//! On top of that seam the engine provides:
//!
//! 1. Launching a container from a [`LaunchConfig`](crate::config::LaunchConfig)
//!    ([`ContainerEngine::launch`]).
//! 2. Liveness polling until the runtime reports `'running'`.
//! 3. Port discovery when host port exposures were requested.
//! 4. Conditional waits on a caller-supplied probe ([`Container::wait_cmd`]).
//! 5. Ordered teardown of the container and its volumes ([`Container::stop`]).
//!
//! Each polling phase runs as its own task and reports exactly one outcome over
//! a one-shot channel. All of them are bounded by a [`CancelScope`].

mod container;
mod launch;
mod liveness;
mod poll;
mod ports;
mod runtime;
mod scope;
mod settings;
mod teardown;
mod wait;

#[cfg(test)]
pub(crate) mod test_support;

pub use container::Container;
pub use launch::{CONTAINER_ID_LENGTH, ContainerEngine};
pub use liveness::LivenessState;
pub use poll::WaitPhase;
pub use ports::{PortMappings, parse_published_ports};
pub use runtime::{
    CliRunner, CommandOutput, CommandRunner, DEFAULT_RUNTIME, Invocation, NOT_STARTED,
    RUNTIME_ENV_VAR, RunFuture, RuntimeLocator,
};
pub use scope::{CancelReason, CancelScope};
pub use settings::EngineSettings;
pub use teardown::TeardownStep;
