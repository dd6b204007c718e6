//! Configuration for fixtainer.
//!
//! Two kinds of configuration live here:
//!
//! - per-container values handed to the engine: [`LaunchConfig`] and
//!   [`WaitConfig`];
//! - the layered [`AppConfig`] of the `fixtainer` binary, merged by
//!   `ortho_config` from defaults, a configuration file, `FIXTAINER_*`
//!   environment variables and command-line flags (highest wins).
//!
//! The configuration file is discovered via `FIXTAINER_CONFIG_PATH`,
//! `.fixtainer.toml`, or `~/.config/fixtainer/config.toml`.
//!
//! # Example Configuration
//!
//! ```toml
//! runtime = "podman"
//!
//! [timing]
//! liveness_interval_ms = 200
//! port_interval_ms = 150
//! probe_interval_ms = 150
//! cleanup_timeout_secs = 5
//! launch_timeout_secs = 60
//! ```

mod cli;
mod launch;
mod loader;
mod types;


pub use cli::{Cli, Commands, EnvSpec, MountSpec, PortSpec, UpArgs};
pub use launch::{BindMount, LaunchConfig, PortExposure, WaitConfig};
pub use loader::{env_var_names, load_config, load_config_with_env};
pub use types::{AppConfig, TimingConfig};
