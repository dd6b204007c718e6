//! Application configuration for the `fixtainer` binary.

use ortho_config::{OrthoConfig, OrthoResult, PostMergeContext, PostMergeHook};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

use crate::error::{ConfigError, Result};

/// Poll intervals and time budgets.
///
/// All values must be non-zero.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Milliseconds between container status inspections.
    #[default(200)]
    pub liveness_interval_ms: u64,

    /// Milliseconds between published-port queries.
    #[default(150)]
    pub port_interval_ms: u64,

    /// Milliseconds between wait-probe runs.
    #[default(150)]
    pub probe_interval_ms: u64,

    /// Seconds allowed for cleaning up a container that failed to start.
    #[default(5)]
    pub cleanup_timeout_secs: u64,

    /// Seconds allowed for `fixtainer up` to launch and probe a container.
    #[default(60)]
    pub launch_timeout_secs: u64,
}

impl TimingConfig {
    /// Reject zero-valued intervals and budgets.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first zero field.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("timing.liveness_interval_ms", self.liveness_interval_ms),
            ("timing.port_interval_ms", self.port_interval_ms),
            ("timing.probe_interval_ms", self.probe_interval_ms),
            ("timing.cleanup_timeout_secs", self.cleanup_timeout_secs),
            ("timing.launch_timeout_secs", self.launch_timeout_secs),
        ];

        match fields.iter().find(|(_, value)| *value == 0) {
            Some((field, _)) => Err(ConfigError::InvalidValue {
                field: String::from(*field),
                reason: String::from("must be greater than zero"),
            }
            .into()),
            None => Ok(()),
        }
    }
}

/// Root configuration for the `fixtainer` binary.
///
/// Loaded with layered precedence: defaults, configuration file,
/// `FIXTAINER_*` environment variables, then command-line flags.
#[derive(Debug, Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "FIXTAINER",
    post_merge_hook,
    discovery(
        app_name = "fixtainer",
        env_var = "FIXTAINER_CONFIG_PATH",
        config_file_name = "config.toml",
        dotfile_name = ".fixtainer.toml",
        config_cli_long = "config",
        config_cli_visible = true,
    )
)]
pub struct AppConfig {
    /// Container runtime executable (name or path). Falls back to
    /// `FIXTAINER_RUNTIME`, then `docker`.
    pub runtime: Option<String>,

    /// Poll intervals and time budgets.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub timing: TimingConfig,
}

impl PostMergeHook for AppConfig {
    fn post_merge(&mut self, _ctx: &PostMergeContext) -> OrthoResult<()> {
        // A blank runtime means "not configured".
        self.runtime = self
            .runtime
            .take()
            .map(|runtime| String::from(runtime.trim()))
            .filter(|runtime| !runtime.is_empty());
        Ok(())
    }
}
