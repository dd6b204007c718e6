//! Timing knobs for the engine's poll loops and cleanup.

use std::time::Duration;

use crate::config::TimingConfig;

const DEFAULT_LIVENESS_INTERVAL: Duration = Duration::from_millis(200);
const DEFAULT_PORT_INTERVAL: Duration = Duration::from_millis(150);
const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(150);
const DEFAULT_CLEANUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll intervals and cleanup budget used by a [`ContainerEngine`](super::ContainerEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Interval between container status inspections.
    pub liveness_interval: Duration,
    /// Interval between published-port queries.
    pub port_interval: Duration,
    /// Interval between wait-probe runs.
    pub probe_interval: Duration,
    /// Budget for the compensating cleanup after a failed launch.
    pub cleanup_timeout: Duration,
}

impl EngineSettings {
    /// Build settings from the `[timing]` configuration section.
    #[must_use]
    pub const fn from_timing(timing: &TimingConfig) -> Self {
        Self {
            liveness_interval: Duration::from_millis(timing.liveness_interval_ms),
            port_interval: Duration::from_millis(timing.port_interval_ms),
            probe_interval: Duration::from_millis(timing.probe_interval_ms),
            cleanup_timeout: Duration::from_secs(timing.cleanup_timeout_secs),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            liveness_interval: DEFAULT_LIVENESS_INTERVAL,
            port_interval: DEFAULT_PORT_INTERVAL,
            probe_interval: DEFAULT_PROBE_INTERVAL,
            cleanup_timeout: DEFAULT_CLEANUP_TIMEOUT,
        }
    }
}
