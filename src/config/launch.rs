//! Per-container launch and wait configuration.
//!
//! Both values are built up with consuming `with_*` methods and are
//! read-only once handed to the engine.

use camino::Utf8PathBuf;

/// A port to publish on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortExposure {
    /// Port inside the container.
    pub internal: u16,
    /// Port on the host; zero lets the runtime pick one.
    pub host: u16,
}

impl PortExposure {
    /// Whether the runtime should assign the host port.
    #[must_use]
    pub const fn is_random(&self) -> bool {
        self.host == 0
    }

    /// Render the value of the runtime's `-p` flag.
    #[must_use]
    pub fn publish_flag(&self) -> String {
        if self.is_random() {
            self.internal.to_string()
        } else {
            format!("{}:{}", self.host, self.internal)
        }
    }
}

/// A host path bind-mounted into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    /// Path on the host.
    pub source: Utf8PathBuf,
    /// Path inside the container.
    pub target: Utf8PathBuf,
}

impl BindMount {
    /// Render the value of the runtime's `--mount` flag.
    #[must_use]
    pub fn mount_flag(&self) -> String {
        format!("type=bind,source={},target={}", self.source, self.target)
    }
}

/// What to start and how to wire it to the host.
///
/// # Example
///
/// ```
/// use fixtainer::config::LaunchConfig;
///
/// let config = LaunchConfig::default()
///     .with_env_var("mongo_initdb_root_username", "root")
///     .with_random_port(27017)
///     .with_cmd("--quiet");
///
/// assert_eq!(config.environment(), ["MONGO_INITDB_ROOT_USERNAME=root"]);
/// assert_eq!(config.arguments(), ["--quiet"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchConfig {
    arguments: Vec<String>,
    environment: Vec<String>,
    exposed_ports: Vec<PortExposure>,
    mounts: Vec<BindMount>,
}

impl LaunchConfig {
    /// Append an argument overriding the image's default command.
    #[must_use]
    pub fn with_cmd(mut self, argument: impl Into<String>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    /// Append an environment variable. The key is upper-cased.
    ///
    /// Duplicate keys are passed through in order; the runtime decides which
    /// one wins.
    #[must_use]
    pub fn with_env_var(mut self, key: &str, value: &str) -> Self {
        self.environment
            .push(format!("{}={value}", key.to_uppercase()));
        self
    }

    /// Publish `internal` on the given host port.
    #[must_use]
    pub fn with_port(mut self, internal: u16, host: u16) -> Self {
        self.exposed_ports.push(PortExposure { internal, host });
        self
    }

    /// Publish `internal` on a host port chosen by the runtime.
    #[must_use]
    pub fn with_random_port(self, internal: u16) -> Self {
        self.with_port(internal, 0)
    }

    /// Bind-mount a host path into the container.
    #[must_use]
    pub fn with_mount(mut self, source: impl Into<Utf8PathBuf>, target: impl Into<Utf8PathBuf>) -> Self {
        self.mounts.push(BindMount {
            source: source.into(),
            target: target.into(),
        });
        self
    }

    /// Arguments overriding the image's default command.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// `KEY=value` environment entries, in insertion order.
    #[must_use]
    pub fn environment(&self) -> &[String] {
        &self.environment
    }

    /// Requested port exposures, in insertion order.
    #[must_use]
    pub fn exposed_ports(&self) -> &[PortExposure] {
        &self.exposed_ports
    }

    /// Requested bind mounts, in insertion order.
    #[must_use]
    pub fn mounts(&self) -> &[BindMount] {
        &self.mounts
    }
}

/// Where a wait probe runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitConfig {
    execute_in_container: bool,
}

impl WaitConfig {
    /// Run the probe inside the container instead of on the host.
    #[must_use]
    pub const fn with_execute_in_container(mut self, execute_in_container: bool) -> Self {
        self.execute_in_container = execute_in_container;
        self
    }

    /// Whether the probe runs inside the container.
    #[must_use]
    pub const fn execute_in_container(&self) -> bool {
        self.execute_in_container
    }
}
