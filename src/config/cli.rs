//! Command-line argument definitions for fixtainer.

use std::str::FromStr;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Command-line interface for fixtainer.
#[derive(Debug, Parser)]
#[command(name = "fixtainer")]
#[command(
    author,
    version,
    about = "Disposable, self-cleaning containers for use as test fixtures"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Container runtime executable (name or path).
    #[arg(long, global = true)]
    pub runtime: Option<String>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Launch a container, wait for it, and tear it down on Ctrl-C.
    Up(UpArgs),

    /// Check that the container runtime can be found.
    Check,
}

/// Arguments for the `up` subcommand.
#[derive(Debug, Parser)]
pub struct UpArgs {
    /// Image to start.
    #[arg(required = true)]
    pub image: String,

    /// Port to publish, as `INTERNAL` (random host port) or `INTERNAL:HOST`.
    #[arg(long = "port", short = 'p')]
    pub ports: Vec<PortSpec>,

    /// Environment variable as `KEY=VALUE`. The key is upper-cased.
    #[arg(long = "env", short = 'e')]
    pub env: Vec<EnvSpec>,

    /// Bind mount as `HOST_PATH:CONTAINER_PATH`.
    #[arg(long = "mount")]
    pub mounts: Vec<MountSpec>,

    /// Readiness probe, split like a shell would. The container is ready once
    /// it exits zero.
    #[arg(long)]
    pub wait_cmd: Option<String>,

    /// Run the readiness probe inside the container.
    #[arg(long, requires = "wait_cmd")]
    pub in_container: bool,

    /// Seconds allowed for start-up and the readiness probe.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Command overriding the image's default.
    #[arg(last = true)]
    pub command: Vec<String>,
}

/// A `--port` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    /// Port inside the container.
    pub internal: u16,
    /// Port on the host; zero for a random one.
    pub host: u16,
}

impl FromStr for PortSpec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<u16>()
                .map_err(|error| format!("invalid port '{part}': {error}"))
        };

        match value.split_once(':') {
            Some((internal, host)) => Ok(Self {
                internal: parse(internal)?,
                host: parse(host)?,
            }),
            None => Ok(Self {
                internal: parse(value)?,
                host: 0,
            }),
        }
    }
}

/// An `--env` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSpec {
    /// Variable name.
    pub key: String,
    /// Variable value, possibly empty.
    pub value: String,
}

impl FromStr for EnvSpec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split_once('=') {
            Some((key, assigned)) if !key.trim().is_empty() => Ok(Self {
                key: String::from(key.trim()),
                value: String::from(assigned),
            }),
            _ => Err(format!("expected KEY=VALUE, got '{value}'")),
        }
    }
}

/// A `--mount` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSpec {
    /// Path on the host.
    pub source: Utf8PathBuf,
    /// Path inside the container.
    pub target: Utf8PathBuf,
}

impl FromStr for MountSpec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.rsplit_once(':') {
            Some((source, target)) if !source.is_empty() && !target.is_empty() => Ok(Self {
                source: Utf8PathBuf::from(source),
                target: Utf8PathBuf::from(target),
            }),
            _ => Err(format!("expected HOST_PATH:CONTAINER_PATH, got '{value}'")),
        }
    }
}
