//! `fixtainer` application entry point.
//!
//! Uses `eyre` for opaque error handling at the application boundary,
//! converting domain-specific errors into human-readable reports.
//!
//! Configuration is loaded with layered precedence via `OrthoConfig`:
//! 1. Application defaults
//! 2. Configuration file (`~/.config/fixtainer/config.toml` or path from `FIXTAINER_CONFIG_PATH`)
//! 3. Environment variables (`FIXTAINER_*`)
//! 4. Command-line arguments

use std::time::Duration;

use clap::Parser;
use eyre::{Report, Result as EyreResult};
use fixtainer::api::{FixtureRequest, Probe, check_runtime, connect_engine, launch_fixture, stop_fixture};
use fixtainer::config::{AppConfig, Cli, Commands, LaunchConfig, UpArgs, WaitConfig, load_config};
use fixtainer::engine::CancelScope;
use fixtainer::error::{ConfigError, Result as FixtainerResult};
use mockable::DefaultEnv;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// Installs the tracing subscriber, loads configuration, then dispatches to
/// the subcommand handler.
#[tokio::main]
async fn main() -> EyreResult<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli).map_err(Report::from)?;

    run(&cli, &config).await.map_err(Report::from)
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    if installed.is_err() {
        info!("tracing subscriber already installed");
    }
}

/// Execute the CLI command, returning domain-specific errors.
async fn run(cli: &Cli, config: &AppConfig) -> FixtainerResult<()> {
    match &cli.command {
        Commands::Up(args) => up(config, args).await,
        Commands::Check => check(config),
    }
}

/// Report where the runtime executable was found.
#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn check(config: &AppConfig) -> FixtainerResult<()> {
    let path = check_runtime(config, &DefaultEnv::new())?;
    println!("container runtime: {path}");
    Ok(())
}

/// Launch a fixture, print its endpoints, and tear it down on Ctrl-C.
#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
async fn up(config: &AppConfig, args: &UpArgs) -> FixtainerResult<()> {
    let engine = connect_engine(config, &DefaultEnv::new())?;
    let request = fixture_request(args)?;
    let budget = Duration::from_secs(args.timeout.unwrap_or(config.timing.launch_timeout_secs));

    let container = launch_fixture(&engine, request, &CancelScope::with_timeout(budget)).await?;

    println!("{}", container.id());
    for (port, addresses) in container.port_mappings() {
        for address in addresses {
            println!("{port} -> {address}");
        }
    }

    if let Err(error) = tokio::signal::ctrl_c().await {
        info!(%error, "unable to listen for Ctrl-C; tearing down now");
    }

    stop_fixture(&container, engine.settings().cleanup_timeout).await
}

/// Translate clap arguments into a library request.
fn fixture_request(args: &UpArgs) -> FixtainerResult<FixtureRequest> {
    let mut launch = LaunchConfig::default();
    for port in &args.ports {
        launch = launch.with_port(port.internal, port.host);
    }
    for variable in &args.env {
        launch = launch.with_env_var(&variable.key, &variable.value);
    }
    for mount in &args.mounts {
        launch = launch.with_mount(mount.source.clone(), mount.target.clone());
    }
    for argument in &args.command {
        launch = launch.with_cmd(argument.clone());
    }

    let probe = args
        .wait_cmd
        .as_deref()
        .map(|raw| probe_from(raw, args.in_container))
        .transpose()?;

    Ok(FixtureRequest {
        image: args.image.clone(),
        launch,
        probe,
    })
}

fn probe_from(raw: &str, in_container: bool) -> FixtainerResult<Probe> {
    let command = shell_words::split(raw).map_err(|error| ConfigError::InvalidValue {
        field: String::from("wait-cmd"),
        reason: error.to_string(),
    })?;
    if command.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: String::from("wait-cmd"),
            reason: String::from("command cannot be empty"),
        }
        .into());
    }

    Ok(Probe {
        command,
        wait: WaitConfig::default().with_execute_in_container(in_container),
    })
}
