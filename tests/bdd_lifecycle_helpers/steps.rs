//! Given/when steps for lifecycle scenarios.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use fixtainer::config::{LaunchConfig, WaitConfig};
use fixtainer::engine::{
    CancelReason, CancelScope, CommandOutput, Container, ContainerEngine, EngineSettings,
};
use fixtainer::error::{ConfigError, ContainerError, FixtainerError};
use rstest_bdd_macros::{given, when};

use super::StepResult;
use super::state::{LifecycleState, Outcome};
use crate::scripted_runner::{STATUS_PREFIX, ScriptedRunner};

/// Run `future` on a paused current-thread runtime so poll intervals elapse
/// instantly.
fn block_on<F: Future>(future: F) -> StepResult<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .map_err(|error| format!("failed to create tokio runtime for scenario: {error}"))?;
    Ok(runtime.block_on(future))
}

fn runner(lifecycle_state: &LifecycleState) -> StepResult<ScriptedRunner> {
    lifecycle_state
        .runner
        .get()
        .ok_or_else(|| String::from("runner should be configured"))
}

fn container(lifecycle_state: &LifecycleState) -> StepResult<Arc<Container<ScriptedRunner>>> {
    lifecycle_state
        .container
        .get()
        .ok_or_else(|| String::from("a container should have been launched"))
}

fn add_rule<I>(lifecycle_state: &LifecycleState, prefix: &str, replies: I) -> StepResult<()>
where
    I: IntoIterator<Item = CommandOutput>,
{
    let updated = runner(lifecycle_state)?.on(prefix, replies);
    lifecycle_state.runner.set(updated);
    Ok(())
}

fn container_failure(error: &ContainerError) -> Outcome {
    let kind = match error {
        ContainerError::WaitCancelled {
            reason: CancelReason::DeadlineExceeded,
            ..
        } => String::from("DeadlineExceeded"),
        ContainerError::TeardownStepFailed { step, .. } => format!("TeardownStepFailed({step})"),
        _ => String::from("Other"),
    };
    Outcome::Failed {
        kind,
        message: error.to_string(),
    }
}

fn launch_failure(error: &FixtainerError) -> Outcome {
    let kind = match error {
        FixtainerError::Config(ConfigError::MissingRequired { field }) if field == "image" => {
            "MissingImage"
        }
        FixtainerError::Container(ContainerError::StartupAborted { .. }) => "StartupAborted",
        _ => "Other",
    };
    Outcome::Failed {
        kind: String::from(kind),
        message: error.to_string(),
    }
}

fn launch(lifecycle_state: &LifecycleState, image: &str, config: &LaunchConfig) -> StepResult<()> {
    let engine = ContainerEngine::new(runner(lifecycle_state)?, EngineSettings::default());
    let result = block_on(engine.launch(&CancelScope::new(), image, config))?;

    match result {
        Ok(launched) => {
            lifecycle_state.container.set(Arc::new(launched));
            lifecycle_state.launch.set(Outcome::Succeeded);
        }
        Err(error) => lifecycle_state.launch.set(launch_failure(&error)),
    }
    Ok(())
}

fn wait(
    lifecycle_state: &LifecycleState,
    command: &str,
    expected: Option<String>,
    budget_secs: u64,
    config: WaitConfig,
) -> StepResult<()> {
    let launched = container(lifecycle_state)?;
    let argv: Vec<String> = command.split_whitespace().map(String::from).collect();
    let result = block_on(async move {
        let scope = CancelScope::with_timeout(Duration::from_secs(budget_secs));
        launched
            .wait_cmd(
                &scope,
                argv,
                move |stdout: &str, _: &str, code: i32| match &expected {
                    Some(text) => stdout.contains(text.as_str()),
                    None => code == 0,
                },
                &config,
            )
            .await
    })?;

    lifecycle_state.wait.set(match result {
        Ok(()) => Outcome::Succeeded,
        Err(error) => container_failure(&error),
    });
    Ok(())
}

#[given("a healthy container runtime")]
fn healthy_runtime(lifecycle_state: &LifecycleState) {
    lifecycle_state.runner.set(ScriptedRunner::healthy());
}

#[given("the runtime publishes port {port} as host port {host} after {polls} empty polls")]
fn runtime_publishes_port(
    lifecycle_state: &LifecycleState,
    port: u16,
    host: u16,
    polls: usize,
) -> StepResult<()> {
    let mapping = format!("{port}/tcp -> 0.0.0.0:{host}\n");
    let replies = std::iter::repeat_with(|| CommandOutput::success(""))
        .take(polls)
        .chain(std::iter::once(CommandOutput::success(mapping)));
    add_rule(lifecycle_state, "port", replies)
}

#[given("the container exits during start-up with log line {line}")]
fn container_exits_during_start_up(lifecycle_state: &LifecycleState, line: String) -> StepResult<()> {
    add_rule(
        lifecycle_state,
        STATUS_PREFIX,
        [
            CommandOutput::success("'created'\n"),
            CommandOutput::success("'exited'\n"),
        ],
    )?;
    add_rule(
        lifecycle_state,
        "logs",
        [CommandOutput::exited(0, "", format!("{line}\n"))],
    )
}

#[given("the probe {command} succeeds on attempt {attempt}")]
fn probe_succeeds_on_attempt(
    lifecycle_state: &LifecycleState,
    command: String,
    attempt: usize,
) -> StepResult<()> {
    let replies = std::iter::repeat_with(|| CommandOutput::exited(1, "", "no response"))
        .take(attempt.saturating_sub(1))
        .chain(std::iter::once(CommandOutput::success("accepting connections\n")));
    add_rule(lifecycle_state, &command, replies)
}

#[given("the container mounts volume {name}")]
fn container_mounts_volume(lifecycle_state: &LifecycleState, name: String) -> StepResult<()> {
    add_rule(
        lifecycle_state,
        "inspect -f {{ range .Mounts }}",
        [CommandOutput::success(format!("{name}\n"))],
    )
}

#[given("the runtime fails to remove containers")]
fn runtime_fails_to_remove(lifecycle_state: &LifecycleState) -> StepResult<()> {
    add_rule(
        lifecycle_state,
        "container remove",
        [CommandOutput::exited(1, "", "Error response from daemon: removal in progress\n")],
    )
}

#[when("the image {image} is launched exposing port {port}")]
fn image_launched_exposing_port(
    lifecycle_state: &LifecycleState,
    image: String,
    port: u16,
) -> StepResult<()> {
    launch(
        lifecycle_state,
        &image,
        &LaunchConfig::default().with_random_port(port),
    )
}

#[when("the image {image} is launched")]
fn image_launched(lifecycle_state: &LifecycleState, image: String) -> StepResult<()> {
    launch(lifecycle_state, &image, &LaunchConfig::default())
}

#[when("a container is launched without an image")]
fn launched_without_image(lifecycle_state: &LifecycleState) -> StepResult<()> {
    launch(lifecycle_state, "", &LaunchConfig::default())
}

#[when("the host waits for {command} with a budget of {secs} seconds")]
fn host_waits_for(lifecycle_state: &LifecycleState, command: String, secs: u64) -> StepResult<()> {
    wait(lifecycle_state, &command, None, secs, WaitConfig::default())
}

#[when("the container waits for {command} to print {text} with a budget of {secs} seconds")]
fn container_waits_for(
    lifecycle_state: &LifecycleState,
    command: String,
    text: String,
    secs: u64,
) -> StepResult<()> {
    wait(
        lifecycle_state,
        &command,
        Some(text),
        secs,
        WaitConfig::default().with_execute_in_container(true),
    )
}

#[when("the container is stopped")]
fn container_is_stopped(lifecycle_state: &LifecycleState) -> StepResult<()> {
    let launched = container(lifecycle_state)?;
    let result = block_on(async move { launched.stop(&CancelScope::new()).await })?;

    lifecycle_state.stop.set(match result {
        Ok(()) => Outcome::Succeeded,
        Err(error) => container_failure(&error),
    });
    Ok(())
}
