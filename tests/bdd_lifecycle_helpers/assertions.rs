//! Assertion helpers for lifecycle behavioural tests.

use rstest_bdd::Slot;
use rstest_bdd_macros::then;

use super::StepResult;
use super::state::{LifecycleState, Outcome};
use crate::scripted_runner::{SHORT_ID, STATUS_PREFIX, ScriptedRunner};

fn outcome(slot: &Slot<Outcome>, operation: &str) -> StepResult<Outcome> {
    slot.get()
        .ok_or_else(|| format!("{operation} outcome should be set"))
}

fn expect_success(slot: &Slot<Outcome>, operation: &str) -> StepResult<()> {
    match outcome(slot, operation)? {
        Outcome::Succeeded => Ok(()),
        Outcome::Failed { kind, message } => Err(format!(
            "expected {operation} to succeed, got {kind}: {message}"
        )),
    }
}

fn expect_failure(slot: &Slot<Outcome>, operation: &str, expected_kind: &str) -> StepResult<String> {
    match outcome(slot, operation)? {
        Outcome::Failed { kind, message } if kind == expected_kind => Ok(message),
        Outcome::Failed { kind, message } => Err(format!(
            "expected {operation} failure {expected_kind}, got {kind}: {message}"
        )),
        Outcome::Succeeded => Err(format!(
            "expected {operation} failure {expected_kind}, got success"
        )),
    }
}

fn runner(lifecycle_state: &LifecycleState) -> StepResult<ScriptedRunner> {
    lifecycle_state
        .runner
        .get()
        .ok_or_else(|| String::from("runner should be configured"))
}

/// Command lines issued after start-up completed.
fn teardown_lines(lifecycle_state: &LifecycleState) -> StepResult<Vec<String>> {
    Ok(runner(lifecycle_state)?
        .command_lines()
        .into_iter()
        .filter(|line| !line.starts_with("run ") && !line.starts_with(STATUS_PREFIX))
        .collect())
}

#[then("the launch succeeds with container id {id}")]
fn launch_succeeds_with_id(lifecycle_state: &LifecycleState, id: String) -> StepResult<()> {
    expect_success(&lifecycle_state.launch, "launch")?;
    let container = lifecycle_state
        .container
        .get()
        .ok_or_else(|| String::from("container should be stored"))?;

    if container.id() == id {
        Ok(())
    } else {
        Err(format!("expected container id {id}, got {}", container.id()))
    }
}

#[then("port {port} is reachable on host port {host}")]
fn port_is_reachable(lifecycle_state: &LifecycleState, port: u16, host: u16) -> StepResult<()> {
    let container = lifecycle_state
        .container
        .get()
        .ok_or_else(|| String::from("container should be stored"))?;

    match container.exposed_ports(port) {
        Some(ports) if ports == [host] => Ok(()),
        other => Err(format!("expected port {port} on [{host}], got {other:?}")),
    }
}

#[then("the launch fails because the image is missing")]
fn launch_fails_missing_image(lifecycle_state: &LifecycleState) -> StepResult<()> {
    expect_failure(&lifecycle_state.launch, "launch", "MissingImage").map(drop)
}

#[then("the runtime was never invoked")]
fn runtime_never_invoked(lifecycle_state: &LifecycleState) -> StepResult<()> {
    let calls = runner(lifecycle_state)?.calls();
    if calls.is_empty() {
        Ok(())
    } else {
        Err(format!("expected no runtime calls, got {calls:?}"))
    }
}

#[then("the launch is aborted with logs containing {text}")]
fn launch_aborted_with_logs(lifecycle_state: &LifecycleState, text: String) -> StepResult<()> {
    let message = expect_failure(&lifecycle_state.launch, "launch", "StartupAborted")?;
    if message.contains(&text) {
        Ok(())
    } else {
        Err(format!("expected logs containing {text:?} in {message:?}"))
    }
}

#[then("the container was stopped and removed")]
fn container_stopped_and_removed(lifecycle_state: &LifecycleState) -> StepResult<()> {
    let runner = runner(lifecycle_state)?;
    for step in ["stop", "remove"] {
        let prefix = format!("container {step} {SHORT_ID}");
        if runner.count(&prefix) != 1 {
            return Err(format!("expected exactly one `{prefix}` call"));
        }
    }
    Ok(())
}

#[then("the wait succeeds")]
fn wait_succeeds(lifecycle_state: &LifecycleState) -> StepResult<()> {
    expect_success(&lifecycle_state.wait, "wait")
}

#[then("the probe {command} ran {count} times")]
fn probe_ran(lifecycle_state: &LifecycleState, command: String, count: usize) -> StepResult<()> {
    let seen = runner(lifecycle_state)?.count(&command);
    if seen == count {
        Ok(())
    } else {
        Err(format!("expected {command} to run {count} times, ran {seen}"))
    }
}

#[then("the wait is cancelled at the deadline")]
fn wait_cancelled_at_deadline(lifecycle_state: &LifecycleState) -> StepResult<()> {
    expect_failure(&lifecycle_state.wait, "wait", "DeadlineExceeded").map(drop)
}

#[then("the stop succeeds")]
fn stop_succeeds(lifecycle_state: &LifecycleState) -> StepResult<()> {
    expect_success(&lifecycle_state.stop, "stop")
}

#[then("teardown ran stop, inspect volumes, remove container, remove volumes in order")]
fn teardown_ran_in_order(lifecycle_state: &LifecycleState) -> StepResult<()> {
    let lines = teardown_lines(lifecycle_state)?;
    let expected = ["container stop ", "inspect -f ", "container remove ", "volume rm "];

    let in_order = lines.len() == expected.len()
        && lines
            .iter()
            .zip(expected)
            .all(|(line, prefix)| line.starts_with(prefix));
    if in_order {
        Ok(())
    } else {
        Err(format!("unexpected teardown sequence: {lines:?}"))
    }
}

#[then("the stop fails at step {step}")]
fn stop_fails_at_step(lifecycle_state: &LifecycleState, step: String) -> StepResult<()> {
    expect_failure(
        &lifecycle_state.stop,
        "stop",
        &format!("TeardownStepFailed({step})"),
    )
    .map(drop)
}

#[then("no volumes were removed")]
fn no_volumes_removed(lifecycle_state: &LifecycleState) -> StepResult<()> {
    match runner(lifecycle_state)?.count("volume") {
        0 => Ok(()),
        seen => Err(format!("expected no volume commands, saw {seen}")),
    }
}
