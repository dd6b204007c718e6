//! Shared test doubles for the engine's unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use mockall::mock;

use super::runtime::{CommandOutput, CommandRunner, Invocation, RunFuture};
use super::scope::CancelScope;

mock! {
    #[derive(Debug)]
    pub Runner {}

    impl CommandRunner for Runner {
        fn run(&self, invocation: Invocation, scope: CancelScope) -> RunFuture<'_>;
    }
}

/// Invocations observed by a scripted mock, in call order.
pub(crate) type CallLog = Arc<Mutex<Vec<Invocation>>>;

/// Container id used throughout the engine tests.
pub(crate) const CONTAINER_ID: &str = "0123456789ab";

/// Build a mock runner whose replies are computed by `responder`.
pub(crate) fn scripted_runner<F>(responder: F) -> (MockRunner, CallLog)
where
    F: Fn(&Invocation) -> CommandOutput + Send + Sync + 'static,
{
    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
    let calls_for_closure = Arc::clone(&calls);
    let mut runner = MockRunner::new();

    runner.expect_run().returning(move |invocation, _scope| {
        let output = responder(&invocation);
        calls_for_closure
            .lock()
            .expect("call log lock should succeed")
            .push(invocation);
        Box::pin(async move { output })
    });

    (runner, calls)
}

/// Replies in order, repeating the final reply once the queue is drained.
pub(crate) struct Replies {
    queue: Mutex<VecDeque<CommandOutput>>,
}

impl Replies {
    pub(crate) fn new(outputs: impl IntoIterator<Item = CommandOutput>) -> Self {
        Self {
            queue: Mutex::new(outputs.into_iter().collect()),
        }
    }

    pub(crate) fn next(&self) -> CommandOutput {
        let mut queue = self.queue.lock().expect("reply lock should succeed");
        if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        }
    }
}

/// Join the runtime arguments of `invocation` for prefix matching.
pub(crate) fn command_line(invocation: &Invocation) -> String {
    invocation.args().join(" ")
}

/// Count the recorded invocations whose arguments start with `prefix`.
pub(crate) fn count_calls(calls: &CallLog, prefix: &str) -> usize {
    calls
        .lock()
        .expect("call log lock should succeed")
        .iter()
        .filter(|invocation| command_line(invocation).starts_with(prefix))
        .count()
}

/// Snapshot of every recorded invocation.
pub(crate) fn recorded(calls: &CallLog) -> Vec<Invocation> {
    calls
        .lock()
        .expect("call log lock should succeed")
        .clone()
}
