//! Scenario state for lifecycle behavioural tests.

use std::sync::Arc;

use fixtainer::engine::Container;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

use crate::scripted_runner::ScriptedRunner;

/// Classified outcome of an engine operation.
#[derive(Debug, Clone)]
pub(crate) enum Outcome {
    /// The operation succeeded.
    Succeeded,
    /// The operation failed; `kind` names the error variant.
    Failed {
        /// Error variant name used by assertions.
        kind: String,
        /// Rendered error message.
        message: String,
    },
}

#[derive(Default, ScenarioState)]
pub(crate) struct LifecycleState {
    pub(crate) runner: Slot<ScriptedRunner>,
    pub(crate) container: Slot<Arc<Container<ScriptedRunner>>>,
    pub(crate) launch: Slot<Outcome>,
    pub(crate) wait: Slot<Outcome>,
    pub(crate) stop: Slot<Outcome>,
}

#[fixture]
pub(crate) fn lifecycle_state() -> LifecycleState {
    let state = LifecycleState::default();
    state.runner.set(ScriptedRunner::default());
    state
}
