//! The command adapter between the engine and the container runtime CLI.
//!
//! The engine never talks to the runtime directly. It describes what to run as
//! an [`Invocation`] and hands it to a [`CommandRunner`], which reports the
//! captured output and exit status. Keeping this seam small lets the
//! lifecycle logic be tested without a daemon.

mod locator;

use std::process::{Output, Stdio};

use futures_util::future::BoxFuture;
use tokio::process::Command;
use tracing::debug;

use super::scope::CancelScope;

pub use locator::{DEFAULT_RUNTIME, RUNTIME_ENV_VAR, RuntimeLocator};

/// Exit code reported when a command could not be started or did not exit
/// normally.
pub const NOT_STARTED: i32 = -1;

/// Boxed future returned by [`CommandRunner::run`].
pub type RunFuture<'a> = BoxFuture<'a, CommandOutput>;

/// A single command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Run the given argv directly on the host.
    Host(Vec<String>),
    /// Run a subcommand of the container runtime on the host.
    Runtime(Vec<String>),
    /// Run the given argv inside a running container.
    InContainer {
        /// The target container.
        container_id: String,
        /// The command to run inside it.
        argv: Vec<String>,
    },
}

impl Invocation {
    /// Build a runtime subcommand invocation from string-like arguments.
    #[must_use]
    pub fn runtime<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Runtime(args.into_iter().map(Into::into).collect())
    }

    /// Return the arguments as given, without the runtime prefix.
    #[must_use]
    pub fn args(&self) -> &[String] {
        match self {
            Self::Host(argv) | Self::Runtime(argv) | Self::InContainer { argv, .. } => argv,
        }
    }
}

/// Captured result of a command.
///
/// `exit_code` is [`NOT_STARTED`] together with a populated `error` when the
/// command never ran to completion. A command that ran and exited non-zero
/// carries its real exit code and no `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Process exit code.
    pub exit_code: i32,
    /// Why the command could not run, if it could not.
    pub error: Option<String>,
}

impl CommandOutput {
    /// Output of a command that exited zero.
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    /// Output of a command that ran and exited with `exit_code`.
    #[must_use]
    pub fn exited(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
            error: None,
        }
    }

    /// Output of a command that could not be run.
    #[must_use]
    pub fn unrunnable(message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: NOT_STARTED,
            error: Some(message.into()),
        }
    }

    /// Whether the command ran and exited zero.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.exit_code == 0 && self.error.is_none()
    }

    /// Whether the command could not be run at all.
    #[must_use]
    pub const fn is_unrunnable(&self) -> bool {
        self.exit_code == NOT_STARTED && self.error.is_some()
    }

    /// Best available explanation for a failed command.
    #[must_use]
    pub fn failure_detail(&self) -> String {
        if let Some(error) = &self.error {
            return error.clone();
        }

        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            format!("exit status {}", self.exit_code)
        } else {
            String::from(stderr)
        }
    }

    fn from_process(output: &Output) -> Self {
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        match output.status.code() {
            Some(exit_code) => Self::exited(exit_code, stdout, stderr),
            None => Self {
                stdout,
                stderr,
                exit_code: NOT_STARTED,
                error: Some(String::from("process terminated by signal")),
            },
        }
    }
}

/// Behaviour required to execute commands on behalf of the engine.
///
/// Implementations must honour `scope`: once it ends, the command should be
/// abandoned and reported as unrunnable.
pub trait CommandRunner: Send + Sync {
    /// Run `invocation` to completion or until `scope` ends.
    fn run(&self, invocation: Invocation, scope: CancelScope) -> RunFuture<'_>;
}

/// Runs commands as child processes of the current process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliRunner {
    binary: String,
}

impl CliRunner {
    /// Create a runner that invokes the given runtime executable.
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Return the runtime executable.
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn argv_for(&self, invocation: Invocation) -> Vec<String> {
        match invocation {
            Invocation::Host(argv) => argv,
            Invocation::Runtime(args) => std::iter::once(self.binary.clone())
                .chain(args)
                .collect(),
            Invocation::InContainer { container_id, argv } => {
                [self.binary.clone(), String::from("exec"), container_id]
                    .into_iter()
                    .chain(argv)
                    .collect()
            }
        }
    }

    async fn execute(&self, invocation: Invocation, scope: &CancelScope) -> CommandOutput {
        let argv = self.argv_for(invocation);
        let Some((program, args)) = argv.split_first() else {
            return CommandOutput::unrunnable("empty command line");
        };

        if let Some(reason) = scope.expiry() {
            return CommandOutput::unrunnable(format!("{program} not started: {reason}"));
        }

        debug!(command = %argv.join(" "), "executing command");

        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null()).kill_on_drop(true);

        tokio::select! {
            result = command.output() => match result {
                Ok(output) => CommandOutput::from_process(&output),
                Err(error) => CommandOutput::unrunnable(format!("failed to run {program}: {error}")),
            },
            reason = scope.expired() => {
                CommandOutput::unrunnable(format!("{program} interrupted: {reason}"))
            }
        }
    }
}

impl CommandRunner for CliRunner {
    fn run(&self, invocation: Invocation, scope: CancelScope) -> RunFuture<'_> {
        Box::pin(async move { self.execute(invocation, &scope).await })
    }
}
