//! Resolution of the container runtime executable.

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::{ContainerError, FixtainerError};

/// Environment variable naming the runtime executable.
pub const RUNTIME_ENV_VAR: &str = "FIXTAINER_RUNTIME";

/// Runtime executable used when nothing else is configured.
pub const DEFAULT_RUNTIME: &str = "docker";

/// Resolves which runtime executable to use and whether it can be found.
///
/// # Type Parameters
///
/// * `E` - An environment provider implementing the `mockable::Env` trait,
///   allowing for testable environment variable access.
pub struct RuntimeLocator<'a, E: mockable::Env> {
    env: &'a E,
}

impl<'a, E: mockable::Env> RuntimeLocator<'a, E> {
    /// Creates a new locator with the given environment provider.
    #[must_use]
    pub const fn new(env: &'a E) -> Self {
        Self { env }
    }

    /// Pick the runtime executable.
    ///
    /// Resolution order:
    /// 1. `configured` (from CLI, config file, or environment layer)
    /// 2. `FIXTAINER_RUNTIME`
    /// 3. `docker`
    #[must_use]
    pub fn resolve_binary(&self, configured: Option<&str>) -> String {
        configured
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(String::from)
            .or_else(|| {
                self.env
                    .string(RUNTIME_ENV_VAR)
                    .filter(|value| !value.trim().is_empty())
            })
            .unwrap_or_else(|| String::from(DEFAULT_RUNTIME))
    }

    /// Find `binary` the way a shell would.
    ///
    /// Names containing a path separator are checked as given; bare names are
    /// looked up in each `PATH` entry in order.
    #[must_use]
    pub fn locate(&self, binary: &str) -> Option<Utf8PathBuf> {
        if binary.contains(std::path::MAIN_SEPARATOR) {
            let candidate = Utf8PathBuf::from(binary);
            return is_executable(&candidate).then_some(candidate);
        }

        let search_path = self.env.string("PATH")?;
        std::env::split_paths(&search_path)
            .filter_map(|dir| Utf8PathBuf::from_path_buf(dir).ok())
            .map(|dir| dir.join(binary))
            .find(|candidate| is_executable(candidate))
    }

    /// Find `binary` or fail with `ContainerError::RuntimeUnavailable`.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::RuntimeUnavailable` when the executable cannot
    /// be found.
    pub fn ensure_available(&self, binary: &str) -> Result<Utf8PathBuf, FixtainerError> {
        self.locate(binary).ok_or_else(|| {
            FixtainerError::from(ContainerError::RuntimeUnavailable {
                binary: String::from(binary),
            })
        })
    }
}

#[cfg(unix)]
fn is_executable(path: &Utf8Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Utf8Path) -> bool {
    path.is_file()
}
