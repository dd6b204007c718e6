//! Disposable, self-cleaning containers for use as test fixtures.
//!
//! `fixtainer` starts a container through the runtime's command-line tool,
//! waits until it is running and its ports are published, lets callers block
//! on arbitrary readiness probes, and tears the container and its volumes
//! down again in a fixed order.
//!
//! # Architecture
//!
//! The runtime is only ever driven through its textual CLI output. Every
//! command goes through the [`engine::CommandRunner`] seam, so the lifecycle
//! logic can be exercised without a daemon. Polling phases run as
//! independent tasks bounded by an [`engine::CancelScope`], and a container
//! that fails after start-up is cleaned up on a budget of its own.
//!
//! # Modules
//!
//! - [`api`]: Orchestration functions behind the `fixtainer` subcommands
//! - [`config`]: Launch/wait configuration and layered application config
//! - [`engine`]: Container lifecycle and readiness coordination
//! - [`error`]: Semantic error types for the application

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
