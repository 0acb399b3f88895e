//! Host side of the SCM bridge.
//!
//! The crate is layered around three primary responsibilities:
//! - the registrar that maps plugin handles to registered repositories
//! - provider adapters that turn feature updates into typed events
//! - wiring helpers: an in-process transport, configuration and message replay

#![warn(
    clippy::all,
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    missing_docs
)]
#![cfg_attr(
    not(test),
    deny(
        clippy::dbg_macro,
        clippy::expect_used,
        clippy::panic,
        clippy::print_stderr,
        clippy::print_stdout,
        clippy::todo,
        clippy::unwrap_used
    )
)]

use std::sync::PoisonError;

use scm_api::Handle;
use scm_plugin_api::ScmError;

/// Host-native provider adapter and its event registry.
pub mod adapter;
/// In-process wiring of both bridge halves.
pub mod bridge;
/// Serde-backed settings.
pub mod config;
/// Tracing subscriber setup.
pub mod logging;
/// Handle-to-repository registrar serving the `ScmMain` contract.
pub mod registrar;
/// Replay of recorded host-bound messages.
pub mod replay;
/// In-memory central SCM service.
pub mod service;
/// Ordered in-process transport.
pub mod transport;

pub use adapter::{ProviderEvents, ScmProviderAdapter};
pub use bridge::LocalBridge;
pub use config::{
    BridgeConfig, DuplicateHandlePolicy, LogFormat, LoggingConfig, RegistrarConfig,
    SnapshotPolicy,
};
pub use registrar::{Delivery, ScmMainImpl};
pub use replay::{replay, ReplayStats};
pub use service::{DefaultScmService, ServiceRepository};
pub use transport::{LoopbackChannel, LoopbackProtocol};

/// Common result type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the host side.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A registration reused a live handle while duplicates are rejected.
    #[error("source control handle {handle} is already registered")]
    DuplicateHandle {
        /// Handle that was already in use.
        handle: Handle,
    },
    /// A bridge contract call failed for one handle.
    #[error("source control {handle}: {source}")]
    Scm {
        /// Handle the failing call addressed.
        handle: Handle,
        /// Failure reported by the contract implementation.
        #[source]
        source: ScmError,
    },
    /// Connecting the plugin side to a transport failed.
    #[error("failed to connect to the SCM contract: {source}")]
    Connect {
        /// Failure reported by the transport.
        #[source]
        source: ScmError,
    },
    /// A recorded message could not be decoded.
    #[error("line {line}: malformed SCM message: {source}")]
    Decode {
        /// One-based line number in the message log.
        line: usize,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// Reading a message stream failed.
    #[error("line {line}: failed to read message: {source}")]
    Read {
        /// One-based line number being read.
        line: usize,
        /// Source I/O error returned by the standard library.
        #[source]
        source: std::io::Error,
    },
    /// Filesystem interaction failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Filesystem path involved in the failed operation.
        path: String,
        /// Source I/O error returned by the standard library.
        #[source]
        source: std::io::Error,
    },
    /// A configuration file did not parse.
    #[error("invalid configuration in {path}: {source}")]
    Config {
        /// Path of the configuration file.
        path: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// A lock guarding bridge state was poisoned by a panicking thread.
    #[error("bridge state lock poisoned")]
    LockPoisoned,
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Self::LockPoisoned
    }
}
