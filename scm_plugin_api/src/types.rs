use scm_api::Handle;

/// Errors surfaced by either side of the SCM bridge.
#[derive(Debug, thiserror::Error)]
pub enum ScmError {
    /// Operation has no implementation in this bridge.
    #[error("operation '{operation}' is not implemented")]
    NotImplemented {
        /// Name of the unsupported operation.
        operation: &'static str,
    },
    /// The source control behind this handle was already disposed.
    #[error("source control {handle} is disposed")]
    Disposed {
        /// Handle of the disposed provider.
        handle: Handle,
    },
    /// The allocator ran out of fresh identifiers.
    #[error("identifier space exhausted")]
    HandlesExhausted,
    /// The transport has no proxy for the requested contract.
    #[error("no proxy registered for contract '{contract}'")]
    UnknownContract {
        /// Name of the requested contract.
        contract: String,
    },
    /// The transport failed to accept a message.
    #[error("transport failure: {message}")]
    Transport {
        /// Human-readable error message.
        message: String,
    },
}

impl ScmError {
    /// Helper to construct a transport failure from any displayable message.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

/// Convenience result alias for bridge operations.
pub type ScmResult<T> = std::result::Result<T, ScmError>;
