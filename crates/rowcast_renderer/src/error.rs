//! # Renderer Error Types
//!
//! Registration errors are raised synchronously at the call site and leave
//! the tables untouched. Dispatch races are not errors and never appear here.

use rowcast_shared::ProtocolError;
use thiserror::Error;

/// Errors that can occur in the renderer core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RendererError {
    /// A required registration argument is absent (empty).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Callable name does not match `^[A-Za-z0-9]+$`.
    #[error("callable name must be alphanumeric: {0:?}")]
    InvalidFormat(String),

    /// Wire payload could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A bound property produced a value that cannot be serialized.
    #[error("failed to serialize property {property:?}: {reason}")]
    Serialization {
        /// Property whose extractor failed.
        property: String,
        /// Serializer message.
        reason: String,
    },

    /// Invalid configuration file or value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for renderer operations.
pub type RendererResult<T> = Result<T, RendererError>;
