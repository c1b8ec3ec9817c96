//! Error types for the reference host and the client simulator.

use rowcast_shared::{ChannelHandle, NodeId};
use thiserror::Error;

/// Errors that can occur in the host or the simulated client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Node does not exist in the component tree.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// Node already has a parent or is a root.
    #[error("{0} is already part of a tree")]
    AlreadyPlaced(NodeId),

    /// Node is not a root.
    #[error("{0} is not a root")]
    NotARoot(NodeId),

    /// Appending would make a node its own ancestor.
    #[error("cannot append {child} under its own descendant {parent}")]
    Cycle {
        /// Intended parent.
        parent: NodeId,
        /// Intended child.
        child: NodeId,
    },

    /// No renderer is installed in the addressed slot.
    #[error("no renderer {renderer_name:?} installed on {node}")]
    NotInstalled {
        /// Container node.
        node: NodeId,
        /// Renderer slot.
        renderer_name: String,
    },

    /// The installed renderer does not advertise the callable.
    #[error("callable not advertised: {0}")]
    UnknownCallable(String),

    /// Item payload has no item key.
    #[error("item payload has no key")]
    MissingItemKey,

    /// The channel is no longer registered on the host.
    #[error("channel closed: {}:{}", .0.node, .0.channel)]
    ChannelClosed(ChannelHandle),
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;
