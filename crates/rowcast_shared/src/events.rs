//! Lifecycle events delivered by the host to attach listeners.

use serde::{Deserialize, Serialize};

/// Attach-state transition of a container node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// The node became part of a live client tree (first attach or reattach).
    Attached,
    /// The node left the live client tree. Client state may be destroyed.
    Detached,
}

impl LifecycleEvent {
    /// Returns true for [`LifecycleEvent::Attached`].
    #[inline]
    #[must_use]
    pub const fn is_attach(self) -> bool {
        matches!(self, Self::Attached)
    }
}
