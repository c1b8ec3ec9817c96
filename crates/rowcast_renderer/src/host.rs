//! # Host Capabilities
//!
//! Traits the hosting UI framework implements so the renderer core can run
//! inside it. The core never reaches into the framework's component tree,
//! transport or serializer; it only talks through these seams.
//!
//! ```text
//! rowcast_renderer defines:     host framework implements:
//! ┌──────────────────┐          ┌──────────────────┐
//! │ trait Container  │ ←─────── │ impl Container   │
//! │ trait KeyMapper  │ ←─────── │ impl KeyMapper   │
//! └──────────────────┘          └──────────────────┘
//! ```
//!
//! ## Threading
//!
//! All calls happen under the host's session lock. The `Send + Sync`
//! bounds let a host keep its session behind `Arc`; they do not make the
//! core safe to drive from several threads at once.
//!
//! ## Re-entrancy
//!
//! Hosts must release their own locks before invoking an
//! [`AttachListener`] or [`ChannelCallback`]: listeners call straight back
//! into [`ClientExecutor::execute`] and [`Container::session_id`].

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use rowcast_shared::{ChannelHandle, ClientInstruction, LifecycleEvent, NodeId, SessionId};

/// Callback fired on every attach-state transition of a container.
pub type AttachListener = Arc<dyn Fn(LifecycleEvent) + Send + Sync>;

/// Callback fired with the decoded argument list of an incoming client call.
pub type ChannelCallback = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Handle that undoes one registration.
///
/// Removal is idempotent: the first [`Registration::remove`] runs the
/// cleanup, later calls do nothing.
pub struct Registration {
    remove: Option<Box<dyn FnOnce() + Send>>,
}

impl Registration {
    /// Creates a registration that runs `remove` once.
    pub fn new(remove: impl FnOnce() + Send + 'static) -> Self {
        Self {
            remove: Some(Box::new(remove)),
        }
    }

    /// Creates a registration with nothing to undo.
    #[must_use]
    pub fn noop() -> Self {
        Self { remove: None }
    }

    /// Folds several registrations into one, removed in the given order.
    pub fn combine(registrations: impl IntoIterator<Item = Registration>) -> Self {
        let registrations: Vec<Registration> = registrations.into_iter().collect();
        Self::new(move || {
            for mut registration in registrations {
                registration.remove();
            }
        })
    }

    /// Runs the cleanup if it has not run yet.
    pub fn remove(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }

    /// Returns true until the cleanup has run.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.remove.is_some()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("active", &self.is_active())
            .finish()
    }
}

/// A registered return channel.
#[derive(Debug)]
pub struct ChannelRegistration {
    /// Handle the client addresses the channel with.
    pub handle: ChannelHandle,
    /// Removes the channel from the host.
    pub registration: Registration,
}

/// Attach-lifecycle notifications of a container node.
pub trait AttachNotifier {
    /// Returns true if the node is currently part of a live client tree.
    fn is_attached(&self) -> bool;

    /// Subscribes to attach / detach transitions.
    fn add_attach_listener(&self, listener: AttachListener) -> Registration;
}

/// Server-callable-from-client channel primitive.
pub trait ReturnChannelMap {
    /// Registers a channel. `on_message` receives the decoded argument list
    /// of every call the client sends through the returned handle.
    fn register_channel(&self, on_message: ChannelCallback) -> ChannelRegistration;
}

/// Sends instructions to the client runtime.
pub trait ClientExecutor {
    /// Executes `instruction` on the client, addressed to this container.
    /// Fire-and-forget: no acknowledgment is expected.
    fn execute(&self, instruction: ClientInstruction);
}

/// A DOM-like container node that can host renderers.
pub trait Container: AttachNotifier + ReturnChannelMap + ClientExecutor + Send + Sync {
    /// Address of the node.
    fn node_id(&self) -> NodeId;

    /// Session the node belongs to. `None` while detached.
    fn session_id(&self) -> Option<SessionId>;
}

/// Maps transient client-visible item keys back to server items.
pub trait KeyMapper<T>: Send + Sync {
    /// Resolves `key`. `None` once the item left the tracked window.
    fn resolve(&self, key: &str) -> Option<T>;
}

impl<T, F> KeyMapper<T> for F
where
    F: Fn(&str) -> Option<T> + Send + Sync,
{
    fn resolve(&self, key: &str) -> Option<T> {
        self(key)
    }
}
