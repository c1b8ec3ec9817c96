//! # Reference Host
//!
//! One server session: a component tree, attach listeners, return channels
//! and an outbound queue of client instructions.
//!
//! ```text
//!   Rendering ──execute──► Element ──► outbound queue ──► ClientRuntime
//!        ▲                                                     │
//!        └──── channel callback ◄── Host::deliver ◄────────────┘
//! ```
//!
//! Listener and channel callbacks are cloned out of the session state and
//! invoked after the lock is released; they call straight back into the host.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde_json::Value;

use rowcast_renderer::{
    AttachListener, AttachNotifier, ChannelCallback, ChannelRegistration, ClientExecutor,
    Container, Registration, ReturnChannelMap,
};
use rowcast_shared::{ChannelHandle, ClientInstruction, LifecycleEvent, NodeId, SessionId};

use crate::error::HostResult;
use crate::tree::ComponentTree;

/// A client instruction addressed to one container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outbound {
    /// Container the instruction is executed on.
    pub node: NodeId,
    /// The instruction.
    pub instruction: ClientInstruction,
}

struct HostState {
    tree: ComponentTree,
    listeners: HashMap<NodeId, Vec<(u64, AttachListener)>>,
    channels: HashMap<ChannelHandle, ChannelCallback>,
    next_channel: HashMap<NodeId, u32>,
    next_listener: u64,
}

struct HostInner {
    session_id: SessionId,
    state: Mutex<HostState>,
    outbound_tx: Sender<Outbound>,
    outbound_rx: Receiver<Outbound>,
}

/// Handle to one host session. Clones share the session.
#[derive(Clone)]
pub struct Host {
    inner: Arc<HostInner>,
}

impl Host {
    /// Creates an empty session.
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        let (outbound_tx, outbound_rx) = unbounded();
        Self {
            inner: Arc::new(HostInner {
                session_id: SessionId::new(session_id),
                state: Mutex::new(HostState {
                    tree: ComponentTree::new(),
                    listeners: HashMap::new(),
                    channels: HashMap::new(),
                    next_channel: HashMap::new(),
                    next_listener: 0,
                }),
                outbound_tx,
                outbound_rx,
            }),
        }
    }

    /// Session identifier sent with every install.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    /// Creates a detached element.
    #[must_use]
    pub fn create_element(&self) -> Arc<Element> {
        let node = self.inner.state.lock().tree.create_node();
        Arc::new(Element {
            host: self.clone(),
            node,
        })
    }

    /// Makes `element` an attached root.
    ///
    /// # Errors
    ///
    /// See [`ComponentTree::attach_root`].
    pub fn attach_root(&self, element: &Element) -> HostResult<()> {
        self.mutate(LifecycleEvent::Attached, |tree| tree.attach_root(element.node))
    }

    /// Detaches a root and its subtree.
    ///
    /// # Errors
    ///
    /// See [`ComponentTree::detach_root`].
    pub fn detach_root(&self, element: &Element) -> HostResult<()> {
        self.mutate(LifecycleEvent::Detached, |tree| tree.detach_root(element.node))
    }

    /// Appends `child` under `parent`.
    ///
    /// # Errors
    ///
    /// See [`ComponentTree::append_child`].
    pub fn append_child(&self, parent: &Element, child: &Element) -> HostResult<()> {
        self.mutate(LifecycleEvent::Attached, |tree| {
            tree.append_child(parent.node, child.node)
        })
    }

    /// Unlinks `element` from its parent, detaching its subtree.
    ///
    /// # Errors
    ///
    /// See [`ComponentTree::remove`].
    pub fn remove(&self, element: &Element) -> HostResult<()> {
        self.mutate(LifecycleEvent::Detached, |tree| tree.remove(element.node))
    }

    /// Plays an incoming client call on a return channel.
    ///
    /// Returns false if no channel is registered under `handle`.
    pub fn deliver(&self, handle: ChannelHandle, arguments: &[Value]) -> bool {
        let callback = self.inner.state.lock().channels.get(&handle).cloned();
        match callback {
            Some(callback) => {
                callback(arguments);
                true
            }
            None => {
                tracing::warn!("Call on closed channel {}:{}", handle.node, handle.channel);
                false
            }
        }
    }

    /// Takes every queued outbound instruction.
    #[must_use]
    pub fn drain(&self) -> Vec<Outbound> {
        self.inner.outbound_rx.try_iter().collect()
    }

    /// Receiver side of the outbound queue, for a transport thread.
    #[must_use]
    pub fn outbound(&self) -> Receiver<Outbound> {
        self.inner.outbound_rx.clone()
    }

    /// Number of registered return channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.inner.state.lock().channels.len()
    }

    /// Number of attach listeners on `element`.
    #[must_use]
    pub fn listener_count(&self, element: &Element) -> usize {
        self.inner
            .state
            .lock()
            .listeners
            .get(&element.node)
            .map_or(0, Vec::len)
    }

    /// Applies a tree change, then notifies the listeners of every node
    /// that transitioned.
    fn mutate(
        &self,
        event: LifecycleEvent,
        change: impl FnOnce(&mut ComponentTree) -> HostResult<Vec<NodeId>>,
    ) -> HostResult<()> {
        let notify: Vec<AttachListener> = {
            let mut state = self.inner.state.lock();
            let changed = change(&mut state.tree)?;
            changed
                .iter()
                .filter_map(|node| state.listeners.get(node))
                .flat_map(|listeners| listeners.iter().map(|(_, l)| Arc::clone(l)))
                .collect()
        };

        tracing::trace!("{:?} fired for {} listeners", event, notify.len());
        for listener in notify {
            listener(event);
        }
        Ok(())
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("session_id", &self.inner.session_id)
            .field("channels", &self.channel_count())
            .finish()
    }
}

/// A container node of a [`Host`].
pub struct Element {
    host: Host,
    node: NodeId,
}

impl Element {
    /// Address of the element.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Host session owning the element.
    #[must_use]
    pub fn host(&self) -> &Host {
        &self.host
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element").field("node", &self.node).finish()
    }
}

impl AttachNotifier for Element {
    fn is_attached(&self) -> bool {
        self.host.inner.state.lock().tree.is_attached(self.node)
    }

    fn add_attach_listener(&self, listener: AttachListener) -> Registration {
        let id = {
            let mut state = self.host.inner.state.lock();
            state.next_listener += 1;
            let id = state.next_listener;
            state.listeners.entry(self.node).or_default().push((id, listener));
            id
        };

        let host: Weak<HostInner> = Arc::downgrade(&self.host.inner);
        let node = self.node;
        Registration::new(move || {
            if let Some(host) = host.upgrade() {
                let mut state = host.state.lock();
                if let Some(listeners) = state.listeners.get_mut(&node) {
                    listeners.retain(|(other, _)| *other != id);
                    if listeners.is_empty() {
                        state.listeners.remove(&node);
                    }
                }
            }
        })
    }
}

impl ReturnChannelMap for Element {
    fn register_channel(&self, on_message: ChannelCallback) -> ChannelRegistration {
        let handle = {
            let mut state = self.host.inner.state.lock();
            let next = state.next_channel.entry(self.node).or_insert(0);
            *next += 1;
            let handle = ChannelHandle::new(self.node, *next);
            state.channels.insert(handle, on_message);
            handle
        };

        let host: Weak<HostInner> = Arc::downgrade(&self.host.inner);
        ChannelRegistration {
            handle,
            registration: Registration::new(move || {
                if let Some(host) = host.upgrade() {
                    host.state.lock().channels.remove(&handle);
                }
            }),
        }
    }
}

impl ClientExecutor for Element {
    fn execute(&self, instruction: ClientInstruction) {
        tracing::trace!(
            "Queueing {} for {} on {}",
            instruction.verb(),
            instruction.renderer_name(),
            self.node
        );
        // The host owns the receiver, so the queue cannot disconnect.
        self.host
            .inner
            .outbound_tx
            .send(Outbound {
                node: self.node,
                instruction,
            })
            .ok();
    }
}

impl Container for Element {
    fn node_id(&self) -> NodeId {
        self.node
    }

    fn session_id(&self) -> Option<SessionId> {
        self.is_attached()
            .then(|| self.host.inner.session_id.clone())
    }
}
