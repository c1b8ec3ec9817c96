//! In-memory container for unit tests.
//!
//! Records every executed instruction and lets tests drive attach / detach
//! and client calls by hand. Callbacks run after the state lock is released,
//! the same way a real host must run them.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use rowcast_shared::{ChannelHandle, ClientInstruction, LifecycleEvent, NodeId, SessionId};

use crate::host::{
    AttachListener, AttachNotifier, ChannelCallback, ChannelRegistration, ClientExecutor,
    Container, Registration, ReturnChannelMap,
};

#[derive(Default)]
struct MockState {
    attached: bool,
    has_session: bool,
    leak_channels: bool,
    next_id: u32,
    listeners: Vec<(u32, AttachListener)>,
    channels: HashMap<u32, ChannelCallback>,
    instructions: Vec<ClientInstruction>,
}

/// Container double for renderer tests.
pub(crate) struct MockContainer {
    node: NodeId,
    state: Arc<Mutex<MockState>>,
}

impl MockContainer {
    /// Session reported while attached.
    pub(crate) const SESSION: &'static str = "ROOT-2521314";

    pub(crate) fn detached(node: u64) -> Arc<Self> {
        Arc::new(Self {
            node: NodeId::new(node),
            state: Arc::new(Mutex::new(MockState {
                has_session: true,
                ..MockState::default()
            })),
        })
    }

    pub(crate) fn attached(node: u64) -> Arc<Self> {
        let container = Self::detached(node);
        container.state.lock().attached = true;
        container
    }

    /// Reports no session even while attached.
    pub(crate) fn without_session(self: Arc<Self>) -> Arc<Self> {
        self.state.lock().has_session = false;
        self
    }

    /// Keeps channels reachable after their registration is removed.
    pub(crate) fn leaking_channels(self: Arc<Self>) -> Arc<Self> {
        self.state.lock().leak_channels = true;
        self
    }

    pub(crate) fn attach(&self) {
        self.transition(true);
    }

    pub(crate) fn detach(&self) {
        self.transition(false);
    }

    fn transition(&self, attached: bool) {
        let listeners: Vec<AttachListener> = {
            let mut state = self.state.lock();
            if state.attached == attached {
                return;
            }
            state.attached = attached;
            state.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };

        let event = if attached {
            LifecycleEvent::Attached
        } else {
            LifecycleEvent::Detached
        };
        for listener in listeners {
            listener(event);
        }
    }

    /// Plays a client call. Returns false if no channel has `handle`.
    pub(crate) fn deliver(&self, handle: ChannelHandle, payload: &[Value]) -> bool {
        if handle.node != self.node {
            return false;
        }
        let callback = self.state.lock().channels.get(&handle.channel).cloned();
        match callback {
            Some(callback) => {
                callback(payload);
                true
            }
            None => false,
        }
    }

    pub(crate) fn instructions(&self) -> Vec<ClientInstruction> {
        self.state.lock().instructions.clone()
    }

    pub(crate) fn install_count(&self) -> usize {
        self.state
            .lock()
            .instructions
            .iter()
            .filter(|i| i.is_install())
            .count()
    }

    pub(crate) fn uninstall_count(&self) -> usize {
        self.state
            .lock()
            .instructions
            .iter()
            .filter(|i| !i.is_install())
            .count()
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    pub(crate) fn channel_count(&self) -> usize {
        self.state.lock().channels.len()
    }
}

impl AttachNotifier for MockContainer {
    fn is_attached(&self) -> bool {
        self.state.lock().attached
    }

    fn add_attach_listener(&self, listener: AttachListener) -> Registration {
        let id = {
            let mut state = self.state.lock();
            state.next_id += 1;
            let id = state.next_id;
            state.listeners.push((id, listener));
            id
        };

        let state = Arc::clone(&self.state);
        Registration::new(move || state.lock().listeners.retain(|(other, _)| *other != id))
    }
}

impl ReturnChannelMap for MockContainer {
    fn register_channel(&self, on_message: ChannelCallback) -> ChannelRegistration {
        let id = {
            let mut state = self.state.lock();
            state.next_id += 1;
            let id = state.next_id;
            state.channels.insert(id, on_message);
            id
        };

        let state = Arc::clone(&self.state);
        ChannelRegistration {
            handle: ChannelHandle::new(self.node, id),
            registration: Registration::new(move || {
                let mut state = state.lock();
                if !state.leak_channels {
                    state.channels.remove(&id);
                }
            }),
        }
    }
}

impl ClientExecutor for MockContainer {
    fn execute(&self, instruction: ClientInstruction) {
        self.state.lock().instructions.push(instruction);
    }
}

impl Container for MockContainer {
    fn node_id(&self) -> NodeId {
        self.node
    }

    fn session_id(&self) -> Option<SessionId> {
        let state = self.state.lock();
        (state.attached && state.has_session).then(|| SessionId::new(Self::SESSION))
    }
}
