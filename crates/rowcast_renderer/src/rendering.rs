//! # Rendering
//!
//! A live binding of one descriptor to one container and one key mapper.
//!
//! ## Lifecycle
//!
//! ```text
//!             render()
//!                │
//!                ▼
//!          ┌──────────┐  attach / install   ┌──────────┐
//!          │ Detached │ ──────────────────► │ Attached │
//!          │          │ ◄────────────────── │          │
//!          └──────────┘  detach (no-op)     └──────────┘
//!                │                               │
//!                └────────── unbind() ───────────┘
//!                                │   uninstall
//!                                ▼
//!                          ┌──────────┐
//!                          │ Released │  terminal
//!                          └──────────┘
//! ```
//!
//! Every attach re-sends the install: the client subtree may have been
//! recreated while detached. Detach sends nothing.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;

use rowcast_shared::{
    ChannelHandle, ClientInstruction, DispatchCall, InstallInstruction, LifecycleEvent, Namespace,
    UninstallInstruction,
};

use crate::callables::{route, DispatchOutcome};
use crate::descriptor::{DataGenerator, DescriptorInner};
use crate::error::RendererResult;
use crate::host::{AttachListener, ChannelCallback, Container, KeyMapper, Registration};

/// Where a rendering is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingState {
    /// Bound, container not attached. Nothing installed on the client.
    Detached,
    /// Bound, container attached. The renderer was installed.
    Attached,
    /// Unbound. Terminal.
    Released,
}

impl BindingState {
    /// Returns true once the rendering has been unbound.
    #[inline]
    #[must_use]
    pub const fn is_released(self) -> bool {
        matches!(self, Self::Released)
    }
}

/// Everything needed to build an install instruction.
struct Installer<T> {
    descriptor: Arc<DescriptorInner<T>>,
    renderer_name: String,
    channel: ChannelHandle,
}

impl<T> Installer<T> {
    fn install(&self, container: &dyn Container) {
        let Some(session_id) = container.session_id() else {
            tracing::warn!(
                "Install skipped, {} reports no session (renderer: {})",
                container.node_id(),
                self.renderer_name
            );
            return;
        };

        // Computed per install so reattachment advertises late registrations.
        let callables = self.descriptor.callables.read().names();

        tracing::debug!(
            "Installing renderer {} on {} (namespace: {}, callables: {})",
            self.renderer_name,
            container.node_id(),
            self.descriptor.namespace,
            callables.len()
        );

        container.execute(ClientInstruction::Install(InstallInstruction {
            renderer_name: self.renderer_name.clone(),
            template_expression: self.descriptor.template_expression.clone(),
            transpile: self.descriptor.mode.requires_transpile(),
            channel: self.channel,
            callables,
            namespace: self.descriptor.namespace.clone(),
            session_id,
        }));
    }

    fn uninstall(&self, container: &dyn Container) {
        tracing::debug!(
            "Uninstalling renderer {} from {} (namespace: {})",
            self.renderer_name,
            container.node_id(),
            self.descriptor.namespace
        );

        container.execute(ClientInstruction::Uninstall(UninstallInstruction {
            renderer_name: self.renderer_name.clone(),
            namespace: self.descriptor.namespace.clone(),
        }));
    }
}

/// Live binding returned by [`crate::RendererDescriptor::render`].
///
/// Dropping a rendering does not unbind it; call [`Rendering::unbind`].
pub struct Rendering<T> {
    installer: Arc<Installer<T>>,
    container: Arc<dyn Container>,
    key_mapper: Arc<dyn KeyMapper<T>>,
    state: Arc<Mutex<BindingState>>,
    registration: Mutex<Registration>,
}

impl<T: 'static> Rendering<T> {
    pub(crate) fn start(
        descriptor: Arc<DescriptorInner<T>>,
        container: Arc<dyn Container>,
        key_mapper: Arc<dyn KeyMapper<T>>,
        renderer_name: String,
    ) -> Self {
        let state = Arc::new(Mutex::new(BindingState::Detached));

        // The channel must exist before any install reaches the client.
        let on_message = dispatcher(
            Arc::clone(&descriptor),
            Arc::clone(&key_mapper),
            Arc::clone(&state),
        );
        let channel = container.register_channel(on_message);

        let installer = Arc::new(Installer {
            descriptor,
            renderer_name,
            channel: channel.handle,
        });

        let listener = attach_listener(
            Arc::downgrade(&container),
            Arc::clone(&installer),
            Arc::clone(&state),
        );
        let listener = container.add_attach_listener(listener);

        tracing::debug!(
            "Rendered {} on {} (namespace: {}, channel: {})",
            installer.renderer_name,
            container.node_id(),
            installer.descriptor.namespace,
            channel.handle.channel
        );

        let rendering = Self {
            installer,
            container,
            key_mapper,
            state,
            registration: Mutex::new(Registration::combine([listener, channel.registration])),
        };

        if rendering.container.is_attached() {
            *rendering.state.lock() = BindingState::Attached;
            rendering.installer.install(rendering.container.as_ref());
        }

        rendering
    }

    /// Per-item payload writer of the rendered descriptor.
    #[must_use]
    pub fn data_generator(&self) -> DataGenerator<T> {
        DataGenerator::from_inner(Arc::clone(&self.installer.descriptor))
    }
}

impl<T> Rendering<T> {
    /// Handle of the return channel the client calls through.
    #[must_use]
    pub fn channel(&self) -> ChannelHandle {
        self.installer.channel
    }

    /// Renderer slot on the container.
    #[must_use]
    pub fn renderer_name(&self) -> &str {
        &self.installer.renderer_name
    }

    /// Namespace of the rendered descriptor.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.installer.descriptor.namespace
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> BindingState {
        *self.state.lock()
    }

    /// Routes a raw client payload the way the return channel does.
    ///
    /// Races (unknown callable, stale item, released rendering) are reported
    /// through the outcome, not as errors.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RendererError::Protocol`] if `payload` is not a
    /// `(function name, item key, arguments)` triple.
    pub fn dispatch(&self, payload: &[Value]) -> RendererResult<DispatchOutcome> {
        dispatch_payload(
            &self.installer.descriptor,
            self.key_mapper.as_ref(),
            &self.state,
            payload,
        )
    }

    /// Releases the binding: drops the attach listener and the return
    /// channel, then sends one uninstall to the client.
    ///
    /// The uninstall is sent even if the container never attached. Calling
    /// this again does nothing.
    pub fn unbind(&self) {
        {
            let mut state = self.state.lock();
            if state.is_released() {
                return;
            }
            *state = BindingState::Released;
        }

        let mut registration = std::mem::replace(&mut *self.registration.lock(), Registration::noop());
        registration.remove();

        self.installer.uninstall(self.container.as_ref());
        tracing::debug!(
            "Unbound {} from {}",
            self.installer.renderer_name,
            self.container.node_id()
        );
    }
}

impl<T> fmt::Debug for Rendering<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rendering")
            .field("renderer_name", &self.installer.renderer_name)
            .field("namespace", &self.installer.descriptor.namespace)
            .field("node", &self.container.node_id())
            .field("channel", &self.installer.channel)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn attach_listener<T: 'static>(
    container: Weak<dyn Container>,
    installer: Arc<Installer<T>>,
    state: Arc<Mutex<BindingState>>,
) -> AttachListener {
    Arc::new(move |event: LifecycleEvent| {
        let Some(container) = container.upgrade() else {
            return;
        };

        {
            let mut state = state.lock();
            if state.is_released() {
                return;
            }
            *state = if event.is_attach() {
                BindingState::Attached
            } else {
                BindingState::Detached
            };
        }

        if event.is_attach() {
            installer.install(container.as_ref());
        }
    })
}

fn dispatcher<T: 'static>(
    descriptor: Arc<DescriptorInner<T>>,
    key_mapper: Arc<dyn KeyMapper<T>>,
    state: Arc<Mutex<BindingState>>,
) -> ChannelCallback {
    Arc::new(move |payload: &[Value]| {
        if let Err(e) = dispatch_payload(&descriptor, key_mapper.as_ref(), &state, payload) {
            tracing::warn!("Dropping dispatch for {}: {}", descriptor.namespace, e);
        }
    })
}

fn dispatch_payload<T>(
    descriptor: &DescriptorInner<T>,
    key_mapper: &dyn KeyMapper<T>,
    state: &Mutex<BindingState>,
    payload: &[Value],
) -> RendererResult<DispatchOutcome> {
    if state.lock().is_released() {
        tracing::trace!("Dispatch ignored, rendering released ({})", descriptor.namespace);
        return Ok(DispatchOutcome::Released);
    }

    let call = DispatchCall::decode(payload)?;

    // Cloned out so the handler may register callables on this descriptor.
    let handler = descriptor.callables.read().handler(&call.function_name);
    Ok(route(handler, &call, key_mapper))
}
