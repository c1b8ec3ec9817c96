//! # Client Runtime Simulator
//!
//! Plays the browser side of the protocol against a [`Host`]: applies
//! outbound instructions, renders item payloads through the installed
//! renderer, and sends callable invocations back through its channel.
//!
//! Renderers are tracked per `(container, renderer name)` slot. An install
//! replaces whatever the slot held; an uninstall only clears the slot if
//! the installed renderer carries the same namespace, so a late uninstall of
//! an old binding never removes a newer one.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

use rowcast_shared::{
    ChannelHandle, ClientInstruction, DispatchCall, InstallInstruction, Namespace, NodeId,
    SessionId, ITEM_KEY_FIELD, NATIVE_EVENT_FIELD,
};

use crate::error::{HostError, HostResult};
use crate::host::{Host, Outbound};

/// A renderer as installed on the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstalledRenderer {
    /// Template the client evaluates.
    pub template_expression: String,
    /// Whether the template was transpiled.
    pub transpile: bool,
    /// Channel callables are sent through.
    pub channel: ChannelHandle,
    /// Advertised callables.
    pub callables: Vec<String>,
    /// Renderer identity.
    pub namespace: Namespace,
    /// Session the channel belongs to.
    pub session_id: SessionId,
}

impl From<InstallInstruction> for InstalledRenderer {
    fn from(install: InstallInstruction) -> Self {
        Self {
            template_expression: install.template_expression,
            transpile: install.transpile,
            channel: install.channel,
            callables: install.callables,
            namespace: install.namespace,
            session_id: install.session_id,
        }
    }
}

/// What the renderer template receives for one item.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedItem {
    /// Client key of the item.
    pub key: String,
    /// This renderer's properties, namespace stripped.
    pub properties: BTreeMap<String, Value>,
}

/// Simulated client runtime.
#[derive(Debug, Default)]
pub struct ClientRuntime {
    renderers: HashMap<(NodeId, String), InstalledRenderer>,
}

impl ClientRuntime {
    /// Creates a runtime with nothing installed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes one instruction.
    pub fn apply(&mut self, outbound: Outbound) {
        let Outbound { node, instruction } = outbound;
        match instruction {
            ClientInstruction::Install(install) => {
                let slot = (node, install.renderer_name.clone());
                self.renderers.insert(slot, install.into());
            }
            ClientInstruction::Uninstall(uninstall) => {
                let slot = (node, uninstall.renderer_name);
                let current = self
                    .renderers
                    .get(&slot)
                    .map(|installed| installed.namespace == uninstall.namespace);
                match current {
                    Some(true) => {
                        self.renderers.remove(&slot);
                    }
                    Some(false) => tracing::trace!(
                        "Ignoring stale uninstall on {} (namespace: {})",
                        node,
                        uninstall.namespace
                    ),
                    None => {}
                }
            }
        }
    }

    /// Drains `host`'s outbound queue into this runtime.
    pub fn sync(&mut self, host: &Host) {
        for outbound in host.drain() {
            self.apply(outbound);
        }
    }

    /// Returns the renderer installed in a slot.
    #[must_use]
    pub fn installed(&self, node: NodeId, renderer_name: &str) -> Option<&InstalledRenderer> {
        self.renderers.get(&(node, renderer_name.to_string()))
    }

    /// Number of installed renderers.
    #[must_use]
    pub fn installed_count(&self) -> usize {
        self.renderers.len()
    }

    /// Extracts what the installed renderer sees of an item payload.
    ///
    /// # Errors
    ///
    /// [`HostError::NotInstalled`] or [`HostError::MissingItemKey`].
    pub fn render_item(
        &self,
        node: NodeId,
        renderer_name: &str,
        payload: &Map<String, Value>,
    ) -> HostResult<RenderedItem> {
        let renderer = self.require(node, renderer_name)?;
        let key = payload
            .get(ITEM_KEY_FIELD)
            .and_then(Value::as_str)
            .ok_or(HostError::MissingItemKey)?;

        let properties = payload
            .iter()
            .filter_map(|(wire_key, value)| {
                renderer
                    .namespace
                    .strip(wire_key)
                    .map(|property| (property.to_string(), value.clone()))
            })
            .collect();

        Ok(RenderedItem {
            key: key.to_string(),
            properties,
        })
    }

    /// Invokes an advertised callable for an item, the way the template's
    /// event handlers do.
    ///
    /// Event-like arguments (objects carrying a native event) are dropped
    /// before sending.
    ///
    /// # Errors
    ///
    /// [`HostError::NotInstalled`], [`HostError::UnknownCallable`] if the
    /// renderer does not advertise `callable`, [`HostError::ChannelClosed`]
    /// if the host no longer has the channel.
    pub fn invoke(
        &self,
        host: &Host,
        node: NodeId,
        renderer_name: &str,
        item_key: &str,
        callable: &str,
        arguments: Vec<Value>,
    ) -> HostResult<()> {
        let renderer = self.require(node, renderer_name)?;
        if !renderer.callables.iter().any(|c| c == callable) {
            return Err(HostError::UnknownCallable(callable.to_string()));
        }

        let arguments = arguments.into_iter().filter(|a| !is_event(a)).collect();
        let call = DispatchCall::new(callable, item_key, arguments);

        if host.deliver(renderer.channel, &call.encode()) {
            Ok(())
        } else {
            Err(HostError::ChannelClosed(renderer.channel))
        }
    }

    fn require(&self, node: NodeId, renderer_name: &str) -> HostResult<&InstalledRenderer> {
        self.installed(node, renderer_name)
            .ok_or_else(|| HostError::NotInstalled {
                node,
                renderer_name: renderer_name.to_string(),
            })
    }
}

fn is_event(argument: &Value) -> bool {
    argument
        .as_object()
        .is_some_and(|object| object.contains_key(NATIVE_EVENT_FIELD))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowcast_shared::UninstallInstruction;
    use serde_json::json;

    fn install(node: NodeId, namespace: &str) -> Outbound {
        Outbound {
            node,
            instruction: ClientInstruction::Install(InstallInstruction {
                renderer_name: "renderer".to_string(),
                template_expression: "<b/>".to_string(),
                transpile: true,
                channel: ChannelHandle::new(node, 1),
                callables: vec!["onClick".to_string()],
                namespace: Namespace::from_raw(namespace),
                session_id: SessionId::new("ROOT-1"),
            }),
        }
    }

    fn uninstall(node: NodeId, namespace: &str) -> Outbound {
        Outbound {
            node,
            instruction: ClientInstruction::Uninstall(UninstallInstruction {
                renderer_name: "renderer".to_string(),
                namespace: Namespace::from_raw(namespace),
            }),
        }
    }

    const OLD: &str = "rr_0000000000000000_";
    const NEW: &str = "rr_ffffffffffffffff_";

    #[test]
    fn test_install_and_uninstall() {
        let node = NodeId::new(1);
        let mut client = ClientRuntime::new();

        client.apply(install(node, OLD));
        assert_eq!(client.installed(node, "renderer").map(|r| r.transpile), Some(true));

        client.apply(uninstall(node, OLD));
        assert!(client.installed(node, "renderer").is_none());
    }

    #[test]
    fn test_stale_uninstall_keeps_newer_renderer() {
        let node = NodeId::new(1);
        let mut client = ClientRuntime::new();

        client.apply(install(node, OLD));
        client.apply(install(node, NEW));
        client.apply(uninstall(node, OLD));

        let installed = client.installed(node, "renderer").unwrap();
        assert_eq!(installed.namespace.as_str(), NEW);
    }

    #[test]
    fn test_uninstall_without_install_is_safe() {
        let mut client = ClientRuntime::new();
        client.apply(uninstall(NodeId::new(1), OLD));
        assert_eq!(client.installed_count(), 0);
    }

    #[test]
    fn test_render_item_strips_namespace() {
        let node = NodeId::new(1);
        let mut client = ClientRuntime::new();
        client.apply(install(node, OLD));

        let mut payload = Map::new();
        payload.insert("key".to_string(), json!("k3"));
        payload.insert(format!("{OLD}name"), json!("Ada"));
        payload.insert(format!("{NEW}name"), json!("ADA"));

        let item = client.render_item(node, "renderer", &payload).unwrap();
        assert_eq!(item.key, "k3");
        assert_eq!(item.properties, BTreeMap::from([("name".to_string(), json!("Ada"))]));

        payload.remove("key");
        assert_eq!(
            client.render_item(node, "renderer", &payload),
            Err(HostError::MissingItemKey)
        );
    }

    #[test]
    fn test_event_detection() {
        assert!(is_event(&json!({"nativeEvent": {}, "type": "click"})));
        assert!(!is_event(&json!({"type": "click"})));
        assert!(!is_event(&json!("nativeEvent")));
    }

    #[test]
    fn test_invoke_requires_install_and_advertised_callable() {
        let host = Host::new("ROOT-1");
        let node = NodeId::new(1);
        let mut client = ClientRuntime::new();

        assert!(matches!(
            client.invoke(&host, node, "renderer", "k1", "onClick", vec![]),
            Err(HostError::NotInstalled { .. })
        ));

        client.apply(install(node, OLD));
        assert_eq!(
            client.invoke(&host, node, "renderer", "k1", "onDelete", vec![]),
            Err(HostError::UnknownCallable("onDelete".to_string()))
        );
        assert_eq!(
            client.invoke(&host, node, "renderer", "k1", "onClick", vec![]),
            Err(HostError::ChannelClosed(ChannelHandle::new(node, 1)))
        );
    }
}
