//! Wire protocol types shared between the server core and the client runtime.
//!
//! Two instructions travel server -> client ([`ClientInstruction`]) and one
//! payload travels client -> server ([`DispatchCall`]).
//!
//! ```text
//! SERVER                                        CLIENT
//!   |--- install(name, template, ..., ns) ------->|  on every attach
//!   |<-- [function, item key, [args...]] ---------|  on interaction
//!   |--- uninstall(name, ns) -------------------->|  on unbind
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::constants::{INSTALL_VERB, UNINSTALL_VERB};
use crate::namespace::Namespace;

/// Address of a container node in the host's component tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Creates a new node ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Opaque handle of a registered return channel.
///
/// The client passes it back unchanged to address server callables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelHandle {
    /// Node owning the channel.
    pub node: NodeId,
    /// Channel index, unique within the node.
    pub channel: u32,
}

impl ChannelHandle {
    /// Creates a channel handle.
    #[must_use]
    pub const fn new(node: NodeId, channel: u32) -> Self {
        Self { node, channel }
    }

    /// Wire form: `[node, channel]`.
    #[must_use]
    pub fn to_value(self) -> Value {
        json!([self.node.0, self.channel])
    }
}

/// Application / session identifier the client uses to reach its server session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Creates a session ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the client turns the template expression into a component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemplateMode {
    /// Template already uses direct element-construction calls.
    #[default]
    CreateElement,
    /// Template is markup that must be transpiled first.
    Jsx,
}

impl TemplateMode {
    /// Returns true if the client must transpile the template.
    #[inline]
    #[must_use]
    pub const fn requires_transpile(self) -> bool {
        matches!(self, Self::Jsx)
    }
}

/// Activates a renderer on a container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallInstruction {
    /// Renderer slot on the container (e.g. `"renderer"`).
    pub renderer_name: String,
    /// Client-evaluated function body.
    pub template_expression: String,
    /// Whether the template needs transpilation.
    pub transpile: bool,
    /// Channel the client calls callables through.
    pub channel: ChannelHandle,
    /// Callable names, sorted ascending.
    pub callables: Vec<String>,
    /// Namespace of the descriptor; also the renderer's identity on the client.
    pub namespace: Namespace,
    /// Session the channel belongs to.
    pub session_id: SessionId,
}

/// Deactivates a renderer on a container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UninstallInstruction {
    /// Renderer slot on the container.
    pub renderer_name: String,
    /// Namespace of the renderer to remove. A renderer installed under a
    /// different namespace is left alone.
    pub namespace: Namespace,
}

/// Fire-and-forget instruction for the client runtime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verb", rename_all = "camelCase")]
pub enum ClientInstruction {
    /// See [`InstallInstruction`].
    Install(InstallInstruction),
    /// See [`UninstallInstruction`].
    Uninstall(UninstallInstruction),
}

impl ClientInstruction {
    /// Client runtime function this instruction invokes.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Install(_) => INSTALL_VERB,
            Self::Uninstall(_) => UNINSTALL_VERB,
        }
    }

    /// Renderer slot addressed by this instruction.
    #[must_use]
    pub fn renderer_name(&self) -> &str {
        match self {
            Self::Install(install) => &install.renderer_name,
            Self::Uninstall(uninstall) => &uninstall.renderer_name,
        }
    }

    /// Namespace addressed by this instruction.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        match self {
            Self::Install(install) => &install.namespace,
            Self::Uninstall(uninstall) => &uninstall.namespace,
        }
    }

    /// Returns true for install instructions.
    #[must_use]
    pub const fn is_install(&self) -> bool {
        matches!(self, Self::Install(_))
    }

    /// Positional arguments, in client function order. The container is the
    /// addressee of the call and is not part of the list.
    #[must_use]
    pub fn arguments(&self) -> Vec<Value> {
        match self {
            Self::Install(install) => vec![
                Value::from(install.renderer_name.as_str()),
                Value::from(install.template_expression.as_str()),
                Value::from(install.transpile),
                install.channel.to_value(),
                Value::from(install.callables.clone()),
                Value::from(install.namespace.as_str()),
                Value::from(install.session_id.as_str()),
            ],
            Self::Uninstall(uninstall) => vec![
                Value::from(uninstall.renderer_name.as_str()),
                Value::from(uninstall.namespace.as_str()),
            ],
        }
    }
}

/// Errors decoding wire payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Incoming dispatch payload is not `(string, string, array)`.
    #[error("malformed dispatch payload: {0}")]
    MalformedDispatch(String),
}

/// Client -> server invocation of a callable for one item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchCall {
    /// Registered callable name.
    pub function_name: String,
    /// Client-visible key of the item the call is about.
    pub item_key: String,
    /// Arguments supplied by the client template.
    pub arguments: Vec<Value>,
}

impl DispatchCall {
    /// Creates a dispatch call.
    #[must_use]
    pub fn new(
        function_name: impl Into<String>,
        item_key: impl Into<String>,
        arguments: Vec<Value>,
    ) -> Self {
        Self {
            function_name: function_name.into(),
            item_key: item_key.into(),
            arguments,
        }
    }

    /// Decodes the channel's argument list `[function, item key, [args...]]`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedDispatch`] if the list does not have
    /// exactly three elements of types string, string, array.
    pub fn decode(payload: &[Value]) -> Result<Self, ProtocolError> {
        let [function_name, item_key, arguments] = payload else {
            return Err(ProtocolError::MalformedDispatch(format!(
                "expected 3 elements, got {}",
                payload.len()
            )));
        };

        let function_name = function_name.as_str().ok_or_else(|| {
            ProtocolError::MalformedDispatch("function name is not a string".to_string())
        })?;
        let item_key = item_key.as_str().ok_or_else(|| {
            ProtocolError::MalformedDispatch("item key is not a string".to_string())
        })?;
        let arguments = arguments.as_array().ok_or_else(|| {
            ProtocolError::MalformedDispatch("arguments are not an array".to_string())
        })?;

        Ok(Self::new(function_name, item_key, arguments.clone()))
    }

    /// Encodes the call the way the client runtime sends it.
    #[must_use]
    pub fn encode(&self) -> Vec<Value> {
        vec![
            Value::from(self.function_name.as_str()),
            Value::from(self.item_key.as_str()),
            Value::Array(self.arguments.clone()),
        ]
    }
}
