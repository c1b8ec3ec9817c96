//! # ROWCAST Shared
//!
//! Wire types used by both the server core and the client runtime.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - the renderer core (`rowcast_renderer`)
//! - any host framework type
//!
//! If a type does not cross the wire, it does not belong here.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod events;
pub mod namespace;
pub mod protocol;

pub use constants::{
    INSTALL_VERB, ITEM_KEY_FIELD, NAMESPACE_PREFIX, NAMESPACE_TOKEN_LEN, NATIVE_EVENT_FIELD,
    UNINSTALL_VERB,
};
pub use events::LifecycleEvent;
pub use namespace::{is_valid_callable_name, Namespace};
pub use protocol::{
    ChannelHandle, ClientInstruction, DispatchCall, InstallInstruction, NodeId, ProtocolError,
    SessionId, TemplateMode, UninstallInstruction,
};
