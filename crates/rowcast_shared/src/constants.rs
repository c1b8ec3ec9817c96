//! # Protocol Constants
//!
//! **CRITICAL:** These values are baked into the client runtime.
//! Changing one without the other breaks every installed renderer.

// =============================================================================
// NAMESPACES
// =============================================================================

/// Prefix of every generated property namespace.
pub const NAMESPACE_PREFIX: &str = "rr";

/// Number of random hex characters in a namespace token.
pub const NAMESPACE_TOKEN_LEN: usize = 16;

// =============================================================================
// CLIENT RUNTIME ENTRY POINTS
// =============================================================================

/// Client function that installs a renderer on a container.
pub const INSTALL_VERB: &str = "setReactRenderer";

/// Client function that removes a renderer from a container.
pub const UNINSTALL_VERB: &str = "unsetReactRenderer";

// =============================================================================
// ITEM PAYLOAD
// =============================================================================

/// Field of a serialized item holding its client-visible key.
pub const ITEM_KEY_FIELD: &str = "key";

/// Field that marks a client argument as a DOM / synthetic event.
pub const NATIVE_EVENT_FIELD: &str = "nativeEvent";
