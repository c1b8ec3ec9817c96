//! # Callable Dispatch Table
//!
//! Maps callable names to server handlers and routes incoming client calls
//! to the right handler for the right item.
//!
//! ## Dispatch algorithm
//!
//! ```text
//! (function, item key, args)
//!        │
//!        ├─ function not registered ──► no-op (UnknownCallable)
//!        ├─ key no longer resolvable ──► no-op (StaleItem)
//!        └─ handler(item, args)       ──► Invoked
//! ```
//!
//! Both no-ops are expected races: the client's callable set always matches
//! the last install, and virtualized views evict items while the client
//! is still interacting with them. Handler panics are not caught here.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use rowcast_shared::{is_valid_callable_name, DispatchCall};

use crate::error::{RendererError, RendererResult};
use crate::host::KeyMapper;

/// Server-side handler of a callable: `(item, client arguments)`.
pub type Handler<T> = Arc<dyn Fn(&T, &[Value]) + Send + Sync>;

/// What routing did with an incoming call. None of these are errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchOutcome {
    /// The handler ran.
    Invoked,
    /// No handler is registered under the function name.
    UnknownCallable,
    /// The item key no longer resolves to an item.
    StaleItem,
    /// The rendering the call arrived on was unbound.
    Released,
}

/// Callable name -> handler.
pub struct CallableDispatchTable<T> {
    handlers: HashMap<String, Handler<T>>,
}

impl<T> CallableDispatchTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` under `name`, replacing any previous handler.
    ///
    /// # Errors
    ///
    /// - [`RendererError::InvalidArgument`] if `name` is empty
    /// - [`RendererError::InvalidFormat`] if `name` is not alphanumeric
    ///
    /// The table is unchanged on error.
    pub fn register<F>(&mut self, name: &str, handler: F) -> RendererResult<()>
    where
        T: 'static,
        F: Fn(&T, &[Value]) + Send + Sync + 'static,
    {
        validate_callable_name(name)?;
        self.handlers.insert(name.to_string(), Arc::new(handler));
        Ok(())
    }

    /// Registers a handler that ignores the client arguments.
    ///
    /// # Errors
    ///
    /// Same as [`CallableDispatchTable::register`].
    pub fn register_simple<F>(&mut self, name: &str, handler: F) -> RendererResult<()>
    where
        T: 'static,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.register(name, move |item: &T, _: &[Value]| handler(item))
    }

    /// Returns the handler registered under `name`.
    #[must_use]
    pub fn handler(&self, name: &str) -> Option<Handler<T>> {
        self.handlers.get(name).cloned()
    }

    /// Number of registered callables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered names, sorted ascending. This is the list sent to the client.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Routes `call` through this table.
    pub fn dispatch(&self, call: &DispatchCall, keys: &dyn KeyMapper<T>) -> DispatchOutcome {
        route(self.handler(&call.function_name), call, keys)
    }
}

impl<T> Default for CallableDispatchTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CallableDispatchTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableDispatchTable")
            .field("callables", &self.names())
            .finish()
    }
}

/// Checks a callable name before anything is registered.
///
/// # Errors
///
/// [`RendererError::InvalidArgument`] for an empty name,
/// [`RendererError::InvalidFormat`] for a non-alphanumeric one.
pub fn validate_callable_name(name: &str) -> RendererResult<()> {
    if name.is_empty() {
        return Err(RendererError::InvalidArgument(
            "callable name must not be empty".to_string(),
        ));
    }
    if !is_valid_callable_name(name) {
        return Err(RendererError::InvalidFormat(name.to_string()));
    }
    Ok(())
}

/// Runs an already-resolved handler for the item behind `call.item_key`.
///
/// The handler is resolved by the caller so no table lock is held while it
/// runs.
pub fn route<T>(
    handler: Option<Handler<T>>,
    call: &DispatchCall,
    keys: &dyn KeyMapper<T>,
) -> DispatchOutcome {
    let Some(handler) = handler else {
        tracing::trace!(
            "Dispatch ignored, unknown callable: {} (key: {})",
            call.function_name,
            call.item_key
        );
        return DispatchOutcome::UnknownCallable;
    };

    let Some(item) = keys.resolve(&call.item_key) else {
        tracing::trace!(
            "Dispatch ignored, stale item: {} (key: {})",
            call.function_name,
            call.item_key
        );
        return DispatchOutcome::StaleItem;
    };

    handler(&item, &call.arguments);
    tracing::trace!(
        "Dispatched {} (key: {}, args: {})",
        call.function_name,
        call.item_key,
        call.arguments.len()
    );
    DispatchOutcome::Invoked
}
