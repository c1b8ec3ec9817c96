//! Virtualized item window.
//!
//! Items entering the visible window get a fresh client key (`"k1"`,
//! `"k2"`, ...). Keys are never reused, so a key evicted by scrolling stays
//! unresolvable even if the same item comes back under a new key.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use rowcast_renderer::KeyMapper;

struct WindowState<T> {
    items: HashMap<String, T>,
    next_key: u64,
}

/// Key -> item mapping of the items the client currently sees.
///
/// Clones share the same window.
pub struct KeyWindow<T> {
    state: Arc<RwLock<WindowState<T>>>,
}

impl<T> KeyWindow<T> {
    /// Creates an empty window.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(WindowState {
                items: HashMap::new(),
                next_key: 0,
            })),
        }
    }

    /// Adds `item` to the window and returns its client key.
    pub fn track(&self, item: T) -> String {
        let mut state = self.state.write();
        state.next_key += 1;
        let key = format!("k{}", state.next_key);
        state.items.insert(key.clone(), item);
        key
    }

    /// Drops `key` from the window.
    pub fn evict(&self, key: &str) -> Option<T> {
        self.state.write().items.remove(key)
    }

    /// Drops every item, e.g. on a data refresh.
    pub fn clear(&self) {
        self.state.write().items.clear();
    }

    /// Returns true if `key` is in the window.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.state.read().items.contains_key(key)
    }

    /// Number of items in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    /// Returns true if the window is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().items.is_empty()
    }
}

impl<T> Clone for KeyWindow<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for KeyWindow<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for KeyWindow<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyWindow").field("len", &self.len()).finish()
    }
}

impl<T: Clone + Send + Sync> KeyMapper<T> for KeyWindow<T> {
    fn resolve(&self, key: &str) -> Option<T> {
        self.state.read().items.get(key).cloned()
    }
}
