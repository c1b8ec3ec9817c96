//! Component tree with attach-state propagation.
//!
//! A node is attached when it hangs, directly or through ancestors, under an
//! attached root. Every structural change reports the nodes whose attach
//! state flipped, in depth-first order, so the host can notify listeners.

use std::collections::HashMap;

use rowcast_shared::NodeId;

use crate::error::{HostError, HostResult};

#[derive(Clone, Copy, Debug, Default)]
struct NodeState {
    parent: Option<NodeId>,
    attached: bool,
}

/// Manages the container hierarchy.
pub struct ComponentTree {
    /// Node states indexed by ID.
    nodes: HashMap<NodeId, NodeState>,
    /// Attached root IDs.
    roots: Vec<NodeId>,
    /// Parent-child relationships.
    children: HashMap<NodeId, Vec<NodeId>>,
    /// ID counter for generating unique IDs.
    next_id: u64,
}

impl ComponentTree {
    /// Creates a new empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: HashMap::with_capacity(64),
            roots: Vec::with_capacity(4),
            children: HashMap::with_capacity(64),
            next_id: 1,
        }
    }

    /// Creates a detached node with no parent.
    pub fn create_node(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, NodeState::default());
        self.children.insert(id, Vec::new());
        id
    }

    /// Makes `id` an attached root and attaches its subtree.
    ///
    /// # Errors
    ///
    /// [`HostError::UnknownNode`], or [`HostError::AlreadyPlaced`] if the
    /// node has a parent or already is a root.
    pub fn attach_root(&mut self, id: NodeId) -> HostResult<Vec<NodeId>> {
        self.ensure_free(id)?;
        self.roots.push(id);
        Ok(self.set_subtree_attached(id, true))
    }

    /// Removes `id` from the roots and detaches its subtree.
    ///
    /// # Errors
    ///
    /// [`HostError::UnknownNode`] or [`HostError::NotARoot`].
    pub fn detach_root(&mut self, id: NodeId) -> HostResult<Vec<NodeId>> {
        self.state(id)?;
        if !self.roots.contains(&id) {
            return Err(HostError::NotARoot(id));
        }
        self.roots.retain(|&r| r != id);
        Ok(self.set_subtree_attached(id, false))
    }

    /// Appends `child` (with its subtree) under `parent`. The subtree takes
    /// the parent's attach state.
    ///
    /// # Errors
    ///
    /// [`HostError::UnknownNode`], [`HostError::AlreadyPlaced`] if `child`
    /// is already placed, [`HostError::Cycle`] if `parent` is inside
    /// `child`'s subtree.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> HostResult<Vec<NodeId>> {
        let parent_attached = self.state(parent)?.attached;
        self.ensure_free(child)?;
        if self.iter_subtree(child).any(|id| id == parent) {
            return Err(HostError::Cycle { parent, child });
        }

        if let Some(state) = self.nodes.get_mut(&child) {
            state.parent = Some(parent);
        }
        self.children.entry(parent).or_default().push(child);
        Ok(self.set_subtree_attached(child, parent_attached))
    }

    /// Unlinks `id` from its parent. The subtree is kept, detached, and can
    /// be appended again.
    ///
    /// # Errors
    ///
    /// [`HostError::UnknownNode`].
    pub fn remove(&mut self, id: NodeId) -> HostResult<Vec<NodeId>> {
        let parent = self.state(id)?.parent;
        match parent {
            Some(parent) => {
                if let Some(siblings) = self.children.get_mut(&parent) {
                    siblings.retain(|&c| c != id);
                }
                if let Some(state) = self.nodes.get_mut(&id) {
                    state.parent = None;
                }
            }
            None => self.roots.retain(|&r| r != id),
        }
        Ok(self.set_subtree_attached(id, false))
    }

    /// Returns true if the node exists.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Returns the attach state; unknown nodes are detached.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|s| s.attached)
    }

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|s| s.parent)
    }

    /// Returns the children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns all attached roots.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Returns `id` and its descendants in depth-first order.
    pub fn iter_subtree(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        NodeDfsIterator {
            tree: self,
            stack: if self.contains(id) { vec![id] } else { Vec::new() },
        }
    }

    fn state(&self, id: NodeId) -> HostResult<NodeState> {
        self.nodes.get(&id).copied().ok_or(HostError::UnknownNode(id))
    }

    fn ensure_free(&self, id: NodeId) -> HostResult<()> {
        let state = self.state(id)?;
        if state.parent.is_some() || self.roots.contains(&id) {
            return Err(HostError::AlreadyPlaced(id));
        }
        Ok(())
    }

    fn set_subtree_attached(&mut self, id: NodeId, attached: bool) -> Vec<NodeId> {
        let subtree: Vec<NodeId> = self.iter_subtree(id).collect();
        let mut changed = Vec::new();
        for node in subtree {
            if let Some(state) = self.nodes.get_mut(&node) {
                if state.attached != attached {
                    state.attached = attached;
                    changed.push(node);
                }
            }
        }
        changed
    }
}

impl Default for ComponentTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Depth-first iterator over a subtree.
struct NodeDfsIterator<'a> {
    tree: &'a ComponentTree,
    stack: Vec<NodeId>,
}

impl Iterator for NodeDfsIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;

        // Reverse push keeps siblings left-to-right
        if let Some(children) = self.tree.children.get(&id) {
            for &child in children.iter().rev() {
                self.stack.push(child);
            }
        }

        Some(id)
    }
}
