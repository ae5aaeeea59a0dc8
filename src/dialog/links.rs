//! Reverse lookup from nodes to the pointers that reference them.
//!
//! The graph stores edges on their parents, so answering "who points at this
//! node?" would otherwise mean scanning every pool. `LinkRegistry` keeps the
//! reverse map current as edges are attached and detached, which is what
//! makes safe deletes and the cut/paste re-insert decision cheap.
//!
//! Registrations cover every pointer, not just link edges: a node's placement
//! pointer and its conversation-start pointer count as referrers too. Each
//! dialog owns exactly one registry; it is rebuilt from the pools after
//! deserialization rather than persisted.

use indexmap::IndexMap;

use crate::dialog::node::NodeId;
use crate::dialog::pointer::PointerId;

/// Reverse map from target nodes to the pointers referencing them.
///
/// Insertion order of both nodes and referrer lists is preserved, so
/// iteration and diagnostics stay deterministic across runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkRegistry {
    referrers: IndexMap<NodeId, Vec<PointerId>>,
}

impl LinkRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `pointer` references `target`.
    ///
    /// Registering the same pair twice is a no-op, so callers on different
    /// paths (attach, re-insert, rebuild) never produce duplicates.
    pub fn register(&mut self, pointer: PointerId, target: NodeId) {
        let entry = self.referrers.entry(target).or_default();
        if !entry.contains(&pointer) {
            entry.push(pointer);
        }
    }

    /// Removes the record that `pointer` references `target`.
    ///
    /// Unregistering a pair that was never registered is a no-op.
    pub fn unregister(&mut self, pointer: PointerId, target: NodeId) {
        if let Some(entry) = self.referrers.get_mut(&target) {
            entry.retain(|p| *p != pointer);
            if entry.is_empty() {
                self.referrers.shift_remove(&target);
            }
        }
    }

    /// Moves a registration from one target to another.
    pub fn retarget(&mut self, pointer: PointerId, old_target: NodeId, new_target: NodeId) {
        self.unregister(pointer, old_target);
        self.register(pointer, new_target);
    }

    /// Returns the ids of every pointer referencing `node`, in registration
    /// order. A node nobody references yields an empty slice, not an error.
    ///
    /// # Example
    ///
    /// ```
    /// use dlgquill::dialog::links::LinkRegistry;
    /// use dlgquill::dialog::node::NodeId;
    ///
    /// let registry = LinkRegistry::new();
    /// assert!(registry.referrers(NodeId::default()).is_empty());
    /// ```
    pub fn referrers(&self, node: NodeId) -> &[PointerId] {
        self.referrers
            .get(&node)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Returns true if at least one pointer references `node`.
    pub fn is_referenced(&self, node: NodeId) -> bool {
        !self.referrers(node).is_empty()
    }

    /// Drops every registration targeting `node`.
    ///
    /// Used when a node leaves the graph for good; the referring pointers
    /// themselves must already have been detached by the caller.
    pub fn forget_node(&mut self, node: NodeId) {
        self.referrers.shift_remove(&node);
    }

    /// Drops every registration.
    pub fn clear(&mut self) {
        self.referrers.clear();
    }

    /// Returns the number of nodes with at least one referrer.
    pub fn tracked_nodes(&self) -> usize {
        self.referrers.len()
    }

    /// Returns true if no node has any referrer.
    pub fn is_empty(&self) -> bool {
        self.referrers.is_empty()
    }

    /// Iterates over `(target, referrers)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &[PointerId])> {
        self.referrers.iter().map(|(id, v)| (*id, v.as_slice()))
    }
}
