//! Dialog graph container.
//!
//! A `Dialog` owns every line of one conversation. Nodes live in two dense
//! pools (NPC entries and player replies) and carry their outgoing pointers;
//! conversation starts live in a root-level pointer list. A link registry
//! keeps the reverse pointer map current, and two monotonic counters hand out
//! node and pointer ids that are never reused within the dialog.
//!
//! The methods here are the structural primitives: they keep the pools, the
//! registry, and edge attachment consistent, and they validate type
//! alternation at the public seams. Higher-level editing workflows (links,
//! cascading deletes, paste) are layered on top in
//! [`ops`](crate::dialog::ops) and [`paste`](crate::dialog::paste).
//!
//! # Example
//!
//! ```
//! use dlgquill::dialog::graph::Dialog;
//! use dlgquill::dialog::node::{DialogNode, NodeType};
//!
//! let mut dialog = Dialog::new();
//! let greeting = dialog.add_node(DialogNode::new(NodeType::Entry, "Well met, traveler."));
//! let reply = dialog.add_node(DialogNode::new(NodeType::Reply, "And to you, guard."));
//! dialog.add_start(greeting).unwrap();
//! dialog.add_child(greeting, reply).unwrap();
//!
//! assert_eq!(dialog.entry_count(), 1);
//! assert_eq!(dialog.reply_count(), 1);
//! assert_eq!(dialog.starts().len(), 1);
//! assert!(dialog.links().is_referenced(reply));
//! ```

use std::collections::HashSet;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

use crate::dialog::links::LinkRegistry;
use crate::dialog::node::{DialogNode, NodeId, NodeType};
use crate::dialog::pointer::{ParentRef, Pointer, PointerId};
use crate::dialog::reindex::recalculate_pointer_indices;

/// One complete conversation: node pools, start pointers, and the
/// bookkeeping that keeps them consistent.
///
/// The registry and id counters are derived state and are not serialized;
/// [`restore_internal_state`](Dialog::restore_internal_state) rebuilds them
/// after deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dialog {
    #[serde(default)]
    entries: Vec<DialogNode>,
    #[serde(default)]
    replies: Vec<DialogNode>,
    #[serde(default)]
    starts: Vec<Pointer>,
    #[serde(skip)]
    links: LinkRegistry,
    #[serde(skip)]
    next_node_id: u32,
    #[serde(skip)]
    next_pointer_id: u32,
}

impl Default for Dialog {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialog {
    /// Creates an empty dialog.
    ///
    /// Counters start at 1 so the id 0 stays free as the "not yet added"
    /// placeholder on freshly constructed nodes.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            replies: Vec::new(),
            starts: Vec::new(),
            links: LinkRegistry::new(),
            next_node_id: 1,
            next_pointer_id: 1,
        }
    }

    /// Returns the NPC entry pool in pool order.
    pub fn entries(&self) -> &[DialogNode] {
        &self.entries
    }

    /// Returns the player reply pool in pool order.
    pub fn replies(&self) -> &[DialogNode] {
        &self.replies
    }

    /// Returns the conversation start pointers in sibling order.
    pub fn starts(&self) -> &[Pointer] {
        &self.starts
    }

    /// Returns the number of NPC entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of player replies.
    pub fn reply_count(&self) -> usize {
        self.replies.len()
    }

    /// Returns true if the dialog has no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.replies.is_empty()
    }

    /// Returns the reverse pointer map.
    pub fn links(&self) -> &LinkRegistry {
        &self.links
    }

    pub(crate) fn entries_mut(&mut self) -> &mut Vec<DialogNode> {
        &mut self.entries
    }

    pub(crate) fn replies_mut(&mut self) -> &mut Vec<DialogNode> {
        &mut self.replies
    }

    pub(crate) fn starts_mut(&mut self) -> &mut Vec<Pointer> {
        &mut self.starts
    }

    pub(crate) fn links_mut(&mut self) -> &mut LinkRegistry {
        &mut self.links
    }

    pub(crate) fn allocate_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    pub(crate) fn allocate_pointer_id(&mut self) -> PointerId {
        let id = PointerId(self.next_pointer_id);
        self.next_pointer_id += 1;
        id
    }

    /// Adds a freshly constructed node to the pool matching its type and
    /// assigns it a new id, which is returned.
    ///
    /// The node becomes part of the dialog but is not yet reachable; attach
    /// it with [`add_start`](Dialog::add_start) or
    /// [`add_child`](Dialog::add_child).
    pub fn add_node(&mut self, mut node: DialogNode) -> NodeId {
        debug_assert!(
            node.pointers().is_empty(),
            "fresh nodes must not carry pointers"
        );
        let id = self.allocate_node_id();
        node.set_id(id);
        match node.node_type() {
            NodeType::Entry => self.entries.push(node),
            NodeType::Reply => self.replies.push(node),
        }
        id
    }

    /// Re-inserts a node that already owns an id, preserving that id.
    ///
    /// Used by cut/paste and subtree cloning. The counters are bumped past
    /// any id the node carries, and all of its outgoing pointers are
    /// registered.
    pub(crate) fn insert_node(&mut self, node: DialogNode) {
        self.next_node_id = self.next_node_id.max(node.id().as_u32() + 1);
        for ptr in node.pointers() {
            self.next_pointer_id = self.next_pointer_id.max(ptr.id().as_u32() + 1);
            self.links.register(ptr.id(), ptr.target());
        }
        match node.node_type() {
            NodeType::Entry => self.entries.push(node),
            NodeType::Reply => self.replies.push(node),
        }
    }

    /// Looks up a node by its stable id.
    pub fn node(&self, id: NodeId) -> Option<&DialogNode> {
        self.entries
            .iter()
            .chain(self.replies.iter())
            .find(|n| n.id() == id)
    }

    /// Looks up a node by its stable id, mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut DialogNode> {
        self.entries
            .iter_mut()
            .chain(self.replies.iter_mut())
            .find(|n| n.id() == id)
    }

    /// Returns true if a node with this id is in either pool.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Returns which pool holds the node and its current position there.
    pub fn position_of(&self, id: NodeId) -> Option<(NodeType, usize)> {
        if let Some(pos) = self.entries.iter().position(|n| n.id() == id) {
            return Some((NodeType::Entry, pos));
        }
        self.replies
            .iter()
            .position(|n| n.id() == id)
            .map(|pos| (NodeType::Reply, pos))
    }

    /// Removes a node from its pool and returns it.
    ///
    /// Fails while any pointer still references the node; callers detach
    /// referrers first so the graph never holds dangling edges. The removed
    /// node's own outgoing pointers are unregistered.
    pub fn remove_node(&mut self, id: NodeId) -> Result<DialogNode> {
        if self.links.is_referenced(id) {
            bail!(
                "cannot remove node {}: {} pointer(s) still reference it",
                id,
                self.links.referrers(id).len()
            );
        }
        let Some((node_type, pos)) = self.position_of(id) else {
            bail!("node {} is not part of this dialog", id);
        };
        let node = match node_type {
            NodeType::Entry => self.entries.remove(pos),
            NodeType::Reply => self.replies.remove(pos),
        };
        for ptr in node.pointers() {
            self.links.unregister(ptr.id(), ptr.target());
        }
        self.links.forget_node(id);
        Ok(node)
    }

    /// Makes an existing NPC entry a conversation start.
    ///
    /// This creates the entry's placement edge at the root. To reference an
    /// entry that is already placed elsewhere, add a link start through
    /// [`ops::add_link`](crate::dialog::ops::add_link) instead.
    pub fn add_start(&mut self, entry: NodeId) -> Result<PointerId> {
        let node_type = self
            .node(entry)
            .map(|n| n.node_type())
            .ok_or_else(|| anyhow!("node {} is not part of this dialog", entry))?;
        if node_type != NodeType::Entry {
            bail!(
                "only NPC entries can start a conversation; node {} is a {}",
                entry,
                node_type
            );
        }
        let id = self.allocate_pointer_id();
        self.attach_start(Pointer::new(id, entry, NodeType::Entry, false, true));
        Ok(id)
    }

    /// Places an existing node under a parent node.
    ///
    /// Validates that both nodes exist, that they alternate between NPC and
    /// player lines, and that the child does not already have a placement.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<PointerId> {
        let parent_type = self
            .node(parent)
            .map(|n| n.node_type())
            .ok_or_else(|| anyhow!("parent node {} is not part of this dialog", parent))?;
        let child_type = self
            .node(child)
            .map(|n| n.node_type())
            .ok_or_else(|| anyhow!("child node {} is not part of this dialog", child))?;
        if parent_type == child_type {
            bail!(
                "cannot attach a {} under a {}: NPC and player lines must alternate",
                child_type,
                parent_type
            );
        }
        let already_placed = self
            .links
            .referrers(child)
            .iter()
            .any(|p| self.pointer(*p).map_or(false, |ptr| !ptr.is_link()));
        if already_placed {
            bail!(
                "node {} already has a placement in this dialog; add a link instead",
                child
            );
        }
        let id = self.allocate_pointer_id();
        let ptr = Pointer::new(id, child, child_type, false, false);
        self.attach_child(parent, ptr)?;
        Ok(id)
    }

    /// Attaches an already-built pointer to the root list and registers it.
    pub(crate) fn attach_start(&mut self, ptr: Pointer) {
        self.links.register(ptr.id(), ptr.target());
        self.starts.push(ptr);
    }

    /// Attaches an already-built pointer to a parent node and registers it.
    ///
    /// Validation happens at the callers; this only requires that the parent
    /// exists.
    pub(crate) fn attach_child(&mut self, parent: NodeId, ptr: Pointer) -> Result<()> {
        let Some((node_type, pos)) = self.position_of(parent) else {
            bail!("parent node {} is not part of this dialog", parent);
        };
        self.links.register(ptr.id(), ptr.target());
        match node_type {
            NodeType::Entry => self.entries[pos].pointers_mut().push(ptr),
            NodeType::Reply => self.replies[pos].pointers_mut().push(ptr),
        }
        Ok(())
    }

    /// Looks up a pointer by its stable id, searching the start list and
    /// both pools.
    pub fn pointer(&self, id: PointerId) -> Option<&Pointer> {
        self.starts.iter().find(|p| p.id() == id).or_else(|| {
            self.entries
                .iter()
                .chain(self.replies.iter())
                .find_map(|n| n.pointer(id))
        })
    }

    /// Looks up a pointer by its stable id, mutably.
    pub fn pointer_mut(&mut self, id: PointerId) -> Option<&mut Pointer> {
        if let Some(pos) = self.starts.iter().position(|p| p.id() == id) {
            return self.starts.get_mut(pos);
        }
        self.entries
            .iter_mut()
            .chain(self.replies.iter_mut())
            .find_map(|n| n.pointers_mut().iter_mut().find(|p| p.id() == id))
    }

    /// Returns where a pointer is attached: at the root or under which node.
    pub fn parent_of(&self, id: PointerId) -> Option<ParentRef> {
        if self.starts.iter().any(|p| p.id() == id) {
            return Some(ParentRef::Root);
        }
        self.entries
            .iter()
            .chain(self.replies.iter())
            .find(|n| n.pointer(id).is_some())
            .map(|n| ParentRef::Node(n.id()))
    }

    /// Detaches a pointer from wherever it is attached, unregisters it, and
    /// returns it. Returns `None` if no such pointer exists.
    pub fn remove_pointer(&mut self, id: PointerId) -> Option<Pointer> {
        if let Some(pos) = self.starts.iter().position(|p| p.id() == id) {
            let ptr = self.starts.remove(pos);
            self.links.unregister(ptr.id(), ptr.target());
            return Some(ptr);
        }
        for pool in [&mut self.entries, &mut self.replies] {
            for node in pool.iter_mut() {
                if let Some(pos) = node.pointers().iter().position(|p| p.id() == id) {
                    let ptr = node.pointers_mut().remove(pos);
                    self.links.unregister(ptr.id(), ptr.target());
                    return Some(ptr);
                }
            }
        }
        None
    }

    /// Returns the set of nodes reachable from the conversation starts,
    /// following both placement and link edges.
    ///
    /// Traversal is a worklist with a visited-pointer set, so cycles through
    /// link edges terminate.
    pub fn reachable_nodes(&self) -> HashSet<NodeId> {
        let mut reachable = HashSet::new();
        let mut seen_pointers = HashSet::new();
        let mut stack: Vec<NodeId> = Vec::new();
        for ptr in &self.starts {
            if seen_pointers.insert(ptr.id()) {
                stack.push(ptr.target());
            }
        }
        while let Some(id) = stack.pop() {
            if !reachable.insert(id) {
                continue;
            }
            if let Some(node) = self.node(id) {
                for ptr in node.pointers() {
                    if seen_pointers.insert(ptr.id()) {
                        stack.push(ptr.target());
                    }
                }
            }
        }
        reachable
    }

    /// Moves a player reply into the entry pool, making it an NPC entry.
    ///
    /// This is the one permitted type mutation, used when pasting a
    /// speakered reply at the root. Referrer pointers have their cached
    /// target type updated; any alternation broken by the change is logged
    /// but permitted, matching how designers use speakered lines.
    pub(crate) fn coerce_reply_to_entry(&mut self, id: NodeId) {
        let Some(pos) = self.replies.iter().position(|n| n.id() == id) else {
            debug_assert!(false, "coercion target {} is not in the replies pool", id);
            tracing::warn!(
                "coercion target {} is not in the replies pool; graph left untouched",
                id
            );
            return;
        };
        let mut node = self.replies.remove(pos);
        node.set_node_type(NodeType::Entry);
        self.entries.push(node);

        let referrer_ids: Vec<PointerId> = self.links.referrers(id).to_vec();
        for pointer_id in referrer_ids {
            let parent = self.parent_of(pointer_id);
            if let Some(ptr) = self.pointer_mut(pointer_id) {
                ptr.set_target_type(NodeType::Entry);
            }
            if let Some(ParentRef::Node(parent_id)) = parent {
                if self.node(parent_id).map(|n| n.node_type()) == Some(NodeType::Entry) {
                    tracing::warn!(
                        "pointer {} now runs from NPC entry {} to coerced NPC entry {}; lines no longer alternate",
                        pointer_id,
                        parent_id,
                        id
                    );
                }
            }
        }
        if let Some(node) = self.node(id) {
            for ptr in node.pointers() {
                if ptr.target_type() == NodeType::Entry {
                    tracing::warn!(
                        "child pointer {} of coerced NPC entry {} targets another NPC entry; lines no longer alternate",
                        ptr.id(),
                        id
                    );
                }
            }
        }
    }

    /// Rebuilds the derived state after deserialization: the link registry,
    /// the id counters, and every cached pointer index.
    pub fn restore_internal_state(&mut self) {
        self.links.clear();
        let mut max_node = 0u32;
        let mut max_pointer = 0u32;
        for ptr in &self.starts {
            max_pointer = max_pointer.max(ptr.id().as_u32());
        }
        for node in self.entries.iter().chain(self.replies.iter()) {
            max_node = max_node.max(node.id().as_u32());
            for ptr in node.pointers() {
                max_pointer = max_pointer.max(ptr.id().as_u32());
            }
        }
        self.next_node_id = max_node + 1;
        self.next_pointer_id = max_pointer + 1;

        let start_pairs: Vec<(PointerId, NodeId)> =
            self.starts.iter().map(|p| (p.id(), p.target())).collect();
        let node_pairs: Vec<(PointerId, NodeId)> = self
            .entries
            .iter()
            .chain(self.replies.iter())
            .flat_map(|n| n.pointers().iter().map(|p| (p.id(), p.target())))
            .collect();
        for (pointer, target) in start_pairs.into_iter().chain(node_pairs) {
            self.links.register(pointer, target);
        }

        recalculate_pointer_indices(self);
    }
}

#[cfg(test)]
mod dialog_tests {
    use super::*;

    fn two_line_dialog() -> (Dialog, NodeId, NodeId) {
        let mut dialog = Dialog::new();
        let entry = dialog.add_node(DialogNode::new(NodeType::Entry, "You there. Stop."));
        let reply = dialog.add_node(DialogNode::new(NodeType::Reply, "Me? What did I do?"));
        dialog.add_start(entry).unwrap();
        dialog.add_child(entry, reply).unwrap();
        (dialog, entry, reply)
    }

    #[test]
    fn test_add_node_assigns_fresh_ids() {
        let mut dialog = Dialog::new();
        let a = dialog.add_node(DialogNode::new(NodeType::Entry, "First."));
        let b = dialog.add_node(DialogNode::new(NodeType::Reply, "Second."));
        let c = dialog.add_node(DialogNode::new(NodeType::Entry, "Third."));

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
        assert_eq!(dialog.entry_count(), 2);
        assert_eq!(dialog.reply_count(), 1);
    }

    #[test]
    fn test_ids_are_not_reused_after_removal() {
        let mut dialog = Dialog::new();
        let a = dialog.add_node(DialogNode::new(NodeType::Entry, "Doomed."));
        dialog.remove_node(a).unwrap();
        let b = dialog.add_node(DialogNode::new(NodeType::Entry, "Successor."));
        assert_ne!(a, b);
    }

    #[test]
    fn test_add_start_rejects_reply() {
        let mut dialog = Dialog::new();
        let reply = dialog.add_node(DialogNode::new(NodeType::Reply, "I go first!"));
        let err = dialog.add_start(reply).unwrap_err();
        assert!(err.to_string().contains("only NPC entries"));
        assert!(dialog.starts().is_empty());
    }

    #[test]
    fn test_add_child_rejects_same_type() {
        let mut dialog = Dialog::new();
        let a = dialog.add_node(DialogNode::new(NodeType::Entry, "One entry."));
        let b = dialog.add_node(DialogNode::new(NodeType::Entry, "Another entry."));
        let err = dialog.add_child(a, b).unwrap_err();
        assert!(err.to_string().contains("must alternate"));
    }

    #[test]
    fn test_add_child_rejects_second_placement() {
        let (mut dialog, _entry, reply) = two_line_dialog();
        let other = dialog.add_node(DialogNode::new(NodeType::Entry, "Also a parent."));
        dialog.add_start(other).unwrap();
        let err = dialog.add_child(other, reply).unwrap_err();
        assert!(err.to_string().contains("already has a placement"));
    }

    #[test]
    fn test_add_child_registers_referrer() {
        let (dialog, entry, reply) = two_line_dialog();
        assert!(dialog.links().is_referenced(entry));
        assert_eq!(dialog.links().referrers(reply).len(), 1);
    }

    #[test]
    fn test_remove_node_refuses_while_referenced() {
        let (mut dialog, _entry, reply) = two_line_dialog();
        let err = dialog.remove_node(reply).unwrap_err();
        assert!(err.to_string().contains("still reference it"));
        assert!(dialog.contains(reply));
    }

    #[test]
    fn test_remove_pointer_then_node() {
        let (mut dialog, entry, reply) = two_line_dialog();
        let pointer_id = dialog.node(entry).unwrap().pointers()[0].id();

        let removed = dialog.remove_pointer(pointer_id).unwrap();
        assert_eq!(removed.target(), reply);
        assert!(!dialog.links().is_referenced(reply));

        let node = dialog.remove_node(reply).unwrap();
        assert_eq!(node.id(), reply);
        assert_eq!(dialog.reply_count(), 0);
    }

    #[test]
    fn test_parent_of_distinguishes_root_and_node() {
        let (dialog, entry, _reply) = two_line_dialog();
        let start_id = dialog.starts()[0].id();
        let child_id = dialog.node(entry).unwrap().pointers()[0].id();

        assert_eq!(dialog.parent_of(start_id), Some(ParentRef::Root));
        assert_eq!(dialog.parent_of(child_id), Some(ParentRef::Node(entry)));
        assert_eq!(dialog.parent_of(PointerId(999)), None);
    }

    #[test]
    fn test_reachable_nodes_follows_links_and_survives_cycles() {
        let (mut dialog, entry, reply) = two_line_dialog();
        // Manually close a cycle: reply links back to the entry.
        let link_id = dialog.allocate_pointer_id();
        let link = Pointer::new(link_id, entry, NodeType::Entry, true, false);
        dialog.attach_child(reply, link).unwrap();

        let reachable = dialog.reachable_nodes();
        assert!(reachable.contains(&entry));
        assert!(reachable.contains(&reply));
        assert_eq!(reachable.len(), 2);
    }

    #[test]
    fn test_reachable_nodes_skips_orphans() {
        let (mut dialog, _entry, _reply) = two_line_dialog();
        let orphan = dialog.add_node(DialogNode::new(NodeType::Entry, "Nobody says this."));

        let reachable = dialog.reachable_nodes();
        assert!(!reachable.contains(&orphan));
    }

    #[test]
    fn test_restore_internal_state_rebuilds_registry_and_counters() {
        let (dialog, entry, reply) = two_line_dialog();
        let json = serde_json::to_string(&dialog).unwrap();
        let mut loaded: Dialog = serde_json::from_str(&json).unwrap();
        loaded.restore_internal_state();

        assert!(loaded.links().is_referenced(entry));
        assert!(loaded.links().is_referenced(reply));

        // Fresh ids must not collide with the loaded ones.
        let fresh = loaded.add_node(DialogNode::new(NodeType::Reply, "New line."));
        assert!(fresh.as_u32() > reply.as_u32());
        assert!(fresh.as_u32() > entry.as_u32());
    }

    #[test]
    fn test_coerce_reply_to_entry_moves_pools_and_fixes_caches() {
        let (mut dialog, entry, reply) = two_line_dialog();
        dialog.coerce_reply_to_entry(reply);

        assert_eq!(dialog.entry_count(), 2);
        assert_eq!(dialog.reply_count(), 0);
        assert_eq!(dialog.node(reply).unwrap().node_type(), NodeType::Entry);

        // The parent's pointer cache follows the move.
        let ptr = &dialog.node(entry).unwrap().pointers()[0];
        assert_eq!(ptr.target_type(), NodeType::Entry);
    }
}
