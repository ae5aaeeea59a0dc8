//! Undo/redo system with branching undo tree.
//!
//! Edit history is a tree rather than a stack, so no state is ever lost.
//! When you undo then make a new edit, the old "future" is preserved as a
//! branch that can still be reached by redo.
//!
//! # Architecture
//!
//! - `DialogSnapshot`: Captures dialog and selection state at a point in time
//! - `UndoNode`: Tree node containing snapshot, parent, children, and metadata
//! - `UndoTree`: Manages the tree structure and navigation

use crate::dialog::graph::Dialog;
use crate::dialog::node::NodeId;
use std::time::SystemTime;

/// Snapshot of editor state at a specific point in time.
///
/// Contains only the state needed to restore the editor to this point:
/// - The full dialog graph
/// - The node selected in the outline, if any
#[derive(Debug, Clone)]
pub struct DialogSnapshot {
    pub dialog: Dialog,
    pub selected: Option<NodeId>,
}

/// A node in the undo tree.
///
/// Each node represents a state in the edit history and tracks:
/// - The snapshot of editor state
/// - Parent node (for undo navigation)
/// - Child nodes (for redo navigation with branching)
/// - Timestamp when this state was created
/// - Sequence number for chronological ordering
#[derive(Debug, Clone)]
pub struct UndoNode {
    pub snapshot: DialogSnapshot,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub timestamp: SystemTime,
    pub seq: u64,
}

impl UndoNode {
    /// Creates a new undo node.
    ///
    /// # Arguments
    ///
    /// * `snapshot` - The editor state at this point
    /// * `parent` - Index of parent node (None for root)
    /// * `seq` - Sequence number for chronological ordering
    pub fn new(snapshot: DialogSnapshot, parent: Option<usize>, seq: u64) -> Self {
        Self {
            snapshot,
            parent,
            children: Vec::new(),
            timestamp: SystemTime::now(),
            seq,
        }
    }
}

/// Branching undo tree for managing edit history.
///
/// The undo tree stores all editor states as a tree structure where:
/// - Root node is the initial state when the dialog was opened
/// - Each child represents a modification
/// - Branching occurs when you undo then make a new edit
/// - Current pointer tracks where we are in history
///
/// # Example
///
/// ```text
///     0 (initial)
///     |
///     1 (edit A)
///    / \
///   2   3 (branching: undo, then two different edits)
///   |
///   4
/// ```
#[derive(Debug)]
pub struct UndoTree {
    pub nodes: Vec<UndoNode>,
    current: usize,
    next_seq: u64,
    limit: usize,
}

impl UndoTree {
    /// Creates a new undo tree with an initial snapshot.
    ///
    /// # Arguments
    ///
    /// * `initial_snapshot` - The starting state (root node)
    /// * `limit` - Maximum number of nodes to keep
    pub fn new(initial_snapshot: DialogSnapshot, limit: usize) -> Self {
        let root = UndoNode::new(initial_snapshot, None, 0);
        Self {
            nodes: vec![root],
            current: 0,
            next_seq: 1,
            limit,
        }
    }

    /// Returns the current node index.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Returns the number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Adds a new checkpoint to the undo tree.
    ///
    /// Creates a new node as a child of the current node. If the current node
    /// already has children (from previous redos), this creates a branch.
    ///
    /// # Arguments
    ///
    /// * `snapshot` - The new state to checkpoint
    pub fn add_checkpoint(&mut self, snapshot: DialogSnapshot) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let new_node = UndoNode::new(snapshot, Some(self.current), seq);
        let new_index = self.nodes.len();

        // Add new node as child of current
        self.nodes[self.current].children.push(new_index);
        self.nodes.push(new_node);

        // Move current pointer to new node
        self.current = new_index;

        // TODO: Implement pruning when limit exceeded
    }

    /// Undoes to the parent node.
    ///
    /// Returns the snapshot to restore, or None if already at root.
    pub fn undo(&mut self) -> Option<DialogSnapshot> {
        let current_node = &self.nodes[self.current];

        if let Some(parent_idx) = current_node.parent {
            self.current = parent_idx;
            Some(self.nodes[parent_idx].snapshot.clone())
        } else {
            None
        }
    }

    /// Redoes to a child node.
    ///
    /// Follows the newest branch (child with highest sequence number).
    /// Returns the snapshot to restore, or None if no children exist.
    pub fn redo(&mut self) -> Option<DialogSnapshot> {
        let current_node = &self.nodes[self.current];

        if current_node.children.is_empty() {
            return None;
        }

        // Find child with highest sequence number (newest branch)
        let newest_child_idx = current_node
            .children
            .iter()
            .max_by_key(|&&child_idx| self.nodes[child_idx].seq)
            .copied()
            .unwrap(); // Safe because we checked is_empty

        self.current = newest_child_idx;
        Some(self.nodes[newest_child_idx].snapshot.clone())
    }
}
