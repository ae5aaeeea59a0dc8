//! Pointer (edge) representation.
//!
//! A `Pointer` is a directed edge from a parent position to a node. Ownership
//! of the target is encoded on the edge: a non-link pointer is the target's
//! one true placement in the conversation tree, while a link pointer is an
//! extra reference that lets several branches converge on the same line
//! without duplicating it. Start pointers sit in the dialog's root list
//! rather than on a parent node.
//!
//! Pointers cache two things about their target for serialization: the
//! target's pool (`target_type`) and its position in that pool (`index`).
//! The position cache goes stale whenever a pool is reordered and is only
//! authoritative after
//! [`recalculate_pointer_indices`](crate::dialog::reindex::recalculate_pointer_indices)
//! has run.

use serde::{Deserialize, Serialize};

use crate::dialog::node::{NodeId, NodeType};

/// Stable identity of a pointer within one dialog.
///
/// Like node ids, pointer ids come from a per-dialog counter and are never
/// reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct PointerId(pub(crate) u32);

impl PointerId {
    /// Returns the raw numeric id.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PointerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an edge attaches: the conversation root or a parent node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentRef {
    /// The dialog root. Edges here are conversation starts.
    Root,
    /// A parent node identified by its stable id.
    Node(NodeId),
}

/// A directed edge from a parent position to a dialog node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pointer {
    pub(crate) id: PointerId,
    pub(crate) target: NodeId,
    #[serde(rename = "type")]
    pub(crate) target_type: NodeType,
    #[serde(default)]
    pub(crate) index: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) is_link: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) is_start: bool,
    /// Condition script gating whether this branch is offered.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub active_script: String,
    /// Designer comment on the transition itself.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl Pointer {
    pub(crate) fn new(
        id: PointerId,
        target: NodeId,
        target_type: NodeType,
        is_link: bool,
        is_start: bool,
    ) -> Self {
        Self {
            id,
            target,
            target_type,
            index: 0,
            is_link,
            is_start,
            active_script: String::new(),
            comment: String::new(),
        }
    }

    /// Returns this pointer's stable id.
    pub fn id(&self) -> PointerId {
        self.id
    }

    /// Returns the stable id of the node this pointer targets.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Returns which pool the target lives in.
    pub fn target_type(&self) -> NodeType {
        self.target_type
    }

    /// Returns the cached position of the target in its pool.
    ///
    /// Stale after pool reorders; see
    /// [`recalculate_pointer_indices`](crate::dialog::reindex::recalculate_pointer_indices).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns true if this is a link (reference) edge rather than the
    /// target's placement.
    pub fn is_link(&self) -> bool {
        self.is_link
    }

    /// Returns true if this edge is a conversation start.
    pub fn is_start(&self) -> bool {
        self.is_start
    }

    /// Returns true if a condition script gates this branch.
    pub fn has_condition(&self) -> bool {
        !self.active_script.is_empty()
    }

    pub(crate) fn set_id(&mut self, id: PointerId) {
        self.id = id;
    }

    pub(crate) fn set_target(&mut self, target: NodeId) {
        self.target = target;
    }

    pub(crate) fn set_target_type(&mut self, target_type: NodeType) {
        self.target_type = target_type;
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}

#[cfg(test)]
mod pointer_tests {
    use super::*;

    #[test]
    fn test_new_pointer_defaults() {
        let ptr = Pointer::new(PointerId(3), NodeId(7), NodeType::Reply, false, false);
        assert_eq!(ptr.id(), PointerId(3));
        assert_eq!(ptr.target(), NodeId(7));
        assert_eq!(ptr.target_type(), NodeType::Reply);
        assert_eq!(ptr.index(), 0);
        assert!(!ptr.is_link());
        assert!(!ptr.is_start());
        assert!(!ptr.has_condition());
    }

    #[test]
    fn test_has_condition() {
        let mut ptr = Pointer::new(PointerId(1), NodeId(2), NodeType::Entry, true, false);
        assert!(!ptr.has_condition());
        ptr.active_script = "gc_check_gold".to_string();
        assert!(ptr.has_condition());
    }

    #[test]
    fn test_pointer_id_display() {
        assert_eq!(format!("{}", PointerId(42)), "42");
        assert_eq!(PointerId(42).as_u32(), 42);
    }

    #[test]
    fn test_parent_ref_equality() {
        assert_eq!(ParentRef::Root, ParentRef::Root);
        assert_eq!(ParentRef::Node(NodeId(1)), ParentRef::Node(NodeId(1)));
        assert_ne!(ParentRef::Node(NodeId(1)), ParentRef::Node(NodeId(2)));
        assert_ne!(ParentRef::Root, ParentRef::Node(NodeId(0)));
    }
}
