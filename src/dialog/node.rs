//! Dialog node representation.
//!
//! This module provides the core data structures for representing conversation
//! lines in dlgquill. Each line is a `DialogNode` carrying the spoken text and
//! its scripting hooks, identified by a `NodeId` that stays stable across edits.
//! Nodes live in per-type pools inside a [`Dialog`](crate::dialog::graph::Dialog)
//! and never embed their children directly; parent/child structure is expressed
//! through [`Pointer`](crate::dialog::pointer::Pointer) values.
//!
//! # Example
//!
//! ```
//! use dlgquill::dialog::node::{DialogNode, NodeType};
//!
//! // An NPC line with a named speaker
//! let mut greeting = DialogNode::new(NodeType::Entry, "Halt! Who goes there?");
//! greeting.speaker = "Gate Guard".to_string();
//! assert!(greeting.has_speaker());
//!
//! // A player response alternates with it
//! let reply = DialogNode::new(NodeType::Reply, "Just a humble merchant.");
//! assert_eq!(reply.node_type(), NodeType::Entry.opposite());
//! ```

use serde::{Deserialize, Serialize};

use crate::dialog::pointer::Pointer;

/// Stable identity of a node within one dialog.
///
/// Ids are allocated from a per-dialog counter and are never reused, so a
/// `NodeId` keeps identifying the same line no matter how the pools are
/// reordered by later edits. The id says nothing about where the node sits
/// in its pool; that position is recomputed on demand.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw numeric id.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the conversation speaks a line.
///
/// Every node is one of exactly two kinds, and the kind decides which pool
/// the node lives in. A well-formed dialog alternates between the two along
/// every path from a conversation start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// A line spoken by the NPC (or a named speaker).
    Entry,
    /// A line spoken by the player.
    Reply,
}

impl NodeType {
    /// Returns the other side of the conversation.
    ///
    /// # Example
    ///
    /// ```
    /// use dlgquill::dialog::node::NodeType;
    ///
    /// assert_eq!(NodeType::Entry.opposite(), NodeType::Reply);
    /// assert_eq!(NodeType::Reply.opposite(), NodeType::Entry);
    /// ```
    pub fn opposite(&self) -> NodeType {
        match self {
            NodeType::Entry => NodeType::Reply,
            NodeType::Reply => NodeType::Entry,
        }
    }

    /// Returns true if this is an NPC entry.
    pub fn is_entry(&self) -> bool {
        matches!(self, NodeType::Entry)
    }

    /// Returns true if this is a player reply.
    pub fn is_reply(&self) -> bool {
        matches!(self, NodeType::Reply)
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeType::Entry => write!(f, "NPC entry"),
            NodeType::Reply => write!(f, "player reply"),
        }
    }
}

/// A single conversation line with its scripting hooks.
///
/// `DialogNode` is the primary content type in dlgquill. The text and script
/// fields are plain data and freely editable; the identity and structure
/// fields (`id`, `node_type`, `pointers`) are managed through the owning
/// [`Dialog`](crate::dialog::graph::Dialog) so the pools, the link registry,
/// and the cached pointer indices stay consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogNode {
    pub(crate) id: NodeId,
    #[serde(rename = "type")]
    pub(crate) node_type: NodeType,
    /// The spoken text of this line.
    pub text: String,
    /// Named speaker override. Empty means the dialog owner (for entries)
    /// or the player (for replies).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub speaker: String,
    /// Script to run when this line is spoken.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub action_script: String,
    /// Voice-over resource reference.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sound: String,
    /// Designer comment, never shown in game.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) pointers: Vec<Pointer>,
}

impl DialogNode {
    /// Creates a new node with the given type and text.
    ///
    /// The id is a placeholder until the node is handed to
    /// [`Dialog::add_node`](crate::dialog::graph::Dialog::add_node), which
    /// assigns a fresh one from the dialog's counter.
    ///
    /// # Example
    ///
    /// ```
    /// use dlgquill::dialog::node::{DialogNode, NodeType};
    ///
    /// let node = DialogNode::new(NodeType::Reply, "I'll be on my way.");
    /// assert_eq!(node.node_type(), NodeType::Reply);
    /// assert!(node.pointers().is_empty());
    /// ```
    pub fn new(node_type: NodeType, text: impl Into<String>) -> Self {
        Self {
            id: NodeId(0),
            node_type,
            text: text.into(),
            speaker: String::new(),
            action_script: String::new(),
            sound: String::new(),
            comment: String::new(),
            pointers: Vec::new(),
        }
    }

    /// Returns this node's stable id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns which side of the conversation speaks this line.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Returns the outgoing pointers in sibling order.
    pub fn pointers(&self) -> &[Pointer] {
        &self.pointers
    }

    /// Returns the outgoing pointer with the given id, if this node owns it.
    pub fn pointer(&self, id: crate::dialog::pointer::PointerId) -> Option<&Pointer> {
        self.pointers.iter().find(|p| p.id() == id)
    }

    /// Returns true if this line has a named speaker override.
    pub fn has_speaker(&self) -> bool {
        !self.speaker.is_empty()
    }

    /// Returns true if this line runs a script when spoken.
    pub fn has_action(&self) -> bool {
        !self.action_script.is_empty()
    }

    /// Returns a short preview of the text, suitable for status messages
    /// and outline views.
    pub fn snippet(&self, max_chars: usize) -> String {
        let mut out: String = self.text.chars().take(max_chars).collect();
        if self.text.chars().count() > max_chars {
            out.push_str("...");
        }
        out
    }

    pub(crate) fn pointers_mut(&mut self) -> &mut Vec<Pointer> {
        &mut self.pointers
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    pub(crate) fn set_node_type(&mut self, node_type: NodeType) {
        self.node_type = node_type;
    }
}

#[cfg(test)]
mod node_tests {
    use super::*;

    #[test]
    fn test_node_type_opposite() {
        assert_eq!(NodeType::Entry.opposite(), NodeType::Reply);
        assert_eq!(NodeType::Reply.opposite(), NodeType::Entry);
        assert_eq!(NodeType::Entry.opposite().opposite(), NodeType::Entry);
    }

    #[test]
    fn test_node_type_display() {
        assert_eq!(format!("{}", NodeType::Entry), "NPC entry");
        assert_eq!(format!("{}", NodeType::Reply), "player reply");
    }

    #[test]
    fn test_node_type_predicates() {
        assert!(NodeType::Entry.is_entry());
        assert!(!NodeType::Entry.is_reply());
        assert!(NodeType::Reply.is_reply());
        assert!(!NodeType::Reply.is_entry());
    }

    #[test]
    fn test_new_node_defaults() {
        let node = DialogNode::new(NodeType::Entry, "Welcome to the Drunken Dragon.");
        assert_eq!(node.node_type(), NodeType::Entry);
        assert_eq!(node.text, "Welcome to the Drunken Dragon.");
        assert!(node.speaker.is_empty());
        assert!(node.action_script.is_empty());
        assert!(node.sound.is_empty());
        assert!(node.comment.is_empty());
        assert!(node.pointers().is_empty());
    }

    #[test]
    fn test_has_speaker_and_action() {
        let mut node = DialogNode::new(NodeType::Entry, "Psst. Over here.");
        assert!(!node.has_speaker());
        assert!(!node.has_action());

        node.speaker = "Shady Figure".to_string();
        node.action_script = "ga_give_gold".to_string();
        assert!(node.has_speaker());
        assert!(node.has_action());
    }

    #[test]
    fn test_snippet_truncation() {
        let node = DialogNode::new(NodeType::Reply, "A very long line of player dialogue");
        assert_eq!(node.snippet(6), "A very...");

        let short = DialogNode::new(NodeType::Reply, "Yes.");
        assert_eq!(short.snippet(40), "Yes.");
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(format!("{}", NodeId(17)), "17");
        assert_eq!(NodeId(17).as_u32(), 17);
    }

    #[test]
    fn test_node_type_serde_names() {
        let json = serde_json::to_string(&NodeType::Entry).unwrap();
        assert_eq!(json, "\"entry\"");
        let back: NodeType = serde_json::from_str("\"reply\"").unwrap();
        assert_eq!(back, NodeType::Reply);
    }
}
