//! Flat structure export for flowchart-style viewers.
//!
//! External visualizers want a dialog as plain nodes and edges, not as the
//! pooled graph the editor maintains. `export_structure` flattens a dialog
//! into string-keyed nodes (`npc_4`, `pc_7`) and source/target links,
//! prefixed with a `root` pseudo-node that anchors the conversation starts.
//! The whole structure serializes to JSON with serde.

use crate::dialog::graph::Dialog;
use crate::dialog::node::{DialogNode, NodeId, NodeType};
use serde::{Deserialize, Serialize};

/// Node kind tag in the exported structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureKind {
    /// The synthetic anchor every conversation start hangs from.
    Root,
    /// An NPC entry line.
    Npc,
    /// A player reply line.
    Pc,
}

/// One box in the flowchart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureNode {
    /// Stable string id: `root`, `npc_<id>`, or `pc_<id>`.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: StructureKind,
    pub text: String,
    pub speaker: String,
    /// The node fires an action script when reached.
    pub has_action: bool,
    /// Some edge leading to this node is gated by a condition script.
    pub has_condition: bool,
}

/// One arrow in the flowchart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureLink {
    pub source: String,
    pub target: String,
    /// True for reference edges, false for the owning placement.
    pub is_link: bool,
    /// The edge carries a condition script.
    pub has_condition: bool,
}

/// A dialog flattened to viewer shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogStructure {
    pub nodes: Vec<StructureNode>,
    pub links: Vec<StructureLink>,
}

/// The string id a node carries in the export.
fn structure_id(node_type: NodeType, id: NodeId) -> String {
    match node_type {
        NodeType::Entry => format!("npc_{}", id),
        NodeType::Reply => format!("pc_{}", id),
    }
}

fn structure_node(dialog: &Dialog, node: &DialogNode) -> StructureNode {
    // A condition indicator on the box means some way into this line is
    // gated, regardless of which edge the viewer draws it on.
    let has_condition = dialog
        .links()
        .referrers(node.id())
        .iter()
        .any(|p| dialog.pointer(*p).map_or(false, |ptr| ptr.has_condition()));

    StructureNode {
        id: structure_id(node.node_type(), node.id()),
        kind: match node.node_type() {
            NodeType::Entry => StructureKind::Npc,
            NodeType::Reply => StructureKind::Pc,
        },
        text: node.text.clone(),
        speaker: node.speaker.clone(),
        has_action: node.has_action(),
        has_condition,
    }
}

/// Flattens a dialog into the nodes/links shape flowchart viewers consume.
///
/// The first node is always the `root` pseudo-node; every conversation
/// start becomes a link out of it. Node order follows the pools (entries
/// first), link order follows the start list and then each node's pointer
/// list, so the output is deterministic for a given dialog.
pub fn export_structure(dialog: &Dialog) -> DialogStructure {
    let mut nodes = Vec::with_capacity(dialog.entry_count() + dialog.reply_count() + 1);
    nodes.push(StructureNode {
        id: "root".to_string(),
        kind: StructureKind::Root,
        text: "Dialog Start".to_string(),
        speaker: String::new(),
        has_action: false,
        has_condition: false,
    });
    for node in dialog.entries().iter().chain(dialog.replies().iter()) {
        nodes.push(structure_node(dialog, node));
    }

    let mut links = Vec::new();
    for ptr in dialog.starts() {
        links.push(StructureLink {
            source: "root".to_string(),
            target: structure_id(ptr.target_type(), ptr.target()),
            is_link: ptr.is_link(),
            has_condition: ptr.has_condition(),
        });
    }
    for node in dialog.entries().iter().chain(dialog.replies().iter()) {
        let source = structure_id(node.node_type(), node.id());
        for ptr in node.pointers() {
            links.push(StructureLink {
                source: source.clone(),
                target: structure_id(ptr.target_type(), ptr.target()),
                is_link: ptr.is_link(),
                has_condition: ptr.has_condition(),
            });
        }
    }

    DialogStructure { nodes, links }
}
