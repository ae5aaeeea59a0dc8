//! Paste orchestration.
//!
//! [`paste_as_duplicate`] lands the clipboard's captured line at a chosen
//! position: under a parent node or at the conversation root. The operation
//! runs in three phases with a hard rule between them: every validation
//! happens before any mutation, so a rejected paste leaves the dialog
//! byte-for-byte unchanged.
//!
//! The two capture modes land differently. A cut paste moves the original
//! node, keeping its id so links elsewhere in the graph keep resolving to
//! it. A cut slot whose id has since been re-dealt to a different kind of
//! line is stale and is rejected. A copy paste clones the captured subtree
//! with fresh ids so the copy and the original can diverge.
//!
//! Pasting at the root carries one extra rule from the game's dialogue
//! format: conversations are opened by the NPC side. A plain player reply
//! is rejected at the root, but a reply with a named speaker is coerced
//! into an NPC entry, because a speakered line reads as an NPC line in
//! game.

use crate::dialog::clone::clone_subtree;
use crate::dialog::graph::Dialog;
use crate::dialog::node::{NodeId, NodeType};
use crate::dialog::pointer::{ParentRef, Pointer, PointerId};
use crate::dialog::reindex::recalculate_pointer_indices;
use crate::editor::clipboard::{ClipMode, Clipboard};

/// Why a paste was rejected. The dialog is untouched in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteError {
    /// Nothing has been copied or cut.
    EmptyClipboard,
    /// The parent node to paste under is not part of the dialog.
    TargetMissing(NodeId),
    /// A plain player reply cannot open a conversation.
    ReplyAtRoot,
    /// The pasted line would sit under a line of the same type.
    AlternationViolation {
        /// The type of the would-be parent.
        parent: NodeType,
        /// The type of the line being pasted.
        pasted: NodeType,
    },
    /// A cut slot's node id now belongs to a different kind of line.
    CutSourceMismatch {
        /// The id the cut captured.
        node: NodeId,
        /// The type of the line when it was cut.
        captured: NodeType,
        /// The type of the line the id resolves to now.
        found: NodeType,
    },
}

impl std::fmt::Display for PasteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasteError::EmptyClipboard => {
                write!(f, "clipboard is empty; copy or cut a line first")
            }
            PasteError::TargetMissing(id) => {
                write!(f, "paste target node {} is not part of this dialog", id)
            }
            PasteError::ReplyAtRoot => write!(
                f,
                "a player reply without a speaker cannot start a conversation; root lines are spoken by the NPC side"
            ),
            PasteError::AlternationViolation { parent, pasted } => write!(
                f,
                "cannot paste a {} under a {}: NPC and player lines must alternate",
                pasted, parent
            ),
            PasteError::CutSourceMismatch {
                node,
                captured,
                found,
            } => write!(
                f,
                "cut node {} was captured as a {}, but that id now belongs to a {}; cut the line again",
                node, captured, found
            ),
        }
    }
}

impl std::error::Error for PasteError {}

/// What a successful paste produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PasteOutcome {
    /// The id of the node now sitting at the paste position. For a cut
    /// paste this is the original node's id; for a copy paste it is the
    /// fresh clone's id.
    pub node: NodeId,
    /// The pasted node's type after any root coercion.
    pub node_type: NodeType,
    /// The pointer that attaches the pasted node.
    pub pointer: PointerId,
    /// A one-line status message for the editor frontend.
    pub message: String,
}

/// Pastes the clipboard contents at `target`, duplicating or moving
/// according to how they were captured.
///
/// On success the pasted subtree is attached, the registry is current, and
/// every pointer index in the dialog has been recalculated. A cut slot is
/// consumed; a copy slot survives for further pastes. On error nothing has
/// changed, including the clipboard.
pub fn paste_as_duplicate(
    dialog: &mut Dialog,
    clipboard: &mut Clipboard,
    target: ParentRef,
) -> Result<PasteOutcome, PasteError> {
    // Phase 1: validate everything before mutating anything.
    let slot = clipboard.contents().ok_or(PasteError::EmptyClipboard)?;
    let pasted_type = slot.node().node_type();
    let coerce = match target {
        ParentRef::Root => {
            if pasted_type == NodeType::Reply && !slot.node().has_speaker() {
                return Err(PasteError::ReplyAtRoot);
            }
            pasted_type == NodeType::Reply
        }
        ParentRef::Node(parent_id) => {
            let parent = dialog
                .node(parent_id)
                .ok_or(PasteError::TargetMissing(parent_id))?;
            if parent.node_type() == pasted_type {
                return Err(PasteError::AlternationViolation {
                    parent: parent.node_type(),
                    pasted: pasted_type,
                });
            }
            false
        }
    };
    // A cut moves the pooled node under the captured id. A stale slot whose
    // id now names a different kind of line is rejected.
    if slot.mode() == ClipMode::Cut {
        if let Some((found, _)) = dialog.position_of(slot.source_id()) {
            if found != pasted_type {
                return Err(PasteError::CutSourceMismatch {
                    node: slot.source_id(),
                    captured: pasted_type,
                    found,
                });
            }
        }
    }

    let mode = slot.mode();
    let source_id = slot.source_id();
    let snapshot = slot.node().clone();
    let active_script = slot.active_script().to_string();
    let comment = slot.comment().to_string();

    // Phase 2: land the node.
    let placed = match mode {
        ClipMode::Cut => {
            // The original moves. Any placement edge that grew back during
            // the cut's limbo is severed; link edges keep following the id.
            let stale_placements: Vec<PointerId> = dialog
                .links()
                .referrers(source_id)
                .iter()
                .copied()
                .filter(|p| dialog.pointer(*p).map_or(false, |ptr| !ptr.is_link()))
                .collect();
            for pointer_id in stale_placements {
                dialog.remove_pointer(pointer_id);
            }
            if dialog.contains(source_id) {
                if coerce {
                    dialog.coerce_reply_to_entry(source_id);
                }
            } else {
                let mut node = snapshot;
                if coerce {
                    node.set_node_type(NodeType::Entry);
                }
                dialog.insert_node(node);
            }
            source_id
        }
        ClipMode::Copy => {
            let mut top = clone_subtree(dialog, &snapshot);
            if coerce {
                top.set_node_type(NodeType::Entry);
            }
            let id = top.id();
            dialog.insert_node(top);
            id
        }
    };
    let placed_type = if coerce { NodeType::Entry } else { pasted_type };

    // Phase 3: attach, consume a cut slot, and refresh the index caches.
    let pointer_id = dialog.allocate_pointer_id();
    let mut ptr = Pointer::new(
        pointer_id,
        placed,
        placed_type,
        false,
        matches!(target, ParentRef::Root),
    );
    ptr.active_script = active_script;
    ptr.comment = comment;
    match target {
        ParentRef::Root => dialog.attach_start(ptr),
        ParentRef::Node(parent_id) => {
            // The parent was validated in phase 1 and nothing has removed
            // nodes since, so attachment cannot fail.
            if let Err(err) = dialog.attach_child(parent_id, ptr) {
                debug_assert!(false, "validated paste parent vanished: {}", err);
                tracing::warn!("validated paste parent vanished: {}", err);
                return Err(PasteError::TargetMissing(parent_id));
            }
        }
    }
    if mode == ClipMode::Cut {
        clipboard.clear();
    }
    recalculate_pointer_indices(dialog);

    let snippet = dialog
        .node(placed)
        .map(|n| n.snippet(32))
        .unwrap_or_default();
    let message = match target {
        ParentRef::Root => {
            if coerce {
                format!(
                    "Pasted \"{}\" as a new conversation start (made an NPC entry)",
                    snippet
                )
            } else {
                format!("Pasted \"{}\" as a new conversation start", snippet)
            }
        }
        ParentRef::Node(parent_id) => {
            let parent_snippet = dialog
                .node(parent_id)
                .map(|n| n.snippet(32))
                .unwrap_or_default();
            format!("Pasted \"{}\" under \"{}\"", snippet, parent_snippet)
        }
    };

    Ok(PasteOutcome {
        node: placed,
        node_type: placed_type,
        pointer: pointer_id,
        message,
    })
}
