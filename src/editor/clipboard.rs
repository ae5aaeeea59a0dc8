//! Clipboard for conversation lines.
//!
//! The clipboard holds at most one captured line at a time, together with
//! how it was captured: a copy slot duplicates on paste and can be pasted
//! repeatedly, while a cut slot moves the original node and is consumed by
//! the paste that lands it. Cutting also captures the severed edge's
//! condition script and comment so the paste can restore them on the new
//! placement edge.
//!
//! When enabled, captures are mirrored to the system clipboard as pretty
//! JSON so other tools can inspect the carried line. System clipboard
//! failures (headless sessions, denied access) are logged and ignored;
//! the in-process clipboard is the source of truth.

use anyhow::{anyhow, bail, Result};

use crate::dialog::graph::Dialog;
use crate::dialog::node::{DialogNode, NodeId};
use crate::dialog::pointer::PointerId;
use crate::dialog::reindex::recalculate_pointer_indices;

/// How the clipboard contents were captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipMode {
    /// Paste will duplicate the captured subtree. The slot survives the
    /// paste so it can be pasted again.
    Copy,
    /// Paste will move the original node. The slot is consumed by the
    /// paste that lands it.
    Cut,
}

/// One captured line and the context of its capture.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardSlot {
    node: DialogNode,
    source_id: NodeId,
    mode: ClipMode,
    active_script: String,
    comment: String,
}

impl ClipboardSlot {
    /// Returns the captured node snapshot.
    pub fn node(&self) -> &DialogNode {
        &self.node
    }

    /// Returns the stable id the node had (or still has) in its dialog.
    pub fn source_id(&self) -> NodeId {
        self.source_id
    }

    /// Returns whether this slot came from a copy or a cut.
    pub fn mode(&self) -> ClipMode {
        self.mode
    }

    /// Returns the condition script carried from the severed edge.
    pub fn active_script(&self) -> &str {
        &self.active_script
    }

    /// Returns the comment carried from the severed edge.
    pub fn comment(&self) -> &str {
        &self.comment
    }
}

/// The editor's single-slot clipboard.
#[derive(Debug, Default)]
pub struct Clipboard {
    slot: Option<ClipboardSlot>,
    sync_system: bool,
}

impl Clipboard {
    /// Creates an empty clipboard that mirrors captures to the system
    /// clipboard.
    pub fn new() -> Self {
        Self {
            slot: None,
            sync_system: true,
        }
    }

    /// Enables or disables mirroring captures to the system clipboard.
    pub fn set_sync_system(&mut self, sync: bool) {
        self.sync_system = sync;
    }

    /// Returns true if nothing is captured.
    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Returns the captured slot, if any.
    pub fn contents(&self) -> Option<&ClipboardSlot> {
        self.slot.as_ref()
    }

    /// Drops the captured slot.
    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// Captures a node by id for duplication, without any edge context.
    pub fn copy_node(&mut self, dialog: &Dialog, node: NodeId) -> Result<()> {
        let snapshot = dialog
            .node(node)
            .ok_or_else(|| anyhow!("node {} is not part of this dialog", node))?
            .clone();
        self.install(ClipboardSlot {
            node: snapshot,
            source_id: node,
            mode: ClipMode::Copy,
            active_script: String::new(),
            comment: String::new(),
        });
        Ok(())
    }

    /// Captures the node behind a pointer for duplication, carrying the
    /// pointer's condition script and comment along.
    pub fn copy_pointer(&mut self, dialog: &Dialog, pointer: PointerId) -> Result<()> {
        let ptr = dialog
            .pointer(pointer)
            .ok_or_else(|| anyhow!("pointer {} is not part of this dialog", pointer))?;
        let target = ptr.target();
        let active_script = ptr.active_script.clone();
        let comment = ptr.comment.clone();
        let snapshot = dialog
            .node(target)
            .ok_or_else(|| {
                anyhow!(
                    "pointer {} targets node {} which is missing from the pools",
                    pointer,
                    target
                )
            })?
            .clone();
        self.install(ClipboardSlot {
            node: snapshot,
            source_id: target,
            mode: ClipMode::Copy,
            active_script,
            comment,
        });
        Ok(())
    }

    /// Cuts a placement pointer: detaches the edge, captures its node for
    /// a later move, and removes the node from its pool unless link edges
    /// still reference it.
    ///
    /// Only placement edges can be cut; cutting a link would steal a node
    /// that is placed elsewhere. Use
    /// [`ops::delete_pointer`](crate::dialog::ops::delete_pointer) to drop
    /// a link edge.
    pub fn cut_pointer(&mut self, dialog: &mut Dialog, pointer: PointerId) -> Result<()> {
        let ptr = dialog
            .pointer(pointer)
            .ok_or_else(|| anyhow!("pointer {} is not part of this dialog", pointer))?
            .clone();
        if ptr.is_link() {
            bail!(
                "pointer {} is a link edge; cut the node's placement edge instead",
                pointer
            );
        }
        let source_id = ptr.target();
        let snapshot = dialog
            .node(source_id)
            .ok_or_else(|| {
                anyhow!(
                    "pointer {} targets node {} which is missing from the pools",
                    pointer,
                    source_id
                )
            })?
            .clone();

        dialog.remove_pointer(pointer);
        if !dialog.links().is_referenced(source_id) {
            // No links keep it alive, so the node leaves the pool and
            // travels entirely in the clipboard.
            dialog.remove_node(source_id)?;
        }
        recalculate_pointer_indices(dialog);

        self.install(ClipboardSlot {
            node: snapshot,
            source_id,
            mode: ClipMode::Cut,
            active_script: ptr.active_script,
            comment: ptr.comment,
        });
        Ok(())
    }

    fn install(&mut self, slot: ClipboardSlot) {
        self.sync_to_system(&slot.node);
        self.slot = Some(slot);
    }

    fn sync_to_system(&self, node: &DialogNode) {
        if !self.sync_system {
            return;
        }
        let Ok(text) = serde_json::to_string_pretty(node) else {
            return;
        };
        match arboard::Clipboard::new() {
            Ok(mut clipboard) => {
                let _ = clipboard.set_text(text);
            }
            Err(err) => {
                tracing::debug!("system clipboard unavailable: {}", err);
            }
        }
    }
}
