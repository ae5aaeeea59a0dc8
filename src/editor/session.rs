//! Editor session management.
//!
//! This module provides the `EditorSession` struct that manages all runtime
//! state for one open dialog: the dialog graph, the clipboard, the undo
//! history, the dirty flag (unsaved changes), the optional filename, and the
//! currently selected node.
//!
//! Mutations go through the session's wrapper methods so that every
//! successful change records an undo checkpoint and marks the session dirty.
//! The clipboard is not versioned with the dialog: undo and redo drop any
//! pending capture, since rolling the id counters back re-deals node ids
//! and a stale capture would land on the wrong lines.
//!
//! # Example
//!
//! ```
//! use dlgquill::config::Config;
//! use dlgquill::dialog::graph::Dialog;
//! use dlgquill::dialog::node::{DialogNode, NodeType};
//! use dlgquill::dialog::pointer::ParentRef;
//! use dlgquill::editor::session::EditorSession;
//!
//! let mut session = EditorSession::new(Dialog::new(), Config::default());
//!
//! let greet = session
//!     .add_node(ParentRef::Root, DialogNode::new(NodeType::Entry, "Well met."))
//!     .unwrap();
//!
//! assert!(session.is_dirty());
//! assert_eq!(session.selected(), Some(greet));
//!
//! assert!(session.undo());
//! assert!(session.dialog().is_empty());
//! ```

use crate::config::Config;
use crate::dialog::graph::Dialog;
use crate::dialog::node::{DialogNode, NodeId, NodeType};
use crate::dialog::ops::{self, DeleteOutcome};
use crate::dialog::paste::{paste_as_duplicate, PasteError, PasteOutcome};
use crate::dialog::pointer::{ParentRef, Pointer, PointerId};
use crate::dialog::reindex::recalculate_pointer_indices;
use crate::editor::clipboard::{ClipMode, Clipboard};
use crate::editor::undo::{DialogSnapshot, UndoTree};
use crate::file::{loader, saver};
use anyhow::{anyhow, bail, Result};
use std::path::Path;

/// Manages the complete runtime state of one open dialog.
///
/// `EditorSession` is the central state container that holds:
/// - The dialog graph being edited
/// - The clipboard for cut/copy/paste
/// - The branching undo history
/// - A dirty flag indicating unsaved changes
/// - An optional filename for the dialog
/// - The currently selected node, if any
pub struct EditorSession {
    dialog: Dialog,
    clipboard: Clipboard,
    undo_tree: UndoTree,
    config: Config,
    dirty: bool,
    filename: Option<String>,
    selected: Option<NodeId>,
}

impl EditorSession {
    /// Creates a new session around the given dialog.
    ///
    /// The session starts clean: no unsaved changes, no filename, nothing
    /// selected. The undo history is seeded with the dialog as its initial
    /// state, and the clipboard's system-clipboard sync follows
    /// `config.sync_clipboard`.
    pub fn new(dialog: Dialog, config: Config) -> Self {
        let mut clipboard = Clipboard::new();
        clipboard.set_sync_system(config.sync_clipboard);

        let initial_snapshot = DialogSnapshot {
            dialog: dialog.clone(),
            selected: None,
        };
        let undo_tree = UndoTree::new(initial_snapshot, config.undo_limit);

        Self {
            dialog,
            clipboard,
            undo_tree,
            config,
            dirty: false,
            filename: None,
            selected: None,
        }
    }

    /// Loads a dialog file and wraps it in a fresh session.
    ///
    /// The loaded path becomes the session's filename, so a later
    /// [`save`](Self::save) writes back to the same file.
    pub fn open<P: AsRef<Path>>(path: P, config: Config) -> Result<Self> {
        let dialog = loader::load_dialog_file(&path)?;
        let mut session = Self::new(dialog, config);
        session.filename = Some(path.as_ref().display().to_string());
        Ok(session)
    }

    /// Returns a reference to the dialog being edited.
    pub fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    /// Returns a mutable reference to the dialog.
    ///
    /// **IMPORTANT:** Changes made through this reference bypass undo
    /// history and dirty tracking. Prefer the session's wrapper methods;
    /// when direct access is unavoidable, call `mark_dirty` afterwards.
    pub fn dialog_mut(&mut self) -> &mut Dialog {
        &mut self.dialog
    }

    /// Returns a reference to the clipboard.
    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Returns a mutable reference to the clipboard.
    pub fn clipboard_mut(&mut self) -> &mut Clipboard {
        &mut self.clipboard
    }

    /// Returns the session's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns whether the dialog has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the dialog as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clears the dirty flag, indicating all changes have been saved.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Returns the filename of the dialog being edited, if any.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Sets the filename for the dialog.
    pub fn set_filename(&mut self, filename: String) {
        self.filename = Some(filename);
    }

    /// Returns the currently selected node, if any.
    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Selects a node.
    ///
    /// Returns false without changing the selection when the node is not
    /// part of the dialog.
    pub fn select(&mut self, node: NodeId) -> bool {
        if self.dialog.contains(node) {
            self.selected = Some(node);
            true
        } else {
            false
        }
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Creates a new node and places it under `parent`.
    ///
    /// A root placement requires an NPC entry; a node placement requires
    /// the NPC/player alternation to hold. Validation happens before the
    /// node enters a pool, so a rejected add leaves the dialog untouched.
    /// The new node becomes the selection.
    ///
    /// # Example
    ///
    /// ```
    /// use dlgquill::config::Config;
    /// use dlgquill::dialog::graph::Dialog;
    /// use dlgquill::dialog::node::{DialogNode, NodeType};
    /// use dlgquill::dialog::pointer::ParentRef;
    /// use dlgquill::editor::session::EditorSession;
    ///
    /// let mut session = EditorSession::new(Dialog::new(), Config::default());
    /// let halt = session
    ///     .add_node(ParentRef::Root, DialogNode::new(NodeType::Entry, "Halt!"))
    ///     .unwrap();
    /// let reply = session
    ///     .add_node(ParentRef::Node(halt), DialogNode::new(NodeType::Reply, "Sorry."))
    ///     .unwrap();
    ///
    /// assert_eq!(session.dialog().entry_count(), 1);
    /// assert_eq!(session.dialog().reply_count(), 1);
    /// assert_eq!(session.selected(), Some(reply));
    /// ```
    pub fn add_node(&mut self, parent: ParentRef, node: DialogNode) -> Result<NodeId> {
        match parent {
            ParentRef::Root => {
                if node.node_type() != NodeType::Entry {
                    bail!("only NPC entries can start a conversation");
                }
            }
            ParentRef::Node(parent_id) => {
                let parent_type = self
                    .dialog
                    .node(parent_id)
                    .map(|n| n.node_type())
                    .ok_or_else(|| {
                        anyhow!("parent node {} is not part of this dialog", parent_id)
                    })?;
                if parent_type == node.node_type() {
                    bail!(
                        "cannot attach a {} under a {}: NPC and player lines must alternate",
                        node.node_type(),
                        parent_type
                    );
                }
            }
        }

        let id = self.dialog.add_node(node);
        match parent {
            ParentRef::Root => {
                self.dialog.add_start(id)?;
            }
            ParentRef::Node(parent_id) => {
                self.dialog.add_child(parent_id, id)?;
            }
        }
        recalculate_pointer_indices(&mut self.dialog);

        self.selected = Some(id);
        self.after_mutation();
        Ok(id)
    }

    /// Replaces a node's spoken text.
    pub fn set_node_text(&mut self, node: NodeId, text: impl Into<String>) -> Result<()> {
        let target = self
            .dialog
            .node_mut(node)
            .ok_or_else(|| anyhow!("node {} is not part of this dialog", node))?;
        target.text = text.into();
        self.after_mutation();
        Ok(())
    }

    /// Replaces a node's speaker tag. An empty tag means the dialog owner.
    pub fn set_node_speaker(&mut self, node: NodeId, speaker: impl Into<String>) -> Result<()> {
        let target = self
            .dialog
            .node_mut(node)
            .ok_or_else(|| anyhow!("node {} is not part of this dialog", node))?;
        target.speaker = speaker.into();
        self.after_mutation();
        Ok(())
    }

    /// Copies a node (and implicitly its subtree) onto the clipboard.
    ///
    /// Copying does not modify the dialog, so it records no undo
    /// checkpoint.
    pub fn copy_node(&mut self, node: NodeId) -> Result<()> {
        self.clipboard.copy_node(&self.dialog, node)
    }

    /// Copies the node behind an edge onto the clipboard, carrying the
    /// edge's condition script and comment along.
    pub fn copy_pointer(&mut self, pointer: PointerId) -> Result<()> {
        self.clipboard.copy_pointer(&self.dialog, pointer)
    }

    /// Cuts a placement edge: detaches it and moves its node onto the
    /// clipboard for a later paste.
    pub fn cut_pointer(&mut self, pointer: PointerId) -> Result<()> {
        self.clipboard.cut_pointer(&mut self.dialog, pointer)?;
        self.after_mutation();
        Ok(())
    }

    /// Pastes the clipboard contents under `target`.
    ///
    /// On success the pasted node becomes the selection. On error the
    /// dialog and the clipboard are unchanged.
    pub fn paste(&mut self, target: ParentRef) -> Result<PasteOutcome, PasteError> {
        let outcome = paste_as_duplicate(&mut self.dialog, &mut self.clipboard, target)?;
        self.selected = Some(outcome.node);
        self.after_mutation();
        Ok(outcome)
    }

    /// Adds a link edge from `parent` to an existing node.
    pub fn add_link(&mut self, parent: ParentRef, target: NodeId) -> Result<PointerId> {
        let id = ops::add_link(&mut self.dialog, parent, target)?;
        self.after_mutation();
        Ok(id)
    }

    /// Removes a single edge, returning it.
    pub fn delete_pointer(&mut self, pointer: PointerId) -> Result<Pointer> {
        let removed = ops::delete_pointer(&mut self.dialog, pointer)?;
        self.after_mutation();
        Ok(removed)
    }

    /// Deletes a node and the subtree it owns.
    pub fn delete_node(&mut self, node: NodeId) -> Result<DeleteOutcome> {
        let outcome = ops::delete_node(&mut self.dialog, node)?;
        self.after_mutation();
        Ok(outcome)
    }

    /// Points a link edge at a different node.
    pub fn retarget_link(&mut self, pointer: PointerId, new_target: NodeId) -> Result<()> {
        ops::retarget_link(&mut self.dialog, pointer, new_target)?;
        self.after_mutation();
        Ok(())
    }

    /// Moves an edge up or down among its siblings.
    pub fn move_pointer(&mut self, pointer: PointerId, offset: isize) -> Result<()> {
        ops::move_pointer(&mut self.dialog, pointer, offset)?;
        self.after_mutation();
        Ok(())
    }

    /// Removes every node that is not reachable from a conversation start.
    ///
    /// Refuses while a cut node is waiting on the clipboard: the cut
    /// subtree is detached from the starts on purpose and would be swept
    /// away before it could be pasted.
    pub fn prune_unreachable(&mut self) -> Result<DeleteOutcome> {
        let cut_pending = self
            .clipboard
            .contents()
            .map_or(false, |slot| slot.mode() == ClipMode::Cut);
        if cut_pending {
            bail!("cannot prune while a cut node is waiting to be pasted");
        }
        let outcome = ops::prune_unreachable(&mut self.dialog)?;
        if outcome.nodes_removed > 0 || outcome.pointers_removed > 0 {
            self.after_mutation();
        }
        Ok(outcome)
    }

    /// Undoes the last operation.
    ///
    /// Restores the previous checkpoint, including the selection, and
    /// drops any clipboard capture: the restored id counters can re-deal
    /// the captured ids to future lines. Returns true if undo succeeded,
    /// false if already at the initial state. The session is marked dirty
    /// because the dialog now differs from the last saved state.
    pub fn undo(&mut self) -> bool {
        if let Some(snapshot) = self.undo_tree.undo() {
            self.dialog = snapshot.dialog;
            self.selected = snapshot.selected;
            self.clipboard.clear();
            self.dirty = true;
            true
        } else {
            false
        }
    }

    /// Redoes the last undone operation.
    ///
    /// Follows the newest branch when several exist, and drops any
    /// clipboard capture the way [`undo`](Self::undo) does. Returns true
    /// if redo succeeded, false if there is no redo history.
    pub fn redo(&mut self) -> bool {
        if let Some(snapshot) = self.undo_tree.redo() {
            self.dialog = snapshot.dialog;
            self.selected = snapshot.selected;
            self.clipboard.clear();
            self.dirty = true;
            true
        } else {
            false
        }
    }

    /// Saves the dialog back to its file.
    ///
    /// Fails when the session has no filename; use
    /// [`save_as`](Self::save_as) first.
    pub fn save(&mut self) -> Result<()> {
        let filename = self
            .filename
            .clone()
            .ok_or_else(|| anyhow!("no filename associated with this dialog; use save_as"))?;
        self.save_as(filename)
    }

    /// Saves the dialog to `path` and makes that the session's filename.
    ///
    /// Honors the config's backup setting and clears the dirty flag on
    /// success.
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        saver::save_dialog_file(&path, &self.dialog, &self.config)?;
        self.filename = Some(path.as_ref().display().to_string());
        self.dirty = false;
        Ok(())
    }

    /// Captures the current state as an undo checkpoint.
    fn checkpoint(&mut self) {
        let snapshot = DialogSnapshot {
            dialog: self.dialog.clone(),
            selected: self.selected,
        };
        self.undo_tree.add_checkpoint(snapshot);
    }

    /// Bookkeeping after a successful mutation: drop a selection that no
    /// longer resolves, mark the session dirty, record a checkpoint.
    fn after_mutation(&mut self) {
        if let Some(id) = self.selected {
            if !self.dialog.contains(id) {
                self.selected = None;
            }
        }
        self.dirty = true;
        self.checkpoint();
    }
}
