//! DlgQuill - a structural editor core for branching RPG dialogue graphs.
//!
//! A dialog is two pools of spoken lines - NPC entries and player replies -
//! wired together by pointers. Placement pointers own their target and form
//! the conversation tree; link pointers reference a line that is placed
//! elsewhere, which is how dialogs share subtrees and form cycles. NPC and
//! player lines strictly alternate along every path.
//!
//! The crate keeps that graph consistent through every edit: pointer indices
//! are recalculated after each mutation, a link registry answers "who refers
//! to this node" in O(1), and cut/copy/paste moves or duplicates whole
//! subtrees without ever leaving a dangling reference behind.
//!
//! # Modules
//!
//! - `dialog`: The graph itself - nodes, pointers, registry, reindexing,
//!   cloning, paste, editing workflows, validation
//! - `editor`: Clipboard, branching undo, and the editing session
//! - `file`: Load and save dialog JSON (plain or gzipped), atomically
//! - `structure`: Flat nodes/links export for flowchart viewers
//! - `config`: Persisted editor settings
//!
//! # Example
//!
//! ```
//! use dlgquill::dialog::graph::Dialog;
//! use dlgquill::dialog::node::{DialogNode, NodeType};
//!
//! let mut dialog = Dialog::new();
//! let halt = dialog.add_node(DialogNode::new(NodeType::Entry, "Halt!"));
//! let sorry = dialog.add_node(DialogNode::new(NodeType::Reply, "Sorry, I'll move along."));
//!
//! dialog.add_start(halt).unwrap();
//! dialog.add_child(halt, sorry).unwrap();
//!
//! assert_eq!(dialog.entry_count(), 1);
//! assert_eq!(dialog.reply_count(), 1);
//! ```

pub mod config;
pub mod dialog;
pub mod editor;
pub mod file;
pub mod structure;
