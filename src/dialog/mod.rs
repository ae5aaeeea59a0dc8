//! Dialog graph model and editing operations.
//!
//! This module provides the in-memory representation of one conversation
//! and every structural operation the editor performs on it. Nodes live in
//! per-type pools, edges are pointers owned by their parents, and the
//! higher-level workflows (links, deletes, paste) keep the derived state
//! consistent as they go.
//!
//! # Modules
//!
//! - `node`: conversation lines and their stable ids
//! - `pointer`: edges, parent positions, and cached target indices
//! - `graph`: the `Dialog` container and structural primitives
//! - `links`: reverse lookup from nodes to referencing pointers
//! - `reindex`: recomputation of cached pointer indices
//! - `clone`: deep subtree duplication with fresh identities
//! - `paste`: the paste state machine for cut and copy slots
//! - `ops`: editor-facing workflows (links, deletes, reordering, pruning)
//! - `validate`: consistency sweep over a whole dialog
//!
//! # Example
//!
//! ```
//! use dlgquill::dialog::graph::Dialog;
//! use dlgquill::dialog::node::{DialogNode, NodeType};
//!
//! let mut dialog = Dialog::new();
//! let hello = dialog.add_node(DialogNode::new(NodeType::Entry, "Hello there."));
//! dialog.add_start(hello).unwrap();
//! assert_eq!(dialog.starts().len(), 1);
//! ```

pub mod clone;
pub mod graph;
pub mod links;
pub mod node;
pub mod ops;
pub mod paste;
pub mod pointer;
pub mod reindex;
pub mod validate;
