//! Editor collaborators around the dialog graph.
//!
//! This module provides the stateful pieces an editor frontend drives: the
//! single-slot clipboard, the branching undo history, and the session that
//! ties a dialog together with both plus dirty/filename/selection tracking.
//!
//! # Modules
//!
//! - `clipboard`: Cut/copy slot with source-edge metadata
//! - `undo`: Branching undo tree over dialog snapshots
//! - `session`: EditorSession orchestration (dialog + clipboard + undo)
//!
//! # Example
//!
//! ```
//! use dlgquill::editor::clipboard::Clipboard;
//!
//! // A fresh clipboard holds nothing
//! let clipboard = Clipboard::new();
//! assert!(clipboard.is_empty());
//! ```

pub mod clipboard;
pub mod session;
pub mod undo;
