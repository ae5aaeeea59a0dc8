//! File I/O operations for dialog documents.
//!
//! This module provides functionality to load dialog files from disk or stdin,
//! and save dialogs back to files with atomic write operations and optional backups.

pub mod loader;
pub mod saver;
