//! Dialog file saving functionality.
//!
//! This module provides functions to save `Dialog` structures to files with
//! atomic write operations and optional backup creation.

use crate::config::Config;
use crate::dialog::graph::Dialog;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Creates a backup of a file by copying it with a .bak extension.
fn create_backup<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let mut backup_path = path.to_path_buf();
    let original_name = backup_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name"))?;
    backup_path.set_file_name(format!("{}.bak", original_name));
    fs::copy(path, backup_path).context("Failed to create backup")?;
    Ok(())
}

/// Saves a dialog to a file with optional backup creation.
///
/// This function serializes a `Dialog` to pretty-printed JSON and writes it
/// to the specified path. The write operation is atomic (writes to a temp
/// file then renames) to prevent data loss on crashes. Paths ending in
/// `.gz` are gzip-compressed. Optionally creates a backup of the original
/// file before writing.
///
/// Callers are expected to have run
/// [`recalculate_pointer_indices`](crate::dialog::reindex::recalculate_pointer_indices)
/// since the last structural edit; every editing workflow in
/// [`ops`](crate::dialog::ops) and [`paste`](crate::dialog::paste) does so,
/// which is what makes the serialized indices trustworthy.
///
/// # Arguments
///
/// * `path` - The path where the dialog file should be saved
/// * `dialog` - The dialog to serialize and save
/// * `config` - Configuration including the backup setting
///
/// # Examples
///
/// ```no_run
/// use dlgquill::config::Config;
/// use dlgquill::dialog::graph::Dialog;
/// use dlgquill::file::saver::save_dialog_file;
///
/// let dialog = Dialog::new();
/// let config = Config::default();
/// save_dialog_file("output.dlg.json", &dialog, &config).unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - Backup creation fails (if requested)
/// - Serialization produces invalid JSON
/// - Writing to the temp file fails
/// - Renaming the temp file to the target fails
pub fn save_dialog_file<P: AsRef<Path>>(path: P, dialog: &Dialog, config: &Config) -> Result<()> {
    let path = path.as_ref();

    // Determine if we should compress based on target filename
    let should_compress = path.to_string_lossy().ends_with(".gz");

    // Create backup if requested and file exists
    if config.create_backup && path.exists() {
        create_backup(path)?;
    }

    let mut json_str =
        serde_json::to_string_pretty(dialog).context("Failed to serialize dialog")?;
    json_str.push('\n');

    // Validate the serialized JSON before writing to disk
    // This catches serialization bugs before they corrupt user data
    serde_json::from_str::<serde_json::Value>(&json_str)
        .context("Generated invalid JSON - this is a bug in dlgquill's serialization")?;

    // Write atomically (compressed or uncompressed)
    write_file_atomic(path, json_str.as_bytes(), should_compress)?;

    Ok(())
}

/// Writes data to a file atomically, optionally compressing with gzip.
///
/// This function writes to a temporary file first, then atomically renames
/// it to the target path. This ensures the target file is never left in a
/// partially written state.
///
/// # Arguments
///
/// * `path` - Target file path
/// * `data` - Bytes to write
/// * `compress` - Whether to gzip-compress the data before writing
///
/// # Errors
///
/// Returns an error if:
/// - Creating the temp file fails
/// - Writing or compressing fails
/// - Renaming the temp file fails
fn write_file_atomic<P: AsRef<Path>>(path: P, data: &[u8], compress: bool) -> Result<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let path = path.as_ref();
    let temp_path = path.with_extension("tmp");

    if compress {
        // Write compressed
        let file = fs::File::create(&temp_path).context("Failed to create temp file")?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(data)
            .context("Failed to write compressed data")?;
        encoder.finish().context("Failed to finish compression")?;
    } else {
        // Write uncompressed
        fs::write(&temp_path, data).context("Failed to write temp file")?;
    }

    // Atomic rename
    fs::rename(&temp_path, path).context("Failed to rename temp file")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::node::{DialogNode, NodeType};
    use crate::file::loader::load_dialog_file;
    use tempfile::tempdir;

    fn small_dialog() -> Dialog {
        let mut dialog = Dialog::new();
        let entry = dialog.add_node(DialogNode::new(NodeType::Entry, "Saved line."));
        let reply = dialog.add_node(DialogNode::new(NodeType::Reply, "Saved answer."));
        dialog.add_start(entry).unwrap();
        dialog.add_child(entry, reply).unwrap();
        dialog
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.dlg.json");
        let dialog = small_dialog();

        save_dialog_file(&path, &dialog, &Config::default()).unwrap();
        let loaded = load_dialog_file(&path).unwrap();

        assert_eq!(loaded.entry_count(), dialog.entry_count());
        assert_eq!(loaded.reply_count(), dialog.reply_count());
        assert_eq!(loaded.starts().len(), 1);
        assert_eq!(loaded.entries()[0].text, "Saved line.");
    }

    #[test]
    fn test_save_compressed_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.dlg.json.gz");
        let dialog = small_dialog();

        save_dialog_file(&path, &dialog, &Config::default()).unwrap();

        // The file starts with the gzip magic bytes.
        let raw = fs::read(&path).unwrap();
        assert!(raw.starts_with(&[0x1f, 0x8b]));

        let loaded = load_dialog_file(&path).unwrap();
        assert_eq!(loaded.entry_count(), 1);
    }

    #[test]
    fn test_backup_created_when_configured() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.dlg.json");
        let dialog = small_dialog();

        let mut config = Config::default();
        config.create_backup = true;

        // First save: nothing to back up yet.
        save_dialog_file(&path, &dialog, &config).unwrap();
        assert!(!dir.path().join("out.dlg.json.bak").exists());

        // Second save backs up the first.
        save_dialog_file(&path, &dialog, &config).unwrap();
        assert!(dir.path().join("out.dlg.json.bak").exists());
    }

    #[test]
    fn test_no_backup_by_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.dlg.json");
        let dialog = small_dialog();

        save_dialog_file(&path, &dialog, &Config::default()).unwrap();
        save_dialog_file(&path, &dialog, &Config::default()).unwrap();
        assert!(!dir.path().join("out.dlg.json.bak").exists());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.dlg.json");
        save_dialog_file(&path, &small_dialog(), &Config::default()).unwrap();
        assert!(!dir.path().join("out.dlg.tmp").exists());
        assert!(!dir.path().join("out.tmp").exists());
    }
}
