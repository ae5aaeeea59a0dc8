//! Dialog file loading functionality.
//!
//! This module provides functions to load dialog documents from files or
//! stdin, parsing them into `Dialog` structures with their derived state
//! (link registry, id counters, pointer indices) restored and a consistency
//! sweep logged.

use crate::dialog::graph::Dialog;
use crate::dialog::validate::validate;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Loads and parses a dialog file from the filesystem.
///
/// This function reads a file from disk and parses its contents as dialog
/// JSON, returning a `Dialog` ready for editing. Files ending in `.gz` are
/// transparently decompressed.
///
/// # Arguments
///
/// * `path` - The path to the dialog file to load
///
/// # Returns
///
/// Returns a `Result` containing:
/// - `Ok(Dialog)` if the file was successfully loaded and parsed
/// - `Err(anyhow::Error)` if:
///   - The file could not be read (doesn't exist, permission denied, etc.)
///   - The file contents are not valid dialog JSON
///
/// # Examples
///
/// ```no_run
/// use dlgquill::file::loader::load_dialog_file;
///
/// let dialog = load_dialog_file("guard.dlg.json").unwrap();
/// // dialog is now ready for editing
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - The file path does not exist
/// - The file cannot be read (permissions, etc.)
/// - The file contents are not valid dialog JSON
pub fn load_dialog_file<P: AsRef<Path>>(path: P) -> Result<Dialog> {
    let path_ref = path.as_ref();

    // Check if file is gzipped
    let is_gzipped = path_ref
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    // Read content (decompress if needed)
    let content = if is_gzipped {
        read_gzipped_file(path_ref)?
    } else {
        fs::read_to_string(path_ref).context("Failed to read file")?
    };

    parse_dialog(&content)
}

/// Parses dialog JSON into a `Dialog` with its derived state restored.
///
/// After deserialization the link registry is rebuilt, the id counters are
/// advanced past every loaded id, and all pointer indices are recalculated,
/// so stale indices in the file heal on load. Any consistency issue that
/// survives restoration (dangling pointers, unplaced or unreachable lines)
/// is logged as a warning rather than rejecting the file; designers fix
/// those in the editor.
pub fn parse_dialog(content: &str) -> Result<Dialog> {
    let mut dialog: Dialog =
        serde_json::from_str(content).context("Failed to parse dialog JSON")?;
    dialog.restore_internal_state();
    for issue in validate(&dialog) {
        tracing::warn!("loaded dialog has a consistency issue: {}", issue);
    }
    Ok(dialog)
}

/// Loads and parses a dialog from standard input.
///
/// This function reads from stdin until EOF and parses the contents as
/// dialog JSON. Gzipped input is detected by its magic bytes and
/// decompressed first, so piping a `.gz` file works without flags.
///
/// # Examples
///
/// ```no_run
/// use dlgquill::file::loader::load_dialog_from_stdin;
///
/// // Usage: zcat guard.dlg.json.gz | dlgquill
/// let dialog = load_dialog_from_stdin().unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - Reading from stdin fails
/// - The input contents are not valid dialog JSON
pub fn load_dialog_from_stdin() -> Result<Dialog> {
    use std::io::{self, Read};

    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;

    // Check for gzip magic bytes (0x1f 0x8b)
    let content = if buffer.starts_with(&[0x1f, 0x8b]) {
        decompress_gzip_bytes(&buffer)?
    } else {
        String::from_utf8(buffer).context("Invalid UTF-8 in stdin")?
    };

    parse_dialog(&content)
}

/// Reads and decompresses a gzipped file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened
/// - The file is not valid gzip format (corrupted)
/// - The decompressed content is not valid UTF-8
fn read_gzipped_file<P: AsRef<Path>>(path: P) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let file = fs::File::open(path).context("Failed to open gzipped file")?;
    let mut decoder = GzDecoder::new(file);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped file - file may be corrupted")?;
    Ok(content)
}

/// Decompresses gzip-encoded bytes to a UTF-8 string.
///
/// # Errors
///
/// Returns an error if:
/// - The bytes are not valid gzip format
/// - The decompressed content is not valid UTF-8
fn decompress_gzip_bytes(bytes: &[u8]) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(bytes);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped stdin")?;
    Ok(content)
}
