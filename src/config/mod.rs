//! Configuration system for dlgquill.
//!
//! This module provides the configuration structure for dlgquill with sensible defaults
//! and support for serialization/deserialization via serde. Configuration can be loaded
//! from TOML files and merged with command-line arguments.
//!
//! # Example
//!
//! ```
//! use dlgquill::config::Config;
//!
//! // Use default configuration
//! let config = Config::default();
//! assert_eq!(config.undo_limit, 50);
//! assert_eq!(config.pc_color, "#4FC3F7");
//!
//! // Create custom configuration
//! let custom = Config {
//!     undo_limit: 200,
//!     create_backup: true,
//!     ..Config::default()
//! };
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Maximum number of entries kept in the recent files list.
const RECENT_FILE_LIMIT: usize = 10;

/// Configuration for the dlgquill application.
///
/// This structure contains all configurable settings for dlgquill, including
/// display colors for dialog participants, editing behavior, and the recent
/// files list. All fields have sensible defaults via `Config::default()`.
///
/// # Fields
///
/// * `undo_limit` - Maximum number of undo checkpoints to keep (default: 50)
/// * `create_backup` - Create .bak files before saving (default: false)
/// * `sync_clipboard` - Mirror cut/copied nodes to the system clipboard (default: true)
/// * `pc_color` - Display color for player reply lines (default: "#4FC3F7")
/// * `owner_color` - Display color for NPC entry lines without a named speaker (default: "#FF8A65")
/// * `speaker_colors` - Per-speaker color overrides, keyed by speaker tag
/// * `recent_files` - Recently opened dialog files, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum number of undo checkpoints to keep
    #[serde(default = "default_undo_limit")]
    pub undo_limit: usize,

    /// Create .bak files before saving
    #[serde(default)]
    pub create_backup: bool,

    /// Mirror cut/copied nodes to the system clipboard
    #[serde(default = "default_sync_clipboard")]
    pub sync_clipboard: bool,

    /// Display color for player reply lines
    #[serde(default = "default_pc_color")]
    pub pc_color: String,

    /// Display color for NPC entry lines spoken by the dialog owner
    #[serde(default = "default_owner_color")]
    pub owner_color: String,

    /// Per-speaker color overrides, keyed by speaker tag
    #[serde(default)]
    pub speaker_colors: IndexMap<String, String>,

    /// Recently opened dialog files, newest first
    #[serde(default)]
    pub recent_files: Vec<String>,
}

/// Returns the default undo limit.
fn default_undo_limit() -> usize {
    50
}

/// Returns the default for syncing the system clipboard.
fn default_sync_clipboard() -> bool {
    true
}

/// Returns the default color for player reply lines.
fn default_pc_color() -> String {
    "#4FC3F7".to_string()
}

/// Returns the default color for NPC entry lines.
fn default_owner_color() -> String {
    "#FF8A65".to_string()
}

impl Default for Config {
    /// Creates a new configuration with default values.
    ///
    /// # Default Values
    ///
    /// * `undo_limit`: 50
    /// * `create_backup`: false
    /// * `sync_clipboard`: true
    /// * `pc_color`: "#4FC3F7"
    /// * `owner_color`: "#FF8A65"
    /// * `speaker_colors`: empty
    /// * `recent_files`: empty
    ///
    /// # Example
    ///
    /// ```
    /// use dlgquill::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.undo_limit, 50);
    /// assert!(!config.create_backup);
    /// assert!(config.sync_clipboard);
    /// ```
    fn default() -> Self {
        Self {
            undo_limit: default_undo_limit(),
            create_backup: false,
            sync_clipboard: default_sync_clipboard(),
            pc_color: default_pc_color(),
            owner_color: default_owner_color(),
            speaker_colors: IndexMap::new(),
            recent_files: Vec::new(),
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/dlgquill/config.toml` on all platforms.
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("dlgquill");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        let config_path = match Self::config_path() {
            Some(path) => path,
            None => return Self::default(),
        };

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|_| Self::default()),
            Err(_) => Self::default(),
        }
    }

    /// Saves configuration to the default config file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, toml_string)?;

        Ok(())
    }

    /// Returns the display color for the given speaker tag.
    ///
    /// Looks up the speaker in `speaker_colors` and falls back to
    /// `owner_color` when no override is configured. An empty speaker tag
    /// means the line is spoken by the dialog owner.
    pub fn speaker_color(&self, speaker: &str) -> &str {
        if speaker.is_empty() {
            return &self.owner_color;
        }
        self.speaker_colors
            .get(speaker)
            .map(String::as_str)
            .unwrap_or(&self.owner_color)
    }

    /// Records a file in the recent files list.
    ///
    /// Moves the path to the front if already present and truncates the
    /// list to the most recent entries.
    pub fn touch_recent(&mut self, path: &str) {
        self.recent_files.retain(|p| p != path);
        self.recent_files.insert(0, path.to_string());
        self.recent_files.truncate(RECENT_FILE_LIMIT);
    }
}
