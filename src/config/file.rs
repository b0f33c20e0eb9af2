//! TOML configuration file loading
//!
//! Supports `~/.config/voxkb/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct VoxkbConfigFile {
    /// Deployment locale (e.g. "hu-HU")
    #[serde(default)]
    pub locale: Option<String>,

    /// Knowledge base path or URL
    #[serde(default)]
    pub knowledge: Option<String>,

    /// Completion endpoint configuration
    #[serde(default)]
    pub completion: CompletionFileConfig,

    /// Credential storage configuration
    #[serde(default)]
    pub credential: CredentialFileConfig,

    /// Speech output configuration
    #[serde(default)]
    pub speech: SpeechFileConfig,
}

/// Completion endpoint configuration
#[derive(Debug, Default, Deserialize)]
pub struct CompletionFileConfig {
    /// Chat-completions URL
    pub endpoint: Option<String>,

    /// Model identifier (e.g. "gpt-4o-mini")
    pub model: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Credential storage configuration
#[derive(Debug, Default, Deserialize)]
pub struct CredentialFileConfig {
    /// Path of the token file
    pub file: Option<String>,
}

/// Speech output configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// Speaking rate multiplier
    pub rate: Option<f32>,

    /// Voice pitch
    pub pitch: Option<f32>,
}

/// Load the TOML config file from the standard path
///
/// A missing file is the normal case and yields the defaults. An unreadable
/// or invalid file is logged and also yields the defaults.
pub fn load_config_file() -> VoxkbConfigFile {
    let Some(path) = config_file_path() else {
        return VoxkbConfigFile::default();
    };

    read_config_file(&path)
        .inspect(|found| {
            if found.is_some() {
                tracing::info!(path = %path.display(), "loaded config file");
            }
        })
        .unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
            None
        })
        .unwrap_or_default()
}

/// Read and parse a config file, `None` if it does not exist
///
/// # Errors
///
/// Returns error if the file exists but cannot be read or parsed
pub fn read_config_file(path: &Path) -> Result<Option<VoxkbConfigFile>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    toml::from_str(&content)
        .map(Some)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}

/// Return the config file path: `~/.config/voxkb/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("voxkb").join("config.toml"))
}
