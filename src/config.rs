//! Configuration resolution
//!
//! The data directory resolves CLI argument → environment variable →
//! TOML config file → platform default. The Gemini API key has one more
//! tier in front: the key stored in `user_settings` is consulted per
//! request, so the value resolved here (ENV → TOML) is only the
//! fallback when the database holds none.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable holding the Gemini API key
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Optional TOML config file contents
///
/// Lives at `~/.config/inner-compass/config.toml` (or the platform
/// equivalent), with `/etc/inner-compass/config.toml` as the system
/// fallback on Linux.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub gemini_api_key: Option<String>,
}

impl FileConfig {
    /// Load the config file if one exists, tolerating absence and
    /// malformed content
    pub fn load() -> Self {
        match config_file_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    info!("Loaded config file: {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Ignoring malformed config file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Could not read config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = dirs::config_dir().map(|d| d.join("inner-compass").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }
    #[cfg(target_os = "linux")]
    {
        let system = PathBuf::from("/etc/inner-compass/config.toml");
        if system.exists() {
            return Some(system);
        }
    }
    None
}

/// Tunables for the analysis pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// How many prior entries the prompt context includes
    pub context_window: usize,
    /// Per-entry snippet length in the context block, in chars
    pub snippet_chars: usize,
    /// Key used when `user_settings` holds none (ENV → TOML)
    pub api_key_fallback: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            context_window: 5,
            snippet_chars: 80,
            api_key_fallback: None,
        }
    }
}

/// Resolve the directory holding the SQLite database
///
/// Priority: CLI/ENV argument → TOML config → platform data directory.
pub fn resolve_data_dir(cli_arg: Option<PathBuf>, file: &FileConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path;
    }
    if let Some(path) = &file.data_dir {
        return path.clone();
    }
    default_data_dir()
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("inner-compass"))
        .unwrap_or_else(|| PathBuf::from("./inner_compass_data"))
}

/// Database file inside the data directory
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join("inner_compass.db")
}

/// Resolve the startup-time API key fallback (ENV → TOML)
pub fn resolve_api_key_fallback(file: &FileConfig) -> Option<String> {
    let env_key = std::env::var(GEMINI_API_KEY_ENV)
        .ok()
        .filter(|k| is_valid_key(k));
    let toml_key = file.gemini_api_key.clone().filter(|k| is_valid_key(k));
    pick_api_key(env_key, toml_key)
}

fn pick_api_key(env_key: Option<String>, toml_key: Option<String>) -> Option<String> {
    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "Gemini API key found in both environment and TOML config. \
             Using environment (highest priority)."
        );
    }
    match (env_key, toml_key) {
        (Some(key), _) => {
            info!("Gemini API key fallback loaded from environment variable");
            Some(key)
        }
        (None, Some(key)) => {
            info!("Gemini API key fallback loaded from TOML config");
            Some(key)
        }
        (None, None) => None,
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
