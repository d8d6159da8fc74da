//! Application configuration for castpack.
//!
//! User config lives at `~/.castpack/castpack.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CastpackError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "castpack.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".castpack";

// ---------------------------------------------------------------------------
// Config structs (matching castpack.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory layout defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Bundle size limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Fetch politeness and caching.
    #[serde(default)]
    pub fetch: FetchSection,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory holding downloaded transcripts.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Directory receiving assembled bundles.
    #[serde(default = "default_data_dir")]
    pub output_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    "data".into()
}

/// `[limits]` section.
///
/// The downstream ingestion target caps sources at 500k words and 200MB per
/// file; these defaults sit below both caps to leave headroom for overhead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum words per output bundle.
    #[serde(default = "default_max_words")]
    pub max_words: usize,

    /// Maximum bytes per output bundle.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_words: default_max_words(),
            max_bytes: default_max_bytes(),
        }
    }
}

fn default_max_words() -> usize {
    490_000
}
fn default_max_bytes() -> usize {
    190 * 1024 * 1024
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSection {
    /// Number of list pages to scan.
    #[serde(default = "default_pages")]
    pub pages: u32,

    /// Delay between successful requests, in milliseconds.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_ms: u64,

    /// Attempts per download before giving up.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Delay between retry attempts, in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// List pages beyond this index are served from the on-disk cache.
    #[serde(default = "default_cache_after_page")]
    pub cache_after_page: u32,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            pages: default_pages(),
            rate_limit_ms: default_rate_limit(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            cache_after_page: default_cache_after_page(),
        }
    }
}

fn default_pages() -> u32 {
    200
}
fn default_rate_limit() -> u64 {
    1000
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    2000
}
fn default_cache_after_page() -> u32 {
    5
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config file + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime chunking policy — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Maximum words per bundle.
    pub max_words: usize,
    /// Maximum bytes per bundle.
    pub max_bytes: usize,
    /// Start a new bundle whenever the calendar year changes.
    pub by_year: bool,
}

impl ChunkConfig {
    /// Reject thresholds that would produce pathological bundles.
    ///
    /// A zero limit would flush on every episode (or never admit one), so it
    /// is refused up front, before any episode is read.
    pub fn validate(&self) -> Result<()> {
        if self.max_words == 0 {
            return Err(CastpackError::config("max_words must be positive"));
        }
        if self.max_bytes == 0 {
            return Err(CastpackError::config("max_bytes must be positive"));
        }
        Ok(())
    }
}

impl From<&AppConfig> for ChunkConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_words: config.limits.max_words,
            max_bytes: config.limits.max_bytes,
            by_year: false,
        }
    }
}

/// Runtime fetch options — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Number of list pages to scan.
    pub pages: u32,
    /// Re-download list pages even when cached.
    pub refresh_list: bool,
    /// Delay between successful requests, in milliseconds.
    pub rate_limit_ms: u64,
    /// Attempts per download before giving up.
    pub retries: u32,
    /// Delay between retry attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// List pages beyond this index are served from the on-disk cache.
    pub cache_after_page: u32,
}

impl From<&AppConfig> for FetchOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            pages: config.fetch.pages,
            refresh_list: false,
            rate_limit_ms: config.fetch.rate_limit_ms,
            retries: config.fetch.retries,
            retry_delay_ms: config.fetch.retry_delay_ms,
            cache_after_page: config.fetch.cache_after_page,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.castpack/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CastpackError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.castpack/castpack.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CastpackError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| CastpackError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CastpackError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CastpackError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CastpackError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("max_words"));
        assert!(toml_str.contains("data_dir"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.limits.max_words, 490_000);
        assert_eq!(parsed.fetch.pages, 200);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[limits]
max_words = 1000
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.limits.max_words, 1000);
        assert_eq!(config.limits.max_bytes, 190 * 1024 * 1024);
        assert_eq!(config.defaults.data_dir, "data");
    }

    #[test]
    fn chunk_config_from_app_config() {
        let app = AppConfig::default();
        let chunk = ChunkConfig::from(&app);
        assert_eq!(chunk.max_words, 490_000);
        assert_eq!(chunk.max_bytes, 190 * 1024 * 1024);
        assert!(!chunk.by_year);
    }

    #[test]
    fn zero_thresholds_rejected() {
        let chunk = ChunkConfig {
            max_words: 0,
            max_bytes: 1024,
            by_year: false,
        };
        let err = chunk.validate().unwrap_err();
        assert!(err.to_string().contains("max_words"));

        let chunk = ChunkConfig {
            max_words: 100,
            max_bytes: 0,
            by_year: false,
        };
        assert!(chunk.validate().is_err());
    }
}
