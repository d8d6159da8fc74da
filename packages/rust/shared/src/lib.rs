//! Shared types, error model, and configuration for castpack.
//!
//! This crate is the foundation depended on by all other castpack crates.
//! It provides:
//! - [`CastpackError`] — the unified error type
//! - Domain types ([`EpisodeMetadata`])
//! - The show registry ([`shows`])
//! - Configuration ([`AppConfig`], [`ChunkConfig`], [`FetchOptions`], config loading)

pub mod config;
pub mod error;
pub mod shows;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ChunkConfig, DefaultsConfig, FetchOptions, FetchSection, LimitsConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{CastpackError, Result};
pub use types::EpisodeMetadata;
