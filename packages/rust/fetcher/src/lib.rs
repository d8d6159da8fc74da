//! Transcript download: list-page scanning, caching, and polite retrieval.
//!
//! This crate provides:
//! - [`listing`] — list-page entry extraction
//! - [`engine`] — the retrying, cache-aware download engine

pub mod engine;
pub mod listing;

pub use engine::{FetchProgress, FetchSummary, Fetcher, SilentFetchProgress};
pub use listing::{ListItem, episode_number, extract_items};
