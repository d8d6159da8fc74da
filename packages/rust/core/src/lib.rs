//! Core pipeline and domain logic for castpack.
//!
//! This crate ties together transcript parsing, markup cleanup, and bundle
//! assembly into the per-prefix processing workflow.

pub mod chunker;
pub mod episode;
pub mod pipeline;

pub use chunker::{Chunk, ChunkAssembler};
pub use episode::{NormalizedEpisode, RenderedEpisode, parse_episode};
pub use pipeline::{
    PrefixSummary, ProcessOptions, ProgressReporter, SilentProgress, discover_prefixes,
    process_prefix,
};
