//! End-to-end processing for one show prefix: data files → normalized
//! episodes → size-bounded Markdown bundles on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument, warn};

use castpack_shared::{CastpackError, ChunkConfig, Result};

use crate::chunker::{Chunk, ChunkAssembler};
use crate::episode::parse_episode;

/// Options for a processing run, shared across prefixes.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Directory holding `{PREFIX}_{N}.html` transcript files.
    pub data_dir: PathBuf,
    /// Directory receiving the assembled bundles.
    pub output_dir: PathBuf,
    /// Chunking policy.
    pub chunk: ChunkConfig,
}

/// End-of-run accounting for one prefix.
#[derive(Debug, Clone, Default)]
pub struct PrefixSummary {
    pub prefix: String,
    /// Episodes normalized and packed.
    pub episodes_processed: usize,
    /// Episodes skipped because their source file could not be read.
    pub episodes_skipped: usize,
    /// Bundles successfully written.
    pub artifacts_written: usize,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called after each episode is normalized and admitted.
    fn episode_processed(&self, prefix: &str, number: u32, current: usize, total: usize);
    /// Called after each bundle is written.
    fn artifact_written(&self, name: &str, words: usize, bytes: usize);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn episode_processed(&self, _prefix: &str, _number: u32, _current: usize, _total: usize) {}
    fn artifact_written(&self, _name: &str, _words: usize, _bytes: usize) {}
}

static EPISODE_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z0-9]+)_(\d+)\.html$").expect("valid regex"));

/// Scan the data directory for every show prefix with downloaded transcripts.
pub fn discover_prefixes(data_dir: &Path) -> Result<Vec<String>> {
    let mut prefixes: Vec<String> = Vec::new();

    for entry in fs::read_dir(data_dir).map_err(|e| CastpackError::io(data_dir, e))? {
        let entry = entry.map_err(|e| CastpackError::io(data_dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };

        if let Some(caps) = EPISODE_FILE_RE.captures(name) {
            prefixes.push(caps[1].to_string());
        }
    }

    prefixes.sort_unstable();
    prefixes.dedup();
    Ok(prefixes)
}

/// Process every transcript for one prefix, in episode-number order, and
/// write the resulting bundles.
///
/// Per-item failures do not abort the run: an unreadable transcript is
/// skipped and counted, an unwritable bundle is reported and processing
/// continues with the next one.
#[instrument(skip_all, fields(prefix = %prefix))]
pub fn process_prefix(
    prefix: &str,
    options: &ProcessOptions,
    progress: &dyn ProgressReporter,
) -> Result<PrefixSummary> {
    let mut summary = PrefixSummary {
        prefix: prefix.to_string(),
        ..PrefixSummary::default()
    };

    let files = episode_files(&options.data_dir, prefix)?;
    if files.is_empty() {
        info!("no transcript files found");
        return Ok(summary);
    }

    info!(
        count = files.len(),
        by_year = options.chunk.by_year,
        "processing transcripts"
    );

    let mut assembler = ChunkAssembler::new(options.chunk.clone())?;
    let total = files.len();

    for (i, (number, path)) in files.iter().enumerate() {
        let html = match fs::read_to_string(path) {
            Ok(html) => html,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable transcript, skipping");
                summary.episodes_skipped += 1;
                continue;
            }
        };

        let episode = parse_episode(&html, *number);
        let rendered = episode.render();
        debug!(number, words = rendered.words, bytes = rendered.bytes(), "episode normalized");

        if let Some(chunk) = assembler.push(rendered) {
            write_chunk(&chunk, prefix, options, &mut summary, progress);
        }

        summary.episodes_processed += 1;
        progress.episode_processed(prefix, *number, i + 1, total);
    }

    if let Some(chunk) = assembler.finish() {
        write_chunk(&chunk, prefix, options, &mut summary, progress);
    }

    info!(
        processed = summary.episodes_processed,
        skipped = summary.episodes_skipped,
        artifacts = summary.artifacts_written,
        "prefix complete"
    );

    Ok(summary)
}

/// Enumerate `{prefix}_{N}.html` files, sorted by episode number.
fn episode_files(data_dir: &Path, prefix: &str) -> Result<Vec<(u32, PathBuf)>> {
    let file_re = Regex::new(&format!(r"^{}_(\d+)\.html$", regex::escape(prefix)))
        .expect("valid regex");

    let mut files: Vec<(u32, PathBuf)> = Vec::new();
    for entry in fs::read_dir(data_dir).map_err(|e| CastpackError::io(data_dir, e))? {
        let entry = entry.map_err(|e| CastpackError::io(data_dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };

        if let Some(caps) = file_re.captures(name) {
            let number: u32 = caps[1].parse().unwrap_or(0);
            files.push((number, entry.path()));
        }
    }

    files.sort_by_key(|(number, _)| *number);
    Ok(files)
}

fn write_chunk(
    chunk: &Chunk,
    prefix: &str,
    options: &ProcessOptions,
    summary: &mut PrefixSummary,
    progress: &dyn ProgressReporter,
) {
    let name = format!("{}.md", chunk.artifact_stem(prefix, options.chunk.by_year));

    match write_artifact(&options.output_dir, &name, &chunk.contents()) {
        Ok(()) => {
            info!(name = %name, words = chunk.words, bytes = chunk.bytes, "wrote bundle");
            progress.artifact_written(&name, chunk.words, chunk.bytes);
            summary.artifacts_written += 1;
        }
        Err(e) => {
            warn!(name = %name, error = %e, "failed to write bundle, continuing");
        }
    }
}

/// Write a bundle atomically (temp file, then rename).
fn write_artifact(dir: &Path, name: &str, contents: &str) -> Result<()> {
    let target = dir.join(name);
    let temp = dir.join(format!(".{name}.tmp"));

    fs::write(&temp, contents).map_err(|e| CastpackError::io(&temp, e))?;
    fs::rename(&temp, &target).map_err(|e| CastpackError::io(&target, e))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
