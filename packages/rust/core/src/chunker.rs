//! Size-bounded bundle assembly.
//!
//! Episodes arrive in ascending episode-number order and accumulate into a
//! buffer; when admitting the next episode would exceed the word or byte
//! limit (or cross a calendar year, when year-splitting is on) the buffer is
//! flushed as one bundle and the incoming episode seeds a new one.

use castpack_shared::{ChunkConfig, Result};

use crate::episode::RenderedEpisode;

/// One finalized bundle: the concatenation of a buffer's episode blocks.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Rendered episode blocks, in episode order.
    pub blocks: Vec<String>,
    /// First episode number in the bundle.
    pub first_episode: u32,
    /// Last episode number in the bundle.
    pub last_episode: u32,
    /// Year of the bundle's first episode, when known.
    pub year: Option<i32>,
    /// Total body words across the bundle.
    pub words: usize,
    /// Total rendered bytes across the bundle.
    pub bytes: usize,
}

impl Chunk {
    /// Deterministic artifact name stem, without extension or directory.
    ///
    /// The year-tagged form is used only when year-splitting is on and the
    /// bundle's year is known.
    pub fn artifact_stem(&self, prefix: &str, by_year: bool) -> String {
        match (by_year, self.year) {
            (true, Some(year)) => format!(
                "{prefix}_Transcripts_{year}_{}_{}",
                self.first_episode, self.last_episode
            ),
            _ => format!(
                "{prefix}_Transcripts_{}-{}",
                self.first_episode, self.last_episode
            ),
        }
    }

    /// The bundle's full contents.
    pub fn contents(&self) -> String {
        self.blocks.concat()
    }
}

/// Mutable accumulator for one show prefix.
#[derive(Debug, Default)]
struct Buffer {
    blocks: Vec<String>,
    words: usize,
    bytes: usize,
    /// First and last episode numbers; `None` while the buffer is empty.
    bounds: Option<(u32, u32)>,
    /// Year of the buffer's first episode.
    year: Option<i32>,
}

/// Packs a stream of rendered episodes into size-bounded chunks.
///
/// The split decision is evaluated *before* an episode is admitted, and
/// never fires on an empty buffer: a single oversized episode still becomes
/// its own one-episode bundle rather than being rejected.
#[derive(Debug)]
pub struct ChunkAssembler {
    config: ChunkConfig,
    buffer: Buffer,
}

impl ChunkAssembler {
    /// Create an assembler, rejecting pathological thresholds up front.
    pub fn new(config: ChunkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            buffer: Buffer::default(),
        })
    }

    /// Admit the next episode. Returns the finalized previous bundle when
    /// admitting it forced a split.
    pub fn push(&mut self, episode: RenderedEpisode) -> Option<Chunk> {
        let words = episode.words;
        let bytes = episode.bytes();

        let flushed = if self.buffer.bounds.is_none() {
            None
        } else if self.buffer.words + words > self.config.max_words
            || self.buffer.bytes + bytes > self.config.max_bytes
            || (self.config.by_year && episode.year != self.buffer.year)
        {
            self.take_chunk()
        } else {
            None
        };

        match &mut self.buffer.bounds {
            None => {
                self.buffer.bounds = Some((episode.number, episode.number));
                self.buffer.year = episode.year;
            }
            Some((_, last)) => *last = episode.number,
        }
        self.buffer.blocks.push(episode.text);
        self.buffer.words += words;
        self.buffer.bytes += bytes;

        flushed
    }

    /// Flush whatever remains at end of stream.
    pub fn finish(mut self) -> Option<Chunk> {
        self.take_chunk()
    }

    fn take_chunk(&mut self) -> Option<Chunk> {
        let buffer = std::mem::take(&mut self.buffer);
        let (first_episode, last_episode) = buffer.bounds?;

        Some(Chunk {
            blocks: buffer.blocks,
            first_episode,
            last_episode,
            year: buffer.year,
            words: buffer.words,
            bytes: buffer.bytes,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(number: u32, year: Option<i32>, body: &str) -> RenderedEpisode {
        RenderedEpisode {
            number,
            year,
            words: body.split_whitespace().count(),
            text: format!("# Episode: {number}\n\n{body}\n\n---\n\n"),
        }
    }

    fn config(max_words: usize, max_bytes: usize, by_year: bool) -> ChunkConfig {
        ChunkConfig {
            max_words,
            max_bytes,
            by_year,
        }
    }

    /// Feed all episodes through and collect every finalized chunk.
    fn pack(cfg: ChunkConfig, episodes: Vec<RenderedEpisode>) -> Vec<Chunk> {
        let mut assembler = ChunkAssembler::new(cfg).unwrap();
        let mut chunks: Vec<Chunk> = episodes
            .into_iter()
            .filter_map(|ep| assembler.push(ep))
            .collect();
        chunks.extend(assembler.finish());
        chunks
    }

    #[test]
    fn invalid_thresholds_rejected_at_construction() {
        assert!(ChunkAssembler::new(config(0, 100, false)).is_err());
        assert!(ChunkAssembler::new(config(100, 0, false)).is_err());
        assert!(ChunkAssembler::new(config(100, 100, false)).is_ok());
    }

    #[test]
    fn everything_fits_in_one_chunk() {
        let chunks = pack(
            config(1000, 100_000, false),
            vec![
                episode(1, Some(2024), "one two"),
                episode(2, Some(2024), "three four"),
            ],
        );
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].first_episode, 1);
        assert_eq!(chunks[0].last_episode, 2);
        assert_eq!(chunks[0].words, 4);
    }

    #[test]
    fn word_limit_forces_split() {
        let chunks = pack(
            config(3, 100_000, false),
            vec![
                episode(1, None, "a b"),
                episode(2, None, "c d"),
                episode(3, None, "e"),
            ],
        );
        // 2 + 2 > 3 splits after ep 1; 2 + 1 <= 3 keeps eps 2-3 together.
        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].first_episode, chunks[0].last_episode), (1, 1));
        assert_eq!((chunks[1].first_episode, chunks[1].last_episode), (2, 3));
    }

    #[test]
    fn byte_limit_forces_split() {
        let big = "x".repeat(200);
        let chunks = pack(
            config(100_000, 300, false),
            vec![
                episode(10, None, &big),
                episode(11, None, &big),
            ],
        );
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn oversized_single_episode_still_becomes_a_chunk() {
        let huge = "word ".repeat(50);
        let chunks = pack(config(10, 100_000, false), vec![episode(42, None, &huge)]);
        assert_eq!(chunks.len(), 1);
        assert_eq!((chunks[0].first_episode, chunks[0].last_episode), (42, 42));
    }

    #[test]
    fn no_episode_dropped_or_duplicated() {
        let episodes: Vec<RenderedEpisode> = (1..=20)
            .map(|n| episode(n, Some(2020 + (n as i32 % 3)), "some body text here"))
            .collect();
        let chunks = pack(config(12, 100_000, false), episodes);

        let mut seen: Vec<u32> = Vec::new();
        for chunk in &chunks {
            for block in &chunk.blocks {
                let number: u32 = block
                    .lines()
                    .next()
                    .and_then(|l| l.strip_prefix("# Episode: "))
                    .and_then(|n| n.parse().ok())
                    .expect("block heading");
                seen.push(number);
            }
        }
        assert_eq!(seen, (1..=20).collect::<Vec<u32>>());
    }

    #[test]
    fn year_change_forces_split_regardless_of_headroom() {
        let chunks = pack(
            config(100_000, 100_000, true),
            vec![
                episode(1, Some(2024), "alpha"),
                episode(2, Some(2024), "beta"),
                episode(3, Some(2025), "gamma"),
            ],
        );
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].year, Some(2024));
        assert_eq!((chunks[0].first_episode, chunks[0].last_episode), (1, 2));
        assert_eq!(chunks[1].year, Some(2025));
    }

    #[test]
    fn year_split_disabled_ignores_year_changes() {
        let chunks = pack(
            config(100_000, 100_000, false),
            vec![
                episode(1, Some(2024), "alpha"),
                episode(2, Some(2025), "beta"),
            ],
        );
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn buffer_year_is_first_episodes_year() {
        // An unknown-year episode joining a 2024 buffer splits; the next
        // known-year episode splits again off the unknown-year buffer.
        let chunks = pack(
            config(100_000, 100_000, true),
            vec![
                episode(1, Some(2024), "alpha"),
                episode(2, None, "beta"),
                episode(3, Some(2024), "gamma"),
            ],
        );
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].year, None);
    }

    #[test]
    fn artifact_stem_formats() {
        let chunk = Chunk {
            blocks: vec![],
            first_episode: 100,
            last_episode: 150,
            year: Some(2024),
            words: 0,
            bytes: 0,
        };
        assert_eq!(chunk.artifact_stem("IM", false), "IM_Transcripts_100-150");
        assert_eq!(
            chunk.artifact_stem("IM", true),
            "IM_Transcripts_2024_100_150"
        );

        let unknown_year = Chunk { year: None, ..chunk };
        assert_eq!(
            unknown_year.artifact_stem("IM", true),
            "IM_Transcripts_100-150"
        );
    }

    #[test]
    fn contents_concatenates_blocks_in_order() {
        let chunks = pack(
            config(100, 100_000, false),
            vec![episode(1, None, "first"), episode(2, None, "second")],
        );
        let contents = chunks[0].contents();
        let first = contents.find("first").unwrap();
        let second = contents.find("second").unwrap();
        assert!(first < second);
    }
}
