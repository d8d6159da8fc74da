//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use castpack_core::pipeline::{self, PrefixSummary, ProcessOptions, ProgressReporter};
use castpack_fetcher::{FetchProgress, Fetcher};
use castpack_shared::{
    AppConfig, ChunkConfig, FetchOptions, init_config, load_config, shows,
};

/// Shows processed when no selection is given.
const DEFAULT_SHOWS: &[&str] = &["IM", "TWIG"];

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// castpack — archive show transcripts and pack them into Markdown bundles.
#[derive(Parser)]
#[command(
    name = "castpack",
    version,
    about = "Download show transcripts and pack them into size-bounded Markdown bundles.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Download transcripts for the selected shows.
    Fetch {
        /// Show codes or names to download (e.g. IM TWIG "security now").
        shows: Vec<String>,

        /// Download transcripts for every known show.
        #[arg(long)]
        all: bool,

        /// Number of list pages to scan.
        #[arg(long)]
        pages: Option<u32>,

        /// Re-download cached list pages.
        #[arg(long)]
        refresh_list: bool,

        /// Directory for downloaded transcripts (defaults to config).
        #[arg(long)]
        data_dir: Option<String>,
    },

    /// Pack downloaded transcripts into Markdown bundles.
    Process {
        /// Prefixes to process (e.g. IM TWIG).
        prefixes: Vec<String>,

        /// Process every prefix found in the data directory.
        #[arg(long)]
        all: bool,

        /// Also start a new bundle whenever the calendar year changes.
        #[arg(long)]
        by_year: bool,

        /// Maximum words per bundle (defaults to config).
        #[arg(long)]
        max_words: Option<usize>,

        /// Maximum bytes per bundle (defaults to config).
        #[arg(long)]
        max_bytes: Option<usize>,

        /// Directory holding downloaded transcripts (defaults to config).
        #[arg(long)]
        data_dir: Option<String>,

        /// Directory receiving the bundles (defaults to config).
        #[arg(short, long)]
        out: Option<String>,
    },

    /// List the known shows and their prefixes.
    Shows,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "castpack=info",
        1 => "castpack=debug",
        _ => "castpack=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Fetch {
            shows,
            all,
            pages,
            refresh_list,
            data_dir,
        } => cmd_fetch(&shows, all, pages, refresh_list, data_dir.as_deref()).await,
        Command::Process {
            prefixes,
            all,
            by_year,
            max_words,
            max_bytes,
            data_dir,
            out,
        } => {
            cmd_process(
                &prefixes,
                all,
                by_year,
                max_words,
                max_bytes,
                data_dir.as_deref(),
                out.as_deref(),
            )
        }
        Command::Shows => cmd_shows(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// fetch
// ---------------------------------------------------------------------------

async fn cmd_fetch(
    show_args: &[String],
    all: bool,
    pages: Option<u32>,
    refresh_list: bool,
    data_dir: Option<&str>,
) -> Result<()> {
    let config = load_config()?;

    let targets = resolve_fetch_targets(show_args, all);
    if targets.is_empty() {
        return Err(eyre!(
            "no recognizable shows selected. Known codes: {}",
            shows::all_prefixes().join(", ")
        ));
    }

    let mut options = FetchOptions::from(&config);
    if let Some(pages) = pages {
        options.pages = pages;
    }
    options.refresh_list = refresh_list;

    let data_dir = PathBuf::from(data_dir.unwrap_or(&config.defaults.data_dir));

    info!(targets = %targets.join(", "), pages = options.pages, "fetching transcripts");

    let reporter = CliProgress::new();
    let fetcher = Fetcher::new(options)?;
    let summary = fetcher.run(&targets, &data_dir, &reporter).await?;
    reporter.finish();

    println!();
    println!("  Fetch complete");
    println!("  Pages scanned: {}", summary.pages_scanned);
    println!("  Downloaded:    {}", summary.downloaded);
    println!("  Skipped:       {}", summary.skipped);
    println!("  Errors:        {}", summary.errors.len());
    println!();

    Ok(())
}

/// Resolve the fetch selection to show prefixes, warning on unknown names.
fn resolve_fetch_targets(show_args: &[String], all: bool) -> Vec<String> {
    if all {
        return shows::all_prefixes().iter().map(|p| p.to_string()).collect();
    }

    let mut targets: Vec<String> = Vec::new();
    for arg in show_args {
        match shows::resolve_show(arg) {
            Some(prefix) => {
                if !targets.iter().any(|t| t.as_str() == prefix) {
                    targets.push(prefix.to_string());
                }
            }
            None => warn!(
                show = %arg,
                "unknown show; known codes: {}",
                shows::all_prefixes().join(", ")
            ),
        }
    }

    if targets.is_empty() && show_args.is_empty() {
        info!("no shows specified, defaulting to IM and TWIG");
        targets = DEFAULT_SHOWS.iter().map(|p| p.to_string()).collect();
    }

    targets
}

// ---------------------------------------------------------------------------
// process
// ---------------------------------------------------------------------------

fn cmd_process(
    prefix_args: &[String],
    all: bool,
    by_year: bool,
    max_words: Option<usize>,
    max_bytes: Option<usize>,
    data_dir: Option<&str>,
    out: Option<&str>,
) -> Result<()> {
    let config = load_config()?;

    let data_dir = PathBuf::from(data_dir.unwrap_or(&config.defaults.data_dir));
    if !data_dir.is_dir() {
        return Err(eyre!(
            "data directory '{}' not found — run `castpack fetch` first",
            data_dir.display()
        ));
    }
    let output_dir = PathBuf::from(out.unwrap_or(&config.defaults.output_dir));
    std::fs::create_dir_all(&output_dir)?;

    let mut chunk = ChunkConfig::from(&config);
    chunk.by_year = by_year;
    if let Some(max_words) = max_words {
        chunk.max_words = max_words;
    }
    if let Some(max_bytes) = max_bytes {
        chunk.max_bytes = max_bytes;
    }
    // Bad thresholds are refused before any transcript is read.
    chunk.validate()?;

    let prefixes: Vec<String> = if all {
        pipeline::discover_prefixes(&data_dir)?
    } else if prefix_args.is_empty() {
        info!("no prefixes specified, defaulting to IM and TWIG");
        DEFAULT_SHOWS.iter().map(|p| p.to_string()).collect()
    } else {
        let mut prefixes: Vec<String> =
            prefix_args.iter().map(|p| p.trim().to_uppercase()).collect();
        prefixes.sort_unstable();
        prefixes.dedup();
        prefixes
    };

    let options = ProcessOptions {
        data_dir,
        output_dir,
        chunk,
    };

    let reporter = CliProgress::new();
    let mut totals = PrefixSummary::default();

    for prefix in &prefixes {
        let summary = pipeline::process_prefix(prefix, &options, &reporter)?;
        totals.episodes_processed += summary.episodes_processed;
        totals.episodes_skipped += summary.episodes_skipped;
        totals.artifacts_written += summary.artifacts_written;
    }
    reporter.finish();

    println!();
    println!("  Processing complete");
    println!("  Prefixes:  {}", prefixes.join(", "));
    println!("  Episodes:  {}", totals.episodes_processed);
    println!("  Skipped:   {}", totals.episodes_skipped);
    println!("  Bundles:   {}", totals.artifacts_written);
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// shows / config
// ---------------------------------------------------------------------------

fn cmd_shows() -> Result<()> {
    println!();
    for (name, prefix) in shows::SHOW_MAP {
        println!("  {prefix:<6} {name}");
    }
    println!();
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Spinner-based progress for both fetching and processing.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn episode_processed(&self, prefix: &str, number: u32, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Processing {prefix} [{current}/{total}] episode {number}"));
    }

    fn artifact_written(&self, name: &str, words: usize, bytes: usize) {
        self.spinner
            .println(format!("  wrote {name} (words: {words}, bytes: {bytes})"));
    }
}

impl FetchProgress for CliProgress {
    fn page_scanned(&self, page: u32, items: usize) {
        self.spinner
            .set_message(format!("Scanning list page {page} ({items} entries)"));
    }

    fn transcript_downloaded(&self, prefix: &str, number: &str, title: &str) {
        self.spinner
            .println(format!("  downloaded {prefix} {number}: {title}"));
    }
}
