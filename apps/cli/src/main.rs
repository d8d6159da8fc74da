//! castpack CLI — transcript archiving and bundling tool.
//!
//! Downloads show transcripts and packs them into size-bounded Markdown
//! bundles ready for downstream ingestion.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
