use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use amsterdam_events::feed::{self, FeedMeta, OUTPUT_JSON, OUTPUT_XML};
use amsterdam_events::scraping::base::Fetcher;
use amsterdam_events::translate::NoopTranslator;

/// Scrape Amsterdam event listings and publish them as an RSS feed.
#[derive(Parser, Debug)]
#[command(name = "amsterdam-events", version, about)]
struct Args {
    /// Maximum number of candidate pages to process per source
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("run failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let http = Fetcher::new()?;
    let events = amsterdam_events::collect_events(&http, &NoopTranslator, args.limit)?;

    if !feed::publish(&events, &FeedMeta::default(), Path::new("."))? {
        println!("No events found. Check the scrapers.");
        return Ok(());
    }

    println!("Generated feed with {} events", events.len());
    println!("Files created: {OUTPUT_XML}, {OUTPUT_JSON}");
    Ok(())
}
