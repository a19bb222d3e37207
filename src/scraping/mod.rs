pub mod amsterdam_nl;
pub mod base;
pub mod eventbrite_html;
pub mod iamsterdam;
pub mod timeout_html;

use anyhow::Error;

use self::base::Fetcher;
use crate::models::Event;

/// Secondary sources only run when the primary agenda yielded fewer events
/// than this.
const SECONDARY_THRESHOLD: usize = 10;

pub trait SourceScraper: Send + Sync {
    fn source_id(&self) -> &'static str;
    /// Upper bound on candidate pages when the CLI does not set one.
    fn default_limit(&self) -> usize;
    fn fetch(&self, http: &Fetcher, limit: usize) -> anyhow::Result<Vec<Event>>;
}

fn primary_scraper() -> Box<dyn SourceScraper> {
    Box::new(iamsterdam::IAmsterdam)
}

fn secondary_scrapers() -> Vec<Box<dyn SourceScraper>> {
    vec![
        Box::new(eventbrite_html::Eventbrite),
        Box::new(timeout_html::TimeOutAmsterdam),
        Box::new(amsterdam_nl::AmsterdamNl),
    ]
}

/// Runs the primary source, then the secondary ones while the haul is thin.
/// A failing source is recorded and skipped; the run only errors when every
/// source failed and nothing was collected.
pub fn run_all(http: &Fetcher, limit: Option<usize>) -> anyhow::Result<Vec<Event>> {
    let mut events = Vec::new();
    let mut errors: Vec<(String, Error)> = Vec::new();

    run_scraper(primary_scraper(), http, limit, &mut events, &mut errors);

    if events.len() < SECONDARY_THRESHOLD {
        tracing::info!(
            collected = events.len(),
            "primary source came up short, adding secondary sources"
        );
        for scraper in secondary_scrapers() {
            run_scraper(scraper, http, limit, &mut events, &mut errors);
        }
    }

    if events.is_empty() && !errors.is_empty() {
        let joined = errors
            .into_iter()
            .map(|(id, err)| format!("{id}: {err}"))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(anyhow::anyhow!("scrapers failed: {joined}"));
    }

    Ok(events)
}

fn run_scraper(
    scraper: Box<dyn SourceScraper>,
    http: &Fetcher,
    limit: Option<usize>,
    events: &mut Vec<Event>,
    errors: &mut Vec<(String, Error)>,
) {
    let source_id = scraper.source_id().to_string();
    let effective_limit = limit.unwrap_or_else(|| scraper.default_limit());
    tracing::info!(source = %source_id, limit = effective_limit, "scraping source");

    match scraper.fetch(http, effective_limit) {
        Ok(mut scraped) => {
            tracing::info!(source = %source_id, count = scraped.len(), "source finished");
            events.append(&mut scraped);
        }
        Err(err) => {
            tracing::warn!(source = %source_id, "source failed: {err:#}");
            errors.push((source_id, err));
        }
    }
}
