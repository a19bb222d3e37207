pub mod dedup;
pub mod extract;
pub mod feed;
pub mod markdown;
pub mod models;
pub mod scraping;
pub mod translate;

use anyhow::Result;

use models::Event;
use scraping::base::Fetcher;
use translate::Translate;

/// One full collection pass: scrape the sources, run descriptions through the
/// optional translator, then drop duplicate titles. Serialization is left to
/// the caller so a zero-event run can decide not to write anything.
pub fn collect_events(
    http: &Fetcher,
    translator: &dyn Translate,
    limit: Option<usize>,
) -> Result<Vec<Event>> {
    let mut events = scraping::run_all(http, limit)?;

    for event in &mut events {
        if let Some(description) = event.description.take() {
            event.description = Some(translate::translate_or_original(translator, &description));
        }
    }

    let events = dedup::dedup_events(events);
    tracing::info!(count = events.len(), "collection pass finished");
    Ok(events)
}
