use std::collections::HashSet;

use anyhow::Result;
use chrono::Utc;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::base::{self, Fetcher};
use super::SourceScraper;
use crate::models::Event;

const URL: &str = "https://www.eventbrite.com/d/netherlands--amsterdam/events/";
const SOURCE_ID: &str = "eventbrite";
const SOURCE_NAME: &str = "Eventbrite Amsterdam";
const DEFAULT_LIMIT: usize = 5;

static EVENT_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href*=\"/e/\"]").expect("eventbrite link selector"));

const SKIP_TERMS: [&str; 3] = ["sign up", "log in", "create"];

pub struct Eventbrite;

impl SourceScraper for Eventbrite {
    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }

    fn default_limit(&self) -> usize {
        DEFAULT_LIMIT
    }

    fn fetch(&self, http: &Fetcher, limit: usize) -> Result<Vec<Event>> {
        let html = http.fetch_html(URL)?;
        parse_listing(&html, limit)
    }
}

/// Eventbrite marks individual events with `/e/` links; everything else on
/// the search page is chrome.
pub(crate) fn parse_listing(html: &str, limit: usize) -> Result<Vec<Event>> {
    let document = Html::parse_document(html);
    let mut seen_links = HashSet::new();
    let mut events = Vec::new();

    for link in document.select(&EVENT_LINK_SELECTOR) {
        if events.len() >= limit {
            break;
        }

        let title = base::inner_text(link);
        if title.chars().count() <= 10 {
            continue;
        }
        let lower = title.to_lowercase();
        if SKIP_TERMS.iter().any(|term| lower.contains(term)) {
            continue;
        }

        let href = match link.value().attr("href") {
            Some(href) => href.to_string(),
            None => continue,
        };
        let full_link = match base::absolute_url(URL, Some(href)) {
            Some(url) => url,
            None => continue,
        };
        if !seen_links.insert(full_link.clone()) {
            continue;
        }

        let mut event = match Event::new(
            format!("Eventbrite: {title}"),
            &full_link,
            SOURCE_NAME,
            Utc::now(),
        ) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(%title, "skipping event link: {err:#}");
                continue;
            }
        };
        event.description = Some(format!("Find this event on Eventbrite: {title}"));
        event.date_text = vec!["Check Eventbrite for dates".to_string()];
        events.push(event);
    }

    Ok(events)
}
