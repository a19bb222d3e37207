use std::collections::HashSet;

use anyhow::Result;
use chrono::Utc;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::base::{self, Fetcher};
use super::SourceScraper;
use crate::models::Event;

const URL: &str = "https://www.amsterdam.nl/en/";
const SOURCE_ID: &str = "amsterdam_nl";
const SOURCE_NAME: &str = "Amsterdam.nl";
const DEFAULT_LIMIT: usize = 10;

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("amsterdam.nl link selector"));

const ACTIVITY_KEYWORDS: [&str; 8] = [
    "event",
    "festival",
    "show",
    "concert",
    "exhibition",
    "museum",
    "tour",
    "market",
];

pub struct AmsterdamNl;

impl SourceScraper for AmsterdamNl {
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

/// The city portal has no agenda markup; activity-flavored link text is the
/// only signal available.
pub(crate) fn parse_listing(html: &str, limit: usize) -> Result<Vec<Event>> {
    let document = Html::parse_document(html);
    let mut seen_links = HashSet::new();
    let mut events = Vec::new();

    for link in document.select(&LINK_SELECTOR) {
        if events.len() >= limit {
            break;
        }

        let title = base::inner_text(link);
        if title.chars().count() <= 10 {
            continue;
        }
        let lower = title.to_lowercase();
        if !ACTIVITY_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            continue;
        }

        let href = match link.value().attr("href") {
            Some(href) if !href.is_empty() && !href.starts_with('#') => href.to_string(),
            _ => continue,
        };
        let full_link = match base::absolute_url(URL, Some(href)) {
            Some(url) => url,
            None => continue,
        };
        if !seen_links.insert(full_link.clone()) {
            continue;
        }

        let mut event = match Event::new(
            format!("Amsterdam Activity: {title}"),
            &full_link,
            SOURCE_NAME,
            Utc::now(),
        ) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(%title, "skipping activity link: {err:#}");
                continue;
            }
        };
        event.description = Some(format!("Discover this activity in Amsterdam: {title}"));
        event.date_text = vec!["Ongoing".to_string()];
        events.push(event);
    }

    Ok(events)
}
