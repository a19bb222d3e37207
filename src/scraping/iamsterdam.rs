use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::Utc;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::base::{self, Fetcher};
use super::SourceScraper;
use crate::extract;
use crate::markdown;
use crate::models::Event;
use crate::translate;

const URL: &str = "https://www.iamsterdam.com/uit/agenda";
const SOURCE_ID: &str = "iamsterdam";
const SOURCE_NAME: &str = "I amsterdam";
const DEFAULT_LIMIT: usize = 15;

/// Agenda links shorter than this are navigation, not listings.
const MIN_TITLE_LEN: usize = 10;

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("iamsterdam link selector"));

const EVENT_KEYWORDS: [&str; 18] = [
    "amsterdam 750",
    "tentoonstelling",
    "concert",
    "festival",
    "museum",
    "expositie",
    "show",
    "wandeling",
    "tour",
    "kunst",
    "theater",
    "muziek",
    "evenement",
    "activiteit",
    "bezienswaardigheid",
    "grachtenfestival",
    "sail",
    "canal parade",
];

const SKIP_TERMS: [&str; 18] = [
    "nederlands",
    "english",
    "deutsch",
    "français",
    "español",
    "cookies",
    "privacy",
    "contact",
    "volg ons",
    "over ons",
    "taal",
    "language",
    "filter",
    "sorteren",
    "ontdek amsterdam",
    "city card",
    "volgende",
    "meer data",
];

const HREF_KEYWORDS: [&str; 7] = [
    "event",
    "agenda",
    "activit",
    "museum",
    "festival",
    "concert",
    "tentoonstelling",
];

// checked in order; the first hint present in the page but not in the title
// becomes the display location
const LOCATION_HINTS: [&str; 7] = [
    "amsterdam",
    "museum",
    "theater",
    "concertgebouw",
    "vondelpark",
    "centrum",
    "beursplein",
];

#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub title: String,
    pub link: String,
}

pub struct IAmsterdam;

impl SourceScraper for IAmsterdam {
    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }

    fn default_limit(&self) -> usize {
        DEFAULT_LIMIT
    }

    fn fetch(&self, http: &Fetcher, limit: usize) -> Result<Vec<Event>> {
        let html = http.fetch_html(URL)?;
        let candidates = collect_candidates(&html, limit);
        tracing::info!(count = candidates.len(), "found candidate agenda pages");

        let mut events = Vec::new();
        for candidate in candidates {
            match scrape_candidate(http, &candidate) {
                Ok(event) => events.push(event),
                Err(err) => {
                    tracing::warn!(url = %candidate.link, "skipping candidate: {err:#}");
                }
            }
        }
        Ok(events)
    }
}

/// Scans the agenda page for links that look like individual event listings.
pub(crate) fn collect_candidates(html: &str, limit: usize) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    let mut seen_links = HashSet::new();
    let mut candidates = Vec::new();

    for link in document.select(&LINK_SELECTOR) {
        if candidates.len() >= limit {
            break;
        }

        let title = base::inner_text(link);
        if title.chars().count() < MIN_TITLE_LEN {
            continue;
        }

        let lower_title = title.to_lowercase();
        if SKIP_TERMS.iter().any(|term| lower_title.contains(term)) {
            continue;
        }

        let href = match link.value().attr("href") {
            Some(href) if !href.is_empty() && !href.starts_with('#') => href,
            _ => continue,
        };
        let lower_href = href.to_lowercase();

        let looks_like_event = EVENT_KEYWORDS.iter().any(|kw| lower_title.contains(kw))
            || HREF_KEYWORDS.iter().any(|kw| lower_href.contains(kw));
        if !looks_like_event {
            continue;
        }

        let full_link = match base::absolute_url(URL, Some(href.to_string())) {
            Some(url) => url,
            None => continue,
        };
        if !seen_links.insert(full_link.clone()) {
            continue;
        }

        candidates.push(Candidate {
            title,
            link: full_link,
        });
    }

    candidates
}

fn scrape_candidate(http: &Fetcher, candidate: &Candidate) -> Result<Event> {
    let html = http.fetch_html(&candidate.link)?;
    build_event(&candidate.title, &candidate.link, &html)
}

/// Turns one candidate page into an Event via the Markdown extraction
/// pipeline. Missing dates/price/description resolve to placeholders and are
/// not errors; only an unusable page (no content region at all) fails.
pub(crate) fn build_event(title: &str, link: &str, page_html: &str) -> Result<Event> {
    let document = Html::parse_document(page_html);
    let content = base::main_content(&document)
        .with_context(|| format!("no main content region in {link}"))?;
    let text = markdown::convert(content);

    let extracted = extract::extract(&text);
    let mut event = Event::new(title, link, SOURCE_NAME, Utc::now())?;
    event.date_text = translate::translate_dates(&extracted.date_text);
    event.price_text = extracted.price_text;
    event.description = Some(extracted.description);
    event.tags = detect_tags(&text);
    if let Some(location) = detect_location(&text, title) {
        event.location = location;
    }
    event.image = base::find_image(&document, link);
    Ok(event)
}

fn detect_location(text: &str, title: &str) -> Option<String> {
    let lower_text = text.to_lowercase();
    let lower_title = title.to_lowercase();
    for hint in LOCATION_HINTS {
        if lower_text.contains(hint) && !lower_title.contains(hint) {
            let mut chars = hint.chars();
            let first = chars.next()?;
            return Some(first.to_uppercase().collect::<String>() + chars.as_str());
        }
    }
    None
}

fn detect_tags(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tags = Vec::new();
    if lower.contains("amsterdam 750") {
        tags.push("Amsterdam 750 events".to_string());
    }
    if lower.contains("gratis") || lower.contains("free") {
        tags.push("Gratis entree".to_string());
    }
    if lower.contains("toekomsttiendaagse") {
        tags.push("ToekomstTiendaagse".to_string());
    }
    tags
}
