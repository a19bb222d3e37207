use std::collections::HashSet;

use anyhow::Result;
use chrono::Utc;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::base::{self, Fetcher};
use super::SourceScraper;
use crate::models::Event;

const URL: &str = "https://www.timeout.com/amsterdam/things-to-do";
const SOURCE_ID: &str = "timeout";
const SOURCE_NAME: &str = "Time Out Amsterdam";
const DEFAULT_LIMIT: usize = 15;

static CARD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div, article").expect("timeout card selector"));
static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3").expect("timeout heading selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("timeout link selector"));
static TEXT_BLOCK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, div").expect("timeout text selector"));

const CARD_CLASS_HINTS: [&str; 3] = ["event", "listing", "card"];
const DESCRIPTION_CLASS_HINTS: [&str; 2] = ["description", "excerpt"];

pub struct TimeOutAmsterdam;

impl SourceScraper for TimeOutAmsterdam {
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

/// Listing cards carry the title, link and blurb directly; no candidate page
/// is fetched, so dates and price stay on their placeholders.
pub(crate) fn parse_listing(html: &str, limit: usize) -> Result<Vec<Event>> {
    let document = Html::parse_document(html);
    let mut seen_links = HashSet::new();
    let mut events = Vec::new();

    for card in document.select(&CARD_SELECTOR) {
        if events.len() >= limit {
            break;
        }
        if !has_class_hint(&card, &CARD_CLASS_HINTS) {
            continue;
        }

        let title = match base::first_text(&card, &HEADING_SELECTOR)
            .or_else(|| base::first_text(&card, &LINK_SELECTOR))
        {
            Some(title) => title,
            None => continue,
        };
        if title.chars().count() <= 5 {
            continue;
        }

        let link = match base::absolute_url(URL, base::first_attr(&card, &LINK_SELECTOR, "href")) {
            Some(link) => link,
            None => continue,
        };
        if !seen_links.insert(link.clone()) {
            continue;
        }

        let description = card_description(&card)
            .unwrap_or_else(|| format!("{SOURCE_NAME}: {title}"));

        let mut event = match Event::new(&title, &link, SOURCE_NAME, Utc::now()) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(%title, "skipping card: {err:#}");
                continue;
            }
        };
        event.description = Some(description);
        events.push(event);
    }

    Ok(events)
}

fn card_description(card: &ElementRef<'_>) -> Option<String> {
    for block in card.select(&TEXT_BLOCK_SELECTOR) {
        if has_class_hint(&block, &DESCRIPTION_CLASS_HINTS) {
            let text = base::inner_text(block);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn has_class_hint(element: &ElementRef<'_>, hints: &[&str]) -> bool {
    element
        .value()
        .classes()
        .any(|class| hints.iter().any(|hint| class.to_lowercase().contains(hint)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FALLBACK_DATES, FALLBACK_PRICE};

    const SAMPLE_HTML: &str = r#"
    <html><body>
        <article class="tile _article_card">
            <h3 class="tile-title">Vondelpark Open Air Theatre</h3>
            <a href="/amsterdam/things-to-do/vondelpark-open-air">More</a>
            <p class="tile-description">Free performances in the park all summer long.</p>
        </article>
        <div class="event-listing">
            <a href="/amsterdam/things-to-do/museum-night">Museum Night Amsterdam</a>
        </div>
        <div class="sidebar">
            <a href="/amsterdam/news">Short</a>
        </div>
    </body></html>
    "#;

    #[test]
    fn parses_cards_into_placeholder_backed_events() {
        let events = parse_listing(SAMPLE_HTML, 10).expect("parse listing");
        assert_eq!(events.len(), 2);

        let first = &events[0];
        assert_eq!(first.title, "Vondelpark Open Air Theatre");
        assert_eq!(
            first.link,
            "https://www.timeout.com/amsterdam/things-to-do/vondelpark-open-air"
        );
        assert_eq!(
            first.description.as_deref(),
            Some("Free performances in the park all summer long.")
        );
        assert_eq!(first.date_text, vec![FALLBACK_DATES.to_string()]);
        assert_eq!(first.price_text, FALLBACK_PRICE);

        let second = &events[1];
        assert_eq!(second.title, "Museum Night Amsterdam");
        assert_eq!(
            second.description.as_deref(),
            Some("Time Out Amsterdam: Museum Night Amsterdam")
        );
    }

    #[test]
    fn limit_caps_the_number_of_cards() {
        let events = parse_listing(SAMPLE_HTML, 1).expect("parse listing");
        assert_eq!(events.len(), 1);
    }
}
