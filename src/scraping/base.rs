use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};

// Some of the agenda sites serve a consent wall to unknown clients; a plain
// browser UA gets the real page.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

// tried in order; a comma list would yield document order instead
static MAIN_CONTENT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["main", "article", "[role=\"main\"]", "body"]
        .iter()
        .map(|css| Selector::parse(css).expect("main content selector"))
        .collect()
});

static OG_IMAGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[property=\"og:image\"]").expect("og image selector"));

static IMAGE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "img[src*=\"thefeedfactory\"]",
        "img[src*=\"_next/image\"]",
        ".hero-image img",
        "article img",
        "main img",
    ]
    .iter()
    .map(|css| Selector::parse(css).expect("image selector"))
    .collect()
});

/// HTTP access for all scrapers, passed in explicitly so parsing stays free
/// of process-wide state.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(USER_AGENT)
            .build()
            .context("http client")?;
        Ok(Self { client })
    }

    pub fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("request failed for {url}"))?;
        let response = response
            .error_for_status()
            .with_context(|| format!("non-success status for {url}"))?;
        response
            .text()
            .with_context(|| format!("unable to read response body for {url}"))
    }
}

pub fn clean_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

pub fn inner_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

pub fn first_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|node| {
            let cleaned = inner_text(node);
            if cleaned.is_empty() {
                None
            } else {
                Some(cleaned)
            }
        })
        .flatten()
}

pub fn first_attr(element: &ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    element
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}

pub fn absolute_url(base: &str, href: Option<String>) -> Option<String> {
    let href = href?;
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href);
    }
    let base_url = reqwest::Url::parse(base).ok()?;
    base_url.join(&href).ok().map(|u| u.to_string())
}

/// Picks the region of the page the Markdown conversion should cover.
pub fn main_content<'a>(document: &'a Html) -> Option<ElementRef<'a>> {
    for selector in MAIN_CONTENT_SELECTORS.iter() {
        if let Some(element) = document.select(selector).next() {
            return Some(element);
        }
    }
    None
}

/// Finds a representative image: Open Graph metadata first, then a few
/// selectors that match the agenda sites' layouts.
pub fn find_image(document: &Html, base: &str) -> Option<String> {
    if let Some(meta) = document.select(&OG_IMAGE_SELECTOR).next() {
        if let Some(content) = meta.value().attr("content") {
            if let Some(url) = absolute_url(base, Some(content.to_string())) {
                return Some(unwrap_proxied_image(&url));
            }
        }
    }

    for selector in IMAGE_SELECTORS.iter() {
        if let Some(img) = document.select(selector).next() {
            if let Some(src) = img.value().attr("src") {
                if let Some(url) = absolute_url(base, Some(src.to_string())) {
                    return Some(unwrap_proxied_image(&url));
                }
            }
        }
    }

    None
}

/// Next.js image URLs wrap the original behind a `?url=` parameter; prefer
/// the original so feed readers get a stable, uncropped image.
fn unwrap_proxied_image(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some((_, original)) = parsed.query_pairs().find(|(key, _)| key == "url") {
            if original.starts_with("http://") || original.starts_with("https://") {
                return original.into_owned();
            }
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_url_joins_relative_hrefs() {
        assert_eq!(
            absolute_url(
                "https://www.iamsterdam.com/uit/agenda",
                Some("/uit/agenda/festival".to_string())
            ),
            Some("https://www.iamsterdam.com/uit/agenda/festival".to_string())
        );
        assert_eq!(
            absolute_url("https://a.example.com", Some("https://b.example.com/x".to_string())),
            Some("https://b.example.com/x".to_string())
        );
    }

    #[test]
    fn og_image_wins_over_inline_images() {
        let html = r#"
        <html><head>
            <meta property="og:image" content="https://cdn.example.com/hero.jpg">
        </head><body>
            <main><img src="/img/other.jpg"></main>
        </body></html>
        "#;
        let document = Html::parse_document(html);
        assert_eq!(
            find_image(&document, "https://www.iamsterdam.com/uit/agenda/x"),
            Some("https://cdn.example.com/hero.jpg".to_string())
        );
    }

    #[test]
    fn proxied_next_image_urls_are_unwrapped() {
        let html = r#"
        <html><body><main>
            <img src="https://www.iamsterdam.com/_next/image?url=https%3A%2F%2Fmedia.thefeedfactory.nl%2Fevent.jpg&w=1080&q=75">
        </main></body></html>
        "#;
        let document = Html::parse_document(html);
        assert_eq!(
            find_image(&document, "https://www.iamsterdam.com/uit/agenda/x"),
            Some("https://media.thefeedfactory.nl/event.jpg".to_string())
        );
    }

    #[test]
    fn main_content_prefers_main_over_body() {
        let document =
            Html::parse_document("<html><body><main><p>inhoud</p></main></body></html>");
        let region = main_content(&document).expect("content region");
        assert_eq!(region.value().name(), "main");
    }
}
