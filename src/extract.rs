use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{FALLBACK_DATES, FALLBACK_PRICE};

pub const FALLBACK_DESCRIPTION: &str = "Check the website for event details.";

/// Paragraphs shorter than this (whitespace-collapsed) are treated as
/// boilerplate rather than a usable description.
const MIN_DESCRIPTION_LEN: usize = 80;

// Weekday abbreviation followed by a day-and-month token, e.g. "di 10 jun".
static WEEKDAY_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(ma|di|wo|do|vr|za|zo|mon|tue|wed|thu|fri|sat|sun)\b\.?\s+\d{1,2}\s*(jan|feb|mrt|mar|apr|mei|may|jun|jul|aug|sep|okt|oct|nov|dec)",
    )
    .expect("weekday date regex")
});

// Day number adjacent to a recognized month abbreviation, e.g. "04 jun '25".
static DAY_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d{1,2}\s*(jan|feb|mrt|mar|apr|mei|may|jun|jul|aug|sep|okt|oct|nov|dec)\b")
        .expect("day month regex")
});

// Heading text that marks the start of a dates section.
static DATES_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(data|datum|dates|wanneer|when|openingstijden)\b")
        .expect("dates marker regex")
});

static IMAGE_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("image ref regex"));

static LINK_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("link ref regex"));

/// Structured result of scanning one page's Markdown.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub date_text: Vec<String>,
    pub price_text: String,
    pub description: String,
}

pub fn extract(markdown: &str) -> Extracted {
    Extracted {
        date_text: extract_dates(markdown),
        price_text: extract_price(markdown),
        description: extract_description(markdown),
    }
}

/// Collects date-shaped lines, preferring a dedicated dates section when one
/// exists. Without a section the whole text is scanned, which can pick up
/// unrelated date-shaped lines elsewhere on the page; that permissiveness is
/// intentional and callers treat the placeholder as a normal outcome.
pub fn extract_dates(markdown: &str) -> Vec<String> {
    let section = dates_section(markdown);
    let region = section.as_deref().unwrap_or(markdown);

    let mut dates = Vec::new();
    for line in region.lines() {
        let line = collapse_ws(line);
        if line.is_empty() {
            continue;
        }
        if WEEKDAY_DATE_RE.is_match(&line) || DAY_MONTH_RE.is_match(&line) {
            dates.push(line);
        }
    }

    if dates.is_empty() {
        vec![FALLBACK_DATES.to_string()]
    } else {
        dates
    }
}

/// First line mentioning a price: a currency symbol or a Gratis/Free token.
pub fn extract_price(markdown: &str) -> String {
    for line in markdown.lines() {
        let line = collapse_ws(line);
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();
        if line.contains('€') || lower.contains("gratis") || lower.contains("free") {
            return line;
        }
    }
    FALLBACK_PRICE.to_string()
}

/// First substantive paragraph of prose, with Markdown decorations removed.
pub fn extract_description(markdown: &str) -> String {
    let mut cleaned = String::new();
    for line in markdown.lines() {
        let trimmed = line.trim();
        if is_heading(trimmed) || is_horizontal_rule(trimmed) {
            // removed lines still act as a paragraph boundary
            cleaned.push('\n');
            continue;
        }
        cleaned.push_str(line);
        cleaned.push('\n');
    }

    let cleaned = IMAGE_REF_RE.replace_all(&cleaned, "");
    let cleaned = LINK_REF_RE.replace_all(&cleaned, "$1");

    for paragraph in cleaned.split("\n\n") {
        let collapsed = collapse_ws(paragraph);
        if collapsed.chars().count() > MIN_DESCRIPTION_LEN {
            return collapsed;
        }
    }

    FALLBACK_DESCRIPTION.to_string()
}

/// Text between a heading recognized as a dates marker and the next heading.
fn dates_section(markdown: &str) -> Option<String> {
    let mut section = String::new();
    let mut in_section = false;

    for line in markdown.lines() {
        let trimmed = line.trim();
        if is_heading(trimmed) {
            if in_section {
                break;
            }
            if DATES_MARKER_RE.is_match(trimmed) {
                in_section = true;
            }
            continue;
        }
        if in_section {
            section.push_str(line);
            section.push('\n');
        }
    }

    if in_section {
        Some(section)
    } else {
        None
    }
}

fn is_heading(line: &str) -> bool {
    line.starts_with('#')
}

fn is_horizontal_rule(line: &str) -> bool {
    line.len() >= 3
        && (line.chars().all(|c| c == '-')
            || line.chars().all(|c| c == '*')
            || line.chars().all(|c| c == '_'))
}

fn collapse_ws(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
