use std::collections::HashSet;

use crate::models::Event;

/// Normalized titles at or below this length are considered degenerate and
/// dropped outright.
const MIN_NORMALIZED_LEN: usize = 5;

/// Lower-cased title with everything but ASCII alphanumerics and whitespace
/// stripped; the fuzzy key duplicates are judged on.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Order-preserving removal of events whose normalized titles collide.
/// First occurrence wins, even when the links differ.
pub fn dedup_events(events: Vec<Event>) -> Vec<Event> {
    let original_count = events.len();
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::with_capacity(events.len());

    for event in events {
        let key = normalize_title(&event.title);
        if key.chars().count() <= MIN_NORMALIZED_LEN {
            tracing::debug!(title = %event.title, "dropping event with degenerate title");
            continue;
        }
        if seen.insert(key) {
            unique.push(event);
        }
    }

    let removed = original_count - unique.len();
    if removed > 0 {
        tracing::info!(removed, "removed duplicate events");
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(title: &str, link: &str) -> Event {
        Event::new(title, link, "Test", Utc::now()).expect("valid test event")
    }

    #[test]
    fn normalization_strips_symbols_and_case() {
        assert_eq!(normalize_title("SAIL Amsterdam '25!"), "sail amsterdam 25");
        assert_eq!(normalize_title("★☆★"), "");
    }

    #[test]
    fn duplicate_titles_keep_first_occurrence() {
        let events = vec![
            event("Grachtenfestival 2025", "https://a.example.com/1"),
            event("Museum Night", "https://a.example.com/2"),
            // same normalized title, different link
            event("Grachtenfestival 2025!", "https://b.example.com/3"),
        ];
        let unique = dedup_events(events);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].link, "https://a.example.com/1");
        assert_eq!(unique[1].title, "Museum Night");
    }

    #[test]
    fn degenerate_titles_are_dropped_even_when_unique() {
        let events = vec![
            event("Expo!", "https://a.example.com/1"), // normalizes to "expo", len 4
            event("Museum Night", "https://a.example.com/2"),
        ];
        let unique = dedup_events(events);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].title, "Museum Night");
    }

    #[test]
    fn dedup_is_idempotent() {
        let events = vec![
            event("Grachtenfestival 2025", "https://a.example.com/1"),
            event("Grachtenfestival 2025", "https://a.example.com/2"),
            event("Museum Night", "https://a.example.com/3"),
        ];
        let once = dedup_events(events);
        let twice = dedup_events(once.clone());
        assert_eq!(once, twice);
    }
}
