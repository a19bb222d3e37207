use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

// Dutch day-of-week abbreviations, replaced whole-word so substrings of
// ordinary words are left alone.
const DAY_TOKENS: [(&str, &str); 7] = [
    ("ma", "Mon"),
    ("di", "Tue"),
    ("wo", "Wed"),
    ("do", "Thu"),
    ("vr", "Fri"),
    ("za", "Sat"),
    ("zo", "Sun"),
];

// Dutch month abbreviations, replaced by plain substring since they rarely
// collide with other words in a date string.
const MONTH_TOKENS: [(&str, &str); 12] = [
    ("jan", "Jan"),
    ("feb", "Feb"),
    ("mrt", "Mar"),
    ("apr", "Apr"),
    ("mei", "May"),
    ("jun", "Jun"),
    ("jul", "Jul"),
    ("aug", "Aug"),
    ("sep", "Sep"),
    ("okt", "Oct"),
    ("nov", "Nov"),
    ("dec", "Dec"),
];

static DUTCH_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(ma|di|wo|do|vr|za|zo)\b").expect("dutch day regex"));

/// Rewrites Dutch day/month tokens to English and title-cases the result.
/// Order-preserving; strings without Dutch tokens pass through apart from
/// the title-casing.
pub fn translate_dates(dates: &[String]) -> Vec<String> {
    dates.iter().map(|date| translate_date(date)).collect()
}

pub fn translate_date(input: &str) -> String {
    let replaced = DUTCH_DAY_RE.replace_all(input, |caps: &regex::Captures<'_>| {
        let token = caps[1].to_lowercase();
        DAY_TOKENS
            .iter()
            .find(|(dutch, _)| *dutch == token)
            .map(|(_, english)| (*english).to_string())
            .unwrap_or_else(|| caps[1].to_string())
    });

    let mut text = replaced.into_owned();
    for (dutch, english) in MONTH_TOKENS {
        text = text.replace(dutch, english);
    }

    title_case(&text)
}

fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Optional external text translator. Best-effort: callers keep the original
/// text when translation fails.
pub trait Translate {
    fn translate(&self, text: &str) -> Result<String>;
}

/// Passthrough used when no translation backend is configured.
pub struct NoopTranslator;

impl Translate for NoopTranslator {
    fn translate(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

pub fn translate_or_original(translator: &dyn Translate, text: &str) -> String {
    match translator.translate(text) {
        Ok(translated) => translated,
        Err(err) => {
            tracing::warn!("translation failed, keeping original text: {err:#}");
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn translates_day_and_month_tokens() {
        let input = vec!["di 10 jun".to_string()];
        assert_eq!(translate_dates(&input), vec!["Tue 10 Jun".to_string()]);
    }

    #[test]
    fn preserves_element_count_and_order() {
        let input = vec![
            "ma 1 mrt".to_string(),
            "wo 3 mei".to_string(),
            "zo 7 okt".to_string(),
        ];
        assert_eq!(
            translate_dates(&input),
            vec![
                "Mon 1 Mar".to_string(),
                "Wed 3 May".to_string(),
                "Sun 7 Oct".to_string(),
            ]
        );
    }

    #[test]
    fn day_replacement_is_whole_word_only() {
        // "ma" inside "maart" and "zo" inside "zomer" must survive
        assert_eq!(translate_date("zomerconcert 12 jun"), "Zomerconcert 12 Jun");
        assert_eq!(translate_date("madurodam"), "Madurodam");
    }

    #[test]
    fn translation_is_idempotent() {
        let once = translate_date("do 24 dec 19:30");
        assert_eq!(once, "Thu 24 Dec 19:30");
        assert_eq!(translate_date(&once), once);
    }

    #[test]
    fn non_dutch_input_only_gets_title_cased() {
        assert_eq!(translate_date("every saturday"), "Every Saturday");
    }

    struct FailingTranslator;

    impl Translate for FailingTranslator {
        fn translate(&self, _text: &str) -> Result<String> {
            Err(anyhow!("backend unavailable"))
        }
    }

    #[test]
    fn failed_translation_keeps_original_text() {
        let text = "Tien dagen muziek op de grachten.";
        assert_eq!(translate_or_original(&FailingTranslator, text), text);
        assert_eq!(translate_or_original(&NoopTranslator, text), text);
    }
}
