use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FALLBACK_DATES: &str = "Check website for dates";
pub const FALLBACK_PRICE: &str = "Check website for prices";
pub const DEFAULT_LOCATION: &str = "Amsterdam";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Event {
    pub title: String,
    pub link: String, // absolute URL, doubles as the feed item GUID
    pub description: Option<String>,
    pub source: String,
    pub date_text: Vec<String>,
    pub price_text: String,
    pub pub_date: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub location: String,
    pub image: Option<String>,
}

impl Event {
    /// Builds a record with validated title/link and placeholder fields.
    /// The caller fills in extracted fields before the record is collected.
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        source: impl Into<String>,
        pub_date: DateTime<Utc>,
    ) -> Result<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            bail!("event title is empty");
        }
        let link = link.into();
        let parsed =
            reqwest::Url::parse(&link).with_context(|| format!("invalid event link: {link}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("event link is not an http(s) URL: {link}");
        }

        Ok(Self {
            title,
            link,
            description: None,
            source: source.into(),
            date_text: vec![FALLBACK_DATES.to_string()],
            price_text: FALLBACK_PRICE.to_string(),
            pub_date,
            tags: Vec::new(),
            location: DEFAULT_LOCATION.to_string(),
            image: None,
        })
    }
}
