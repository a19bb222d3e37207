use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event as XmlEvent};
use quick_xml::Writer;
use thiserror::Error;

use crate::models::Event;

pub const OUTPUT_XML: &str = "events.xml";
pub const OUTPUT_JSON: &str = "events.json";

const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("xml serialization failed: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("feed output io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Static channel-level metadata.
#[derive(Debug, Clone)]
pub struct FeedMeta {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    pub generator: String,
}

impl Default for FeedMeta {
    fn default() -> Self {
        Self {
            title: "Amsterdam Events Feed".to_string(),
            link: "https://www.iamsterdam.com/uit/agenda".to_string(),
            description: "Curated upcoming events and activities in Amsterdam".to_string(),
            language: "en".to_string(),
            generator: concat!("amsterdam-events ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

pub fn rss_string(
    events: &[Event],
    meta: &FeedMeta,
    built_at: DateTime<Utc>,
) -> Result<String, FeedError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(XmlEvent::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:content", CONTENT_NS));
    writer.write_event(XmlEvent::Start(rss))?;
    writer.write_event(XmlEvent::Start(BytesStart::new("channel")))?;

    write_text_element(&mut writer, "title", &meta.title)?;
    write_text_element(&mut writer, "link", &meta.link)?;
    write_text_element(&mut writer, "description", &meta.description)?;
    write_text_element(&mut writer, "language", &meta.language)?;
    write_text_element(&mut writer, "generator", &meta.generator)?;
    write_text_element(&mut writer, "lastBuildDate", &built_at.to_rfc2822())?;

    for event in events {
        write_item(&mut writer, event)?;
    }

    writer.write_event(XmlEvent::End(BytesEnd::new("channel")))?;
    writer.write_event(XmlEvent::End(BytesEnd::new("rss")))?;

    let bytes = writer.into_inner();
    Ok(String::from_utf8(bytes).expect("writer produces utf-8"))
}

pub fn json_string(events: &[Event]) -> Result<String, FeedError> {
    let mut json = serde_json::to_string_pretty(events)?;
    json.push('\n');
    Ok(json)
}

/// Writes the feed files unless the run produced nothing; an empty feed is
/// never emitted in place of no feed. Returns whether files were written.
pub fn publish(events: &[Event], meta: &FeedMeta, dir: &Path) -> Result<bool, FeedError> {
    if events.is_empty() {
        return Ok(false);
    }
    write_outputs(events, meta, dir)?;
    Ok(true)
}

/// Writes events.xml and events.json into `dir` with write-then-rename so a
/// failed run never leaves a partial feed behind.
pub fn write_outputs(events: &[Event], meta: &FeedMeta, dir: &Path) -> Result<(), FeedError> {
    let rss = rss_string(events, meta, Utc::now())?;
    let json = json_string(events)?;
    write_atomic(&dir.join(OUTPUT_XML), rss.as_bytes())?;
    write_atomic(&dir.join(OUTPUT_JSON), json.as_bytes())?;
    Ok(())
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), FeedError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn write_item(writer: &mut Writer<Vec<u8>>, event: &Event) -> Result<(), FeedError> {
    writer.write_event(XmlEvent::Start(BytesStart::new("item")))?;
    write_text_element(writer, "title", &event.title)?;
    write_text_element(writer, "link", &event.link)?;
    write_text_element(writer, "pubDate", &event.pub_date.to_rfc2822())?;

    let mut guid = BytesStart::new("guid");
    guid.push_attribute(("isPermaLink", "false"));
    writer.write_event(XmlEvent::Start(guid))?;
    writer.write_event(XmlEvent::Text(BytesText::new(&event.link)))?;
    writer.write_event(XmlEvent::End(BytesEnd::new("guid")))?;

    if let Some(description) = &event.description {
        write_text_element(writer, "description", description)?;
    }

    // rich body for readers that render content:encoded; the escape on every
    // field keeps a literal ]]> from terminating the CDATA block early
    let html = render_item_html(event).replace("]]>", "]]]]><![CDATA[>");
    writer.write_event(XmlEvent::Start(BytesStart::new("content:encoded")))?;
    writer.write_event(XmlEvent::CData(BytesCData::new(html)))?;
    writer.write_event(XmlEvent::End(BytesEnd::new("content:encoded")))?;

    if let Some(image) = &event.image {
        let mut enclosure = BytesStart::new("enclosure");
        enclosure.push_attribute(("url", image.as_str()));
        enclosure.push_attribute(("type", "image/jpeg"));
        enclosure.push_attribute(("length", "0")); // actual size unknown
        writer.write_event(XmlEvent::Empty(enclosure))?;
    }

    writer.write_event(XmlEvent::End(BytesEnd::new("item")))?;
    Ok(())
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> Result<(), FeedError> {
    writer.write_event(XmlEvent::Start(BytesStart::new(name)))?;
    writer.write_event(XmlEvent::Text(BytesText::new(text)))?;
    writer.write_event(XmlEvent::End(BytesEnd::new(name)))?;
    Ok(())
}

fn render_item_html(event: &Event) -> String {
    let mut html = String::new();
    html.push_str("<div class=\"amsterdam-event-card\">");
    html.push_str("<div class=\"event-details\">");

    html.push_str("<p class=\"event-label\"><strong>Dates:</strong></p><ul class=\"event-dates\">");
    for date in &event.date_text {
        html.push_str("<li>");
        html.push_str(&encode_text(date));
        html.push_str("</li>");
    }
    html.push_str("</ul>");

    push_info_line(&mut html, "Price", &event.price_text);
    push_info_line(&mut html, "Location", &event.location);
    push_info_line(&mut html, "Source", &event.source);
    if !event.tags.is_empty() {
        push_info_line(&mut html, "Tags", &event.tags.join(" | "));
    }
    html.push_str("</div>");

    if let Some(description) = &event.description {
        html.push_str("<p class=\"event-description\">");
        html.push_str(&encode_text(description));
        html.push_str("</p>");
    }

    html.push_str("<p class=\"event-link\"><a href=\"");
    html.push_str(&encode_double_quoted_attribute(&event.link));
    html.push_str("\">View event details</a></p>");
    html.push_str("</div>");
    html
}

fn push_info_line(html: &mut String, label: &str, value: &str) {
    html.push_str("<p class=\"event-info\"><strong>");
    html.push_str(label);
    html.push_str(":</strong> ");
    html.push_str(&encode_text(value));
    html.push_str("</p>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use quick_xml::events::Event as ReadEvent;
    use quick_xml::Reader;

    fn sample_event() -> Event {
        let pub_date = Utc.with_ymd_and_hms(2025, 6, 10, 8, 30, 0).unwrap();
        let mut event = Event::new(
            "Grachtenfestival 2025",
            "https://www.iamsterdam.com/uit/agenda/grachtenfestival",
            "I amsterdam",
            pub_date,
        )
        .expect("valid event");
        event.date_text = vec!["Tue 10 Jun".to_string(), "Wed 11 Jun".to_string()];
        event.price_text = "Toegang: Gratis entree".to_string();
        event.description = Some("Classical music on the canals.".to_string());
        event.tags = vec!["Gratis entree".to_string()];
        event.image = Some("https://example.com/festival.jpg".to_string());
        event
    }

    fn assert_well_formed(xml: &str) {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event() {
                Ok(ReadEvent::Eof) => break,
                Ok(_) => {}
                Err(err) => panic!("feed is not well-formed xml: {err}"),
            }
        }
    }

    #[test]
    fn rss_contains_channel_and_item_fields() {
        let built_at = Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap();
        let xml = rss_string(&[sample_event()], &FeedMeta::default(), built_at)
            .expect("serialize feed");

        assert_well_formed(&xml);
        assert!(xml.contains("<rss version=\"2.0\""));
        assert!(xml.contains("xmlns:content=\"http://purl.org/rss/1.0/modules/content/\""));
        assert!(xml.contains("<guid isPermaLink=\"false\">"));
        assert!(xml.contains("<enclosure url=\"https://example.com/festival.jpg\" type=\"image/jpeg\" length=\"0\"/>"));
        assert!(xml.contains("<![CDATA["));
        assert!(xml.contains("<li>Tue 10 Jun</li>"));
        assert!(xml.contains("lastBuildDate"));
    }

    #[test]
    fn cdata_survives_embedded_terminator() {
        let mut event = sample_event();
        event.description = Some("tricky ]]> description".to_string());
        let xml = rss_string(&[event], &FeedMeta::default(), Utc::now()).expect("serialize feed");
        assert_well_formed(&xml);
    }

    #[test]
    fn json_mirrors_the_event_list() {
        let events = vec![sample_event()];
        let json = json_string(&events).expect("serialize json");
        let restored: Vec<Event> = serde_json::from_str(&json).expect("parse json");
        assert_eq!(restored, events);
    }

    #[test]
    fn zero_events_publish_nothing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let written =
            publish(&[], &FeedMeta::default(), dir.path()).expect("publish empty run");
        assert!(!written);
        assert!(!dir.path().join(OUTPUT_XML).exists());
        assert!(!dir.path().join(OUTPUT_JSON).exists());
    }

    #[test]
    fn write_outputs_creates_both_files_without_leftover_temps() {
        let dir = tempfile::tempdir().expect("temp dir");
        write_outputs(&[sample_event()], &FeedMeta::default(), dir.path())
            .expect("write outputs");

        assert!(dir.path().join(OUTPUT_XML).is_file());
        assert!(dir.path().join(OUTPUT_JSON).is_file());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
