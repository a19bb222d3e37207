use scraper::node::Node;
use scraper::ElementRef;

/// Renders a page's main content region as Markdown for the extractor.
/// Best-effort: unknown elements contribute their children, scripts and
/// styles are dropped.
pub fn convert(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    render_children(root, &mut out);
    normalize_blank_lines(&out)
}

fn render_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_collapsed(text, out),
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    render_element(el, out);
                }
            }
            _ => {}
        }
    }
}

fn render_element(element: ElementRef<'_>, out: &mut String) {
    match element.value().name() {
        "script" | "style" | "noscript" | "template" => {}
        name @ ("h1" | "h2" | "h3" | "h4" | "h5" | "h6") => {
            let level = name[1..].parse::<usize>().unwrap_or(1);
            out.push_str("\n\n");
            out.push_str(&"#".repeat(level));
            out.push(' ');
            out.push_str(&inline_text(element));
            out.push_str("\n\n");
        }
        "p" | "div" | "section" | "article" | "header" | "footer" | "figure" | "blockquote" => {
            out.push_str("\n\n");
            render_children(element, out);
            out.push_str("\n\n");
        }
        "br" => out.push('\n'),
        "hr" => out.push_str("\n\n---\n\n"),
        "ul" | "ol" => {
            out.push('\n');
            render_children(element, out);
            out.push('\n');
        }
        "li" => {
            out.push_str("\n- ");
            render_children(element, out);
        }
        "a" => {
            let text = inline_text(element);
            match element.value().attr("href") {
                Some(href) if !href.is_empty() && !href.starts_with('#') => {
                    out.push_str(&format!("[{text}]({href})"));
                }
                _ => out.push_str(&text),
            }
        }
        "img" => {
            if let Some(src) = element.value().attr("src") {
                let alt = element.value().attr("alt").unwrap_or("");
                out.push_str(&format!("![{alt}]({src})"));
            }
        }
        _ => render_children(element, out),
    }
}

fn inline_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    for chunk in element.text() {
        push_collapsed(chunk, &mut text);
    }
    text.trim().to_string()
}

/// Collapses whitespace runs without trimming, so spacing between inline
/// siblings survives.
fn push_collapsed(text: &str, out: &mut String) {
    let mut last_was_ws = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_ws {
                out.push(' ');
            }
            last_was_ws = true;
        } else {
            out.push(c);
            last_was_ws = false;
        }
    }
}

fn normalize_blank_lines(text: &str) -> String {
    let mut lines = Vec::new();
    let mut blank_pending = false;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            blank_pending = !lines.is_empty();
            continue;
        }
        if blank_pending {
            lines.push("");
            blank_pending = false;
        }
        lines.push(line);
    }
    lines.join("\n")
}
