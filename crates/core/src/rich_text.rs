//! Handling of server-supplied HTML (descriptions, platform requirements).
//!
//! Markup from the API is never passed through raw. [`sanitize_html`] keeps an
//! allow-list of formatting tags, and [`to_plain_text`] flattens everything for
//! terminal output.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Tags kept by [`sanitize_html`]. Attributes are dropped except `href` on `a`.
const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "strong", "b", "em", "i", "ul", "ol", "li", "h1", "h2", "h3", "h4", "h5", "h6",
    "a",
];

static DROPPED_BLOCKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<!--.*?-->")
        .expect("invalid dropped block regex")
});

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<\s*(/)?\s*([a-zA-Z][a-zA-Z0-9]*)([^>]*)>").expect("invalid tag regex")
});

static HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("invalid href regex")
});

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*(?:br|/p|/div|/h[1-6]|/li|/ul|/ol)\b[^>]*>").expect("invalid break regex")
});

static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<\s*li\b[^>]*>").expect("invalid list item regex"));

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("invalid entity regex")
});

static BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("invalid blank line regex"));

/// Reduce `input` to allow-listed markup.
///
/// Disallowed tags are removed while their text content stays. Script and
/// style elements, and comments, are removed with their content. Stray angle
/// brackets in text are escaped.
pub fn sanitize_html(input: &str) -> String {
    let input = DROPPED_BLOCKS.replace_all(input, "");
    let mut output = String::with_capacity(input.len());
    let mut last = 0;

    for caps in TAG.captures_iter(&input) {
        let Some(whole) = caps.get(0) else { continue };
        push_escaped_text(&mut output, &input[last..whole.start()]);
        last = whole.end();

        let name = caps[2].to_ascii_lowercase();
        if !ALLOWED_TAGS.contains(&name.as_str()) {
            continue;
        }

        let closing = caps.get(1).is_some();
        match (closing, name.as_str()) {
            (true, "br") => {}
            (true, _) => output.push_str(&format!("</{name}>")),
            (false, "a") => match safe_href(caps.get(3).map_or("", |m| m.as_str())) {
                Some(href) => output.push_str(&format!("<a href=\"{}\">", escape_attr(&href))),
                None => output.push_str("<a>"),
            },
            (false, _) => output.push_str(&format!("<{name}>")),
        }
    }

    push_escaped_text(&mut output, &input[last..]);
    output
}

/// Flatten `input` to readable plain text.
pub fn to_plain_text(input: &str) -> String {
    let text = DROPPED_BLOCKS.replace_all(input, "");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = LIST_ITEM.replace_all(&text, "- ");
    let text = TAG.replace_all(&text, "");
    let text = ENTITY.replace_all(&text, |caps: &Captures| decode_entity(&caps[0], &caps[1]));

    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let joined = lines.join("\n");
    BLANK_LINES.replace_all(joined.trim(), "\n\n").into_owned()
}

fn safe_href(attributes: &str) -> Option<String> {
    let caps = HREF.captures(attributes)?;
    let value = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))?
        .as_str()
        .trim();
    let lower = value.to_ascii_lowercase();
    (lower.starts_with("https://") || lower.starts_with("http://")).then(|| value.to_string())
}

fn push_escaped_text(output: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(ch),
        }
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn decode_entity(raw: &str, name: &str) -> String {
    let decoded = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => name
            .strip_prefix("#x")
            .or_else(|| name.strip_prefix("#X"))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .or_else(|| name.strip_prefix('#').and_then(|dec| dec.parse().ok()))
            .and_then(char::from_u32),
    };
    decoded.map_or_else(|| raw.to_string(), String::from)
}
