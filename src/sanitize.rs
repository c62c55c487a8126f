//! Markup filter applied to user-supplied text before it is echoed to clients.
//!
//! Whitelisted formatting tags survive with only their whitelisted attributes;
//! every other tag is escaped so it renders as text instead of executing.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"<[^<>]*>").unwrap();
    static ref TAG_PARTS_RE: Regex =
        Regex::new(r"(?s)^<\s*(/)?\s*([a-zA-Z][a-zA-Z0-9]*)(.*?)(/)?\s*>$").unwrap();
    static ref ATTR_RE: Regex = Regex::new(
        r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#
    )
    .unwrap();
}

/// Attributes each allowed tag may keep.
fn allowed_attrs(tag: &str) -> Option<&'static [&'static str]> {
    let attrs: &'static [&'static str] = match tag {
        "a" => &["href", "title", "target"],
        "img" => &["src", "alt", "title", "width", "height"],
        "abbr" => &["title"],
        "blockquote" | "q" => &["cite"],
        "td" | "th" => &["colspan", "rowspan", "align"],
        "b" | "br" | "code" | "del" | "em" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "hr"
        | "i" | "li" | "ol" | "p" | "pre" | "s" | "small" | "span" | "strong" | "sub"
        | "sup" | "u" | "ul" | "table" | "thead" | "tbody" | "tr" => &[],
        _ => return None,
    };
    Some(attrs)
}

fn escape_text(s: &str) -> String {
    s.replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Prefixes a URL-bearing attribute may start with. Anything else, including
/// entity-encoded schemes, is dropped.
const SAFE_URL_PREFIXES: [&str; 9] = [
    "http://",
    "https://",
    "mailto:",
    "tel:",
    "data:image/",
    "#",
    "/",
    "./",
    "../",
];

fn is_safe_value(attr: &str, value: &str) -> bool {
    if attr != "href" && attr != "src" {
        return true;
    }
    let value = value.trim().to_ascii_lowercase();
    SAFE_URL_PREFIXES
        .iter()
        .any(|prefix| value.starts_with(prefix))
}

fn filter_tag(tag: &str) -> String {
    let Some(parts) = TAG_PARTS_RE.captures(tag) else {
        return escape_text(tag);
    };
    let name = parts[2].to_ascii_lowercase();
    let Some(allowed) = allowed_attrs(&name) else {
        return escape_text(tag);
    };
    if parts.get(1).is_some() {
        return format!("</{}>", name);
    }

    let mut out = format!("<{}", name);
    let raw_attrs = parts.get(3).map(|m| m.as_str()).unwrap_or("");
    for attr in ATTR_RE.captures_iter(raw_attrs) {
        let key = attr[1].to_ascii_lowercase();
        if !allowed.contains(&key.as_str()) {
            continue;
        }
        let value = attr
            .get(2)
            .or_else(|| attr.get(3))
            .or_else(|| attr.get(4))
            .map(|m| m.as_str());
        match value {
            Some(v) if !is_safe_value(&key, v) => continue,
            Some(v) => out.push_str(&format!(" {}=\"{}\"", key, escape_attr(v))),
            None => out.push_str(&format!(" {}", key)),
        }
    }
    if parts.get(4).is_some() {
        out.push_str(" /");
    }
    out.push('>');
    out
}

/// Neutralizes markup in `input`, keeping benign formatting tags.
pub fn sanitize_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for m in TAG_RE.find_iter(input) {
        out.push_str(&escape_text(&input[last..m.start()]));
        out.push_str(&filter_tag(m.as_str()));
        last = m.end();
    }
    out.push_str(&escape_text(&input[last..]));
    out
}
