use crate::dom::element::ElementNode;
use std::fmt;

/// Escape an element id for use in a `#id` selector. Every character that is
/// not a word character, digit, whitespace, or `-` gets a backslash.
pub fn escape_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for c in id.chars() {
        if c.is_alphanumeric() || c == '_' || c == '-' || c.is_whitespace() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// The selector shapes the scanner emits. Anything else fails to parse and is
/// skipped by the fill applier.
///
/// `TagNth` counts only prior siblings matching the same tag and `type`
/// attribute, mirroring how the selector was derived. There is no uniqueness
/// guarantee when structurally identical untagged elements share a container;
/// resolution returns the first match in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `#escaped-id`
    Id(String),
    /// `tag[name="..."]`
    TagName { tag: String, name: String },
    /// `tag[type="..."]:nth-of-type(n)` or `tag:nth-of-type(n)`
    TagNth {
        tag: String,
        input_type: Option<String>,
        nth: usize,
    },
}

impl Selector {
    /// Parse a selector string into one of the supported shapes.
    pub fn parse(raw: &str) -> Option<Selector> {
        let raw = raw.trim();
        if let Some(id) = raw.strip_prefix('#') {
            if id.is_empty() {
                return None;
            }
            return Some(Selector::Id(unescape(id)));
        }

        if let Some((tag, (name, trailing))) = split_attr(raw, "name") {
            if !trailing.is_empty() {
                return None;
            }
            return Some(Selector::TagName { tag, name });
        }

        // tag[type="..."]:nth-of-type(n) | tag:nth-of-type(n)
        let (head, nth) = raw.split_once(":nth-of-type(")?;
        let nth: usize = nth.strip_suffix(')')?.trim().parse().ok()?;
        if nth == 0 {
            return None;
        }
        if let Some((tag, (value, trailing))) = split_attr(head, "type") {
            if !trailing.is_empty() {
                return None;
            }
            return Some(Selector::TagNth {
                tag,
                input_type: Some(value),
                nth,
            });
        }
        if head.is_empty() || !head.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(Selector::TagNth {
            tag: head.to_ascii_lowercase(),
            input_type: None,
            nth,
        })
    }

    /// Whether this selector matches `el`, given the element's prior siblings
    /// (needed for the nth-of-type shape).
    pub fn matches(&self, el: &ElementNode, prior_siblings: &[ElementNode]) -> bool {
        match self {
            Selector::Id(id) => el.id().map(String::as_str) == Some(id.as_str()),
            Selector::TagName { tag, name } => {
                el.is_tag(tag) && el.name().map(String::as_str) == Some(name.as_str())
            }
            Selector::TagNth {
                tag,
                input_type,
                nth,
            } => {
                if !el.is_tag(tag) {
                    return false;
                }
                if el.get_attribute("type") != input_type.as_ref() {
                    return false;
                }
                let position = 1 + prior_siblings
                    .iter()
                    .filter(|s| s.is_tag(tag) && s.get_attribute("type") == input_type.as_ref())
                    .count();
                position == *nth
            }
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Id(id) => write!(f, "#{}", escape_id(id)),
            Selector::TagName { tag, name } => write!(f, "{tag}[name=\"{name}\"]"),
            Selector::TagNth {
                tag,
                input_type: Some(t),
                nth,
            } => write!(f, "{tag}[type=\"{t}\"]:nth-of-type({nth})"),
            Selector::TagNth {
                tag,
                input_type: None,
                nth,
            } => write!(f, "{tag}:nth-of-type({nth})"),
        }
    }
}

/// Split `tag[attr="value"]rest`, accepting single or double quotes.
/// Returns (lowercased tag, (value, rest-after-bracket)).
fn split_attr(raw: &str, attr: &str) -> Option<(String, (String, String))> {
    let open = raw.find('[')?;
    let tag = &raw[..open];
    if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let rest = &raw[open + 1..];
    let close = rest.find(']')?;
    let inner = &rest[..close];
    let trailing = rest[close + 1..].to_string();
    let (key, quoted) = inner.split_once('=')?;
    if key.trim() != attr {
        return None;
    }
    let quoted = quoted.trim();
    let value = quoted
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| quoted.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))?;
    Some((tag.to_ascii_lowercase(), (value.to_string(), trailing)))
}
