//! Fill applier
//!
//! Applies a selector-to-value mapping onto a page snapshot. Each value is
//! written according to the element kind: selects pick the first fuzzy-matched
//! option, checkboxes and radios parse a truthy string, everything else gets
//! the value verbatim. Side effects a live page would see (synthetic input and
//! change events, the transient highlight) are recorded in the report so the
//! host driving a real page can replay them. Selectors that do not resolve
//! are skipped silently; partial application is not an error.

use crate::dom::{ElementNode, PageSnapshot};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Values that check a checkbox or radio (compared case-insensitively).
pub const TRUTHY_VALUES: [&str; 4] = ["true", "yes", "1", "on"];

/// Whether a model-supplied string counts as "checked".
pub fn parse_truthy(value: &str) -> bool {
    TRUTHY_VALUES
        .iter()
        .any(|t| value.eq_ignore_ascii_case(t))
}

/// How a field was written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Select,
    Checkbox,
    Radio,
}

/// One successfully applied field, with the synthetic events a page script
/// would observe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilledField {
    pub selector: String,
    pub kind: FieldKind,
    pub value: String,
    /// Bubbling events dispatched after the write, in order.
    pub events: Vec<String>,
}

/// Transient visual feedback for a filled field. Not load-bearing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Highlight {
    pub selector: String,
    pub outline: String,
    pub duration_ms: u64,
}

/// Outcome of a fill pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FillReport {
    pub filled: Vec<FilledField>,
    /// Selectors that did not resolve, or selects with no matching option.
    pub skipped: Vec<String>,
    pub highlights: Vec<Highlight>,
}

impl FillReport {
    pub fn fields_filled(&self) -> usize {
        self.filled.len()
    }

    fn record(&mut self, selector: &str, kind: FieldKind, value: &str) {
        self.filled.push(FilledField {
            selector: selector.to_string(),
            kind,
            value: value.to_string(),
            events: vec!["input".to_string(), "change".to_string()],
        });
        self.highlights.push(Highlight {
            selector: selector.to_string(),
            outline: "2px solid yellow".to_string(),
            duration_ms: 1000,
        });
    }
}

/// Apply each value to the first element its selector resolves to.
pub fn fill_form(page: &mut PageSnapshot, values: &IndexMap<String, String>) -> FillReport {
    let mut report = FillReport::default();

    for (selector, value) in values {
        let Some(path) = page.resolve(selector) else {
            log::debug!("selector did not resolve, skipping: {selector}");
            report.skipped.push(selector.clone());
            continue;
        };

        // Element kind decides the write; compute what is needed from the
        // shared borrow before mutating.
        let el = match page.get(&path) {
            Some(el) => el,
            None => {
                report.skipped.push(selector.clone());
                continue;
            }
        };

        if el.is_tag("select") {
            match matching_option(el, value) {
                Some(index) => {
                    if let Some(el) = page.get_mut(&path) {
                        set_selected_option(el, index);
                    }
                    report.record(selector, FieldKind::Select, value);
                }
                None => {
                    log::debug!("no option matched '{value}' for {selector}");
                    report.skipped.push(selector.clone());
                }
            }
            continue;
        }

        let field_type = el.input_type();
        match field_type.as_str() {
            "checkbox" | "radio" => {
                let checked = parse_truthy(value);
                let kind = if field_type == "checkbox" {
                    FieldKind::Checkbox
                } else {
                    FieldKind::Radio
                };
                if let Some(el) = page.get_mut(&path) {
                    el.checked = checked;
                }
                report.record(selector, kind, value);
            }
            _ => {
                if let Some(el) = page.get_mut(&path) {
                    el.value = Some(value.clone());
                }
                report.record(selector, FieldKind::Text, value);
            }
        }
    }

    report
}

/// First option whose text or value contains the supplied value,
/// case-insensitively.
fn matching_option(select: &ElementNode, value: &str) -> Option<usize> {
    let needle = value.to_lowercase();
    select.options().iter().position(|o| {
        o.option_text().to_lowercase().contains(&needle)
            || o.option_value().to_lowercase().contains(&needle)
    })
}

fn set_selected_option(select: &mut ElementNode, target: usize) {
    let mut index = 0;
    for child in &mut select.children {
        if child.is_tag("option") {
            child.selected = index == target;
            index += 1;
        } else if child.is_tag("optgroup") {
            for opt in child.children.iter_mut().filter(|c| c.is_tag("option")) {
                opt.selected = index == target;
                index += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with(children: Vec<ElementNode>) -> PageSnapshot {
        let mut form = ElementNode::new("form");
        for c in children {
            form.add_child(c);
        }
        let mut root = ElementNode::new("body");
        root.add_child(form);
        PageSnapshot::new("https://example.com", "Test", root)
    }

    fn values(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn experience_select() -> ElementNode {
        let mut select = ElementNode::new("select");
        select.add_attribute("name", "experience");
        for text in ["Junior", "Mid-level", "Senior Engineer"] {
            select.add_child(ElementNode::new("option").with_text(text));
        }
        select
    }

    #[test]
    fn test_parse_truthy() {
        for v in ["true", "Yes", "1", "ON", "yes"] {
            assert!(parse_truthy(v), "{v} should be truthy");
        }
        for v in ["maybe", "false", "no", "0", ""] {
            assert!(!parse_truthy(v), "{v} should not be truthy");
        }
    }

    #[test]
    fn test_fill_text_verbatim() {
        let mut el = ElementNode::new("input");
        el.add_attribute("id", "fname");
        let mut page = page_with(vec![el]);

        let report = fill_form(&mut page, &values(&[("#fname", "  Ada ")]));
        assert_eq!(report.fields_filled(), 1);
        assert_eq!(report.filled[0].kind, FieldKind::Text);

        let path = page.resolve("#fname").unwrap();
        assert_eq!(page.get(&path).unwrap().value, Some("  Ada ".to_string()));
    }

    #[test]
    fn test_fill_select_substring_match() {
        let mut page = page_with(vec![experience_select()]);
        let report = fill_form(&mut page, &values(&[("select[name=\"experience\"]", "senior")]));

        assert_eq!(report.fields_filled(), 1);
        let path = page.resolve("select[name=\"experience\"]").unwrap();
        assert_eq!(page.get(&path).unwrap().selected_index(), Some(2));
    }

    #[test]
    fn test_fill_select_matches_value_attribute() {
        let mut select = ElementNode::new("select");
        select.add_attribute("name", "country");
        let mut opt = ElementNode::new("option").with_text("United Kingdom");
        opt.add_attribute("value", "GB");
        select.add_child(opt);
        let mut page = page_with(vec![select]);

        let report = fill_form(&mut page, &values(&[("select[name=\"country\"]", "gb")]));
        assert_eq!(report.fields_filled(), 1);
    }

    #[test]
    fn test_fill_select_no_match_leaves_selection() {
        let mut select = experience_select();
        set_selected_option(&mut select, 0);
        let mut page = page_with(vec![select]);

        let report = fill_form(&mut page, &values(&[("select[name=\"experience\"]", "principal")]));
        assert_eq!(report.fields_filled(), 0);
        assert_eq!(report.skipped, vec!["select[name=\"experience\"]"]);

        let path = page.resolve("select[name=\"experience\"]").unwrap();
        assert_eq!(page.get(&path).unwrap().selected_index(), Some(0));
    }

    #[test]
    fn test_fill_checkbox_truthy_values() {
        for (value, expected) in [("Yes", true), ("maybe", false), ("1", true), ("false", false)]
        {
            let mut el = ElementNode::new("input");
            el.add_attribute("type", "checkbox");
            el.add_attribute("name", "agree");
            let mut page = page_with(vec![el]);

            fill_form(&mut page, &values(&[("input[name=\"agree\"]", value)]));
            let path = page.resolve("input[name=\"agree\"]").unwrap();
            assert_eq!(page.get(&path).unwrap().checked, expected, "value={value}");
        }
    }

    #[test]
    fn test_fill_radio_kind() {
        let mut el = ElementNode::new("input");
        el.add_attribute("type", "radio");
        el.add_attribute("id", "auth-yes");
        let mut page = page_with(vec![el]);

        let report = fill_form(&mut page, &values(&[("#auth-yes", "true")]));
        assert_eq!(report.filled[0].kind, FieldKind::Radio);
        let path = page.resolve("#auth-yes").unwrap();
        assert!(page.get(&path).unwrap().checked);
    }

    #[test]
    fn test_fill_skips_unmatched_selectors() {
        let mut page = page_with(vec![]);
        let report = fill_form(
            &mut page,
            &values(&[("#missing", "x"), ("div > input", "y")]),
        );
        assert_eq!(report.fields_filled(), 0);
        assert_eq!(report.skipped.len(), 2);
    }

    #[test]
    fn test_fill_records_events_and_highlight() {
        let mut el = ElementNode::new("input");
        el.add_attribute("id", "fname");
        let mut page = page_with(vec![el]);

        let report = fill_form(&mut page, &values(&[("#fname", "Ada")]));
        assert_eq!(report.filled[0].events, vec!["input", "change"]);
        assert_eq!(report.highlights.len(), 1);
        assert_eq!(report.highlights[0].outline, "2px solid yellow");
        assert_eq!(report.highlights[0].duration_ms, 1000);
    }
}
