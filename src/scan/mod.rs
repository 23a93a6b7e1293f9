//! Field scanner
//!
//! Walks a page snapshot, finds visible fillable controls, derives a stable
//! selector for each, and assembles a natural-language description from every
//! clue the markup offers: labels, placeholders, attributes, ARIA text,
//! nearby text, and option sets. The descriptions are what the model sees, so
//! they err on the side of including too much rather than too little.

use crate::dom::{escape_id, ElementNode, PageSnapshot};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A scanned form field: where it is, and what it appears to be for.
///
/// Ephemeral; regenerated on every fill request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDescriptor {
    pub selector: String,
    pub description: String,
}

/// Scan a snapshot for all visible, fillable fields in document order.
pub fn scan_fields(page: &PageSnapshot) -> Vec<FieldDescriptor> {
    let mut fields = Vec::new();
    let mut ancestors: Vec<&ElementNode> = Vec::new();
    visit(page, &page.root, &mut ancestors, &mut fields);
    fields
}

fn visit<'a>(
    page: &'a PageSnapshot,
    node: &'a ElementNode,
    ancestors: &mut Vec<&'a ElementNode>,
    out: &mut Vec<FieldDescriptor>,
) {
    ancestors.push(node);
    for (i, child) in node.children.iter().enumerate() {
        if child.is_fillable() && child.is_visible && !child.is_hidden_by_style() {
            out.push(FieldDescriptor {
                selector: unique_selector(child, &node.children[..i]),
                description: analyze_field(page, child, &node.children[..i], ancestors),
            });
        }
        visit(page, child, ancestors, out);
    }
    ancestors.pop();
}

/// Derive a stable CSS selector for an element.
///
/// Precedence: escaped id, then `tag[name=...]`, then
/// `tag[type=...]:nth-of-type(n)` counting only prior siblings of the same
/// tag and type. Collisions between structurally identical untagged elements
/// are an accepted limitation of the heuristic.
pub fn unique_selector(el: &ElementNode, prior_siblings: &[ElementNode]) -> String {
    if let Some(id) = el.id() {
        if !id.is_empty() {
            return format!("#{}", escape_id(id));
        }
    }
    let tag = el.tag_name.to_ascii_lowercase();
    if let Some(name) = el.name() {
        if !name.is_empty() {
            return format!("{tag}[name=\"{name}\"]");
        }
    }

    let type_attr = el.get_attribute("type");
    let nth = 1 + prior_siblings
        .iter()
        .filter(|s| s.is_tag(&tag) && s.get_attribute("type") == type_attr)
        .count();
    match type_attr {
        Some(t) => format!("{tag}[type=\"{t}\"]:nth-of-type({nth})"),
        None => format!("{tag}:nth-of-type({nth})"),
    }
}

/// Assemble a human-readable description of a form field from every context
/// clue available. Returns `"Unknown field"` when nothing at all was found.
pub fn analyze_field(
    page: &PageSnapshot,
    el: &ElementNode,
    prior_siblings: &[ElementNode],
    ancestors: &[&ElementNode],
) -> String {
    let mut clues: Vec<String> = Vec::new();

    // Direct labels (most reliable): label[for=id] anywhere in the document,
    // plus an enclosing label element.
    for label in associated_labels(page, el, ancestors) {
        let text = label.inner_text();
        if !text.is_empty() {
            clues.push(format!("Label: \"{text}\""));
        }
    }

    if let Some(placeholder) = el.get_attribute("placeholder") {
        let placeholder = placeholder.trim();
        if !placeholder.is_empty() {
            clues.push(format!("Placeholder: \"{placeholder}\""));
        }
    }

    for (attr, tag) in [
        ("name", "Name"),
        ("id", "ID"),
        ("class", "Class"),
        ("title", "Title"),
        ("autocomplete", "Autocomplete"),
        ("aria-label", "ARIA Label"),
    ] {
        if let Some(v) = el.get_attribute(attr) {
            if !v.is_empty() {
                clues.push(format!("{tag}: \"{v}\""));
            }
        }
    }

    if let Some(described_by) = el.get_attribute("aria-describedby") {
        if let Some(desc) = page.root.find_by_id(described_by) {
            let text = desc.inner_text();
            if !text.is_empty() {
                clues.push(format!("ARIA Description: \"{text}\""));
            }
        }
    }

    clues.extend(nearby_text(el, prior_siblings, ancestors));

    let field_type = el.input_type();
    clues.push(format!("Type: {field_type}"));
    if el.attributes.contains_key("required") {
        clues.push("Required: true".to_string());
    }

    if el.is_tag("select") {
        let options: Vec<String> = el
            .options()
            .iter()
            .map(|o| o.option_text())
            .filter(|t| !t.is_empty())
            .take(10)
            .collect();
        if !options.is_empty() {
            clues.push(format!("Available options: [{}]", quote_list(&options)));
        }
    } else if field_type == "checkbox" {
        clues.push("Type: checkbox (expects true/false)".to_string());
        if el.checked {
            clues.push("Currently checked: true".to_string());
        }
    } else if field_type == "radio" {
        clues.push("Type: radio button (expects true/false)".to_string());
        if let Some(name) = el.name() {
            let group: Vec<String> = page
                .radio_group(name)
                .iter()
                .map(|r| {
                    r.get_attribute("value")
                        .or_else(|| r.id())
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string())
                })
                .take(5)
                .collect();
            if group.len() > 1 {
                clues.push(format!("Radio group options: [{}]", quote_list(&group)));
            }
        }
    }

    if clues.is_empty() {
        "Unknown field".to_string()
    } else {
        clues.join("; ")
    }
}

/// Up to three nearby-text snippets: preceding-sibling text first, then
/// section headings found in the closest ancestor containers.
fn nearby_text(
    _el: &ElementNode,
    prior_siblings: &[ElementNode],
    ancestors: &[&ElementNode],
) -> Vec<String> {
    let mut nearby = Vec::new();

    for prev in prior_siblings.iter().rev().take(3) {
        let text = prev.inner_text();
        if text.len() > 2 && text.len() < 100 {
            nearby.push(format!("Before: \"{text}\""));
        }
    }

    for parent in ancestors.iter().rev().take(3) {
        collect_headings(parent, &mut nearby);
    }

    nearby.truncate(3);
    nearby
}

fn collect_headings(node: &ElementNode, out: &mut Vec<String>) {
    for child in &node.children {
        let is_heading = matches!(
            child.tag_name.to_ascii_lowercase().as_str(),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "legend"
        ) || child.has_class("section-title")
            || child.has_class("form-section");
        if is_heading {
            let text = child.inner_text();
            if !text.is_empty() && text.len() < 50 {
                out.push(format!("Section: \"{text}\""));
            }
        }
        collect_headings(child, out);
    }
}

/// Labels for a field: `label[for=id]` matches anywhere in the document, and
/// an enclosing `<label>` counts as implicit association.
fn associated_labels<'a>(
    page: &'a PageSnapshot,
    el: &ElementNode,
    ancestors: &[&'a ElementNode],
) -> Vec<&'a ElementNode> {
    let mut labels = Vec::new();
    if let Some(id) = el.id() {
        if !id.is_empty() {
            collect_labels_for(&page.root, id, &mut labels);
        }
    }
    for ancestor in ancestors.iter().rev() {
        if ancestor.is_tag("label") && !labels.iter().any(|l| std::ptr::eq(*l, *ancestor)) {
            labels.push(*ancestor);
        }
    }
    labels
}

fn collect_labels_for<'a>(node: &'a ElementNode, id: &str, out: &mut Vec<&'a ElementNode>) {
    if node.is_tag("label") && node.get_attribute("for").map(String::as_str) == Some(id) {
        out.push(node);
    }
    for child in &node.children {
        collect_labels_for(child, id, out);
    }
}

fn quote_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("\"{i}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Collect submitted-style form data from a form subtree: `name` (falling
/// back to `id`) mapped to the trimmed current value, first write wins.
/// Unchecked checkboxes and radios contribute nothing, matching form
/// submission semantics.
pub fn extract_form_data(form: &ElementNode) -> IndexMap<String, String> {
    let mut data = IndexMap::new();
    collect_form_data(form, &mut data);
    data
}

fn collect_form_data(node: &ElementNode, data: &mut IndexMap<String, String>) {
    for child in &node.children {
        if child.is_fillable() {
            let key = child
                .name()
                .or_else(|| child.id())
                .filter(|k| !k.is_empty());
            if let Some(key) = key {
                if let Some(value) = field_value(child) {
                    let value = value.trim().to_string();
                    if !value.is_empty() && !data.contains_key(key.as_str()) {
                        data.insert(key.clone(), value);
                    }
                }
            }
        }
        collect_form_data(child, data);
    }
}

fn field_value(el: &ElementNode) -> Option<String> {
    if el.is_tag("select") {
        return el
            .options()
            .iter()
            .find(|o| o.selected)
            .map(|o| o.option_value());
    }
    match el.input_type().as_str() {
        "checkbox" | "radio" => {
            if el.checked {
                Some(
                    el.get_attribute("value")
                        .cloned()
                        .unwrap_or_else(|| "on".to_string()),
                )
            } else {
                None
            }
        }
        _ => el.value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::PageSnapshot;

    fn page_with(children: Vec<ElementNode>) -> PageSnapshot {
        let mut form = ElementNode::new("form");
        for c in children {
            form.add_child(c);
        }
        let mut root = ElementNode::new("body");
        root.add_child(form);
        PageSnapshot::new("https://example.com", "Test", root)
    }

    #[test]
    fn test_unique_selector_prefers_id() {
        let mut el = ElementNode::new("input");
        el.add_attribute("id", "user.email");
        el.add_attribute("name", "email");
        assert_eq!(unique_selector(&el, &[]), "#user\\.email");
    }

    #[test]
    fn test_unique_selector_name_fallback() {
        let mut el = ElementNode::new("input");
        el.add_attribute("name", "firstName");
        assert_eq!(unique_selector(&el, &[]), "input[name=\"firstName\"]");
    }

    #[test]
    fn test_unique_selector_nth_counts_matching_siblings() {
        let mut text1 = ElementNode::new("input");
        text1.add_attribute("type", "text");
        let mut radio = ElementNode::new("input");
        radio.add_attribute("type", "radio");
        let mut el = ElementNode::new("input");
        el.add_attribute("type", "text");

        assert_eq!(
            unique_selector(&el, &[text1, radio]),
            "input[type=\"text\"]:nth-of-type(2)"
        );

        let bare = ElementNode::new("textarea");
        assert_eq!(unique_selector(&bare, &[]), "textarea:nth-of-type(1)");
    }

    #[test]
    fn test_id_selector_resolves_back() {
        let mut el = ElementNode::new("input");
        el.add_attribute("id", "user.email");
        let page = page_with(vec![el]);

        let fields = scan_fields(&page);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].selector, "#user\\.email");

        let path = page.resolve(&fields[0].selector).unwrap();
        assert_eq!(
            page.get(&path).unwrap().id(),
            Some(&"user.email".to_string())
        );
    }

    #[test]
    fn test_analyze_placeholder_only() {
        let mut el = ElementNode::new("input");
        el.add_attribute("placeholder", "Email");
        let page = page_with(vec![el]);

        let fields = scan_fields(&page);
        assert_eq!(fields[0].description, "Placeholder: \"Email\"; Type: text");
    }

    #[test]
    fn test_analyze_no_clues_is_unknown() {
        // An element with literally no clue would still carry a Type marker,
        // so "Unknown field" only appears when the clue list ends up empty.
        let page = page_with(vec![]);
        let bare = ElementNode::new("span");
        let desc = analyze_field(&page, &bare, &[], &[]);
        assert_eq!(desc, "Type: span");
    }

    #[test]
    fn test_analyze_label_and_attributes() {
        let mut label = ElementNode::new("label");
        label.add_attribute("for", "fname");
        label.text_content = Some("First name".to_string());

        let mut el = ElementNode::new("input");
        el.add_attribute("id", "fname");
        el.add_attribute("name", "firstName");
        el.add_attribute("required", "");

        let page = page_with(vec![label, el]);
        let fields = scan_fields(&page);
        let desc = &fields[0].description;

        assert!(desc.starts_with("Label: \"First name\""));
        assert!(desc.contains("Name: \"firstName\""));
        assert!(desc.contains("ID: \"fname\""));
        assert!(desc.contains("Type: text"));
        assert!(desc.contains("Required: true"));
    }

    #[test]
    fn test_analyze_select_options() {
        let mut select = ElementNode::new("select");
        select.add_attribute("name", "degree");
        for text in ["", "Bachelor's Degree", "Master's Degree"] {
            select.add_child(ElementNode::new("option").with_text(text));
        }
        let page = page_with(vec![select]);
        let fields = scan_fields(&page);

        assert!(fields[0].description.contains(
            "Available options: [\"Bachelor's Degree\", \"Master's Degree\"]"
        ));
        assert!(fields[0].description.contains("Type: select"));
    }

    #[test]
    fn test_analyze_checkbox_state() {
        let mut checked = ElementNode::new("input");
        checked.add_attribute("type", "checkbox");
        checked.checked = true;
        let page = page_with(vec![checked]);

        let desc = &scan_fields(&page)[0].description;
        assert!(desc.contains("Type: checkbox (expects true/false)"));
        assert!(desc.contains("Currently checked: true"));
    }

    #[test]
    fn test_analyze_radio_group() {
        let mut yes = ElementNode::new("input");
        yes.add_attribute("type", "radio");
        yes.add_attribute("name", "authorized");
        yes.add_attribute("value", "yes");
        let mut no = ElementNode::new("input");
        no.add_attribute("type", "radio");
        no.add_attribute("name", "authorized");
        no.add_attribute("value", "no");
        let page = page_with(vec![yes, no]);

        let desc = &scan_fields(&page)[0].description;
        assert!(desc.contains("Type: radio button (expects true/false)"));
        assert!(desc.contains("Radio group options: [\"yes\", \"no\"]"));
    }

    #[test]
    fn test_nearby_text_and_sections() {
        let mut heading = ElementNode::new("h2");
        heading.text_content = Some("Contact details".to_string());
        let mut hint = ElementNode::new("p");
        hint.text_content = Some("Where can we reach you?".to_string());
        let el = ElementNode::new("input");

        let page = page_with(vec![heading, hint, el]);
        let desc = &scan_fields(&page)[0].description;

        assert!(desc.contains("Before: \"Where can we reach you?\""));
        assert!(desc.contains("Section: \"Contact details\""));
    }

    #[test]
    fn test_scan_skips_hidden_fields() {
        let mut hidden_type = ElementNode::new("input");
        hidden_type.add_attribute("type", "hidden");
        let mut styled_out = ElementNode::new("input");
        styled_out.add_attribute("style", "display:none");
        let invisible = ElementNode::new("input").with_visibility(false);
        let visible = ElementNode::new("input");

        let page = page_with(vec![hidden_type, styled_out, invisible, visible]);
        assert_eq!(scan_fields(&page).len(), 1);
    }

    #[test]
    fn test_extract_form_data() {
        let mut name = ElementNode::new("input");
        name.add_attribute("name", "fullName");
        name.value = Some("  Ada Lovelace ".to_string());

        let mut agreed = ElementNode::new("input");
        agreed.add_attribute("type", "checkbox");
        agreed.add_attribute("name", "agree");
        agreed.checked = true;

        let mut unchecked = ElementNode::new("input");
        unchecked.add_attribute("type", "checkbox");
        unchecked.add_attribute("name", "newsletter");

        let mut country = ElementNode::new("select");
        country.add_attribute("name", "country");
        let mut uk = ElementNode::new("option").with_text("United Kingdom");
        uk.add_attribute("value", "UK");
        uk.selected = true;
        country.add_child(uk);

        let mut form = ElementNode::new("form");
        for el in [name, agreed, unchecked, country] {
            form.add_child(el);
        }

        let data = extract_form_data(&form);
        assert_eq!(data.get("fullName"), Some(&"Ada Lovelace".to_string()));
        assert_eq!(data.get("agree"), Some(&"on".to_string()));
        assert_eq!(data.get("country"), Some(&"UK".to_string()));
        assert!(!data.contains_key("newsletter"));
    }
}
