use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_visible() -> bool {
    true
}

/// A DOM element node from a page snapshot.
///
/// Snapshots are produced outside this crate (by whatever captured the page)
/// and carry a small amount of live form state alongside the static markup:
/// the current input value, checked state, and option selection. Visibility is
/// captured at snapshot time; elements without a flag are treated as visible.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// HTML tag name (e.g., "input", "select", "label")
    pub tag_name: String,

    /// Element attributes (id, name, type, placeholder, aria-*, ...)
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Direct text content of the element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Child elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,

    /// Current value of the control (inputs, textareas)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Checked state (checkboxes, radios)
    #[serde(default)]
    pub checked: bool,

    /// Selection state (option elements)
    #[serde(default)]
    pub selected: bool,

    /// Computed visibility captured at snapshot time
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

impl ElementNode {
    /// Create a new ElementNode
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: HashMap::new(),
            text_content: None,
            children: Vec::new(),
            value: None,
            checked: false,
            selected: false,
            is_visible: true,
        }
    }

    /// Builder method: set attributes
    pub fn with_attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self
    }

    /// Builder method: set the current control value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Builder method: set checked state
    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// Builder method: set visibility
    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.is_visible = visible;
        self
    }

    /// Add a single attribute
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Add a child element
    pub fn add_child(&mut self, child: ElementNode) {
        self.children.push(child);
    }

    /// Get attribute value by key
    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    /// Get element ID
    pub fn id(&self) -> Option<&String> {
        self.attributes.get("id")
    }

    /// Get the `name` attribute
    pub fn name(&self) -> Option<&String> {
        self.attributes.get("name")
    }

    /// Check if element has a specific class
    pub fn has_class(&self, class_name: &str) -> bool {
        if let Some(classes) = self.attributes.get("class") {
            classes.split_whitespace().any(|c| c == class_name)
        } else {
            false
        }
    }

    /// Check if element is a specific tag (case-insensitive)
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// The effective input type: the `type` attribute when present, `text`
    /// for bare inputs, the tag name for textareas and selects.
    pub fn input_type(&self) -> String {
        if let Some(t) = self.get_attribute("type") {
            return t.to_ascii_lowercase();
        }
        if self.is_tag("input") {
            "text".to_string()
        } else {
            self.tag_name.to_ascii_lowercase()
        }
    }

    /// Whether this element is a fillable form control: inputs other than
    /// hidden/submit/button/image, plus textareas and selects.
    pub fn is_fillable(&self) -> bool {
        if self.is_tag("textarea") || self.is_tag("select") {
            return true;
        }
        if !self.is_tag("input") {
            return false;
        }
        !matches!(
            self.input_type().as_str(),
            "hidden" | "submit" | "button" | "image"
        )
    }

    /// Whether an inline `style` attribute hides the element
    /// (display:none, visibility:hidden, or opacity:0).
    pub fn is_hidden_by_style(&self) -> bool {
        let Some(style) = self.get_attribute("style") else {
            return false;
        };
        for declaration in style.split(';') {
            let Some((prop, val)) = declaration.split_once(':') else {
                continue;
            };
            let prop = prop.trim().to_ascii_lowercase();
            let val = val.trim().to_ascii_lowercase();
            let hidden = match prop.as_str() {
                "display" => val == "none",
                "visibility" => val == "hidden",
                "opacity" => val == "0" || val == "0.0",
                _ => false,
            };
            if hidden {
                return true;
            }
        }
        false
    }

    /// Concatenated, whitespace-normalized text of this element and its
    /// descendants (the snapshot analog of `innerText`).
    pub fn inner_text(&self) -> String {
        let mut parts = Vec::new();
        self.collect_text(&mut parts);
        parts
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn collect_text(&self, parts: &mut Vec<String>) {
        if let Some(text) = &self.text_content {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }
        for child in &self.children {
            child.collect_text(parts);
        }
    }

    /// Find a descendant by id (depth-first)
    pub fn find_by_id(&self, id: &str) -> Option<&ElementNode> {
        if self.id().map(String::as_str) == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_id(id))
    }

    /// The text shown for an `<option>`: its inner text, falling back to the
    /// `value` attribute.
    pub fn option_text(&self) -> String {
        let text = self.inner_text();
        if text.is_empty() {
            self.get_attribute("value").cloned().unwrap_or_default()
        } else {
            text
        }
    }

    /// The submission value of an `<option>`: the `value` attribute, falling
    /// back to its text.
    pub fn option_value(&self) -> String {
        self.get_attribute("value")
            .cloned()
            .unwrap_or_else(|| self.inner_text())
    }

    /// `<option>` children of a select, including those nested one level
    /// inside `<optgroup>`.
    pub fn options(&self) -> Vec<&ElementNode> {
        let mut out = Vec::new();
        for child in &self.children {
            if child.is_tag("option") {
                out.push(child);
            } else if child.is_tag("optgroup") {
                out.extend(child.children.iter().filter(|c| c.is_tag("option")));
            }
        }
        out
    }

    /// Index of the currently selected option, if any.
    pub fn selected_index(&self) -> Option<usize> {
        self.options().iter().position(|o| o.selected)
    }
}
