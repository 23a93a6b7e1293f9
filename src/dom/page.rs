use crate::dom::element::ElementNode;
use crate::dom::selector::Selector;
use crate::error::{FormfillError, Result};
use serde::{Deserialize, Serialize};

/// Path of child indices from the snapshot root to an element.
pub type NodePath = Vec<usize>;

/// A captured page: URL, title, and the element tree rooted at `body`.
///
/// This is the unit of exchange with whatever captured the page; it carries
/// everything the scanner and fill applier need, serialized as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageSnapshot {
    pub url: String,
    pub title: String,
    pub root: ElementNode,
}

impl PageSnapshot {
    /// Create a new snapshot
    pub fn new(url: impl Into<String>, title: impl Into<String>, root: ElementNode) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            root,
        }
    }

    /// Parse a snapshot from its JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| FormfillError::SnapshotParse(e.to_string()))
    }

    /// Serialize the snapshot to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Get an element by path
    pub fn get(&self, path: &[usize]) -> Option<&ElementNode> {
        let mut node = &self.root;
        for &i in path {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    /// Get a mutable element by path
    pub fn get_mut(&mut self, path: &[usize]) -> Option<&mut ElementNode> {
        let mut node = &mut self.root;
        for &i in path {
            node = node.children.get_mut(i)?;
        }
        Some(node)
    }

    /// Resolve a selector string to the first matching element in document
    /// order. Unsupported selector shapes resolve to nothing.
    pub fn resolve(&self, selector: &str) -> Option<NodePath> {
        let selector = Selector::parse(selector)?;
        if selector.matches(&self.root, &[]) {
            return Some(Vec::new());
        }
        let mut path = Vec::new();
        if Self::resolve_in(&self.root, &selector, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn resolve_in(parent: &ElementNode, selector: &Selector, path: &mut NodePath) -> bool {
        for (i, child) in parent.children.iter().enumerate() {
            if selector.matches(child, &parent.children[..i]) {
                path.push(i);
                return true;
            }
            path.push(i);
            if Self::resolve_in(child, selector, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    /// Count all elements in the tree
    pub fn count_elements(&self) -> usize {
        fn count(node: &ElementNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        count(&self.root)
    }

    /// Collect all radio inputs sharing the given name group, in document
    /// order.
    pub fn radio_group(&self, name: &str) -> Vec<&ElementNode> {
        let mut out = Vec::new();
        fn walk<'a>(node: &'a ElementNode, name: &str, out: &mut Vec<&'a ElementNode>) {
            if node.is_tag("input")
                && node.input_type() == "radio"
                && node.name().map(String::as_str) == Some(name)
            {
                out.push(node);
            }
            for child in &node.children {
                walk(child, name, out);
            }
        }
        walk(&self.root, name, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_snapshot() -> PageSnapshot {
        let mut form = ElementNode::new("form");

        let mut email = ElementNode::new("input");
        email.add_attribute("id", "email");
        email.add_attribute("type", "email");
        form.add_child(email);

        let mut first = ElementNode::new("input");
        first.add_attribute("name", "firstName");
        form.add_child(first);

        let mut anon1 = ElementNode::new("input");
        anon1.add_attribute("type", "text");
        form.add_child(anon1);

        let mut anon2 = ElementNode::new("input");
        anon2.add_attribute("type", "text");
        form.add_child(anon2);

        let mut root = ElementNode::new("body");
        root.add_child(form);
        PageSnapshot::new("https://example.com/apply", "Apply", root)
    }

    #[test]
    fn test_resolve_by_id() {
        let page = form_snapshot();
        let path = page.resolve("#email").unwrap();
        let el = page.get(&path).unwrap();
        assert_eq!(el.id(), Some(&"email".to_string()));
    }

    #[test]
    fn test_resolve_by_name() {
        let page = form_snapshot();
        let path = page.resolve("input[name=\"firstName\"]").unwrap();
        assert_eq!(
            page.get(&path).unwrap().name(),
            Some(&"firstName".to_string())
        );
    }

    #[test]
    fn test_resolve_nth_of_type() {
        let page = form_snapshot();
        let path = page.resolve("input[type=\"text\"]:nth-of-type(2)").unwrap();
        // The second anonymous text input, i.e. the fourth child of the form.
        assert_eq!(path, vec![0, 3]);
    }

    #[test]
    fn test_resolve_unsupported_or_missing() {
        let page = form_snapshot();
        assert!(page.resolve("#missing").is_none());
        assert!(page.resolve("div > input").is_none());
    }

    #[test]
    fn test_get_mut_roundtrip() {
        let mut page = form_snapshot();
        let path = page.resolve("#email").unwrap();
        page.get_mut(&path).unwrap().value = Some("a@b.c".to_string());
        assert_eq!(
            page.get(&path).unwrap().value,
            Some("a@b.c".to_string())
        );
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let page = form_snapshot();
        let json = page.to_json().unwrap();
        let parsed = PageSnapshot::from_json(&json).unwrap();
        assert_eq!(page, parsed);
    }

    #[test]
    fn test_snapshot_parse_error() {
        let err = PageSnapshot::from_json("not json").unwrap_err();
        assert!(err.to_string().contains("snapshot"));
    }

    #[test]
    fn test_radio_group() {
        let mut root = ElementNode::new("body");
        for value in ["yes", "no"] {
            let mut radio = ElementNode::new("input");
            radio.add_attribute("type", "radio");
            radio.add_attribute("name", "authorized");
            radio.add_attribute("value", value);
            root.add_child(radio);
        }
        let page = PageSnapshot::new("", "", root);
        let group = page.radio_group("authorized");
        assert_eq!(group.len(), 2);
        assert_eq!(group[0].get_attribute("value"), Some(&"yes".to_string()));
    }
}
