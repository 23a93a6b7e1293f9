//! DOM snapshot model
//!
//! Page snapshots arrive as JSON from whatever captured the page and are the
//! substrate the scanner and fill applier work on. This module provides:
//! - ElementNode: a DOM element with live form state
//! - PageSnapshot: URL, title, and the element tree, with selector resolution
//! - Selector: the scanner's selector shapes (parse, match, render)

pub mod element;
pub mod page;
pub mod selector;

pub use element::ElementNode;
pub use page::{NodePath, PageSnapshot};
pub use selector::{escape_id, Selector};
