//! Schema grammar for legacy structured views.

use std::cmp::Ordering;

use crate::arch::Node;

/// Grammar check run on structured view documents older than the
/// configured version threshold.
pub trait SchemaGrammar: Send + Sync {
    /// One message per grammar violation in `doc`. Empty when valid.
    fn validate(&self, doc: &Node) -> Vec<String>;
}

const FORM_ELEMENTS: &[&str] = &[
    "field", "group", "notebook", "page", "label", "separator", "button", "newline", "header",
    "sheet", "footer", "div", "span", "p", "h1", "h2", "h3", "img", "a", "br", "hr",
];
const TREE_ELEMENTS: &[&str] = &["field", "button", "groupby", "header"];
const SEARCH_ELEMENTS: &[&str] = &["field", "filter", "group", "separator", "newline"];

/// Fixed per-root grammar: every element below a `form`, `tree` or `search`
/// root must be one of that root's allowed names. Subviews embedded in a
/// `<field>` are not checked.
#[derive(Debug, Default)]
pub struct LegacyViewGrammar;

impl SchemaGrammar for LegacyViewGrammar {
    fn validate(&self, doc: &Node) -> Vec<String> {
        let allowed = match doc.tag.as_str() {
            "form" => FORM_ELEMENTS,
            "tree" => TREE_ELEMENTS,
            "search" => SEARCH_ELEMENTS,
            other => return vec![format!("Element <{other}> is not a valid view root")],
        };
        let mut errors = Vec::new();
        check_children(doc, allowed, &mut errors);
        errors
    }
}

fn check_children(node: &Node, allowed: &[&str], errors: &mut Vec<String>) {
    for child in &node.children {
        if !allowed.contains(&child.tag.as_str()) {
            errors.push(format!(
                "Element <{}> is not allowed in <{}>",
                child.tag, node.tag
            ));
        }
        if child.tag != "field" {
            check_children(child, allowed, errors);
        }
    }
}

/// Dotted numeric version (`"6.1"`, `"7.0"`). Trailing zero components do
/// not affect ordering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchVersion(Vec<u32>);

impl ArchVersion {
    #[must_use]
    pub fn from_parts(parts: impl Into<Vec<u32>>) -> Self {
        let mut parts = parts.into();
        while parts.last() == Some(&0) {
            parts.pop();
        }
        Self(parts)
    }

    /// Parse a dotted version. `None` if any component is not a number.
    #[must_use]
    pub fn parse(version: &str) -> Option<Self> {
        version
            .trim()
            .split('.')
            .map(|part| part.parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()
            .map(Self::from_parts)
    }
}

impl PartialOrd for ArchVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ArchVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}
