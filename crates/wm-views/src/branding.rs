//! Editor branding of combined markup.
//!
//! Branding lets a downstream editor trace each rendered element back to the
//! view that contributed it. Combination marks elements with their source
//! view id; [`EditorBranding`] then fills in the remaining markers.

use std::collections::HashMap;

use wm_storage::VIEW_MODEL;

use crate::arch::Node;
use crate::combine::SOURCE_ATTR;

const MODEL_ATTR: &str = "data-oe-model";
const FIELD_ATTR: &str = "data-oe-field";
const XPATH_ATTR: &str = "data-oe-xpath";

/// Attaches editing-identity markers to a combined tree.
pub trait Branding: Send + Sync {
    /// Distribute markers over `root`. Running it twice on the same tree
    /// changes nothing the second time.
    fn distribute(&self, root: &mut Node);
}

/// [`Branding`] producing `data-oe-model`, `data-oe-id`, `data-oe-field` and
/// `data-oe-xpath` on every element with a known source.
///
/// Virtual `<t>` elements are never branded; their source marker is passed
/// on to their children and removed.
#[derive(Debug, Default)]
pub struct EditorBranding;

impl Branding for EditorBranding {
    fn distribute(&self, root: &mut Node) {
        let path = format!("/{}[1]", root.tag);
        brand(root, None, &path);
    }
}

fn brand(node: &mut Node, inherited: Option<&str>, path: &str) {
    if node.has(XPATH_ATTR) {
        return;
    }

    let source = node
        .get(SOURCE_ATTR)
        .or(inherited)
        .map(str::to_owned);

    if node.tag == "t" {
        node.remove(SOURCE_ATTR);
    } else if let Some(source) = &source {
        set_missing(node, MODEL_ATTR, VIEW_MODEL);
        set_missing(node, SOURCE_ATTR, source);
        set_missing(node, FIELD_ATTR, "arch");
        node.set(XPATH_ATTR, path);
    }

    // Positions count siblings sharing a tag and a source view.
    let mut seen: HashMap<(String, Option<String>), usize> = HashMap::new();
    for child in &mut node.children {
        let child_source = child
            .get(SOURCE_ATTR)
            .or(source.as_deref())
            .map(str::to_owned);
        let restart = child_source != source;
        let index = seen
            .entry((child.tag.clone(), child_source))
            .or_insert(0);
        *index += 1;

        let child_path = if restart {
            format!("/{}[{index}]", child.tag)
        } else {
            format!("{path}/{}[{index}]", child.tag)
        };
        brand(child, source.as_deref(), &child_path);
    }
}

fn set_missing(node: &mut Node, name: &str, value: &str) {
    if !node.has(name) {
        node.set(name, value);
    }
}
