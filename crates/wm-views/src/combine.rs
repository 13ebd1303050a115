//! View combination: applies inheriting fragments to a root view.
//!
//! A fragment arch is either a single spec element or a `<data>` element
//! holding several specs. Each spec locates one target element in the
//! combined tree and patches it according to its `position`:
//!
//! | position     | effect                                               |
//! |--------------|------------------------------------------------------|
//! | `inside`     | append the spec's content to the target (default)    |
//! | `after`      | insert the content after the target                  |
//! | `before`     | insert the content before the target                 |
//! | `replace`    | replace the target with the content                  |
//! | `attributes` | set or remove attributes from `<attribute>` children |
//!
//! Targets are located by `<xpath expr="//tag">`, `<xpath
//! expr="//tag[@attr='value']">`, or by any other element matched on tag and
//! attributes.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use wm_storage::{Records, ViewId};

use crate::arch::{self, ArchError, Node};
use crate::overrides::applicable_fragments;
use crate::scope::Scope;

/// Branding attribute naming the view an element comes from.
pub(crate) const SOURCE_ATTR: &str = "data-oe-id";

static XPATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^//([A-Za-z_][\w.:-]*)(?:\[@([A-Za-z_][\w.:-]*)=(?:'([^']*)'|"([^"]*)")\])?$"#)
        .expect("invalid xpath regex")
});

/// Error combining a view with its fragments.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CombineError {
    #[error("View {0} does not exist")]
    ViewNotFound(ViewId),

    #[error("Inheritance cycle through view {0}")]
    Cycle(ViewId),

    #[error("Invalid arch in view {view_id}: {source}")]
    Arch {
        view_id: ViewId,
        #[source]
        source: ArchError,
    },

    #[error("Element {spec} cannot be located in parent view (from view {view_id})")]
    ElementNotFound { view_id: ViewId, spec: String },

    #[error("Invalid position {position:?} in view {view_id}")]
    InvalidPosition { view_id: ViewId, position: String },

    #[error("Unsupported xpath {expr:?} in view {view_id}")]
    UnsupportedXpath { view_id: ViewId, expr: String },

    #[error("View {view_id} cannot apply position {position:?} to the root element")]
    InvalidRootTarget { view_id: ViewId, position: String },

    #[error("Invalid <attribute> spec in view {view_id}: missing name")]
    InvalidAttributeSpec { view_id: ViewId },
}

/// Combined markup of `view_id` with every applicable fragment.
///
/// Walks `inherit_id` up to the root view, then applies fragments level by
/// level, each level filtered for `scope.website_id`. With
/// `scope.inherit_branding`, each element is tagged with the id of the view
/// that contributed it.
pub fn read_combined(
    records: &dyn Records,
    view_id: ViewId,
    scope: &Scope,
) -> Result<Node, CombineError> {
    let root = root_view(records, view_id)?;
    let view = records
        .view(root)
        .ok_or(CombineError::ViewNotFound(root))?;

    let mut tree = parse_view(root, &view.arch)?;
    if scope.inherit_branding {
        mark_source(&mut tree, root);
    }

    let mut visited = HashSet::from([root]);
    apply_inheriting(
        records,
        root,
        view.model.as_deref(),
        scope,
        &mut tree,
        &mut visited,
    )?;
    Ok(tree)
}

pub(crate) fn root_view(records: &dyn Records, view_id: ViewId) -> Result<ViewId, CombineError> {
    let mut seen = HashSet::new();
    let mut current = view_id;
    loop {
        if !seen.insert(current) {
            return Err(CombineError::Cycle(current));
        }
        let view = records
            .view(current)
            .ok_or(CombineError::ViewNotFound(current))?;
        match view.inherit_id {
            Some(parent) => current = parent,
            None => return Ok(current),
        }
    }
}

fn parse_view(view_id: ViewId, arch: &str) -> Result<Node, CombineError> {
    arch::parse(arch).map_err(|source| CombineError::Arch { view_id, source })
}

fn apply_inheriting(
    records: &dyn Records,
    parent: ViewId,
    model: Option<&str>,
    scope: &Scope,
    tree: &mut Node,
    visited: &mut HashSet<ViewId>,
) -> Result<(), CombineError> {
    for fragment in applicable_fragments(records, parent, model, scope) {
        if !visited.insert(fragment.view_id) {
            return Err(CombineError::Cycle(fragment.view_id));
        }
        let mut specs = parse_view(fragment.view_id, &fragment.arch)?;
        if scope.inherit_branding {
            for content in specs.children.iter_mut() {
                mark_source(content, fragment.view_id);
            }
        }
        apply_specs(tree, &specs, fragment.view_id)?;
        tracing::trace!(parent = %parent, fragment = %fragment.view_id, "Applied fragment");
        apply_inheriting(records, fragment.view_id, model, scope, tree, visited)?;
    }
    Ok(())
}

fn mark_source(node: &mut Node, view_id: ViewId) {
    if !node.has(SOURCE_ATTR) {
        node.set(SOURCE_ATTR, view_id.to_string());
    }
    for child in &mut node.children {
        mark_source(child, view_id);
    }
}

/// Apply a fragment arch (a spec or a `<data>` of specs) to `tree`.
pub(crate) fn apply_specs(tree: &mut Node, specs: &Node, view_id: ViewId) -> Result<(), CombineError> {
    if specs.tag == "data" {
        for spec in &specs.children {
            apply_spec(tree, spec, view_id)?;
        }
        Ok(())
    } else {
        apply_spec(tree, specs, view_id)
    }
}

fn apply_spec(tree: &mut Node, spec: &Node, view_id: ViewId) -> Result<(), CombineError> {
    let path = locate(tree, spec, view_id)?.ok_or_else(|| CombineError::ElementNotFound {
        view_id,
        spec: describe(spec),
    })?;
    let position = spec.get("position").map_or("inside", str::trim);

    match position {
        "inside" => {
            let target = node_at(tree, &path);
            target.append_text(&spec.text);
            target.children.extend(content(spec));
            Ok(())
        }
        "attributes" => {
            let target = node_at(tree, &path);
            for attribute in spec.children.iter().filter(|c| c.tag == "attribute") {
                let name = attribute
                    .get("name")
                    .ok_or(CombineError::InvalidAttributeSpec { view_id })?;
                if attribute.text.is_empty() {
                    target.remove(name);
                } else {
                    target.set(name, attribute.text.clone());
                }
            }
            Ok(())
        }
        "after" | "before" | "replace" => {
            let Some((&index, parent_path)) = path.split_last() else {
                return replace_root(tree, spec, view_id, position);
            };
            let parent = node_at(tree, parent_path);
            match position {
                "after" => insert_after(parent, index, spec),
                "before" => insert_before(parent, index, spec),
                _ => {
                    let removed = parent.children.remove(index);
                    insert_before(parent, index, spec);
                    let inserted = spec.children.len();
                    restore_tail(parent, index + inserted, &removed.tail);
                }
            }
            Ok(())
        }
        other => Err(CombineError::InvalidPosition {
            view_id,
            position: other.to_owned(),
        }),
    }
}

/// Spec content with tails intact, ready for insertion.
fn content(spec: &Node) -> impl Iterator<Item = Node> + '_ {
    spec.children.iter().cloned()
}

fn insert_after(parent: &mut Node, index: usize, spec: &Node) {
    let target = &mut parent.children[index];
    let moved_tail = std::mem::take(&mut target.tail);
    target.tail.push_str(&spec.text);
    let at = index + 1;
    parent.children.splice(at..at, content(spec));
    restore_tail(parent, at + spec.children.len(), &moved_tail);
}

fn insert_before(parent: &mut Node, index: usize, spec: &Node) {
    match index.checked_sub(1) {
        Some(previous) => parent.children[previous].tail.push_str(&spec.text),
        None => parent.text.push_str(&spec.text),
    }
    parent.children.splice(index..index, content(spec));
}

/// Put `tail` back right before the child at `next`.
fn restore_tail(parent: &mut Node, next: usize, tail: &str) {
    match next.checked_sub(1) {
        Some(previous) => parent.children[previous].tail.push_str(tail),
        None => parent.text.push_str(tail),
    }
}

fn replace_root(
    tree: &mut Node,
    spec: &Node,
    view_id: ViewId,
    position: &str,
) -> Result<(), CombineError> {
    match (position, spec.children.as_slice()) {
        ("replace", [replacement]) => {
            let mut replacement = replacement.clone();
            replacement.tail.clear();
            *tree = replacement;
            Ok(())
        }
        _ => Err(CombineError::InvalidRootTarget {
            view_id,
            position: position.to_owned(),
        }),
    }
}

/// Path of child indices to the first element matching `spec`.
fn locate(tree: &Node, spec: &Node, view_id: ViewId) -> Result<Option<Vec<usize>>, CombineError> {
    if spec.tag == "xpath" {
        let expr = spec.get("expr").unwrap_or_default();
        let captures = XPATH_PATTERN
            .captures(expr)
            .ok_or_else(|| CombineError::UnsupportedXpath {
                view_id,
                expr: expr.to_owned(),
            })?;
        let tag = &captures[1];
        let filter = captures.get(2).map(|name| {
            let value = captures
                .get(3)
                .or_else(|| captures.get(4))
                .map_or("", |m| m.as_str());
            (name.as_str(), value)
        });
        Ok(find_path(tree, &|node: &Node| {
            node.tag == tag && filter.is_none_or(|(name, value)| node.get(name) == Some(value))
        }))
    } else {
        Ok(find_path(tree, &|node: &Node| {
            node.tag == spec.tag
                && spec
                    .attrs
                    .iter()
                    .filter(|(name, _)| name != "position" && name != SOURCE_ATTR)
                    .all(|(name, value)| node.get(name) == Some(value.as_str()))
        }))
    }
}

fn find_path(node: &Node, matches: &dyn Fn(&Node) -> bool) -> Option<Vec<usize>> {
    if matches(node) {
        return Some(Vec::new());
    }
    node.children.iter().enumerate().find_map(|(index, child)| {
        find_path(child, matches).map(|mut path| {
            path.insert(0, index);
            path
        })
    })
}

fn node_at<'a>(tree: &'a mut Node, path: &[usize]) -> &'a mut Node {
    path.iter().fold(tree, |node, &index| &mut node.children[index])
}

fn describe(spec: &Node) -> String {
    let mut head = Node::new(spec.tag.clone());
    head.attrs.clone_from(&spec.attrs);
    arch::serialize(&head)
}
