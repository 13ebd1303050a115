//! Translation of combined markup.

use wm_storage::Records;

use crate::arch::Node;

/// Attributes whose values are user-visible and translated.
const TRANSLATABLE_ATTRS: &[&str] = &["title", "alt", "label", "placeholder"];

/// Substitutes translated terms into a markup tree.
pub trait Translator: Send + Sync {
    /// Translate `root` in place into `lang`.
    fn translate(&self, records: &dyn Records, root: &mut Node, lang: &str);
}

/// [`Translator`] backed by the store's `(lang, term)` records.
///
/// Text is matched on its trimmed form; surrounding whitespace is kept.
/// Subtrees marked `t-translation="off"` are left untouched.
#[derive(Debug, Default)]
pub struct TermTranslator;

impl Translator for TermTranslator {
    fn translate(&self, records: &dyn Records, root: &mut Node, lang: &str) {
        let lookup = |term: &str| records.translation(lang, term);
        translate_node(root, &lookup);
        if let Some(tail) = translate_term(&root.tail, &lookup) {
            root.tail = tail;
        }
    }
}

fn translate_node<'a>(node: &mut Node, lookup: &dyn Fn(&str) -> Option<&'a str>) {
    if node.get("t-translation") == Some("off") {
        return;
    }

    if let Some(text) = translate_term(&node.text, lookup) {
        node.text = text;
    }
    for (name, value) in &mut node.attrs {
        if TRANSLATABLE_ATTRS.contains(&name.as_str())
            && let Some(translated) = translate_term(value, lookup)
        {
            *value = translated;
        }
    }
    for child in &mut node.children {
        translate_node(child, lookup);
        if let Some(tail) = translate_term(&child.tail, lookup) {
            child.tail = tail;
        }
    }
}

fn translate_term<'a>(value: &str, lookup: &dyn Fn(&str) -> Option<&'a str>) -> Option<String> {
    let term = value.trim();
    if term.is_empty() {
        return None;
    }
    let translated = lookup(term)?;
    let start = value.len() - value.trim_start().len();
    let end = value.trim_end().len();
    Some(format!("{}{translated}{}", &value[..start], &value[end..]))
}
