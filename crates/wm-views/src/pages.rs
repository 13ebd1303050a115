//! Page creation by copy-on-first-use of a shared template.

use std::sync::LazyLock;

use regex::Regex;
use wm_storage::{Transaction, ViewQuery, ViewUpdate, WebsiteFilter, WebsiteId};

use crate::error::ViewError;
use crate::resolver::global_view;

/// Maximum length of a generated page name.
pub const PAGE_NAME_MAX_LENGTH: usize = 50;

static NON_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("invalid slug regex"));

/// Turns a human-readable name into an identifier fragment.
pub trait Slugify: Send + Sync {
    /// Slug of `value`, at most `max_length` characters long.
    fn slugify(&self, value: &str, max_length: usize) -> String;
}

/// Lowercase ASCII slugs: runs of anything other than `a-z0-9` become `-`.
#[derive(Debug, Default)]
pub struct AsciiSlugify;

impl Slugify for AsciiSlugify {
    fn slugify(&self, value: &str, max_length: usize) -> String {
        let lowered = value.to_lowercase();
        let slug = NON_SLUG.replace_all(&lowered, "-");
        let slug = slug.trim_matches('-');
        // Only ASCII remains, so byte and char offsets agree.
        let truncated = &slug[..slug.len().min(max_length)];
        truncated.trim_end_matches('-').to_owned()
    }
}

/// Split `module.name`.
pub(crate) fn split_template(template: &str) -> Result<(&str, &str), ViewError> {
    match template.split_once('.') {
        Some((module, name)) if !module.is_empty() && !name.is_empty() => Ok((module, name)),
        _ => Err(ViewError::InvalidIdentifier(template.to_owned())),
    }
}

/// Ensure a page named `name` exists for `website`, copying `template` on
/// first use. Returns the page key.
pub(crate) fn ensure_page(
    txn: &mut dyn Transaction,
    slugify: &dyn Slugify,
    name: &str,
    template: &str,
    ispage: bool,
    website: Option<WebsiteId>,
) -> Result<String, ViewError> {
    let (module, _) = split_template(template)?;
    let page_name = slugify.slugify(name, PAGE_NAME_MAX_LENGTH);
    if page_name.is_empty() {
        return Err(ViewError::InvalidIdentifier(name.to_owned()));
    }
    let page_key = format!("{module}.{page_name}");

    let filter = website.map_or(WebsiteFilter::Shared, WebsiteFilter::OwnedOrShared);
    let existing = txn
        .records()
        .search_views(&ViewQuery::with_key(page_key.as_str()).website(filter).limit(1));
    if !existing.is_empty() {
        tracing::debug!(page_key = %page_key, "Page already exists");
        return Ok(page_key);
    }

    let template_id = global_view(txn.records(), template)?;
    let arch = txn
        .records()
        .view(template_id)
        .map(|view| view.arch.replace(template, &page_key))
        .ok_or_else(|| ViewError::NotFound(template.to_owned()))?;

    let update = ViewUpdate::default()
        .website(website)
        .key(Some(page_key.clone()))
        .arch(arch)
        .name(page_name)
        .page(ispage);
    let page_id = txn.copy_view(template_id, &update)?;
    tracing::info!(page_key = %page_key, page_id = %page_id, template, "Created page");
    Ok(page_key)
}
