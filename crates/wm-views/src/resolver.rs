//! Identifier resolver: template reference + website scope to view id.

use std::fmt;

use serde::Serialize;
use wm_storage::{Records, VIEW_MODEL, ViewId, ViewQuery, WebsiteFilter, WebsiteId};

use crate::error::ViewError;

/// Reference to a template: a concrete view id or a dotted key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TemplateRef {
    Id(ViewId),
    Key(String),
}

impl TemplateRef {
    /// Parse user input: all-digit input is a view id, anything else a key.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        if !input.is_empty()
            && input.bytes().all(|b| b.is_ascii_digit())
            && let Ok(id) = input.parse::<u64>()
        {
            return Self::Id(ViewId(id));
        }
        Self::Key(input.to_owned())
    }

    /// Fail with [`ViewError::InvalidIdentifier`] for a key without a
    /// `module.` qualifier. Ids always pass.
    pub fn require_qualified(&self) -> Result<(), ViewError> {
        match self {
            Self::Key(key) if !key.contains('.') => Err(ViewError::InvalidIdentifier(key.clone())),
            _ => Ok(()),
        }
    }
}

impl From<ViewId> for TemplateRef {
    fn from(id: ViewId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for TemplateRef {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for TemplateRef {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Key(key) => f.write_str(key),
        }
    }
}

/// Resolve `template` to a view id for `website`.
///
/// Ids pass through unchecked. With a website, a view keyed `template` and
/// owned by that website wins over the shared one; when neither exists the
/// key is looked up in the external id namespace and a page found there is
/// rejected with [`ViewError::InvalidTemplate`]. Without a website the key is
/// looked up in the external id namespace only.
pub fn resolve_view_id(
    records: &dyn Records,
    template: &TemplateRef,
    website: Option<WebsiteId>,
) -> Result<ViewId, ViewError> {
    let key = match template {
        TemplateRef::Id(id) => return Ok(*id),
        TemplateRef::Key(key) => key,
    };

    let Some(website_id) = website else {
        return global_view(records, key);
    };

    let query = ViewQuery::with_key(key.as_str())
        .website(WebsiteFilter::OwnedOrShared(website_id))
        .limit(1);
    if let Some(id) = records.search_views(&query).first() {
        return Ok(*id);
    }

    let candidate = global_view(records, key)?;
    if records.view(candidate).is_some_and(|view| view.page) {
        return Err(ViewError::InvalidTemplate(key.clone()));
    }
    Ok(candidate)
}

/// View registered under the external id `xml_id`.
pub(crate) fn global_view(records: &dyn Records, xml_id: &str) -> Result<ViewId, ViewError> {
    let target = records.resolve_xml_id(xml_id)?;
    let id = ViewId(target.res_id);
    if target.model != VIEW_MODEL || records.view(id).is_none() {
        return Err(ViewError::NotFound(xml_id.to_owned()));
    }
    Ok(id)
}
