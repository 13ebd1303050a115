//! Request scope threaded through resolution and materialization.

use serde::Serialize;
use wm_storage::WebsiteId;

/// Contextual parameters affecting resolution and materialization.
///
/// Resolution only looks at `website_id`; materialization looks at every
/// field, and each field takes part in the materialization cache key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Scope {
    pub website_id: Option<WebsiteId>,
    pub lang: Option<String>,
    /// Emit editor branding markers.
    pub inherit_branding: bool,
    pub editable: bool,
    pub translatable: bool,
}

impl Scope {
    /// Scope of a request served by `website_id`.
    #[must_use]
    pub fn for_website(website_id: WebsiteId) -> Self {
        Self {
            website_id: Some(website_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_website(mut self, website_id: Option<WebsiteId>) -> Self {
        self.website_id = website_id;
        self
    }

    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    #[must_use]
    pub fn with_branding(mut self, inherit_branding: bool) -> Self {
        self.inherit_branding = inherit_branding;
        self
    }

    #[must_use]
    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    #[must_use]
    pub fn translatable(mut self, translatable: bool) -> Self {
        self.translatable = translatable;
        self
    }
}
