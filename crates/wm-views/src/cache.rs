//! Resolution cache: memoized resolver, materializer and host lookups.
//!
//! Every entry is tagged with the store generation it was computed from and
//! only served to readers of that same generation. Keys are the JSON form of
//! the inputs that affect the result.

use serde::Serialize;
use wm_cache::{Cache, CacheBucket, CacheBucketExt};
use wm_storage::{Generation, ViewId, WebsiteId};

use crate::resolver::TemplateRef;
use crate::scope::Scope;

#[derive(Serialize)]
struct ViewIdKey<'a> {
    template: &'a TemplateRef,
    website_id: Option<WebsiteId>,
}

#[derive(Serialize)]
struct TemplateKey<'a> {
    view_id: ViewId,
    scope: &'a Scope,
}

fn cache_key<T: Serialize>(key: &T) -> Option<String> {
    serde_json::to_string(key).ok()
}

/// Generation-tagged memo tables for the view engine.
pub struct ResolutionCache {
    view_ids: Box<dyn CacheBucket>,
    templates: Box<dyn CacheBucket>,
    websites: Box<dyn CacheBucket>,
}

impl ResolutionCache {
    /// Open the engine's buckets in `cache`.
    pub fn new(cache: &dyn Cache) -> Self {
        Self {
            view_ids: cache.bucket("view_ids"),
            templates: cache.bucket("templates"),
            websites: cache.bucket("websites"),
        }
    }

    /// Resolved view id of `template` for `website_id`. Other scope fields
    /// do not take part in the key.
    pub fn view_id(
        &self,
        template: &TemplateRef,
        website_id: Option<WebsiteId>,
        generation: Generation,
    ) -> Option<ViewId> {
        let key = cache_key(&ViewIdKey {
            template,
            website_id,
        })?;
        let hit = self.view_ids.get_json(&key, &generation.to_string());
        tracing::trace!(key = %key, hit = hit.is_some(), "view_ids lookup");
        hit
    }

    pub fn set_view_id(
        &self,
        template: &TemplateRef,
        website_id: Option<WebsiteId>,
        generation: Generation,
        view_id: ViewId,
    ) {
        if let Some(key) = cache_key(&ViewIdKey {
            template,
            website_id,
        }) {
            self.view_ids
                .set_json(&key, &generation.to_string(), &view_id);
        }
    }

    /// Materialized output of `view_id` under the full `scope`.
    pub fn template(&self, view_id: ViewId, scope: &Scope, generation: Generation) -> Option<String> {
        let key = cache_key(&TemplateKey { view_id, scope })?;
        let hit = self.templates.get_string(&key, &generation.to_string());
        tracing::trace!(key = %key, hit = hit.is_some(), "templates lookup");
        hit
    }

    pub fn set_template(&self, view_id: ViewId, scope: &Scope, generation: Generation, output: &str) {
        if let Some(key) = cache_key(&TemplateKey { view_id, scope }) {
            self.templates
                .set_string(&key, &generation.to_string(), output);
        }
    }

    /// Website serving the raw `host` header.
    pub fn website(&self, host: &str, generation: Generation) -> Option<WebsiteId> {
        self.websites.get_json(host, &generation.to_string())
    }

    pub fn set_website(&self, host: &str, generation: Generation, website_id: WebsiteId) {
        self.websites
            .set_json(host, &generation.to_string(), &website_id);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.view_ids.clear();
        self.templates.clear();
        self.websites.clear();
        tracing::debug!("Cleared resolution cache");
    }
}
