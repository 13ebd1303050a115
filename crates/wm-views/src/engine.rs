//! View engine: request sessions over store snapshots, and validated writes.
//!
//! [`ViewEngine`] ties the store, the resolution cache and the pluggable
//! collaborators together. Reads go through a [`Session`], which pins one
//! store snapshot and one [`Scope`] for its whole lifetime. Writes go through
//! [`ViewEngine::write`], which validates every touched view before the
//! transaction commits and clears the cache afterwards.
//!
//! # Thread Safety
//!
//! `ViewEngine` is `Send + Sync` and meant to be shared behind an `Arc`:
//! - sessions only clone the current snapshot `Arc`
//! - cache entries are tagged with the generation they were computed from,
//!   so a reader never observes an entry from another generation
//! - writers serialize on the store's write lock
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use wm_cache::MemoryCache;
//! use wm_storage::{ExternalRef, MemoryStore, NewView};
//! use wm_views::{EngineConfig, Scope, ViewEngine, ViewError};
//!
//! let engine = ViewEngine::new(
//!     Arc::new(MemoryStore::new()),
//!     &MemoryCache::new(),
//!     EngineConfig::default(),
//! );
//! engine
//!     .write(|txn| {
//!         let id = txn.create_view(NewView::qweb("Home", "<div>Hi</div>").with_key("website.home"))?;
//!         txn.set_xml_id("website.home", ExternalRef::view(id))?;
//!         Ok::<_, ViewError>(())
//!     })
//!     .unwrap();
//!
//! let output = engine.read_template("website.home", Scope::default()).unwrap();
//! assert!(output.ends_with("<templates><div>Hi</div></templates>"));
//! ```

use std::sync::Arc;

use wm_cache::Cache;
use wm_storage::{
    Fragment, MenuId, MenuUpdate, NewMenu, NewView, NewWebsite, Records, Store, Transaction,
    USER_MODEL, UserId, View, ViewId, ViewUpdate, WebsiteId,
};

use crate::arch::{Node, serialize_into};
use crate::branding::{Branding, EditorBranding};
use crate::cache::ResolutionCache;
use crate::combine::read_combined;
use crate::error::ViewError;
use crate::overrides::applicable_fragments;
use crate::pages::{AsciiSlugify, Slugify, ensure_page};
use crate::resolver::{TemplateRef, resolve_view_id};
use crate::schema::{ArchVersion, LegacyViewGrammar, SchemaGrammar};
use crate::scope::Scope;
use crate::translate::{TermTranslator, Translator};
use crate::validator::IntegrityValidator;
use crate::website::{lookup_website, website_menu};

/// External id of the identity used when nothing else provides one.
pub const PUBLIC_USER_XML_ID: &str = "base.public_user";

/// Template copied by [`ViewEngine::new_page`].
pub const DEFAULT_PAGE_TEMPLATE: &str = "website.default_page";

const XML_DECLARATION: &str = "<?xml version='1.0' encoding='utf-8'?>\n";

/// Configuration for [`ViewEngine`].
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Website serving hosts that match no website name.
    pub default_website_id: WebsiteId,
    /// Namespace prepended to bare template names by [`Session::get_template`].
    pub default_namespace: String,
    /// Structured documents below this version are checked against the
    /// schema grammar.
    pub grammar_version_threshold: ArchVersion,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_website_id: WebsiteId(1),
            default_namespace: "website".to_owned(),
            grammar_version_threshold: ArchVersion::from_parts([7]),
        }
    }
}

/// Multi-website view resolution and materialization over a [`Store`].
pub struct ViewEngine {
    store: Arc<dyn Store>,
    cache: ResolutionCache,
    config: EngineConfig,
    translator: Box<dyn Translator>,
    branding: Box<dyn Branding>,
    validator: IntegrityValidator,
    slugify: Box<dyn Slugify>,
}

impl ViewEngine {
    /// Create an engine with the default collaborators.
    pub fn new(store: Arc<dyn Store>, cache: &dyn Cache, config: EngineConfig) -> Self {
        let validator = IntegrityValidator::new(
            Box::new(LegacyViewGrammar),
            config.grammar_version_threshold.clone(),
        );
        Self {
            store,
            cache: ResolutionCache::new(cache),
            config,
            translator: Box::new(TermTranslator),
            branding: Box::new(EditorBranding),
            validator,
            slugify: Box::new(AsciiSlugify),
        }
    }

    #[must_use]
    pub fn with_translator(mut self, translator: Box<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    #[must_use]
    pub fn with_branding(mut self, branding: Box<dyn Branding>) -> Self {
        self.branding = branding;
        self
    }

    #[must_use]
    pub fn with_grammar(mut self, grammar: Box<dyn SchemaGrammar>) -> Self {
        self.validator =
            IntegrityValidator::new(grammar, self.config.grammar_version_threshold.clone());
        self
    }

    #[must_use]
    pub fn with_slugify(mut self, slugify: Box<dyn Slugify>) -> Self {
        self.slugify = slugify;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start a read session on the current snapshot.
    pub fn session(&self, scope: Scope) -> Session<'_> {
        Session {
            engine: self,
            records: self.store.snapshot(),
            scope,
        }
    }

    /// Start a read session for a request on `host_header`.
    ///
    /// The website serving the host replaces `scope.website_id`.
    pub fn enter(&self, host_header: &str, scope: Scope) -> Session<'_> {
        let records = self.store.snapshot();
        let website_id = self.website_for(records.as_ref(), host_header);
        Session {
            engine: self,
            records,
            scope: scope.with_website(Some(website_id)),
        }
    }

    /// Website serving `host_header`, falling back to the configured default.
    pub fn current_website(&self, host_header: &str) -> WebsiteId {
        let records = self.store.snapshot();
        self.website_for(records.as_ref(), host_header)
    }

    fn website_for(&self, records: &dyn Records, host_header: &str) -> WebsiteId {
        let generation = records.generation();
        if let Some(website_id) = self.cache.website(host_header, generation) {
            return website_id;
        }
        let website_id = lookup_website(records, host_header, self.config.default_website_id);
        self.cache.set_website(host_header, generation, website_id);
        website_id
    }

    /// Materialize `template` for `scope`.
    ///
    /// A key without a `module.` qualifier fails with
    /// [`ViewError::InvalidIdentifier`] before the store is touched.
    pub fn read_template(
        &self,
        template: impl Into<TemplateRef>,
        scope: Scope,
    ) -> Result<String, ViewError> {
        let template = template.into();
        template.require_qualified()?;
        self.session(scope).read_template(template)
    }

    /// Validate `view_ids` against the committed state.
    pub fn validate(&self, view_ids: &[ViewId]) -> Result<(), ViewError> {
        let records = self.store.snapshot();
        self.validator.validate(records.as_ref(), view_ids)
    }

    /// Drop every cached resolution, materialization and host lookup.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Run `f` in a transaction.
    ///
    /// Views touched by `f` that still exist are validated against the
    /// uncommitted state; any error from `f` or from validation rolls the
    /// whole transaction back. On success the transaction commits and the
    /// cache is cleared.
    pub fn write<T, E>(&self, f: impl FnOnce(&mut dyn Transaction) -> Result<T, E>) -> Result<T, E>
    where
        E: From<ViewError>,
    {
        let mut txn = self.store.begin();
        let value = f(txn.as_mut())?;

        let touched: Vec<ViewId> = txn
            .touched_views()
            .into_iter()
            .filter(|id| txn.records().view(*id).is_some())
            .collect();
        self.validator.validate(txn.records(), &touched)?;

        let generation = txn.commit().map_err(ViewError::from)?;
        self.cache.clear();
        tracing::debug!(generation = %generation, views = touched.len(), "Committed write");
        Ok(value)
    }

    pub fn create_view(&self, view: NewView) -> Result<ViewId, ViewError> {
        self.write(|txn| Ok(txn.create_view(view)?))
    }

    pub fn update_view(&self, id: ViewId, update: &ViewUpdate) -> Result<(), ViewError> {
        self.write(|txn| Ok(txn.update_view(id, update)?))
    }

    /// Delete a view and every view inheriting from it. Returns the deleted ids.
    pub fn delete_view(&self, id: ViewId) -> Result<Vec<ViewId>, ViewError> {
        self.write(|txn| Ok(txn.delete_view(id)?))
    }

    pub fn create_website(&self, website: NewWebsite) -> Result<WebsiteId, ViewError> {
        self.write(|txn| Ok(txn.create_website(website)?))
    }

    /// Delete a website with its views and menus. Returns the deleted view ids.
    pub fn delete_website(&self, id: WebsiteId) -> Result<Vec<ViewId>, ViewError> {
        self.write(|txn| Ok(txn.delete_website(id)?))
    }

    pub fn create_menu(&self, menu: NewMenu) -> Result<MenuId, ViewError> {
        self.write(|txn| Ok(txn.create_menu(menu)?))
    }

    pub fn update_menu(&self, id: MenuId, update: &MenuUpdate) -> Result<(), ViewError> {
        self.write(|txn| Ok(txn.update_menu(id, update)?))
    }

    pub fn delete_menu(&self, id: MenuId) -> Result<(), ViewError> {
        self.write(|txn| Ok(txn.delete_menu(id)?))
    }

    /// Create a page named `name` from [`DEFAULT_PAGE_TEMPLATE`] for the
    /// scope's website. Returns the page key.
    pub fn new_page(&self, name: &str, scope: &Scope) -> Result<String, ViewError> {
        self.new_page_from(name, DEFAULT_PAGE_TEMPLATE, true, scope)
    }

    /// Create a page named `name` by copying `template`, unless one with
    /// the same key already exists for the scope's website. Returns the
    /// page key.
    pub fn new_page_from(
        &self,
        name: &str,
        template: &str,
        ispage: bool,
        scope: &Scope,
    ) -> Result<String, ViewError> {
        self.write(|txn| {
            ensure_page(
                txn,
                self.slugify.as_ref(),
                name,
                template,
                ispage,
                scope.website_id,
            )
        })
    }
}

/// Read operations pinned to one store snapshot and one [`Scope`].
pub struct Session<'a> {
    engine: &'a ViewEngine,
    records: Arc<dyn Records>,
    scope: Scope,
}

impl Session<'_> {
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Snapshot every read in this session observes.
    pub fn records(&self) -> &dyn Records {
        self.records.as_ref()
    }

    /// View id of `template` for the session's website.
    pub fn resolve(&self, template: impl Into<TemplateRef>) -> Result<ViewId, ViewError> {
        let template = template.into();
        let website_id = self.scope.website_id;
        let generation = self.records.generation();

        if let Some(view_id) = self.engine.cache.view_id(&template, website_id, generation) {
            return Ok(view_id);
        }
        let view_id = resolve_view_id(self.records.as_ref(), &template, website_id)?;
        self.engine
            .cache
            .set_view_id(&template, website_id, generation, view_id);
        Ok(view_id)
    }

    pub fn applicable_fragments(&self, base: ViewId, model: Option<&str>) -> Vec<Fragment> {
        applicable_fragments(self.records.as_ref(), base, model, &self.scope)
    }

    /// Combined tree of `view_id` before translation and branding.
    pub fn combined(&self, view_id: ViewId) -> Result<Node, ViewError> {
        Ok(read_combined(self.records.as_ref(), view_id, &self.scope)?)
    }

    /// Canonical output of `view_id`: the combined, translated and branded
    /// tree wrapped in `<templates>`, with an XML declaration.
    pub fn materialize(&self, view_id: ViewId) -> Result<String, ViewError> {
        let generation = self.records.generation();
        if let Some(output) = self.engine.cache.template(view_id, &self.scope, generation) {
            return Ok(output);
        }

        let mut tree = read_combined(self.records.as_ref(), view_id, &self.scope)?;
        if let Some(lang) = self.scope.lang.as_deref() {
            self.engine
                .translator
                .translate(self.records.as_ref(), &mut tree, lang);
        }
        if self.scope.inherit_branding {
            self.engine.branding.distribute(&mut tree);
        }

        let mut output = String::with_capacity(XML_DECLARATION.len() + 1024);
        output.push_str(XML_DECLARATION);
        output.push_str("<templates>");
        serialize_into(&tree, &mut output);
        output.push_str("</templates>");

        self.engine
            .cache
            .set_template(view_id, &self.scope, generation, &output);
        tracing::debug!(view_id = %view_id, generation = %generation, "Materialized view");
        Ok(output)
    }

    /// Resolve and materialize `template`.
    pub fn read_template(&self, template: impl Into<TemplateRef>) -> Result<String, ViewError> {
        let template = template.into();
        template.require_qualified()?;
        let view_id = self.resolve(template)?;
        self.materialize(view_id)
    }

    /// View serving `template` on the session's website. Bare names are
    /// qualified with the configured default namespace.
    pub fn get_template(&self, template: &str) -> Result<View, ViewError> {
        let template = match TemplateRef::parse(template) {
            TemplateRef::Key(key) if !key.contains('.') => {
                TemplateRef::Key(format!("{}.{key}", self.engine.config.default_namespace))
            }
            other => other,
        };
        let view_id = self.resolve(template.clone())?;
        self.records
            .view(view_id)
            .cloned()
            .ok_or_else(|| ViewError::NotFound(template.to_string()))
    }

    /// Root menu of the session's website.
    pub fn website_menu(&self) -> Option<MenuId> {
        self.scope
            .website_id
            .and_then(|website_id| website_menu(self.records.as_ref(), website_id))
    }

    /// Identity acting for a request on `host_header`.
    ///
    /// Tries in order: the session user, the user of the session's website,
    /// the user of the website serving the host, then [`PUBLIC_USER_XML_ID`].
    pub fn acting_user(
        &self,
        session_uid: Option<UserId>,
        host_header: &str,
    ) -> Result<UserId, ViewError> {
        if let Some(uid) = session_uid {
            return Ok(uid);
        }
        if let Some(uid) = self.website_user(self.scope.website_id) {
            return Ok(uid);
        }
        let host_website = self.engine.website_for(self.records.as_ref(), host_header);
        if let Some(uid) = self.website_user(Some(host_website)) {
            return Ok(uid);
        }

        let target = self.records.resolve_xml_id(PUBLIC_USER_XML_ID)?;
        if target.model != USER_MODEL {
            return Err(ViewError::NotFound(PUBLIC_USER_XML_ID.to_owned()));
        }
        Ok(UserId(target.res_id))
    }

    fn website_user(&self, website_id: Option<WebsiteId>) -> Option<UserId> {
        website_id
            .and_then(|id| self.records.website(id))
            .and_then(|website| website.user_id)
    }
}
