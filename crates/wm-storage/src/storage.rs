//! Store traits, queries and error types.
//!
//! Provides the read contract [`Records`], the [`Store`] that hands out
//! snapshots, and the write contract [`Transaction`], along with
//! [`StorageError`] for unified error handling across backends.
//!
//! # Snapshots
//!
//! A snapshot is an immutable view of the store at one [`Generation`]. All
//! lookups performed for a single request should go through one snapshot so
//! they never mix data from before and after a concurrent commit.

use std::sync::Arc;

use crate::record::{
    ExternalRef, Fragment, Generation, Menu, MenuId, MenuUpdate, NewMenu, NewView, NewWebsite,
    View, ViewId, ViewUpdate, Website, WebsiteId,
};

/// Website restriction of a [`ViewQuery`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WebsiteFilter {
    /// No restriction.
    #[default]
    Any,
    /// Only views without an owning website.
    Shared,
    /// Only views owned by the website.
    Only(WebsiteId),
    /// Views owned by the website or shared by all websites.
    OwnedOrShared(WebsiteId),
}

impl WebsiteFilter {
    pub(crate) fn matches(self, website_id: Option<WebsiteId>) -> bool {
        match self {
            Self::Any => true,
            Self::Shared => website_id.is_none(),
            Self::Only(id) => website_id == Some(id),
            Self::OwnedOrShared(id) => website_id.is_none_or(|owner| owner == id),
        }
    }
}

/// View search filter.
///
/// Results are ordered by owning website with website-owned views before
/// shared ones, then by id, so `limit(1)` picks a website override over
/// the shared view it overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewQuery {
    /// Exact key match.
    pub key: Option<String>,
    pub website: WebsiteFilter,
    /// Exact parent match.
    pub inherit_id: Option<ViewId>,
    pub limit: Option<usize>,
}

impl ViewQuery {
    /// Query views with the given key.
    #[must_use]
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn website(mut self, filter: WebsiteFilter) -> Self {
        self.website = filter;
        self
    }

    #[must_use]
    pub fn inheriting(mut self, parent: ViewId) -> Self {
        self.inherit_id = Some(parent);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn matches(&self, view: &View) -> bool {
        self.key
            .as_deref()
            .is_none_or(|key| view.key.as_deref() == Some(key))
            && self.website.matches(view.website_id)
            && self
                .inherit_id
                .is_none_or(|parent| view.inherit_id == Some(parent))
    }
}

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Record does not exist.
    NotFound,
    /// A uniqueness constraint rejected the write.
    AlreadyExists,
    /// A write references a record that does not exist.
    InvalidReference,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Record context (e.g. `"ir.ui.view,42"` or an external id).
    pub record: Option<String>,
    /// Backend identifier (e.g., "Memory").
    pub backend: Option<&'static str>,
    /// Violated constraint, if any.
    pub constraint: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            record: None,
            backend: None,
            constraint: None,
            source: None,
        }
    }

    /// Attach record context.
    #[must_use]
    pub fn with_record(mut self, record: impl Into<String>) -> Self {
        self.record = Some(record.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the violated constraint.
    #[must_use]
    pub fn with_constraint(mut self, constraint: &'static str) -> Self {
        self.constraint = Some(constraint);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create a not found error with record context.
    #[must_use]
    pub fn not_found(record: impl Into<String>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_record(record)
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (record: ir.ui.view,3)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::AlreadyExists => "Already exists",
            StorageErrorKind::InvalidReference => "Invalid reference",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(constraint) = self.constraint {
            write!(f, ": {constraint}")?;
        }

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(record) = &self.record {
            write!(f, " (record: {record})")?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Read access to one consistent snapshot of the store.
pub trait Records: Send + Sync {
    /// Generation this snapshot was taken at.
    fn generation(&self) -> Generation;

    /// Read a view by id.
    fn view(&self, id: ViewId) -> Option<&View>;

    /// Search views, ordered website-owned first, then by id.
    fn search_views(&self, query: &ViewQuery) -> Vec<ViewId>;

    /// Raw inheritance chain: views extending `parent` that render `model`,
    /// ordered by `(priority, id)`. No website filtering is applied.
    fn inheriting_views(&self, parent: ViewId, model: Option<&str>) -> Vec<Fragment>;

    /// Read a website by id.
    fn website(&self, id: WebsiteId) -> Option<&Website>;

    /// Websites whose name equals `name`, ordered by id.
    fn search_websites(&self, name: &str) -> Vec<WebsiteId>;

    /// Read a menu by id.
    fn menu(&self, id: MenuId) -> Option<&Menu>;

    /// Root menus (no parent) owned by `website`, ordered by `(sequence, id)`.
    fn root_menus(&self, website: WebsiteId) -> Vec<MenuId>;

    /// Resolve a dotted external id to the record it names.
    ///
    /// # Errors
    ///
    /// Returns [`StorageErrorKind::NotFound`] if the id is not registered.
    fn resolve_xml_id(&self, xml_id: &str) -> Result<ExternalRef, StorageError>;

    /// Field names declared by `model`, or `None` for an unknown model.
    fn model_fields(&self, model: &str) -> Option<&[String]>;

    /// Translated value of `source` in `lang`.
    fn translation(&self, lang: &str, source: &str) -> Option<&str>;
}

/// Write access to the store.
///
/// Writes are visible through [`Transaction::records`] immediately and to
/// other readers only after [`Transaction::commit`]. Dropping a transaction
/// without committing discards every write.
pub trait Transaction {
    /// Uncommitted state, including this transaction's writes.
    fn records(&self) -> &dyn Records;

    /// Views created or modified so far in this transaction.
    fn touched_views(&self) -> Vec<ViewId>;

    /// Create a view.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate `(key, website_id)` pair or a dangling reference.
    fn create_view(&mut self, view: NewView) -> Result<ViewId, StorageError>;

    /// Update a view in place.
    fn update_view(&mut self, id: ViewId, update: &ViewUpdate) -> Result<(), StorageError>;

    /// Copy a view. The copy drops the owning website before `overrides`
    /// are applied.
    fn copy_view(&mut self, id: ViewId, overrides: &ViewUpdate) -> Result<ViewId, StorageError>;

    /// Delete a view and, recursively, every view extending it.
    /// Returns the deleted ids.
    fn delete_view(&mut self, id: ViewId) -> Result<Vec<ViewId>, StorageError>;

    /// Create a website.
    fn create_website(&mut self, website: NewWebsite) -> Result<WebsiteId, StorageError>;

    /// Delete a website, cascading to its views and menus.
    /// Returns the deleted view ids.
    fn delete_website(&mut self, id: WebsiteId) -> Result<Vec<ViewId>, StorageError>;

    /// Create a menu.
    fn create_menu(&mut self, menu: NewMenu) -> Result<MenuId, StorageError>;

    /// Update a menu in place.
    fn update_menu(&mut self, id: MenuId, update: &MenuUpdate) -> Result<(), StorageError>;

    /// Delete a menu and its submenus.
    fn delete_menu(&mut self, id: MenuId) -> Result<(), StorageError>;

    /// Register (or re-point) a dotted external id.
    fn set_xml_id(&mut self, xml_id: &str, target: ExternalRef) -> Result<(), StorageError>;

    /// Declare the fields of a model.
    fn set_model_fields(&mut self, model: &str, fields: Vec<String>);

    /// Store a translation of `source` in `lang`.
    fn set_translation(&mut self, lang: &str, source: &str, value: &str);

    /// Make every write visible to other readers and bump the generation.
    fn commit(self: Box<Self>) -> Result<Generation, StorageError>;
}

/// Transactional record store.
pub trait Store: Send + Sync {
    /// Current committed snapshot.
    fn snapshot(&self) -> Arc<dyn Records>;

    /// Open a write transaction. Writers are serialized.
    fn begin(&self) -> Box<dyn Transaction + '_>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ViewType;

    fn view(id: u64, key: Option<&str>, website: Option<u64>) -> View {
        View {
            id: ViewId(id),
            name: format!("view {id}"),
            key: key.map(str::to_owned),
            website_id: website.map(WebsiteId),
            arch: "<div/>".to_owned(),
            model: None,
            view_type: ViewType::Qweb,
            inherit_id: None,
            priority: 16,
            page: false,
        }
    }

    #[test]
    fn test_website_filter_owned_or_shared() {
        let filter = WebsiteFilter::OwnedOrShared(WebsiteId(10));

        assert!(filter.matches(None));
        assert!(filter.matches(Some(WebsiteId(10))));
        assert!(!filter.matches(Some(WebsiteId(11))));
    }

    #[test]
    fn test_website_filter_shared_and_only() {
        assert!(WebsiteFilter::Shared.matches(None));
        assert!(!WebsiteFilter::Shared.matches(Some(WebsiteId(1))));
        assert!(WebsiteFilter::Only(WebsiteId(1)).matches(Some(WebsiteId(1))));
        assert!(!WebsiteFilter::Only(WebsiteId(1)).matches(None));
        assert!(WebsiteFilter::Any.matches(Some(WebsiteId(7))));
    }

    #[test]
    fn test_view_query_matches_key_and_website() {
        let query = ViewQuery::with_key("mod.page").website(WebsiteFilter::OwnedOrShared(WebsiteId(2)));

        assert!(query.matches(&view(1, Some("mod.page"), None)));
        assert!(query.matches(&view(2, Some("mod.page"), Some(2))));
        assert!(!query.matches(&view(3, Some("mod.page"), Some(3))));
        assert!(!query.matches(&view(4, Some("mod.other"), None)));
        assert!(!query.matches(&view(5, None, None)));
    }

    #[test]
    fn test_storage_error_display_full() {
        let err = StorageError::new(StorageErrorKind::AlreadyExists)
            .with_backend("Memory")
            .with_constraint("key_website_id_unique")
            .with_record("ir.ui.view,3");

        assert_eq!(
            err.to_string(),
            "[Memory] Already exists: key_website_id_unique (record: ir.ui.view,3)"
        );
    }

    #[test]
    fn test_storage_error_not_found() {
        let err = StorageError::not_found("website.home");

        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert_eq!(err.record.as_deref(), Some("website.home"));
        assert_eq!(err.to_string(), "Not found (record: website.home)");
    }

    #[test]
    fn test_storage_error_with_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = StorageError::new(StorageErrorKind::Other).with_source(io_err);

        assert!(err.downcast_source::<std::io::Error>().is_some());
        assert_eq!(err.to_string(), "Error: file not found");
    }

    #[test]
    fn test_storage_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StorageError>();
    }
}
