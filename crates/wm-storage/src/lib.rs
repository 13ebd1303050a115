//! Record storage for multi-website views.
//!
//! This crate provides the storage collaborator used by the view engine:
//!
//! - [`Records`]: read access to one consistent snapshot (views, websites,
//!   menus, external ids, model fields, translations)
//! - [`Store`]: hands out snapshots and opens write [`Transaction`]s
//! - [`MemoryStore`]: in-process copy-on-write implementation
//! - [`Bundle`]: YAML site bundles that seed a store
//!
//! # Generations
//!
//! Every committed transaction bumps the store [`Generation`]. Each snapshot
//! carries the generation it was taken at, so caches layered on top can tag
//! their entries and never serve a value computed from older data.
//!
//! # Example
//!
//! ```
//! use wm_storage::{MemoryStore, NewView, Records, Store, Transaction, ViewQuery};
//!
//! let store = MemoryStore::new();
//! let mut txn = store.begin();
//! let id = txn.create_view(NewView::qweb("Home", "<div/>").with_key("website.home")).unwrap();
//! txn.commit().unwrap();
//!
//! let snapshot = store.snapshot();
//! assert_eq!(snapshot.search_views(&ViewQuery::with_key("website.home")), vec![id]);
//! ```

mod bundle;
mod memory;
mod record;
mod storage;

pub use bundle::{Bundle, BundleError, BundleMenu, BundleSummary, BundleView, BundleWebsite};
pub use memory::{MemoryStore, StoreState};
pub use record::{
    CompanyId, ExternalRef, Fragment, Generation, Menu, MenuId, MenuUpdate, NewMenu, NewView,
    NewWebsite, USER_MODEL, UserId, VIEW_MODEL, View, ViewId, ViewType, ViewUpdate, WEBSITE_MODEL,
    Website, WebsiteId,
};
pub use storage::{
    Records, Store, StorageError, StorageErrorKind, Transaction, ViewQuery, WebsiteFilter,
};
