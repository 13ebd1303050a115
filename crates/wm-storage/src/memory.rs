//! In-process copy-on-write store.
//!
//! Readers share an `Arc<StoreState>`; a transaction clones the current state,
//! writes to its private copy, and swaps it in on commit. Writers are
//! serialized by a mutex held for the lifetime of the transaction.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::record::{
    ExternalRef, Fragment, Generation, Menu, MenuId, MenuUpdate, NewMenu, NewView, NewWebsite,
    VIEW_MODEL, View, ViewId, ViewUpdate, Website, WebsiteId,
};
use crate::storage::{
    Records, Store, StorageError, StorageErrorKind, Transaction, ViewQuery,
};

const BACKEND: &str = "Memory";

/// Complete contents of a [`MemoryStore`] at one generation.
#[derive(Clone, Debug)]
pub struct StoreState {
    generation: Generation,
    views: BTreeMap<ViewId, View>,
    websites: BTreeMap<WebsiteId, Website>,
    menus: BTreeMap<MenuId, Menu>,
    xml_ids: HashMap<String, ExternalRef>,
    model_fields: HashMap<String, Vec<String>>,
    translations: HashMap<String, HashMap<String, String>>,
    next_view: u64,
    next_website: u64,
    next_menu: u64,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            generation: Generation::default(),
            views: BTreeMap::new(),
            websites: BTreeMap::new(),
            menus: BTreeMap::new(),
            xml_ids: HashMap::new(),
            model_fields: HashMap::new(),
            translations: HashMap::new(),
            next_view: 1,
            next_website: 1,
            next_menu: 1,
        }
    }
}

fn view_record(id: ViewId) -> String {
    format!("{VIEW_MODEL},{id}")
}

impl StoreState {
    fn check_view(&self, view: &View) -> Result<(), StorageError> {
        if let Some(key) = &view.key {
            let duplicate = self.views.values().any(|other| {
                other.id != view.id
                    && other.website_id == view.website_id
                    && other.key.as_ref() == Some(key)
            });
            if duplicate {
                return Err(StorageError::new(StorageErrorKind::AlreadyExists)
                    .with_backend(BACKEND)
                    .with_constraint("key_website_id_unique")
                    .with_record(key.clone()));
            }
        }
        if let Some(website_id) = view.website_id
            && !self.websites.contains_key(&website_id)
        {
            return Err(StorageError::new(StorageErrorKind::InvalidReference)
                .with_backend(BACKEND)
                .with_record(format!("website,{website_id}")));
        }
        if let Some(parent) = view.inherit_id
            && (parent == view.id || !self.views.contains_key(&parent))
        {
            return Err(StorageError::new(StorageErrorKind::InvalidReference)
                .with_backend(BACKEND)
                .with_record(view_record(parent)));
        }
        Ok(())
    }

    fn check_menu(&self, menu: &Menu) -> Result<(), StorageError> {
        if let Some(website_id) = menu.website_id
            && !self.websites.contains_key(&website_id)
        {
            return Err(StorageError::new(StorageErrorKind::InvalidReference)
                .with_backend(BACKEND)
                .with_record(format!("website,{website_id}")));
        }
        if let Some(parent) = menu.parent_id
            && (!self.menus.contains_key(&parent) || self.menu_has_ancestor(parent, menu.id))
        {
            return Err(StorageError::new(StorageErrorKind::InvalidReference)
                .with_backend(BACKEND)
                .with_record(format!("website.menu,{parent}")));
        }
        Ok(())
    }

    /// Whether `ancestor` is `menu` or lies on its parent chain.
    fn menu_has_ancestor(&self, menu: MenuId, ancestor: MenuId) -> bool {
        let mut seen = HashSet::new();
        let mut cursor = Some(menu);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            if !seen.insert(id) {
                return false;
            }
            cursor = self.menus.get(&id).and_then(|m| m.parent_id);
        }
        false
    }

    fn insert_view(&mut self, view: View) -> Result<ViewId, StorageError> {
        self.check_view(&view)?;
        let id = view.id;
        self.views.insert(id, view);
        Ok(id)
    }

    fn allocate_view(&mut self) -> ViewId {
        let id = ViewId(self.next_view);
        self.next_view += 1;
        id
    }

    /// `root` followed by every view transitively extending it.
    fn view_descendants(&self, root: ViewId) -> Vec<ViewId> {
        let mut found = vec![root];
        let mut seen = HashSet::from([root]);
        let mut cursor = 0;
        while cursor < found.len() {
            let parent = found[cursor];
            for view in self.views.values() {
                if view.inherit_id == Some(parent) && seen.insert(view.id) {
                    found.push(view.id);
                }
            }
            cursor += 1;
        }
        found
    }

    fn menu_descendants(&self, root: MenuId) -> Vec<MenuId> {
        let mut found = vec![root];
        let mut seen = HashSet::from([root]);
        let mut cursor = 0;
        while cursor < found.len() {
            let parent = found[cursor];
            for menu in self.menus.values() {
                if menu.parent_id == Some(parent) && seen.insert(menu.id) {
                    found.push(menu.id);
                }
            }
            cursor += 1;
        }
        found
    }

    fn remove_views(&mut self, ids: &[ViewId]) {
        for id in ids {
            self.views.remove(id);
        }
        self.xml_ids.retain(|_, target| {
            target.model != VIEW_MODEL || !ids.iter().any(|id| id.0 == target.res_id)
        });
    }
}

impl Records for StoreState {
    fn generation(&self) -> Generation {
        self.generation
    }

    fn view(&self, id: ViewId) -> Option<&View> {
        self.views.get(&id)
    }

    fn search_views(&self, query: &ViewQuery) -> Vec<ViewId> {
        let mut matched: Vec<&View> = self.views.values().filter(|v| query.matches(v)).collect();
        // Website-owned views first, then shared ones.
        matched.sort_by_key(|v| (v.website_id.is_none(), v.website_id, v.id));
        let ids = matched.into_iter().map(|v| v.id);
        match query.limit {
            Some(limit) => ids.take(limit).collect(),
            None => ids.collect(),
        }
    }

    fn inheriting_views(&self, parent: ViewId, model: Option<&str>) -> Vec<Fragment> {
        let mut children: Vec<&View> = self
            .views
            .values()
            .filter(|v| v.inherit_id == Some(parent) && v.model.as_deref() == model)
            .collect();
        children.sort_by_key(|v| (v.priority, v.id));
        children
            .into_iter()
            .map(|v| Fragment {
                view_id: v.id,
                website_id: v.website_id,
                arch: v.arch.clone(),
            })
            .collect()
    }

    fn website(&self, id: WebsiteId) -> Option<&Website> {
        self.websites.get(&id)
    }

    fn search_websites(&self, name: &str) -> Vec<WebsiteId> {
        self.websites
            .values()
            .filter(|w| w.name == name)
            .map(|w| w.id)
            .collect()
    }

    fn menu(&self, id: MenuId) -> Option<&Menu> {
        self.menus.get(&id)
    }

    fn root_menus(&self, website: WebsiteId) -> Vec<MenuId> {
        let mut roots: Vec<&Menu> = self
            .menus
            .values()
            .filter(|m| m.parent_id.is_none() && m.website_id == Some(website))
            .collect();
        roots.sort_by_key(|m| (m.sequence, m.id));
        roots.into_iter().map(|m| m.id).collect()
    }

    fn resolve_xml_id(&self, xml_id: &str) -> Result<ExternalRef, StorageError> {
        self.xml_ids
            .get(xml_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(xml_id).with_backend(BACKEND))
    }

    fn model_fields(&self, model: &str) -> Option<&[String]> {
        self.model_fields.get(model).map(Vec::as_slice)
    }

    fn translation(&self, lang: &str, source: &str) -> Option<&str> {
        self.translations
            .get(lang)
            .and_then(|terms| terms.get(source))
            .map(String::as_str)
    }
}

/// Thread-safe in-memory [`Store`].
///
/// # Panics
///
/// Methods panic if an internal lock is poisoned.
#[derive(Debug, Default)]
pub struct MemoryStore {
    current: RwLock<Arc<StoreState>>,
    write_lock: Mutex<()>,
}

impl MemoryStore {
    /// Create an empty store at generation 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the latest committed state.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.current.read().unwrap().generation
    }
}

impl Store for MemoryStore {
    fn snapshot(&self) -> Arc<dyn Records> {
        let state: Arc<StoreState> = Arc::clone(&self.current.read().unwrap());
        state
    }

    fn begin(&self) -> Box<dyn Transaction + '_> {
        let guard = self.write_lock.lock().unwrap();
        let state = StoreState::clone(&self.current.read().unwrap());
        Box::new(MemoryTransaction {
            _guard: guard,
            store: self,
            state,
            touched: BTreeSet::new(),
        })
    }
}

struct MemoryTransaction<'a> {
    _guard: MutexGuard<'a, ()>,
    store: &'a MemoryStore,
    state: StoreState,
    touched: BTreeSet<ViewId>,
}

impl Transaction for MemoryTransaction<'_> {
    fn records(&self) -> &dyn Records {
        &self.state
    }

    fn touched_views(&self) -> Vec<ViewId> {
        self.touched.iter().copied().collect()
    }

    fn create_view(&mut self, view: NewView) -> Result<ViewId, StorageError> {
        let id = self.state.allocate_view();
        self.state.insert_view(view.into_view(id))?;
        self.touched.insert(id);
        Ok(id)
    }

    fn update_view(&mut self, id: ViewId, update: &ViewUpdate) -> Result<(), StorageError> {
        let mut view = self
            .state
            .views
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(view_record(id)).with_backend(BACKEND))?;
        update.apply(&mut view);
        self.state.insert_view(view)?;
        self.touched.insert(id);
        Ok(())
    }

    fn copy_view(&mut self, id: ViewId, overrides: &ViewUpdate) -> Result<ViewId, StorageError> {
        let mut view = self
            .state
            .views
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(view_record(id)).with_backend(BACKEND))?;
        view.id = self.state.allocate_view();
        view.website_id = None;
        overrides.apply(&mut view);
        let copy = self.state.insert_view(view)?;
        self.touched.insert(copy);
        Ok(copy)
    }

    fn delete_view(&mut self, id: ViewId) -> Result<Vec<ViewId>, StorageError> {
        if !self.state.views.contains_key(&id) {
            return Err(StorageError::not_found(view_record(id)).with_backend(BACKEND));
        }
        let deleted = self.state.view_descendants(id);
        self.state.remove_views(&deleted);
        for view_id in &deleted {
            self.touched.remove(view_id);
        }
        Ok(deleted)
    }

    fn create_website(&mut self, website: NewWebsite) -> Result<WebsiteId, StorageError> {
        let id = WebsiteId(self.state.next_website);
        self.state.next_website += 1;
        self.state.websites.insert(
            id,
            Website {
                id,
                name: website.name,
                user_id: website.user_id,
                company_id: website.company_id,
            },
        );
        Ok(id)
    }

    fn delete_website(&mut self, id: WebsiteId) -> Result<Vec<ViewId>, StorageError> {
        if self.state.websites.remove(&id).is_none() {
            return Err(StorageError::not_found(format!("website,{id}")).with_backend(BACKEND));
        }

        let owned: Vec<ViewId> = self
            .state
            .views
            .values()
            .filter(|v| v.website_id == Some(id))
            .map(|v| v.id)
            .collect();
        let mut deleted = Vec::new();
        for root in owned {
            for view_id in self.state.view_descendants(root) {
                if !deleted.contains(&view_id) {
                    deleted.push(view_id);
                }
            }
        }
        self.state.remove_views(&deleted);
        for view_id in &deleted {
            self.touched.remove(view_id);
        }

        self.state.menus.retain(|_, m| m.website_id != Some(id));
        let orphans: Vec<MenuId> = self
            .state
            .menus
            .values()
            .filter(|m| m.parent_id.is_some_and(|p| !self.state.menus.contains_key(&p)))
            .map(|m| m.id)
            .collect();
        for orphan in orphans {
            for menu_id in self.state.menu_descendants(orphan) {
                self.state.menus.remove(&menu_id);
            }
        }

        Ok(deleted)
    }

    fn create_menu(&mut self, menu: NewMenu) -> Result<MenuId, StorageError> {
        let id = MenuId(self.state.next_menu);
        let menu = Menu {
            id,
            name: menu.name,
            url: menu.url,
            website_id: menu.website_id,
            parent_id: menu.parent_id,
            sequence: menu.sequence,
        };
        self.state.check_menu(&menu)?;
        self.state.next_menu += 1;
        self.state.menus.insert(id, menu);
        Ok(id)
    }

    fn update_menu(&mut self, id: MenuId, update: &MenuUpdate) -> Result<(), StorageError> {
        let mut menu = self.state.menus.get(&id).cloned().ok_or_else(|| {
            StorageError::not_found(format!("website.menu,{id}")).with_backend(BACKEND)
        })?;
        update.apply(&mut menu);
        self.state.check_menu(&menu)?;
        self.state.menus.insert(id, menu);
        Ok(())
    }

    fn delete_menu(&mut self, id: MenuId) -> Result<(), StorageError> {
        if !self.state.menus.contains_key(&id) {
            return Err(
                StorageError::not_found(format!("website.menu,{id}")).with_backend(BACKEND)
            );
        }
        for menu_id in self.state.menu_descendants(id) {
            self.state.menus.remove(&menu_id);
        }
        Ok(())
    }

    fn set_xml_id(&mut self, xml_id: &str, target: ExternalRef) -> Result<(), StorageError> {
        if !xml_id.contains('.') {
            return Err(StorageError::new(StorageErrorKind::Other)
                .with_backend(BACKEND)
                .with_constraint("xml_id_module_prefix")
                .with_record(xml_id));
        }
        self.state.xml_ids.insert(xml_id.to_owned(), target);
        Ok(())
    }

    fn set_model_fields(&mut self, model: &str, fields: Vec<String>) {
        self.state.model_fields.insert(model.to_owned(), fields);
    }

    fn set_translation(&mut self, lang: &str, source: &str, value: &str) {
        self.state
            .translations
            .entry(lang.to_owned())
            .or_default()
            .insert(source.to_owned(), value.to_owned());
    }

    fn commit(self: Box<Self>) -> Result<Generation, StorageError> {
        let Self {
            _guard,
            store,
            mut state,
            touched,
        } = *self;
        state.generation = state.generation.next();
        let generation = state.generation;
        *store.current.write().unwrap() = Arc::new(state);
        tracing::debug!(%generation, touched = touched.len(), "Committed transaction");
        Ok(generation)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::storage::WebsiteFilter;

    fn seeded() -> (MemoryStore, WebsiteId, ViewId) {
        let store = MemoryStore::new();
        let mut txn = store.begin();
        let website = txn.create_website(NewWebsite::named("example.com")).unwrap();
        let view = txn
            .create_view(NewView::qweb("Home", "<div/>").with_key("website.home"))
            .unwrap();
        txn.commit().unwrap();
        (store, website, view)
    }

    #[test]
    fn test_commit_bumps_generation() {
        let (store, _, _) = seeded();

        assert_eq!(store.generation(), Generation(1));
        assert_eq!(store.snapshot().generation(), Generation(1));
    }

    #[test]
    fn test_drop_rolls_back() {
        let (store, _, _) = seeded();
        {
            let mut txn = store.begin();
            txn.create_view(NewView::qweb("Tmp", "<p/>").with_key("website.tmp"))
                .unwrap();
        }

        let snapshot = store.snapshot();
        assert!(snapshot.search_views(&ViewQuery::with_key("website.tmp")).is_empty());
        assert_eq!(snapshot.generation(), Generation(1));
    }

    #[test]
    fn test_snapshot_isolated_from_later_commits() {
        let (store, _, home) = seeded();
        let before = store.snapshot();

        let mut txn = store.begin();
        txn.update_view(home, &ViewUpdate::default().arch("<p/>"))
            .unwrap();
        txn.commit().unwrap();

        assert_eq!(before.view(home).unwrap().arch, "<div/>");
        assert_eq!(store.snapshot().view(home).unwrap().arch, "<p/>");
    }

    #[test]
    fn test_transaction_sees_own_writes() {
        let (store, _, _) = seeded();
        let mut txn = store.begin();
        let id = txn
            .create_view(NewView::qweb("About", "<div/>").with_key("website.about"))
            .unwrap();

        assert_eq!(
            txn.records().search_views(&ViewQuery::with_key("website.about")),
            vec![id]
        );
        assert_eq!(txn.touched_views(), vec![id]);
    }

    #[test]
    fn test_key_unique_per_website() {
        let (store, website, _) = seeded();
        let mut txn = store.begin();

        let err = txn
            .create_view(NewView::qweb("Dup", "<div/>").with_key("website.home"))
            .unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::AlreadyExists);
        assert_eq!(err.constraint, Some("key_website_id_unique"));

        // Same key on a specific website is allowed.
        txn.create_view(
            NewView::qweb("Home", "<div/>")
                .with_key("website.home")
                .with_website(website),
        )
        .unwrap();
    }

    #[test]
    fn test_dangling_references_rejected() {
        let (store, _, _) = seeded();
        let mut txn = store.begin();

        let err = txn
            .create_view(NewView::qweb("X", "<div/>").with_website(WebsiteId(99)))
            .unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::InvalidReference);

        let err = txn
            .create_view(NewView::qweb("X", "<div/>").inheriting(ViewId(99)))
            .unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::InvalidReference);
    }

    #[test]
    fn test_search_orders_website_owned_first() {
        let (store, website, home) = seeded();
        let mut txn = store.begin();
        let specific = txn
            .create_view(
                NewView::qweb("Home", "<div/>")
                    .with_key("website.home")
                    .with_website(website),
            )
            .unwrap();
        txn.commit().unwrap();

        let snapshot = store.snapshot();
        let query = ViewQuery::with_key("website.home").website(WebsiteFilter::OwnedOrShared(website));
        assert_eq!(snapshot.search_views(&query), vec![specific, home]);
        assert_eq!(snapshot.search_views(&query.limit(1)), vec![specific]);
        assert_eq!(
            snapshot.search_views(&ViewQuery::with_key("website.home").website(WebsiteFilter::Shared)),
            vec![home]
        );
    }

    #[test]
    fn test_inheriting_views_ordered_by_priority_then_id() {
        let (store, _, home) = seeded();
        let mut txn = store.begin();
        let late = txn
            .create_view(NewView::qweb("A", "<data/>").inheriting(home).with_priority(20))
            .unwrap();
        let early = txn
            .create_view(NewView::qweb("B", "<data/>").inheriting(home).with_priority(5))
            .unwrap();
        let tie = txn
            .create_view(NewView::qweb("C", "<data/>").inheriting(home).with_priority(20))
            .unwrap();
        txn.commit().unwrap();

        let ids: Vec<ViewId> = store
            .snapshot()
            .inheriting_views(home, None)
            .into_iter()
            .map(|f| f.view_id)
            .collect();
        assert_eq!(ids, vec![early, late, tie]);
    }

    #[test]
    fn test_inheriting_views_filters_model() {
        let (store, _, home) = seeded();
        let mut txn = store.begin();
        let mut other = NewView::qweb("Other", "<data/>").inheriting(home);
        other.model = Some("res.partner".to_owned());
        txn.create_view(other).unwrap();
        txn.commit().unwrap();

        assert!(store.snapshot().inheriting_views(home, None).is_empty());
    }

    #[test]
    fn test_delete_view_cascades() {
        let (store, _, home) = seeded();
        let mut txn = store.begin();
        let child = txn
            .create_view(NewView::qweb("Child", "<data/>").inheriting(home))
            .unwrap();
        let grandchild = txn
            .create_view(NewView::qweb("Grandchild", "<data/>").inheriting(child))
            .unwrap();
        txn.set_xml_id("website.home", ExternalRef::view(home)).unwrap();

        let deleted = txn.delete_view(home).unwrap();
        assert_eq!(deleted, vec![home, child, grandchild]);
        assert!(txn.records().view(grandchild).is_none());
        assert!(txn.records().resolve_xml_id("website.home").is_err());
    }

    #[test]
    fn test_copy_view_resets_website() {
        let (store, website, home) = seeded();
        let mut txn = store.begin();
        txn.update_view(home, &ViewUpdate::default().key(Some("website.shared".to_owned())))
            .unwrap();
        let copy = txn
            .copy_view(home, &ViewUpdate::default().key(Some("website.copy".to_owned())))
            .unwrap();

        let view = txn.records().view(copy).unwrap();
        assert!(view.website_id.is_none());
        assert_eq!(view.key.as_deref(), Some("website.copy"));

        let owned = txn
            .copy_view(home, &ViewUpdate::default().website(Some(website)))
            .unwrap();
        assert_eq!(txn.records().view(owned).unwrap().website_id, Some(website));
    }

    #[test]
    fn test_delete_website_cascades_views_and_menus() {
        let (store, website, home) = seeded();
        let mut txn = store.begin();
        let owned = txn
            .create_view(
                NewView::qweb("Home", "<div/>")
                    .with_key("website.home")
                    .with_website(website),
            )
            .unwrap();
        let root = txn
            .create_menu(NewMenu {
                name: "Top".to_owned(),
                website_id: Some(website),
                ..NewMenu::default()
            })
            .unwrap();
        let sub = txn
            .create_menu(NewMenu {
                name: "Sub".to_owned(),
                parent_id: Some(root),
                ..NewMenu::default()
            })
            .unwrap();

        let deleted = txn.delete_website(website).unwrap();
        assert_eq!(deleted, vec![owned]);
        assert!(txn.records().view(home).is_some());
        assert!(txn.records().menu(root).is_none());
        assert!(txn.records().menu(sub).is_none());
    }

    #[test]
    fn test_menu_parent_cycle_rejected() {
        let (store, website, _) = seeded();
        let mut txn = store.begin();
        let top = txn
            .create_menu(NewMenu {
                name: "Top".to_owned(),
                website_id: Some(website),
                ..NewMenu::default()
            })
            .unwrap();
        let sub = txn
            .create_menu(NewMenu {
                name: "Sub".to_owned(),
                parent_id: Some(top),
                ..NewMenu::default()
            })
            .unwrap();
        let leaf = txn
            .create_menu(NewMenu {
                name: "Leaf".to_owned(),
                parent_id: Some(sub),
                ..NewMenu::default()
            })
            .unwrap();

        for parent in [top, sub, leaf] {
            let update = MenuUpdate {
                parent_id: Some(Some(parent)),
                ..MenuUpdate::default()
            };
            let err = txn.update_menu(top, &update).unwrap_err();
            assert_eq!(err.kind, StorageErrorKind::InvalidReference);
        }
        assert_eq!(txn.records().menu(top).unwrap().parent_id, None);

        // Moving a subtree elsewhere in the same tree is fine.
        let update = MenuUpdate {
            parent_id: Some(Some(top)),
            ..MenuUpdate::default()
        };
        txn.update_menu(leaf, &update).unwrap();
    }

    #[test]
    fn test_delete_menu_removes_subtree() {
        let (store, website, _) = seeded();
        let mut txn = store.begin();
        let top = txn
            .create_menu(NewMenu {
                name: "Top".to_owned(),
                website_id: Some(website),
                ..NewMenu::default()
            })
            .unwrap();
        let sub = txn
            .create_menu(NewMenu {
                name: "Sub".to_owned(),
                parent_id: Some(top),
                ..NewMenu::default()
            })
            .unwrap();
        let cyclic = MenuUpdate {
            parent_id: Some(Some(sub)),
            ..MenuUpdate::default()
        };
        assert!(txn.update_menu(top, &cyclic).is_err());

        txn.delete_menu(top).unwrap();
        assert!(txn.records().menu(top).is_none());
        assert!(txn.records().menu(sub).is_none());
        txn.commit().unwrap();
    }

    #[test]
    fn test_root_menus_ordered_by_sequence() {
        let (store, website, _) = seeded();
        let mut txn = store.begin();
        let menu = |name: &str, sequence| NewMenu {
            name: name.to_owned(),
            website_id: Some(website),
            sequence,
            ..NewMenu::default()
        };
        let second = txn.create_menu(menu("Second", 10)).unwrap();
        let first = txn.create_menu(menu("First", 1)).unwrap();
        txn.create_menu(NewMenu {
            parent_id: Some(first),
            ..menu("Child", 0)
        })
        .unwrap();
        txn.commit().unwrap();

        assert_eq!(store.snapshot().root_menus(website), vec![first, second]);
    }

    #[test]
    fn test_xml_id_requires_module_prefix() {
        let (store, _, home) = seeded();
        let mut txn = store.begin();

        assert!(txn.set_xml_id("home", ExternalRef::view(home)).is_err());
        txn.set_xml_id("website.home", ExternalRef::view(home)).unwrap();
        assert_eq!(
            txn.records().resolve_xml_id("website.home").unwrap(),
            ExternalRef::view(home)
        );
    }

    #[test]
    fn test_translations_and_model_fields() {
        let store = MemoryStore::new();
        let mut txn = store.begin();
        txn.set_translation("fr_FR", "Hello", "Bonjour");
        txn.set_model_fields("res.partner", vec!["name".to_owned()]);
        txn.commit().unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.translation("fr_FR", "Hello"), Some("Bonjour"));
        assert_eq!(snapshot.translation("de_DE", "Hello"), None);
        assert_eq!(snapshot.model_fields("res.partner"), Some(&["name".to_owned()][..]));
        assert!(snapshot.model_fields("res.users").is_none());
    }

    #[test]
    fn test_memory_store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MemoryStore>();
    }
}
