//! Override merger: per-website filtering of inheriting fragments.

use wm_storage::{Fragment, Records, ViewId};

use crate::scope::Scope;

/// Fragments extending `base` for `model` that apply to `scope`.
///
/// A fragment owned by a website other than `scope.website_id` is dropped;
/// shared fragments and fragments owned by the requesting website keep their
/// `(priority, id)` order. A scope without a website keeps shared fragments
/// only.
pub fn applicable_fragments(
    records: &dyn Records,
    base: ViewId,
    model: Option<&str>,
    scope: &Scope,
) -> Vec<Fragment> {
    records
        .inheriting_views(base, model)
        .into_iter()
        .filter(|fragment| {
            fragment
                .website_id
                .is_none_or(|owner| scope.website_id == Some(owner))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use wm_storage::{MemoryStore, NewView, NewWebsite, Store, WebsiteId};

    use super::*;

    fn ids(fragments: &[Fragment]) -> Vec<ViewId> {
        fragments.iter().map(|f| f.view_id).collect()
    }

    #[test]
    fn test_filters_other_websites_and_keeps_order() {
        let store = MemoryStore::new();
        let mut txn = store.begin();
        let w1 = txn.create_website(NewWebsite::named("one.com")).unwrap();
        let w2 = txn.create_website(NewWebsite::named("two.com")).unwrap();
        let base = txn.create_view(NewView::qweb("Base", "<div/>")).unwrap();
        let fragment = |name: &str, website: Option<WebsiteId>, priority| {
            let view = NewView::qweb(name, "<data/>")
                .inheriting(base)
                .with_priority(priority);
            match website {
                Some(id) => view.with_website(id),
                None => view,
            }
        };
        let own = txn.create_view(fragment("own", Some(w1), 10)).unwrap();
        let shared = txn.create_view(fragment("shared", None, 5)).unwrap();
        let other = txn.create_view(fragment("other", Some(w2), 1)).unwrap();
        txn.commit().unwrap();
        let snapshot = store.snapshot();

        let for_w1 = applicable_fragments(snapshot.as_ref(), base, None, &Scope::for_website(w1));
        assert_eq!(ids(&for_w1), vec![shared, own]);

        let for_w2 = applicable_fragments(snapshot.as_ref(), base, None, &Scope::for_website(w2));
        assert_eq!(ids(&for_w2), vec![other, shared]);

        let unscoped = applicable_fragments(snapshot.as_ref(), base, None, &Scope::default());
        assert_eq!(ids(&unscoped), vec![shared]);
    }

    #[test]
    fn test_never_returns_foreign_fragments() {
        let store = MemoryStore::new();
        let mut txn = store.begin();
        let websites: Vec<WebsiteId> = (0..3)
            .map(|i| txn.create_website(NewWebsite::named(format!("w{i}.com"))).unwrap())
            .collect();
        let base = txn.create_view(NewView::qweb("Base", "<div/>")).unwrap();
        for (i, website) in websites.iter().enumerate() {
            txn.create_view(
                NewView::qweb(format!("f{i}"), "<data/>")
                    .inheriting(base)
                    .with_website(*website),
            )
            .unwrap();
        }
        txn.commit().unwrap();
        let snapshot = store.snapshot();

        for website in &websites {
            let fragments =
                applicable_fragments(snapshot.as_ref(), base, None, &Scope::for_website(*website));
            assert_eq!(fragments.len(), 1);
            assert!(fragments.iter().all(|f| f.website_id == Some(*website)));
        }
    }
}
