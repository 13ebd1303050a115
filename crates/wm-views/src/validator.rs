//! Write-time integrity validation.

use std::collections::{BTreeSet, HashSet};

use wm_storage::{Records, ViewId, WebsiteId};

use crate::arch::Node;
use crate::combine::{read_combined, root_view};
use crate::error::ViewError;
use crate::postprocess::check_fields;
use crate::schema::{ArchVersion, SchemaGrammar};
use crate::scope::Scope;
use crate::structure::{check_generic, check_structured};

/// Version assumed for documents without a `version` attribute.
const DEFAULT_VERSION: &str = "7.0";

/// Guarantees a view never persists in a state that fails to render.
///
/// Views are combined from the records passed in (the uncommitted
/// transaction state), never from a cache.
pub struct IntegrityValidator {
    grammar: Box<dyn SchemaGrammar>,
    threshold: ArchVersion,
}

impl IntegrityValidator {
    /// Documents whose `version` is below `threshold` are also checked
    /// against `grammar`.
    pub fn new(grammar: Box<dyn SchemaGrammar>, threshold: ArchVersion) -> Self {
        Self { grammar, threshold }
    }

    /// Validate every view in `view_ids`, failing on the first invalid one.
    pub fn validate(&self, records: &dyn Records, view_ids: &[ViewId]) -> Result<(), ViewError> {
        for &view_id in view_ids {
            self.validate_view(records, view_id)?;
        }
        Ok(())
    }

    fn validate_view(&self, records: &dyn Records, view_id: ViewId) -> Result<(), ViewError> {
        let fail = |reason: String| ViewError::Validation { view_id, reason };

        let view = records
            .view(view_id)
            .ok_or_else(|| ViewError::NotFound(view_id.to_string()))?;
        let scope = Scope::default().with_website(view.website_id);
        let combined =
            read_combined(records, view_id, &scope).map_err(|e| fail(e.to_string()))?;
        // A shared view also renders under every website extending its tree.
        if view.website_id.is_none() {
            for website_id in extending_websites(records, view_id).map_err(fail)? {
                read_combined(records, view_id, &Scope::for_website(website_id))
                    .map_err(|e| fail(format!("{e} (website {website_id})")))?;
            }
        }

        if !view.view_type.is_template() {
            let model = view
                .model
                .as_deref()
                .ok_or_else(|| fail(format!("{} view has no model", view.view_type.as_str())))?;
            check_fields(records, model, &combined).map_err(fail)?;

            let docs: Vec<&Node> = if combined.tag == "data" {
                combined.children.iter().collect()
            } else {
                vec![&combined]
            };
            for doc in docs {
                self.check_grammar(view_id, doc).map_err(fail)?;
                report(check_structured(doc)).map_err(fail)?;
            }
        }

        report(check_generic(&combined)).map_err(fail)
    }

    fn check_grammar(&self, view_id: ViewId, doc: &Node) -> Result<(), String> {
        let version = doc.get("version").unwrap_or(DEFAULT_VERSION);
        let parsed = ArchVersion::parse(version)
            .ok_or_else(|| format!("Invalid view version {version:?}"))?;
        if parsed >= self.threshold {
            return Ok(());
        }

        let errors = self.grammar.validate(doc);
        for error in &errors {
            tracing::error!(view_id = %view_id, "{error}");
        }
        report(errors)
    }
}

/// Websites owning at least one view in the inheritance tree of `view_id`.
fn extending_websites(
    records: &dyn Records,
    view_id: ViewId,
) -> Result<BTreeSet<WebsiteId>, String> {
    let root = root_view(records, view_id).map_err(|e| e.to_string())?;
    let model = records.view(root).and_then(|view| view.model.as_deref());

    let mut websites = BTreeSet::new();
    let mut seen = HashSet::from([root]);
    let mut pending = vec![root];
    while let Some(parent) = pending.pop() {
        for fragment in records.inheriting_views(parent, model) {
            if seen.insert(fragment.view_id) {
                websites.extend(fragment.website_id);
                pending.push(fragment.view_id);
            }
        }
    }
    Ok(websites)
}

fn report(errors: Vec<String>) -> Result<(), String> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use wm_storage::{MemoryStore, NewView, NewWebsite, Store, ViewType, ViewUpdate};

    use super::*;
    use crate::schema::LegacyViewGrammar;

    fn validator() -> IntegrityValidator {
        IntegrityValidator::new(Box::new(LegacyViewGrammar), ArchVersion::from_parts([7]))
    }

    fn store_with_partner() -> MemoryStore {
        let store = MemoryStore::new();
        let mut txn = store.begin();
        txn.set_model_fields("res.partner", vec!["name".to_owned(), "email".to_owned()]);
        txn.commit().unwrap();
        store
    }

    fn form(arch: &str) -> NewView {
        NewView::structured("Partner form", ViewType::Form, "res.partner", arch)
    }

    #[test]
    fn test_valid_form() {
        let store = store_with_partner();
        let mut txn = store.begin();
        let id = txn
            .create_view(form(r#"<form><field name="name"/><field name="email"/></form>"#))
            .unwrap();

        assert!(validator().validate(txn.records(), &[id]).is_ok());
    }

    #[test]
    fn test_unknown_field_in_combined_arch() {
        let store = store_with_partner();
        let mut txn = store.begin();
        let base = txn
            .create_view(form(r#"<form><field name="name"/></form>"#))
            .unwrap();
        let mut fragment = form(r#"<xpath expr="//form"><field name="phone"/></xpath>"#).inheriting(base);
        fragment.priority = 20;
        let child = txn.create_view(fragment).unwrap();

        let err = validator().validate(txn.records(), &[child]).unwrap_err();
        assert!(matches!(err, ViewError::Validation { view_id, ref reason } if view_id == child && reason.contains("phone")));
    }

    #[test]
    fn test_legacy_version_runs_grammar() {
        let store = store_with_partner();
        let mut txn = store.begin();
        let legacy = txn
            .create_view(form(r#"<form version="6.1"><field name="name"/><table/></form>"#))
            .unwrap();
        let current = txn
            .create_view(form(r#"<form><field name="name"/><table/></form>"#))
            .unwrap();

        let err = validator().validate(txn.records(), &[legacy]).unwrap_err();
        assert!(err.to_string().contains("<table>"));
        assert!(validator().validate(txn.records(), &[current]).is_ok());
    }

    #[test]
    fn test_data_wrapper_checks_each_document() {
        let store = store_with_partner();
        let mut txn = store.begin();
        let id = txn
            .create_view(form(
                r#"<data><form><field name="name"/></form><form version="6.0"><bogus/></form></data>"#,
            ))
            .unwrap();

        let err = validator().validate(txn.records(), &[id]).unwrap_err();
        assert!(err.to_string().contains("<bogus>"));
    }

    #[test]
    fn test_structure_check_on_structured_views() {
        let store = store_with_partner();
        let mut txn = store.begin();
        let id = txn.create_view(form("<form><page/></form>")).unwrap();

        let err = validator().validate(txn.records(), &[id]).unwrap_err();
        assert!(err.to_string().contains("<page>"));
    }

    #[test]
    fn test_generic_check_on_templates() {
        let store = MemoryStore::new();
        let mut txn = store.begin();
        let ok = txn
            .create_view(NewView::qweb("Ok", r#"<table><td colspan="2"><page/></td></table>"#))
            .unwrap();
        let bad = txn
            .create_view(NewView::qweb("Bad", r#"<table><td colspan="x"/></table>"#))
            .unwrap();

        assert!(validator().validate(txn.records(), &[ok]).is_ok());
        assert!(validator().validate(txn.records(), &[bad]).is_err());
    }

    #[test]
    fn test_unparsable_arch() {
        let store = MemoryStore::new();
        let mut txn = store.begin();
        let id = txn.create_view(NewView::qweb("Broken", "<div>")).unwrap();

        assert!(matches!(
            validator().validate(txn.records(), &[id]),
            Err(ViewError::Validation { .. })
        ));
    }

    #[test]
    fn test_unknown_entity_reported() {
        let store = MemoryStore::new();
        let mut txn = store.begin();
        let id = txn
            .create_view(NewView::qweb("Entity", "<p>a&nbsp;b</p>"))
            .unwrap();

        let err = validator().validate(txn.records(), &[id]).unwrap_err();
        assert!(err.to_string().contains("&nbsp;"));
    }

    #[test]
    fn test_website_view_validated_in_its_website_scope() {
        let store = MemoryStore::new();
        let mut txn = store.begin();
        let w1 = txn.create_website(NewWebsite::named("one.com")).unwrap();
        let w2 = txn.create_website(NewWebsite::named("two.com")).unwrap();
        let base = txn.create_view(NewView::qweb("Base", "<div/>")).unwrap();
        // Only applies on w2, where its target exists.
        txn.create_view(
            NewView::qweb("Nav", r#"<xpath expr="//div"><nav/></xpath>"#)
                .inheriting(base)
                .with_website(w2),
        )
        .unwrap();
        let w1_fragment = txn
            .create_view(
                NewView::qweb("Broken", r#"<xpath expr="//nav"><p/></xpath>"#)
                    .inheriting(base)
                    .with_website(w1),
            )
            .unwrap();

        let err = validator().validate(txn.records(), &[w1_fragment]).unwrap_err();
        assert!(err.to_string().contains("cannot be located"));
    }

    #[test]
    fn test_shared_view_checked_against_website_fragments() {
        let store = MemoryStore::new();
        let mut txn = store.begin();
        let w1 = txn.create_website(NewWebsite::named("one.com")).unwrap();
        let base = txn
            .create_view(NewView::qweb("Base", "<main><p>body</p></main>"))
            .unwrap();
        let shared = txn
            .create_view(NewView::qweb("Shared", r#"<xpath expr="//main"><aside/></xpath>"#).inheriting(base))
            .unwrap();
        txn.create_view(
            NewView::qweb("Nav", r#"<xpath expr="//p" position="before"><nav/></xpath>"#)
                .inheriting(shared)
                .with_website(w1),
        )
        .unwrap();
        assert!(validator().validate(txn.records(), &[base, shared]).is_ok());

        txn.update_view(base, &ViewUpdate::default().arch("<main/>"))
            .unwrap();

        let err = validator().validate(txn.records(), &[base]).unwrap_err();
        assert!(matches!(err, ViewError::Validation { view_id, .. } if view_id == base));
        assert!(err.to_string().contains(&format!("website {w1}")));
    }
}
