//! Field postprocessing of structured views against their model.

use wm_storage::Records;

use crate::arch::Node;

/// Every `<field name>` in `root` must be declared on `model`.
///
/// Children of a `<field>` describe a subview of another model and are not
/// checked against `model`.
pub fn check_fields(records: &dyn Records, model: &str, root: &Node) -> Result<(), String> {
    let fields = records
        .model_fields(model)
        .ok_or_else(|| format!("Model not found: {model}"))?;

    let mut missing = Vec::new();
    collect_missing(root, fields, &mut missing);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "Field(s) {} do not exist in model {model}",
            missing.join(", ")
        ))
    }
}

fn collect_missing<'a>(node: &'a Node, fields: &[String], missing: &mut Vec<&'a str>) {
    if node.tag == "field" {
        if let Some(name) = node.get("name")
            && !fields.iter().any(|field| field == name)
        {
            missing.push(name);
        }
        return;
    }
    for child in &node.children {
        collect_missing(child, fields, missing);
    }
}

#[cfg(test)]
mod tests {
    use wm_storage::{MemoryStore, Store};

    use super::*;
    use crate::arch::parse;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        let mut txn = store.begin();
        txn.set_model_fields("res.partner", vec!["name".to_owned(), "child_ids".to_owned()]);
        txn.commit().unwrap();
        store
    }

    #[test]
    fn test_known_fields_pass() {
        let root = parse(
            r#"<form><field name="name"/><field name="child_ids"><tree><field name="unrelated"/></tree></field></form>"#,
        )
        .unwrap();
        assert!(check_fields(store().snapshot().as_ref(), "res.partner", &root).is_ok());
    }

    #[test]
    fn test_unknown_field_fails() {
        let root = parse(r#"<form><field name="name"/><field name="nope"/></form>"#).unwrap();
        let err = check_fields(store().snapshot().as_ref(), "res.partner", &root).unwrap_err();
        assert!(err.contains("nope"));
        assert!(!err.contains("name,"));
    }

    #[test]
    fn test_unknown_model_fails() {
        let root = parse("<form/>").unwrap();
        let err = check_fields(store().snapshot().as_ref(), "res.users", &root).unwrap_err();
        assert!(err.contains("res.users"));
    }
}
