//! Structural well-formedness checks on combined views.

use crate::arch::Node;

/// Checks applied to every view type: non-empty tags, and numeric
/// `colspan`/`col` attributes.
pub fn check_generic(root: &Node) -> Vec<String> {
    let mut errors = Vec::new();
    for node in root.iter() {
        if node.tag.trim().is_empty() {
            errors.push("Element with an empty tag name".to_owned());
        }
        for attr in ["colspan", "col"] {
            if let Some(value) = node.get(attr)
                && value.trim().parse::<u32>().is_err()
            {
                errors.push(format!(
                    "Attribute {attr}={value:?} on <{}> must be a non-negative integer",
                    node.tag
                ));
            }
        }
    }
    errors
}

/// Checks specific to structured (non-template) views.
pub fn check_structured(root: &Node) -> Vec<String> {
    let mut errors = Vec::new();
    check_structured_node(root, None, &mut errors);
    errors
}

fn check_structured_node(node: &Node, parent: Option<&str>, errors: &mut Vec<String>) {
    match node.tag.as_str() {
        "field" if !node.has("name") => {
            errors.push("<field> requires a name attribute".to_owned());
        }
        "page" if parent != Some("notebook") => {
            errors.push("<page> must be a direct child of <notebook>".to_owned());
        }
        "label" if !node.has("for") && !node.has("string") => {
            errors.push("<label> requires a for or string attribute".to_owned());
        }
        _ => {}
    }
    for child in &node.children {
        check_structured_node(child, Some(&node.tag), errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::parse;

    #[test]
    fn test_generic_accepts_numeric_colspan() {
        let root = parse(r#"<form><group col="4"><field name="a" colspan="2"/></group></form>"#)
            .unwrap();
        assert!(check_generic(&root).is_empty());
    }

    #[test]
    fn test_generic_rejects_bad_colspan() {
        let root = parse(r#"<div><td colspan="two"/><td col="-1"/></div>"#).unwrap();
        assert_eq!(check_generic(&root).len(), 2);
    }

    #[test]
    fn test_generic_rejects_empty_tag() {
        let root = Node::new("div").with_child(Node::new(""));
        assert_eq!(check_generic(&root).len(), 1);
    }

    #[test]
    fn test_structured_rules() {
        let valid = parse(
            r#"<form><notebook><page><field name="a"/><label for="a"/><label string="X"/></page></notebook></form>"#,
        )
        .unwrap();
        assert!(check_structured(&valid).is_empty());

        let invalid = parse("<form><page/><field/><label/></form>").unwrap();
        let errors = check_structured(&invalid);
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("<page>"));
        assert!(errors[1].contains("<field>"));
        assert!(errors[2].contains("<label>"));
    }
}
