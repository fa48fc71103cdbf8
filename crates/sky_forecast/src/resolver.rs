//! Parameter reference resolution.
//!
//! Builds a resolved copy of a property tree in which every long-form
//! `{Ref: Name}` whose `Name` has a deploy-time value is replaced by that
//! value. References to unknown names (pseudo parameters, other resources)
//! are left untouched, so checks that depend on them see the reference.
//!
//! The source tree is never modified. A substituted scalar keeps the line of
//! the reference it replaced.

use std::collections::BTreeMap;

use sky_template::{Node, NodeValue};

/// Return a copy of `node` with parameter references substituted.
pub fn resolve_refs(node: &Node, params: &BTreeMap<String, String>) -> Node {
    if let Some(target) = node.ref_target() {
        if let Some(value) = params.get(target) {
            return Node::scalar(node.line, value.clone());
        }
        return node.clone();
    }

    match &node.value {
        NodeValue::Scalar(_) => node.clone(),
        NodeValue::Mapping(entries) => Node::mapping(
            node.line,
            entries
                .iter()
                .map(|(k, v)| (k.clone(), resolve_refs(v, params)))
                .collect(),
        ),
        NodeValue::Sequence(items) => Node::sequence(
            node.line,
            items.iter().map(|item| resolve_refs(item, params)).collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sky_template::Template;

    fn params() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("BucketName".to_string(), "web-assets".to_string()),
            ("Port".to_string(), "443".to_string()),
        ])
    }

    fn properties(yaml: &str) -> Node {
        let template = Template::parse(yaml).unwrap();
        template.root.get("Properties").unwrap().clone()
    }

    #[test]
    fn test_resolves_known_parameter() {
        let props = properties("Properties:\n  BucketName:\n    Ref: BucketName\n");
        let resolved = resolve_refs(&props, &params());
        let name = resolved.get("BucketName").unwrap();
        assert_eq!(name.as_str(), Some("web-assets"));
        // keeps the line of the reference site
        assert_eq!(name.line, props.get("BucketName").unwrap().line);
    }

    #[test]
    fn test_unknown_reference_untouched() {
        let props =
            properties("Properties:\n  VpcId:\n    Ref: Vpc\n  Region:\n    Ref: AWS::Region\n");
        let resolved = resolve_refs(&props, &params());
        assert_eq!(resolved.get("VpcId").unwrap().ref_target(), Some("Vpc"));
        assert_eq!(resolved.get("Region").unwrap().ref_target(), Some("AWS::Region"));
        assert_eq!(resolved, props);
    }

    #[test]
    fn test_resolves_inside_sequences_and_nested_mappings() {
        let props = properties(
            "Properties:\n  Rules:\n    - FromPort:\n        Ref: Port\n      ToPort: 443\n    - Ref: Port\n  Tags:\n    - Key: name\n      Value:\n        Ref: BucketName\n",
        );
        let resolved = resolve_refs(&props, &params());

        let rules = resolved.get("Rules").unwrap().as_sequence().unwrap();
        assert_eq!(rules[0].get("FromPort").and_then(Node::as_str), Some("443"));
        assert_eq!(rules[1].as_str(), Some("443"));
        let tags = resolved.get("Tags").unwrap().as_sequence().unwrap();
        assert_eq!(tags[0].get("Value").and_then(Node::as_str), Some("web-assets"));
    }

    #[test]
    fn test_source_tree_is_not_modified() {
        let props = properties("Properties:\n  BucketName:\n    Ref: BucketName\n");
        let before = props.clone();
        let _ = resolve_refs(&props, &params());
        assert_eq!(props, before);
    }
}
