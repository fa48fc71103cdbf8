//! Line-annotated document nodes.
//!
//! A [`Node`] is a YAML/JSON value that remembers the 1-based line it was
//! parsed from. Mappings keep their entries in document order together with
//! the key nodes, so the line of a logical id or property name is available
//! as well as the line of its value.

use serde_json::{Map, Value};

/// A node of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// 1-based source line (0 for nodes built in memory)
    pub line: usize,
    pub value: NodeValue,
}

/// The shape of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValue {
    Scalar(String),
    Mapping(Vec<(Node, Node)>),
    Sequence(Vec<Node>),
}

impl Node {
    pub fn scalar(line: usize, value: impl Into<String>) -> Self {
        Self {
            line,
            value: NodeValue::Scalar(value.into()),
        }
    }

    pub fn mapping(line: usize, entries: Vec<(Node, Node)>) -> Self {
        Self {
            line,
            value: NodeValue::Mapping(entries),
        }
    }

    pub fn sequence(line: usize, items: Vec<Node>) -> Self {
        Self {
            line,
            value: NodeValue::Sequence(items),
        }
    }

    /// Build a `{Ref: target}` node.
    pub fn reference(line: usize, target: impl Into<String>) -> Self {
        Self::mapping(
            line,
            vec![(Node::scalar(line, "Ref"), Node::scalar(line, target))],
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Scalar(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(Node, Node)]> {
        match &self.value {
            NodeValue::Mapping(entries) => Some(entries.as_slice()),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match &self.value {
            NodeValue::Sequence(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.value, NodeValue::Scalar(_))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self.value, NodeValue::Mapping(_))
    }

    /// Interpret a scalar as a boolean (`true`/`false`, any case).
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_str()?.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    /// Interpret a scalar as an integer.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_str()?.trim().parse().ok()
    }

    /// Iterate over mapping entries. Non-mapping nodes yield nothing.
    pub fn entries(&self) -> impl Iterator<Item = (&Node, &Node)> {
        self.as_mapping()
            .unwrap_or_default()
            .iter()
            .map(|(k, v)| (k, v))
    }

    /// Look up a mapping entry, returning both the key and value nodes.
    pub fn get_entry(&self, key: &str) -> Option<(&Node, &Node)> {
        self.entries().find(|(k, _)| k.as_str() == Some(key))
    }

    /// Look up a mapping value by key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.get_entry(key).map(|(_, v)| v)
    }

    /// Follow a path of mapping keys.
    pub fn find(&self, path: &[&str]) -> Option<&Node> {
        path.iter().try_fold(self, |node, key| node.get(key))
    }

    /// Scalar value at a path of mapping keys.
    pub fn find_str(&self, path: &[&str]) -> Option<&str> {
        self.find(path).and_then(Node::as_str)
    }

    /// The parameter name of a long-form `{Ref: Name}` node.
    pub fn ref_target(&self) -> Option<&str> {
        match self.as_mapping()? {
            [(key, value)] if key.as_str() == Some("Ref") => value.as_str(),
            _ => None,
        }
    }

    /// Convert to a plain JSON value, dropping line information.
    pub fn to_json(&self) -> Value {
        match &self.value {
            NodeValue::Scalar(s) => Value::String(s.clone()),
            NodeValue::Sequence(items) => Value::Array(items.iter().map(Node::to_json).collect()),
            NodeValue::Mapping(entries) => {
                let mut map = Map::new();
                for (k, v) in entries {
                    let key = k.as_str().map(str::to_string).unwrap_or_default();
                    map.insert(key, v.to_json());
                }
                Value::Object(map)
            }
        }
    }
}
