//! Template loading.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use crate::error::{TemplateError, TemplateResult};
use crate::node::Node;

/// A parsed, line-annotated template.
///
/// The template is never modified after parsing. Consumers that need a
/// rewritten view of part of it (for example, properties with parameter
/// references substituted) build their own copy.
#[derive(Debug, Clone)]
pub struct Template {
    pub root: Node,
    pub source: Option<PathBuf>,
}

impl Template {
    /// Parse a YAML or JSON template.
    pub fn parse(text: &str) -> TemplateResult<Self> {
        let mut loader = Loader::default();
        Parser::new_from_str(text)
            .load(&mut loader, false)
            .map_err(|e| TemplateError::Parse(e.to_string()))?;
        let root = loader.root.ok_or(TemplateError::InvalidRoot)?;
        if !root.is_mapping() {
            return Err(TemplateError::InvalidRoot);
        }
        Ok(Self { root, source: None })
    }

    /// Read and parse a template file.
    pub fn from_file(path: impl AsRef<Path>) -> TemplateResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TemplateError::NotFound(path.to_path_buf()));
        }
        debug!("Reading template from {:?}", path);

        let content = fs::read_to_string(path)?;
        let mut template = Self::parse(&content)?;
        template.source = Some(path.to_path_buf());
        Ok(template)
    }

    /// The `Resources` section, if present.
    pub fn resources(&self) -> Option<&Node> {
        self.root.get("Resources")
    }

    /// Number of entries in the `Resources` section.
    pub fn resource_count(&self) -> usize {
        self.resources().map(|r| r.entries().count()).unwrap_or(0)
    }

    /// `Default` values declared in the `Parameters` section.
    pub fn parameter_defaults(&self) -> BTreeMap<String, String> {
        let mut defaults = BTreeMap::new();
        if let Some(params) = self.root.get("Parameters") {
            for (name, param) in params.entries() {
                if let (Some(name), Some(default)) =
                    (name.as_str(), param.get("Default").and_then(Node::as_str))
                {
                    defaults.insert(name.to_string(), default.to_string());
                }
            }
        }
        defaults
    }

    /// File stem of the source path, used as a default stack name.
    pub fn base_name(&self) -> Option<String> {
        self.source
            .as_ref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().to_string())
    }
}

/// Builds [`Node`]s from parser events.
///
/// Short-form intrinsic tags are expanded into their long form while
/// loading, so `!Ref Name` becomes `{Ref: Name}` and `!Sub ...` becomes
/// `{Fn::Sub: ...}`. The expanded mapping keeps the line of the tagged node.
#[derive(Default)]
struct Loader {
    stack: Vec<Frame>,
    anchors: HashMap<usize, Node>,
    root: Option<Node>,
}

struct Frame {
    line: usize,
    anchor: usize,
    tag: Option<Tag>,
    kind: FrameKind,
}

enum FrameKind {
    Mapping {
        entries: Vec<(Node, Node)>,
        key: Option<Node>,
    },
    Sequence(Vec<Node>),
}

impl Loader {
    fn push_value(&mut self, node: Node) {
        let Some(frame) = self.stack.last_mut() else {
            if self.root.is_none() {
                self.root = Some(node);
            }
            return;
        };
        match &mut frame.kind {
            FrameKind::Sequence(items) => items.push(node),
            FrameKind::Mapping { entries, key } => match key.take() {
                Some(k) => entries.push((k, node)),
                None => *key = Some(node),
            },
        }
    }

    fn finish(&mut self, node: Node, anchor: usize, tag: Option<Tag>) {
        let node = expand_tag(tag, node);
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
        self.push_value(node);
    }

    fn open(&mut self, line: usize, anchor: usize, tag: Option<Tag>, kind: FrameKind) {
        self.stack.push(Frame {
            line,
            anchor,
            tag,
            kind,
        });
    }

    fn close(&mut self) {
        if let Some(frame) = self.stack.pop() {
            let node = match frame.kind {
                FrameKind::Mapping { entries, .. } => Node::mapping(frame.line, entries),
                FrameKind::Sequence(items) => Node::sequence(frame.line, items),
            };
            self.finish(node, frame.anchor, frame.tag);
        }
    }
}

impl MarkedEventReceiver for Loader {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        let line = mark.line();
        match ev {
            Event::Scalar(value, style, anchor, tag) => {
                let is_null =
                    matches!(style, TScalarStyle::Plain) && (value == "~" || value == "null");
                let value = if is_null { String::new() } else { value };
                self.finish(Node::scalar(line, value), anchor, tag);
            }
            Event::MappingStart(anchor, tag) => self.open(
                line,
                anchor,
                tag,
                FrameKind::Mapping {
                    entries: Vec::new(),
                    key: None,
                },
            ),
            Event::SequenceStart(anchor, tag) => {
                self.open(line, anchor, tag, FrameKind::Sequence(Vec::new()))
            }
            Event::MappingEnd | Event::SequenceEnd => self.close(),
            Event::Alias(anchor) => {
                let node = self
                    .anchors
                    .get(&anchor)
                    .cloned()
                    .unwrap_or_else(|| Node::scalar(line, ""));
                self.push_value(node);
            }
            _ => {}
        }
    }
}

/// Rewrite a locally tagged node as a one-entry intrinsic mapping.
fn expand_tag(tag: Option<Tag>, node: Node) -> Node {
    let Some(tag) = tag.filter(|t| t.handle == "!") else {
        return node;
    };
    let line = node.line;
    let (key, value) = match tag.suffix.as_str() {
        "Ref" | "Condition" => (tag.suffix.clone(), node),
        "GetAtt" => ("Fn::GetAtt".to_string(), split_get_att(node)),
        suffix => (format!("Fn::{}", suffix), node),
    };
    Node::mapping(line, vec![(Node::scalar(line, key), value)])
}

/// `!GetAtt Res.Attr` is shorthand for `[Res, Attr]`.
fn split_get_att(node: Node) -> Node {
    let line = node.line;
    match node.as_str().and_then(|s| s.split_once('.')) {
        Some((resource, attribute)) => Node::sequence(
            line,
            vec![Node::scalar(line, resource), Node::scalar(line, attribute)],
        ),
        None => node,
    }
}
