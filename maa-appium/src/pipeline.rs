//! Pipeline documents and the structural walks performed on them.
//!
//! A pipeline is the executor's task graph: a JSON object mapping node names
//! to node definitions. Custom actions receive fragments of it as parameters
//! and hand rewritten copies back to the executor, so everything here works on
//! `serde_json` values and never on the caller's original document.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::actions::FOR_EACH;
use crate::coordinate::{CoordinateResolver, COORDINATE_FIELDS};
use crate::errors::AutomationError;

/// Node name -> node definition.
pub type Pipeline = Map<String, Value>;

/// Node a pipeline starts from unless told otherwise.
pub const ENTRY_NODE: &str = "Entry";

/// Key holding a custom action's parameter payload.
pub const CUSTOM_ACTION_PARAM: &str = "custom_action_param";
/// Key naming the custom action of a node.
pub const CUSTOM_ACTION: &str = "custom_action";

/// Depth-first visitor that rewrites every occurrence of a field name.
///
/// `skip` decides, for a node and one of its keys, whether that key's subtree
/// is off limits. The leaf transform is applied to the field's value wherever
/// it appears, then the walk continues into every nested object that is not
/// skipped. Arrays are leaves.
pub struct TreeWalker<S> {
    skip: S,
}

impl<S> TreeWalker<S>
where
    S: Fn(&Map<String, Value>, &str) -> bool,
{
    pub fn new(skip: S) -> Self {
        Self { skip }
    }

    pub fn walk<F>(&self, node: &mut Map<String, Value>, field: &str, leaf: &mut F)
    where
        F: FnMut(&mut Value),
    {
        if let Some(value) = node.get_mut(field) {
            leaf(value);
        }

        let skipped: Vec<String> = node
            .keys()
            .filter(|key| (self.skip)(node, key))
            .cloned()
            .collect();

        for (key, child) in node.iter_mut() {
            if skipped.iter().any(|s| s == key) {
                continue;
            }
            if let Value::Object(map) = child {
                self.walk(map, field, leaf);
            }
        }
    }
}

/// The parameter payload of a `ForEach` node is a template whose placeholders
/// belong to each iteration, not to the enclosing pipeline.
pub fn is_template_payload(node: &Map<String, Value>, key: &str) -> bool {
    key == CUSTOM_ACTION_PARAM
        && node
            .get(CUSTOM_ACTION)
            .and_then(Value::as_str)
            .is_some_and(|name| name == FOR_EACH)
}

/// Walker used for coordinate resolution.
pub fn pipeline_walker() -> TreeWalker<fn(&Map<String, Value>, &str) -> bool> {
    TreeWalker::new(is_template_payload as fn(&Map<String, Value>, &str) -> bool)
}

/// Resolve all eight coordinate fields of a copy of `pipeline`.
pub fn resolve_coordinates(pipeline: &Pipeline, resolver: &CoordinateResolver) -> Pipeline {
    let mut resolved = pipeline.clone();
    let walker = pipeline_walker();
    for field in COORDINATE_FIELDS {
        walker.walk(&mut resolved, field, &mut |value| resolver.resolve_field(value));
    }
    resolved
}

/// One step of a [`SubstitutionTarget`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{i}"),
            PathSegment::Key(k) => write!(f, "{k}"),
        }
    }
}

/// Ordered keys from the pipeline root down to the leaf a value is written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubstitutionTarget(pub Vec<PathSegment>);

impl SubstitutionTarget {
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    fn display_prefix(&self, len: usize) -> String {
        let parts: Vec<String> = self.0[..len].iter().map(ToString::to_string).collect();
        format!("/{}", parts.join("/"))
    }

    /// Borrow the leaf this path points at. Every segment must already exist.
    pub fn locate_mut<'a>(&self, root: &'a mut Value) -> Result<&'a mut Value, AutomationError> {
        if self.0.is_empty() {
            return Err(AutomationError::InvalidParameter(
                "substitution target path is empty".to_string(),
            ));
        }

        let mut current = root;
        for (depth, segment) in self.0.iter().enumerate() {
            let missing = || AutomationError::MissingPathSegment {
                path: self.display_prefix(depth),
                segment: segment.to_string(),
            };
            current = match current {
                Value::Object(map) => {
                    let key = segment.to_string();
                    map.get_mut(&key).ok_or_else(missing)?
                }
                Value::Array(items) => {
                    let index = match segment {
                        PathSegment::Index(i) => Some(*i),
                        PathSegment::Key(k) => k.parse::<usize>().ok(),
                    };
                    index
                        .and_then(|i| items.get_mut(i))
                        .ok_or_else(missing)?
                }
                _ => return Err(missing()),
            };
        }
        Ok(current)
    }

    /// Check the path against `root` without modifying it.
    pub fn validate(&self, root: &Value) -> Result<(), AutomationError> {
        let mut scratch = root.clone();
        self.locate_mut(&mut scratch).map(|_| ())
    }

    pub fn write(&self, root: &mut Value, value: Value) -> Result<(), AutomationError> {
        *self.locate_mut(root)? = value;
        Ok(())
    }
}
