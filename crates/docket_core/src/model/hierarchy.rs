//! Nested view over flat, path-keyed documents.
//!
//! # Invariants
//! - Output does not depend on the iteration order of the input.
//! - A prefix that is also a document key carries its own fields and its
//!   `children` side by side.
//! - Keys at each level are exactly the distinct next segments seen below
//!   that prefix.

use crate::model::document::Document;
use crate::model::path::segments;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const CHILDREN_FIELD: &str = "children";

/// One node of the reconstructed document tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentNode {
    /// The document's own fields. Empty for pure intermediate nodes.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// Child nodes keyed by their last path segment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<BTreeMap<String, DocumentNode>>,
}

impl DocumentNode {
    pub fn child(&self, segment: &str) -> Option<&DocumentNode> {
        self.children.as_ref()?.get(segment)
    }
}

/// Builds the nested tree for a flat `path -> document` map.
///
/// A document field literally named `children` is dropped from its node,
/// since that name is reserved for the nested map.
pub fn unflatten_documents<'a, I>(flat: I) -> BTreeMap<String, DocumentNode>
where
    I: IntoIterator<Item = (&'a String, &'a Document)>,
{
    let mut roots: BTreeMap<String, DocumentNode> = BTreeMap::new();

    for (path, document) in flat {
        let mut parts = segments(path).into_iter().peekable();
        let mut level = &mut roots;
        while let Some(segment) = parts.next() {
            let node = level.entry(segment.to_string()).or_default();
            if parts.peek().is_none() {
                node.fields = document
                    .fields()
                    .iter()
                    .filter(|(field, _)| field.as_str() != CHILDREN_FIELD)
                    .map(|(field, value)| (field.clone(), value.clone()))
                    .collect();
                break;
            }
            level = node.children.get_or_insert_with(BTreeMap::new);
        }
    }

    roots
}
