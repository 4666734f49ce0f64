pub mod parser;
pub mod tree;
pub mod details;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CatalogError, CatalogResult};

/// One timestamped event in a node's chronicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChronicleEvent {
    #[serde(rename = "type", default = "default_event_kind")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

fn default_event_kind() -> String {
    "event".to_string()
}

/// Chronicle records are usually objects, but the simulator occasionally
/// emits bare strings; those are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChronicleEntry {
    Event(ChronicleEvent),
    Note(Value),
}

/// Generated artwork attached to a node. The payload stays base64; the
/// browser only surfaces the generator metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeImage {
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// A node of the catalog document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogNode {
    pub category: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub statistics: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chronicle: Vec<ChronicleEntry>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<NodeImage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CatalogNode>,
}

impl CatalogNode {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_child(mut self, child: CatalogNode) -> Self {
        self.children.push(child);
        self
    }

    /// `category:name`, the node's identity among its siblings.
    pub fn token(&self) -> String {
        node_token(&self.category, &self.name)
    }

    /// The `metadata.dynamics` sub-document, when present.
    pub fn dynamics(&self) -> Option<&Map<String, Value>> {
        self.metadata.get("dynamics").and_then(Value::as_object)
    }

    /// Build a catalog from a decoded document.
    ///
    /// The root must be a mapping carrying string `category` and `name`
    /// fields. Descendants are lenient: non-mapping children are skipped and
    /// missing fields take their defaults. Descent uses an explicit work
    /// stack, so deeply nested documents cannot exhaust the call stack.
    pub fn from_document(document: &Value) -> CatalogResult<CatalogNode> {
        let root = document.as_object().ok_or_else(|| {
            CatalogError::MalformedDocument("catalog root is not a mapping".into())
        })?;
        for field in ["category", "name"] {
            if !root.get(field).map_or(false, Value::is_string) {
                return Err(CatalogError::MalformedDocument(format!(
                    "catalog root is missing a string '{}'",
                    field
                )));
            }
        }

        // Pre-order flatten: (shallow node, parent slot).
        let mut slots: Vec<Option<CatalogNode>> = Vec::new();
        let mut parents: Vec<Option<usize>> = Vec::new();
        let mut stack: Vec<(&Map<String, Value>, Option<usize>)> = vec![(root, None)];

        while let Some((map, parent)) = stack.pop() {
            let index = slots.len();
            slots.push(Some(shallow_node(map)));
            parents.push(parent);
            if let Some(children) = map.get("children").and_then(Value::as_array) {
                for child in children.iter().rev() {
                    if let Some(child_map) = child.as_object() {
                        stack.push((child_map, Some(index)));
                    }
                }
            }
        }

        // Every descendant has a larger index than its parent, so walking
        // backwards finishes a node's children before the node moves.
        for index in (1..slots.len()).rev() {
            let (Some(mut node), Some(parent)) = (slots[index].take(), parents[index]) else {
                continue;
            };
            node.children.reverse();
            if let Some(parent_node) = slots[parent].as_mut() {
                parent_node.children.push(node);
            }
        }

        let mut root_node = slots
            .first_mut()
            .and_then(Option::take)
            .ok_or_else(|| CatalogError::MalformedDocument("empty catalog".into()))?;
        root_node.children.reverse();
        Ok(root_node)
    }

    /// Total number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

/// Numeric reading of a loosely typed JSON field: numbers, numeric
/// strings and booleans.
pub(crate) fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Identity token for a raw category/name pair.
pub fn node_token(category: &str, name: &str) -> String {
    format!("{}:{}", category, name)
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn object_field(map: &Map<String, Value>, key: &str) -> Map<String, Value> {
    map.get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Every field of the node except its children.
fn shallow_node(map: &Map<String, Value>) -> CatalogNode {
    let chronicle = map
        .get("chronicle")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| serde_json::from_value::<ChronicleEntry>(e.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    let image = map
        .get("image")
        .filter(|v| v.is_object())
        .and_then(|v| serde_json::from_value::<NodeImage>(v.clone()).ok());

    CatalogNode {
        category: string_field(map, "category").unwrap_or_else(|| "object".into()),
        name: string_field(map, "name").unwrap_or_else(|| "Unnamed".into()),
        summary: string_field(map, "summary").unwrap_or_default(),
        description: string_field(map, "description").unwrap_or_default(),
        statistics: object_field(map, "statistics"),
        chronicle,
        metadata: object_field(map, "metadata"),
        image,
        children: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_nested_catalog_in_order() {
        let doc = json!({
            "category": "universe", "name": "Alpha",
            "children": [
                {"category": "galaxy", "name": "Milky", "children": [
                    {"category": "system", "name": "Sol"}
                ]},
                "not a node",
                {"category": "galaxy", "name": "Andromeda"}
            ]
        });
        let root = CatalogNode::from_document(&doc).unwrap();
        assert_eq!(root.token(), "universe:Alpha");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].name, "Milky");
        assert_eq!(root.children[0].children[0].token(), "system:Sol");
        assert_eq!(root.children[1].name, "Andromeda");
        assert_eq!(root.node_count(), 4);
    }

    #[test]
    fn rejects_non_mapping_root() {
        let err = CatalogNode::from_document(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedDocument(_)));
    }

    #[test]
    fn rejects_root_without_name() {
        let err = CatalogNode::from_document(&json!({"category": "universe"})).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedDocument(_)));
    }

    #[test]
    fn children_take_defaults() {
        let doc = json!({"category": "universe", "name": "A", "children": [{}]});
        let root = CatalogNode::from_document(&doc).unwrap();
        assert_eq!(root.children[0].token(), "object:Unnamed");
    }

    #[test]
    fn sparse_node_loads_with_defaults_and_serializes_compactly() {
        let doc = json!({
            "category": "moon", "name": "Luna",
            "summary": null, "statistics": "unknown", "metadata": [], "image": "broken"
        });
        let root = CatalogNode::from_document(&doc).unwrap();
        assert!(root.summary.is_empty());
        assert!(root.statistics.is_empty());
        assert!(root.metadata.is_empty());
        assert!(root.image.is_none());
        assert_eq!(
            serde_json::to_value(&root).unwrap(),
            json!({"category": "moon", "name": "Luna"})
        );
    }

    #[test]
    fn chronicle_keeps_events_and_notes() {
        let doc = json!({
            "category": "person", "name": "Ada",
            "chronicle": [
                {"type": "birth", "text": "Born", "timestamp": 0},
                "a loose note"
            ]
        });
        let root = CatalogNode::from_document(&doc).unwrap();
        assert_eq!(root.chronicle.len(), 2);
        match &root.chronicle[0] {
            ChronicleEntry::Event(ev) => {
                assert_eq!(ev.kind, "birth");
                assert_eq!(ev.timestamp, Some(0.0));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(root.chronicle[1], ChronicleEntry::Note(_)));
    }

    #[test]
    fn deep_documents_do_not_recurse() {
        let mut doc = json!({"category": "leaf", "name": "end"});
        for depth in 0..100 {
            doc = json!({"category": "level", "name": depth.to_string(), "children": [doc]});
        }
        let root = CatalogNode::from_document(&doc).unwrap();
        assert_eq!(root.node_count(), 101);
    }

    #[test]
    fn exposes_dynamics_block() {
        let doc = json!({
            "category": "planet", "name": "Earth",
            "metadata": {"dynamics": {"position": {"x": 1}}}
        });
        let root = CatalogNode::from_document(&doc).unwrap();
        assert!(root.dynamics().is_some());
    }
}
