//! JSON interchange format for semantic trees.
//!
//! An extractor hands over a flat list of node records. Children refer to other
//! records by index, and record `i` becomes the node with index `i`:
//!
//! ```json
//! {
//!   "nodes": [
//!     { "type": "DIV", "bbox": { "page_start": 0, "page_end": 0,
//!                                "left": 72, "bottom": 600, "right": 540, "top": 720 },
//!       "children": [1, 2] },
//!     { "type": "SPAN", "chunks": [ { "text": "Hello ", "font_name": "Calibri", ... } ] },
//!     { "type": "SPAN", "chunks": [ { "text": "world", "font_name": "Calibri", ... } ] }
//!   ]
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{BoundingBox, NodeId, SemanticTree, SemanticType, TextChunk};

/// A whole tree as exchanged with an extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeDocument {
    pub nodes: Vec<NodeRecord>,
}

/// One node of a [`TreeDocument`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Type assigned by the extractor
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub initial_type: Option<SemanticType>,

    /// Box of a node without text. Text leaves take the union of their chunks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,

    /// Text of a leaf, in reading order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chunks: Vec<TextChunk>,

    /// Indices of the children, in reading order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<usize>,
}

impl TreeDocument {
    /// Describe an existing tree. Annotations are not part of the format.
    pub fn from_tree(tree: &SemanticTree) -> Self {
        let nodes = tree
            .nodes()
            .map(|node| NodeRecord {
                initial_type: node.initial_type(),
                bbox: node.content().is_none().then(|| *node.bbox()),
                chunks: node.chunks().to_vec(),
                children: node.children().iter().map(|c| c.index()).collect(),
            })
            .collect();
        Self { nodes }
    }

    /// Build the tree, validating every record.
    pub fn into_tree(self) -> Result<SemanticTree> {
        let count = self.nodes.len();
        let mut tree = SemanticTree::with_capacity(count);
        let mut edges: Vec<(usize, Vec<usize>)> = Vec::with_capacity(count);

        for (index, record) in self.nodes.into_iter().enumerate() {
            if !record.chunks.is_empty() && !record.children.is_empty() {
                return Err(Error::InvalidTree(format!(
                    "node {} has both text and children",
                    index
                )));
            }
            if record.chunks.is_empty() {
                let bbox = record.bbox.ok_or_else(|| {
                    Error::InvalidTree(format!("node {} has neither a box nor text", index))
                })?;
                tree.add_node(record.initial_type, bbox);
            } else {
                tree.add_text_leaf(record.initial_type, record.chunks)?;
            }
            edges.push((index, record.children));
        }

        for (parent, children) in edges {
            for child in children {
                if child >= count {
                    return Err(Error::NodeNotFound(child));
                }
                tree.attach(NodeId::from_index(parent), NodeId::from_index(child))?;
            }
        }

        log::debug!("Loaded tree with {} nodes", tree.len());
        Ok(tree)
    }
}

/// Load a tree from a JSON string.
pub fn tree_from_json(json: &str) -> Result<SemanticTree> {
    let document: TreeDocument = serde_json::from_str(json)?;
    document.into_tree()
}

/// Load a tree from a reader producing JSON.
pub fn tree_from_reader<R: Read>(reader: R) -> Result<SemanticTree> {
    let document: TreeDocument = serde_json::from_reader(reader)?;
    document.into_tree()
}

/// Load a tree from a JSON file.
pub fn tree_from_file<P: AsRef<Path>>(path: P) -> Result<SemanticTree> {
    let file = File::open(path)?;
    tree_from_reader(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"{
        "nodes": [
            { "type": "DIV",
              "bbox": { "page_start": 0, "page_end": 0, "left": 0, "bottom": 90, "right": 100, "top": 110 },
              "children": [1, 2] },
            { "type": "SPAN",
              "chunks": [ { "text": "Hello ", "font_name": "Calibri", "font_size": 10.0, "baseline": 100.0,
                            "bbox": { "page_start": 0, "page_end": 0, "left": 0, "bottom": 98, "right": 30, "top": 108 } } ] },
            { "chunks": [ { "text": "world", "font_name": "Calibri", "font_size": 10.0, "baseline": 100.0,
                            "color": [0.0],
                            "bbox": { "page_start": 0, "page_end": 0, "left": 30, "bottom": 98, "right": 60, "top": 108 } } ] }
        ]
    }"#;

    #[test]
    fn test_load_simple_tree() {
        let tree = tree_from_json(SIMPLE).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.roots(), vec![NodeId::from_index(0)]);

        let root = &tree[NodeId::from_index(0)];
        assert_eq!(root.initial_type(), Some(SemanticType::Div));
        assert_eq!(root.children().len(), 2);

        let second = &tree[NodeId::from_index(2)];
        assert_eq!(second.initial_type(), None);
        assert_eq!(second.chunks()[0].font_weight, 400.0);
        assert_eq!(tree.leaf_text(NodeId::from_index(0)), "Hello world");
    }

    #[test]
    fn test_round_trip_through_document() {
        let tree = tree_from_json(SIMPLE).unwrap();
        let document = TreeDocument::from_tree(&tree);
        let json = serde_json::to_string(&document).unwrap();
        let reloaded = tree_from_json(&json).unwrap();
        assert_eq!(TreeDocument::from_tree(&reloaded), document);
    }

    #[test]
    fn test_rejects_invalid_records() {
        let missing_box = r#"{ "nodes": [ { "type": "FIGURE" } ] }"#;
        assert!(matches!(tree_from_json(missing_box), Err(Error::InvalidTree(_))));

        let dangling = r#"{ "nodes": [ { "bbox": { "page_start": 0, "page_end": 0, "left": 0,
            "bottom": 0, "right": 1, "top": 1 }, "children": [4] } ] }"#;
        assert!(matches!(tree_from_json(dangling), Err(Error::NodeNotFound(4))));

        let cycle = r#"{ "nodes": [
            { "bbox": { "page_start": 0, "page_end": 0, "left": 0, "bottom": 0, "right": 1, "top": 1 }, "children": [1] },
            { "bbox": { "page_start": 0, "page_end": 0, "left": 0, "bottom": 0, "right": 1, "top": 1 }, "children": [0] }
        ] }"#;
        assert!(matches!(tree_from_json(cycle), Err(Error::CycleDetected(_))));

        let unknown_type = r#"{ "nodes": [ { "type": "BLINK",
            "bbox": { "page_start": 0, "page_end": 0, "left": 0, "bottom": 0, "right": 1, "top": 1 } } ] }"#;
        assert!(matches!(tree_from_json(unknown_type), Err(Error::Json(_))));

        assert!(matches!(tree_from_json("not json"), Err(Error::Json(_))));
    }
}
