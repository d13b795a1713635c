//! JSON export of an accumulated tree.

use serde::Serialize;

use crate::error::Result;
use crate::model::{
    AccumulatedNode, AccumulatedNodeMap, BoundingBox, NodeId, SemanticTree, SemanticType,
};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Kind of representative a node accumulated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepresentativeKind {
    Node,
    Span,
    Paragraph,
}

/// One node as exported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub initial_type: Option<SemanticType>,
    pub inferred_type: Option<SemanticType>,
    pub score: Option<f64>,
    /// `None` when the node was never accumulated
    pub kind: Option<RepresentativeKind>,
    /// Accumulated text, lines joined by a space
    pub text: Option<String>,
    /// Envelope of the representative
    pub bbox: Option<BoundingBox>,
    pub line_count: usize,
}

/// Export every node, in arena order.
pub fn annotated_nodes(tree: &SemanticTree, map: &AccumulatedNodeMap) -> Vec<AnnotatedNode> {
    tree.nodes()
        .map(|node| {
            let representative = map.get(node.id());
            let kind = representative.map(|r| match r {
                AccumulatedNode::Node { .. } => RepresentativeKind::Node,
                AccumulatedNode::Span { .. } => RepresentativeKind::Span,
                AccumulatedNode::Paragraph { .. } => RepresentativeKind::Paragraph,
            });
            let text = representative
                .map(|r| r.text(tree))
                .filter(|text| !text.is_empty());

            AnnotatedNode {
                id: node.id(),
                parent: node.parent(),
                children: node.children().to_vec(),
                initial_type: node.initial_type(),
                inferred_type: node.inferred_type(),
                score: node.score(),
                kind,
                text,
                bbox: representative.and_then(|r| r.bbox(tree)),
                line_count: representative.map_or(0, |r| r.lines(tree).len()),
            }
        })
        .collect()
}

/// Convert an accumulated tree to JSON.
pub fn to_json(tree: &SemanticTree, map: &AccumulatedNodeMap, format: JsonFormat) -> Result<String> {
    let nodes = annotated_nodes(tree, map);
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&nodes)?,
        JsonFormat::Compact => serde_json::to_string(&nodes)?,
    };
    Ok(json)
}
