//! Arena-backed semantic tree.
//!
//! Nodes are addressed by [`NodeId`], a stable index into the arena. Identity is
//! never derived from geometry: two nodes with identical boxes are still two
//! distinct keys.

use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::bbox::BoundingBox;
use super::text::{TextChunk, TextLine};
use crate::error::{Error, Result};

/// Stable handle of a node inside its [`SemanticTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Semantic role of a node.
///
/// Serialized by tag name: `"SPAN"`, `"PARAGRAPH"`, `"H1"`..`"H6"` for numbered
/// headings, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SemanticType {
    Document,
    Part,
    Section,
    Div,
    /// A single line or run of text
    Span,
    /// A block of lines
    Paragraph,
    /// A heading without an explicit level
    Heading,
    /// A heading with level 1-6
    NumberHeading(u8),
    Caption,
    List,
    ListItem,
    ListLabel,
    ListBody,
    Table,
    TableRow,
    TableHeader,
    TableCell,
    Figure,
    Formula,
    Note,
    TableOfContents,
    TableOfContentsItem,
    Link,
    Annotation,
    Form,
}

impl SemanticType {
    pub fn is_span(self) -> bool {
        self == SemanticType::Span
    }

    pub fn is_heading(self) -> bool {
        matches!(self, SemanticType::Heading | SemanticType::NumberHeading(_))
    }

    /// Heading level for numbered headings.
    pub fn heading_level(self) -> Option<u8> {
        match self {
            SemanticType::NumberHeading(level) => Some(level),
            _ => None,
        }
    }

    pub fn tag(self) -> String {
        match self {
            SemanticType::Document => "DOCUMENT".into(),
            SemanticType::Part => "PART".into(),
            SemanticType::Section => "SECTION".into(),
            SemanticType::Div => "DIV".into(),
            SemanticType::Span => "SPAN".into(),
            SemanticType::Paragraph => "PARAGRAPH".into(),
            SemanticType::Heading => "HEADING".into(),
            SemanticType::NumberHeading(level) => format!("H{}", level),
            SemanticType::Caption => "CAPTION".into(),
            SemanticType::List => "LIST".into(),
            SemanticType::ListItem => "LIST_ITEM".into(),
            SemanticType::ListLabel => "LIST_LABEL".into(),
            SemanticType::ListBody => "LIST_BODY".into(),
            SemanticType::Table => "TABLE".into(),
            SemanticType::TableRow => "TABLE_ROW".into(),
            SemanticType::TableHeader => "TABLE_HEADER".into(),
            SemanticType::TableCell => "TABLE_CELL".into(),
            SemanticType::Figure => "FIGURE".into(),
            SemanticType::Formula => "FORMULA".into(),
            SemanticType::Note => "NOTE".into(),
            SemanticType::TableOfContents => "TOC".into(),
            SemanticType::TableOfContentsItem => "TOC_ITEM".into(),
            SemanticType::Link => "LINK".into(),
            SemanticType::Annotation => "ANNOTATION".into(),
            SemanticType::Form => "FORM".into(),
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

impl FromStr for SemanticType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_ascii_uppercase();
        let ty = match tag.as_str() {
            "DOCUMENT" => SemanticType::Document,
            "PART" => SemanticType::Part,
            "SECTION" | "SECT" => SemanticType::Section,
            "DIV" => SemanticType::Div,
            "SPAN" => SemanticType::Span,
            "PARAGRAPH" | "P" => SemanticType::Paragraph,
            "HEADING" | "H" => SemanticType::Heading,
            "CAPTION" => SemanticType::Caption,
            "LIST" | "L" => SemanticType::List,
            "LIST_ITEM" | "LI" => SemanticType::ListItem,
            "LIST_LABEL" | "LBL" => SemanticType::ListLabel,
            "LIST_BODY" | "LBODY" => SemanticType::ListBody,
            "TABLE" => SemanticType::Table,
            "TABLE_ROW" | "TR" => SemanticType::TableRow,
            "TABLE_HEADER" | "TH" => SemanticType::TableHeader,
            "TABLE_CELL" | "TD" => SemanticType::TableCell,
            "FIGURE" => SemanticType::Figure,
            "FORMULA" => SemanticType::Formula,
            "NOTE" => SemanticType::Note,
            "TOC" => SemanticType::TableOfContents,
            "TOC_ITEM" | "TOCI" => SemanticType::TableOfContentsItem,
            "LINK" => SemanticType::Link,
            "ANNOTATION" | "ANNOT" => SemanticType::Annotation,
            "FORM" => SemanticType::Form,
            other => match other.strip_prefix('H').and_then(|n| n.parse::<u8>().ok()) {
                Some(level) if (1..=6).contains(&level) => SemanticType::NumberHeading(level),
                _ => return Err(Error::Other(format!("Unknown semantic type: {}", s))),
            },
        };
        Ok(ty)
    }
}

impl TryFrom<String> for SemanticType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SemanticType> for String {
    fn from(ty: SemanticType) -> Self {
        ty.tag()
    }
}

/// A node of the semantic tree.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    initial_type: Option<SemanticType>,
    inferred_type: Option<SemanticType>,
    score: Option<f64>,
    bbox: BoundingBox,
    content: Option<TextLine>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Type assigned by the extractor. Never changes.
    pub fn initial_type(&self) -> Option<SemanticType> {
        self.initial_type
    }

    /// Type assigned by the engine or a later pass.
    pub fn inferred_type(&self) -> Option<SemanticType> {
        self.inferred_type
    }

    /// Confidence of the inferred type, once written.
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Text carried by a leaf, as one line.
    pub fn content(&self) -> Option<&TextLine> {
        self.content.as_ref()
    }

    pub fn chunks(&self) -> &[TextChunk] {
        self.content.as_ref().map(|l| l.chunks()).unwrap_or(&[])
    }
}

/// An n-ary tree of nodes owned by one document-processing run.
#[derive(Debug, Clone, Default)]
pub struct SemanticTree {
    nodes: Vec<Node>,
}

impl SemanticTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a detached node without text.
    pub fn add_node(&mut self, initial_type: Option<SemanticType>, bbox: BoundingBox) -> NodeId {
        self.push(initial_type, bbox, None)
    }

    /// Add a detached text leaf. Its box is the union of the chunk boxes.
    pub fn add_text_leaf(
        &mut self,
        initial_type: Option<SemanticType>,
        chunks: Vec<TextChunk>,
    ) -> Result<NodeId> {
        let line = TextLine::from_chunks(chunks).ok_or_else(|| {
            Error::InvalidTree("a text leaf needs at least one chunk".to_string())
        })?;
        let bbox = *line.bbox();
        Ok(self.push(initial_type, bbox, Some(line)))
    }

    fn push(
        &mut self,
        initial_type: Option<SemanticType>,
        bbox: BoundingBox,
        content: Option<TextLine>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            parent: None,
            children: Vec::new(),
            initial_type,
            inferred_type: None,
            score: None,
            bbox,
            content,
        });
        id
    }

    /// Append `child` to the children of `parent`.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check(parent)?;
        self.check(child)?;
        if self.nodes[child.0].parent.is_some() {
            return Err(Error::AlreadyAttached(child.0));
        }
        // A childless node cannot be an ancestor of anything.
        let has_children = !self.nodes[child.0].children.is_empty();
        if parent == child || (has_children && self.ancestors(parent).any(|a| a == child)) {
            return Err(Error::CycleDetected(child.0));
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    /// Create a node and append it to `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        initial_type: Option<SemanticType>,
        bbox: BoundingBox,
    ) -> Result<NodeId> {
        self.check(parent)?;
        let child = self.add_node(initial_type, bbox);
        self.attach(parent, child)?;
        Ok(child)
    }

    /// Create a text leaf and append it to `parent`.
    pub fn add_text_child(
        &mut self,
        parent: NodeId,
        initial_type: Option<SemanticType>,
        chunks: Vec<TextChunk>,
    ) -> Result<NodeId> {
        self.check(parent)?;
        let child = self.add_text_leaf(initial_type, chunks)?;
        self.attach(parent, child)?;
        Ok(child)
    }

    fn check(&self, id: NodeId) -> Result<()> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(Error::NodeNotFound(id.0))
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    /// Nodes without a parent, in arena order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.parent.is_none())
            .map(|n| n.id)
            .collect()
    }

    /// Walk from the parent of `id` up to its root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Number of edges between `id` and its root.
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Pre-order descendants of `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            result.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        result
    }

    /// Post-order of the subtree rooted at `root`, without recursion.
    pub fn post_order_from(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        if self.check(root).is_err() {
            return order;
        }
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            stack.extend(self.children(id).iter().rev().map(|&c| (c, false)));
        }
        order
    }

    /// Post-order over every root, roots taken in arena order.
    pub fn post_order(&self) -> Vec<NodeId> {
        self.roots()
            .into_iter()
            .flat_map(|root| self.post_order_from(root))
            .collect()
    }

    /// Text of all leaves under `id`, in reading order.
    pub fn leaf_text(&self, id: NodeId) -> String {
        std::iter::once(id)
            .chain(self.descendants(id))
            .filter_map(|n| self.nodes[n.0].content.as_ref())
            .map(|line| line.text())
            .collect()
    }

    /// Overwrite the inferred type and score of a node.
    ///
    /// The initial type is left untouched.
    pub fn reclassify(
        &mut self,
        id: NodeId,
        inferred_type: Option<SemanticType>,
        score: f64,
    ) -> Result<()> {
        self.check(id)?;
        self.set_annotation(id, inferred_type, score);
        Ok(())
    }

    pub(crate) fn set_annotation(
        &mut self,
        id: NodeId,
        inferred_type: Option<SemanticType>,
        score: f64,
    ) {
        let node = &mut self.nodes[id.0];
        node.inferred_type = inferred_type;
        node.score = Some(score.clamp(0.0, 1.0));
    }

    /// Forget every inferred type and score.
    pub fn clear_annotations(&mut self) {
        for node in &mut self.nodes {
            node.inferred_type = None;
            node.score = None;
        }
    }
}

impl Index<NodeId> for SemanticTree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}
