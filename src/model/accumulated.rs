//! Representatives produced by the accumulation engine.

use std::sync::Arc;

use serde::Serialize;

use super::bbox::{BoundingBox, MultiBoundingBox};
use super::text::{TextColumn, TextLine};
use super::tree::{NodeId, SemanticTree};

/// What a node looks like once its subtree has been merged.
///
/// Either the node itself (leaves, and anything that passes a leaf through) or
/// a synthesized line or paragraph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccumulatedNode {
    /// An existing node stands for itself
    Node { id: NodeId },
    /// Children merged into one line
    Span { line: TextLine },
    /// Children folded into a block of lines
    Paragraph { paragraph: Paragraph },
}

impl AccumulatedNode {
    pub fn is_synthesized(&self) -> bool {
        !matches!(self, AccumulatedNode::Node { .. })
    }

    /// First text line, if the representative carries text.
    pub fn first_line<'a>(&'a self, tree: &'a SemanticTree) -> Option<&'a TextLine> {
        match self {
            AccumulatedNode::Node { id } => tree.node(*id).and_then(|n| n.content()),
            AccumulatedNode::Span { line } => Some(line),
            AccumulatedNode::Paragraph { paragraph } => paragraph.first_line(),
        }
    }

    /// Last text line, if the representative carries text.
    pub fn last_line<'a>(&'a self, tree: &'a SemanticTree) -> Option<&'a TextLine> {
        match self {
            AccumulatedNode::Paragraph { paragraph } => paragraph.last_line(),
            _ => self.first_line(tree),
        }
    }

    pub fn lines<'a>(&'a self, tree: &'a SemanticTree) -> Vec<&'a TextLine> {
        match self {
            AccumulatedNode::Paragraph { paragraph } => paragraph.lines().collect(),
            _ => self.first_line(tree).into_iter().collect(),
        }
    }

    /// Merged text, lines separated by a space.
    pub fn text(&self, tree: &SemanticTree) -> String {
        match self {
            AccumulatedNode::Node { id } => tree.leaf_text(*id),
            AccumulatedNode::Span { line } => line.text(),
            AccumulatedNode::Paragraph { paragraph } => paragraph.text(),
        }
    }

    /// Envelope of the representative.
    pub fn bbox(&self, tree: &SemanticTree) -> Option<BoundingBox> {
        match self {
            AccumulatedNode::Node { id } => tree.node(*id).map(|n| *n.bbox()),
            AccumulatedNode::Span { line } => Some(*line.bbox()),
            AccumulatedNode::Paragraph { paragraph } => Some(*paragraph.bbox().envelope()),
        }
    }
}

/// Lines folded together by the paragraph pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paragraph {
    columns: Vec<TextColumn>,
    bbox: MultiBoundingBox,
    one_line: bool,
    last_page: u32,
}

impl Paragraph {
    /// A one-line paragraph.
    pub fn from_line(line: TextLine) -> Self {
        Self {
            bbox: MultiBoundingBox::new(*line.bbox()),
            last_page: line.last_page(),
            columns: vec![TextColumn::new(line)],
            one_line: true,
        }
    }

    /// A paragraph with no text yet, covering `bbox`.
    pub fn empty(bbox: BoundingBox) -> Self {
        Self {
            columns: Vec::new(),
            bbox: MultiBoundingBox::new(bbox),
            one_line: true,
            last_page: bbox.page_end,
        }
    }

    pub fn columns(&self) -> &[TextColumn] {
        &self.columns
    }

    pub fn bbox(&self) -> &MultiBoundingBox {
        &self.bbox
    }

    /// Whether the paragraph still holds a single line.
    pub fn is_one_line(&self) -> bool {
        self.one_line
    }

    pub fn last_page(&self) -> u32 {
        self.last_page
    }

    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.columns.iter().flat_map(|c| c.lines())
    }

    pub fn line_count(&self) -> usize {
        self.lines().count()
    }

    pub fn first_line(&self) -> Option<&TextLine> {
        self.columns.first().and_then(|c| c.first_line())
    }

    pub fn last_line(&self) -> Option<&TextLine> {
        self.columns.last().and_then(|c| c.last_line())
    }

    pub fn last_column(&self) -> Option<&TextColumn> {
        self.columns.last()
    }

    pub fn text(&self) -> String {
        self.lines()
            .map(|l| l.text())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Append a line to the current column, or open a new column with it.
    pub(crate) fn push_line(&mut self, line: TextLine, new_column: bool) {
        self.bbox.union(line.bbox());
        self.last_page = self.last_page.max(line.last_page());
        match self.columns.last_mut() {
            Some(column) if !new_column => column.push_line(line),
            _ => self.columns.push(TextColumn::new(line)),
        }
        if self.line_count() > 1 {
            self.one_line = false;
        }
    }

    /// Append the columns of another paragraph. Its first column continues the
    /// current one unless `new_column` is set.
    pub(crate) fn push_paragraph(&mut self, other: &Paragraph, new_column: bool) {
        for (i, column) in other.columns.iter().enumerate() {
            match self.columns.last_mut() {
                Some(current) if i == 0 && !new_column => current.extend(column),
                _ => self.columns.push(column.clone()),
            }
        }
        self.bbox.union_multi(&other.bbox);
        self.last_page = self.last_page.max(other.last_page);
        if self.line_count() > 1 {
            self.one_line = false;
        }
    }

    /// Grow the box without adding text.
    pub(crate) fn cover(&mut self, bbox: &BoundingBox) {
        self.bbox.union(bbox);
        self.last_page = self.last_page.max(bbox.page_end);
    }

    /// Leave the one-line state after the first fold step.
    pub(crate) fn close_first_line(&mut self) {
        self.one_line = false;
    }
}

/// Node-to-representative index built by one accumulation run.
///
/// Keyed by node identity. Entries are immutable once recorded and shared
/// between a pass-through node and its only child.
#[derive(Debug, Clone, Default)]
pub struct AccumulatedNodeMap {
    entries: Vec<Option<Arc<AccumulatedNode>>>,
    len: usize,
}

impl AccumulatedNodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&AccumulatedNode> {
        self.entries.get(id.index()).and_then(|e| e.as_deref())
    }

    /// Shared handle to the entry for `id`.
    pub fn get_shared(&self, id: NodeId) -> Option<Arc<AccumulatedNode>> {
        self.entries.get(id.index()).and_then(|e| e.clone())
    }

    /// Record the representative of `id`. An existing entry is kept.
    pub(crate) fn insert(&mut self, id: NodeId, node: Arc<AccumulatedNode>) -> bool {
        let index = id.index();
        if index >= self.entries.len() {
            self.entries.resize(index + 1, None);
        }
        if self.entries[index].is_some() {
            log::debug!("Node {} already accumulated, keeping first entry", id);
            return false;
        }
        self.entries[index] = Some(node);
        self.len += 1;
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &AccumulatedNode)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_deref().map(|node| (NodeId::from_index(i), node)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextChunk;

    fn line(text: &str, page: u32, left: f64, baseline: f64) -> TextLine {
        TextLine::from_chunks(vec![TextChunk::new(
            text,
            "Calibri",
            10.0,
            BoundingBox::new(page, left, baseline - 2.0, left + 100.0, baseline + 8.0),
        )
        .with_baseline(baseline)])
        .unwrap()
    }

    #[test]
    fn test_paragraph_one_line_state() {
        let mut p = Paragraph::from_line(line("first", 0, 72.0, 700.0));
        assert!(p.is_one_line());
        p.push_line(line("second", 0, 72.0, 688.0), false);
        assert!(!p.is_one_line());
        assert_eq!(p.line_count(), 2);
        assert_eq!(p.first_line().map(|l| l.text()), Some("first".to_string()));
        assert_eq!(p.last_line().map(|l| l.text()), Some("second".to_string()));
        assert_eq!(p.text(), "first second");
    }

    #[test]
    fn test_paragraph_tracks_pages_and_columns() {
        let mut p = Paragraph::from_line(line("left column", 0, 72.0, 100.0));
        p.push_line(line("right column", 0, 320.0, 700.0), true);
        p.push_line(line("next page", 1, 72.0, 760.0), false);

        assert_eq!(p.columns().len(), 2);
        assert_eq!(p.last_page(), 1);
        assert_eq!(p.columns()[1].blocks().len(), 2);
        assert_eq!(p.bbox().boxes().len(), 2);
    }

    #[test]
    fn test_push_paragraph_continues_column() {
        let mut a = Paragraph::from_line(line("a1", 0, 72.0, 700.0));
        let mut b = Paragraph::from_line(line("b1", 0, 72.0, 676.0));
        b.push_line(line("b2", 0, 72.0, 664.0), false);

        a.push_paragraph(&b, false);
        assert_eq!(a.columns().len(), 1);
        assert_eq!(a.line_count(), 3);
        assert!(!a.is_one_line());
    }

    #[test]
    fn test_map_is_append_only() {
        let mut map = AccumulatedNodeMap::new();
        let id = NodeId::from_index(3);
        assert!(map.insert(id, Arc::new(AccumulatedNode::Node { id })));
        let other = NodeId::from_index(1);
        assert!(!map.insert(id, Arc::new(AccumulatedNode::Node { id: other })));

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(id), Some(&AccumulatedNode::Node { id }));
        assert!(!map.contains(other));
        assert_eq!(map.iter().count(), 1);
    }
}
