//! Text content primitives: chunks, lines, blocks and columns.
//!
//! These are produced by an upstream extractor and are read-only input to the
//! accumulation engine. The engine builds new lines and paragraphs out of them
//! but never edits a chunk in place.

use serde::{Deserialize, Serialize};

use super::bbox::{BoundingBox, MultiBoundingBox, DEFAULT_EPSILON};

/// Font weight at or above which a chunk counts as bold.
const BOLD_WEIGHT: f64 = 700.0;

/// A fill color with one (gray), three (RGB) or four (CMYK) components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(Vec<f64>);

impl Color {
    pub fn gray(value: f64) -> Self {
        Self(vec![value])
    }

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self(vec![r, g, b])
    }

    pub fn cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        Self(vec![c, m, y, k])
    }

    pub fn black() -> Self {
        Self::gray(0.0)
    }

    pub fn components(&self) -> &[f64] {
        &self.0
    }

    /// Component-wise comparison. Colors in different color spaces never match.
    pub fn approx_eq(&self, other: &Color, epsilon: f64) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

fn default_font_weight() -> f64 {
    400.0
}

/// A run of text drawn with one font, size, color and baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// The text content
    pub text: String,
    /// Font name (e.g., "Calibri-Bold")
    pub font_name: String,
    /// Font size in points
    pub font_size: f64,
    /// Font weight (400 = regular, 700 = bold)
    #[serde(default = "default_font_weight")]
    pub font_weight: f64,
    /// Italic angle in degrees (0 for upright fonts)
    #[serde(default)]
    pub italic_angle: f64,
    /// Fill color
    #[serde(default)]
    pub color: Color,
    /// Baseline Y coordinate
    pub baseline: f64,
    /// Page-stamped bounding box
    pub bbox: BoundingBox,
}

impl TextChunk {
    /// Create a chunk in regular black text whose baseline is the bottom of its box.
    pub fn new(
        text: impl Into<String>,
        font_name: impl Into<String>,
        font_size: f64,
        bbox: BoundingBox,
    ) -> Self {
        Self {
            text: text.into(),
            font_name: font_name.into(),
            font_size,
            font_weight: default_font_weight(),
            italic_angle: 0.0,
            color: Color::black(),
            baseline: bbox.bottom,
            bbox,
        }
    }

    pub fn with_baseline(mut self, baseline: f64) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_font_weight(mut self, weight: f64) -> Self {
        self.font_weight = weight;
        self
    }

    pub fn with_italic_angle(mut self, angle: f64) -> Self {
        self.italic_angle = angle;
        self
    }

    pub fn page(&self) -> u32 {
        self.bbox.page_start
    }

    pub fn width(&self) -> f64 {
        self.bbox.width()
    }

    /// Whether the chunk holds only whitespace.
    pub fn is_whitespace(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }

    /// Check if the chunk appears to be bold.
    pub fn is_bold(&self) -> bool {
        let name = self.font_name.to_lowercase();
        self.font_weight >= BOLD_WEIGHT
            || name.contains("bold")
            || name.contains("black")
            || name.contains("heavy")
    }

    /// Check if the chunk appears to be italic.
    pub fn is_italic(&self) -> bool {
        let name = self.font_name.to_lowercase();
        self.italic_angle.abs() > DEFAULT_EPSILON
            || name.contains("italic")
            || name.contains("oblique")
    }
}

/// Geometry and font metrics shared by everything the merge model compares.
pub trait TextExtent {
    /// Representative font size in points.
    fn font_size(&self) -> f64;

    /// Representative baseline Y coordinate.
    fn baseline(&self) -> f64;

    fn bbox(&self) -> &BoundingBox;

    /// Whether the first character is whitespace.
    fn starts_with_whitespace(&self) -> bool;

    /// Whether the last character is whitespace.
    fn ends_with_whitespace(&self) -> bool;
}

impl TextExtent for TextChunk {
    fn font_size(&self) -> f64 {
        self.font_size
    }

    fn baseline(&self) -> f64 {
        self.baseline
    }

    fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    fn starts_with_whitespace(&self) -> bool {
        self.text.chars().next().is_some_and(char::is_whitespace)
    }

    fn ends_with_whitespace(&self) -> bool {
        self.text.chars().next_back().is_some_and(char::is_whitespace)
    }
}

/// A line of chunks sharing a visual baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    chunks: Vec<TextChunk>,
    bbox: BoundingBox,
    font_size: f64,
    baseline: f64,
}

impl TextLine {
    /// Build a line from chunks in reading order.
    ///
    /// Font size and baseline come from the size that covers the most horizontal
    /// space, not the most chunks: a line of one long body run and three short
    /// superscript markers reports the body size. Returns `None` for no chunks.
    pub fn from_chunks(chunks: Vec<TextChunk>) -> Option<Self> {
        let bbox = union_boxes(chunks.iter().map(|c| &c.bbox))?;

        // (font size, total width, index of the widest chunk with that size)
        let mut coverage: Vec<(f64, f64, usize)> = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let width = chunk.width().max(0.0);
            match coverage
                .iter_mut()
                .find(|(size, _, _)| (size - chunk.font_size).abs() <= DEFAULT_EPSILON)
            {
                Some(entry) => {
                    entry.1 += width;
                    if width > chunks[entry.2].width() {
                        entry.2 = i;
                    }
                }
                None => coverage.push((chunk.font_size, width, i)),
            }
        }

        let mut dominant = coverage[0];
        for entry in &coverage[1..] {
            if entry.1 > dominant.1 {
                dominant = *entry;
            }
        }
        let representative = &chunks[dominant.2];
        let (font_size, baseline) = (representative.font_size, representative.baseline);

        Some(Self {
            chunks,
            bbox,
            font_size,
            baseline,
        })
    }

    /// Join lines into one synthesized line.
    ///
    /// Chunks are concatenated in order and boxes unioned. Metrics come from the
    /// tallest chunk; the first one wins a tie.
    pub fn join<'a>(lines: impl IntoIterator<Item = &'a TextLine>) -> Option<Self> {
        let chunks: Vec<TextChunk> = lines
            .into_iter()
            .flat_map(|line| line.chunks.iter().cloned())
            .collect();
        let bbox = union_boxes(chunks.iter().map(|c| &c.bbox))?;

        let mut tallest = &chunks[0];
        for chunk in &chunks[1..] {
            if chunk.font_size > tallest.font_size {
                tallest = chunk;
            }
        }
        let (font_size, baseline) = (tallest.font_size, tallest.baseline);

        Some(Self {
            chunks,
            bbox,
            font_size,
            baseline,
        })
    }

    pub fn chunks(&self) -> &[TextChunk] {
        &self.chunks
    }

    pub fn first_chunk(&self) -> &TextChunk {
        &self.chunks[0]
    }

    pub fn last_chunk(&self) -> &TextChunk {
        &self.chunks[self.chunks.len() - 1]
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn page(&self) -> u32 {
        self.bbox.page_start
    }

    pub fn last_page(&self) -> u32 {
        self.bbox.page_end
    }

    /// Concatenated chunk text.
    pub fn text(&self) -> String {
        self.chunks.iter().map(|c| c.text.as_str()).collect()
    }

    /// Check if the line is predominantly bold, weighted by text length.
    pub fn is_bold(&self) -> bool {
        let bold_chars: usize = self
            .chunks
            .iter()
            .filter(|c| c.is_bold())
            .map(|c| c.text.len())
            .sum();
        let total_chars: usize = self.chunks.iter().map(|c| c.text.len()).sum();
        total_chars > 0 && bold_chars as f64 / total_chars as f64 > 0.5
    }
}

impl TextExtent for TextLine {
    fn font_size(&self) -> f64 {
        self.font_size
    }

    fn baseline(&self) -> f64 {
        self.baseline
    }

    fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    fn starts_with_whitespace(&self) -> bool {
        self.first_chunk().starts_with_whitespace()
    }

    fn ends_with_whitespace(&self) -> bool {
        self.last_chunk().ends_with_whitespace()
    }
}

/// Consecutive lines on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    lines: Vec<TextLine>,
    bbox: BoundingBox,
}

impl TextBlock {
    pub fn new(line: TextLine) -> Self {
        Self {
            bbox: *line.bbox(),
            lines: vec![line],
        }
    }

    pub fn push(&mut self, line: TextLine) {
        self.bbox.union(line.bbox());
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[TextLine] {
        &self.lines
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn page(&self) -> u32 {
        self.bbox.page_start
    }

    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Blocks read top to bottom, possibly continuing across pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextColumn {
    blocks: Vec<TextBlock>,
    bbox: MultiBoundingBox,
}

impl TextColumn {
    pub fn new(line: TextLine) -> Self {
        Self {
            bbox: MultiBoundingBox::new(*line.bbox()),
            blocks: vec![TextBlock::new(line)],
        }
    }

    /// Append a line, opening a new block when the page changes.
    pub fn push_line(&mut self, line: TextLine) {
        self.bbox.union(line.bbox());
        match self.blocks.last_mut() {
            Some(block) if block.page() == line.page() && line.bbox().is_single_page() => {
                block.push(line)
            }
            _ => self.blocks.push(TextBlock::new(line)),
        }
    }

    /// Append every line of `other`, in order.
    pub fn extend(&mut self, other: &TextColumn) {
        for line in other.lines() {
            self.push_line(line.clone());
        }
    }

    pub fn blocks(&self) -> &[TextBlock] {
        &self.blocks
    }

    pub fn bbox(&self) -> &MultiBoundingBox {
        &self.bbox
    }

    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.blocks.iter().flat_map(|b| b.lines.iter())
    }

    pub fn first_line(&self) -> Option<&TextLine> {
        self.blocks.first().and_then(|b| b.lines.first())
    }

    pub fn last_line(&self) -> Option<&TextLine> {
        self.blocks.last().and_then(|b| b.lines.last())
    }

    pub fn first_page(&self) -> u32 {
        self.bbox.envelope().page_start
    }

    pub fn last_page(&self) -> u32 {
        self.bbox.envelope().page_end
    }
}

fn union_boxes<'a>(mut boxes: impl Iterator<Item = &'a BoundingBox>) -> Option<BoundingBox> {
    let first = *boxes.next()?;
    Some(boxes.fold(first, |acc, b| acc.united(b)))
}
