//! Document model types.
//!
//! This module defines the raw layout content handed over by an extractor
//! (boxes, chunks, lines), the arena tree that carries it, and the
//! representatives the accumulation engine synthesizes for each node.

mod accumulated;
mod bbox;
mod text;
mod tree;

pub use accumulated::{AccumulatedNode, AccumulatedNodeMap, Paragraph};
pub use bbox::{BoundingBox, MultiBoundingBox, DEFAULT_EPSILON};
pub use text::{Color, TextBlock, TextChunk, TextColumn, TextExtent, TextLine};
pub use tree::{Node, NodeId, SemanticTree, SemanticType};
