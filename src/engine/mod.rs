//! Accumulation engine.
//!
//! Walks a [`SemanticTree`](crate::model::SemanticTree) in strict post-order and
//! merges every subtree into a single representative:
//!
//! - a leaf stands for itself with score 1;
//! - a node with one child inherits the child's representative, type and score;
//! - a node with more children is split into runs by a [`BoundaryScan`]. A single
//!   run becomes a synthesized span; several runs fold into a paragraph.
//!
//! Per-document state lives in an [`AccumulationContext`], so independent
//! documents can be processed concurrently.

mod accumulator;
mod boundary;
mod context;
mod options;
mod paragraph;

pub use accumulator::Accumulator;
pub use boundary::BoundaryScan;
pub use context::{AccumulationContext, AccumulationStats};
pub use options::AccumulationOptions;
