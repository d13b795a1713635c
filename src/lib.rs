//! # semtree
//!
//! Bottom-up semantic accumulation over document layout trees.
//!
//! An extractor hands over a tree whose leaves carry positioned text chunks.
//! This library walks the tree in post-order, decides with a typographic and
//! geometric merge model which children belong to one line or one paragraph, and
//! writes an inferred semantic type and a confidence score onto every node.
//!
//! ## Quick Start
//!
//! ```
//! use semtree::model::{BoundingBox, SemanticTree, SemanticType, TextChunk};
//!
//! let mut tree = SemanticTree::new();
//! let root = tree.add_node(None, BoundingBox::new(0, 0.0, 90.0, 100.0, 110.0));
//! for (text, left, right) in [("Hello ", 0.0, 30.0), ("world", 30.0, 60.0)] {
//!     let bbox = BoundingBox::new(0, left, 98.0, right, 108.0);
//!     let chunk = TextChunk::new(text, "Calibri", 10.0, bbox).with_baseline(100.0);
//!     tree.add_text_child(root, Some(SemanticType::Span), vec![chunk])?;
//! }
//!
//! let context = semtree::accumulate(&mut tree);
//! assert_eq!(tree[root].inferred_type(), Some(SemanticType::Span));
//! assert_eq!(context.map().get(root).map(|n| n.text(&tree)), Some("Hello world".to_string()));
//! # Ok::<(), semtree::Error>(())
//! ```
//!
//! ## Features
//!
//! - **Merge model**: chunk, line, paragraph and column merge probabilities,
//!   including superscript and subscript detection
//! - **Accumulation engine**: iterative post-order, safe on arbitrarily deep trees
//! - **Pipeline stages**: later passes add annotation layers without touching
//!   the accumulated content
//! - **Parallel processing**: uses Rayon for batches of independent documents
//! - **JSON interchange**: load trees from an extractor, export annotated trees

pub mod engine;
pub mod error;
pub mod merge;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod render;

// Re-export commonly used types
pub use engine::{AccumulationContext, AccumulationOptions, AccumulationStats, Accumulator};
pub use error::{Error, Result};
pub use merge::{MergeConfig, MergeModel};
pub use model::{AccumulatedNode, AccumulatedNodeMap, NodeId, SemanticTree, SemanticType};
pub use parser::{tree_from_file, tree_from_json, tree_from_reader};
pub use pipeline::{Pipeline, PipelineResult, SemanticPass};
pub use render::JsonFormat;

use std::path::Path;

use rayon::prelude::*;

/// Accumulate a tree with default options.
///
/// Every node receives an inferred type and a score; the returned context maps
/// every node to its representative.
pub fn accumulate(tree: &mut SemanticTree) -> AccumulationContext {
    Accumulator::default().accumulate(tree)
}

/// Accumulate a tree with custom options.
///
/// # Example
///
/// ```
/// use semtree::{accumulate_with_options, AccumulationOptions, SemanticTree};
///
/// let mut tree = SemanticTree::new();
/// let options = AccumulationOptions::new().with_column_continuation(true);
/// let context = accumulate_with_options(&mut tree, options);
/// assert!(context.map().is_empty());
/// ```
pub fn accumulate_with_options(
    tree: &mut SemanticTree,
    options: AccumulationOptions,
) -> AccumulationContext {
    Accumulator::new(options).accumulate(tree)
}

/// Accumulate independent documents, each with its own context.
///
/// Documents are processed in parallel unless `options.parallel` is off. The
/// contexts are returned in input order.
pub fn accumulate_documents(
    trees: &mut [SemanticTree],
    options: &AccumulationOptions,
) -> Vec<AccumulationContext> {
    let accumulator = Accumulator::new(options.clone());
    if options.parallel {
        trees
            .par_iter_mut()
            .map(|tree| accumulator.accumulate(tree))
            .collect()
    } else {
        trees
            .iter_mut()
            .map(|tree| accumulator.accumulate(tree))
            .collect()
    }
}

/// Builder for one accumulation run followed by pipeline passes.
///
/// # Example
///
/// ```
/// use semtree::pipeline::{Annotation, FnPass};
/// use semtree::{JsonFormat, SemanticType, Semtree};
///
/// let json = r#"{ "nodes": [ { "type": "FIGURE",
///     "bbox": { "page_start": 0, "page_end": 0, "left": 0, "bottom": 0, "right": 10, "top": 10 } } ] }"#;
///
/// let result = Semtree::new()
///     .sequential()
///     .with_pass(FnPass::new("figures", |id, input| {
///         let node = &input.tree[id];
///         (node.initial_type() == Some(SemanticType::Figure))
///             .then(|| Annotation::new(SemanticType::Figure, 0.5))
///     }))
///     .process_json(json)?;
///
/// assert_eq!(result.stats().leaves, 1);
/// assert!(result.to_json(JsonFormat::Compact)?.contains("FIGURE"));
/// # Ok::<(), semtree::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Semtree {
    options: AccumulationOptions,
    pipeline: Pipeline,
}

impl Semtree {
    /// Create a new builder with default options and no passes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom accumulation options.
    pub fn with_options(mut self, options: AccumulationOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a custom merge model configuration.
    pub fn with_merge_config(mut self, config: MergeConfig) -> Self {
        self.options = self.options.with_merge_config(config);
        self
    }

    /// Set the line merge threshold.
    pub fn with_line_merge_threshold(mut self, threshold: f64) -> Self {
        self.options = self.options.with_line_merge_threshold(threshold);
        self
    }

    /// Let paragraphs continue into a new column.
    pub fn with_column_continuation(mut self) -> Self {
        self.options = self.options.with_column_continuation(true);
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Append a pass to run after accumulation.
    pub fn with_pass(mut self, pass: impl SemanticPass + 'static) -> Self {
        self.pipeline.add(pass);
        self
    }

    /// Accumulate a tree and run the passes.
    ///
    /// Pass results are written to the tree, so `inferred_type` reflects the
    /// last pass that annotated a node.
    pub fn process(&self, mut tree: SemanticTree) -> Result<SemtreeResult> {
        let context = Accumulator::new(self.options.clone()).accumulate(&mut tree);
        let annotations = self.pipeline.run(&tree, context.map());
        annotations.apply(&mut tree)?;
        Ok(SemtreeResult {
            tree,
            context,
            annotations,
        })
    }

    /// Load a tree from JSON and process it.
    pub fn process_json(&self, json: &str) -> Result<SemtreeResult> {
        self.process(tree_from_json(json)?)
    }

    /// Load a tree from a JSON file and process it.
    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> Result<SemtreeResult> {
        self.process(tree_from_file(path)?)
    }
}

/// Result of processing one document.
#[derive(Debug)]
pub struct SemtreeResult {
    tree: SemanticTree,
    context: AccumulationContext,
    annotations: PipelineResult,
}

impl SemtreeResult {
    pub fn tree(&self) -> &SemanticTree {
        &self.tree
    }

    pub fn map(&self) -> &AccumulatedNodeMap {
        self.context.map()
    }

    pub fn stats(&self) -> &AccumulationStats {
        self.context.stats()
    }

    /// Layers produced by the passes.
    pub fn annotations(&self) -> &PipelineResult {
        &self.annotations
    }

    /// Accumulated text of a node.
    pub fn text(&self, id: NodeId) -> Option<String> {
        self.context.map().get(id).map(|n| n.text(&self.tree))
    }

    /// Export the annotated tree as JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.tree, self.context.map(), format)
    }

    /// Take the tree and its context apart.
    pub fn into_parts(self) -> (SemanticTree, AccumulationContext, PipelineResult) {
        (self.tree, self.context, self.annotations)
    }
}
