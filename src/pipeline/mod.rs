//! Ordered semantic passes over an accumulated tree.
//!
//! A pass reads the tree, the accumulated map and every layer produced before it,
//! and returns a new [`AnnotationLayer`] keyed by [`NodeId`]. Passes never mutate
//! the tree or the map; [`PipelineResult::apply`] writes the final types back
//! once all passes have run.
//!
//! # Example
//!
//! ```
//! use semtree::model::{BoundingBox, SemanticTree, SemanticType, TextChunk};
//! use semtree::pipeline::{Annotation, FnPass, Pipeline};
//!
//! let mut tree = SemanticTree::new();
//! let bbox = BoundingBox::new(0, 72.0, 700.0, 200.0, 718.0);
//! let chunk = TextChunk::new("Title", "Calibri-Bold", 18.0, bbox).with_font_weight(700.0);
//! let title = tree.add_text_leaf(Some(SemanticType::Span), vec![chunk]).unwrap();
//! let context = semtree::accumulate(&mut tree);
//!
//! let pipeline = Pipeline::new().with_pass(FnPass::new("headings", |id, input| {
//!     let line = input.tree[id].content()?;
//!     line.is_bold().then(|| Annotation::new(SemanticType::NumberHeading(1), 0.9))
//! }));
//!
//! let result = pipeline.run(&tree, context.map());
//! result.apply(&mut tree).unwrap();
//! assert_eq!(tree[title].inferred_type(), Some(SemanticType::NumberHeading(1)));
//! assert_eq!(tree[title].initial_type(), Some(SemanticType::Span));
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;
use crate::model::{AccumulatedNodeMap, NodeId, SemanticTree, SemanticType};

/// A type and score proposed for one node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Annotation {
    pub semantic_type: Option<SemanticType>,
    pub score: f64,
}

impl Annotation {
    /// Create an annotation. The score is clamped to `[0, 1]`.
    pub fn new(semantic_type: SemanticType, score: f64) -> Self {
        Self {
            semantic_type: Some(semantic_type),
            score: clamp_score(score),
        }
    }

    /// An annotation that clears the type.
    pub fn untyped(score: f64) -> Self {
        Self {
            semantic_type: None,
            score: clamp_score(score),
        }
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Annotations produced by one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationLayer {
    name: String,
    entries: BTreeMap<NodeId, Annotation>,
}

impl AnnotationLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record an annotation, replacing any earlier one for the same node.
    pub fn insert(&mut self, id: NodeId, annotation: Annotation) {
        self.entries.insert(id, annotation);
    }

    pub fn get(&self, id: NodeId) -> Option<&Annotation> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Annotations in node order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Annotation)> {
        self.entries.iter().map(|(&id, a)| (id, a))
    }
}

/// Everything a pass may read.
#[derive(Debug, Clone, Copy)]
pub struct PassInput<'a> {
    pub tree: &'a SemanticTree,
    pub map: &'a AccumulatedNodeMap,
    /// Layers of the passes that ran before, in order
    pub layers: &'a [AnnotationLayer],
}

impl PassInput<'_> {
    /// Latest annotation of `id`: the last layer that mentions it, or else the
    /// type and score written by the accumulation engine.
    pub fn current(&self, id: NodeId) -> Option<Annotation> {
        if let Some(annotation) = resolve_in(self.layers, id) {
            return Some(*annotation);
        }
        let node = self.tree.node(id)?;
        node.score().map(|score| Annotation {
            semantic_type: node.inferred_type(),
            score,
        })
    }
}

fn resolve_in(layers: &[AnnotationLayer], id: NodeId) -> Option<&Annotation> {
    layers.iter().rev().find_map(|layer| layer.get(id))
}

/// A stage of the pipeline.
pub trait SemanticPass: Send + Sync {
    /// Name of the produced layer.
    fn name(&self) -> &str;

    /// Produce this pass's annotations.
    fn annotate(&self, input: &PassInput<'_>) -> AnnotationLayer;
}

/// A pass built from a per-node closure.
///
/// The closure is called for every node in arena order; `None` leaves the node
/// unannotated by this pass.
pub struct FnPass<F> {
    name: String,
    f: F,
}

impl<F> FnPass<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(NodeId, &PassInput<'_>) -> Option<Annotation> + Send + Sync,
    {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> SemanticPass for FnPass<F>
where
    F: Fn(NodeId, &PassInput<'_>) -> Option<Annotation> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn annotate(&self, input: &PassInput<'_>) -> AnnotationLayer {
        let mut layer = AnnotationLayer::new(self.name.clone());
        for id in input.tree.ids() {
            if let Some(annotation) = (self.f)(id, input) {
                layer.insert(id, annotation);
            }
        }
        layer
    }
}

/// Passes run in insertion order.
#[derive(Default)]
pub struct Pipeline {
    passes: Vec<Box<dyn SemanticPass>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pass.
    pub fn with_pass(mut self, pass: impl SemanticPass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Append a pass in place.
    pub fn add(&mut self, pass: impl SemanticPass + 'static) {
        self.passes.push(Box::new(pass));
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run every pass against an accumulated tree.
    pub fn run(&self, tree: &SemanticTree, map: &AccumulatedNodeMap) -> PipelineResult {
        let mut layers: Vec<AnnotationLayer> = Vec::with_capacity(self.passes.len());
        for pass in &self.passes {
            let layer = pass.annotate(&PassInput {
                tree,
                map,
                layers: &layers,
            });
            log::debug!("Pass '{}' annotated {} nodes", pass.name(), layer.len());
            layers.push(layer);
        }
        PipelineResult { layers }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.passes.iter().map(|p| p.name()))
            .finish()
    }
}

/// Layers produced by one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineResult {
    layers: Vec<AnnotationLayer>,
}

impl PipelineResult {
    pub fn layers(&self) -> &[AnnotationLayer] {
        &self.layers
    }

    /// The first layer with the given name.
    pub fn layer(&self, name: &str) -> Option<&AnnotationLayer> {
        self.layers.iter().find(|l| l.name() == name)
    }

    /// Latest annotation of `id` across all layers.
    pub fn resolve(&self, id: NodeId) -> Option<&Annotation> {
        resolve_in(&self.layers, id)
    }

    /// Write every resolved annotation to the tree.
    ///
    /// Only inferred types and scores change. Returns the number of nodes written.
    pub fn apply(&self, tree: &mut SemanticTree) -> Result<usize> {
        let mut resolved: BTreeMap<NodeId, Annotation> = BTreeMap::new();
        for layer in &self.layers {
            for (id, annotation) in layer.iter() {
                resolved.insert(id, *annotation);
            }
        }
        for (&id, annotation) in &resolved {
            tree.reclassify(id, annotation.semantic_type, annotation.score)?;
        }
        Ok(resolved.len())
    }
}
