//! Bottom-up accumulation over a semantic tree.

use std::sync::Arc;

use crate::merge::MergeModel;
use crate::model::{
    AccumulatedNode, AccumulatedNodeMap, NodeId, SemanticTree, SemanticType, TextLine,
};

use super::boundary::BoundaryScan;
use super::context::{AccumulationContext, AccumulationStats};
use super::options::AccumulationOptions;
use super::paragraph::{fold, Piece};

/// What one node accumulates to.
struct Evaluation {
    node: Arc<AccumulatedNode>,
    inferred: Option<SemanticType>,
    score: f64,
}

/// Merges every subtree bottom-up into one representative and scores it.
///
/// After a run every node carries an inferred type and a score, and the context
/// maps every node to its representative.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    model: MergeModel,
    options: AccumulationOptions,
}

impl Accumulator {
    pub fn new(options: AccumulationOptions) -> Self {
        Self {
            model: MergeModel::with_config(options.merge.clone()),
            options,
        }
    }

    pub fn model(&self) -> &MergeModel {
        &self.model
    }

    pub fn options(&self) -> &AccumulationOptions {
        &self.options
    }

    /// Accumulate every root of `tree` into a fresh context.
    pub fn accumulate(&self, tree: &mut SemanticTree) -> AccumulationContext {
        let mut context = AccumulationContext::with_capacity(tree.len());
        self.accumulate_with(tree, &mut context);
        context
    }

    /// Accumulate every root of `tree`, skipping nodes already in `context`.
    pub fn accumulate_with(&self, tree: &mut SemanticTree, context: &mut AccumulationContext) {
        for root in tree.roots() {
            self.accumulate_from(tree, context, root);
        }
        log::debug!(
            "Accumulated {} nodes: {} spans, {} paragraphs, {} warnings",
            context.stats().nodes,
            context.stats().spans,
            context.stats().paragraphs,
            context.stats().warnings
        );
    }

    /// Accumulate the subtree rooted at `root` in post-order.
    ///
    /// Nodes already present in `context` are neither revisited nor rescored.
    pub fn accumulate_from(
        &self,
        tree: &mut SemanticTree,
        context: &mut AccumulationContext,
        root: NodeId,
    ) {
        if tree.node(root).is_none() {
            log::warn!("Cannot accumulate unknown node {}", root);
            return;
        }

        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if context.map().contains(id) {
                continue;
            }
            if expanded {
                let evaluation = {
                    let (map, stats) = context.split_mut();
                    self.evaluate(tree, map, stats, id)
                };
                context.map_mut().insert(id, evaluation.node);
                tree.set_annotation(id, evaluation.inferred, evaluation.score);
                continue;
            }
            stack.push((id, true));
            stack.extend(
                tree.children(id)
                    .iter()
                    .rev()
                    .filter(|&&child| !context.map().contains(child))
                    .map(|&child| (child, false)),
            );
        }
    }

    fn evaluate(
        &self,
        tree: &SemanticTree,
        map: &AccumulatedNodeMap,
        stats: &mut AccumulationStats,
        id: NodeId,
    ) -> Evaluation {
        let node = &tree[id];
        let children = node.children();
        stats.nodes += 1;

        if node.initial_type() == Some(SemanticType::Span) && !children.is_empty() {
            log::warn!("Span node {} has {} children", id, children.len());
            stats.warnings += 1;
        }

        match children {
            [] => {
                stats.leaves += 1;
                let inferred = node
                    .initial_type()
                    .or_else(|| node.content().map(|_| SemanticType::Span));
                Evaluation {
                    node: Arc::new(AccumulatedNode::Node { id }),
                    inferred,
                    score: 1.0,
                }
            }
            [child] => {
                stats.pass_through += 1;
                let child_node = &tree[*child];
                match map.get_shared(*child) {
                    Some(shared) => Evaluation {
                        node: shared,
                        inferred: child_node.inferred_type(),
                        score: child_node.score().unwrap_or(0.0),
                    },
                    None => {
                        log::warn!("Child {} of {} was not accumulated", child, id);
                        stats.warnings += 1;
                        Evaluation {
                            node: Arc::new(AccumulatedNode::Node { id }),
                            inferred: node.initial_type(),
                            score: 0.0,
                        }
                    }
                }
            }
            _ => self.merge_children(tree, map, stats, id, children),
        }
    }

    fn merge_children(
        &self,
        tree: &SemanticTree,
        map: &AccumulatedNodeMap,
        stats: &mut AccumulationStats,
        id: NodeId,
        children: &[NodeId],
    ) -> Evaluation {
        let representatives: Vec<Option<Arc<AccumulatedNode>>> =
            children.iter().map(|&child| map.get_shared(child)).collect();

        let mut lines: Vec<Option<&TextLine>> = Vec::with_capacity(children.len());
        for (&child, representative) in children.iter().zip(&representatives) {
            let inferred = tree[child].inferred_type();
            if inferred.is_none() {
                log::warn!("Child {} of {} has no semantic type", child, id);
                stats.warnings += 1;
            }
            let line = match (inferred, representative.as_deref()) {
                (Some(SemanticType::Span), Some(node)) => node.first_line(tree),
                _ => None,
            };
            lines.push(line);
        }

        let scan = BoundaryScan::scan(&lines, &self.model, self.options.line_merge_threshold());
        stats.hard_cuts += scan.hard_cuts();

        if let [run] = scan.runs() {
            if let Some(line) = TextLine::join(lines.iter().flatten().copied()) {
                stats.spans += 1;
                return Evaluation {
                    score: scan.run_score(run),
                    node: Arc::new(AccumulatedNode::Span { line }),
                    inferred: Some(SemanticType::Span),
                };
            }
        }

        let joined: Vec<Option<TextLine>> = scan
            .runs()
            .iter()
            .map(|run| {
                if run.len() > 1 {
                    TextLine::join(lines[run.clone()].iter().flatten().copied())
                } else {
                    None
                }
            })
            .collect();

        let pieces: Vec<Piece<'_>> = scan
            .runs()
            .iter()
            .zip(&joined)
            .map(|(run, joined)| match (joined, representatives[run.start].as_deref()) {
                (Some(line), _) => Piece::Line(line),
                (None, Some(node)) => Piece::of(node, tree),
                (None, None) => Piece::Opaque(*tree[children[run.start]].bbox()),
            })
            .collect();

        let result = fold(&pieces, &self.model, self.options.column_continuation);
        stats.paragraphs += 1;
        stats.warnings += result.warnings;
        log::debug!(
            "Node {} folded {} runs into a paragraph, score {:.4}",
            id,
            pieces.len(),
            result.score
        );

        Evaluation {
            node: Arc::new(AccumulatedNode::Paragraph {
                paragraph: result.paragraph,
            }),
            inferred: Some(SemanticType::Paragraph),
            score: result.score,
        }
    }
}
