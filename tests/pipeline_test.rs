//! Integration tests for pipeline stages running after accumulation.

use semtree::model::{BoundingBox, NodeId, SemanticTree, SemanticType, TextChunk};
use semtree::pipeline::{Annotation, AnnotationLayer, FnPass, PassInput, Pipeline, SemanticPass};
use semtree::{accumulate, Semtree};

/// Marks accumulated lines set in a large font as headings.
struct LargeTextHeadings {
    min_size: f64,
}

impl SemanticPass for LargeTextHeadings {
    fn name(&self) -> &str {
        "headings"
    }

    fn annotate(&self, input: &PassInput<'_>) -> AnnotationLayer {
        let mut layer = AnnotationLayer::new(self.name());
        for (id, node) in input.map.iter() {
            let Some(line) = node.first_line(input.tree) else {
                continue;
            };
            let is_span = input
                .current(id)
                .is_some_and(|a| a.semantic_type == Some(SemanticType::Span));
            if is_span && line.font_size() >= self.min_size {
                layer.insert(id, Annotation::new(SemanticType::NumberHeading(1), 0.9));
            }
        }
        layer
    }
}

fn document() -> (SemanticTree, NodeId, NodeId) {
    let mut tree = SemanticTree::new();
    let root = tree.add_node(
        Some(SemanticType::Document),
        BoundingBox::new(0, 0.0, 0.0, 612.0, 792.0),
    );
    let title = tree
        .add_text_child(
            root,
            None,
            vec![TextChunk::new(
                "Annual Report",
                "Calibri-Bold",
                24.0,
                BoundingBox::new(0, 72.0, 715.0, 300.0, 739.0),
            )
            .with_baseline(720.0)],
        )
        .unwrap();
    let body = tree
        .add_text_child(
            root,
            Some(SemanticType::Span),
            vec![TextChunk::new(
                "Revenue grew in every quarter.",
                "Calibri",
                10.0,
                BoundingBox::new(0, 72.0, 688.0, 320.0, 698.0),
            )
            .with_baseline(690.0)],
        )
        .unwrap();
    (tree, title, body)
}

#[test]
fn test_custom_pass_reclassifies_without_touching_map() {
    let (mut tree, title, body) = document();
    let context = accumulate(&mut tree);
    let before: Vec<_> = context.map().iter().map(|(id, n)| (id, n.clone())).collect();

    let pipeline = Pipeline::new().with_pass(LargeTextHeadings { min_size: 18.0 });
    let result = pipeline.run(&tree, context.map());

    assert_eq!(result.layers().len(), 1);
    assert_eq!(
        result.resolve(title).and_then(|a| a.semantic_type),
        Some(SemanticType::NumberHeading(1))
    );
    assert!(result.resolve(body).is_none());

    let written = result.apply(&mut tree).unwrap();
    assert_eq!(written, 1);
    assert_eq!(tree[title].inferred_type(), Some(SemanticType::NumberHeading(1)));
    assert_eq!(tree[title].initial_type(), None);
    assert_eq!(tree[body].inferred_type(), Some(SemanticType::Span));

    let after: Vec<_> = context.map().iter().map(|(id, n)| (id, n.clone())).collect();
    assert_eq!(before, after);
}

#[test]
fn test_passes_compose_in_order() {
    let (mut tree, title, _) = document();
    let context = accumulate(&mut tree);

    let mut pipeline = Pipeline::new();
    pipeline.add(LargeTextHeadings { min_size: 18.0 });
    // Demote headings that are not bold.
    pipeline.add(FnPass::new("bold-check", |id, input| {
        let current = input.current(id)?;
        let line = input.tree[id].content()?;
        (current.semantic_type.is_some_and(|t| t.is_heading()) && !line.is_bold())
            .then(|| Annotation::new(SemanticType::Paragraph, current.score))
    }));

    let result = pipeline.run(&tree, context.map());
    assert_eq!(pipeline.len(), 2);
    assert_eq!(result.layer("bold-check").map(|l| l.len()), Some(0));
    assert_eq!(result.resolve(title).map(|a| a.score), Some(0.9));
}

#[test]
fn test_builder_applies_passes() {
    let (tree, title, _) = document();
    let result = Semtree::new()
        .sequential()
        .with_pass(LargeTextHeadings { min_size: 18.0 })
        .process(tree)
        .unwrap();

    assert_eq!(
        result.tree()[title].inferred_type(),
        Some(SemanticType::NumberHeading(1))
    );
    assert_eq!(result.annotations().layers().len(), 1);
    assert_eq!(result.text(title), Some("Annual Report".to_string()));
}
