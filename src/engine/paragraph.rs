//! Left-to-right paragraph fold over run representatives.

use crate::merge::MergeModel;
use crate::model::{AccumulatedNode, BoundingBox, Paragraph, SemanticTree, TextColumn, TextLine};

/// One run reduced to what the fold needs.
#[derive(Debug)]
pub(crate) enum Piece<'a> {
    /// A text leaf or a synthesized line
    Line(&'a TextLine),
    /// A paragraph accumulated further down
    Paragraph(&'a Paragraph),
    /// Content without text, such as a figure
    Opaque(BoundingBox),
}

impl<'a> Piece<'a> {
    /// The piece standing for an accumulated node.
    pub fn of(node: &'a AccumulatedNode, tree: &'a SemanticTree) -> Self {
        match node {
            AccumulatedNode::Node { id } => match tree.node(*id) {
                Some(n) => n.content().map_or(Piece::Opaque(*n.bbox()), Piece::Line),
                None => Piece::Opaque(BoundingBox::new(0, 0.0, 0.0, 0.0, 0.0)),
            },
            AccumulatedNode::Span { line } => Piece::Line(line),
            AccumulatedNode::Paragraph { paragraph } => Piece::Paragraph(paragraph),
        }
    }

    fn first_line(&self) -> Option<&TextLine> {
        match self {
            Piece::Line(line) => Some(*line),
            Piece::Paragraph(paragraph) => paragraph.first_line(),
            Piece::Opaque(_) => None,
        }
    }

    fn first_column(&self) -> Option<TextColumn> {
        match self {
            Piece::Line(line) => Some(TextColumn::new((*line).clone())),
            Piece::Paragraph(paragraph) => paragraph.columns().first().cloned(),
            Piece::Opaque(_) => None,
        }
    }

    fn seed(&self) -> Paragraph {
        match self {
            Piece::Line(line) => Paragraph::from_line((*line).clone()),
            Piece::Paragraph(paragraph) => (*paragraph).clone(),
            Piece::Opaque(bbox) => Paragraph::empty(*bbox),
        }
    }
}

/// Result of folding the pieces of one node.
#[derive(Debug)]
pub(crate) struct Fold {
    pub paragraph: Paragraph,
    pub score: f64,
    pub warnings: usize,
}

/// Whether `next` starts to the right of and above the end of `paragraph`, or
/// on a later page.
fn starts_new_column(paragraph: &Paragraph, last: &TextLine, next: &TextLine) -> bool {
    let last_page = last.last_page();
    if next.page() > last_page {
        return true;
    }
    if next.page() != last_page || next.baseline() <= last.baseline() {
        return false;
    }
    paragraph
        .last_column()
        .and_then(|column| column.bbox().page_box(last_page))
        .is_some_and(|bbox| next.bbox().left > bbox.right)
}

/// Fold `pieces` into one paragraph.
///
/// The first step out of the one-line state is scored by leading alone; every
/// later step by leading and indentation against the current last line. With
/// `column_continuation`, a piece that starts a new column is scored as a column
/// continuation instead. The score is the product of the steps.
pub(crate) fn fold(pieces: &[Piece<'_>], model: &MergeModel, column_continuation: bool) -> Fold {
    let Some((first, rest)) = pieces.split_first() else {
        return Fold {
            paragraph: Paragraph::empty(BoundingBox::new(0, 0.0, 0.0, 0.0, 0.0)),
            score: 0.0,
            warnings: 1,
        };
    };

    let mut paragraph = first.seed();
    let mut score = 1.0;
    let mut warnings = 0;

    for piece in rest {
        let mut new_column = false;
        let step = match (paragraph.last_line(), piece.first_line()) {
            (Some(last), Some(next)) => {
                if column_continuation && starts_new_column(&paragraph, last, next) {
                    new_column = true;
                    match (paragraph.last_column(), piece.first_column()) {
                        (Some(current), Some(following)) => {
                            model.to_columns_merge_probability(current, &following)
                        }
                        _ => 0.0,
                    }
                } else if paragraph.is_one_line() {
                    match paragraph.first_line() {
                        Some(line) => model.leading_probability(line, next),
                        None => 0.0,
                    }
                } else {
                    model.to_paragraph_merge_probability(last, next)
                }
            }
            _ => {
                log::warn!("Paragraph fold met a piece without text, scoring step as 0");
                warnings += 1;
                0.0
            }
        };
        log::debug!(
            "Fold step: {:.4}{}",
            step,
            if new_column { " (new column)" } else { "" }
        );
        score *= step;

        match piece {
            Piece::Line(line) => paragraph.push_line((*line).clone(), new_column),
            Piece::Paragraph(other) => paragraph.push_paragraph(other, new_column),
            Piece::Opaque(bbox) => paragraph.cover(bbox),
        }
        paragraph.close_first_line();
    }

    Fold {
        paragraph,
        score,
        warnings,
    }
}
