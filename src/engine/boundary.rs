//! Boundary scan over the children of a node.

use std::ops::Range;

use serde::Serialize;

use crate::merge::MergeModel;
use crate::model::TextLine;

/// Where the children of a node split into runs of one visual line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryScan {
    runs: Vec<Range<usize>>,
    probabilities: Vec<Option<f64>>,
}

impl BoundaryScan {
    /// Scan adjacent pairs left to right.
    ///
    /// `lines[i]` is the line of child `i`, or `None` when the child is not a
    /// span. A pair involving a non-span child is a hard cut. Any other pair is
    /// cut when its line merge probability is below `threshold`.
    pub fn scan(lines: &[Option<&TextLine>], model: &MergeModel, threshold: f64) -> Self {
        let mut runs = Vec::new();
        let mut probabilities = Vec::with_capacity(lines.len().saturating_sub(1));

        let mut start = 0;
        for end in 1..lines.len() {
            let probability = match (lines[end - 1], lines[end]) {
                (Some(left), Some(right)) => Some(model.to_line_merge_probability(left, right)),
                _ => None,
            };
            probabilities.push(probability);
            if probability.map_or(true, |p| p < threshold) {
                runs.push(start..end);
                start = end;
            }
        }
        if !lines.is_empty() {
            runs.push(start..lines.len());
        }

        log::debug!(
            "Boundary scan: {} children, {} runs, {} hard cuts",
            lines.len(),
            runs.len(),
            probabilities.iter().filter(|p| p.is_none()).count()
        );

        Self {
            runs,
            probabilities,
        }
    }

    /// Maximal runs of children, in order.
    pub fn runs(&self) -> &[Range<usize>] {
        &self.runs
    }

    /// Line merge probability between child `i` and child `i + 1`, or `None`
    /// for a hard cut.
    pub fn probabilities(&self) -> &[Option<f64>] {
        &self.probabilities
    }

    pub fn is_single_run(&self) -> bool {
        self.runs.len() == 1
    }

    /// Number of pairs cut because a child was not a span.
    pub fn hard_cuts(&self) -> usize {
        self.probabilities.iter().filter(|p| p.is_none()).count()
    }

    /// Product of the pair probabilities inside `run`.
    pub fn run_score(&self, run: &Range<usize>) -> f64 {
        if run.len() < 2 {
            return 1.0;
        }
        self.probabilities[run.start..run.end - 1]
            .iter()
            .map(|p| p.unwrap_or(0.0))
            .product()
    }
}
