//! Merge probabilities between text objects.
//!
//! Every function here is pure and total: it returns a value in `[0, 1]` for any
//! input, including zero or non-finite font sizes, which yield `0`. Independent
//! pieces of evidence are combined by multiplication.

use crate::model::{TextChunk, TextColumn, TextExtent, DEFAULT_EPSILON};

use super::config::{CharSpacingProfile, MergeConfig};

/// `1` inside `interval`, `0` further than `ramp` outside it, linear in between.
///
/// A non-positive ramp turns the ramp into a step. Bounds may be given in
/// either order.
pub fn uniform_probability(interval: (f64, f64), point: f64, ramp: f64) -> f64 {
    let (lo, hi) = if interval.0 <= interval.1 {
        interval
    } else {
        (interval.1, interval.0)
    };
    if point >= lo && point <= hi {
        return 1.0;
    }
    let distance = if point < lo { lo - point } else { point - hi };
    if !distance.is_finite() || ramp.is_nan() || ramp <= 0.0 || distance >= ramp {
        return 0.0;
    }
    (1.0 - distance / ramp).clamp(0.0, 1.0)
}

/// Larger of two font sizes, or `None` when either cannot normalize a distance.
fn normalizer(x: f64, y: f64) -> Option<f64> {
    if x.is_finite() && y.is_finite() && x > 0.0 && y > 0.0 {
        Some(x.max(y))
    } else {
        None
    }
}

/// Which discriminant produced a line merge probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMergeKind {
    /// Linear model of text sharing one baseline
    Normal,
    /// Raised, smaller text (footnote markers, exponents)
    Superscript,
    /// Lowered, smaller text (chemical formulas, indices)
    Subscript,
    /// Unusable metrics; the probability is zero
    Degenerate,
}

/// Intermediate values of a line merge decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMergeBreakdown {
    /// Char spacing probability alone
    pub char_spacing: f64,
    /// `(baseline(x) - baseline(y)) / max font size`
    pub baseline_diff: f64,
    /// `(font_size(x) - font_size(y)) / max font size`
    pub font_size_diff: f64,
    /// Result of the linear discriminant
    pub normal: f64,
    /// Result of the superscript discriminant, when its gate opened
    pub superscript: Option<f64>,
    /// Result of the subscript discriminant, when its gate opened
    pub subscript: Option<f64>,
    pub kind: LineMergeKind,
    /// Final probability
    pub probability: f64,
}

impl LineMergeBreakdown {
    fn degenerate() -> Self {
        Self {
            char_spacing: 0.0,
            baseline_diff: 0.0,
            font_size_diff: 0.0,
            normal: 0.0,
            superscript: None,
            subscript: None,
            kind: LineMergeKind::Degenerate,
            probability: 0.0,
        }
    }
}

/// Typographic and geometric merge model.
#[derive(Debug, Clone, Default)]
pub struct MergeModel {
    config: MergeConfig,
}

impl MergeModel {
    /// Create a model with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a model with a custom configuration.
    pub fn with_config(config: MergeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// 1 if the font names are equal, else 0.
    pub fn font_name_probability(&self, x: &TextChunk, y: &TextChunk) -> f64 {
        if x.font_name == y.font_name {
            1.0
        } else {
            0.0
        }
    }

    /// Uniform probability of the font size ratio around 1.
    pub fn font_size_probability(&self, x: &impl TextExtent, y: &impl TextExtent) -> f64 {
        let Some(max) = normalizer(x.font_size(), y.font_size()) else {
            return 0.0;
        };
        let ratio = x.font_size().min(y.font_size()) / max;
        uniform_probability((1.0, 1.0), ratio, self.config.font_size_ramp)
    }

    /// 1 if the colors are equal, else 0.
    pub fn font_color_probability(&self, x: &TextChunk, y: &TextChunk) -> f64 {
        if x.color.approx_eq(&y.color, DEFAULT_EPSILON) {
            1.0
        } else {
            0.0
        }
    }

    /// Uniform probability of the normalized baseline delta around 0.
    pub fn baseline_probability(&self, x: &impl TextExtent, y: &impl TextExtent) -> f64 {
        let Some(max) = normalizer(x.font_size(), y.font_size()) else {
            return 0.0;
        };
        let diff = (x.baseline() - y.baseline()).abs() / max;
        uniform_probability((0.0, 0.0), diff, self.config.baseline_ramp)
    }

    /// Probability that the horizontal gap from `x` to `y` is an in-line gap.
    ///
    /// A trailing whitespace on `x` and a leading whitespace on `y` belong to the
    /// gap: the corresponding box edge is pulled in by
    /// [`MergeConfig::whitespace_fraction`] of the font size before measuring.
    pub fn char_spacing_probability(
        &self,
        x: &impl TextExtent,
        y: &impl TextExtent,
        profile: CharSpacingProfile,
    ) -> f64 {
        let Some(max) = normalizer(x.font_size(), y.font_size()) else {
            return 0.0;
        };
        let mut right = x.bbox().right;
        if x.ends_with_whitespace() {
            right -= self.config.whitespace_fraction * x.font_size();
        }
        let mut left = y.bbox().left;
        if y.starts_with_whitespace() {
            left += self.config.whitespace_fraction * y.font_size();
        }
        let gap = (left - right) / max;
        uniform_probability(
            self.config.char_spacing_interval(profile),
            gap,
            self.config.char_spacing_ramp,
        )
    }

    /// Probability that `y` is the line following `x` in one column.
    ///
    /// Lines whose sizes differ by more than
    /// [`MergeConfig::leading_font_size_cutoff`] points are clearly different
    /// blocks. A line at the start of the next page continues with probability 1;
    /// any other page jump gives 0.
    pub fn leading_probability(&self, x: &impl TextExtent, y: &impl TextExtent) -> f64 {
        let Some(max) = normalizer(x.font_size(), y.font_size()) else {
            return 0.0;
        };
        if (x.font_size() - y.font_size()).abs() > self.config.leading_font_size_cutoff {
            return 0.0;
        }
        let (x_page, y_page) = (x.bbox().page_end, y.bbox().page_start);
        if y_page == x_page {
            let leading = (x.baseline() - y.baseline()) / max;
            uniform_probability(self.config.leading_interval, leading, self.config.leading_ramp)
        } else if y_page > x_page && y_page - x_page == 1 {
            1.0
        } else {
            0.0
        }
    }

    /// Probability that `x` and `y` share an alignment: left, right or center,
    /// whichever fits best.
    pub fn indentation_probability(&self, x: &impl TextExtent, y: &impl TextExtent) -> f64 {
        let Some(max) = normalizer(x.font_size(), y.font_size()) else {
            return 0.0;
        };
        let (a, b) = (x.bbox(), y.bbox());
        let delta = (a.left - b.left)
            .abs()
            .min((a.right - b.right).abs())
            .min((a.center_x() - b.center_x()).abs());
        uniform_probability(
            self.config.indentation_interval,
            delta / max,
            self.config.indentation_ramp,
        )
    }

    /// Probability that two chunks belong to one run of text.
    pub fn to_chunk_merge_probability(&self, x: &TextChunk, y: &TextChunk) -> f64 {
        let probability = self.font_name_probability(x, y)
            * self.font_size_probability(x, y)
            * self.font_color_probability(x, y)
            * self.baseline_probability(x, y)
            * self.char_spacing_probability(x, y, CharSpacingProfile::Chunk);
        probability.clamp(0.0, 1.0)
    }

    /// Probability that `y` continues the visual line of `x`.
    pub fn to_line_merge_probability(&self, x: &impl TextExtent, y: &impl TextExtent) -> f64 {
        self.line_merge_breakdown(x, y).probability
    }

    /// [`MergeModel::to_line_merge_probability`] with its intermediate values.
    pub fn line_merge_breakdown(
        &self,
        x: &impl TextExtent,
        y: &impl TextExtent,
    ) -> LineMergeBreakdown {
        let Some(max) = normalizer(x.font_size(), y.font_size()) else {
            return LineMergeBreakdown::degenerate();
        };
        let baseline_diff = (x.baseline() - y.baseline()) / max;
        let font_size_diff = (x.font_size() - y.font_size()) / max;
        if !baseline_diff.is_finite() || !font_size_diff.is_finite() {
            return LineMergeBreakdown::degenerate();
        }

        let char_spacing = self.char_spacing_probability(x, y, CharSpacingProfile::Line);
        let [a, b] = self.config.normal_line_params;
        let normal =
            (char_spacing * (1.0 - a * baseline_diff.abs() - b * font_size_diff.abs())).clamp(0.0, 1.0);

        let mut breakdown = LineMergeBreakdown {
            char_spacing,
            baseline_diff,
            font_size_diff,
            normal,
            superscript: None,
            subscript: None,
            kind: LineMergeKind::Normal,
            probability: normal,
        };

        let threshold = self.config.line_merge_threshold;
        if normal < threshold && char_spacing > threshold {
            let size_drop = font_size_diff.abs();
            let shift = baseline_diff.abs();

            // Smaller text raised above the baseline, or the return from it.
            if baseline_diff * font_size_diff < 0.0
                && shift > self.config.superscript_baseline_threshold
                && size_drop > self.config.superscript_font_size_threshold
            {
                let p = char_spacing * quadratic(self.config.superscript_params, size_drop, shift);
                breakdown.superscript = Some(p);
                if p > breakdown.probability {
                    breakdown.probability = p;
                    breakdown.kind = LineMergeKind::Superscript;
                }
            }

            // Smaller text lowered below the baseline, or the return from it.
            if baseline_diff * font_size_diff > 0.0
                && shift > self.config.subscript_baseline_threshold
                && size_drop > self.config.subscript_font_size_threshold
            {
                let p = char_spacing * quadratic(self.config.subscript_params, size_drop, shift);
                breakdown.subscript = Some(p);
                if p > breakdown.probability {
                    breakdown.probability = p;
                    breakdown.kind = LineMergeKind::Subscript;
                }
            }
        }

        log::trace!(
            "line merge: spacing={:.3} baseline={:.3} size={:.3} -> {:.3} ({:?})",
            breakdown.char_spacing,
            breakdown.baseline_diff,
            breakdown.font_size_diff,
            breakdown.probability,
            breakdown.kind
        );

        breakdown
    }

    /// Probability that `y` is the next line of the paragraph ending with `x`.
    pub fn to_paragraph_merge_probability(
        &self,
        x: &impl TextExtent,
        y: &impl TextExtent,
    ) -> f64 {
        self.leading_probability(x, y) * self.indentation_probability(x, y)
    }

    /// Probability that column `y` continues the text of column `x`.
    ///
    /// Nonzero only when `x` ends on an earlier or the same page as `y` starts,
    /// lies strictly left of `y` when they share that page, and the adjoining
    /// lines have matching font sizes.
    pub fn to_columns_merge_probability(&self, x: &TextColumn, y: &TextColumn) -> f64 {
        let (Some(x_last), Some(y_first)) = (x.last_line(), y.first_line()) else {
            return 0.0;
        };
        let Some(max) = normalizer(x_last.font_size(), y_first.font_size()) else {
            return 0.0;
        };

        let page = y.first_page();
        if x.last_page() > page {
            return 0.0;
        }
        if x.last_page() == page {
            let (Some(x_box), Some(y_box)) = (x.bbox().page_box(page), y.bbox().page_box(page))
            else {
                return 0.0;
            };
            if x_box.right >= y_box.left {
                return 0.0;
            }
        }

        if (x_last.font_size() - y_first.font_size()).abs() / max
            > self.config.column_font_size_cutoff
        {
            return 0.0;
        }
        self.font_size_probability(x_last, y_first)
    }
}

/// `1 - p x^2 - (q y - r x) y`, clamped to `[0, 1]`.
fn quadratic(params: [f64; 3], x: f64, y: f64) -> f64 {
    let [p, q, r] = params;
    (1.0 - p * x * x - (q * y - r * x) * y).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, Color, TextLine};

    fn chunk(text: &str, font: &str, size: f64, left: f64, right: f64, baseline: f64) -> TextChunk {
        TextChunk::new(
            text,
            font,
            size,
            BoundingBox::new(0, left, baseline - 0.2 * size, right, baseline + 0.8 * size),
        )
        .with_baseline(baseline)
    }

    #[test]
    fn test_uniform_probability_shape() {
        assert_eq!(uniform_probability((0.0, 1.0), 0.5, 0.5), 1.0);
        assert_eq!(uniform_probability((0.0, 1.0), 1.0, 0.5), 1.0);
        assert!((uniform_probability((0.0, 1.0), 1.25, 0.5) - 0.5).abs() < 1e-12);
        assert!((uniform_probability((0.0, 1.0), -0.25, 0.5) - 0.5).abs() < 1e-12);
        assert_eq!(uniform_probability((0.0, 1.0), 1.5, 0.5), 0.0);
        assert_eq!(uniform_probability((0.0, 1.0), 3.0, 0.5), 0.0);
        assert_eq!(uniform_probability((1.0, 0.0), 0.5, 0.5), 1.0);
    }

    #[test]
    fn test_uniform_probability_degenerate_inputs() {
        assert_eq!(uniform_probability((0.0, 1.0), f64::NAN, 0.5), 0.0);
        assert_eq!(uniform_probability((0.0, 1.0), f64::INFINITY, 0.5), 0.0);
        assert_eq!(uniform_probability((0.0, 1.0), 1.1, 0.0), 0.0);
        assert_eq!(uniform_probability((0.0, 1.0), 1.1, f64::NAN), 0.0);
        assert_eq!(uniform_probability((f64::NAN, 1.0), 0.5, 0.5), 0.0);
    }

    #[test]
    fn test_identical_adjacent_chunks_merge() {
        let model = MergeModel::new();
        let x = chunk("Hello", "Calibri", 9.96, 10.0, 40.0, 85.79);
        let y = chunk("world", "Calibri", 9.96, 40.0, 70.0, 85.79);
        assert!((model.to_chunk_merge_probability(&x, &y) - 1.0).abs() < 1e-4);
        assert!((model.to_line_merge_probability(&x, &y) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_chunk_merge_requires_same_style() {
        let model = MergeModel::new();
        let x = chunk("Hello", "Calibri", 12.0, 10.0, 40.0, 100.0);

        let other_font = chunk("world", "Times New Roman", 12.0, 40.0, 70.0, 100.0);
        assert_eq!(model.to_chunk_merge_probability(&x, &other_font), 0.0);

        let other_size = chunk("world", "Calibri", 10.0, 40.0, 70.0, 100.0);
        assert_eq!(model.to_chunk_merge_probability(&x, &other_size), 0.0);

        let other_color =
            chunk("world", "Calibri", 12.0, 40.0, 70.0, 100.0).with_color(Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(model.to_chunk_merge_probability(&x, &other_color), 0.0);
    }

    #[test]
    fn test_trailing_whitespace_counts_as_gap() {
        let model = MergeModel::new();
        let with_space = chunk("Hello ", "Calibri", 10.0, 0.0, 32.5, 100.0);
        let next = chunk("world", "Calibri", 10.0, 32.5, 60.0, 100.0);
        // Visible gap is one quarter em: inside the chunk interval.
        assert_eq!(
            model.char_spacing_probability(&with_space, &next, CharSpacingProfile::Chunk),
            1.0
        );

        // Three em apart: clearly not the same run.
        let far = chunk("world", "Calibri", 10.0, 62.5, 90.0, 100.0);
        assert_eq!(
            model.char_spacing_probability(&with_space, &far, CharSpacingProfile::Line),
            0.0
        );
    }

    #[test]
    fn test_zero_font_size_is_guarded() {
        let model = MergeModel::new();
        let x = chunk("a", "Calibri", 0.0, 0.0, 5.0, 100.0);
        let y = chunk("b", "Calibri", 0.0, 5.0, 10.0, 100.0);
        assert_eq!(model.to_chunk_merge_probability(&x, &y), 0.0);
        assert_eq!(model.to_line_merge_probability(&x, &y), 0.0);
        assert_eq!(model.to_paragraph_merge_probability(&x, &y), 0.0);
        assert_eq!(
            model.line_merge_breakdown(&x, &y).kind,
            LineMergeKind::Degenerate
        );
    }

    #[test]
    fn test_superscript_uses_quadratic_discriminant() {
        let model = MergeModel::new();
        let base = chunk("E = mc", "Calibri", 12.0, 0.0, 40.0, 100.0);
        let exponent = chunk("2", "Calibri", 7.8, 40.5, 45.0, 104.0);

        let breakdown = model.line_merge_breakdown(&base, &exponent);
        assert!(breakdown.font_size_diff > 0.1);
        assert!(breakdown.baseline_diff < -0.1);
        assert!(breakdown.char_spacing >= 0.75);
        assert!(breakdown.normal < 0.75);
        assert_eq!(breakdown.kind, LineMergeKind::Superscript);
        assert!(breakdown.probability > breakdown.normal);
        assert!(breakdown.probability >= 0.75);

        // And back to the baseline after the exponent.
        let rest = chunk(" holds", "Calibri", 12.0, 45.0, 80.0, 100.0);
        assert_eq!(
            model.line_merge_breakdown(&exponent, &rest).kind,
            LineMergeKind::Superscript
        );
    }

    #[test]
    fn test_subscript_uses_quadratic_discriminant() {
        let model = MergeModel::new();
        let base = chunk("H", "Calibri", 12.0, 0.0, 8.0, 100.0);
        let index = chunk("2", "Calibri", 8.4, 8.0, 12.0, 97.6);

        let breakdown = model.line_merge_breakdown(&base, &index);
        assert!(breakdown.baseline_diff * breakdown.font_size_diff > 0.0);
        assert_eq!(breakdown.kind, LineMergeKind::Subscript);
        assert!(breakdown.probability > breakdown.normal);
        assert!(breakdown.probability >= 0.75);
    }

    #[test]
    fn test_stacked_lines_do_not_merge_as_one_line() {
        let model = MergeModel::new();
        let upper = chunk("first line of text", "Calibri", 10.0, 72.0, 300.0, 700.0);
        let lower = chunk("second line of text", "Calibri", 10.0, 72.0, 310.0, 688.0);
        assert_eq!(model.to_line_merge_probability(&upper, &lower), 0.0);
        assert!(model.to_paragraph_merge_probability(&upper, &lower) > 0.99);
    }

    #[test]
    fn test_leading_cutoff_is_absolute_points() {
        let model = MergeModel::new();
        let body = chunk("body", "Calibri", 10.0, 72.0, 300.0, 700.0);
        let slightly_larger = chunk("body", "Calibri", 10.9, 72.0, 300.0, 688.0);
        let larger = chunk("body", "Calibri", 11.0, 72.0, 300.0, 688.0);
        assert!(model.leading_probability(&body, &slightly_larger) > 0.0);
        assert_eq!(model.leading_probability(&body, &larger), 0.0);
    }

    #[test]
    fn test_leading_across_pages() {
        let model = MergeModel::new();
        let bottom = chunk("end", "Calibri", 10.0, 72.0, 300.0, 60.0);
        let mut top = chunk("start", "Calibri", 10.0, 72.0, 300.0, 760.0);
        top.bbox.page_start = 1;
        top.bbox.page_end = 1;
        assert_eq!(model.leading_probability(&bottom, &top), 1.0);

        top.bbox.page_start = 3;
        top.bbox.page_end = 3;
        assert_eq!(model.leading_probability(&bottom, &top), 0.0);
        // Going backwards is never a continuation.
        assert_eq!(model.leading_probability(&top, &bottom), 0.0);
    }

    #[test]
    fn test_indentation_picks_best_alignment() {
        let model = MergeModel::new();
        let x = chunk("centered title", "Calibri", 10.0, 100.0, 200.0, 700.0);
        let centered = chunk("sub", "Calibri", 10.0, 130.0, 170.0, 688.0);
        let indented = chunk("body", "Calibri", 10.0, 160.0, 260.0, 688.0);
        assert_eq!(model.indentation_probability(&x, &centered), 1.0);
        assert_eq!(model.indentation_probability(&x, &indented), 0.0);
    }

    #[test]
    fn test_columns_merge() {
        let model = MergeModel::new();
        let line = |left: f64, baseline: f64, page: u32, size: f64| {
            let mut c = chunk("column text", "Calibri", size, left, left + 200.0, baseline);
            c.bbox.page_start = page;
            c.bbox.page_end = page;
            TextLine::from_chunks(vec![c]).unwrap()
        };

        let left = TextColumn::new(line(72.0, 100.0, 0, 10.0));
        let right = TextColumn::new(line(320.0, 700.0, 0, 10.0));
        assert_eq!(model.to_columns_merge_probability(&left, &right), 1.0);
        // Reading order is left to right.
        assert_eq!(model.to_columns_merge_probability(&right, &left), 0.0);

        let next_page = TextColumn::new(line(72.0, 760.0, 1, 10.0));
        assert_eq!(model.to_columns_merge_probability(&right, &next_page), 1.0);
        assert_eq!(model.to_columns_merge_probability(&next_page, &right), 0.0);

        let smaller = TextColumn::new(line(320.0, 700.0, 0, 8.0));
        assert_eq!(model.to_columns_merge_probability(&left, &smaller), 0.0);
    }
}
