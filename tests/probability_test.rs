//! Property-based tests for the merge model.
//!
//! Every probability must stay inside `[0, 1]` whatever the geometry, and the
//! uniform ramp must never increase with distance from its interval.

use proptest::prelude::*;
use semtree::merge::{uniform_probability, CharSpacingProfile, MergeModel};
use semtree::model::{BoundingBox, TextChunk, TextColumn, TextLine};

fn chunk(text: &str, size: f64, left: f64, width: f64, baseline: f64, page: u32) -> TextChunk {
    TextChunk::new(
        text,
        "Calibri",
        size,
        BoundingBox::new(page, left, baseline - 0.2 * size, left + width, baseline + 0.8 * size),
    )
    .with_baseline(baseline)
}

fn in_unit_interval(p: f64) -> bool {
    (0.0..=1.0).contains(&p)
}

// ============================================================================
// Uniform Probability Properties
// ============================================================================

/// Property: uniform probability is bounded
#[test]
fn proptest_uniform_bounded() {
    proptest!(|(
        lo in -100.0f64..100.0,
        len in 0.0f64..50.0,
        point in -500.0f64..500.0,
        ramp in -1.0f64..10.0,
    )| {
        let p = uniform_probability((lo, lo + len), point, ramp);
        prop_assert!(in_unit_interval(p), "p = {}", p);
    });
}

/// Property: uniform probability is 1 inside its interval
#[test]
fn proptest_uniform_inside_is_one() {
    proptest!(|(lo in -100.0f64..100.0, len in 0.0f64..50.0, t in 0.0f64..=1.0, ramp in 0.0f64..10.0)| {
        let point = lo + t * len;
        prop_assert_eq!(uniform_probability((lo, lo + len), point, ramp), 1.0);
    });
}

/// Property: moving away from the interval never increases the probability
#[test]
fn proptest_uniform_monotone() {
    proptest!(|(
        lo in -10.0f64..10.0,
        len in 0.0f64..5.0,
        near in 0.0f64..5.0,
        extra in 0.0f64..5.0,
        ramp in 0.01f64..5.0,
        above in any::<bool>(),
    )| {
        let interval = (lo, lo + len);
        let (p_near, p_far) = if above {
            (
                uniform_probability(interval, lo + len + near, ramp),
                uniform_probability(interval, lo + len + near + extra, ramp),
            )
        } else {
            (
                uniform_probability(interval, lo - near, ramp),
                uniform_probability(interval, lo - near - extra, ramp),
            )
        };
        prop_assert!(p_near >= p_far, "{} < {}", p_near, p_far);
    });
}

// ============================================================================
// Merge Probability Properties
// ============================================================================

/// Property: chunk, line and paragraph merge probabilities are bounded
#[test]
fn proptest_merge_probabilities_bounded() {
    proptest!(|(
        size_x in 0.0f64..72.0,
        size_y in 0.0f64..72.0,
        left_x in 0.0f64..600.0,
        left_y in 0.0f64..600.0,
        width_x in 0.0f64..300.0,
        width_y in 0.0f64..300.0,
        base_x in 0.0f64..800.0,
        base_y in 0.0f64..800.0,
        page_y in 0u32..3,
        space_x in any::<bool>(),
        space_y in any::<bool>(),
    )| {
        let model = MergeModel::new();
        let x = chunk(if space_x { "x " } else { "x" }, size_x, left_x, width_x, base_x, 0);
        let y = chunk(if space_y { " y" } else { "y" }, size_y, left_y, width_y, base_y, page_y);

        for p in [
            model.to_chunk_merge_probability(&x, &y),
            model.to_line_merge_probability(&x, &y),
            model.to_paragraph_merge_probability(&x, &y),
            model.leading_probability(&x, &y),
            model.indentation_probability(&x, &y),
            model.char_spacing_probability(&x, &y, CharSpacingProfile::Chunk),
            model.char_spacing_probability(&x, &y, CharSpacingProfile::Line),
        ] {
            prop_assert!(in_unit_interval(p), "p = {}", p);
        }

        let columns = model.to_columns_merge_probability(
            &TextColumn::new(TextLine::from_chunks(vec![x]).unwrap()),
            &TextColumn::new(TextLine::from_chunks(vec![y]).unwrap()),
        );
        prop_assert!(in_unit_interval(columns));
    });
}

/// Property: the line merge result is the best of its candidates
#[test]
fn proptest_line_breakdown_consistent() {
    proptest!(|(
        size_y in 4.0f64..20.0,
        gap in -2.0f64..10.0,
        shift in -6.0f64..6.0,
    )| {
        let model = MergeModel::new();
        let x = chunk("base", 12.0, 0.0, 40.0, 100.0, 0);
        let y = chunk("next", size_y, 40.0 + gap, 10.0, 100.0 + shift, 0);

        let breakdown = model.line_merge_breakdown(&x, &y);
        prop_assert!(in_unit_interval(breakdown.probability));
        prop_assert!(breakdown.probability >= breakdown.normal);
        for candidate in [breakdown.superscript, breakdown.subscript].into_iter().flatten() {
            prop_assert!(breakdown.probability >= candidate);
        }
        prop_assert!(breakdown.probability <= breakdown.char_spacing + 1e-12);
    });
}

/// Property: non-finite or zero font sizes never produce NaN
#[test]
fn proptest_degenerate_sizes_are_zero() {
    proptest!(|(
        size in prop_oneof![Just(0.0f64), Just(f64::NAN), Just(f64::INFINITY), Just(-3.0f64)],
        left in 0.0f64..100.0,
    )| {
        let model = MergeModel::new();
        let x = chunk("a", size, left, 10.0, 100.0, 0);
        let y = chunk("b", 10.0, left + 10.0, 10.0, 100.0, 0);

        prop_assert_eq!(model.to_chunk_merge_probability(&x, &y), 0.0);
        prop_assert_eq!(model.to_line_merge_probability(&x, &y), 0.0);
        prop_assert_eq!(model.to_paragraph_merge_probability(&y, &x), 0.0);
        prop_assert_eq!(model.font_size_probability(&x, &y), 0.0);
    });
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_identical_touching_chunks_merge() {
    let model = MergeModel::new();
    let x = chunk("Lorem", 9.96, 56.8, 25.0, 85.79, 0);
    let y = chunk("ipsum", 9.96, 81.8, 25.0, 85.79, 0);
    assert!((model.to_chunk_merge_probability(&x, &y) - 1.0).abs() < 1e-9);
    assert!((model.to_line_merge_probability(&x, &y) - 1.0).abs() < 1e-9);
}

#[test]
fn test_column_requires_reading_order() {
    let model = MergeModel::new();
    let left = TextColumn::new(TextLine::from_chunks(vec![chunk("l", 10.0, 72.0, 200.0, 100.0, 0)]).unwrap());
    let right = TextColumn::new(TextLine::from_chunks(vec![chunk("r", 10.0, 300.0, 200.0, 700.0, 0)]).unwrap());
    let overlapping =
        TextColumn::new(TextLine::from_chunks(vec![chunk("o", 10.0, 250.0, 200.0, 700.0, 0)]).unwrap());

    assert_eq!(model.to_columns_merge_probability(&left, &right), 1.0);
    assert_eq!(model.to_columns_merge_probability(&right, &left), 0.0);
    assert_eq!(model.to_columns_merge_probability(&left, &overlapping), 0.0);
}
