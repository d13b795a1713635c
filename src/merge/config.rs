//! Tuning parameters of the merge-probability model.

/// Which char spacing interval to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharSpacingProfile {
    /// Tight interval used between chunks of one run of text
    Chunk,
    /// Wider interval used between lines of one visual line
    #[default]
    Line,
}

/// Merge model configuration.
///
/// Distances are normalized by the larger font size of the two objects being
/// compared unless noted otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    /// Ramp around a font size ratio of 1
    pub font_size_ramp: f64,
    /// Ramp around a baseline delta of 0
    pub baseline_ramp: f64,
    /// Accepted normalized gap between chunks
    pub chunk_char_spacing: (f64, f64),
    /// Accepted normalized gap between lines on one baseline
    pub line_char_spacing: (f64, f64),
    /// Ramp outside the char spacing interval
    pub char_spacing_ramp: f64,
    /// Fraction of the font size credited for a whitespace at the gap
    pub whitespace_fraction: f64,
    /// Accepted normalized baseline distance between consecutive lines
    pub leading_interval: (f64, f64),
    /// Ramp outside the leading interval
    pub leading_ramp: f64,
    /// Absolute font size delta (points) above which lines never share a paragraph
    pub leading_font_size_cutoff: f64,
    /// Accepted normalized alignment delta between consecutive lines
    pub indentation_interval: (f64, f64),
    /// Ramp outside the indentation interval
    pub indentation_ramp: f64,
    /// Linear weights `[a, b]` of the normal line discriminant
    pub normal_line_params: [f64; 2],
    /// Quadratic weights `[p, q, r]` of the superscript discriminant
    pub superscript_params: [f64; 3],
    /// Quadratic weights `[p, q, r]` of the subscript discriminant
    pub subscript_params: [f64; 3],
    /// Minimum normalized baseline shift of a superscript
    pub superscript_baseline_threshold: f64,
    /// Minimum normalized font size drop of a superscript
    pub superscript_font_size_threshold: f64,
    /// Minimum normalized baseline shift of a subscript
    pub subscript_baseline_threshold: f64,
    /// Minimum normalized font size drop of a subscript
    pub subscript_font_size_threshold: f64,
    /// Line merge probability below which a boundary is cut
    pub line_merge_threshold: f64,
    /// Normalized font size delta above which columns never continue
    pub column_font_size_cutoff: f64,
}

impl MergeConfig {
    /// Char spacing interval for a profile.
    pub fn char_spacing_interval(&self, profile: CharSpacingProfile) -> (f64, f64) {
        match profile {
            CharSpacingProfile::Chunk => self.chunk_char_spacing,
            CharSpacingProfile::Line => self.line_char_spacing,
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            font_size_ramp: 0.05,
            baseline_ramp: 0.1,
            chunk_char_spacing: (0.0, 0.33),
            line_char_spacing: (0.0, 0.67),
            char_spacing_ramp: 0.33,
            whitespace_fraction: 0.25,
            leading_interval: (0.0, 1.5),
            leading_ramp: 0.5,
            leading_font_size_cutoff: 0.95,
            indentation_interval: (0.0, 0.5),
            indentation_ramp: 0.5,
            normal_line_params: [1.5, 0.5],
            superscript_params: [0.69, 0.73, 0.7],
            subscript_params: [0.6, 0.49, 0.1],
            superscript_baseline_threshold: 0.1,
            superscript_font_size_threshold: 0.1,
            subscript_baseline_threshold: 0.1,
            subscript_font_size_threshold: 0.1,
            line_merge_threshold: 0.75,
            column_font_size_cutoff: 0.95,
        }
    }
}
