//! Accumulation options and configuration.

use crate::merge::MergeConfig;

/// Options for an accumulation run.
#[derive(Debug, Clone)]
pub struct AccumulationOptions {
    /// Merge model configuration, including the line merge threshold
    pub merge: MergeConfig,

    /// Whether the paragraph fold may continue into a new column
    pub column_continuation: bool,

    /// Whether to process several documents in parallel
    pub parallel: bool,
}

impl AccumulationOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the merge model configuration.
    pub fn with_merge_config(mut self, merge: MergeConfig) -> Self {
        self.merge = merge;
        self
    }

    /// Set the line merge probability below which a boundary is cut.
    pub fn with_line_merge_threshold(mut self, threshold: f64) -> Self {
        self.merge.line_merge_threshold = threshold;
        self
    }

    /// Enable or disable column continuation in the paragraph fold.
    pub fn with_column_continuation(mut self, enabled: bool) -> Self {
        self.column_continuation = enabled;
        self
    }

    /// Enable or disable parallel processing of documents.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Line merge threshold in effect.
    pub fn line_merge_threshold(&self) -> f64 {
        self.merge.line_merge_threshold
    }
}

impl Default for AccumulationOptions {
    fn default() -> Self {
        Self {
            merge: MergeConfig::default(),
            column_continuation: false,
            parallel: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = AccumulationOptions::new()
            .with_line_merge_threshold(0.5)
            .with_column_continuation(true)
            .sequential();

        assert_eq!(options.line_merge_threshold(), 0.5);
        assert!(options.column_continuation);
        assert!(!options.parallel);
    }

    #[test]
    fn test_default_options() {
        let options = AccumulationOptions::default();
        assert_eq!(options.line_merge_threshold(), 0.75);
        assert!(!options.column_continuation);
        assert!(options.parallel);
    }
}
