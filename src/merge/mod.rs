//! Merge-probability model.
//!
//! Scores how likely two text objects are to belong together at a given
//! granularity: chunk, line, paragraph or column. Scores are heuristic
//! likelihoods in `[0, 1]`, not calibrated probabilities.

mod config;
mod probability;

pub use config::{CharSpacingProfile, MergeConfig};
pub use probability::{uniform_probability, LineMergeBreakdown, LineMergeKind, MergeModel};
