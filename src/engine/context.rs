//! Per-document accumulation state.

use serde::Serialize;

use crate::model::AccumulatedNodeMap;

/// Counters collected while accumulating one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccumulationStats {
    /// Nodes accumulated
    pub nodes: usize,
    /// Nodes without children
    pub leaves: usize,
    /// Nodes with exactly one child
    pub pass_through: usize,
    /// Nodes collapsed into a synthesized line
    pub spans: usize,
    /// Nodes folded into a paragraph
    pub paragraphs: usize,
    /// Boundaries cut because a child was not a span
    pub hard_cuts: usize,
    /// Malformed input met on the way
    pub warnings: usize,
}

/// State owned by one accumulation run over one document.
///
/// Nothing here is shared between documents, so independent contexts may be
/// filled on different threads.
#[derive(Debug, Clone, Default)]
pub struct AccumulationContext {
    map: AccumulatedNodeMap,
    stats: AccumulationStats,
}

impl AccumulationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: AccumulatedNodeMap::with_capacity(capacity),
            stats: AccumulationStats::default(),
        }
    }

    pub fn map(&self) -> &AccumulatedNodeMap {
        &self.map
    }

    pub fn stats(&self) -> &AccumulationStats {
        &self.stats
    }

    pub fn into_map(self) -> AccumulatedNodeMap {
        self.map
    }

    pub(crate) fn map_mut(&mut self) -> &mut AccumulatedNodeMap {
        &mut self.map
    }

    pub(crate) fn split_mut(&mut self) -> (&AccumulatedNodeMap, &mut AccumulationStats) {
        (&self.map, &mut self.stats)
    }
}
