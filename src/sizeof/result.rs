//! Measurement Result Module
//!
//! Outcome of one size-of call: how far the walk got and whether its total can
//! be trusted.

use serde::Serialize;

// == Outcome ==
/// How a measurement ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    /// Every reachable, non-excluded object was priced
    Complete,
    /// More distinct objects were reachable than `maxObjectGraphSize`
    AbortedGraphSizeLimit,
    /// A single object was larger than `maxObjectSize`
    AbortedObjectSizeLimit,
}

// == SizeOf Result ==
/// Aggregate size and traversal statistics of one measurement.
///
/// An aborted result still reports how far the walk progressed, but its total
/// is a lower bound only; [`SizeOfResult::size`] hides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeOfResult {
    /// Bytes credited so far
    total_size: u64,
    /// Distinct objects visited, the aborting one included
    visited_count: u64,
    /// How the walk ended
    outcome: Outcome,
}

impl SizeOfResult {
    // == Constructor ==
    pub fn new(total_size: u64, visited_count: u64, outcome: Outcome) -> Self {
        Self {
            total_size,
            visited_count,
            outcome,
        }
    }

    /// Result of measuring nothing (null or excluded root).
    pub fn empty() -> Self {
        Self::new(0, 0, Outcome::Complete)
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn visited_count(&self) -> u64 {
        self.visited_count
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    // == Is Complete ==
    /// True when no limit was hit.
    pub fn is_complete(&self) -> bool {
        self.outcome == Outcome::Complete
    }

    // == Is Aborted ==
    /// True when either limit was hit.
    pub fn is_aborted(&self) -> bool {
        !self.is_complete()
    }

    // == Size ==
    /// Usable size for admission decisions.
    ///
    /// Returns `None` for either aborted outcome: the graph is not measurable
    /// under the current limits.
    pub fn size(&self) -> Option<u64> {
        self.is_complete().then_some(self.total_size)
    }

    /// Adds a fixed overhead to a complete result. Aborted results are returned unchanged.
    pub(crate) fn with_overhead(self, overhead: u64) -> Self {
        if self.is_complete() {
            Self {
                total_size: self.total_size.saturating_add(overhead),
                ..self
            }
        } else {
            self
        }
    }
}
