//! Furthest terminal failure tracking.
//!
//! Ordered choice backtracks freely, so most terminal failures are noise. The
//! useful diagnostic is the set of terminals that failed at the rightmost
//! index any of them reached.

use compact_str::CompactString;
use smallvec::SmallVec;

/// Rightmost terminal failure index plus the distinct expected descriptors
/// recorded there.
#[derive(Debug, Clone, Default)]
pub struct FailureTracker {
    index: usize,
    expected: SmallVec<[CompactString; 4]>,
}

impl FailureTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a terminal described by `expected` failed at `index`.
    ///
    /// Failures left of the current maximum are discarded, failures right of
    /// it replace the set, and failures at it are added unless already present.
    pub fn record(&mut self, index: usize, expected: &str) {
        if index < self.index {
            return;
        }
        if index > self.index {
            self.index = index;
            self.expected.clear();
        }
        if !self.expected.iter().any(|e| e == expected) {
            self.expected.push(CompactString::from(expected));
        }
    }

    /// The rightmost failure index (0 when nothing failed).
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Expected descriptors at [`index`](Self::index), in first-seen order.
    #[must_use]
    pub fn expected(&self) -> &[CompactString] {
        &self.expected
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expected.is_empty()
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.expected.clear();
    }
}
