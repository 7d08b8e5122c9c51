//! Parsing statistics for registry streams
//!
//! Dropped line groups are counted here only; they never reach a sink or a
//! classification total.

use serde::{Deserialize, Serialize};

/// Counters collected while streaming one source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    /// Physical lines read from the source
    pub lines_read: usize,

    /// Logical records accepted with the expected field count
    pub records_parsed: usize,

    /// Line groups discarded by the recovery policy
    pub groups_dropped: usize,
}

impl ParseStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the counters of another source into these
    pub fn merge(&mut self, other: &ParseStats) {
        self.lines_read += other.lines_read;
        self.records_parsed += other.records_parsed;
        self.groups_dropped += other.groups_dropped;
    }

    /// Whether any line group was discarded
    pub fn has_drops(&self) -> bool {
        self.groups_dropped > 0
    }
}
