//! Extraction timing and dedup policy

use crate::pager::DedupStrategy;
use std::time::Duration;

pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 1_000;
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_DEADLINE_MS: u64 = 60_000;

/// Configuration for one extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Short window for the long-page probe
    pub probe_timeout: Duration,
    /// Default visibility wait
    pub wait_timeout: Duration,
    /// Deadline for the whole extraction
    pub deadline: Duration,
    pub dedup: DedupStrategy,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            wait_timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            deadline: Duration::from_millis(DEFAULT_DEADLINE_MS),
            dedup: DedupStrategy::default(),
        }
    }
}
