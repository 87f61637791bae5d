//! Listing run summary.

use serde::Serialize;
use std::collections::BTreeMap;

/// Objects listed per bucket and the failures met along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingReport {
    /// Objects handed to the sink, per bucket
    pub buckets: BTreeMap<String, u64>,

    /// Page tasks that failed or panicked
    pub failed_pages: u64,

    /// Bucket-level errors (pagination, sink creation, terminal flush)
    pub errors: Vec<String>,
}

impl ListingReport {
    /// Objects listed across all buckets.
    pub fn total(&self) -> u64 {
        self.buckets.values().sum()
    }

    /// True when no page or bucket failed.
    pub fn is_complete(&self) -> bool {
        self.failed_pages == 0 && self.errors.is_empty()
    }
}
