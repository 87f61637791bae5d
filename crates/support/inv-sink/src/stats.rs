//! Sink statistics.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by a sink.
#[derive(Debug, Default)]
pub(crate) struct SinkCounters {
    puts: AtomicU64,
    inserted: AtomicU64,
    failed: AtomicU64,
    writes: AtomicU64,
}

impl SinkCounters {
    pub(crate) fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self, inserted: u64, failed: u64) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.inserted.fetch_add(inserted, Ordering::Relaxed);
        self.failed.fetch_add(failed, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self, failed: u64) {
        self.failed.fetch_add(failed, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, table: String, buffered: usize) -> SinkStats {
        SinkStats {
            table,
            puts: self.puts.load(Ordering::Relaxed),
            inserted: self.inserted.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            buffered: buffered as u64,
        }
    }
}

/// Point-in-time summary of a sink, for observability only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SinkStats {
    /// Destination table
    pub table: String,

    /// Records handed to `put`
    pub puts: u64,

    /// Rows the table accepted
    pub inserted: u64,

    /// Rows refused or lost to a failed write
    pub failed: u64,

    /// Non-empty write calls issued
    pub writes: u64,

    /// Rows waiting for the next flush
    pub buffered: u64,
}

impl fmt::Display for SinkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows inserted into {}. {} rows in queue.",
            self.inserted, self.table, self.buffered
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_display() {
        let counters = SinkCounters::default();
        counters.record_put();
        counters.record_write(42, 0);

        let stats = counters.snapshot("inv.inventory".into(), 3);
        assert_eq!(stats.to_string(), "42 rows inserted into inv.inventory. 3 rows in queue.");
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.puts, 1);
    }
}
