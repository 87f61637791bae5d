//! Batching sink for inventory records.
//!
//! The [`BatchedSink`] buffers records for one destination table and writes
//! them in batches through a pooled [`TableClient`](inv_traits::TableClient).
//! At most one flush runs at a time; a `put` that crosses the batch threshold
//! flushes inline only when no other flush is running.

mod sink;
mod stats;

pub use sink::{BatchedSink, TableClientPool};
pub use stats::SinkStats;
