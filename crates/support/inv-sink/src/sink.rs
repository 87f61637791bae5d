//! Batched sink implementation.

use crate::stats::{SinkCounters, SinkStats};
use inv_error::{Result, TableError};
use inv_pool::ResourcePool;
use inv_traits::TableClient;
use inv_types::{Record, TableDefinition, TableRef};
use std::sync::Arc;
use tokio::sync::MutexGuard;
use tracing::{debug, error, info, trace};

/// Pool of table clients shared by every sink of a run.
pub type TableClientPool = ResourcePool<dyn TableClient>;

/// Buffers records for one table and writes them in batches.
///
/// Appends go through a light append lock. Flushes are serialized by a
/// separate async lock: a flush takes the whole batch up front (swapping in an
/// empty one), so records appended while a write is in flight land in the next
/// batch. A taken batch is never re-queued, whatever the write outcome.
pub struct BatchedSink {
    definition: TableDefinition,
    batch_size: usize,
    clients: Arc<TableClientPool>,
    batch: parking_lot::Mutex<Vec<Record>>,
    flush_lock: tokio::sync::Mutex<()>,
    counters: SinkCounters,
}

impl BatchedSink {
    /// Create a sink writing to `definition` in batches of `batch_size` rows.
    pub fn new(definition: TableDefinition, batch_size: usize, clients: Arc<TableClientPool>) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            definition,
            batch_size,
            clients,
            batch: parking_lot::Mutex::new(Vec::with_capacity(batch_size)),
            flush_lock: tokio::sync::Mutex::new(()),
            counters: SinkCounters::default(),
        }
    }

    pub fn table(&self) -> &TableRef {
        &self.definition.reference
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Create the destination table if it does not exist.
    ///
    /// A table without a declared schema cannot be written and is reported as
    /// [`TableError::MissingSchema`].
    pub async fn initialize(&self) -> Result<()> {
        if !self.definition.is_writable() {
            return Err(TableError::MissingSchema(self.table().to_string()).into());
        }
        let client = self.clients.acquire()?;
        client.create_table_if_absent(&self.definition).await?;
        debug!(table = %self.table(), "Destination table ready");
        Ok(())
    }

    /// Append a record, flushing inline when the batch is full and no other
    /// flush is running.
    pub async fn put(&self, record: Record) -> Result<()> {
        self.counters.record_put();
        let buffered = {
            let mut batch = self.batch.lock();
            batch.push(record);
            batch.len()
        };

        if buffered >= self.batch_size {
            match self.flush_lock.try_lock() {
                Ok(guard) => return self.flush_locked(guard).await,
                Err(_) => {
                    trace!(table = %self.table(), buffered, "Flush in progress, deferring");
                }
            }
        }
        Ok(())
    }

    /// Write everything buffered, waiting for any running flush first.
    ///
    /// No-op when nothing is buffered.
    pub async fn flush(&self) -> Result<()> {
        let guard = self.flush_lock.lock().await;
        self.flush_locked(guard).await
    }

    async fn flush_locked(&self, _guard: MutexGuard<'_, ()>) -> Result<()> {
        let rows = std::mem::take(&mut *self.batch.lock());
        if rows.is_empty() {
            return Ok(());
        }

        let count = rows.len() as u64;
        let table = self.table();

        let client = match self.clients.acquire() {
            Ok(client) => client,
            Err(e) => {
                self.counters.record_failed(count);
                error!(table = %table, rows = count, error = %e, "No table client for flush");
                return Err(e);
            }
        };

        match client.insert_rows(table, &rows).await {
            Ok(outcome) => {
                let failed = outcome.row_errors.len() as u64;
                self.counters.record_write(outcome.inserted, failed);
                for row_error in &outcome.row_errors {
                    error!(table = %table, error = %row_error, "Row insert failed");
                }
                debug!(table = %table, inserted = outcome.inserted, failed, "Flushed batch");
                Ok(())
            }
            Err(TableError::EmptyWrite) => {
                debug!(table = %table, "Empty write reported by table, ignoring");
                Ok(())
            }
            Err(e) => {
                self.counters.record_failed(count);
                error!(table = %table, rows = count, error = %e, "Batch insert failed");
                Err(e.into())
            }
        }
    }

    /// Human-readable counts of inserted and buffered rows.
    pub fn stats(&self) -> SinkStats {
        let buffered = self.batch.lock().len();
        self.counters.snapshot(self.table().to_string(), buffered)
    }

    /// Log the current stats line.
    pub fn log_stats(&self) {
        info!("{}", self.stats());
    }
}
