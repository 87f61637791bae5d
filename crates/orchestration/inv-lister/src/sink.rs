//! Per-bucket sink creation.

use async_trait::async_trait;
use inv_error::Result;
use inv_sink::{BatchedSink, TableClientPool};
use inv_types::TableDefinition;
use std::sync::Arc;
use tracing::debug;

/// Produces the sink a bucket's records are written to.
///
/// Sinks are created ready for writing: the destination table exists when
/// `create_sink` returns.
#[async_trait]
pub trait SinkFactory: Send + Sync {
    async fn create_sink(&self, bucket: &str) -> Result<Arc<BatchedSink>>;
}

/// Creates one batched sink per bucket, all writing to the same table.
pub struct TableSinkFactory {
    definition: TableDefinition,
    batch_size: usize,
    clients: Arc<TableClientPool>,
}

impl TableSinkFactory {
    pub fn new(definition: TableDefinition, batch_size: usize, clients: Arc<TableClientPool>) -> Self {
        Self {
            definition,
            batch_size,
            clients,
        }
    }
}

#[async_trait]
impl SinkFactory for TableSinkFactory {
    async fn create_sink(&self, bucket: &str) -> Result<Arc<BatchedSink>> {
        let sink = Arc::new(BatchedSink::new(
            self.definition.clone(),
            self.batch_size,
            self.clients.clone(),
        ));
        sink.initialize().await?;
        debug!(bucket, table = %sink.table(), "Created sink");
        Ok(sink)
    }
}
