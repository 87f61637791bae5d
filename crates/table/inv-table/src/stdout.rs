//! Line-delimited JSON table client.

use async_trait::async_trait;
use inv_error::TableError;
use inv_traits::{InsertOutcome, RowError, TableClient, TableResult};
use inv_types::{MetadataEntry, Record, TableDefinition, TableRef};
use parking_lot::Mutex;
use std::io::{self, Write};

/// Table client that prints every inserted row as one JSON line.
///
/// Backs the inventory dump: the bulk listing pipeline runs unchanged and
/// each "insert" lands on stdout. Metadata updates and queries are not
/// supported.
pub struct StdoutTable {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl StdoutTable {
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a table client with a custom writer (for testing).
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl Default for StdoutTable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TableClient for StdoutTable {
    async fn create_table_if_absent(&self, _definition: &TableDefinition) -> TableResult<()> {
        Ok(())
    }

    async fn insert_rows(&self, table: &TableRef, rows: &[Record]) -> TableResult<InsertOutcome> {
        if rows.is_empty() {
            return Err(TableError::EmptyWrite);
        }

        let mut buf = Vec::with_capacity(rows.len() * 256);
        let mut row_errors = Vec::new();
        let mut written = 0u64;
        for (index, record) in rows.iter().enumerate() {
            match serde_json::to_writer(&mut buf, record) {
                Ok(()) => {
                    buf.push(b'\n');
                    written += 1;
                }
                Err(e) => row_errors.push(RowError {
                    index,
                    id: record.identity(),
                    message: e.to_string(),
                }),
            }
        }

        // One write per batch keeps lines from concurrent flushes whole.
        let io_err = |e: io::Error| TableError::Insert {
            table: table.to_string(),
            message: e.to_string(),
        };
        let mut writer = self.writer.lock();
        writer.write_all(&buf).map_err(io_err)?;
        writer.flush().map_err(io_err)?;

        Ok(InsertOutcome::success(written).with_row_errors(row_errors))
    }

    async fn update_metadata(
        &self,
        table: &TableRef,
        id: &str,
        _metadata: &[MetadataEntry],
    ) -> TableResult<()> {
        Err(TableError::Update {
            table: table.to_string(),
            id: id.to_string(),
            message: "updates are not supported on stdout".into(),
        })
    }

    async fn execute_query(&self, _sql: &str, _destination: Option<&TableRef>) -> TableResult<()> {
        Err(TableError::Query("queries are not supported on stdout".into()))
    }
}
