//! In-memory table client.

use async_trait::async_trait;
use inv_error::TableError;
use inv_traits::{InsertOutcome, TableClient, TableResult};
use inv_types::{MetadataEntry, Record, TableDefinition, TableRef};
use parking_lot::Mutex;
use std::collections::HashMap;

/// One recorded metadata point update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataUpdate {
    pub table: TableRef,
    pub id: String,
    pub metadata: Vec<MetadataEntry>,
}

#[derive(Debug, Default)]
struct State {
    created: Vec<TableRef>,
    rows: HashMap<TableRef, Vec<Record>>,
    writes: Vec<(TableRef, usize)>,
    updates: Vec<MetadataUpdate>,
    queries: Vec<(String, Option<TableRef>)>,
}

/// Table client that keeps every call in memory.
///
/// Writes to a table that was never created fail, like a real backend would.
/// Updates apply to stored rows matching the id.
#[derive(Debug, Default)]
pub struct MemoryTable {
    state: Mutex<State>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows currently stored in `table`.
    pub fn rows(&self, table: &TableRef) -> Vec<Record> {
        self.state.lock().rows.get(table).cloned().unwrap_or_default()
    }

    /// Row count of every non-empty write call, in call order.
    pub fn writes(&self, table: &TableRef) -> Vec<usize> {
        self.state
            .lock()
            .writes
            .iter()
            .filter(|(t, _)| t == table)
            .map(|(_, n)| *n)
            .collect()
    }

    pub fn updates(&self) -> Vec<MetadataUpdate> {
        self.state.lock().updates.clone()
    }

    pub fn queries(&self) -> Vec<(String, Option<TableRef>)> {
        self.state.lock().queries.clone()
    }

    pub fn created(&self) -> Vec<TableRef> {
        self.state.lock().created.clone()
    }
}

#[async_trait]
impl TableClient for MemoryTable {
    async fn create_table_if_absent(&self, definition: &TableDefinition) -> TableResult<()> {
        if definition.schema.is_none() {
            return Err(TableError::MissingSchema(definition.reference.to_string()));
        }
        let mut state = self.state.lock();
        if !state.created.contains(&definition.reference) {
            state.created.push(definition.reference.clone());
            state.rows.entry(definition.reference.clone()).or_default();
        }
        Ok(())
    }

    async fn insert_rows(&self, table: &TableRef, rows: &[Record]) -> TableResult<InsertOutcome> {
        if rows.is_empty() {
            return Err(TableError::EmptyWrite);
        }
        let mut state = self.state.lock();
        let Some(stored) = state.rows.get_mut(table) else {
            return Err(TableError::Insert {
                table: table.to_string(),
                message: "table does not exist".into(),
            });
        };
        stored.extend(rows.iter().cloned());
        state.writes.push((table.clone(), rows.len()));
        Ok(InsertOutcome::success(rows.len() as u64))
    }

    async fn update_metadata(
        &self,
        table: &TableRef,
        id: &str,
        metadata: &[MetadataEntry],
    ) -> TableResult<()> {
        let mut state = self.state.lock();
        if let Some(stored) = state.rows.get_mut(table) {
            for row in stored.iter_mut().filter(|r| r.identity().as_deref() == Some(id)) {
                row.metadata = metadata.to_vec();
            }
        }
        state.updates.push(MetadataUpdate {
            table: table.clone(),
            id: id.to_string(),
            metadata: metadata.to_vec(),
        });
        Ok(())
    }

    async fn execute_query(&self, sql: &str, destination: Option<&TableRef>) -> TableResult<()> {
        self.state
            .lock()
            .queries
            .push((sql.to_string(), destination.cloned()));
        Ok(())
    }
}
