//! Table client trait and related types.

use async_trait::async_trait;
use inv_error::TableError;
use inv_types::{MetadataEntry, Record, TableDefinition, TableRef};

/// Result type for table operations.
///
/// Kept as [`TableError`] rather than the top-level error so callers can
/// match on [`TableError::EmptyWrite`] without inspecting messages.
pub type TableResult<T> = std::result::Result<T, TableError>;

/// Trait for analytical table backends.
///
/// # Implementations
///
/// - ClickHouse client: RowBinary inserts, parameterized mutations
/// - Stdout table: line-delimited JSON for dumping the inventory
/// - Memory table: records every call, for tests
#[async_trait]
pub trait TableClient: Send + Sync {
    /// Creates the table if it does not exist yet.
    ///
    /// Fails with [`TableError::MissingSchema`] when the definition has no schema.
    async fn create_table_if_absent(&self, definition: &TableDefinition) -> TableResult<()>;

    /// Writes a batch of rows in one call.
    ///
    /// An empty batch fails with [`TableError::EmptyWrite`]. Rows the backend
    /// refuses individually are reported in [`InsertOutcome::row_errors`]
    /// while the remaining rows are still written.
    async fn insert_rows(&self, table: &TableRef, rows: &[Record]) -> TableResult<InsertOutcome>;

    /// Replaces the metadata of the row with the given id.
    ///
    /// Values are bound as query parameters, never spliced into query text.
    async fn update_metadata(
        &self,
        table: &TableRef,
        id: &str,
        metadata: &[MetadataEntry],
    ) -> TableResult<()>;

    /// Runs query text, optionally materializing the result into `destination`
    /// with overwrite semantics.
    async fn execute_query(&self, sql: &str, destination: Option<&TableRef>) -> TableResult<()>;
}

/// Result of one batched write.
#[derive(Debug, Clone, Default)]
pub struct InsertOutcome {
    /// Rows written
    pub inserted: u64,

    /// Rows refused by the backend
    pub row_errors: Vec<RowError>,
}

impl InsertOutcome {
    pub fn success(inserted: u64) -> Self {
        Self {
            inserted,
            row_errors: Vec::new(),
        }
    }

    pub fn with_row_errors(mut self, row_errors: Vec<RowError>) -> Self {
        self.row_errors = row_errors;
        self
    }

    pub fn is_complete_success(&self) -> bool {
        self.row_errors.is_empty()
    }
}

/// One row refused by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// Position of the row in the submitted batch
    pub index: usize,

    /// Row identity, when known
    pub id: Option<String>,

    pub message: String,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "row {} ({}): {}",
            self.index,
            self.id.as_deref().unwrap_or("no id"),
            self.message
        )
    }
}
