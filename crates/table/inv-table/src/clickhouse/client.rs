//! ClickHouse implementation of the table client

use async_trait::async_trait;
use clickhouse::Client;
use clickhouse::insert::Insert;
use inv_error::TableError;
use inv_traits::{InsertOutcome, RowError, TableClient, TableResult};
use inv_types::{MetadataEntry, Record, TableDefinition, TableRef};
use tracing::{debug, info};

use super::config::ClickHouseConfig;
use super::ddl::create_table_sql;
use super::rows::InventoryRow;

/// Table client over one ClickHouse HTTP client
pub struct ClickHouseTable {
    client: Client,
}

impl ClickHouseTable {
    pub fn new(config: &ClickHouseConfig) -> Self {
        Self {
            client: config.build_client(),
        }
    }

    /// Wrap an already configured client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn execute(&self, sql: &str) -> Result<(), clickhouse::error::Error> {
        self.client.query(sql).execute().await
    }
}

/// `CREATE OR REPLACE TABLE ... AS` wrapper giving overwrite semantics
fn materialize_sql(sql: &str, destination: &TableRef) -> String {
    format!(
        "CREATE OR REPLACE TABLE {} ENGINE = MergeTree ORDER BY tuple() AS\n{}",
        destination.quoted(),
        sql
    )
}

fn update_metadata_sql(table: &TableRef) -> String {
    format!(
        "ALTER TABLE {} UPDATE metadata = {{metadata:Array(Tuple(String, String))}} WHERE id = {{id:String}}",
        table.quoted()
    )
}

#[async_trait]
impl TableClient for ClickHouseTable {
    async fn create_table_if_absent(&self, definition: &TableDefinition) -> TableResult<()> {
        let sql = create_table_sql(definition)?;
        self.execute(&sql).await.map_err(|e| TableError::Create {
            table: definition.reference.to_string(),
            message: e.to_string(),
        })?;
        info!(table = %definition.reference, "Table ready");
        Ok(())
    }

    async fn insert_rows(&self, table: &TableRef, rows: &[Record]) -> TableResult<InsertOutcome> {
        if rows.is_empty() {
            return Err(TableError::EmptyWrite);
        }

        let mut valid = Vec::with_capacity(rows.len());
        let mut row_errors = Vec::new();
        for (index, record) in rows.iter().enumerate() {
            match InventoryRow::try_from(record) {
                Ok(row) => valid.push(row),
                Err(message) => row_errors.push(RowError {
                    index,
                    id: record.identity(),
                    message,
                }),
            }
        }

        if valid.is_empty() {
            return Ok(InsertOutcome::success(0).with_row_errors(row_errors));
        }

        let insert_err = |e: clickhouse::error::Error| TableError::Insert {
            table: table.to_string(),
            message: e.to_string(),
        };

        // The client is bound to the dataset, so the bare table name is enough.
        let mut insert: Insert<InventoryRow> =
            self.client.insert(&table.table).await.map_err(insert_err)?;
        for row in &valid {
            insert.write(row).await.map_err(insert_err)?;
        }
        insert.end().await.map_err(insert_err)?;

        debug!(table = %table, rows = valid.len(), rejected = row_errors.len(), "Inserted rows");
        Ok(InsertOutcome::success(valid.len() as u64).with_row_errors(row_errors))
    }

    async fn update_metadata(
        &self,
        table: &TableRef,
        id: &str,
        metadata: &[MetadataEntry],
    ) -> TableResult<()> {
        let pairs: Vec<(String, String)> = metadata
            .iter()
            .map(|e| (e.key.clone(), e.value.clone()))
            .collect();

        self.client
            .query(&update_metadata_sql(table))
            .param("metadata", pairs)
            .param("id", id)
            .execute()
            .await
            .map_err(|e| TableError::Update {
                table: table.to_string(),
                id: id.to_string(),
                message: e.to_string(),
            })?;

        debug!(table = %table, id, "Updated object metadata");
        Ok(())
    }

    async fn execute_query(&self, sql: &str, destination: Option<&TableRef>) -> TableResult<()> {
        let sql = match destination {
            Some(dest) => materialize_sql(sql, dest),
            None => sql.to_string(),
        };
        self.execute(&sql)
            .await
            .map_err(|e| TableError::Query(e.to_string()))?;

        if let Some(dest) = destination {
            info!(destination = %dest, "Query results materialized");
        }
        Ok(())
    }
}
