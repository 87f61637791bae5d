//! ClickHouse table backend
//!
//! Inserts use the RowBinary format through typed rows. Metadata updates are
//! mutations with server-side query parameters, so field values never end up
//! in query text.

mod client;
mod config;
mod ddl;
mod rows;

pub use client::ClickHouseTable;
pub use config::ClickHouseConfig;
pub use ddl::create_table_sql;
pub use rows::InventoryRow;
