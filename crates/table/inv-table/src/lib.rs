//! Table client implementations.
//!
//! - [`ClickHouseTable`] - Production backend over the ClickHouse HTTP interface
//! - [`StdoutTable`] - Writes every inserted row as one JSON line (inventory dump)
//!
//! With the `test-util` feature, `MemoryTable` keeps every call in memory
//! for assertions in tests.

pub mod clickhouse;
#[cfg(any(test, feature = "test-util"))]
mod memory;
mod stdout;

pub use clickhouse::{ClickHouseConfig, ClickHouseTable};
#[cfg(any(test, feature = "test-util"))]
pub use memory::{MemoryTable, MetadataUpdate};
pub use stdout::StdoutTable;
