//! Classification queries over the inventory tables
//!
//! Composes ClickHouse SQL that joins access history with recorded storage
//! class moves and an exclusion list, producing warm-up and cool-down
//! candidates.

mod composer;

pub use composer::{QueryComposer, QueryKind, QueryTables};
