//! Destination table references and their fixed schemas.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully qualified reference to a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    pub fn new(dataset: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            table: table.into(),
        }
    }

    /// Quoted `dataset`.`table` form for query text.
    pub fn quoted(&self) -> String {
        format!("`{}`.`{}`", self.dataset, self.table)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dataset, self.table)
    }
}

/// Which declared table a definition describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Inventory,
    ObjectsMoved,
    DataAccessLogs,
    ObjectsExcluded,
    CatchUp,
}

/// Column value types used by the fixed schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    UInt64,
    Bool,
    Timestamp,
    /// Ordered sequence of `(key, value)` pairs
    KeyValueArray,
    /// Ordered sequence of `(entity, role)` pairs
    AclArray,
}

/// One column of a fixed schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
}

const fn col(name: &'static str, column_type: ColumnType) -> Column {
    Column {
        name,
        column_type,
        nullable: true,
    }
}

const fn required(name: &'static str, column_type: ColumnType) -> Column {
    Column {
        name,
        column_type,
        nullable: false,
    }
}

/// Ordered column list plus the sort key used when creating the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub columns: Vec<Column>,
    pub order_by: Vec<&'static str>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Full object inventory schema.
    pub fn inventory() -> Self {
        use ColumnType::*;
        Self {
            columns: vec![
                required("id", String),
                required("bucket", String),
                required("name", String),
                col("generation", UInt64),
                col("metageneration", UInt64),
                col("size", UInt64),
                col("componentCount", UInt64),
                col("etag", String),
                col("md5Hash", String),
                col("crc32c", String),
                col("storageClass", String),
                col("contentType", String),
                col("contentEncoding", String),
                col("contentDisposition", String),
                col("contentLanguage", String),
                col("cacheControl", String),
                col("kmsKeyName", String),
                col("owner", String),
                col("eventBasedHold", Bool),
                col("temporaryHold", Bool),
                col("timeCreated", Timestamp),
                col("updated", Timestamp),
                col("timeDeleted", Timestamp),
                col("timeStorageClassUpdated", Timestamp),
                col("retentionExpirationTime", Timestamp),
                col("customTime", Timestamp),
                required("metadata", KeyValueArray),
                required("acl", AclArray),
            ],
            order_by: vec!["bucket", "name", "id"],
        }
    }

    /// Abbreviated schema for recorded storage-class moves.
    pub fn objects_moved() -> Self {
        use ColumnType::*;
        Self {
            columns: vec![
                required("id", String),
                required("bucket", String),
                required("name", String),
                col("generation", UInt64),
                required("resourceName", String),
                col("storageClass", String),
                col("size", UInt64),
                required("moveTimestamp", Timestamp),
            ],
            order_by: vec!["resourceName", "moveTimestamp"],
        }
    }
}

/// A declared table: its kind, where it lives, and its schema if writable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub kind: TableKind,
    pub reference: TableRef,
    pub schema: Option<TableSchema>,
}

impl TableDefinition {
    pub fn new(kind: TableKind, reference: TableRef) -> Self {
        let schema = match kind {
            TableKind::Inventory => Some(TableSchema::inventory()),
            TableKind::ObjectsMoved => Some(TableSchema::objects_moved()),
            TableKind::DataAccessLogs | TableKind::ObjectsExcluded | TableKind::CatchUp => None,
        };
        Self {
            kind,
            reference,
            schema,
        }
    }

    pub fn is_writable(&self) -> bool {
        self.schema.is_some()
    }
}
