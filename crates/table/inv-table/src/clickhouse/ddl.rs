//! DDL rendering for the fixed schemas

use inv_error::TableError;
use inv_types::{Column, ColumnType, TableDefinition};

fn column_type(column: &Column) -> String {
    let base = match column.column_type {
        ColumnType::String => "String",
        ColumnType::UInt64 => "UInt64",
        ColumnType::Bool => "Bool",
        ColumnType::Timestamp => "DateTime64(3, 'UTC')",
        // Arrays cannot be Nullable in ClickHouse; empty means absent.
        ColumnType::KeyValueArray => return "Array(Tuple(key String, value String))".into(),
        ColumnType::AclArray => return "Array(Tuple(entity String, role String))".into(),
    };

    if column.nullable {
        format!("Nullable({base})")
    } else {
        base.to_string()
    }
}

/// Render `CREATE TABLE IF NOT EXISTS` for a writable table.
///
/// ```sql
/// CREATE TABLE IF NOT EXISTS `inventory`.`inventory` (
///     `id` String,
///     `bucket` String,
///     ...
///     `metadata` Array(Tuple(key String, value String)),
///     `acl` Array(Tuple(entity String, role String))
/// ) ENGINE = MergeTree
/// ORDER BY (`bucket`, `name`, `id`)
/// ```
pub fn create_table_sql(definition: &TableDefinition) -> Result<String, TableError> {
    let schema = definition
        .schema
        .as_ref()
        .ok_or_else(|| TableError::MissingSchema(definition.reference.to_string()))?;

    let columns = schema
        .columns
        .iter()
        .map(|c| format!("    `{}` {}", c.name, column_type(c)))
        .collect::<Vec<_>>()
        .join(",\n");

    let order_by = schema
        .order_by
        .iter()
        .map(|c| format!("`{c}`"))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n) ENGINE = MergeTree\nORDER BY ({})",
        definition.reference.quoted(),
        columns,
        order_by
    ))
}
