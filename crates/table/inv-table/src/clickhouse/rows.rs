//! Inventory table row type

use chrono::{DateTime, Utc};
use clickhouse::Row;
use inv_types::Record;
use serde::Serialize;

/// One row of the inventory table, in column order of the fixed schema
///
/// Timestamps are milliseconds since the epoch (DateTime64(3)). Custom
/// metadata and ACL entries are arrays of named tuples.
#[derive(Debug, Clone, PartialEq, Row, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRow {
    pub id: String,
    pub bucket: String,
    pub name: String,
    pub generation: Option<u64>,
    pub metageneration: Option<u64>,
    pub size: Option<u64>,
    pub component_count: Option<u64>,
    pub etag: Option<String>,
    pub md5_hash: Option<String>,
    pub crc32c: Option<String>,
    pub storage_class: Option<String>,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub content_disposition: Option<String>,
    pub content_language: Option<String>,
    pub cache_control: Option<String>,
    pub kms_key_name: Option<String>,
    pub owner: Option<String>,
    pub event_based_hold: Option<bool>,
    pub temporary_hold: Option<bool>,
    pub time_created: Option<i64>,
    pub updated: Option<i64>,
    pub time_deleted: Option<i64>,
    pub time_storage_class_updated: Option<i64>,
    pub retention_expiration_time: Option<i64>,
    pub custom_time: Option<i64>,
    pub metadata: Vec<(String, String)>,
    pub acl: Vec<(String, String)>,
}

fn millis(ts: Option<DateTime<Utc>>) -> Option<i64> {
    ts.map(|t| t.timestamp_millis())
}

impl TryFrom<&Record> for InventoryRow {
    type Error = String;

    /// Rows need a bucket and a name; the id is derived when missing.
    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        let bucket = record.bucket.clone().ok_or("missing bucket")?;
        let name = record.name.clone().ok_or("missing name")?;
        let id = record.identity().ok_or("missing identity")?;

        Ok(Self {
            id,
            bucket,
            name,
            generation: record.generation,
            metageneration: record.metageneration,
            size: record.size,
            component_count: record.component_count,
            etag: record.etag.clone(),
            md5_hash: record.md5_hash.clone(),
            crc32c: record.crc32c.clone(),
            storage_class: record.storage_class.clone(),
            content_type: record.content_type.clone(),
            content_encoding: record.content_encoding.clone(),
            content_disposition: record.content_disposition.clone(),
            content_language: record.content_language.clone(),
            cache_control: record.cache_control.clone(),
            kms_key_name: record.kms_key_name.clone(),
            owner: record.owner.as_ref().and_then(|o| o.entity.clone()),
            event_based_hold: record.event_based_hold,
            temporary_hold: record.temporary_hold,
            time_created: millis(record.time_created),
            updated: millis(record.updated),
            time_deleted: millis(record.time_deleted),
            time_storage_class_updated: millis(record.time_storage_class_updated),
            retention_expiration_time: millis(record.retention_expiration_time),
            custom_time: millis(record.custom_time),
            metadata: record
                .metadata
                .iter()
                .map(|e| (e.key.clone(), e.value.clone()))
                .collect(),
            acl: record
                .acl
                .iter()
                .map(|e| (e.entity.clone(), e.role.clone()))
                .collect(),
        })
    }
}
