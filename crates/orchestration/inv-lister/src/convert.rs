//! Listed object to record conversion.

use inv_traits::RawObject;
use inv_types::{Owner, Record, flatten_metadata};

/// Convert one listed object into an inventory record.
///
/// User metadata is flattened into the sorted key/value sequence. Versioned
/// objects get `bucket/key/version` as their id, others `bucket/key`.
pub fn record_from_object(object: RawObject) -> Record {
    let RawObject {
        bucket,
        key,
        size,
        etag,
        storage_class,
        last_modified,
        owner,
        version,
        metadata,
        acl,
    } = object;

    let id = match &version {
        Some(version) => format!("{bucket}/{key}/{version}"),
        None => format!("{bucket}/{key}"),
    };

    let mut record = Record::new(bucket, key);
    record.id = Some(id);
    record.size = size;
    record.etag = etag;
    record.storage_class = storage_class;
    record.updated = last_modified;
    record.owner = owner.map(|id| Owner {
        entity: Some(format!("user-{id}")),
        entity_id: Some(id),
    });
    record.metadata = flatten_metadata(metadata);
    record.acl = acl;
    record
}
