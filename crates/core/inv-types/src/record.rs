//! Inventory record: one object's metadata at a point in time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One custom metadata key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

impl MetadataEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One access-control grant on an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    pub entity: String,
    pub role: String,
}

/// Object owner as reported by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Owner {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

/// Metadata of one inventoried object.
///
/// Fields mirror the fixed inventory table schema. Every field is optional
/// because change notifications may carry only a subset (a metadata update
/// carries identity plus the changed metadata). JSON names are camelCase.
///
/// `metadata` accepts either a JSON object (document order is preserved) or
/// an array of `{key, value}` pairs, and always serializes as the array form.
/// Integer fields accept numbers or numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Record {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        deserialize_with = "lenient::option_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub generation: Option<u64>,
    #[serde(
        deserialize_with = "lenient::option_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub metageneration: Option<u64>,
    #[serde(
        deserialize_with = "lenient::option_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub size: Option<u64>,
    #[serde(
        deserialize_with = "lenient::option_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub component_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crc32c: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_disposition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_key_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_based_hold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_hold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_deleted: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_storage_class_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_expiration_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_time: Option<DateTime<Utc>>,
    #[serde(with = "key_value")]
    pub metadata: Vec<MetadataEntry>,
    pub acl: Vec<AclEntry>,
}

impl Record {
    /// Create a record for an object in a bucket.
    pub fn new(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bucket: Some(bucket.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Store-assigned identity of the object.
    ///
    /// Uses `id` when present, otherwise `bucket/name/generation`
    /// (or `bucket/name` when the store has no generations).
    pub fn identity(&self) -> Option<String> {
        if let Some(id) = &self.id {
            return Some(id.clone());
        }
        let bucket = self.bucket.as_deref()?;
        let name = self.name.as_deref()?;
        Some(match self.generation {
            Some(generation) => format!("{bucket}/{name}/{generation}"),
            None => format!("{bucket}/{name}"),
        })
    }

    /// Fill `id` from the derived identity when absent.
    pub fn with_derived_id(mut self) -> Self {
        if self.id.is_none() {
            self.id = self.identity();
        }
        self
    }

    /// Resource name in the shape used by data access logs.
    pub fn resource_name(&self) -> Option<String> {
        let bucket = self.bucket.as_deref()?;
        let name = self.name.as_deref()?;
        Some(format!("projects/_/buckets/{bucket}/objects/{name}"))
    }

    /// Look up a custom metadata value by key.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }
}

/// Flatten key/value pairs into the ordered metadata sequence, sorted by key.
///
/// Used for sources whose maps have no stable order.
pub fn flatten_metadata<I, K, V>(pairs: I) -> Vec<MetadataEntry>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut entries: Vec<MetadataEntry> = pairs
        .into_iter()
        .map(|(k, v)| MetadataEntry::new(k, v))
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));
    entries
}

mod key_value {
    use super::MetadataEntry;
    use serde::de::{self, MapAccess, SeqAccess, Visitor};
    use serde::{Deserializer, Serialize, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(entries: &[MetadataEntry], s: S) -> Result<S::Ok, S::Error> {
        entries.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<MetadataEntry>, D::Error> {
        d.deserialize_any(KeyValueVisitor)
    }

    struct KeyValueVisitor;

    impl<'de> Visitor<'de> for KeyValueVisitor {
        type Value = Vec<MetadataEntry>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a metadata map or a sequence of {key, value} pairs")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, serde_json::Value>()? {
                entries.push(MetadataEntry::new(key, scalar_to_string(value)));
            }
            Ok(entries)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(entry) = seq.next_element::<MetadataEntry>()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    fn scalar_to_string(value: serde_json::Value) -> String {
        match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

mod lenient {
    use serde::Deserializer;
    use serde::de::{self, Visitor};
    use std::fmt;

    pub fn option_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        d.deserialize_any(OptionU64Visitor)
    }

    struct OptionU64Visitor;

    impl<'de> Visitor<'de> for OptionU64Visitor {
        type Value = Option<u64>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an unsigned integer or a numeric string")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            u64::try_from(v)
                .map(Some)
                .map_err(|_| E::custom(format!("negative value {v}")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            v.parse::<u64>()
                .map(Some)
                .map_err(|_| E::custom(format!("'{v}' is not a valid number")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_map_keeps_document_order() {
        let json = r#"{"bucket":"b","name":"o","metadata":{"zeta":"1","alpha":"2"}}"#;
        let record: Record = serde_json::from_str(json).unwrap();

        assert_eq!(
            record.metadata,
            vec![MetadataEntry::new("zeta", "1"), MetadataEntry::new("alpha", "2")]
        );
    }

    #[test]
    fn test_metadata_serializes_as_pairs() {
        let mut record = Record::new("b", "o");
        record.metadata = vec![MetadataEntry::new("k", "v")];

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["metadata"], serde_json::json!([{"key": "k", "value": "v"}]));
    }

    #[test]
    fn test_metadata_accepts_pairs_and_null() {
        let pairs: Record =
            serde_json::from_str(r#"{"metadata":[{"key":"a","value":"b"}]}"#).unwrap();
        assert_eq!(pairs.metadata_value("a"), Some("b"));

        let null: Record = serde_json::from_str(r#"{"metadata":null}"#).unwrap();
        assert!(null.metadata.is_empty());
    }

    #[test]
    fn test_numeric_strings() {
        let json = r#"{"bucket":"b","name":"o","generation":"1700000000000001","size":42}"#;
        let record: Record = serde_json::from_str(json).unwrap();

        assert_eq!(record.generation, Some(1_700_000_000_000_001));
        assert_eq!(record.size, Some(42));
    }

    #[test]
    fn test_invalid_numeric_string_is_rejected() {
        let result = serde_json::from_str::<Record>(r#"{"size":"lots"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_identity_derivation() {
        let mut record = Record::new("photos", "cat.jpg");
        assert_eq!(record.identity().as_deref(), Some("photos/cat.jpg"));

        record.generation = Some(7);
        assert_eq!(record.identity().as_deref(), Some("photos/cat.jpg/7"));

        let record = record.with_derived_id();
        assert_eq!(record.id.as_deref(), Some("photos/cat.jpg/7"));
    }

    #[test]
    fn test_identity_prefers_store_id() {
        let mut record = Record::new("photos", "cat.jpg");
        record.id = Some("store-assigned".into());
        assert_eq!(record.identity().as_deref(), Some("store-assigned"));
    }

    #[test]
    fn test_resource_name() {
        let record = Record::new("photos", "2024/cat.jpg");
        assert_eq!(
            record.resource_name().as_deref(),
            Some("projects/_/buckets/photos/objects/2024/cat.jpg")
        );
        assert!(Record::default().resource_name().is_none());
    }

    #[test]
    fn test_flatten_metadata_sorts_keys() {
        let entries = flatten_metadata([("b", "2"), ("a", "1")]);
        assert_eq!(entries[0].key, "a");
        assert_eq!(entries[1].key, "b");
    }

    #[test]
    fn test_timestamps_round_trip_camel_case() {
        let json = r#"{"timeCreated":"2024-03-01T10:00:00Z","storageClass":"STANDARD"}"#;
        let record: Record = serde_json::from_str(json).unwrap();

        assert!(record.time_created.is_some());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["storageClass"], "STANDARD");
        assert!(value.get("timeDeleted").is_none());
    }
}
