//! Object listing trait and related types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inv_error::Result;
use inv_types::AclEntry;

/// Trait for object store listing backends.
///
/// # Implementations
///
/// - S3 lister: `ListBuckets` / `ListObjectsV2`, plus `GetObjectAcl` per object
#[async_trait]
pub trait ObjectLister: Send + Sync {
    /// Lists every bucket owned by the configured account.
    async fn list_buckets(&self) -> Result<Vec<String>>;

    /// Returns true if the bucket exists and is visible.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Fetches one page of objects.
    ///
    /// `token` is the continuation token returned by the previous page,
    /// `None` for the first page. Listed objects carry no access-control
    /// entries; those come from [`ObjectLister::object_acl`].
    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<String>,
    ) -> Result<ObjectPage>;

    /// Fetches the access-control entries of one object.
    async fn object_acl(&self, bucket: &str, key: &str) -> Result<Vec<AclEntry>>;
}

/// One page of listed objects.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub objects: Vec<RawObject>,

    /// Token for the next page, `None` on the last page
    pub next_token: Option<String>,
}

impl ObjectPage {
    pub fn new(objects: Vec<RawObject>, next_token: Option<String>) -> Self {
        Self {
            objects,
            next_token,
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_token.is_none()
    }
}

/// Raw attributes of a listed object, before conversion into a record.
#[derive(Debug, Clone, Default)]
pub struct RawObject {
    pub bucket: String,

    /// Object key (full path within the bucket)
    pub key: String,

    pub size: Option<u64>,

    pub etag: Option<String>,

    pub storage_class: Option<String>,

    pub last_modified: Option<DateTime<Utc>>,

    /// Owner id as reported by the listing
    pub owner: Option<String>,

    /// Version id, when the bucket is versioned
    pub version: Option<String>,

    /// User metadata, in whatever order the backend reports it
    pub metadata: Vec<(String, String)>,

    pub acl: Vec<AclEntry>,
}

impl RawObject {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }
}
