//! S3 implementation of the object lister.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use chrono::DateTime;
use inv_error::{ListingError, Result};
use inv_traits::{ObjectLister, ObjectPage, RawObject};
use inv_types::AclEntry;
use tracing::debug;

use super::client::{S3Config, create_s3_client};

/// Lists buckets and objects with `ListBuckets` / `ListObjectsV2`.
pub struct S3Lister {
    client: Client,
}

impl S3Lister {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn from_config(config: &S3Config) -> Result<Self> {
        Ok(Self::new(create_s3_client(config).await?))
    }
}

#[async_trait]
impl ObjectLister for S3Lister {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        let resp = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| ListingError::ListBuckets(e.to_string()))?;

        Ok(resp
            .buckets
            .unwrap_or_default()
            .into_iter()
            .filter_map(|b| b.name)
            .collect())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|s| s.is_not_found()) => Ok(false),
            Err(e) => Err(ListingError::ListPage {
                bucket: bucket.to_string(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<String>,
    ) -> Result<ObjectPage> {
        let mut req = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .fetch_owner(true);

        if let Some(prefix) = prefix {
            req = req.prefix(prefix);
        }

        if let Some(token) = token {
            req = req.continuation_token(token);
        }

        let resp = req.send().await.map_err(|e| ListingError::ListPage {
            bucket: bucket.to_string(),
            message: e.to_string(),
        })?;

        let mut objects = Vec::new();
        for obj in resp.contents.unwrap_or_default() {
            let key = obj.key.unwrap_or_default();
            if key.is_empty() {
                continue;
            }

            let mut raw = RawObject::new(bucket, key);
            raw.size = obj.size.map(|s| s.max(0) as u64);
            raw.etag = obj.e_tag.map(|t| t.trim_matches('"').to_string());
            raw.storage_class = obj.storage_class.map(|c| c.as_str().to_string());
            raw.last_modified = obj
                .last_modified
                .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()));
            raw.owner = obj.owner.and_then(|o| o.id);
            objects.push(raw);
        }

        let next_token = if resp.is_truncated == Some(true) {
            resp.next_continuation_token
        } else {
            None
        };

        debug!(
            bucket,
            objects = objects.len(),
            more = next_token.is_some(),
            "Listed page"
        );
        Ok(ObjectPage::new(objects, next_token))
    }

    async fn object_acl(&self, bucket: &str, key: &str) -> Result<Vec<AclEntry>> {
        let resp = self
            .client
            .get_object_acl()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ListingError::Acl {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: e.to_string(),
            })?;

        let entries = resp
            .grants
            .unwrap_or_default()
            .into_iter()
            .filter_map(|grant| {
                let grantee = grant.grantee?;
                let entity = grantee
                    .id
                    .or(grantee.uri)
                    .or(grantee.email_address)?;
                let role = grant
                    .permission
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                Some(AclEntry { entity, role })
            })
            .collect();
        Ok(entries)
    }
}
