//! In-memory collaborators.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inv_error::{ListingError, Result};
use inv_sink::TableClientPool;
use inv_table::MemoryTable;
use inv_traits::{NotificationTransport, ObjectLister, ObjectPage, RawObject, TableClient};
use inv_types::{AclEntry, ChangeNotification, EventKind, InventoryConfig};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::io::{self, Write};
use std::sync::Arc;

/// Buckets served as fixed pages; continuation tokens are page indexes.
#[derive(Default)]
pub struct FakeLister {
    buckets: BTreeMap<String, Vec<Vec<RawObject>>>,
    pub page_calls: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeLister {
    pub fn with_bucket(mut self, bucket: &str, pages: Vec<Vec<RawObject>>) -> Self {
        self.buckets.insert(bucket.to_string(), pages);
        self
    }

    /// One page of `count` objects named `obj{i}`.
    pub fn with_objects(self, bucket: &str, count: usize) -> Self {
        let page = (0..count)
            .map(|i| RawObject::new(bucket, format!("obj{i}")).with_size(i as u64 + 1))
            .collect();
        self.with_bucket(bucket, vec![page])
    }
}

#[async_trait]
impl ObjectLister for FakeLister {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        Ok(self.buckets.keys().cloned().collect())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.buckets.contains_key(bucket))
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        token: Option<String>,
    ) -> Result<ObjectPage> {
        self.page_calls
            .lock()
            .push((bucket.to_string(), prefix.map(str::to_string)));

        let pages = self.buckets.get(bucket).ok_or_else(|| {
            ListingError::BucketNotFound(bucket.to_string())
        })?;
        let index = token.and_then(|t| t.parse::<usize>().ok()).unwrap_or(0);
        let objects = pages[index]
            .iter()
            .filter(|o| prefix.is_none_or(|p| o.key.starts_with(p)))
            .cloned()
            .collect();
        let next = (index + 1 < pages.len()).then(|| (index + 1).to_string());
        Ok(ObjectPage::new(objects, next))
    }

    async fn object_acl(&self, _bucket: &str, _key: &str) -> Result<Vec<AclEntry>> {
        Ok(vec![AclEntry {
            entity: "allUsers".into(),
            role: "READ".into(),
        }])
    }
}

/// Transport over a fixed list of notifications; the stream ends when drained.
#[derive(Default)]
pub struct FakeTransport {
    queue: Mutex<VecDeque<ChangeNotification>>,
    pub acked: Mutex<Vec<String>>,
    pub rejected: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new(notifications: Vec<ChangeNotification>) -> Self {
        Self {
            queue: Mutex::new(notifications.into()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl NotificationTransport for FakeTransport {
    async fn ensure_subscription(&self, _topic: &str, _subscription: &str) -> Result<()> {
        Ok(())
    }

    async fn receive(&self, max: usize) -> Result<Option<Vec<ChangeNotification>>> {
        let mut queue = self.queue.lock();
        if queue.is_empty() {
            return Ok(None);
        }
        let n = queue.len().min(max);
        Ok(Some(queue.drain(..n).collect()))
    }

    async fn ack(&self, notification: &ChangeNotification) -> Result<()> {
        self.acked.lock().push(notification.message_id.clone());
        Ok(())
    }

    async fn reject(&self, notification: &ChangeNotification) -> Result<()> {
        self.rejected.lock().push(notification.message_id.clone());
        Ok(())
    }
}

/// Writer whose bytes stay readable after the table client takes ownership.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Pool whose every handle is the same in-memory table.
pub fn memory_clients(memory: &Arc<MemoryTable>) -> Arc<TableClientPool> {
    let handle = memory.clone();
    Arc::new(
        TableClientPool::new("memory", 4, move || Ok(handle.clone() as Arc<dyn TableClient>))
            .unwrap(),
    )
}

/// Small, fast configuration.
pub fn test_config() -> InventoryConfig {
    InventoryConfig::default()
        .with_dataset("usage")
        .with_batch_write_size(100)
        .with_workers(4)
        .with_work_queue_size(16)
        .with_page_dispatch_delay_ms(0)
}

pub fn published() -> DateTime<Utc> {
    DateTime::from_timestamp(1_714_557_600, 0).unwrap()
}

pub fn notification(id: &str, kind: EventKind, payload: &str) -> ChangeNotification {
    ChangeNotification::new(id, kind, published(), payload.as_bytes().to_vec())
}
