//! Bulk listing into the inventory table and the JSON-lines dump.

use crate::common::{FakeLister, SharedBuffer, memory_clients, test_config};
use inv_lister::{BulkLister, ListingOptions, TableSinkFactory};
use inv_pool::ResourcePool;
use inv_sink::TableClientPool;
use inv_table::{MemoryTable, StdoutTable};
use inv_traits::{RawObject, TableClient};
use inv_types::{InventoryConfig, Record};
use std::sync::Arc;

fn bulk_lister(
    lister: FakeLister,
    config: &InventoryConfig,
    clients: Arc<TableClientPool>,
) -> BulkLister {
    let sinks = TableSinkFactory::new(
        config.inventory_table(),
        config.table.batch_write_size,
        clients,
    );
    BulkLister::new(
        Arc::new(lister),
        Arc::new(sinks),
        ListingOptions::from_config(config),
    )
}

#[tokio::test]
async fn test_two_buckets_one_object_each() {
    let config = test_config();
    let memory = Arc::new(MemoryTable::new());
    let lister = FakeLister::default()
        .with_objects("alpha", 1)
        .with_objects("beta", 1);

    let report = bulk_lister(lister, &config, memory_clients(&memory))
        .list(&["alpha".to_string(), "beta".to_string()], None)
        .await
        .unwrap();

    let table = config.inventory_table().reference;
    // Batch size 100 never fills, so each bucket's sink writes once at teardown.
    assert_eq!(memory.writes(&table), vec![1, 1]);
    assert_eq!(memory.created(), vec![table.clone()]);
    assert!(report.is_complete());
    assert_eq!(report.total(), 2);

    let mut ids: Vec<String> = memory
        .rows(&table)
        .iter()
        .filter_map(Record::identity)
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["alpha/obj0", "beta/obj0"]);
}

#[tokio::test]
async fn test_acls_attached_when_enabled() {
    let config = test_config().with_acls(true);
    let memory = Arc::new(MemoryTable::new());
    let lister = FakeLister::default().with_objects("alpha", 3);

    let report = bulk_lister(lister, &config, memory_clients(&memory))
        .list(&["alpha".to_string()], None)
        .await
        .unwrap();

    assert!(report.is_complete());
    let rows = memory.rows(&config.inventory_table().reference);
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.acl.len() == 1 && r.acl[0].entity == "allUsers"));
}

#[tokio::test]
async fn test_multi_page_bucket_writes_whole_batches() {
    let config = test_config().with_batch_write_size(4);
    let memory = Arc::new(MemoryTable::new());
    let pages: Vec<Vec<RawObject>> = (0..3)
        .map(|p| {
            (0..3)
                .map(|i| RawObject::new("logs", format!("p{p}/o{i}")))
                .collect()
        })
        .collect();
    let lister = FakeLister::default().with_bucket("logs", pages);

    let report = bulk_lister(lister, &config, memory_clients(&memory))
        .list(&["logs".to_string()], None)
        .await
        .unwrap();

    let table = config.inventory_table().reference;
    let writes = memory.writes(&table);
    assert!(writes.len() >= 2);
    assert_eq!(writes.iter().sum::<usize>(), 9);
    assert_eq!(report.buckets.get("logs"), Some(&9));
}

#[tokio::test]
async fn test_empty_selection_lists_every_bucket() {
    let config = test_config();
    let memory = Arc::new(MemoryTable::new());
    let lister = FakeLister::default()
        .with_objects("a", 2)
        .with_objects("b", 3)
        .with_objects("c", 0);

    let report = bulk_lister(lister, &config, memory_clients(&memory))
        .list(&[], None)
        .await
        .unwrap();

    assert_eq!(report.buckets.len(), 3);
    assert_eq!(report.total(), 5);
    // The empty bucket issues no write at all.
    assert_eq!(memory.writes(&config.inventory_table().reference).len(), 2);
}

#[tokio::test]
async fn test_unknown_bucket_fails_before_listing() {
    let config = test_config();
    let memory = Arc::new(MemoryTable::new());
    let lister = FakeLister::default().with_objects("a", 1);

    let result = bulk_lister(lister, &config, memory_clients(&memory))
        .list(&["a".to_string(), "missing".to_string()], None)
        .await;

    assert!(result.is_err());
    assert!(memory.created().is_empty());
}

#[tokio::test]
async fn test_dump_prints_one_line_per_object() {
    let config = test_config();
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let clients: TableClientPool = ResourcePool::new("stdout", 1, move || {
        Ok(Arc::new(StdoutTable::with_writer(Box::new(writer.clone()))) as Arc<dyn TableClient>)
    })
    .unwrap();
    let objects = vec![
        RawObject::new("photos", "2024/cat.jpg").with_metadata("team", "ml"),
        RawObject::new("photos", "2024/dog.jpg"),
        RawObject::new("photos", "2023/old.jpg"),
    ];
    let lister = FakeLister::default().with_bucket("photos", vec![objects]);

    let report = bulk_lister(lister, &config, Arc::new(clients))
        .list(&["photos".to_string()], Some("2024/"))
        .await
        .unwrap();

    assert_eq!(report.total(), 2);
    let output = buffer.contents();
    let lines: Vec<Record> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].name.as_deref(), Some("2024/cat.jpg"));
    assert_eq!(lines[0].metadata_value("team"), Some("ml"));
}
