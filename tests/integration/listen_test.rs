//! Change notifications applied to the inventory table.

use crate::common::{FakeTransport, memory_clients, notification, published, test_config};
use inv_listener::{EventReconciler, StdinTransport};
use inv_sink::BatchedSink;
use inv_table::MemoryTable;
use inv_traits::NotificationTransport;
use inv_types::{EventKind, InventoryConfig, MetadataEntry, Record};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

async fn reconciler(
    transport: Arc<dyn NotificationTransport>,
    config: &InventoryConfig,
    memory: &Arc<MemoryTable>,
) -> EventReconciler {
    let clients = memory_clients(memory);
    let sink = Arc::new(BatchedSink::new(
        config.inventory_table(),
        config.table.batch_write_size,
        clients.clone(),
    ));
    let reconciler = EventReconciler::new(
        transport,
        sink,
        clients,
        Duration::from_secs(config.notifications.idle_timeout_secs),
    );
    reconciler
        .start(&config.notifications.topic, &config.notifications.subscription)
        .await
        .unwrap();
    reconciler
}

#[tokio::test]
async fn test_delete_without_prior_row() {
    let config = test_config();
    let memory = Arc::new(MemoryTable::new());
    let transport = Arc::new(FakeTransport::new(vec![notification(
        "del-1",
        EventKind::Delete,
        r#"{"bucket":"photos","name":"gone.jpg","generation":"1714557000000000"}"#,
    )]));

    let report = reconciler(transport.clone(), &config, &memory)
        .await
        .run(CancellationToken::new())
        .await
        .unwrap();

    let rows = memory.rows(&config.inventory_table().reference);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].time_deleted, Some(published()));
    assert_eq!(rows[0].generation, Some(1_714_557_000_000_000));
    assert_eq!(*transport.acked.lock(), vec!["del-1".to_string()]);
    assert!(transport.rejected.lock().is_empty());
    assert_eq!(report.acked, 1);
}

#[tokio::test]
async fn test_metadata_update_is_a_point_update() {
    let config = test_config();
    let memory = Arc::new(MemoryTable::new());
    let transport = Arc::new(FakeTransport::new(vec![notification(
        "meta-1",
        EventKind::MetadataUpdate,
        r#"{"id":"photos/cat.jpg/7","bucket":"photos","name":"cat.jpg","metadata":{"team":"ml"}}"#,
    )]));

    reconciler(transport.clone(), &config, &memory)
        .await
        .run(CancellationToken::new())
        .await
        .unwrap();

    let table = config.inventory_table().reference;
    assert!(memory.writes(&table).is_empty());
    let updates = memory.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].id, "photos/cat.jpg/7");
    assert_eq!(updates[0].table, table);
    assert_eq!(updates[0].metadata, vec![MetadataEntry::new("team", "ml")]);
    assert_eq!(*transport.acked.lock(), vec!["meta-1".to_string()]);
}

#[tokio::test]
async fn test_malformed_payload_rejected_and_loop_continues() {
    let config = test_config();
    let memory = Arc::new(MemoryTable::new());
    let transport = Arc::new(FakeTransport::new(vec![
        notification("bad", EventKind::Finalize, "{not json"),
        notification(
            "good",
            EventKind::Finalize,
            r#"{"bucket":"photos","name":"new.jpg","size":"2048"}"#,
        ),
    ]));

    let report = reconciler(transport.clone(), &config, &memory)
        .await
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(*transport.rejected.lock(), vec!["bad".to_string()]);
    assert_eq!(*transport.acked.lock(), vec!["good".to_string()]);
    assert!(memory.updates().is_empty());
    assert!(memory.queries().is_empty());

    let rows = memory.rows(&config.inventory_table().reference);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].size, Some(2048));
    assert_eq!(report.rejected, 1);
    assert_eq!(report.acked, 1);
}

#[tokio::test]
async fn test_update_after_finalize_rewrites_stored_metadata() {
    let config = test_config();
    let memory = Arc::new(MemoryTable::new());
    let transport = Arc::new(FakeTransport::new(vec![
        notification(
            "create",
            EventKind::Finalize,
            r#"{"bucket":"docs","name":"a.txt","metadata":{"stage":"draft"}}"#,
        ),
        notification(
            "update",
            EventKind::MetadataUpdate,
            r#"{"bucket":"docs","name":"a.txt","metadata":{"stage":"final"}}"#,
        ),
    ]));

    reconciler(transport.clone(), &config, &memory)
        .await
        .run(CancellationToken::new())
        .await
        .unwrap();

    let rows = memory.rows(&config.inventory_table().reference);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].identity().as_deref(), Some("docs/a.txt"));
    assert_eq!(rows[0].metadata_value("stage"), Some("final"));
    assert_eq!(transport.acked.lock().len(), 2);
}

#[tokio::test]
async fn test_stdin_notifications_end_to_end() {
    let config = test_config();
    let memory = Arc::new(MemoryTable::new());
    let input = concat!(
        r#"{"eventType":"OBJECT_FINALIZE","data":{"bucket":"b","name":"one","size":1}}"#,
        "\n",
        "garbage\n",
        r#"{"eventType":"OBJECT_DELETE","publishTime":"2024-05-01T10:00:00Z","data":{"bucket":"b","name":"two"}}"#,
        "\n",
    );
    let transport = Arc::new(StdinTransport::with_reader(Box::new(Cursor::new(
        input.as_bytes().to_vec(),
    ))));

    let report = reconciler(transport, &config, &memory)
        .await
        .run(CancellationToken::new())
        .await
        .unwrap();

    let rows = memory.rows(&config.inventory_table().reference);
    let names: Vec<&str> = rows.iter().filter_map(|r| r.name.as_deref()).collect();
    assert_eq!(names, vec!["one", "two"]);
    assert_eq!(rows[1].time_deleted, Some(published()));
    assert!(rows.iter().all(|r: &Record| r.id.is_some()));
    assert_eq!(report.acked, 2);
}
