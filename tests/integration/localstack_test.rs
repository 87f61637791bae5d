//! Tests against S3 and SQS APIs served by LocalStack.

use crate::common::{LocalStackTestContext, memory_clients, test_config};
use inv_lister::s3::{S3Config, S3Lister};
use inv_lister::{BulkLister, ListingOptions, TableSinkFactory};
use inv_listener::{EventReconciler, SqsTransport, SqsTransportConfig};
use inv_sink::BatchedSink;
use inv_table::MemoryTable;
use inv_traits::{NotificationTransport, ObjectLister};
use inv_types::EventKind;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_s3_bucket_loads_into_table() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let bucket = "inventory-load-test";
    ctx.create_bucket(bucket).await.unwrap();
    for i in 0..5 {
        ctx.put_object(bucket, &format!("data/file{i}.txt"), "hello")
            .await
            .unwrap();
    }
    ctx.put_object(bucket, "other/skip.txt", "x").await.unwrap();

    let s3 = S3Config::new()
        .with_endpoint(&ctx.endpoint)
        .with_region(&ctx.region)
        .with_credentials("test", "test");
    let lister = S3Lister::from_config(&s3).await.unwrap();
    assert!(lister.bucket_exists(bucket).await.unwrap());
    assert!(!lister.bucket_exists("inventory-no-such-bucket").await.unwrap());

    let config = test_config();
    let memory = Arc::new(MemoryTable::new());
    let sinks = TableSinkFactory::new(
        config.inventory_table(),
        config.table.batch_write_size,
        memory_clients(&memory),
    );
    let bulk = BulkLister::new(
        Arc::new(lister),
        Arc::new(sinks),
        ListingOptions::from_config(&config),
    );

    let report = bulk.list(&[bucket.to_string()], Some("data/")).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.total(), 5);
    let rows = memory.rows(&config.inventory_table().reference);
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r.size == Some(5)));
    assert!(rows.iter().all(|r| r.updated.is_some()));
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_sqs_notifications_are_acked() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let queue = "inventory-listen-test";
    ctx.purge_queue(queue).await;

    let transport = Arc::new(
        SqsTransport::from_config_with_endpoint(
            SqsTransportConfig::new().with_wait_time(1),
            &ctx.endpoint,
            &ctx.region,
        )
        .await,
    );
    transport.ensure_subscription("objects", queue).await.unwrap();
    let queue_url = transport.queue_url().unwrap().to_string();

    ctx.send_notification(
        &queue_url,
        "OBJECT_FINALIZE",
        r#"{"bucket":"photos","name":"cat.jpg","size":"10"}"#,
    )
    .await
    .unwrap();

    let received = transport.receive(10).await.unwrap().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].kind, EventKind::Finalize);
    assert!(!received[0].ack_id.is_empty());
    transport.ack(&received[0]).await.unwrap();

    // Run the full loop over a second notification, then stop it.
    ctx.send_notification(
        &queue_url,
        "OBJECT_DELETE",
        r#"{"bucket":"photos","name":"cat.jpg"}"#,
    )
    .await
    .unwrap();

    let config = test_config();
    let memory = Arc::new(MemoryTable::new());
    let clients = memory_clients(&memory);
    let sink = Arc::new(BatchedSink::new(config.inventory_table(), 10, clients.clone()));
    let reconciler = EventReconciler::new(transport, sink, clients, Duration::from_secs(1));
    reconciler.start("objects", queue).await.unwrap();

    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        stopper.cancel();
    });
    let report = reconciler.run(cancel).await.unwrap();

    assert_eq!(report.acked, 1);
    let rows = memory.rows(&config.inventory_table().reference);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].time_deleted.is_some());
    assert_eq!(ctx.visible_messages(&queue_url).await.unwrap(), 0);

    ctx.delete_queue(&queue_url).await.ok();
}
