//! Notification reconciliation loop.

use inv_error::{DecodeError, Result, classify_error};
use inv_sink::{BatchedSink, TableClientPool};
use inv_traits::NotificationTransport;
use inv_types::{ChangeNotification, EventKind, Record};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Pause after a failed receive before polling again.
const RECEIVE_BACKOFF: Duration = Duration::from_millis(100);

/// Notifications requested per receive call.
const RECEIVE_BATCH: usize = 10;

/// How a notification was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Full record queued for insert
    Inserted,
    /// Deletion record queued for insert
    Deleted,
    /// Metadata updated in place
    MetadataUpdated,
}

/// Counts from one listening session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListenReport {
    pub acked: u64,
    pub rejected: u64,
    pub flushes: u64,
}

/// Applies change notifications from one subscription to the inventory table.
///
/// Creations and deletions go through the batched sink. Metadata updates are
/// point updates issued directly against the table. A periodic timer flushes
/// the sink whether or not notifications arrive, so a quiet subscription
/// does not hold rows back.
pub struct EventReconciler {
    transport: Arc<dyn NotificationTransport>,
    sink: Arc<BatchedSink>,
    clients: Arc<TableClientPool>,
    flush_interval: Duration,
}

impl EventReconciler {
    pub fn new(
        transport: Arc<dyn NotificationTransport>,
        sink: Arc<BatchedSink>,
        clients: Arc<TableClientPool>,
        flush_interval: Duration,
    ) -> Self {
        Self {
            transport,
            sink,
            clients,
            flush_interval,
        }
    }

    /// Create or adopt the subscription, then make sure the table exists.
    pub async fn start(&self, topic: &str, subscription: &str) -> Result<()> {
        self.transport
            .ensure_subscription(topic, subscription)
            .await?;
        self.sink.initialize().await?;
        info!(topic, subscription, table = %self.sink.table(), "Listening for changes");
        Ok(())
    }

    /// Apply one notification without acking or rejecting it.
    pub async fn handle(&self, notification: &ChangeNotification) -> Result<Disposition> {
        let record = decode(notification)?;

        match notification.kind {
            EventKind::Delete => {
                // Deleted objects have no metadata left to fetch; the publish
                // time stands in for the deletion time.
                let mut record = record;
                record.time_deleted = Some(notification.publish_time);
                self.sink.put(record).await?;
                Ok(Disposition::Deleted)
            }
            EventKind::MetadataUpdate => {
                let id = record
                    .identity()
                    .ok_or_else(|| DecodeError::MissingField("id".into()))?;
                // The row being updated may still be buffered.
                self.sink.flush().await?;
                let client = self.clients.acquire()?;
                client
                    .update_metadata(self.sink.table(), &id, &record.metadata)
                    .await?;
                Ok(Disposition::MetadataUpdated)
            }
            _ => {
                self.sink.put(record).await?;
                Ok(Disposition::Inserted)
            }
        }
    }

    /// Receive and apply notifications until the stream ends or `cancel` fires.
    ///
    /// The sink is flushed one last time before returning.
    pub async fn run(&self, cancel: CancellationToken) -> Result<ListenReport> {
        let mut report = ListenReport::default();

        let period = self.flush_interval.max(Duration::from_millis(1));
        let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // One receive stays in flight across timer ticks; a tick must not
        // abandon a long poll that may already hold messages.
        let mut receive = self.transport.receive(RECEIVE_BATCH);

        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Shutdown requested, stopping listener");
                    break;
                }
                _ = ticker.tick() => {
                    self.flush(&mut report).await;
                    continue;
                }
                received = &mut receive => received,
            };

            match received {
                Ok(Some(batch)) => {
                    for notification in &batch {
                        self.dispatch(notification, &mut report).await;
                    }
                }
                Ok(None) => {
                    info!("Notification stream ended");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Failed to receive notifications");
                    tokio::time::sleep(RECEIVE_BACKOFF).await;
                }
            }
            receive = self.transport.receive(RECEIVE_BATCH);
        }

        self.flush(&mut report).await;
        self.sink.log_stats();
        info!(
            acked = report.acked,
            rejected = report.rejected,
            flushes = report.flushes,
            "Listener stopped"
        );
        Ok(report)
    }

    async fn dispatch(&self, notification: &ChangeNotification, report: &mut ListenReport) {
        match self.handle(notification).await {
            Ok(disposition) => {
                debug!(
                    message_id = %notification.message_id,
                    kind = %notification.kind,
                    ?disposition,
                    "Applied notification"
                );
                match self.transport.ack(notification).await {
                    Ok(()) => report.acked += 1,
                    Err(e) => warn!(message_id = %notification.message_id, error = %e, "Ack failed"),
                }
            }
            Err(e) => {
                error!(
                    message_id = %notification.message_id,
                    kind = %notification.kind,
                    category = ?classify_error(&e),
                    error = %e,
                    "Failed to apply notification\n---DATA---\n{}\n---DATA---",
                    notification.payload_lossy()
                );
                match self.transport.reject(notification).await {
                    Ok(()) => report.rejected += 1,
                    Err(e) => warn!(message_id = %notification.message_id, error = %e, "Reject failed"),
                }
            }
        }
    }

    async fn flush(&self, report: &mut ListenReport) {
        match self.sink.flush().await {
            Ok(()) => report.flushes += 1,
            Err(e) => error!(table = %self.sink.table(), error = %e, "Flush failed"),
        }
    }
}

fn decode(notification: &ChangeNotification) -> Result<Record> {
    let text = std::str::from_utf8(&notification.payload)
        .map_err(|e| DecodeError::Utf8(e.to_string()))?;
    let record: Record =
        serde_json::from_str(text).map_err(|e| DecodeError::Json(e.to_string()))?;
    Ok(record.with_derived_id())
}
