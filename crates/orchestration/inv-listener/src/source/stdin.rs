//! Stdin notification transport.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inv_error::{Result, TransportError};
use inv_traits::NotificationTransport;
use inv_types::{ChangeNotification, EventKind};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// One notification line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StdinEnvelope {
    event_type: String,

    /// Defaults to the time the line was read
    #[serde(default)]
    publish_time: Option<DateTime<Utc>>,

    data: serde_json::Value,
}

/// Transport that reads JSON-line notifications from stdin.
///
/// ```jsonl
/// {"eventType":"OBJECT_DELETE","publishTime":"2024-05-01T10:00:00Z","data":{"bucket":"b","name":"o"}}
/// ```
///
/// Empty and unparseable lines are skipped. EOF ends the stream. Ack and
/// reject only log, there is nothing to redeliver from.
pub struct StdinTransport {
    lines: Mutex<Lines<Box<dyn AsyncBufRead + Send + Unpin>>>,
    message_counter: AtomicU64,
}

impl StdinTransport {
    pub fn new() -> Self {
        Self::with_reader(Box::new(BufReader::new(tokio::io::stdin())))
    }

    /// Create a transport over a custom reader (for testing).
    pub fn with_reader(reader: Box<dyn AsyncBufRead + Send + Unpin>) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
            message_counter: AtomicU64::new(0),
        }
    }

    fn next_message_id(&self) -> String {
        let counter = self.message_counter.fetch_add(1, Ordering::Relaxed);
        format!("stdin-{}-{}", Uuid::new_v4(), counter)
    }

    fn parse_line(&self, line: &str) -> Option<ChangeNotification> {
        let envelope: StdinEnvelope = match serde_json::from_str(line) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Skipping unparseable stdin line: {}", line);
                return None;
            }
        };

        let payload = serde_json::to_vec(&envelope.data).ok()?;
        Some(ChangeNotification::new(
            self.next_message_id(),
            EventKind::from_attribute(&envelope.event_type),
            envelope.publish_time.unwrap_or_else(Utc::now),
            payload,
        ))
    }
}

impl Default for StdinTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationTransport for StdinTransport {
    async fn ensure_subscription(&self, topic: &str, subscription: &str) -> Result<()> {
        debug!(topic, subscription, "Reading notifications from stdin");
        Ok(())
    }

    /// Returns at most one notification per call so a slow producer never
    /// holds back lines that were already read.
    async fn receive(&self, _max: usize) -> Result<Option<Vec<ChangeNotification>>> {
        let mut lines = self.lines.lock().await;
        loop {
            let line = lines
                .next_line()
                .await
                .map_err(|e| TransportError::Receive(format!("Failed to read from stdin: {e}")))?;

            let Some(line) = line else {
                debug!("Stdin EOF reached");
                return Ok(None);
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            trace!("Read line from stdin: {}", line);

            if let Some(notification) = self.parse_line(line) {
                return Ok(Some(vec![notification]));
            }
        }
    }

    async fn ack(&self, notification: &ChangeNotification) -> Result<()> {
        trace!(message_id = %notification.message_id, "Acked");
        Ok(())
    }

    async fn reject(&self, notification: &ChangeNotification) -> Result<()> {
        warn!(message_id = %notification.message_id, "Rejected stdin notification; it will not be redelivered");
        Ok(())
    }
}
