//! Change-notification transport trait.

use async_trait::async_trait;
use inv_error::Result;
use inv_types::ChangeNotification;

/// Trait for change-notification transports.
///
/// Delivery is at-least-once: a rejected notification is redelivered by the
/// transport, an acknowledged one is not.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Creates the subscription if absent, otherwise adopts the existing one.
    async fn ensure_subscription(&self, topic: &str, subscription: &str) -> Result<()>;

    /// Receives up to `max` notifications.
    ///
    /// Returns `Ok(None)` when the stream is exhausted (e.g., stdin EOF).
    /// Returns `Ok(Some(vec![]))` when nothing arrived within the wait time.
    async fn receive(&self, max: usize) -> Result<Option<Vec<ChangeNotification>>>;

    /// Acknowledges a successfully applied notification.
    ///
    /// For SQS: deletes the message
    /// For stdin: no-op
    async fn ack(&self, notification: &ChangeNotification) -> Result<()>;

    /// Rejects a notification so the transport redelivers it.
    ///
    /// For SQS: resets message visibility
    /// For stdin: logs the rejection
    async fn reject(&self, notification: &ChangeNotification) -> Result<()>;
}
