//! SQS notification transport.

use async_trait::async_trait;
use aws_sdk_sqs::Client;
use aws_sdk_sqs::types::{MessageSystemAttributeName, QueueAttributeName};
use chrono::{DateTime, Utc};
use inv_error::{Result, TransportError};
use inv_traits::NotificationTransport;
use inv_types::{ChangeNotification, EventKind, NotificationConfig};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Message attribute carrying the event kind.
const EVENT_TYPE_ATTRIBUTE: &str = "eventType";

/// Visibility timeout of queues created by [`SqsTransport::ensure_subscription`].
const CREATED_QUEUE_VISIBILITY_SECS: &str = "60";

/// Configuration for the SQS transport.
#[derive(Debug, Clone)]
pub struct SqsTransportConfig {
    /// Long-polling wait time in seconds (1-20)
    pub wait_time_seconds: i32,

    /// Maximum number of messages to receive per call (1-10)
    pub max_batch_size: i32,
}

impl Default for SqsTransportConfig {
    fn default() -> Self {
        Self {
            wait_time_seconds: 20,
            max_batch_size: 10,
        }
    }
}

impl SqsTransportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the long-polling wait time.
    pub fn with_wait_time(mut self, seconds: i32) -> Self {
        self.wait_time_seconds = seconds.clamp(1, 20);
        self
    }

    /// Set the maximum batch size.
    pub fn with_max_batch_size(mut self, size: i32) -> Self {
        self.max_batch_size = size.clamp(1, 10);
        self
    }
}

impl From<&NotificationConfig> for SqsTransportConfig {
    fn from(config: &NotificationConfig) -> Self {
        Self::new().with_wait_time(config.wait_time_secs)
    }
}

/// Transport over one SQS queue, the queue standing in for the subscription.
///
/// Ack deletes the message. Reject resets its visibility so SQS redelivers it.
pub struct SqsTransport {
    client: Client,
    config: SqsTransportConfig,
    queue_url: OnceLock<String>,
}

impl SqsTransport {
    pub fn new(client: Client, config: SqsTransportConfig) -> Self {
        Self {
            client,
            config,
            queue_url: OnceLock::new(),
        }
    }

    /// Create a transport with default AWS configuration.
    pub async fn from_config(config: SqsTransportConfig) -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&aws_config), config)
    }

    /// Create a transport with a custom endpoint (for LocalStack).
    pub async fn from_config_with_endpoint(
        config: SqsTransportConfig,
        endpoint_url: &str,
        region: &str,
    ) -> Self {
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_sqs::config::Region::new(region.to_string()))
            .endpoint_url(endpoint_url)
            .load()
            .await;
        Self::new(Client::new(&aws_config), config)
    }

    /// Queue URL resolved by `ensure_subscription`, if it has run.
    pub fn queue_url(&self) -> Option<&str> {
        self.queue_url.get().map(String::as_str)
    }

    fn require_queue_url(&self) -> std::result::Result<&str, TransportError> {
        self.queue_url()
            .ok_or_else(|| TransportError::Subscription("subscription not set up".into()))
    }
}

#[async_trait]
impl NotificationTransport for SqsTransport {
    async fn ensure_subscription(&self, topic: &str, subscription: &str) -> Result<()> {
        let url = match self.client.get_queue_url().queue_name(subscription).send().await {
            Ok(resp) => {
                info!(topic, subscription, "Adopted existing queue");
                resp.queue_url
            }
            Err(e) => {
                debug!(subscription, error = %e, "Queue lookup failed, creating it");
                let resp = self
                    .client
                    .create_queue()
                    .queue_name(subscription)
                    .attributes(QueueAttributeName::VisibilityTimeout, CREATED_QUEUE_VISIBILITY_SECS)
                    .send()
                    .await
                    .map_err(|e| {
                        TransportError::Subscription(format!("Failed to create queue {subscription}: {e}"))
                    })?;
                info!(topic, subscription, "Created queue");
                resp.queue_url
            }
        };

        let url = url.ok_or_else(|| {
            TransportError::Subscription(format!("No URL returned for queue {subscription}"))
        })?;
        // A second call keeps the first URL.
        let _ = self.queue_url.set(url);
        Ok(())
    }

    async fn receive(&self, max: usize) -> Result<Option<Vec<ChangeNotification>>> {
        let queue_url = self.require_queue_url()?;
        let batch_size = (max.max(1) as i32).min(self.config.max_batch_size);

        let response = self
            .client
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(batch_size)
            .wait_time_seconds(self.config.wait_time_seconds)
            .message_attribute_names(EVENT_TYPE_ATTRIBUTE)
            .message_system_attribute_names(MessageSystemAttributeName::SentTimestamp)
            .send()
            .await
            .map_err(|e| TransportError::Receive(format!("SQS receive failed: {e}")))?;

        let messages = response.messages.unwrap_or_default();
        debug!("Received {} messages from SQS", messages.len());

        let notifications = messages
            .into_iter()
            .map(|msg| {
                let kind = msg
                    .message_attributes
                    .as_ref()
                    .and_then(|attrs| attrs.get(EVENT_TYPE_ATTRIBUTE))
                    .and_then(|value| value.string_value.as_deref())
                    .map(EventKind::from_attribute)
                    .unwrap_or_else(|| EventKind::Other(String::new()));

                let publish_time = msg
                    .attributes
                    .as_ref()
                    .and_then(|attrs| attrs.get(&MessageSystemAttributeName::SentTimestamp))
                    .and_then(|v| v.parse::<i64>().ok())
                    .and_then(DateTime::from_timestamp_millis)
                    .unwrap_or_else(Utc::now);

                let receipt_handle = msg.receipt_handle.unwrap_or_default();
                let message_id = msg.message_id.unwrap_or_else(|| receipt_handle.clone());

                ChangeNotification::new(
                    message_id,
                    kind,
                    publish_time,
                    msg.body.unwrap_or_default().into_bytes(),
                )
                .with_ack_id(receipt_handle)
            })
            .collect();

        Ok(Some(notifications))
    }

    async fn ack(&self, notification: &ChangeNotification) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(self.require_queue_url()?)
            .receipt_handle(&notification.ack_id)
            .send()
            .await
            .map_err(|e| TransportError::Ack(format!("SQS delete failed: {e}")))?;
        Ok(())
    }

    async fn reject(&self, notification: &ChangeNotification) -> Result<()> {
        self.client
            .change_message_visibility()
            .queue_url(self.require_queue_url()?)
            .receipt_handle(&notification.ack_id)
            .visibility_timeout(0)
            .send()
            .await
            .map_err(|e| TransportError::Reject(format!("Failed to change visibility: {e}")))?;

        debug!(message_id = %notification.message_id, "Returned message to queue");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SqsTransportConfig::new();
        assert_eq!(config.wait_time_seconds, 20);
        assert_eq!(config.max_batch_size, 10);
    }

    #[test]
    fn test_config_clamps() {
        let config = SqsTransportConfig::new()
            .with_wait_time(100)
            .with_max_batch_size(50);
        assert_eq!(config.wait_time_seconds, 20);
        assert_eq!(config.max_batch_size, 10);

        let config = SqsTransportConfig::new().with_wait_time(0);
        assert_eq!(config.wait_time_seconds, 1);
    }

    #[test]
    fn test_config_from_notifications() {
        let notifications = NotificationConfig {
            wait_time_secs: 5,
            ..NotificationConfig::default()
        };
        assert_eq!(SqsTransportConfig::from(&notifications).wait_time_seconds, 5);
    }

    #[tokio::test]
    async fn test_receive_requires_subscription() {
        let conf = aws_sdk_sqs::Config::builder()
            .behavior_version(aws_config::BehaviorVersion::latest())
            .build();
        let transport = SqsTransport::new(Client::from_conf(conf), SqsTransportConfig::new());

        assert!(transport.queue_url().is_none());
        assert!(transport.receive(1).await.is_err());
    }
}
