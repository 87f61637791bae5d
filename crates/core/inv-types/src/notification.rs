//! Change notifications received from the notification transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of change a notification describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Object created or overwritten
    Finalize,
    /// Object deleted
    Delete,
    /// Object metadata changed
    MetadataUpdate,
    /// Live version became noncurrent
    Archive,
    /// Any other event type
    Other(String),
}

impl EventKind {
    /// Parse the transport's `eventType` attribute.
    pub fn from_attribute(value: &str) -> Self {
        match value {
            "OBJECT_FINALIZE" => Self::Finalize,
            "OBJECT_DELETE" => Self::Delete,
            "OBJECT_METADATA_UPDATE" => Self::MetadataUpdate,
            "OBJECT_ARCHIVE" => Self::Archive,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Finalize => "OBJECT_FINALIZE",
            Self::Delete => "OBJECT_DELETE",
            Self::MetadataUpdate => "OBJECT_METADATA_UPDATE",
            Self::Archive => "OBJECT_ARCHIVE",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One change notification, alive from receipt until ack or reject.
///
/// The payload is kept as raw bytes; decoding happens in the reconciler so
/// that a malformed payload only affects this notification.
#[derive(Debug, Clone)]
pub struct ChangeNotification {
    /// Transport message id
    pub message_id: String,

    /// Handle used to ack or reject (receipt handle for SQS)
    pub ack_id: String,

    /// Event kind from the `eventType` attribute
    pub kind: EventKind,

    /// Transport-assigned publish time
    pub publish_time: DateTime<Utc>,

    /// UTF-8 JSON object document
    pub payload: Vec<u8>,
}

impl ChangeNotification {
    pub fn new(
        message_id: impl Into<String>,
        kind: EventKind,
        publish_time: DateTime<Utc>,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        let message_id = message_id.into();
        Self {
            ack_id: message_id.clone(),
            message_id,
            kind,
            publish_time,
            payload: payload.into(),
        }
    }

    /// Set a transport ack handle distinct from the message id.
    pub fn with_ack_id(mut self, ack_id: impl Into<String>) -> Self {
        self.ack_id = ack_id.into();
        self
    }

    /// Payload as text, lossy, for logging.
    pub fn payload_lossy(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}
