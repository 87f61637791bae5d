//! inv-listener - keeps the inventory table current from change notifications.
//!
//! - [`EventReconciler`]: applies each notification to the table, then acks or rejects it
//! - [`source::SqsTransport`]: notifications from an SQS queue
//! - [`source::StdinTransport`]: notifications as JSON lines on stdin (for local testing)

mod reconciler;
pub mod source;

pub use reconciler::{Disposition, EventReconciler, ListenReport};
pub use source::{SqsTransport, SqsTransportConfig, StdinTransport};
