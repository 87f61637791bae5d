//! Notification transport implementations.
//!
//! - [`StdinTransport`]: reads JSON-line notifications from stdin
//! - [`SqsTransport`]: receives notifications from an AWS SQS queue

mod sqs;
mod stdin;

pub use sqs::{SqsTransport, SqsTransportConfig};
pub use stdin::StdinTransport;
