//! Common utilities for integration tests.
//!
//! In-memory collaborators for the end-to-end scenarios, and a LocalStack
//! context for the tests that talk to real S3 and SQS APIs.

pub mod fakes;
pub mod localstack;

pub use fakes::{FakeLister, FakeTransport, SharedBuffer, memory_clients, notification, published, test_config};
pub use localstack::LocalStackTestContext;
