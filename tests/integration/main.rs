//! Integration tests for the inventory loader.
//!
//! The in-memory scenarios run everywhere. Tests that need LocalStack are
//! marked `#[ignore]`.
//!
//! ## Running LocalStack Tests
//!
//! 1. Start LocalStack:
//!    ```bash
//!    docker run -d -p 4566:4566 localstack/localstack
//!    ```
//!
//! 2. Run the ignored tests:
//!    ```bash
//!    LOCALSTACK_ENDPOINT=http://localhost:4566 cargo test -p integration-tests -- --ignored
//!    ```

mod common;
mod listen_test;
mod load_test;
mod localstack_test;
mod query_test;
