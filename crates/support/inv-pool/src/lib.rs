//! Pools shared by the ingestion pipeline.
//!
//! - [`ResourcePool`] - Lazily built, round-robin cache of expensive client handles
//! - [`WorkerPool`] - Fixed set of workers draining a capacity-limited FIFO queue;
//!   submission waits while the queue is full

mod resource;
mod worker;

pub use resource::ResourcePool;
pub use worker::{PoolStats, WorkerPool};
