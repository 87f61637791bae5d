//! S3 client and listing.
//!
//! - Client configuration with LocalStack support
//! - Page-at-a-time object listing with optional ACL projection

mod client;
mod lister;

pub use client::{S3Config, create_s3_client};
pub use lister::S3Lister;
