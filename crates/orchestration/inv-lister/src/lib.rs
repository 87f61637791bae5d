//! inv-lister - bulk object listing for the inventory loader.
//!
//! Lists every object of a set of buckets and loads one record per object
//! into a destination table:
//!
//! - S3 listing with pagination, optional ACLs and LocalStack support
//! - Two-tier worker pools: a small bucket-level pool and a larger page-level pool
//! - One batched sink per bucket, flushed when the bucket is done
//!
//! # Example
//!
//! ```ignore
//! use inv_lister::{BulkLister, ListingOptions, TableSinkFactory};
//! use inv_lister::s3::{S3Config, S3Lister};
//!
//! let lister = S3Lister::from_config(&S3Config::from(&config.source)).await?;
//! let sinks = TableSinkFactory::new(config.inventory_table(), 100, clients);
//!
//! let bulk = BulkLister::new(Arc::new(lister), Arc::new(sinks), ListingOptions::from_config(&config));
//! let report = bulk.list(&[], None).await?;
//! eprintln!("Listed {} objects", report.total());
//! ```

mod convert;
mod lister;
mod report;
pub mod s3;
mod sink;

pub use convert::record_from_object;
pub use lister::{BulkLister, ListingOptions};
pub use report::ListingReport;
pub use sink::{SinkFactory, TableSinkFactory};
