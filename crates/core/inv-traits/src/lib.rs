//! Collaborator traits for the inventory loader.
//!
//! The pipeline core only talks to external services through these seams:
//! - [`ObjectLister`] - Enumerates buckets and pages through their objects
//! - [`TableClient`] - Creates, writes, updates and queries the analytical tables
//! - [`NotificationTransport`] - Delivers change notifications and takes ack/reject

pub mod lister;
pub mod table;
pub mod transport;

pub use lister::*;
pub use table::*;
pub use transport::*;
