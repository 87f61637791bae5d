//! Core types for the inventory loader.
//!
//! This crate provides the foundational types used throughout the system:
//! - [`Record`] - One inventoried object's metadata at a point in time
//! - [`ChangeNotification`] - An incremental change event from the notification transport
//! - [`TableDefinition`] - Declared destination tables and their fixed schemas
//! - [`InventoryConfig`] - Immutable configuration loaded once at startup

pub mod config;
pub mod notification;
pub mod record;
pub mod table;

pub use config::*;
pub use notification::*;
pub use record::*;
pub use table::*;
