//! Error types and classification for the inventory loader.
//!
//! This crate provides:
//! - [`InventoryError`] - Top-level error enum for every pipeline stage
//! - Domain-specific errors ([`ListingError`], [`TableError`], [`TransportError`],
//!   [`DecodeError`], [`ConfigError`])
//! - [`ErrorCategory`] for deciding whether a failure is surfaced, rejected or ignored

use thiserror::Error;

/// Top-level error type for the inventory loader.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Object listing errors (bucket enumeration, page fetch)
    #[error("Listing error: {0}")]
    Listing(#[from] ListingError),

    /// Analytical table errors (create, insert, update, query)
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Change-notification transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Notification payload decoding errors
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Work submitted to a pool that has already shut down
    #[error("Worker pool '{0}' is closed")]
    PoolClosed(String),

    /// A pooled task panicked
    #[error("Task panicked: {0}")]
    TaskPanicked(String),

    /// Generic errors (wrapped anyhow)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Listing-related errors.
#[derive(Error, Debug)]
pub enum ListingError {
    /// Explicitly requested bucket does not exist or is not visible
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// Failed to enumerate buckets
    #[error("List buckets failed: {0}")]
    ListBuckets(String),

    /// Failed to fetch one page of objects
    #[error("List page failed for bucket {bucket}: {message}")]
    ListPage { bucket: String, message: String },

    /// Failed to fetch access-control entries for an object
    #[error("ACL fetch failed for {bucket}/{key}: {message}")]
    Acl {
        bucket: String,
        key: String,
        message: String,
    },
}

/// Table-related errors.
#[derive(Error, Debug)]
pub enum TableError {
    /// Failed to reach the table backend
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The write carried no rows. Raised when a flush races another flush.
    #[error("No rows present in the request")]
    EmptyWrite,

    /// Batch insert failed as a whole
    #[error("Insert into {table} failed: {message}")]
    Insert { table: String, message: String },

    /// Point update failed
    #[error("Update of {id} in {table} failed: {message}")]
    Update {
        table: String,
        id: String,
        message: String,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    Query(String),

    /// Table creation failed
    #[error("Create table {table} failed: {message}")]
    Create { table: String, message: String },

    /// Table has no declared schema and cannot be created or written
    #[error("No schema provided for table {0}; writing is not supported")]
    MissingSchema(String),
}

/// Change-notification transport errors.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to create or adopt the subscription
    #[error("Subscription setup failed: {0}")]
    Subscription(String),

    /// Failed to receive notifications
    #[error("Receive failed: {0}")]
    Receive(String),

    /// Failed to acknowledge a notification
    #[error("Ack failed: {0}")]
    Ack(String),

    /// Failed to reject a notification
    #[error("Reject failed: {0}")]
    Reject(String),
}

/// Notification payload decoding errors.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Payload is not valid UTF-8
    #[error("Payload is not valid UTF-8: {0}")]
    Utf8(String),

    /// Payload is not a valid object document
    #[error("Invalid JSON payload: {0}")]
    Json(String),

    /// A required attribute or field is missing
    #[error("Missing field: {0}")]
    MissingField(String),
}

/// Configuration errors.
///
/// All of these are fatal and raised at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file {path}: {message}")]
    Io { path: String, message: String },

    /// Failed to parse the configuration file
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// A value still carries the placeholder sentinel
    #[error("{key} is not configured; set it in the config file")]
    NotConfigured { key: String },

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Error classification for failure handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transient error - surfaced to the caller, may succeed on redelivery
    ///
    /// Examples: page fetch timeout, insert rejected by an overloaded backend
    Transient,

    /// Permanent error - will not succeed on redelivery
    ///
    /// Examples: malformed payload, missing schema, bad configuration
    Permanent,

    /// Benign error - not a real failure, suppressed
    ///
    /// Example: an empty write caused by two racing flushes
    Benign,
}

/// Classifies an error to decide how the pipeline reacts to it.
pub fn classify_error(error: &InventoryError) -> ErrorCategory {
    match error {
        InventoryError::Listing(e) => classify_listing_error(e),
        InventoryError::Table(e) => classify_table_error(e),
        InventoryError::Transport(_) => ErrorCategory::Transient,
        InventoryError::Decode(_) => ErrorCategory::Permanent,
        InventoryError::Config(_) => ErrorCategory::Permanent,
        InventoryError::PoolClosed(_) => ErrorCategory::Permanent,
        InventoryError::TaskPanicked(_) => ErrorCategory::Permanent,
        InventoryError::Other(_) => ErrorCategory::Transient,
    }
}

fn classify_listing_error(error: &ListingError) -> ErrorCategory {
    match error {
        ListingError::BucketNotFound(_) => ErrorCategory::Permanent,
        ListingError::ListBuckets(_) => ErrorCategory::Transient,
        ListingError::ListPage { .. } => ErrorCategory::Transient,
        ListingError::Acl { .. } => ErrorCategory::Transient,
    }
}

fn classify_table_error(error: &TableError) -> ErrorCategory {
    match error {
        TableError::EmptyWrite => ErrorCategory::Benign,
        TableError::MissingSchema(_) => ErrorCategory::Permanent,
        TableError::Connection(_)
        | TableError::Insert { .. }
        | TableError::Update { .. }
        | TableError::Query(_)
        | TableError::Create { .. } => ErrorCategory::Transient,
    }
}

/// Result type alias using InventoryError.
pub type Result<T> = std::result::Result<T, InventoryError>;
