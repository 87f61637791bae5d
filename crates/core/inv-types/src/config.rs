//! Inventory configuration.
//!
//! Loaded once at startup from a TOML file and passed by reference into
//! every component. Values left at the `CONFIGURE_ME` placeholder are
//! rejected by [`InventoryConfig::require`] for the sections a command uses.

use crate::table::{TableDefinition, TableKind, TableRef};
use inv_error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Placeholder value shipped in the config template.
pub const NOT_CONFIGURED: &str = "CONFIGURE_ME";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub source: SourceConfig,
    pub table: TableConfig,
    pub runtime: RuntimeConfig,
    pub rules: RulesConfig,
    pub notifications: NotificationConfig,
}

/// Object store access.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Account or project label the buckets belong to
    pub project: Option<String>,

    /// Region of the object store
    pub region: Option<String>,

    /// Custom endpoint (for LocalStack)
    pub endpoint: Option<String>,

    /// Fetch access-control entries for every object
    pub acls: bool,
}

/// Destination table backend and table names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Backend HTTP URL
    pub url: String,

    /// Database (dataset) holding all tables
    pub dataset: String,

    pub username: Option<String>,

    pub password: Option<String>,

    pub inventory_table: String,

    pub moved_table: String,

    pub access_log_table: String,

    pub excluded_table: String,

    /// Historical access source stitched into the access window
    pub catchup_table: Option<String>,

    /// Rows per batched write
    pub batch_write_size: usize,

    /// Maximum number of pooled table clients
    pub client_pool_size: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".to_string(),
            dataset: "inventory".to_string(),
            username: None,
            password: None,
            inventory_table: "inventory".to_string(),
            moved_table: "objects_moved".to_string(),
            access_log_table: "data_access_logs".to_string(),
            excluded_table: "objects_excluded".to_string(),
            catchup_table: None,
            batch_write_size: 100,
            client_pool_size: 32,
        }
    }
}

/// Concurrency tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Total worker budget shared by the outer and inner pools
    pub workers: usize,

    /// Total queue capacity shared by the outer and inner pools
    pub work_queue_size: usize,

    /// Log level used when none is given on the command line
    pub log_level: Option<String>,

    /// Delay between page submissions within one bucket
    pub page_dispatch_delay_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            work_queue_size: 1000,
            log_level: None,
            page_dispatch_delay_ms: 20,
        }
    }
}

/// Access classification thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Days without access before an object is a cool-down candidate
    pub cold_threshold_days: u32,

    /// Window, in days, in which accesses count as recent
    pub warm_threshold_days: u32,

    /// Recent accesses needed to be a warm-up candidate
    pub warm_threshold_accesses: u32,

    /// Days between classification runs
    pub days_between_runs: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            cold_threshold_days: 30,
            warm_threshold_days: 7,
            warm_threshold_accesses: 3,
            days_between_runs: 1,
        }
    }
}

/// Change-notification subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub topic: String,

    pub subscription: String,

    /// Custom endpoint (for LocalStack)
    pub endpoint: Option<String>,

    /// Quiet period after which buffered rows are flushed
    pub idle_timeout_secs: u64,

    /// Long-poll wait per receive call
    pub wait_time_secs: i32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            topic: NOT_CONFIGURED.to_string(),
            subscription: NOT_CONFIGURED.to_string(),
            endpoint: None,
            idle_timeout_secs: 10,
            wait_time_secs: 20,
        }
    }
}

/// Configuration sections a command can depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Source,
    Table,
    Notifications,
}

impl InventoryConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: InventoryConfig =
            toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check numeric ranges. Always applied on load.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runtime.workers == 0 {
            return Err(ConfigError::Invalid("runtime.workers must be >= 1".into()));
        }
        if self.runtime.work_queue_size == 0 {
            return Err(ConfigError::Invalid(
                "runtime.work_queue_size must be >= 1".into(),
            ));
        }
        if self.table.batch_write_size == 0 {
            return Err(ConfigError::Invalid(
                "table.batch_write_size must be >= 1".into(),
            ));
        }
        if self.table.client_pool_size == 0 {
            return Err(ConfigError::Invalid(
                "table.client_pool_size must be >= 1".into(),
            ));
        }
        if self.notifications.idle_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "notifications.idle_timeout_secs must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Reject placeholder values in the given sections.
    pub fn require(&self, sections: &[ConfigSection]) -> Result<(), ConfigError> {
        for section in sections {
            let values: Vec<(&str, Option<&str>)> = match section {
                ConfigSection::Source => vec![
                    ("source.project", self.source.project.as_deref()),
                    ("source.region", self.source.region.as_deref()),
                    ("source.endpoint", self.source.endpoint.as_deref()),
                ],
                ConfigSection::Table => vec![
                    ("table.url", Some(self.table.url.as_str())),
                    ("table.dataset", Some(self.table.dataset.as_str())),
                    ("table.username", self.table.username.as_deref()),
                    ("table.password", self.table.password.as_deref()),
                    ("table.inventory_table", Some(self.table.inventory_table.as_str())),
                    ("table.moved_table", Some(self.table.moved_table.as_str())),
                    ("table.access_log_table", Some(self.table.access_log_table.as_str())),
                    ("table.excluded_table", Some(self.table.excluded_table.as_str())),
                    ("table.catchup_table", self.table.catchup_table.as_deref()),
                ],
                ConfigSection::Notifications => vec![
                    ("notifications.topic", Some(self.notifications.topic.as_str())),
                    (
                        "notifications.subscription",
                        Some(self.notifications.subscription.as_str()),
                    ),
                    ("notifications.endpoint", self.notifications.endpoint.as_deref()),
                ],
            };

            for (key, value) in values {
                if value == Some(NOT_CONFIGURED) {
                    return Err(ConfigError::NotConfigured {
                        key: key.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn table_ref(&self, table: &str) -> TableRef {
        TableRef::new(&self.table.dataset, table)
    }

    pub fn inventory_table(&self) -> TableDefinition {
        TableDefinition::new(TableKind::Inventory, self.table_ref(&self.table.inventory_table))
    }

    pub fn moved_table(&self) -> TableDefinition {
        TableDefinition::new(TableKind::ObjectsMoved, self.table_ref(&self.table.moved_table))
    }

    pub fn access_log_table(&self) -> TableDefinition {
        TableDefinition::new(
            TableKind::DataAccessLogs,
            self.table_ref(&self.table.access_log_table),
        )
    }

    pub fn excluded_table(&self) -> TableDefinition {
        TableDefinition::new(
            TableKind::ObjectsExcluded,
            self.table_ref(&self.table.excluded_table),
        )
    }

    pub fn catchup_table(&self) -> Option<TableDefinition> {
        self.table
            .catchup_table
            .as_deref()
            .map(|t| TableDefinition::new(TableKind::CatchUp, self.table_ref(t)))
    }

    /// Redacted view for echoing at startup.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.table.password.is_some() {
            copy.table.password = Some("********".to_string());
        }
        copy
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.table.dataset = dataset.into();
        self
    }

    pub fn with_batch_write_size(mut self, size: usize) -> Self {
        self.table.batch_write_size = size;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.runtime.workers = workers;
        self
    }

    pub fn with_work_queue_size(mut self, size: usize) -> Self {
        self.runtime.work_queue_size = size;
        self
    }

    pub fn with_page_dispatch_delay_ms(mut self, delay_ms: u64) -> Self {
        self.runtime.page_dispatch_delay_ms = delay_ms;
        self
    }

    pub fn with_catchup_table(mut self, table: impl Into<String>) -> Self {
        self.table.catchup_table = Some(table.into());
        self
    }

    pub fn with_acls(mut self, acls: bool) -> Self {
        self.source.acls = acls;
        self
    }
}

impl FromStr for InventoryConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        Self::parse(s)
    }
}
