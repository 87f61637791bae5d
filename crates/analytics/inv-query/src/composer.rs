//! Classification query composition
//!
//! Builds one `WITH ... SELECT` statement:
//!
//! ```sql
//! WITH
//! most_recent_moves AS (...),          -- latest move per resource
//! raw_access_records AS (...),         -- access log window [UNION ALL catch-up]
//! aggregated_access_records AS (...)   -- lastAccess, recent_access_count
//! SELECT ... FROM aggregated_access_records AS access_records
//! LEFT JOIN most_recent_moves ...
//! LEFT ANTI JOIN <excluded> ...
//! [WHERE <variant filter>]
//! ```

use inv_types::{InventoryConfig, RulesConfig, TableRef};
use std::fmt;

/// Rewrites `scheme://bucket/key` URLs to `projects/_/buckets/bucket/objects/key`.
/// Names already in resource-name shape do not match and pass through.
const URL_TO_RESOURCE_NAME: &str =
    r"'^[a-z0-9]+://([^/]+)/(.*)$', 'projects/_/buckets/\\1/objects/\\2'";

/// Which candidate set a query selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Every accessed object in the window
    Access,
    /// Objects accessed often enough recently
    Warmup,
    /// Objects not accessed for the cold threshold
    Cooldown,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Access => "access",
            Self::Warmup => "warmup",
            Self::Cooldown => "cooldown",
        };
        f.write_str(name)
    }
}

/// Tables the classification queries read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTables {
    pub access_log: TableRef,
    pub moved_objects: TableRef,
    pub excluded_objects: TableRef,
    /// Secondary access history merged into the window when present
    pub catch_up: Option<TableRef>,
}

impl QueryTables {
    pub fn from_config(config: &InventoryConfig) -> Self {
        Self {
            access_log: config.access_log_table().reference,
            moved_objects: config.moved_table().reference,
            excluded_objects: config.excluded_table().reference,
            catch_up: config.catchup_table().map(|t| t.reference),
        }
    }
}

/// Builds the access, warm-up and cool-down queries
///
/// Holds no state beyond its inputs; every call renders the same text for
/// the same configuration.
#[derive(Debug, Clone)]
pub struct QueryComposer {
    rules: RulesConfig,
    tables: QueryTables,
}

impl QueryComposer {
    pub fn new(rules: RulesConfig, tables: QueryTables) -> Self {
        Self { rules, tables }
    }

    pub fn from_config(config: &InventoryConfig) -> Self {
        Self::new(config.rules.clone(), QueryTables::from_config(config))
    }

    pub fn tables(&self) -> &QueryTables {
        &self.tables
    }

    /// Days of access history to scan
    pub fn day_partitions(&self) -> u32 {
        self.rules.cold_threshold_days + self.rules.days_between_runs
    }

    fn most_recent_moves(&self) -> String {
        let moved = self.tables.moved_objects.quoted();
        format!(
            "SELECT full_move_info.*\n\
             FROM {moved} AS full_move_info\n\
             INNER JOIN (\n\
             SELECT resourceName, max(moveTimestamp) AS latestMove\n\
             FROM {moved}\n\
             GROUP BY resourceName\n\
             ) AS most_recent\n\
             ON most_recent.resourceName = full_move_info.resourceName\n\
             AND most_recent.latestMove = full_move_info.moveTimestamp"
        )
    }

    fn raw_access_records(&self) -> String {
        let mut sql = format!(
            "SELECT replaceRegexpOne(resourceName, {URL_TO_RESOURCE_NAME}) AS resourceName, timestamp\n\
             FROM {}\n\
             WHERE toDate(timestamp) >= today() - {}",
            self.tables.access_log.quoted(),
            self.day_partitions()
        );

        if let Some(catch_up) = &self.tables.catch_up {
            sql.push_str(&format!(
                "\nUNION ALL\n\
                 SELECT replaceRegexpOne(url, {URL_TO_RESOURCE_NAME}) AS resourceName, created AS timestamp\n\
                 FROM {}",
                catch_up.quoted()
            ));
        }
        sql
    }

    fn aggregated_access_records(&self) -> String {
        format!(
            "SELECT resourceName,\n\
             max(timestamp) AS lastAccess,\n\
             countIf(dateDiff('day', timestamp, now()) <= {}) AS recent_access_count\n\
             FROM raw_access_records\n\
             GROUP BY resourceName",
            self.rules.warm_threshold_days
        )
    }

    fn compose(&self, filter: Option<String>) -> String {
        let mut sql = format!(
            "WITH\n\
             most_recent_moves AS (\n{}\n),\n\
             raw_access_records AS (\n{}\n),\n\
             aggregated_access_records AS (\n{}\n)\n\
             SELECT access_records.resourceName AS resourceName,\n\
             most_recent_moves.storageClass AS storageClass,\n\
             access_records.lastAccess AS lastAccess,\n\
             access_records.recent_access_count AS recent_access_count\n\
             FROM aggregated_access_records AS access_records\n\
             LEFT JOIN most_recent_moves\n\
             ON access_records.resourceName = most_recent_moves.resourceName\n\
             LEFT ANTI JOIN {} AS excluded\n\
             ON access_records.resourceName = excluded.resourceName",
            self.most_recent_moves(),
            self.raw_access_records(),
            self.aggregated_access_records(),
            self.tables.excluded_objects.quoted()
        );

        if let Some(filter) = filter {
            sql.push_str("\nWHERE ");
            sql.push_str(&filter);
        }
        sql
    }

    /// Last access and recent access count of every accessed object
    pub fn compose_access_query(&self) -> String {
        self.compose(None)
    }

    /// Objects with at least the warm threshold of recent accesses
    pub fn compose_warmup_query(&self) -> String {
        self.compose(Some(format!(
            "access_records.recent_access_count >= {}",
            self.rules.warm_threshold_accesses
        )))
    }

    /// Objects whose last access is at least the cold threshold ago
    pub fn compose_cooldown_query(&self) -> String {
        self.compose(Some(format!(
            "dateDiff('day', access_records.lastAccess, now()) >= {}",
            self.rules.cold_threshold_days
        )))
    }

    pub fn compose_kind(&self, kind: QueryKind) -> String {
        match kind {
            QueryKind::Access => self.compose_access_query(),
            QueryKind::Warmup => self.compose_warmup_query(),
            QueryKind::Cooldown => self.compose_cooldown_query(),
        }
    }
}
