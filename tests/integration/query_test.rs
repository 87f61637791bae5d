//! Classification queries built from configuration and run against a table client.

use crate::common::{memory_clients, test_config};
use inv_query::{QueryComposer, QueryKind};
use inv_table::MemoryTable;
use inv_types::{InventoryConfig, TableRef};
use std::sync::Arc;

#[test]
fn test_queries_follow_configured_tables() {
    let config = test_config();
    let sql = QueryComposer::from_config(&config).compose_kind(QueryKind::Access);

    assert!(sql.contains("`usage`.`data_access_logs`"));
    assert!(sql.contains("`usage`.`objects_moved`"));
    assert!(sql.contains("`usage`.`objects_excluded`"));
    assert!(!sql.contains("UNION ALL"));
}

#[test]
fn test_catch_up_table_adds_exactly_one_union() {
    let with = test_config().with_catchup_table("access_catchup");
    let without = test_config();

    for kind in [QueryKind::Access, QueryKind::Warmup, QueryKind::Cooldown] {
        let sql = QueryComposer::from_config(&with).compose_kind(kind);
        assert_eq!(sql.matches("UNION ALL").count(), 1, "{kind}");
        assert!(sql.contains("`usage`.`access_catchup`"));

        let sql = QueryComposer::from_config(&without).compose_kind(kind);
        assert_eq!(sql.matches("UNION ALL").count(), 0, "{kind}");
    }
}

#[test]
fn test_same_config_same_text() {
    let config: InventoryConfig = r#"
[rules]
cold_threshold_days = 90
warm_threshold_days = 14
warm_threshold_accesses = 10
days_between_runs = 7
"#
    .parse()
    .unwrap();

    let first = QueryComposer::from_config(&config).compose_warmup_query();
    let second = QueryComposer::from_config(&config).compose_warmup_query();
    assert_eq!(first, second);
    assert!(first.contains(">= 10"));
    assert!(first.contains("today() - 97"));
}

#[tokio::test]
async fn test_execute_into_destination() {
    let config = test_config();
    let memory = Arc::new(MemoryTable::new());
    let client = memory_clients(&memory).acquire().unwrap();
    let destination = TableRef::new("usage", "cooldown_candidates");

    let sql = QueryComposer::from_config(&config).compose_cooldown_query();
    client.create_table_if_absent(&config.moved_table()).await.unwrap();
    client.execute_query(&sql, Some(&destination)).await.unwrap();

    assert_eq!(memory.created(), vec![config.moved_table().reference]);
    assert_eq!(memory.queries(), vec![(sql, Some(destination))]);
}
