//! Main execution logic for the inventory CLI.

use anyhow::{Context, Result};
use inv_lister::s3::{S3Config, S3Lister};
use inv_lister::{BulkLister, ListingOptions, ListingReport, TableSinkFactory};
use inv_listener::{EventReconciler, ListenReport, SqsTransport, SqsTransportConfig, StdinTransport};
use inv_pool::ResourcePool;
use inv_query::{QueryComposer, QueryKind};
use inv_sink::{BatchedSink, TableClientPool};
use inv_table::{ClickHouseConfig, ClickHouseTable, StdoutTable};
use inv_traits::{NotificationTransport, TableClient};
use inv_types::{ConfigSection, InventoryConfig, TableRef};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::args::{Command, InputType, ListArgs, ListenArgs, QueryArgs};

/// Region used for the notification endpoint when the config names none.
const DEFAULT_REGION: &str = "us-east-1";

/// What a command did, for the summary printed on exit.
#[derive(Debug)]
pub enum Outcome {
    Load(ListingReport),
    Cat(ListingReport),
    Listen(ListenReport),
    Query { kind: QueryKind, executed: Option<TableRef> },
}

impl Outcome {
    /// Listing runs with failed pages or buckets are partial failures.
    /// Rejected notifications are not; the transport redelivers them.
    pub fn is_partial_failure(&self) -> bool {
        match self {
            Outcome::Load(report) | Outcome::Cat(report) => !report.is_complete(),
            Outcome::Listen(_) | Outcome::Query { .. } => false,
        }
    }
}

/// Config sections the command cannot run without.
pub fn required_sections(command: &Command) -> Vec<ConfigSection> {
    match command {
        Command::Load(_) => vec![ConfigSection::Source, ConfigSection::Table],
        Command::Cat(_) => vec![ConfigSection::Source],
        Command::Listen(args) if args.input == InputType::Sqs => {
            vec![ConfigSection::Table, ConfigSection::Notifications]
        }
        // Stdin ignores the topic and subscription.
        Command::Listen(_) => vec![ConfigSection::Table],
        Command::Query(args) if args.execute => vec![ConfigSection::Table],
        Command::Query(_) => vec![],
    }
}

/// Execute one subcommand against the loaded configuration.
pub async fn execute(command: Command, config: &InventoryConfig) -> Result<Outcome> {
    match command {
        Command::Load(args) => {
            let clients = clickhouse_pool(config)?;
            load(args, config, clients).await.map(Outcome::Load)
        }
        Command::Cat(args) => {
            // A single handle keeps JSON lines from interleaving.
            let clients: TableClientPool = ResourcePool::new("stdout", 1, || {
                Ok(Arc::new(StdoutTable::new()) as Arc<dyn TableClient>)
            })?;
            load(args, config, Arc::new(clients)).await.map(Outcome::Cat)
        }
        Command::Listen(args) => listen(args, config).await.map(Outcome::Listen),
        Command::Query(args) => query(args, config).await,
    }
}

fn clickhouse_pool(config: &InventoryConfig) -> Result<Arc<TableClientPool>> {
    let clickhouse = ClickHouseConfig::from(&config.table);
    let pool: TableClientPool =
        ResourcePool::new("clickhouse", config.table.client_pool_size, move || {
            Ok(Arc::new(ClickHouseTable::new(&clickhouse)) as Arc<dyn TableClient>)
        })?;
    Ok(Arc::new(pool))
}

async fn load(
    args: ListArgs,
    config: &InventoryConfig,
    clients: Arc<TableClientPool>,
) -> Result<ListingReport> {
    let lister = S3Lister::from_config(&S3Config::from(&config.source))
        .await
        .context("Failed to create object store client")?;
    let sinks = TableSinkFactory::new(
        config.inventory_table(),
        config.table.batch_write_size,
        clients,
    );

    let bulk = BulkLister::new(
        Arc::new(lister),
        Arc::new(sinks),
        ListingOptions::from_config(config),
    );
    let report = bulk.list(&args.buckets, args.prefix.as_deref()).await?;
    Ok(report)
}

async fn listen(args: ListenArgs, config: &InventoryConfig) -> Result<ListenReport> {
    let notifications = &config.notifications;
    let transport: Arc<dyn NotificationTransport> = match args.input {
        InputType::Stdin => Arc::new(StdinTransport::new()),
        InputType::Sqs => {
            let sqs_config = SqsTransportConfig::from(notifications);
            let transport = match &notifications.endpoint {
                Some(endpoint) => {
                    let region = config.source.region.as_deref().unwrap_or(DEFAULT_REGION);
                    SqsTransport::from_config_with_endpoint(sqs_config, endpoint, region).await
                }
                None => SqsTransport::from_config(sqs_config).await,
            };
            Arc::new(transport)
        }
    };

    let clients = clickhouse_pool(config)?;
    let sink = Arc::new(BatchedSink::new(
        config.inventory_table(),
        config.table.batch_write_size,
        clients.clone(),
    ));
    let reconciler = EventReconciler::new(
        transport,
        sink,
        clients,
        Duration::from_secs(notifications.idle_timeout_secs),
    );
    reconciler
        .start(&notifications.topic, &notifications.subscription)
        .await
        .context("Failed to start listening")?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupt received"),
            Err(e) => warn!(error = %e, "Cannot listen for interrupts"),
        }
        on_signal.cancel();
    });

    Ok(reconciler.run(cancel).await?)
}

async fn query(args: QueryArgs, config: &InventoryConfig) -> Result<Outcome> {
    let kind = QueryKind::from(args.kind);
    let sql = QueryComposer::from_config(config).compose_kind(kind);

    let destination = match args.destination.filter(|_| args.execute) {
        Some(table) => TableRef::new(&config.table.dataset, table),
        None => {
            println!("{sql}");
            return Ok(Outcome::Query {
                kind,
                executed: None,
            });
        }
    };

    let client = clickhouse_pool(config)?.acquire()?;
    // The query joins against the moved-objects table, which may not exist yet.
    client.create_table_if_absent(&config.moved_table()).await?;
    info!(query = %kind, destination = %destination, "Running query");
    client.execute_query(&sql, Some(&destination)).await?;

    Ok(Outcome::Query {
        kind,
        executed: Some(destination),
    })
}
