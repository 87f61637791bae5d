//! Two-tier bulk listing pipeline.

use crate::convert::record_from_object;
use crate::report::ListingReport;
use crate::sink::SinkFactory;
use inv_error::{ListingError, Result, classify_error};
use inv_pool::WorkerPool;
use inv_sink::BatchedSink;
use inv_traits::{ObjectLister, ObjectPage, RawObject};
use inv_types::InventoryConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{error, info};

/// Pool sizing and listing behavior.
#[derive(Debug, Clone)]
pub struct ListingOptions {
    /// Total worker budget across both pool tiers
    pub workers: usize,

    /// Total queue budget across both pool tiers
    pub work_queue_size: usize,

    /// Pause between page submissions within a bucket
    pub page_dispatch_delay: Duration,

    /// Fetch access-control entries for every object
    pub with_acl: bool,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            workers: 8,
            work_queue_size: 1000,
            page_dispatch_delay: Duration::from_millis(20),
            with_acl: false,
        }
    }
}

impl ListingOptions {
    pub fn from_config(config: &InventoryConfig) -> Self {
        Self {
            workers: config.runtime.workers,
            work_queue_size: config.runtime.work_queue_size,
            page_dispatch_delay: Duration::from_millis(config.runtime.page_dispatch_delay_ms),
            with_acl: config.source.acls,
        }
    }

    /// Bucket-level fan-out is coarse, so at most two workers.
    fn bucket_workers(&self) -> usize {
        self.workers.clamp(1, 2)
    }

    fn bucket_queue(&self) -> usize {
        (self.work_queue_size / 4).max(1)
    }

    /// The rest of the worker budget, never fewer than two.
    fn page_workers(&self) -> usize {
        self.workers.saturating_sub(2).max(2)
    }

    fn page_queue(&self) -> usize {
        (self.work_queue_size * 3 / 4).max(1)
    }
}

/// State shared by every bucket task of one run.
struct ListingRun {
    lister: Arc<dyn ObjectLister>,
    sinks: Arc<dyn SinkFactory>,
    options: ListingOptions,
    prefix: Option<String>,
    report: Mutex<ListingReport>,
}

/// Lists buckets into per-bucket sinks.
///
/// A small outer pool runs one task per bucket so one large bucket cannot
/// hold up the others. Each bucket task paginates and hands every page to
/// its own inner pool, then flushes the bucket's sink once the inner pool
/// has drained.
pub struct BulkLister {
    lister: Arc<dyn ObjectLister>,
    sinks: Arc<dyn SinkFactory>,
    options: ListingOptions,
}

impl BulkLister {
    pub fn new(
        lister: Arc<dyn ObjectLister>,
        sinks: Arc<dyn SinkFactory>,
        options: ListingOptions,
    ) -> Self {
        Self {
            lister,
            sinks,
            options,
        }
    }

    /// List `buckets` (all buckets when empty), optionally limited to `prefix`.
    ///
    /// Explicitly named buckets must exist. Failures inside a bucket are
    /// logged and collected in the report; the other buckets keep going.
    pub async fn list(&self, buckets: &[String], prefix: Option<&str>) -> Result<ListingReport> {
        let buckets = self.resolve_buckets(buckets).await?;
        let total = buckets.len();

        let run = Arc::new(ListingRun {
            lister: self.lister.clone(),
            sinks: self.sinks.clone(),
            options: self.options.clone(),
            prefix: prefix.map(str::to_string),
            report: Mutex::new(ListingReport::default()),
        });

        let outer = WorkerPool::new(
            "buckets",
            self.options.bucket_workers(),
            self.options.bucket_queue(),
        );

        let mut submit_error = None;
        for (index, bucket) in buckets.into_iter().enumerate() {
            let run = run.clone();
            let submitted = outer
                .submit(async move { list_bucket(run, bucket, index + 1, total).await })
                .await;
            if let Err(e) = submitted {
                submit_error = Some(e);
                break;
            }
        }

        outer.shutdown().await;
        if let Some(e) = submit_error {
            return Err(e);
        }

        let report = run.report.lock().clone();
        info!(
            objects = report.total(),
            buckets = report.buckets.len(),
            failed_pages = report.failed_pages,
            errors = report.errors.len(),
            "Listing finished"
        );
        Ok(report)
    }

    async fn resolve_buckets(&self, buckets: &[String]) -> Result<Vec<String>> {
        if buckets.is_empty() {
            let all = self.lister.list_buckets().await?;
            info!(buckets = all.len(), "Listing all buckets");
            return Ok(all);
        }

        for bucket in buckets {
            if !self.lister.bucket_exists(bucket).await? {
                return Err(ListingError::BucketNotFound(bucket.clone()).into());
            }
        }
        Ok(buckets.to_vec())
    }
}

async fn list_bucket(run: Arc<ListingRun>, bucket: String, n: usize, total: usize) -> Result<()> {
    info!("Listing {bucket}. {n} of {total} total buckets");

    let sink = match run.sinks.create_sink(&bucket).await {
        Ok(sink) => sink,
        Err(e) => {
            error!(bucket = %bucket, error = %e, "Could not create sink");
            run.report
                .lock()
                .errors
                .push(format!("{bucket}: {e}"));
            return Err(e);
        }
    };

    let pages = WorkerPool::new(
        format!("pages-{bucket}"),
        run.options.page_workers(),
        run.options.page_queue(),
    );
    let listed = Arc::new(AtomicU64::new(0));

    let paginated = paginate(&run, &bucket, &sink, &pages, &listed).await;

    // Drain and flush whatever the pagination outcome.
    let stats = pages.shutdown().await;
    let flushed = sink.flush().await;
    sink.log_stats();

    let mut report = run.report.lock();
    report
        .buckets
        .insert(bucket.clone(), listed.load(Ordering::Relaxed));
    report.failed_pages += stats.unsuccessful();
    if let Err(e) = &paginated {
        error!(bucket = %bucket, category = ?classify_error(e), error = %e, "Listing stopped");
        report.errors.push(format!("{bucket}: {e}"));
    }
    if let Err(e) = &flushed {
        report.errors.push(format!("{bucket}: {e}"));
    }
    drop(report);

    paginated.and(flushed)
}

async fn paginate(
    run: &ListingRun,
    bucket: &str,
    sink: &Arc<BatchedSink>,
    pages: &WorkerPool,
    listed: &Arc<AtomicU64>,
) -> Result<()> {
    let delay = run.options.page_dispatch_delay;
    let mut token = None;

    loop {
        let ObjectPage {
            objects,
            next_token,
        } = run
            .lister
            .list_page(bucket, run.prefix.as_deref(), token)
            .await?;

        let lister = run.options.with_acl.then(|| run.lister.clone());
        let sink = sink.clone();
        let listed = listed.clone();
        pages
            .submit(async move { ingest_page(objects, lister.as_deref(), &sink, &listed).await })
            .await?;

        match next_token {
            Some(next) => {
                token = Some(next);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            None => return Ok(()),
        }
    }
}

/// Converts one page into records. With a `lister`, every object's ACL is
/// fetched first; any ACL failure fails this page before anything is put.
async fn ingest_page(
    mut objects: Vec<RawObject>,
    lister: Option<&dyn ObjectLister>,
    sink: &BatchedSink,
    listed: &AtomicU64,
) -> Result<()> {
    if let Some(lister) = lister {
        for object in &mut objects {
            object.acl = lister.object_acl(&object.bucket, &object.key).await?;
        }
    }

    for object in objects {
        sink.put(record_from_object(object)).await?;
        listed.fetch_add(1, Ordering::Relaxed);
    }
    Ok(())
}
