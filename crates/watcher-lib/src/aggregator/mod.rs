//! Fan-out usage aggregation
//!
//! A snapshot is built from five independent provider queries (compute,
//! block storage, object storage, load balancers, public IPs). Each query
//! runs as its own task, so an error or a panic in one of them is confined
//! to that section of the snapshot. All five are joined before the snapshot
//! is classified.

mod queries;


pub use queries::{
    block_storage_usage, compute_usage, empty_block_storage, empty_compute, empty_load_balancer,
    empty_object_storage, is_amd_micro_shape, is_arm_shape, load_balancer_usage,
    object_storage_usage, public_ip_usage, summarize_instances,
};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tracing::debug;

use crate::classifier::{classify, UsageSummary};
use crate::limits::PUBLIC_IP_LIMIT;
use crate::models::{AllUsage, UsageMetric};
use crate::observability::{StructuredLogger, WatcherMetrics};
use crate::provider::{CloudProvider, ProviderConnector, ProviderError};

/// Errors that fail a whole usage collection
#[derive(Debug, Error)]
pub enum UsageError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// The independent queries making up a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Compute,
    BlockStorage,
    ObjectStorage,
    LoadBalancer,
    PublicIps,
}

impl Query {
    pub fn as_str(&self) -> &'static str {
        match self {
            Query::Compute => "compute",
            Query::BlockStorage => "block_storage",
            Query::ObjectStorage => "object_storage",
            Query::LoadBalancer => "load_balancer",
            Query::PublicIps => "public_ips",
        }
    }
}

/// Handle to a spawned query, aborting the task when dropped
///
/// Dropping a collection part-way (for example when the HTTP client goes
/// away) stops the remaining provider calls.
struct QueryTask<T>(JoinHandle<T>);

impl<T> Future for QueryTask<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<T> Drop for QueryTask<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A classified usage snapshot
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub usage: AllUsage,
    pub summary: UsageSummary,
}

/// Collects usage snapshots for one compartment
pub struct UsageAggregator {
    connector: Arc<dyn ProviderConnector>,
    compartment_id: Arc<str>,
    metrics: WatcherMetrics,
    logger: StructuredLogger,
}

impl UsageAggregator {
    pub fn new(
        connector: Arc<dyn ProviderConnector>,
        compartment_id: impl Into<Arc<str>>,
        metrics: WatcherMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            connector,
            compartment_id: compartment_id.into(),
            metrics,
            logger,
        }
    }

    pub fn compartment_id(&self) -> &str {
        &self.compartment_id
    }

    /// Run one query on its own task, timing it
    fn spawn<T, F, Fut>(
        &self,
        query: Query,
        provider: &Arc<dyn CloudProvider>,
        run: F,
    ) -> QueryTask<T>
    where
        F: FnOnce(Arc<dyn CloudProvider>, Arc<str>) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let task = run(provider.clone(), self.compartment_id.clone());
        let metrics = self.metrics.clone();

        QueryTask(tokio::spawn(async move {
            let started = Instant::now();
            let result = task.await;
            metrics.observe_query_latency(query.as_str(), started.elapsed().as_secs_f64());
            result
        }))
    }

    fn record_failure(&self, query: Query, error: &str) {
        self.metrics.inc_query_errors(query.as_str());
        self.logger.log_query_failure(query.as_str(), error);
    }

    /// Unwrap a joined task, substituting `fallback` if the task died
    fn joined<T>(
        &self,
        query: Query,
        result: Result<T, JoinError>,
        fallback: impl FnOnce(String) -> T,
    ) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                let message = if e.is_panic() {
                    format!("{} query panicked", query.as_str())
                } else {
                    format!("{} query was cancelled", query.as_str())
                };
                fallback(message)
            }
        }
    }

    /// Query every resource concurrently and join the results
    pub async fn collect(&self) -> Result<AllUsage, UsageError> {
        let started = Instant::now();
        let provider = self.connector.connect().await?;

        let compute = self.spawn(Query::Compute, &provider, |p, c| async move {
            compute_usage(&*p, &c).await
        });
        let block_storage = self.spawn(Query::BlockStorage, &provider, |p, c| async move {
            block_storage_usage(&*p, &c).await
        });
        let object_storage = self.spawn(Query::ObjectStorage, &provider, |p, c| async move {
            object_storage_usage(&*p, &c).await
        });
        let load_balancer = self.spawn(Query::LoadBalancer, &provider, |p, c| async move {
            load_balancer_usage(&*p, &c).await
        });
        let public_ips = self.spawn(Query::PublicIps, &provider, |p, c| async move {
            public_ip_usage(&*p, &c).await
        });

        let (compute, block_storage, object_storage, load_balancer, public_ips) = tokio::join!(
            compute,
            block_storage,
            object_storage,
            load_balancer,
            public_ips
        );

        let compute = self.joined(Query::Compute, compute, |error| {
            let mut usage = empty_compute();
            usage.error = Some(error);
            usage
        });
        let block_storage = self.joined(Query::BlockStorage, block_storage, |error| {
            let mut usage = empty_block_storage();
            usage.error = Some(error);
            usage
        });
        let object_storage = self.joined(Query::ObjectStorage, object_storage, |error| {
            let mut usage = empty_object_storage();
            usage.error = Some(error);
            usage
        });
        let load_balancer = self.joined(Query::LoadBalancer, load_balancer, |error| {
            let mut usage = empty_load_balancer();
            usage.error = Some(error);
            usage
        });
        let public_ips = self
            .joined(Query::PublicIps, public_ips.map(|r| r.map_err(|e| e.to_string())), Err)
            .unwrap_or_else(|error| {
                self.record_failure(Query::PublicIps, &error);
                UsageMetric::empty(PUBLIC_IP_LIMIT)
            });

        let sections = [
            (Query::Compute, compute.error.as_deref()),
            (Query::BlockStorage, block_storage.error.as_deref()),
            (Query::ObjectStorage, object_storage.error.as_deref()),
            (Query::LoadBalancer, load_balancer.error.as_deref()),
        ];
        for (query, error) in sections {
            if let Some(error) = error {
                self.record_failure(query, error);
            }
        }

        debug!(
            compartment = %self.compartment_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Usage collected"
        );

        Ok(AllUsage {
            compute,
            block_storage,
            public_ips,
            object_storage,
            load_balancer,
        })
    }

    /// Collect and classify a snapshot
    pub async fn snapshot(&self) -> Result<Snapshot, UsageError> {
        let usage = self.collect().await?;
        let summary = classify(&usage);

        self.metrics.record_snapshot(&usage);
        self.logger.log_snapshot(&summary);

        Ok(Snapshot { usage, summary })
    }
}
