//! Oracle Cloud free tier usage watcher
//!
//! This crate provides the core functionality for:
//! - Querying tenancy resources through a signed OCI REST binding
//! - Aggregating them into usage snapshots against the always-free limits
//! - Classifying snapshots into severity levels
//! - Serving usage reports over HTTP, with Prometheus metrics

pub mod aggregator;
pub mod api;
pub mod classifier;
pub mod limits;
pub mod models;
pub mod observability;
pub mod provider;

pub use aggregator::{Snapshot, UsageAggregator, UsageError};
pub use classifier::{classify, Severity, UsageSummary};
pub use limits::{FreeTierLimits, FREE_TIER_LIMITS};
pub use models::*;
pub use observability::{StructuredLogger, WatcherMetrics};
