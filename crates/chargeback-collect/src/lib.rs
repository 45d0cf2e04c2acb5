//! # Chargeback Collect
//!
//! Usage collection boundary for the chargeback pipeline. The engine
//! consumes fully materialized [`UsageSnapshot`]s; this crate produces them
//! by fanning per-metric, per-group queries out to a [`UsageSource`]
//! implementation over a bounded concurrent pool.
//!
//! A failed query is non-fatal: it is logged and contributes nothing, so
//! the affected metric reads as zero usage downstream.
//!
//! [`UsageSnapshot`]: chargeback_common::UsageSnapshot

pub mod collector;
pub mod source;

pub use collector::{CollectorConfig, UsageCollector};
pub use source::{NamedUsagePoint, TimeWindow, UsagePoint, UsageSource};

/// Default number of usage queries in flight at once
pub const DEFAULT_QUERY_CONCURRENCY: usize = 30;
