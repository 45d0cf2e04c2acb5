//! # Chargeback Common
//!
//! Shared data model and errors for the DPS chargeback engine.
//!
//! ## Core Types
//!
//! - [`MetricKind`]: the seven metered monitoring consumption kinds
//! - [`EntityKind`]: monitored resource kinds (hosts, applications, synthetics)
//! - [`TopologySnapshot`]: materialized delivery-group / information-system
//!   topology with resource memberships
//! - [`UsageSnapshot`] / [`UnassignedUsageSnapshot`]: per-metric usage maps
//!   for a fixed time window
//! - [`UsageVector`]: per-metric quantities attached to entries and totals

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ChargebackError, CollectionError, Result};
pub use types::{
    metric::{EntityKind, MetricKind, MonitoringTier},
    topology::{
        Application, DeliveryGroup, Host, InfoSystem, SubgroupRef, SyntheticCheck,
        TopologySnapshot,
    },
    usage::{NamedQuantity, UnassignedUsageSnapshot, UsageSnapshot, UsageVector},
};

/// Chargeback version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
