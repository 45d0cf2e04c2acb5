//! Usage source abstraction
//!
//! Implementations wrap whatever upstream actually serves metered usage
//! (a telemetry API client in production, fixtures in tests). The collector
//! only depends on this trait.

use async_trait::async_trait;
use chargeback_common::{MetricKind, Result};
use serde::{Deserialize, Serialize};

/// Relative query window understood by the upstream API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: String,
    pub to: String,
}

impl Default for TimeWindow {
    /// The standard billing window: the last thirty days up to now
    fn default() -> Self {
        Self {
            from: "-30d".to_string(),
            to: "now".to_string(),
        }
    }
}

impl TimeWindow {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// One entity's metered quantity for a single metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsagePoint {
    pub entity_id: String,
    pub value: f64,
}

impl UsagePoint {
    pub fn new(entity_id: impl Into<String>, value: f64) -> Self {
        Self {
            entity_id: entity_id.into(),
            value,
        }
    }
}

/// A usage datapoint carrying the entity's display name.
///
/// Unassigned entities may be unknown to the topology store, so their
/// datapoints must be self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedUsagePoint {
    pub entity_id: String,
    pub name: String,
    pub value: f64,
}

impl NamedUsagePoint {
    pub fn new(entity_id: impl Into<String>, name: impl Into<String>, value: f64) -> Self {
        Self {
            entity_id: entity_id.into(),
            name: name.into(),
            value,
        }
    }
}

/// Upstream serving metered usage queries
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// Usage of one metric for entities tagged with the given delivery
    /// group, over the window
    async fn query_usage(
        &self,
        metric: MetricKind,
        group: &str,
        window: &TimeWindow,
    ) -> Result<Vec<UsagePoint>>;

    /// Usage of one metric for entities tagged with no delivery group at
    /// all, over the window
    async fn query_unassigned_usage(
        &self,
        metric: MetricKind,
        window: &TimeWindow,
    ) -> Result<Vec<NamedUsagePoint>>;
}
