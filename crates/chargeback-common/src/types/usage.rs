//! Usage quantities and per-window usage snapshots
//!
//! Quantities are plain `f64`: distribution divides raw usage across charged
//! groups without rounding, and consumers compare against totals with a
//! floating-point tolerance.

use super::metric::MetricKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Per-metric usage quantities
///
/// Absent metrics read as zero. Backed by a `BTreeMap` so serialized output
/// has a stable key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageVector(BTreeMap<MetricKind, f64>);

impl UsageVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A vector with an explicit zero for every metric kind
    pub fn zeroed() -> Self {
        MetricKind::ALL.into_iter().map(|m| (m, 0.0)).collect()
    }

    /// Quantity for a metric, zero if absent
    pub fn get(&self, metric: MetricKind) -> f64 {
        self.0.get(&metric).copied().unwrap_or(0.0)
    }

    /// Set the quantity for a metric
    pub fn set(&mut self, metric: MetricKind, value: f64) {
        self.0.insert(metric, value);
    }

    /// Add to the quantity for a metric
    pub fn add(&mut self, metric: MetricKind, value: f64) {
        *self.0.entry(metric).or_insert(0.0) += value;
    }

    /// Add every metric of `other` into this vector
    pub fn merge(&mut self, other: &UsageVector) {
        for (metric, value) in &other.0 {
            self.add(*metric, *value);
        }
    }

    /// Iterate over (metric, quantity) pairs
    pub fn iter(&self) -> impl Iterator<Item = (MetricKind, f64)> + '_ {
        self.0.iter().map(|(m, v)| (*m, *v))
    }

    /// True when every stored quantity is zero
    pub fn is_zero(&self) -> bool {
        self.0.values().all(|v| *v == 0.0)
    }
}

impl FromIterator<(MetricKind, f64)> for UsageVector {
    fn from_iter<I: IntoIterator<Item = (MetricKind, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Materialized per-metric usage maps for one time window
///
/// `metric -> { entity_id -> quantity }`. A metric with no map (e.g. after
/// an upstream collection failure) reads as zero usage for every entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageSnapshot {
    maps: BTreeMap<MetricKind, HashMap<String, f64>>,
}

impl UsageSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a quantity for an entity; last write wins for duplicates
    /// (per-group queries can return the same entity more than once).
    pub fn record(&mut self, metric: MetricKind, entity_id: impl Into<String>, value: f64) {
        self.maps
            .entry(metric)
            .or_default()
            .insert(entity_id.into(), value);
    }

    /// Raw quantity for an entity, zero if unknown
    pub fn get(&self, metric: MetricKind, entity_id: &str) -> f64 {
        self.maps
            .get(&metric)
            .and_then(|m| m.get(entity_id))
            .copied()
            .unwrap_or(0.0)
    }

    /// Number of datapoints recorded for a metric
    pub fn len(&self, metric: MetricKind) -> usize {
        self.maps.get(&metric).map_or(0, |m| m.len())
    }

    pub fn is_empty(&self) -> bool {
        self.maps.values().all(|m| m.is_empty())
    }
}

/// A quantity paired with a display name
///
/// Unassigned entities may not exist in the topology store at all, so their
/// usage records carry the display name directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedQuantity {
    pub value: f64,
    pub name: String,
}

impl NamedQuantity {
    pub fn new(value: f64, name: impl Into<String>) -> Self {
        Self {
            value,
            name: name.into(),
        }
    }
}

/// Usage maps for entities that belong to no delivery group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnassignedUsageSnapshot {
    maps: BTreeMap<MetricKind, HashMap<String, NamedQuantity>>,
}

impl UnassignedUsageSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        metric: MetricKind,
        entity_id: impl Into<String>,
        quantity: NamedQuantity,
    ) {
        self.maps
            .entry(metric)
            .or_default()
            .insert(entity_id.into(), quantity);
    }

    /// Iterate `(metric, entity_id, quantity)` over all recorded datapoints
    pub fn iter(&self) -> impl Iterator<Item = (MetricKind, &str, &NamedQuantity)> + '_ {
        self.maps.iter().flat_map(|(metric, m)| {
            m.iter().map(move |(id, q)| (*metric, id.as_str(), q))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.maps.values().all(|m| m.is_empty())
    }
}
