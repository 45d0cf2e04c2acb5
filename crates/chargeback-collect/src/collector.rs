//! Concurrent usage collection
//!
//! Fans one query per (metric, group) pair out to the source with bounded
//! concurrency and folds the results into snapshots the engine can consume.
//! Result order is irrelevant: snapshots key by metric and entity identity.

use crate::source::{TimeWindow, UsageSource};
use crate::DEFAULT_QUERY_CONCURRENCY;
use chargeback_common::{
    EntityKind, MetricKind, NamedQuantity, UnassignedUsageSnapshot, UsageSnapshot,
};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

/// Collection tuning for one report run
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Maximum queries in flight at once
    pub max_concurrent_queries: usize,
    /// Query window passed to every usage query
    pub window: TimeWindow,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_queries: DEFAULT_QUERY_CONCURRENCY,
            window: TimeWindow::default(),
        }
    }
}

impl CollectorConfig {
    pub fn with_max_concurrent_queries(mut self, max: usize) -> Self {
        self.max_concurrent_queries = max.max(1);
        self
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }
}

/// Collects metered usage from a [`UsageSource`] into snapshots
pub struct UsageCollector<S: UsageSource> {
    source: S,
    config: CollectorConfig,
}

impl<S: UsageSource> UsageCollector<S> {
    pub fn new(source: S, config: CollectorConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Collect usage for every (metric, group) combination.
    ///
    /// Only metrics billed against one of `entity_kinds` are queried. A
    /// failed query logs a warning and contributes nothing; the metric then
    /// reads as zero usage for the affected group's entities.
    pub async fn collect(&self, groups: &[String], entity_kinds: &[EntityKind]) -> UsageSnapshot {
        let metrics = selected_metrics(entity_kinds);
        let tasks: Vec<(MetricKind, String)> = metrics
            .iter()
            .flat_map(|m| groups.iter().map(move |g| (*m, g.clone())))
            .collect();
        info!(
            queries = tasks.len(),
            concurrency = self.config.max_concurrent_queries,
            "Collecting usage"
        );

        let results = stream::iter(tasks)
            .map(|(metric, group)| {
                let window = &self.config.window;
                let source = &self.source;
                async move {
                    let result = source.query_usage(metric, &group, window).await;
                    (metric, group, result)
                }
            })
            .buffer_unordered(self.config.max_concurrent_queries)
            .collect::<Vec<_>>()
            .await;

        let mut snapshot = UsageSnapshot::new();
        for (metric, group, result) in results {
            match result {
                Ok(points) => {
                    debug!(%metric, %group, points = points.len(), "Usage query completed");
                    for p in points {
                        snapshot.record(metric, p.entity_id, p.value);
                    }
                }
                Err(err) => {
                    warn!(%metric, %group, error = %err, "Usage query failed - Continuing without its data");
                }
            }
        }
        snapshot
    }

    /// Collect usage for entities with no delivery-group membership, one
    /// query per selected metric. Failures degrade the same way as in
    /// [`collect`](Self::collect).
    pub async fn collect_unassigned(
        &self,
        entity_kinds: &[EntityKind],
    ) -> UnassignedUsageSnapshot {
        let metrics = selected_metrics(entity_kinds);
        info!(queries = metrics.len(), "Collecting unassigned usage");

        let results = stream::iter(metrics)
            .map(|metric| {
                let window = &self.config.window;
                let source = &self.source;
                async move {
                    let result = source.query_unassigned_usage(metric, window).await;
                    (metric, result)
                }
            })
            .buffer_unordered(self.config.max_concurrent_queries)
            .collect::<Vec<_>>()
            .await;

        let mut snapshot = UnassignedUsageSnapshot::new();
        for (metric, result) in results {
            match result {
                Ok(points) => {
                    for p in points {
                        snapshot.record(metric, p.entity_id, NamedQuantity::new(p.value, p.name));
                    }
                }
                Err(err) => {
                    warn!(%metric, error = %err, "Unassigned usage query failed - Continuing without its data");
                }
            }
        }
        snapshot
    }
}

/// Metric kinds billed against any of the selected resource kinds, in
/// report column order
fn selected_metrics(entity_kinds: &[EntityKind]) -> Vec<MetricKind> {
    MetricKind::ALL
        .into_iter()
        .filter(|m| entity_kinds.contains(&m.entity_kind()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{NamedUsagePoint, UsagePoint};
    use async_trait::async_trait;
    use chargeback_common::{CollectionError, Result};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fixture source keyed by (metric, group); `fail_on` injects a query
    /// failure for one metric.
    #[derive(Default)]
    struct FixtureSource {
        responses: HashMap<(MetricKind, String), Vec<UsagePoint>>,
        unassigned: HashMap<MetricKind, Vec<NamedUsagePoint>>,
        fail_on: Option<MetricKind>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UsageSource for FixtureSource {
        async fn query_usage(
            &self,
            metric: MetricKind,
            group: &str,
            _window: &TimeWindow,
        ) -> Result<Vec<UsagePoint>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(metric) {
                return Err(CollectionError::QueryFailed {
                    metric: metric.to_string(),
                    group: group.to_string(),
                    reason: "upstream timeout".to_string(),
                }
                .into());
            }
            Ok(self
                .responses
                .get(&(metric, group.to_string()))
                .cloned()
                .unwrap_or_default())
        }

        async fn query_unassigned_usage(
            &self,
            metric: MetricKind,
            _window: &TimeWindow,
        ) -> Result<Vec<NamedUsagePoint>> {
            if self.fail_on == Some(metric) {
                return Err(CollectionError::QueryFailed {
                    metric: metric.to_string(),
                    group: "<unassigned>".to_string(),
                    reason: "upstream timeout".to_string(),
                }
                .into());
            }
            Ok(self.unassigned.get(&metric).cloned().unwrap_or_default())
        }
    }

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_collect_merges_all_queries() {
        let mut source = FixtureSource::default();
        source.responses.insert(
            (MetricKind::Fullstack, "Alpha".to_string()),
            vec![UsagePoint::new("HOST-1", 100.0)],
        );
        source.responses.insert(
            (MetricKind::Rum, "Beta".to_string()),
            vec![UsagePoint::new("APP-1", 12.0)],
        );

        let collector = UsageCollector::new(source, CollectorConfig::default());
        let snap = collector
            .collect(&groups(&["Alpha", "Beta"]), &EntityKind::ALL)
            .await;

        assert_eq!(snap.get(MetricKind::Fullstack, "HOST-1"), 100.0);
        assert_eq!(snap.get(MetricKind::Rum, "APP-1"), 12.0);
        assert_eq!(snap.get(MetricKind::Infra, "HOST-1"), 0.0);
    }

    #[tokio::test]
    async fn test_entity_kind_filter_limits_queries() {
        let source = FixtureSource::default();
        let collector = UsageCollector::new(source, CollectorConfig::default());
        let snap = collector
            .collect(&groups(&["Alpha", "Beta"]), &[EntityKind::Host])
            .await;

        assert!(snap.is_empty());
        // Two host metrics times two groups
        assert_eq!(collector.source.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_failed_query_reads_as_zero() {
        let mut source = FixtureSource::default();
        source.fail_on = Some(MetricKind::Fullstack);
        source.responses.insert(
            (MetricKind::Infra, "Alpha".to_string()),
            vec![UsagePoint::new("HOST-2", 40.0)],
        );

        let collector = UsageCollector::new(source, CollectorConfig::default());
        let snap = collector.collect(&groups(&["Alpha"]), &[EntityKind::Host]).await;

        // Failed metric contributes nothing; the other query still lands
        assert_eq!(snap.get(MetricKind::Fullstack, "HOST-1"), 0.0);
        assert_eq!(snap.get(MetricKind::Infra, "HOST-2"), 40.0);
    }

    #[tokio::test]
    async fn test_duplicate_entity_last_write_wins() {
        let mut source = FixtureSource::default();
        // The same host is tagged with both groups, so both per-group
        // queries return it with the same quantity
        for group in ["Alpha", "Beta"] {
            source.responses.insert(
                (MetricKind::Fullstack, group.to_string()),
                vec![UsagePoint::new("HOST-1", 100.0)],
            );
        }

        let collector = UsageCollector::new(source, CollectorConfig::default());
        let snap = collector
            .collect(&groups(&["Alpha", "Beta"]), &[EntityKind::Host])
            .await;
        assert_eq!(snap.get(MetricKind::Fullstack, "HOST-1"), 100.0);
        assert_eq!(snap.len(MetricKind::Fullstack), 1);
    }

    #[tokio::test]
    async fn test_collect_unassigned_carries_names() {
        let mut source = FixtureSource::default();
        source.unassigned.insert(
            MetricKind::HttpMonitor,
            vec![NamedUsagePoint::new("SYN-9", "orphan-check", 2.0)],
        );

        let collector = UsageCollector::new(source, CollectorConfig::default());
        let snap = collector.collect_unassigned(&[EntityKind::Synthetic]).await;

        let points: Vec<_> = snap.iter().collect();
        assert_eq!(points.len(), 1);
        let (metric, id, quantity) = points[0];
        assert_eq!(metric, MetricKind::HttpMonitor);
        assert_eq!(id, "SYN-9");
        assert_eq!(quantity.name, "orphan-check");
        assert_eq!(quantity.value, 2.0);
    }

    #[tokio::test]
    async fn test_concurrency_floor() {
        let config = CollectorConfig::default().with_max_concurrent_queries(0);
        assert_eq!(config.max_concurrent_queries, 1);
    }
}
