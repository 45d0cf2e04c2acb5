//! Report orchestration
//!
//! Drives the full pipeline over materialized snapshots: resolve charge
//! targets, distribute usage, place entries into the tree, fold in
//! unassigned usage, aggregate, and filter down to the requested groups.
//! Generation is atomic: any error propagates and no partial report is
//! returned.

use crate::aggregate::aggregate;
use crate::config::ReportConfig;
use crate::distribute::{distribute, Attributable};
use crate::resolver::resolve;
use crate::tree::{EntityEntry, PlacementTracker, Report};
use crate::unassigned::fold_unassigned;
use crate::UNASSIGNED_GROUP;
use chargeback_common::{
    EntityKind, InfoSystem, Result, TopologySnapshot, UnassignedUsageSnapshot, UsageSnapshot,
    UsageVector,
};
use tracing::{debug, info, warn};

/// Generates chargeback reports from immutable topology and usage snapshots
pub struct ReportBuilder {
    config: ReportConfig,
}

impl ReportBuilder {
    pub fn new(config: ReportConfig) -> Self {
        info!(
            fallback = %config.fallback_group,
            include_non_charged = config.include_non_charged,
            process_unassigned = config.process_unassigned,
            "Initialized report builder"
        );
        Self { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Generate a complete chargeback report.
    ///
    /// The fallback group is processed first even when not requested: most
    /// redirected usage lands there, and its node must exist before other
    /// groups' resources are placed against it.
    pub fn generate(
        &self,
        topology: &TopologySnapshot,
        usage: &UsageSnapshot,
        unassigned_usage: Option<&UnassignedUsageSnapshot>,
    ) -> Result<Report> {
        let requested = if self.config.requested_groups.is_empty() {
            topology.group_names()
        } else {
            self.config.requested_groups.clone()
        };

        let mut ordered = vec![self.config.fallback_group.clone()];
        for name in &requested {
            if !ordered.contains(name) {
                ordered.push(name.clone());
            }
        }
        info!(groups = ordered.len(), "Starting chargeback report generation");

        let mut report = Report::new();
        let mut tracker = PlacementTracker::new();

        for group_name in &ordered {
            let Some(group) = topology.group(group_name) else {
                warn!(group = %group_name, "Delivery group not in topology - Skipping");
                continue;
            };
            report.ensure_group(&group.name);

            for kind in &self.config.entity_kinds {
                match kind {
                    EntityKind::Host => {
                        for host in topology.hosts_in(group_name) {
                            self.place_entity(host, topology, usage, &mut report, &mut tracker);
                        }
                    }
                    EntityKind::Application => {
                        for app in topology.applications_in(group_name) {
                            self.place_entity(app, topology, usage, &mut report, &mut tracker);
                        }
                    }
                    EntityKind::Synthetic => {
                        for check in topology.synthetics_in(group_name) {
                            self.place_entity(check, topology, usage, &mut report, &mut tracker);
                        }
                    }
                }
            }
        }

        if self.config.process_unassigned {
            if let Some(unassigned) = unassigned_usage {
                fold_unassigned(&mut report, unassigned, &mut tracker);
            }
        }

        aggregate(&mut report);

        // Keep only the requested groups (plus the synthetic Unassigned
        // node); lazily created merely-tagged groups drop out here, after
        // their usage has been counted.
        let mut keep = ordered;
        if self.config.process_unassigned {
            keep.push(UNASSIGNED_GROUP.to_string());
        }
        report.retain_groups(&keep);

        info!(
            groups = report.groups.len(),
            entities = tracker.len(),
            "Report generation completed"
        );
        Ok(report)
    }

    /// Attribute and place a single resource into the tree.
    fn place_entity<E: Attributable>(
        &self,
        entity: &E,
        topology: &TopologySnapshot,
        usage: &UsageSnapshot,
        report: &mut Report,
        tracker: &mut PlacementTracker,
    ) {
        if tracker.contains(entity.id()) {
            debug!(id = %entity.id(), "Entity already processed - Skipping");
            return;
        }

        let tagged = entity.groups();
        if tagged.is_empty() {
            // Untagged resources are the unassigned handler's concern; a
            // group-membership iterator cannot yield them.
            debug!(id = %entity.id(), "Entity has no group memberships - Skipping");
            return;
        }

        let billable = entity.billable(topology);
        let targets = resolve(tagged, billable, &self.config.fallback_group);
        let raw = entity.raw_usage(usage);
        let shared = distribute(&raw, targets.charged.len(), billable);

        debug!(
            id = %entity.id(),
            kind = %entity.kind(),
            billable,
            charged = targets.charged.len(),
            "Placing entity"
        );

        for group_name in targets.placement_groups(self.config.include_non_charged) {
            let charged_here = targets.is_charged(&group_name);
            let usage_vec = if charged_here {
                shared.clone()
            } else {
                zero_usage(entity.kind())
            };

            let entry = EntityEntry {
                id: entity.id().to_string(),
                name: entity.display_name().to_string(),
                usage: usage_vec,
                managed: entity.managed(),
                billed: billable && charged_here,
                tagged_groups: tagged.to_vec(),
            };

            let matching_is = self.matching_subgroup(entity, &group_name, topology);
            report.place(&group_name, entity.kind(), entry, matching_is);
        }

        tracker.mark(entity.id());
    }

    /// The information system this entity belongs to within `group`,
    /// resolved from topology membership (never from prior report state).
    fn matching_subgroup<'t, E: Attributable>(
        &self,
        entity: &E,
        group: &str,
        topology: &'t TopologySnapshot,
    ) -> Option<&'t InfoSystem> {
        let subgroup_ref = entity.subgroups().iter().find(|r| r.group == group)?;
        match topology.subgroup(&subgroup_ref.group, &subgroup_ref.name) {
            Some(is) => Some(is),
            None => {
                warn!(
                    id = %entity.id(),
                    group = %subgroup_ref.group,
                    subgroup = %subgroup_ref.name,
                    "Sub-group not found in topology - Placing as unassigned-in-group"
                );
                None
            }
        }
    }
}

/// Explicit zeros for every metric of the given resource kind
fn zero_usage(kind: EntityKind) -> UsageVector {
    kind.metric_kinds().iter().map(|m| (*m, 0.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chargeback_common::{
        Application, DeliveryGroup, Host, InfoSystem, MetricKind, MonitoringTier, SubgroupRef,
    };

    const FALLBACK: &str = "Central Ops";

    fn config() -> ReportConfig {
        ReportConfig::default().with_fallback_group(FALLBACK)
    }

    fn topology() -> TopologySnapshot {
        TopologySnapshot::new(
            vec![
                DeliveryGroup::new(FALLBACK),
                DeliveryGroup::new("Alpha")
                    .with_info_system(InfoSystem::new("CRM", false))
                    .with_info_system(InfoSystem::new("Shared Platform", true)),
                DeliveryGroup::new("Beta"),
            ],
            vec![],
            vec![],
            vec![],
        )
    }

    #[test]
    fn test_split_across_two_groups() {
        let mut topo = topology();
        topo.hosts.push(
            Host::new("HOST-1", "h1")
                .with_tier(MonitoringTier::FullStack)
                .with_groups(vec!["Alpha".into(), "Beta".into()]),
        );
        let mut usage = UsageSnapshot::new();
        usage.record(MetricKind::Fullstack, "HOST-1", 100.0);

        let report = ReportBuilder::new(config())
            .generate(&topo, &usage, None)
            .unwrap();

        for group in ["Alpha", "Beta"] {
            let node = report.group(group).unwrap();
            let host = &node.unassigned.hosts[0];
            assert!(host.billed);
            assert!((host.usage.get(MetricKind::Fullstack) - 50.0).abs() < crate::USAGE_EPSILON);
        }
        assert!(
            (report.totals.usage.get(MetricKind::Fullstack) - 100.0).abs() < crate::USAGE_EPSILON
        );
    }

    #[test]
    fn test_fallback_precedence() {
        let mut topo = topology();
        topo.hosts.push(
            Host::new("HOST-1", "h1")
                .with_tier(MonitoringTier::FullStack)
                .with_groups(vec![FALLBACK.into(), "Alpha".into(), "Beta".into()]),
        );
        let mut usage = UsageSnapshot::new();
        usage.record(MetricKind::Fullstack, "HOST-1", 90.0);

        let report = ReportBuilder::new(config())
            .generate(&topo, &usage, None)
            .unwrap();

        let fallback = report.group(FALLBACK).unwrap();
        assert_eq!(
            fallback.totals.usage.get(MetricKind::Fullstack),
            90.0
        );
        // Without include_non_charged the other groups see no row at all
        assert!(report.group("Alpha").unwrap().unassigned.hosts.is_empty());
        assert!(report.group("Beta").unwrap().unassigned.hosts.is_empty());
    }

    #[test]
    fn test_include_non_charged_adds_zero_rows() {
        let mut topo = topology();
        topo.hosts.push(
            Host::new("HOST-1", "h1")
                .with_tier(MonitoringTier::FullStack)
                .with_groups(vec![FALLBACK.into(), "Alpha".into()]),
        );
        let mut usage = UsageSnapshot::new();
        usage.record(MetricKind::Fullstack, "HOST-1", 90.0);

        let report = ReportBuilder::new(config().with_include_non_charged(true))
            .generate(&topo, &usage, None)
            .unwrap();

        let alpha = report.group("Alpha").unwrap();
        let row = &alpha.unassigned.hosts[0];
        assert!(!row.billed);
        assert!(row.usage.is_zero());
        assert_eq!(alpha.totals.usage.get(MetricKind::Fullstack), 0.0);
    }

    #[test]
    fn test_managed_app_redirected_to_fallback() {
        // Concrete scenario: application in a managed IS of Alpha only.
        let mut topo = topology();
        topo.applications.push(
            Application::new("APP-1", "a1")
                .with_groups(vec!["Alpha".into()])
                .with_subgroup(SubgroupRef::new("Alpha", "Shared Platform")),
        );
        let usage = UsageSnapshot::new();

        let report = ReportBuilder::new(config())
            .generate(&topo, &usage, None)
            .unwrap();

        let fallback = report.group(FALLBACK).unwrap();
        let app = &fallback.unassigned.applications[0];
        assert_eq!(app.id, "APP-1");
        assert!(!app.billed);
        assert!(app.usage.is_zero());
        assert_eq!(fallback.totals.entities[&EntityKind::Application], 1);
        // Alpha's totals see nothing of the app
        let alpha = report.group("Alpha").unwrap();
        assert_eq!(alpha.totals.entities[&EntityKind::Application], 0);
        assert!(alpha.totals.usage.is_zero());
    }

    #[test]
    fn test_entity_placed_into_matching_is() {
        let mut topo = topology();
        topo.applications.push(
            Application::new("APP-1", "shop")
                .with_groups(vec!["Alpha".into()])
                .with_subgroup(SubgroupRef::new("Alpha", "CRM")),
        );
        let mut usage = UsageSnapshot::new();
        usage.record(MetricKind::Rum, "APP-1", 12.0);

        let report = ReportBuilder::new(config())
            .generate(&topo, &usage, None)
            .unwrap();

        let alpha = report.group("Alpha").unwrap();
        let crm = alpha.info_system("CRM").unwrap();
        assert_eq!(crm.entities.applications.len(), 1);
        assert_eq!(crm.usage.get(MetricKind::Rum), 12.0);
        assert!(alpha.unassigned.applications.is_empty());
    }

    #[test]
    fn test_duplicate_processing_is_idempotent() {
        // HOST-1 is a member of both Alpha and Beta, so the group loop
        // visits it twice; the tracker must keep the second visit from
        // changing anything.
        let mut topo = topology();
        topo.hosts.push(
            Host::new("HOST-1", "h1")
                .with_tier(MonitoringTier::Infrastructure)
                .with_groups(vec!["Alpha".into(), "Beta".into()]),
        );
        let mut usage = UsageSnapshot::new();
        usage.record(MetricKind::Infra, "HOST-1", 60.0);

        let report = ReportBuilder::new(config())
            .generate(&topo, &usage, None)
            .unwrap();

        assert_eq!(report.group("Alpha").unwrap().unassigned.hosts.len(), 1);
        assert_eq!(report.group("Beta").unwrap().unassigned.hosts.len(), 1);
        assert!(
            (report.totals.usage.get(MetricKind::Infra) - 60.0).abs() < crate::USAGE_EPSILON
        );
    }

    #[test]
    fn test_unmonitored_host_absorbed_by_fallback() {
        let mut topo = topology();
        topo.hosts.push(
            Host::new("HOST-1", "old01")
                .with_tier(MonitoringTier::None)
                .with_groups(vec!["Alpha".into()]),
        );
        let mut usage = UsageSnapshot::new();
        usage.record(MetricKind::Fullstack, "HOST-1", 10.0);

        let report = ReportBuilder::new(config())
            .generate(&topo, &usage, None)
            .unwrap();

        let fallback = report.group(FALLBACK).unwrap();
        let host = &fallback.unassigned.hosts[0];
        assert!(!host.billed);
        assert!(host.usage.is_zero());
        assert!(report.totals.usage.is_zero());
    }

    #[test]
    fn test_requested_group_filter() {
        let mut topo = topology();
        topo.hosts.push(
            Host::new("HOST-1", "h1")
                .with_tier(MonitoringTier::FullStack)
                .with_groups(vec!["Alpha".into(), "Beta".into()]),
        );
        let mut usage = UsageSnapshot::new();
        usage.record(MetricKind::Fullstack, "HOST-1", 100.0);

        let cfg = config().with_requested_groups(vec!["Alpha".into()]);
        let report = ReportBuilder::new(cfg)
            .generate(&topo, &usage, None)
            .unwrap();

        assert!(report.group("Alpha").is_some());
        assert!(report.group("Beta").is_none());
        assert!(report.group(FALLBACK).is_some());
        // Beta's charged share was counted before the group was dropped
        assert!(
            (report.totals.usage.get(MetricKind::Fullstack) - 100.0).abs() < crate::USAGE_EPSILON
        );
    }

    #[test]
    fn test_unknown_requested_group_skipped() {
        let topo = topology();
        let usage = UsageSnapshot::new();
        let cfg = config().with_requested_groups(vec!["Nowhere".into()]);
        let report = ReportBuilder::new(cfg)
            .generate(&topo, &usage, None)
            .unwrap();
        assert!(report.group("Nowhere").is_none());
    }
}
