//! Report tree model and incremental builder
//!
//! The output tree is keyed delivery group → information system →
//! resource-kind bucket. Nodes are created lazily as resources are placed;
//! a resource identity appears at most once per bucket, and a
//! [`PlacementTracker`] owned by the report-generation invocation guards
//! cross-collection dedup between the main builder and the unassigned
//! handler.

use chargeback_common::{EntityKind, InfoSystem, UsageVector};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// One resource's attributed usage within a single group placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityEntry {
    /// External identity
    pub id: String,
    /// Display name
    pub name: String,
    /// Distributed per-metric quantities for this placement
    pub usage: UsageVector,
    /// Internally operated (hosts only)
    pub managed: bool,
    /// Whether this placement's usage counts toward totals
    pub billed: bool,
    /// All delivery groups the resource declares membership in
    pub tagged_groups: Vec<String>,
}

/// Per-resource-kind entry lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KindBuckets {
    pub hosts: Vec<EntityEntry>,
    pub applications: Vec<EntityEntry>,
    pub synthetics: Vec<EntityEntry>,
}

impl KindBuckets {
    pub fn bucket(&self, kind: EntityKind) -> &[EntityEntry] {
        match kind {
            EntityKind::Host => &self.hosts,
            EntityKind::Application => &self.applications,
            EntityKind::Synthetic => &self.synthetics,
        }
    }

    fn bucket_mut(&mut self, kind: EntityKind) -> &mut Vec<EntityEntry> {
        match kind {
            EntityKind::Host => &mut self.hosts,
            EntityKind::Application => &mut self.applications,
            EntityKind::Synthetic => &mut self.synthetics,
        }
    }

    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        self.bucket(kind).iter().any(|e| e.id == id)
    }

    /// Append unless an entry with the same identity already exists.
    /// Returns whether the entry was added.
    pub fn push_dedup(&mut self, kind: EntityKind, entry: EntityEntry) -> bool {
        if self.contains(kind, &entry.id) {
            debug!(id = %entry.id, %kind, "Entry already present in bucket - Skipping");
            return false;
        }
        self.bucket_mut(kind).push(entry);
        true
    }
}

/// Usage, entity, and managed-host totals at one tree level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Totals {
    pub usage: UsageVector,
    pub entities: BTreeMap<EntityKind, u64>,
    pub managed_hosts: u64,
}

impl Totals {
    /// All-zero totals with explicit entries for every metric and kind
    pub fn zeroed() -> Self {
        Self {
            usage: UsageVector::zeroed(),
            entities: EntityKind::ALL.into_iter().map(|k| (k, 0)).collect(),
            managed_hosts: 0,
        }
    }

    pub(crate) fn count(&mut self, kind: EntityKind, n: u64) {
        *self.entities.entry(kind).or_insert(0) += n;
    }

    pub(crate) fn merge(&mut self, other: &Totals) {
        self.usage.merge(&other.usage);
        for (kind, n) in &other.entities {
            *self.entities.entry(*kind).or_insert(0) += n;
        }
        self.managed_hosts += other.managed_hosts;
    }
}

impl Default for Totals {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// An information-system node of the report tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsNode {
    pub name: String,
    pub managed: bool,
    pub entities: KindBuckets,
    /// Billed usage summed over this node's entries (filled by the
    /// aggregator)
    pub usage: UsageVector,
}

impl IsNode {
    fn new(is: &InfoSystem) -> Self {
        Self {
            name: is.name.clone(),
            managed: is.managed,
            entities: KindBuckets::default(),
            usage: UsageVector::zeroed(),
        }
    }
}

/// A delivery-group node of the report tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupNode {
    pub name: String,
    pub info_systems: Vec<IsNode>,
    /// Resources belonging to this group but to none of its information
    /// systems
    pub unassigned: KindBuckets,
    pub totals: Totals,
}

impl GroupNode {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            info_systems: Vec::new(),
            unassigned: KindBuckets::default(),
            totals: Totals::zeroed(),
        }
    }

    pub fn info_system(&self, name: &str) -> Option<&IsNode> {
        self.info_systems.iter().find(|is| is.name == name)
    }

    fn ensure_info_system(&mut self, is: &InfoSystem) -> &mut IsNode {
        if let Some(idx) = self.info_systems.iter().position(|n| n.name == is.name) {
            &mut self.info_systems[idx]
        } else {
            debug!(group = %self.name, subgroup = %is.name, "Creating IS node");
            self.info_systems.push(IsNode::new(is));
            let last = self.info_systems.len() - 1;
            &mut self.info_systems[last]
        }
    }
}

/// The complete chargeback report tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub groups: Vec<GroupNode>,
    /// Totals over every group except the synthetic `Unassigned` one
    pub totals: Totals,
    /// Totals of the synthetic `Unassigned` group, kept apart
    pub unassigned_totals: Totals,
}

impl Report {
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            totals: Totals::zeroed(),
            unassigned_totals: Totals::zeroed(),
        }
    }

    pub fn group(&self, name: &str) -> Option<&GroupNode> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Create an empty group node if one does not exist yet
    pub fn ensure_group(&mut self, name: &str) -> &mut GroupNode {
        if let Some(idx) = self.groups.iter().position(|g| g.name == name) {
            &mut self.groups[idx]
        } else {
            debug!(group = %name, "Creating group node");
            self.groups.push(GroupNode::new(name));
            let last = self.groups.len() - 1;
            &mut self.groups[last]
        }
    }

    /// Place one resource entry into the named group.
    ///
    /// With a matching information system (from topology membership, never
    /// from prior report state) the entry goes into that IS node's bucket;
    /// otherwise it lands in the group's unassigned-in-group bucket. Both
    /// paths dedup by identity. Returns whether the entry was added.
    pub fn place(
        &mut self,
        group: &str,
        kind: EntityKind,
        entry: EntityEntry,
        matching_is: Option<&InfoSystem>,
    ) -> bool {
        let node = self.ensure_group(group);
        match matching_is {
            Some(is) => {
                let is_node = node.ensure_info_system(is);
                is_node.entities.push_dedup(kind, entry)
            }
            None => node.unassigned.push_dedup(kind, entry),
        }
    }

    /// Drop groups not named in `keep` (the post-aggregation filter down to
    /// the requested groups plus `Unassigned`)
    pub fn retain_groups(&mut self, keep: &[String]) {
        self.groups.retain(|g| keep.iter().any(|k| *k == g.name));
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

/// Dedup accumulator for one report-generation invocation
///
/// Shared between the tree builder and the unassigned handler so a resource
/// placed by either is never duplicated by the other.
#[derive(Debug, Default)]
pub struct PlacementTracker {
    processed: HashSet<String>,
}

impl PlacementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this identity has already been fully processed
    pub fn contains(&self, id: &str) -> bool {
        self.processed.contains(id)
    }

    /// Record an identity as processed
    pub fn mark(&mut self, id: impl Into<String>) {
        self.processed.insert(id.into());
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> EntityEntry {
        EntityEntry {
            id: id.to_string(),
            name: format!("name-{id}"),
            usage: UsageVector::new(),
            managed: false,
            billed: true,
            tagged_groups: vec!["Alpha".into()],
        }
    }

    #[test]
    fn test_ensure_group_is_idempotent() {
        let mut report = Report::new();
        report.ensure_group("Alpha");
        report.ensure_group("Alpha");
        assert_eq!(report.groups.len(), 1);
    }

    #[test]
    fn test_place_into_is_node() {
        let mut report = Report::new();
        let is = InfoSystem::new("CRM", false);
        assert!(report.place("Alpha", EntityKind::Host, entry("HOST-1"), Some(&is)));

        let group = report.group("Alpha").unwrap();
        assert_eq!(group.info_systems.len(), 1);
        assert!(group.info_systems[0].entities.contains(EntityKind::Host, "HOST-1"));
        assert!(group.unassigned.hosts.is_empty());
    }

    #[test]
    fn test_place_without_is_goes_to_unassigned_bucket() {
        let mut report = Report::new();
        assert!(report.place("Alpha", EntityKind::Application, entry("APP-1"), None));
        let group = report.group("Alpha").unwrap();
        assert!(group.unassigned.contains(EntityKind::Application, "APP-1"));
    }

    #[test]
    fn test_bucket_dedup_by_identity() {
        let mut report = Report::new();
        let is = InfoSystem::new("CRM", false);
        assert!(report.place("Alpha", EntityKind::Host, entry("HOST-1"), Some(&is)));
        assert!(!report.place("Alpha", EntityKind::Host, entry("HOST-1"), Some(&is)));

        let group = report.group("Alpha").unwrap();
        assert_eq!(group.info_systems[0].entities.hosts.len(), 1);

        // The same identity may still appear in a different group
        assert!(report.place("Beta", EntityKind::Host, entry("HOST-1"), None));
    }

    #[test]
    fn test_retain_groups() {
        let mut report = Report::new();
        report.ensure_group("Alpha");
        report.ensure_group("Beta");
        report.ensure_group("Unassigned");
        report.retain_groups(&["Alpha".into(), "Unassigned".into()]);
        assert!(report.group("Alpha").is_some());
        assert!(report.group("Beta").is_none());
        assert!(report.group("Unassigned").is_some());
    }

    #[test]
    fn test_tracker() {
        let mut tracker = PlacementTracker::new();
        assert!(!tracker.contains("HOST-1"));
        tracker.mark("HOST-1");
        assert!(tracker.contains("HOST-1"));
        assert_eq!(tracker.len(), 1);
    }
}
