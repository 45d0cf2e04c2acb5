//! Topology data model
//!
//! A fully materialized snapshot of the billing hierarchy: delivery groups
//! (DGs) own information systems (ISs); monitored resources declare
//! memberships in zero, one, or many groups and at most one sub-group per
//! owning group. The snapshot is immutable once handed to the engine.

use super::metric::MonitoringTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A resource's membership in one information system of one delivery group
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubgroupRef {
    /// Owning delivery group name
    pub group: String,
    /// Information system name within that group
    pub name: String,
}

impl SubgroupRef {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

/// A monitored host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    /// External identity, globally unique per kind
    pub id: String,
    /// Display name
    pub name: String,
    /// Internally operated; derived from tags at ingestion time
    pub managed: bool,
    /// Active monitoring tier
    pub tier: MonitoringTier,
    /// Serialized tag blob, kept for managed-tag classification
    pub tags: String,
    /// Delivery-group memberships (names)
    pub groups: Vec<String>,
    /// Information-system memberships
    pub subgroups: Vec<SubgroupRef>,
}

impl Host {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            managed: false,
            tier: MonitoringTier::None,
            tags: String::new(),
            groups: Vec::new(),
            subgroups: Vec::new(),
        }
    }

    pub fn with_tier(mut self, tier: MonitoringTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_managed(mut self, managed: bool) -> Self {
        self.managed = managed;
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_subgroup(mut self, subgroup: SubgroupRef) -> Self {
        self.subgroups.push(subgroup);
        self
    }
}

/// A monitored application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub name: String,
    pub groups: Vec<String>,
    pub subgroups: Vec<SubgroupRef>,
}

impl Application {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            groups: Vec::new(),
            subgroups: Vec::new(),
        }
    }

    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_subgroup(mut self, subgroup: SubgroupRef) -> Self {
        self.subgroups.push(subgroup);
        self
    }
}

/// A synthetic check (browser, HTTP, or third-party monitor)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticCheck {
    pub id: String,
    pub name: String,
    pub groups: Vec<String>,
    pub subgroups: Vec<SubgroupRef>,
}

impl SyntheticCheck {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            groups: Vec::new(),
            subgroups: Vec::new(),
        }
    }

    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_subgroup(mut self, subgroup: SubgroupRef) -> Self {
        self.subgroups.push(subgroup);
        self
    }
}

/// An information system within a delivery group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoSystem {
    pub name: String,
    /// Internally operated; members are redirected to the fallback group
    pub managed: bool,
}

impl InfoSystem {
    pub fn new(name: impl Into<String>, managed: bool) -> Self {
        Self {
            name: name.into(),
            managed,
        }
    }
}

/// A delivery group and its information systems
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryGroup {
    pub name: String,
    pub info_systems: Vec<InfoSystem>,
}

impl DeliveryGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            info_systems: Vec::new(),
        }
    }

    pub fn with_info_system(mut self, is: InfoSystem) -> Self {
        self.info_systems.push(is);
        self
    }

    /// Look up an information system by name
    pub fn subgroup(&self, name: &str) -> Option<&InfoSystem> {
        self.info_systems.iter().find(|is| is.name == name)
    }
}

/// Fully materialized topology for one report run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub groups: Vec<DeliveryGroup>,
    pub hosts: Vec<Host>,
    pub applications: Vec<Application>,
    pub synthetics: Vec<SyntheticCheck>,
    /// When the topology was last refreshed
    pub refreshed_at: DateTime<Utc>,
}

impl TopologySnapshot {
    pub fn new(
        groups: Vec<DeliveryGroup>,
        hosts: Vec<Host>,
        applications: Vec<Application>,
        synthetics: Vec<SyntheticCheck>,
    ) -> Self {
        Self {
            groups,
            hosts,
            applications,
            synthetics,
            refreshed_at: Utc::now(),
        }
    }

    /// Look up a delivery group by name
    pub fn group(&self, name: &str) -> Option<&DeliveryGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Look up an information system by owning group and name
    pub fn subgroup(&self, group: &str, name: &str) -> Option<&InfoSystem> {
        self.group(group).and_then(|g| g.subgroup(name))
    }

    /// All delivery group names, in snapshot order
    pub fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.name.clone()).collect()
    }

    /// Resolve membership refs to information systems.
    ///
    /// Refs naming an unknown group or sub-group are skipped with a warning
    /// (lookup misses are non-fatal; the affected membership is ignored).
    pub fn subgroups_of(&self, refs: &[SubgroupRef]) -> Vec<&InfoSystem> {
        let mut resolved = Vec::with_capacity(refs.len());
        for r in refs {
            match self.subgroup(&r.group, &r.name) {
                Some(is) => resolved.push(is),
                None => {
                    warn!(group = %r.group, subgroup = %r.name, "Sub-group ref not in topology - Skipping");
                }
            }
        }
        resolved
    }

    /// Hosts belonging to the named delivery group
    pub fn hosts_in<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Host> {
        self.hosts.iter().filter(move |h| h.groups.iter().any(|g| g == group))
    }

    /// Applications belonging to the named delivery group
    pub fn applications_in<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Application> {
        self.applications
            .iter()
            .filter(move |a| a.groups.iter().any(|g| g == group))
    }

    /// Synthetic checks belonging to the named delivery group
    pub fn synthetics_in<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a SyntheticCheck> {
        self.synthetics
            .iter()
            .filter(move |s| s.groups.iter().any(|g| g == group))
    }
}
