//! Usage distribution
//!
//! The [`Attributable`] trait gives the three resource kinds one uniform
//! surface for the resolver/distributor/builder pipeline; each kind supplies
//! its metric list, its raw-usage extraction (hosts apply tier mutual
//! exclusivity here), and its billability rule.

use chargeback_common::{
    Application, EntityKind, Host, SubgroupRef, SyntheticCheck, TopologySnapshot, UsageSnapshot,
    UsageVector,
};

/// Uniform view of a monitored resource for attribution
pub trait Attributable {
    fn kind(&self) -> EntityKind;
    fn id(&self) -> &str;
    fn display_name(&self) -> &str;
    /// Internally operated (hosts only; always false for other kinds)
    fn managed(&self) -> bool;
    /// Delivery-group memberships
    fn groups(&self) -> &[String];
    /// Information-system memberships
    fn subgroups(&self) -> &[SubgroupRef];
    /// Raw per-metric usage for this resource, with kind-specific
    /// exclusivity rules already applied
    fn raw_usage(&self, usage: &UsageSnapshot) -> UsageVector;
    /// Whether this resource's usage counts toward its owner's totals
    fn billable(&self, topology: &TopologySnapshot) -> bool;
}

impl Attributable for Host {
    fn kind(&self) -> EntityKind {
        EntityKind::Host
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn managed(&self) -> bool {
        self.managed
    }

    fn groups(&self) -> &[String] {
        &self.groups
    }

    fn subgroups(&self) -> &[SubgroupRef] {
        &self.subgroups
    }

    /// A host bills either as full-stack or as infrastructure, never both:
    /// only the metric matching the active tier may be non-zero.
    fn raw_usage(&self, usage: &UsageSnapshot) -> UsageVector {
        let mut raw = UsageVector::new();
        for metric in self.kind().metric_kinds() {
            let value = if Some(*metric) == self.tier.metric_kind() {
                usage.get(*metric, &self.id)
            } else {
                0.0
            };
            raw.set(*metric, value);
        }
        raw
    }

    fn billable(&self, _topology: &TopologySnapshot) -> bool {
        crate::rules::is_billable_host(self)
    }
}

impl Attributable for Application {
    fn kind(&self) -> EntityKind {
        EntityKind::Application
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn managed(&self) -> bool {
        false
    }

    fn groups(&self) -> &[String] {
        &self.groups
    }

    fn subgroups(&self) -> &[SubgroupRef] {
        &self.subgroups
    }

    fn raw_usage(&self, usage: &UsageSnapshot) -> UsageVector {
        self.kind()
            .metric_kinds()
            .iter()
            .map(|m| (*m, usage.get(*m, &self.id)))
            .collect()
    }

    fn billable(&self, topology: &TopologySnapshot) -> bool {
        crate::rules::is_billable_application(self, topology)
    }
}

impl Attributable for SyntheticCheck {
    fn kind(&self) -> EntityKind {
        EntityKind::Synthetic
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn managed(&self) -> bool {
        false
    }

    fn groups(&self) -> &[String] {
        &self.groups
    }

    fn subgroups(&self) -> &[SubgroupRef] {
        &self.subgroups
    }

    fn raw_usage(&self, usage: &UsageSnapshot) -> UsageVector {
        self.kind()
            .metric_kinds()
            .iter()
            .map(|m| (*m, usage.get(*m, &self.id)))
            .collect()
    }

    fn billable(&self, topology: &TopologySnapshot) -> bool {
        crate::rules::is_billable_synthetic(self, topology)
    }
}

/// Split raw usage evenly across the charged groups.
///
/// Each metric's share is `raw / charged_count` when the raw quantity is
/// positive, zero otherwise. A non-billable resource distributes zero
/// everywhere. Plain floating-point division; rounding is a presentation
/// concern.
pub fn distribute(raw: &UsageVector, charged_count: usize, billable: bool) -> UsageVector {
    raw.iter()
        .map(|(metric, value)| {
            let share = if billable && value > 0.0 && charged_count > 0 {
                value / charged_count as f64
            } else {
                0.0
            };
            (metric, share)
        })
        .collect()
}
