//! Unassigned-resource handling
//!
//! Resources absent from every delivery group's tag set arrive as a
//! separate named usage collection. They fold into a single `Unassigned`
//! group node, guarded by the placement tracker shared with the main
//! builder so neither side duplicates the other.

use crate::tree::{EntityEntry, PlacementTracker, Report};
use crate::UNASSIGNED_GROUP;
use chargeback_common::{EntityKind, UnassignedUsageSnapshot, UsageVector};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Fold unassigned usage into the report's `Unassigned` group.
///
/// Datapoints for one identity across several metric kinds merge into a
/// single entry carrying all of them. `billed` is fixed to true: there is
/// no owning group to redirect to.
pub fn fold_unassigned(
    report: &mut Report,
    usage: &UnassignedUsageSnapshot,
    tracker: &mut PlacementTracker,
) {
    // Group datapoints by identity before placement so one entry carries
    // every metric kind observed for that identity.
    let mut pending: BTreeMap<(EntityKind, String), (String, UsageVector)> = BTreeMap::new();

    for (metric, id, quantity) in usage.iter() {
        if tracker.contains(id) {
            debug!(%id, "Entity already placed by the main builder - Skipping");
            continue;
        }
        let key = (metric.entity_kind(), id.to_string());
        let slot = pending
            .entry(key)
            .or_insert_with(|| (quantity.name.clone(), UsageVector::new()));
        slot.1.add(metric, quantity.value);
    }

    let node = report.ensure_group(UNASSIGNED_GROUP);
    let mut added = 0usize;
    for ((kind, id), (name, vector)) in pending {
        let entry = EntityEntry {
            id: id.clone(),
            name: display_name_or_unknown(name),
            usage: vector,
            managed: false,
            billed: true,
            tagged_groups: Vec::new(),
        };
        if node.unassigned.push_dedup(kind, entry) {
            tracker.mark(id);
            added += 1;
        }
    }

    info!(entities = added, "Folded unassigned entities into report");
}

/// Missing display names resolve to a safe default rather than erroring
fn display_name_or_unknown(name: String) -> String {
    if name.trim().is_empty() {
        "Unknown".to_string()
    } else {
        name
    }
}
