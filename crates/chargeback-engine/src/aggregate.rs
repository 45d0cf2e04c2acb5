//! Bottom-up aggregation over the finished report tree
//!
//! One pass: information-system usage, then group totals (IS totals plus
//! the group's unassigned-in-group bucket), then report totals. Only billed
//! entries contribute usage; every entry counts toward entity occupancy;
//! managed hosts are counted separately. The synthetic `Unassigned` group
//! feeds `unassigned_totals` instead of the main report totals.

use crate::tree::{KindBuckets, Report, Totals};
use crate::UNASSIGNED_GROUP;
use chargeback_common::{EntityKind, UsageVector};
use tracing::debug;

/// Compute totals at every level of the tree. A group or information
/// system with no entries contributes all-zero totals; there is no error
/// condition over a well-formed tree.
pub fn aggregate(report: &mut Report) {
    report.totals = Totals::zeroed();
    report.unassigned_totals = Totals::zeroed();

    for group in &mut report.groups {
        let mut group_totals = Totals::zeroed();

        for is_node in &mut group.info_systems {
            let mut is_usage = UsageVector::zeroed();
            sum_buckets(&is_node.entities, Some(&mut is_usage), &mut group_totals);
            is_node.usage = is_usage;
        }

        sum_buckets(&group.unassigned, None, &mut group_totals);

        debug!(group = %group.name, "Aggregated group totals");
        group.totals = group_totals;

        if group.name == UNASSIGNED_GROUP {
            report.unassigned_totals.merge(&group.totals);
        } else {
            report.totals.merge(&group.totals);
        }
    }
}

/// Fold one set of kind buckets into the enclosing totals. `level_usage`
/// receives billed usage for the bucket's own level when present (IS
/// nodes); group totals always accumulate.
fn sum_buckets(buckets: &KindBuckets, mut level_usage: Option<&mut UsageVector>, totals: &mut Totals) {
    for kind in EntityKind::ALL {
        let entries = buckets.bucket(kind);
        for entry in entries {
            if entry.billed {
                if let Some(usage) = level_usage.as_deref_mut() {
                    usage.merge(&entry.usage);
                }
                totals.usage.merge(&entry.usage);
            }
            if kind == EntityKind::Host && entry.managed {
                totals.managed_hosts += 1;
            }
        }
        totals.count(kind, entries.len() as u64);
    }
}
