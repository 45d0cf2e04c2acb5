//! Charge-target resolution
//!
//! Given a resource's tagged delivery groups and its billability, decides
//! which groups are actually charged. The fallback group always wins when
//! explicitly tagged; non-billable resources are centrally absorbed by the
//! fallback group regardless of their memberships.

use tracing::debug;

/// The outcome of charge-target resolution for one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeTargets {
    /// Groups that receive the resource's distributed usage
    pub charged: Vec<String>,
    /// All declared memberships, kept for traceability
    pub tagged: Vec<String>,
}

impl ChargeTargets {
    /// Whether the named group is charged for this resource
    pub fn is_charged(&self, group: &str) -> bool {
        self.charged.iter().any(|g| g == group)
    }

    /// Groups the resource is placed into: charged ∪ tagged when
    /// non-charged memberships should appear as zero-usage rows, charged
    /// only otherwise.
    pub fn placement_groups(&self, include_non_charged: bool) -> Vec<String> {
        let mut groups = self.charged.clone();
        if include_non_charged {
            for g in &self.tagged {
                if !groups.contains(g) {
                    groups.push(g.clone());
                }
            }
        }
        groups
    }
}

/// Resolve the charged groups for a resource.
///
/// Priority order:
/// 1. fallback group tagged → charged = {fallback}
/// 2. not billable → charged = {fallback} (central absorption)
/// 3. otherwise → charged = all tagged groups (even split)
///
/// A resource with no tagged groups never reaches this function; it belongs
/// to the unassigned handler.
pub fn resolve(tagged: &[String], billable: bool, fallback: &str) -> ChargeTargets {
    debug_assert!(
        !tagged.is_empty(),
        "untagged resources are routed to the unassigned handler"
    );

    let charged = if tagged.iter().any(|g| g == fallback) {
        debug!(%fallback, "Fallback group tagged - charging fallback only");
        vec![fallback.to_string()]
    } else if !billable {
        debug!(%fallback, "Resource not billable - redirecting to fallback");
        vec![fallback.to_string()]
    } else {
        tagged.to_vec()
    };

    ChargeTargets {
        charged,
        tagged: tagged.to_vec(),
    }
}
