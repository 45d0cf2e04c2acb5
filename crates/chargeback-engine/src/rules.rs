//! Classification rules
//!
//! Pure, total functions deciding whether a resource or sub-group is
//! "managed" (internally operated, not billable to its owner) and whether a
//! resource is billable at all. Malformed input degrades to "not managed";
//! nothing here raises.

use chargeback_common::{Application, Host, Result, SyntheticCheck, TopologySnapshot};
use std::path::Path;
use tracing::info;

/// Static reference lists driving the managed classification
#[derive(Debug, Clone, Default)]
pub struct ManagedLists {
    /// Tag substrings marking a host as internally managed
    host_tag_markers: Vec<String>,
    /// Names of internally managed information systems
    subgroup_names: Vec<String>,
}

impl ManagedLists {
    pub fn new(host_tag_markers: Vec<String>, subgroup_names: Vec<String>) -> Self {
        Self {
            host_tag_markers: normalize(host_tag_markers),
            subgroup_names: normalize(subgroup_names),
        }
    }

    /// Load both lists from plain text files (comma and/or newline
    /// separated). Empty tokens are dropped.
    pub fn from_files(tags_path: impl AsRef<Path>, names_path: impl AsRef<Path>) -> Result<Self> {
        let tags = parse_list_file(&std::fs::read_to_string(tags_path)?);
        let names = parse_list_file(&std::fs::read_to_string(names_path)?);
        info!(
            tag_markers = tags.len(),
            subgroup_names = names.len(),
            "Loaded managed reference lists"
        );
        Ok(Self::new(tags, names))
    }

    /// True iff `name` (case-insensitive, trimmed) is a managed sub-group
    pub fn is_managed_subgroup(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.subgroup_names.iter().any(|n| *n == name)
    }

    /// True iff any managed-tag marker occurs within the host's serialized
    /// tag blob (case-insensitive substring match)
    pub fn is_managed_host(&self, tags: &str) -> bool {
        let tags = tags.to_lowercase();
        self.host_tag_markers.iter().any(|m| tags.contains(m))
    }
}

fn normalize(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_list_file(contents: &str) -> Vec<String> {
    contents
        .lines()
        .flat_map(|line| line.split(','))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A host bills iff it is actively monitored (full-stack or infrastructure
/// tier); a host with no monitoring tier never bills.
pub fn is_billable_host(host: &Host) -> bool {
    host.tier.is_monitored()
}

/// An application bills unless it belongs to at least one managed sub-group.
pub fn is_billable_application(app: &Application, topology: &TopologySnapshot) -> bool {
    !topology
        .subgroups_of(&app.subgroups)
        .iter()
        .any(|is| is.managed)
}

/// A synthetic check bills unless it belongs to at least one managed
/// sub-group.
pub fn is_billable_synthetic(check: &SyntheticCheck, topology: &TopologySnapshot) -> bool {
    !topology
        .subgroups_of(&check.subgroups)
        .iter()
        .any(|is| is.managed)
}
