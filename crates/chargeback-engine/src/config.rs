//! Report generation configuration

use crate::DEFAULT_FALLBACK_GROUP;
use chargeback_common::EntityKind;
use serde::{Deserialize, Serialize};

/// Configuration for one chargeback report run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// The distinguished group absorbing managed and non-billable usage
    pub fallback_group: String,
    /// Whether tagged-but-not-charged memberships still appear as
    /// zero-usage rows
    pub include_non_charged: bool,
    /// Whether to fold in resources with no group membership at all
    pub process_unassigned: bool,
    /// Resource kinds participating in this run
    pub entity_kinds: Vec<EntityKind>,
    /// Delivery groups to report on; empty means every group in the
    /// topology snapshot
    pub requested_groups: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            fallback_group: DEFAULT_FALLBACK_GROUP.to_string(),
            include_non_charged: false,
            process_unassigned: true,
            entity_kinds: EntityKind::ALL.to_vec(),
            requested_groups: Vec::new(),
        }
    }
}

impl ReportConfig {
    /// Load configuration from the environment.
    ///
    /// Reads a `.env` file when present, then applies `CHARGEBACK_*`
    /// overrides on top of the defaults. Unparseable values keep the
    /// default.
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        if let Ok(group) = std::env::var("CHARGEBACK_FALLBACK_GROUP") {
            if !group.trim().is_empty() {
                cfg.fallback_group = group.trim().to_string();
            }
        }
        if let Ok(val) = std::env::var("CHARGEBACK_INCLUDE_NON_CHARGED") {
            if let Ok(v) = val.parse() {
                cfg.include_non_charged = v;
            }
        }
        if let Ok(val) = std::env::var("CHARGEBACK_PROCESS_UNASSIGNED") {
            if let Ok(v) = val.parse() {
                cfg.process_unassigned = v;
            }
        }
        if let Ok(val) = std::env::var("CHARGEBACK_ENTITY_KINDS") {
            let kinds: Vec<EntityKind> = val
                .split(',')
                .filter_map(|s| s.parse().ok())
                .collect();
            if !kinds.is_empty() {
                cfg.entity_kinds = kinds;
            }
        }

        cfg
    }

    pub fn with_fallback_group(mut self, group: impl Into<String>) -> Self {
        self.fallback_group = group.into();
        self
    }

    pub fn with_include_non_charged(mut self, include: bool) -> Self {
        self.include_non_charged = include;
        self
    }

    pub fn with_process_unassigned(mut self, process: bool) -> Self {
        self.process_unassigned = process;
        self
    }

    pub fn with_entity_kinds(mut self, kinds: Vec<EntityKind>) -> Self {
        self.entity_kinds = kinds;
        self
    }

    pub fn with_requested_groups(mut self, groups: Vec<String>) -> Self {
        self.requested_groups = groups;
        self
    }
}
