//! Metric and resource kind enumerations
//!
//! The seven metered consumption kinds map onto three monitored resource
//! kinds. Wire names match the upstream telemetry API so serialized reports
//! stay compatible with downstream consumers.

use serde::{Deserialize, Serialize};

/// A metered monitoring consumption kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Full-stack monitoring for hosts
    Fullstack,
    /// Infrastructure-only monitoring for hosts
    Infra,
    /// Real User Monitoring for applications
    Rum,
    /// RUM with Session Replay
    RumWithSr,
    /// Browser-based synthetic monitors
    BrowserMonitor,
    /// HTTP/API synthetic monitors
    HttpMonitor,
    /// Third-party synthetic monitors
    #[serde(rename = "3rd_party_monitor")]
    ThirdPartyMonitor,
}

impl MetricKind {
    /// All metric kinds, in report column order
    pub const ALL: [MetricKind; 7] = [
        MetricKind::Fullstack,
        MetricKind::Infra,
        MetricKind::Rum,
        MetricKind::RumWithSr,
        MetricKind::BrowserMonitor,
        MetricKind::HttpMonitor,
        MetricKind::ThirdPartyMonitor,
    ];

    /// Wire name for this metric kind
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Fullstack => "fullstack",
            MetricKind::Infra => "infra",
            MetricKind::Rum => "rum",
            MetricKind::RumWithSr => "rum_with_sr",
            MetricKind::BrowserMonitor => "browser_monitor",
            MetricKind::HttpMonitor => "http_monitor",
            MetricKind::ThirdPartyMonitor => "3rd_party_monitor",
        }
    }

    /// The resource kind this metric is billed against
    pub fn entity_kind(self) -> EntityKind {
        match self {
            MetricKind::Fullstack | MetricKind::Infra => EntityKind::Host,
            MetricKind::Rum | MetricKind::RumWithSr => EntityKind::Application,
            MetricKind::BrowserMonitor
            | MetricKind::HttpMonitor
            | MetricKind::ThirdPartyMonitor => EntityKind::Synthetic,
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A monitored resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "hosts")]
    Host,
    #[serde(rename = "applications")]
    Application,
    #[serde(rename = "synthetics")]
    Synthetic,
}

impl EntityKind {
    /// All resource kinds
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Host,
        EntityKind::Application,
        EntityKind::Synthetic,
    ];

    /// Plural wire name for this kind
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Host => "hosts",
            EntityKind::Application => "applications",
            EntityKind::Synthetic => "synthetics",
        }
    }

    /// Metric kinds billed against this resource kind
    pub fn metric_kinds(self) -> &'static [MetricKind] {
        match self {
            EntityKind::Host => &[MetricKind::Fullstack, MetricKind::Infra],
            EntityKind::Application => &[MetricKind::Rum, MetricKind::RumWithSr],
            EntityKind::Synthetic => &[
                MetricKind::BrowserMonitor,
                MetricKind::HttpMonitor,
                MetricKind::ThirdPartyMonitor,
            ],
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "host" | "hosts" => Ok(EntityKind::Host),
            "application" | "applications" => Ok(EntityKind::Application),
            "synthetic" | "synthetics" => Ok(EntityKind::Synthetic),
            other => Err(format!("unknown entity kind: {other}")),
        }
    }
}

/// Host monitoring tier
///
/// A host is billed either as full-stack or as infrastructure-only, never
/// both; a host with tier `None` is not actively monitored and never bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitoringTier {
    FullStack,
    Infrastructure,
    #[default]
    None,
}

impl MonitoringTier {
    /// Parse the upstream monitoring-mode string; unknown values degrade
    /// to `None` rather than failing.
    pub fn from_mode(mode: &str) -> Self {
        match mode.trim().to_ascii_uppercase().as_str() {
            "FULL_STACK" | "FULLSTACK" => MonitoringTier::FullStack,
            "INFRASTRUCTURE" | "INFRA" | "INFRASTRUCTURE_ONLY" => MonitoringTier::Infrastructure,
            _ => MonitoringTier::None,
        }
    }

    /// Whether this tier is actively monitored at all
    pub fn is_monitored(self) -> bool {
        !matches!(self, MonitoringTier::None)
    }

    /// The single metric kind that may carry usage for this tier
    pub fn metric_kind(self) -> Option<MetricKind> {
        match self {
            MonitoringTier::FullStack => Some(MetricKind::Fullstack),
            MonitoringTier::Infrastructure => Some(MetricKind::Infra),
            MonitoringTier::None => None,
        }
    }
}
