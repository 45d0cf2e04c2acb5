//! # Chargeback Engine
//!
//! Attributes metered monitoring usage to a hierarchy of delivery groups
//! (DGs) and information systems (ISs) and rolls the attributed usage into
//! hierarchical totals for a chargeback report.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       ReportBuilder                          │
//! │                                                              │
//! │  per resource:                                               │
//! │  ┌──────────┐   ┌───────────┐   ┌─────────────┐              │
//! │  │  Rules   │──▶│  Resolver │──▶│ Distributor │──┐           │
//! │  │ (billable│   │ (charged  │   │ (split per  │  │           │
//! │  │ /managed)│   │  groups)  │   │  charged DG)│  │           │
//! │  └──────────┘   └───────────┘   └─────────────┘  ▼           │
//! │                              ┌──────────────────────────┐    │
//! │  unassigned usage ──────────▶│       Report tree        │    │
//! │  (shared dedup tracker)      │  DG ▶ IS ▶ kind buckets  │    │
//! │                              └────────────┬─────────────┘    │
//! │                                           ▼                  │
//! │                              ┌──────────────────────────┐    │
//! │                              │   Aggregator (one pass)  │    │
//! │                              └──────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine is synchronous and single-threaded: it consumes immutable
//! topology and usage snapshots (see `chargeback-collect`) and mutates one
//! report tree sequentially. The dedup invariants hold only under
//! sequential placement.

pub mod aggregate;
pub mod config;
pub mod distribute;
pub mod report;
pub mod resolver;
pub mod rules;
pub mod tree;
pub mod unassigned;

// Re-export core types
pub use aggregate::aggregate;
pub use config::ReportConfig;
pub use distribute::{distribute, Attributable};
pub use report::ReportBuilder;
pub use resolver::{resolve, ChargeTargets};
pub use rules::ManagedLists;
pub use tree::{EntityEntry, GroupNode, IsNode, KindBuckets, PlacementTracker, Report, Totals};

/// Name of the synthetic group that absorbs resources with no DG membership
pub const UNASSIGNED_GROUP: &str = "Unassigned";

/// Default fallback group absorbing managed and non-billable usage
pub const DEFAULT_FALLBACK_GROUP: &str = "Central Operations";

/// Tolerance for floating-point usage comparisons
pub const USAGE_EPSILON: f64 = 1e-9;
