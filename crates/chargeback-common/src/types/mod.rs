//! Core data types for the chargeback system

pub mod metric;
pub mod topology;
pub mod usage;
