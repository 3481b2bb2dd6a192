//! Post-generation grid diagnostics.
//!
//! Quality checks run on a finished grid and never modify it. They build on
//! the metric tensor from [`crate::metrics`] and add cell-level measures
//! (skewness, aspect ratio, wall orthogonality) with configurable warning
//! thresholds.

mod quality;

pub use quality::{GridQuality, QualityThresholds, QualityWarning};
