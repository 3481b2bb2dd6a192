//! Error types shared across the grid generators.
//!
//! Each concern has its own error enum (geometry, configuration, marching,
//! metrics, export). [`GridError`] wraps all of them so the pipeline runner in
//! [`crate::generation`] can propagate with `?`.
//!
//! Two conditions are deliberately *not* errors:
//! - a forcing-function denominator that is exactly zero (the contribution is
//!   defined to be zero, see [`crate::elliptic::ForcingTerm`]);
//! - hitting the iteration cap before the tolerance (reported through
//!   [`crate::elliptic::ConvergenceStatus`]).

use thiserror::Error;

use crate::io::ExportError;
use crate::marching::MarchingError;
use crate::metrics::MetricError;

/// Malformed body contour or grid dimensions.
///
/// Raised before any iteration starts; fatal to the current call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Contour has too few points to close a body.
    #[error("Contour needs at least 3 points, got {0}")]
    TooFewPoints(usize),

    /// A contour coordinate is NaN or infinite.
    #[error("Non-finite contour coordinate at index {index}: ({x}, {y})")]
    NonFinite { index: usize, x: f64, y: f64 },

    /// Not enough radial nodes for an interior.
    #[error("Need at least 3 nodes along eta, got {0}")]
    TooFewLayers(usize),

    /// Outer radius is not a positive finite number.
    #[error("Outer radius must be positive and finite, got {0}")]
    InvalidRadius(f64),

    /// Marker sequence does not cover the contour.
    #[error("Seam marker count {markers} does not match contour size {points}")]
    MarkerMismatch { markers: usize, points: usize },

    /// Seam node whose mirror node is not marked as seam.
    #[error("Seam node {index} has mirror {mirror} outside the seam")]
    UnmirroredSeam { index: usize, mirror: usize },

    /// Seam node and its mirror do not coincide.
    #[error("Seam node {index} and mirror {mirror} are {gap:.3e} apart")]
    SeamGap { index: usize, mirror: usize, gap: f64 },

    /// Seam run touches the periodic cut or crosses the contour midpoint.
    #[error("Seam run [{start}, {end}) is not inside the first half of the contour")]
    SeamOutOfRange { start: usize, end: usize },

    /// Contour construction request that cannot be satisfied.
    #[error("Invalid contour: {0}")]
    InvalidContour(String),
}

/// Invalid solver configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// SOR relaxation factor outside (0, 2).
    #[error("Relaxation factor omega={0} outside (0, 2)")]
    InvalidOmega(f64),

    /// Tolerance must be positive.
    #[error("Tolerance must be positive and finite, got {0}")]
    InvalidTolerance(f64),

    /// Iteration cap of zero.
    #[error("max_iterations must be at least 1")]
    ZeroIterations,

    /// Checkpoint interval of zero.
    #[error("Checkpoint interval must be at least 1")]
    ZeroCheckpointInterval,

    /// Marching spacing parameter out of range.
    #[error("Invalid marching parameter {name}={value}")]
    InvalidMarching { name: &'static str, value: f64 },
}

/// Umbrella error for the generation pipeline.
#[derive(Debug, Error)]
pub enum GridError {
    /// Malformed contour or dimensions.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Singular block in a marching solve.
    #[error(transparent)]
    Marching(#[from] MarchingError),

    /// Folded grid detected by the metric check.
    #[error(transparent)]
    Metric(#[from] MetricError),

    /// Export failure.
    #[error(transparent)]
    Export(#[from] ExportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_error_messages() {
        let err = GeometryError::TooFewPoints(2);
        assert_eq!(err.to_string(), "Contour needs at least 3 points, got 2");

        let err = GeometryError::SeamGap {
            index: 4,
            mirror: 36,
            gap: 0.5,
        };
        assert!(err.to_string().contains("5.000e-1"));
    }

    #[test]
    fn test_grid_error_wraps_config() {
        let err: GridError = ConfigError::InvalidOmega(2.5).into();
        assert!(matches!(err, GridError::Config(ConfigError::InvalidOmega(_))));
        assert!(err.to_string().contains("omega=2.5"));
    }
}
