//! # ogrid-rs
//!
//! Structured O-grid generation around airfoil contours.
//!
//! This crate provides the building blocks for body-fitted grids:
//! - Body contours (NACA 4-digit sections, circles, main element plus flap)
//! - Boundary assembly and algebraic interior seeding
//! - Elliptic relaxation (Laplace and Poisson, Jacobi/Gauss-Seidel/SOR)
//! - Hyperbolic and parabolic marching with 2×2 block-tridiagonal solves
//! - Metric tensors, Jacobian fold checks and quality reports
//! - Text, VTK and SU2 output
//!
//! # Example
//!
//! ```
//! use ogrid_rs::grid::{BoundaryContour, Naca4};
//! use ogrid_rs::io::{VtkExporter, export};
//! use ogrid_rs::{GridConfig, GridGenerator};
//!
//! let contour = BoundaryContour::naca4(Naca4::from_digits(0, 0, 12, 1.0), 41).unwrap();
//! let config = GridConfig::default().with_radius(10.0).with_n_eta(21);
//!
//! let result = GridGenerator::new(contour, config).run().unwrap();
//! assert!(result.report.quality.is_valid());
//!
//! let dir = std::env::temp_dir();
//! export(&result.grid, &VtkExporter::default(), dir.join("naca0012.vts")).unwrap();
//! ```

pub mod analysis;
pub mod elliptic;
pub mod error;
pub mod generation;
pub mod grid;
pub mod io;
pub mod marching;
pub mod metrics;

// Re-export main types for convenience
pub use analysis::{GridQuality, QualityThresholds, QualityWarning};
pub use elliptic::{
    CheckpointAction, ConvergenceStatus, EllipticConfig, EllipticGridSolver, EllipticMode,
    ForcingTerm, IterationMethod, PoissonForcing, SolveReport,
};
pub use error::{ConfigError, GeometryError, GridError};
pub use generation::{GenerationReport, GenerationResult, GeneratorChoice, GridConfig, GridGenerator};
pub use grid::{
    BoundaryAssembler, BoundaryContour, InteriorInitializer, Naca4, StructuredGrid, SurfaceMarker,
    TransfiniteInterpolation,
};
pub use io::{ExportError, MeshExporter, Su2Exporter, TextMeshExporter, VtkExporter, export};
pub use marching::{
    HyperbolicConfig, HyperbolicGridSolver, MarchReport, MarchingError, ParabolicConfig,
    ParabolicGridSolver,
};
pub use metrics::{JacobianSign, MetricError, MetricTensor};
