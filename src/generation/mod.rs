//! Grid generation runner.
//!
//! This module provides a high-level interface that ties together:
//! - Boundary assembly (body contour and far-field circle)
//! - Interior seeding for elliptic relaxation
//! - One generator (elliptic, hyperbolic or parabolic)
//! - The fold check and quality report of the finished grid
//!
//! # Example
//! ```
//! use ogrid_rs::elliptic::{EllipticConfig, EllipticMode, IterationMethod};
//! use ogrid_rs::generation::{GeneratorChoice, GridConfig, GridGenerator};
//! use ogrid_rs::grid::{BoundaryContour, Naca4};
//!
//! let contour = BoundaryContour::naca4(Naca4::from_digits(0, 0, 12, 1.0), 41).unwrap();
//! let config = GridConfig::default()
//!     .with_radius(10.0)
//!     .with_n_eta(21)
//!     .with_generator(GeneratorChoice::Elliptic {
//!         config: EllipticConfig::default()
//!             .with_method(IterationMethod::GaussSeidel)
//!             .with_tolerance(1e-6),
//!         mode: EllipticMode::Laplace,
//!     });
//!
//! let result = GridGenerator::new(contour, config).run().unwrap();
//! println!("{} sweeps, {:.2}s", result.report.steps, result.report.wall_time);
//! ```

mod runner;

pub use runner::{
    GenerationReport, GenerationResult, GeneratorChoice, GeneratorOutcome, GridConfig, GridGenerator,
};
