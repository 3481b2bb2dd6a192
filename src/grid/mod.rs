//! Grid representation.
//!
//! Provides the data structures every generator operates on:
//! - Closed body contours with optional seam markers (composite bodies)
//! - The structured `M × N` O-grid and its topology metadata
//! - Boundary assembly (body row and far-field circle)
//! - Radial stretching functions and algebraic interior seeding

mod boundary;
mod contour;
mod stretching;
mod structured;
mod tfi;

pub use boundary::BoundaryAssembler;
pub use contour::{BoundaryContour, JoinSpec, Naca4, SurfaceMarker};
pub use stretching::{GeometricStretching, Stretching, UniformStretching};
pub use structured::{StructuredGrid, Topology};
pub use tfi::{InteriorInitializer, TransfiniteInterpolation};

pub(crate) use contour::SEAM_MATCH_TOL;
pub(crate) use structured::max_abs_diff;
