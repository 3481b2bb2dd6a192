//! Elliptic grid generation.
//!
//! Relaxes the interior of an O-grid by solving the Winslow system
//! (Laplace or Poisson) with point iteration:
//!
//! - [`IterationMethod::Jacobi`]: reads the previous iterate only
//! - [`IterationMethod::GaussSeidel`]: reads freshly updated neighbours
//! - [`IterationMethod::Sor`]: Gauss-Seidel blended by a relaxation factor
//!
//! The periodic cut and, for composite bodies, the seam between main element
//! and flap are updated every sweep so both stay closed.

mod config;
mod forcing;
mod seam;
mod solver;
mod stencil;

pub use config::{EllipticConfig, IterationMethod};
pub use forcing::{ForcingTerm, PoissonForcing};
pub use solver::{CheckpointAction, ConvergenceStatus, EllipticGridSolver, EllipticMode, SolveReport};
