//! Marching grid generators.
//!
//! Both generators build the grid one radial layer at a time, starting from
//! the body row, by solving a block-tridiagonal system over the ξ nodes of
//! each layer:
//!
//! - [`HyperbolicGridSolver`]: orthogonality plus prescribed cell area
//!   (Steger–Chaussee type)
//! - [`ParabolicGridSolver`]: elliptic operator frozen between the previous
//!   layer and a target on the next one, geometric radial distribution
//!
//! The periodic endpoints `i = 0` and `i = M - 1` are one node. The parabolic
//! march and the hyperbolic march at a sharp corner place it first and pass it
//! to the system as a known value; on a smooth contour the hyperbolic march
//! solves it together with the other nodes in a periodic system.
//!
//! All work happens on a scratch copy of the coordinates; the grid is only
//! updated when every layer succeeds.

mod block;
mod hyperbolic;
mod parabolic;

pub use block::{Block2, BlockTridiagonal, SingularPivot, Vec2};
pub use hyperbolic::{HyperbolicConfig, HyperbolicGridSolver};
pub use parabolic::{ParabolicConfig, ParabolicGridSolver};

use faer::Mat;
use thiserror::Error;

/// Failure of a marching generator. The grid is left as it was before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarchingError {
    /// A 2×2 block could not be inverted.
    #[error("Singular block at layer {layer}, index {index} (det={determinant:.3e})")]
    SingularBlock {
        layer: usize,
        index: usize,
        determinant: f64,
    },

    /// Body tangent of zero length, no normal direction.
    #[error("Degenerate body tangent at index {index}")]
    DegenerateTangent { index: usize },

    /// The endpoint ray needs contour point 0 strictly between origin and far field.
    #[error("Contour point 0 at distance {distance} from the origin cannot anchor the endpoint ray (R={radius})")]
    DegenerateRay { distance: f64, radius: f64 },

    /// Two consecutive layers of the radial distribution coincide.
    #[error("Radial gap {gap:.3e} before layer {layer} does not separate the layers")]
    DegenerateSpacing { layer: usize, gap: f64 },

    /// A layer produced NaN or infinite coordinates.
    #[error("Non-finite coordinates in layer {layer}")]
    NonFiniteLayer { layer: usize },
}

/// Summary of a completed march.
#[derive(Clone, Debug)]
pub struct MarchReport {
    /// Generator name.
    pub generator: &'static str,
    /// Layers computed.
    pub layers: usize,
    /// Smallest node displacement between consecutive layers.
    pub min_step: f64,
    /// Largest node displacement between consecutive layers.
    pub max_step: f64,
    /// Wall-clock seconds.
    pub wall_time: f64,
}

/// `(min, max)` of `|r(i, j) - r(i, j - 1)|` over `j` in `1..=last`.
pub(crate) fn step_range(x: &Mat<f64>, y: &Mat<f64>, last: usize) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi: f64 = 0.0;
    for j in 1..=last {
        for i in 0..x.nrows() {
            let d = (x[(i, j)] - x[(i, j - 1)]).hypot(y[(i, j)] - y[(i, j - 1)]);
            lo = lo.min(d);
            hi = hi.max(d);
        }
    }
    (lo, hi)
}

/// True if every node of column `j` is finite.
pub(crate) fn layer_is_finite(x: &Mat<f64>, y: &Mat<f64>, j: usize) -> bool {
    (0..x.nrows()).all(|i| x[(i, j)].is_finite() && y[(i, j)].is_finite())
}

/// Node `(i, j)` as a [`Vec2`].
#[inline]
pub(crate) fn node(x: &Mat<f64>, y: &Mat<f64>, i: usize, j: usize) -> Vec2 {
    Vec2::new(x[(i, j)], y[(i, j)])
}

/// Write a [`Vec2`] into node `(i, j)`.
#[inline]
pub(crate) fn set_node(x: &mut Mat<f64>, y: &mut Mat<f64>, i: usize, j: usize, v: Vec2) {
    x[(i, j)] = v.x;
    y[(i, j)] = v.y;
}
