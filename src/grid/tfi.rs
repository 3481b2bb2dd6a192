//! Algebraic interior seeding.
//!
//! The elliptic solver needs a feasible starting grid. For an O-grid the two
//! ξ boundaries are the same periodic cut, so transfinite interpolation
//! reduces to blending each ξ line between its body node and its far-field
//! node:
//!
//! `r(i, j) = (1 - s_j) · r(i, 0) + s_j · r(i, N - 1)`
//!
//! with `s_j` taken from a [`Stretching`] distribution.

use super::stretching::{Stretching, UniformStretching};
use super::structured::StructuredGrid;

/// Produces an interior grid from the fixed boundary rows.
pub trait InteriorInitializer {
    /// Overwrite rows `1..N-1` of `grid`.
    fn initialize(&self, grid: &mut StructuredGrid);

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

/// Linear transfinite interpolation between body and far field.
#[derive(Clone, Debug)]
pub struct TransfiniteInterpolation<S: Stretching = UniformStretching> {
    /// Radial blending distribution.
    pub stretching: S,
}

impl Default for TransfiniteInterpolation<UniformStretching> {
    fn default() -> Self {
        Self {
            stretching: UniformStretching,
        }
    }
}

impl<S: Stretching> TransfiniteInterpolation<S> {
    /// Interpolation along a custom radial distribution.
    pub fn with_stretching(stretching: S) -> Self {
        Self { stretching }
    }
}

impl<S: Stretching> InteriorInitializer for TransfiniteInterpolation<S> {
    fn initialize(&self, grid: &mut StructuredGrid) {
        let n = grid.n;
        let s = self.stretching.distribution(n);

        for (j, &t) in s.iter().enumerate().take(n - 1).skip(1) {
            for i in 0..grid.m {
                let (xb, yb) = grid.point(i, 0);
                let (xf, yf) = grid.point(i, n - 1);
                grid.set_point(i, j, ((1.0 - t) * xb + t * xf, (1.0 - t) * yb + t * yf));
            }
        }
    }

    fn name(&self) -> &'static str {
        "transfinite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{BoundaryAssembler, BoundaryContour, GeometricStretching};

    #[test]
    fn test_tfi_circle_is_concentric() {
        let contour = BoundaryContour::circle(1.0, 33).unwrap();
        let mut grid = BoundaryAssembler::assemble(&contour, 10.0, 11).unwrap();
        TransfiniteInterpolation::default().initialize(&mut grid);

        for j in 0..11 {
            let expected = 1.0 + 9.0 * j as f64 / 10.0;
            for i in 0..33 {
                let (x, y) = grid.point(i, j);
                let r = (x * x + y * y).sqrt();
                assert!((r - expected).abs() < 1e-12, "r={} expected {}", r, expected);
            }
        }
        assert_eq!(grid.periodic_mismatch(), 0.0);
    }

    #[test]
    fn test_tfi_with_stretching_clusters_body() {
        let contour = BoundaryContour::circle(1.0, 17).unwrap();
        let mut grid = BoundaryAssembler::assemble(&contour, 10.0, 9).unwrap();
        TransfiniteInterpolation::with_stretching(GeometricStretching::new(1.4)).initialize(&mut grid);

        let r = |j: usize| {
            let (x, y) = grid.point(3, j);
            (x * x + y * y).sqrt()
        };
        assert!(r(1) - r(0) < r(8) - r(7));
    }
}
