//! Metric tensor of the grid transformation.
//!
//! The grid maps the unit parameter square `(ξ, η)` onto the physical domain.
//! Its derivatives give the Jacobian and the metric tensors used by flow
//! solvers working in transformed coordinates:
//!
//! ```text
//! J       = x_ξ y_η − x_η y_ξ
//! g11_cov = x_ξ² + y_ξ²        g11 = g22_cov / J²
//! g12_cov = x_ξ x_η + y_ξ y_η  g12 = −g12_cov / J²
//! g22_cov = x_η² + y_η²        g22 = g11_cov / J²
//! ```
//!
//! Derivatives are central in the interior, first-order one-sided on the body
//! and far-field rows, and periodic across the cut: node `0` uses nodes `1`
//! and `M - 2`, node `M - 1` copies node `0`.

use faer::Mat;
use thiserror::Error;

use crate::grid::StructuredGrid;

/// Orientation of a valid grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JacobianSign {
    /// `J > 0` everywhere (clockwise ξ, outward η).
    Positive,
    /// `J < 0` everywhere.
    Negative,
}

/// Grid validity failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    /// Jacobian changes sign or vanishes.
    #[error("Folded grid: Jacobian {jacobian:.3e} at node ({i}, {j})")]
    FoldedGrid { i: usize, j: usize, jacobian: f64 },

    /// A node coordinate is NaN or infinite.
    #[error("Non-finite coordinates at node ({i}, {j})")]
    NonFiniteGrid { i: usize, j: usize },
}

/// Derivatives, Jacobian and metric tensors at every node.
#[derive(Clone, Debug)]
pub struct MetricTensor {
    /// ∂x/∂ξ
    pub x_xi: Mat<f64>,
    /// ∂x/∂η
    pub x_eta: Mat<f64>,
    /// ∂y/∂ξ
    pub y_xi: Mat<f64>,
    /// ∂y/∂η
    pub y_eta: Mat<f64>,
    /// Transformation Jacobian.
    pub jacobian: Mat<f64>,
    /// Covariant components.
    pub g11_cov: Mat<f64>,
    pub g12_cov: Mat<f64>,
    pub g22_cov: Mat<f64>,
    /// Contravariant components.
    pub g11: Mat<f64>,
    pub g12: Mat<f64>,
    pub g22: Mat<f64>,
}

impl MetricTensor {
    /// Compute all fields from the grid coordinates.
    pub fn compute(grid: &StructuredGrid) -> Self {
        let (m, n) = (grid.m, grid.n);
        let (d_xi, d_eta) = (grid.d_xi(), grid.d_eta());
        let (x, y) = (&grid.x, &grid.y);

        let xi_diff = |f: &Mat<f64>, i: usize, j: usize| -> f64 {
            let (ip, im) = match i {
                0 => (1, m - 2),
                _ if i == m - 1 => (1, m - 2),
                _ => (i + 1, i - 1),
            };
            (f[(ip, j)] - f[(im, j)]) / (2.0 * d_xi)
        };
        let eta_diff = |f: &Mat<f64>, i: usize, j: usize| -> f64 {
            match j {
                0 => (f[(i, 1)] - f[(i, 0)]) / d_eta,
                _ if j == n - 1 => (f[(i, j)] - f[(i, j - 1)]) / d_eta,
                _ => (f[(i, j + 1)] - f[(i, j - 1)]) / (2.0 * d_eta),
            }
        };

        let x_xi = Mat::from_fn(m, n, |i, j| xi_diff(x, i, j));
        let y_xi = Mat::from_fn(m, n, |i, j| xi_diff(y, i, j));
        // The cut node reuses node 0 so both carry identical metrics.
        let x_eta = Mat::from_fn(m, n, |i, j| eta_diff(x, if i == m - 1 { 0 } else { i }, j));
        let y_eta = Mat::from_fn(m, n, |i, j| eta_diff(y, if i == m - 1 { 0 } else { i }, j));

        let jacobian = Mat::from_fn(m, n, |i, j| x_xi[(i, j)] * y_eta[(i, j)] - x_eta[(i, j)] * y_xi[(i, j)]);
        let g11_cov = Mat::from_fn(m, n, |i, j| x_xi[(i, j)].powi(2) + y_xi[(i, j)].powi(2));
        let g12_cov = Mat::from_fn(m, n, |i, j| x_xi[(i, j)] * x_eta[(i, j)] + y_xi[(i, j)] * y_eta[(i, j)]);
        let g22_cov = Mat::from_fn(m, n, |i, j| x_eta[(i, j)].powi(2) + y_eta[(i, j)].powi(2));

        let j2 = |i: usize, j: usize| jacobian[(i, j)] * jacobian[(i, j)];
        let g11 = Mat::from_fn(m, n, |i, j| g22_cov[(i, j)] / j2(i, j));
        let g12 = Mat::from_fn(m, n, |i, j| -g12_cov[(i, j)] / j2(i, j));
        let g22 = Mat::from_fn(m, n, |i, j| g11_cov[(i, j)] / j2(i, j));

        Self {
            x_xi,
            x_eta,
            y_xi,
            y_eta,
            jacobian,
            g11_cov,
            g12_cov,
            g22_cov,
            g11,
            g12,
            g22,
        }
    }

    /// Node counts `(M, N)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.jacobian.nrows(), self.jacobian.ncols())
    }

    /// Smallest and largest Jacobian.
    pub fn jacobian_range(&self) -> (f64, f64) {
        let (m, n) = self.shape();
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for j in 0..n {
            for i in 0..m {
                lo = lo.min(self.jacobian[(i, j)]);
                hi = hi.max(self.jacobian[(i, j)]);
            }
        }
        (lo, hi)
    }

    /// Verify the Jacobian keeps one sign everywhere.
    ///
    /// The sign of node `(0, 0)` is the reference; the first node (scanning
    /// `j` outer, `i` inner) that is zero, non-finite or of the opposite sign
    /// is reported.
    pub fn check_jacobian(&self) -> Result<JacobianSign, MetricError> {
        let (m, n) = self.shape();
        let reference = self.jacobian[(0, 0)];
        let sign = if reference > 0.0 {
            JacobianSign::Positive
        } else if reference < 0.0 {
            JacobianSign::Negative
        } else {
            return Err(MetricError::FoldedGrid {
                i: 0,
                j: 0,
                jacobian: reference,
            });
        };

        for j in 0..n {
            for i in 0..m {
                let jac = self.jacobian[(i, j)];
                let ok = match sign {
                    JacobianSign::Positive => jac > 0.0,
                    JacobianSign::Negative => jac < 0.0,
                };
                if !(ok && jac.is_finite()) {
                    return Err(MetricError::FoldedGrid { i, j, jacobian: jac });
                }
            }
        }
        Ok(sign)
    }
}
