//! Nine-point finite-difference stencil of the winslow equations.
//!
//! For an interior node the discretised system
//!
//! ```text
//! α x_ξξ − 2β x_ξη + γ x_ηη = −I² (P x_ξ + Q x_η)
//! α y_ξξ − 2β y_ξη + γ y_ηη = −I² (P y_ξ + Q y_η)
//! ```
//!
//! is solved for the centre value with the coefficients frozen from the
//! current neighbours:
//!
//! ```text
//! x_new = (Δξ Δη)² / (2 (α Δη² + γ Δξ²)) · [ α/Δξ² (x_E + x_W) + γ/Δη² (x_N + x_S)
//!         − β/(2 Δξ Δη) (x_NE − x_SE + x_SW − x_NW) + I² (P x_ξ + Q x_η) ]
//! ```
//!
//! The east neighbour index is passed explicitly so the periodic node
//! `i = M - 1` can use node `1` across the cut.

use faer::Mat;

/// Parametric spacings and derived factors, shared by every node.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Stencil {
    pub d_xi: f64,
    pub d_eta: f64,
    d_xi2: f64,
    d_eta2: f64,
    cross: f64,
    scale: f64,
}

/// Metric coefficients of one node.
#[derive(Clone, Copy, Debug)]
pub(crate) struct NodeMetrics {
    pub x_xi: f64,
    pub y_xi: f64,
    pub x_eta: f64,
    pub y_eta: f64,
}

impl NodeMetrics {
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.x_eta * self.x_eta + self.y_eta * self.y_eta
    }

    #[inline]
    pub fn beta(&self) -> f64 {
        self.x_xi * self.x_eta + self.y_xi * self.y_eta
    }

    #[inline]
    pub fn gamma(&self) -> f64 {
        self.x_xi * self.x_xi + self.y_xi * self.y_xi
    }

    #[inline]
    pub fn jacobian(&self) -> f64 {
        self.x_xi * self.y_eta - self.x_eta * self.y_xi
    }
}

impl Stencil {
    pub fn new(d_xi: f64, d_eta: f64) -> Self {
        Self {
            d_xi,
            d_eta,
            d_xi2: d_xi * d_xi,
            d_eta2: d_eta * d_eta,
            cross: 1.0 / (2.0 * d_xi * d_eta),
            scale: (d_xi * d_eta) * (d_xi * d_eta),
        }
    }

    /// Central first derivatives at `(i, j)` with east neighbour `ip`.
    #[inline]
    pub fn metrics(&self, x: &Mat<f64>, y: &Mat<f64>, i: usize, ip: usize, j: usize) -> NodeMetrics {
        NodeMetrics {
            x_xi: (x[(ip, j)] - x[(i - 1, j)]) / (2.0 * self.d_xi),
            y_xi: (y[(ip, j)] - y[(i - 1, j)]) / (2.0 * self.d_xi),
            x_eta: (x[(i, j + 1)] - x[(i, j - 1)]) / (2.0 * self.d_eta),
            y_eta: (y[(i, j + 1)] - y[(i, j - 1)]) / (2.0 * self.d_eta),
        }
    }

    /// `(Δξ Δη)² / (2 (α Δη² + γ Δξ²))`, or `None` for a collapsed node.
    #[inline]
    pub fn factor(&self, alpha: f64, gamma: f64) -> Option<f64> {
        let denom = 2.0 * (alpha * self.d_eta2 + gamma * self.d_xi2);
        (denom > 0.0 && denom.is_finite()).then(|| self.scale / denom)
    }

    /// Weighted neighbour sum of one coordinate field.
    ///
    /// `east`, `west`, `north`, `south` are the four axis neighbours and
    /// `ne`, `se`, `sw`, `nw` the diagonals.
    #[inline]
    pub fn neighbour_sum(
        &self,
        alpha: f64,
        beta: f64,
        gamma: f64,
        (east, west, north, south): (f64, f64, f64, f64),
        (ne, se, sw, nw): (f64, f64, f64, f64),
    ) -> f64 {
        alpha / self.d_xi2 * (east + west) + gamma / self.d_eta2 * (north + south)
            - beta * self.cross * (ne - se + sw - nw)
    }

    /// New `(x, y)` at interior node `(i, j)`.
    ///
    /// `forcing` carries `(P_i, Q_j)` in Poisson mode. A node whose
    /// coefficients collapse keeps its current value.
    #[inline]
    pub fn relax(
        &self,
        x: &Mat<f64>,
        y: &Mat<f64>,
        i: usize,
        ip: usize,
        j: usize,
        forcing: Option<(f64, f64)>,
    ) -> (f64, f64) {
        let d = self.metrics(x, y, i, ip, j);
        let (alpha, beta, gamma) = (d.alpha(), d.beta(), d.gamma());
        let Some(factor) = self.factor(alpha, gamma) else {
            return (x[(i, j)], y[(i, j)]);
        };

        let (im, jm, jp) = (i - 1, j - 1, j + 1);
        let gather = |f: &Mat<f64>| {
            (
                (f[(ip, j)], f[(im, j)], f[(i, jp)], f[(i, jm)]),
                (f[(ip, jp)], f[(ip, jm)], f[(im, jm)], f[(im, jp)]),
            )
        };

        let (axis, diag) = gather(x);
        let mut sx = self.neighbour_sum(alpha, beta, gamma, axis, diag);
        let (axis, diag) = gather(y);
        let mut sy = self.neighbour_sum(alpha, beta, gamma, axis, diag);

        if let Some((p, q)) = forcing {
            let jac = d.jacobian();
            let i2 = jac * jac;
            sx += i2 * (p * d.x_xi + q * d.x_eta);
            sy += i2 * (p * d.y_xi + q * d.y_eta);
        }

        (factor * sx, factor * sy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Uniform Cartesian lattice `x = i Δξ`, `y = j Δη` on `m × n` nodes.
    fn lattice(m: usize, n: usize, sx: f64, sy: f64) -> (Mat<f64>, Mat<f64>) {
        let dxi = 1.0 / (m - 1) as f64;
        let deta = 1.0 / (n - 1) as f64;
        (
            Mat::from_fn(m, n, |i, _| sx * i as f64 * dxi),
            Mat::from_fn(m, n, |_, j| sy * j as f64 * deta),
        )
    }

    #[test]
    fn test_metrics_on_lattice() {
        let (x, y) = lattice(5, 5, 2.0, 3.0);
        let s = Stencil::new(0.25, 0.25);
        let d = s.metrics(&x, &y, 2, 3, 2);
        assert!((d.x_xi - 2.0).abs() < 1e-14);
        assert!((d.y_eta - 3.0).abs() < 1e-14);
        assert!(d.x_eta.abs() < 1e-14);
        assert!(d.y_xi.abs() < 1e-14);
        assert!((d.jacobian() - 6.0).abs() < 1e-13);
        assert!(d.beta().abs() < 1e-14);
    }

    #[test]
    fn test_lattice_is_fixed_point() {
        let (x, y) = lattice(6, 7, 1.5, 0.5);
        let s = Stencil::new(0.2, 1.0 / 6.0);
        for j in 1..6 {
            for i in 1..5 {
                let (nx, ny) = s.relax(&x, &y, i, i + 1, j, None);
                assert!((nx - x[(i, j)]).abs() < 1e-13, "x at ({}, {})", i, j);
                assert!((ny - y[(i, j)]).abs() < 1e-13, "y at ({}, {})", i, j);
            }
        }
    }

    #[test]
    fn test_sheared_lattice_is_fixed_point() {
        // Affine maps satisfy the homogeneous system exactly.
        let m = 6;
        let n = 6;
        let x = Mat::from_fn(m, n, |i, j| i as f64 * 0.2 + 0.3 * j as f64 * 0.2);
        let y = Mat::from_fn(m, n, |i, j| -0.1 * i as f64 * 0.2 + j as f64 * 0.2);
        let s = Stencil::new(0.2, 0.2);
        let (nx, ny) = s.relax(&x, &y, 2, 3, 3, None);
        assert!((nx - x[(2, 3)]).abs() < 1e-13);
        assert!((ny - y[(2, 3)]).abs() < 1e-13);
    }

    #[test]
    fn test_collapsed_node_keeps_value() {
        let x = Mat::from_fn(3, 3, |_, _| 1.0);
        let y = Mat::from_fn(3, 3, |_, _| 2.0);
        let s = Stencil::new(0.5, 0.5);
        assert_eq!(s.relax(&x, &y, 1, 2, 1, Some((1.0, 1.0))), (1.0, 2.0));
    }

    #[test]
    fn test_forcing_shifts_node() {
        let (x, y) = lattice(5, 5, 1.0, 1.0);
        let s = Stencil::new(0.25, 0.25);
        let (_, y0) = s.relax(&x, &y, 2, 3, 2, None);
        let (_, y1) = s.relax(&x, &y, 2, 3, 2, Some((0.0, -5.0)));
        assert!(y1 < y0);
    }
}
