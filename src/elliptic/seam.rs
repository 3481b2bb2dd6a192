//! Seam stitching for composite bodies.
//!
//! A composite contour visits the gap between main element and flap twice,
//! once in each direction, so seam node `i` and its mirror `M - 1 - i` are the
//! same physical point. The row below a seam node is therefore row `j = 1` at
//! the mirror index, and the seam node is relaxed like an interior node whose
//! south neighbours are taken from the mirrored side:
//!
//! ```text
//!   (i-1,1) ---- (i,1) ---- (i+1,1)        upper side
//!      |           |           |
//!   (i-1,0) ---- (i,0) ---- (i+1,0)        seam, shared
//!      |           |           |
//!  (M-i,1) --- (M-1-i,1) --- (M-2-i,1)     lower side, mirrored
//! ```
//!
//! Only `y` moves; `x` stays on the seam line. The result is copied onto the
//! mirror so both sides stay coincident.

use std::ops::Range;

use faer::Mat;

use super::stencil::{NodeMetrics, Stencil};

/// Relaxed `y` of seam node `i` read from `(x, y)`.
///
/// Returns the current value if the node coefficients collapse.
#[inline]
pub(crate) fn seam_value(stencil: &Stencil, x: &Mat<f64>, y: &Mat<f64>, i: usize) -> f64 {
    let m = x.nrows();
    let k = m - 1 - i;

    let d = NodeMetrics {
        x_xi: (x[(i + 1, 0)] - x[(i - 1, 0)]) / (2.0 * stencil.d_xi),
        y_xi: (y[(i + 1, 0)] - y[(i - 1, 0)]) / (2.0 * stencil.d_xi),
        x_eta: (x[(i, 1)] - x[(k, 1)]) / (2.0 * stencil.d_eta),
        y_eta: (y[(i, 1)] - y[(k, 1)]) / (2.0 * stencil.d_eta),
    };
    let (alpha, beta, gamma) = (d.alpha(), d.beta(), d.gamma());
    let Some(factor) = stencil.factor(alpha, gamma) else {
        return y[(i, 0)];
    };

    let axis = (y[(i + 1, 0)], y[(i - 1, 0)], y[(i, 1)], y[(k, 1)]);
    let diag = (y[(i + 1, 1)], y[(m - 2 - i, 1)], y[(m - i, 1)], y[(i - 1, 1)]);
    factor * stencil.neighbour_sum(alpha, beta, gamma, axis, diag)
}

/// Stitch every seam node reading and writing the same arrays.
pub(crate) fn stitch_in_place(stencil: &Stencil, x: &mut Mat<f64>, y: &mut Mat<f64>, seam: Range<usize>) {
    let m = x.nrows();
    for i in seam {
        let v = seam_value(stencil, x, y, i);
        y[(i, 0)] = v;
        x[(m - 1 - i, 0)] = x[(i, 0)];
        y[(m - 1 - i, 0)] = v;
    }
}

/// Stitch every seam node reading the previous iterate.
pub(crate) fn stitch_from(
    stencil: &Stencil,
    old_x: &Mat<f64>,
    old_y: &Mat<f64>,
    x: &mut Mat<f64>,
    y: &mut Mat<f64>,
    seam: Range<usize>,
) {
    let m = x.nrows();
    for i in seam {
        let v = seam_value(stencil, old_x, old_y, i);
        y[(i, 0)] = v;
        x[(m - 1 - i, 0)] = x[(i, 0)];
        y[(m - 1 - i, 0)] = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat seam along `y = 0` between two symmetric sides.
    fn flat_seam(m: usize) -> (Mat<f64>, Mat<f64>) {
        let x = Mat::from_fn(m, 2, |i, _| {
            let k = i.min(m - 1 - i);
            k as f64
        });
        let y = Mat::from_fn(m, 2, |i, j| {
            if j == 0 {
                0.0
            } else if i < m / 2 {
                1.0
            } else {
                -1.0
            }
        });
        (x, y)
    }

    #[test]
    fn test_flat_seam_is_fixed_point() {
        let (x, y) = flat_seam(12);
        let s = Stencil::new(1.0 / 11.0, 1.0);
        for i in 2..5 {
            assert!(seam_value(&s, &x, &y, i).abs() < 1e-14);
        }
    }

    #[test]
    fn test_stitch_copies_to_mirror() {
        let (mut x, mut y) = flat_seam(12);
        y[(3, 0)] = 0.3;
        y[(8, 0)] = -0.2;
        x[(8, 0)] = 99.0;
        let s = Stencil::new(1.0 / 11.0, 1.0);
        stitch_in_place(&s, &mut x, &mut y, 2..5);
        for i in 2..5 {
            assert_eq!(x[(i, 0)], x[(11 - i, 0)]);
            assert_eq!(y[(i, 0)], y[(11 - i, 0)]);
        }
    }

    #[test]
    fn test_stitch_from_reads_old_values() {
        let (old_x, old_y) = flat_seam(12);
        let mut x = old_x.clone();
        let mut y = old_y.clone();
        y[(2, 0)] = 5.0;
        let s = Stencil::new(1.0 / 11.0, 1.0);
        stitch_from(&s, &old_x, &old_y, &mut x, &mut y, 3..4);
        assert!(y[(3, 0)].abs() < 1e-14);
        assert_eq!(y[(8, 0)], y[(3, 0)]);
    }
}
