//! Structured O-grid storage.
//!
//! Coordinates are stored as two `M × N` matrices, `x[(i, j)]` and `y[(i, j)]`,
//! with `i` running along the body (ξ, periodic) and `j` running outward
//! (η, body at `j = 0`, far field at `j = N - 1`).
//!
//! Node layout for `M = 5`, `N = 3`:
//!
//! ```text
//!  j=2   (0,2)--(1,2)--(2,2)--(3,2)--(4,2)   far field
//!          |      |      |      |      |
//!  j=1   (0,1)--(1,1)--(2,1)--(3,1)--(4,1)
//!          |      |      |      |      |
//!  j=0   (0,0)--(1,0)--(2,0)--(3,0)--(4,0)   body
//!          ^                           ^
//!          +------- same location -----+
//! ```

use std::ops::Range;

use faer::Mat;

use super::contour::{SurfaceMarker, seam_run};
use crate::error::GeometryError;

/// Grid topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Topology {
    /// Wraps fully around a closed body; ξ is periodic.
    #[default]
    O,
}

/// Structured curvilinear grid around a closed body.
#[derive(Clone, Debug)]
pub struct StructuredGrid {
    /// Node count along ξ (body-tangential).
    pub m: usize,
    /// Node count along η (wall-normal).
    pub n: usize,
    /// x coordinates, `m × n`.
    pub x: Mat<f64>,
    /// y coordinates, `m × n`.
    pub y: Mat<f64>,
    /// Outer boundary radius.
    pub radius: f64,
    /// Grid topology.
    pub topology: Topology,
    /// Seam markers over row `j = 0` (composite bodies only).
    markers: Option<Vec<SurfaceMarker>>,
    /// First seam run, cached from the markers.
    seam: Option<Range<usize>>,
}

impl StructuredGrid {
    /// Allocate a zeroed `m × n` O-grid.
    pub fn new(m: usize, n: usize, radius: f64) -> Result<Self, GeometryError> {
        if m < 3 {
            return Err(GeometryError::TooFewPoints(m));
        }
        if n < 3 {
            return Err(GeometryError::TooFewLayers(n));
        }
        if !(radius.is_finite() && radius > 0.0) {
            return Err(GeometryError::InvalidRadius(radius));
        }

        Ok(Self {
            m,
            n,
            x: Mat::zeros(m, n),
            y: Mat::zeros(m, n),
            radius,
            topology: Topology::O,
            markers: None,
            seam: None,
        })
    }

    /// Attach seam markers; validated against the current body row.
    pub fn set_markers(&mut self, markers: Vec<SurfaceMarker>) -> Result<(), GeometryError> {
        let body = self.row(0);
        self.seam = seam_run(&markers, &body)?;
        self.markers = Some(markers);
        Ok(())
    }

    /// Parametric spacing along ξ.
    #[inline]
    pub fn d_xi(&self) -> f64 {
        1.0 / (self.m - 1) as f64
    }

    /// Parametric spacing along η.
    #[inline]
    pub fn d_eta(&self) -> f64 {
        1.0 / (self.n - 1) as f64
    }

    /// True for a single body (no seam markers).
    pub fn is_airfoil_alone(&self) -> bool {
        self.markers.is_none()
    }

    /// Seam markers, if any.
    pub fn markers(&self) -> Option<&[SurfaceMarker]> {
        self.markers.as_deref()
    }

    /// Index range of the seam run on the body row.
    pub fn seam_indices(&self) -> Option<Range<usize>> {
        self.seam.clone()
    }

    /// Mirror index across the contour midpoint.
    #[inline]
    pub fn mirror(&self, i: usize) -> usize {
        self.m - 1 - i
    }

    /// Coordinates of node `(i, j)`.
    #[inline]
    pub fn point(&self, i: usize, j: usize) -> (f64, f64) {
        (self.x[(i, j)], self.y[(i, j)])
    }

    /// Set coordinates of node `(i, j)`.
    #[inline]
    pub fn set_point(&mut self, i: usize, j: usize, p: (f64, f64)) {
        self.x[(i, j)] = p.0;
        self.y[(i, j)] = p.1;
    }

    /// All nodes of row `j` in ξ order.
    pub fn row(&self, j: usize) -> Vec<(f64, f64)> {
        (0..self.m).map(|i| self.point(i, j)).collect()
    }

    /// Overwrite row `j` from a slice of `m` points.
    pub fn set_row(&mut self, j: usize, points: &[(f64, f64)]) {
        debug_assert_eq!(points.len(), self.m);
        for (i, &p) in points.iter().enumerate() {
            self.set_point(i, j, p);
        }
    }

    /// Copy node `M - 1` onto node `0` in every row.
    pub fn enforce_periodicity(&mut self) {
        let last = self.m - 1;
        for j in 0..self.n {
            self.x[(0, j)] = self.x[(last, j)];
            self.y[(0, j)] = self.y[(last, j)];
        }
    }

    /// Largest gap between nodes `(0, j)` and `(M - 1, j)` over all rows.
    pub fn periodic_mismatch(&self) -> f64 {
        let last = self.m - 1;
        (0..self.n)
            .map(|j| {
                (self.x[(0, j)] - self.x[(last, j)])
                    .abs()
                    .max((self.y[(0, j)] - self.y[(last, j)]).abs())
            })
            .fold(0.0, f64::max)
    }

    /// Largest gap between seam nodes and their mirrors (zero for single bodies).
    pub fn seam_mismatch(&self) -> f64 {
        let Some(seam) = self.seam.clone() else {
            return 0.0;
        };
        seam.map(|i| {
            let k = self.mirror(i);
            (self.x[(i, 0)] - self.x[(k, 0)])
                .abs()
                .max((self.y[(i, 0)] - self.y[(k, 0)]).abs())
        })
        .fold(0.0, f64::max)
    }

    /// Largest coordinate change between two grids of equal shape.
    ///
    /// Returns `(max |Δx|, max |Δy|)`.
    pub fn max_change(&self, other: &Self) -> (f64, f64) {
        max_abs_diff(&self.x, &other.x, &self.y, &other.y)
    }

    /// True if every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.first_non_finite().is_none()
    }

    /// First node `(i, j)` with a NaN or infinite coordinate.
    pub fn first_non_finite(&self) -> Option<(usize, usize)> {
        (0..self.n)
            .flat_map(|j| (0..self.m).map(move |i| (i, j)))
            .find(|&(i, j)| !(self.x[(i, j)].is_finite() && self.y[(i, j)].is_finite()))
    }
}

/// `(max |xa - xb|, max |ya - yb|)` over two coordinate pairs.
///
/// A NaN difference poisons the result instead of being skipped by `max`.
pub(crate) fn max_abs_diff(xa: &Mat<f64>, xb: &Mat<f64>, ya: &Mat<f64>, yb: &Mat<f64>) -> (f64, f64) {
    let mut dx: f64 = 0.0;
    let mut dy: f64 = 0.0;
    for j in 0..xa.ncols() {
        for i in 0..xa.nrows() {
            let ex = (xa[(i, j)] - xb[(i, j)]).abs();
            let ey = (ya[(i, j)] - yb[(i, j)]).abs();
            if ex.is_nan() || ey.is_nan() {
                return (f64::NAN, f64::NAN);
            }
            dx = dx.max(ex);
            dy = dy.max(ey);
        }
    }
    (dx, dy)
}
