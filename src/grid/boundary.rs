//! Boundary assembly for O-grids.
//!
//! Writes the body contour into row `j = 0` and a far-field circle of radius
//! `R` into row `j = N - 1`. The circle is sampled clockwise starting at
//! `(R, 0)`, matching the contour convention, so node `i` of the body and node
//! `i` of the far field belong to the same ξ line and the periodic cut joins
//! node `0` and node `M - 1` on both rows.

use log::debug;

use super::contour::{BoundaryContour, clockwise_angles};
use super::structured::StructuredGrid;
use crate::error::GeometryError;

/// Builds the fixed boundary rows of an O-grid.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoundaryAssembler;

impl BoundaryAssembler {
    /// Allocate an `M × n` grid and fix its body and far-field rows.
    ///
    /// `M` is the contour size. The interior is left at zero; seed it with an
    /// [`InteriorInitializer`](super::InteriorInitializer) before relaxing.
    ///
    /// # Errors
    /// [`GeometryError`] for a contour with fewer than 3 points, non-finite
    /// coordinates, inconsistent seam markers, `n < 3` or a non-positive radius.
    pub fn assemble(
        contour: &BoundaryContour,
        radius: f64,
        n: usize,
    ) -> Result<StructuredGrid, GeometryError> {
        contour.validate()?;

        let m = contour.len();
        let mut grid = StructuredGrid::new(m, n, radius)?;

        grid.set_row(0, contour.points());
        grid.set_row(n - 1, &Self::outer_circle(m, radius));

        if let Some(markers) = contour.markers() {
            grid.set_markers(markers.to_vec())?;
        }

        debug!(
            "Assembled O-grid boundaries: M={}, N={}, R={}, composite={}",
            m,
            n,
            radius,
            !grid.is_airfoil_alone()
        );

        Ok(grid)
    }

    /// Far-field circle of `m` clockwise nodes, first and last at `(radius, 0)`.
    pub fn outer_circle(m: usize, radius: f64) -> Vec<(f64, f64)> {
        let mut points: Vec<(f64, f64)> = clockwise_angles(m)
            .into_iter()
            .map(|t| (radius * t.cos(), radius * t.sin()))
            .collect();
        if let Some(first) = points.first_mut() {
            *first = (radius, 0.0);
        }
        if let Some(last) = points.last_mut() {
            *last = (radius, 0.0);
        }
        points
    }
}
