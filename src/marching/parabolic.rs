//! Parabolic marching.
//!
//! The elliptic operator `α r_ξξ − 2β r_ξη + γ r_ηη = 0` is frozen one layer at
//! a time. For layer `j` the η derivatives are taken between the previous
//! layer, the unknown layer and a target `r°` on the next layer:
//!
//! ```text
//! r_ηη ≈ 2/(G + g) · ((r° − r_j)/G − (r_j − r_{j-1})/g)
//! r_ξξ ≈ 2/(F_i + F_{i-1}) · ((r_{i+1} − r_i)/F_i − (r_i − r_{i-1})/F_{i-1})
//! ```
//!
//! with `g`, `G` the radial gaps to the previous and next layer from a
//! geometric distribution, and `F_i`, `F_{i-1}` the one-sided arc lengths of
//! the previous layer. The resulting rows `A r_{i-1} + B r_i + C r_{i+1} = D`
//! use scalar blocks `A·I`, `B·I`, `C·I`.
//!
//! The target for node `i` sits at `s_{j+1} · |P(i, N-1) − P(i, 0)|` from the
//! body, `s` being the normalised geometric distribution (the "G-line"). Its
//! direction turns from the body normal at the wall to the far-field node at
//! `s = 1`, so the last interior layer lines up with the fixed far field.
//!
//! The ξξ term acts on the deviation `r − E` from the linear estimate
//! `E = r_{j-1} + (r° − r_{j-1}) · g/(g + G)`. Smoothing along the layer then
//! removes wiggles without pulling a convex layer inward, which would fold
//! thin layers at the leading edge.

use std::time::Instant;

use faer::Mat;
use log::{debug, info, warn};

use super::block::{Block2, BlockTridiagonal, Vec2};
use super::hyperbolic::check_body_row;
use super::{MarchReport, MarchingError, layer_is_finite, node, set_node, step_range};
use crate::error::{ConfigError, GridError};
use crate::grid::{GeometricStretching, Stretching, StructuredGrid};

/// Radial distribution control.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParabolicConfig {
    /// Ratio between consecutive radial gaps (`> 1` clusters at the body).
    pub weight: f64,
}

impl Default for ParabolicConfig {
    fn default() -> Self {
        Self { weight: 1.05 }
    }
}

impl ParabolicConfig {
    /// Set the gap ratio.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Require a positive finite gap ratio.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.weight.is_finite() && self.weight > 0.0) {
            return Err(ConfigError::InvalidMarching {
                name: "weight",
                value: self.weight,
            });
        }
        Ok(())
    }
}

/// Layer-by-layer parabolic generator.
///
/// Rows `1..N-1` are computed; the body and far-field rows stay fixed. The
/// periodic endpoints are placed on the ray from the origin through contour
/// point 0.
#[derive(Clone, Debug, Default)]
pub struct ParabolicGridSolver {
    config: ParabolicConfig,
}

impl ParabolicGridSolver {
    /// Create a solver with the given radial distribution.
    pub fn new(config: ParabolicConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ParabolicConfig {
        &self.config
    }

    /// Radial node distance `x_line[j]` from the origin along the endpoint ray.
    ///
    /// Starts at `|P(0, 0)|`, ends at `R`, gaps grow by `weight`.
    pub fn radial_line(&self, start: f64, radius: f64, n: usize) -> Vec<f64> {
        let s = GeometricStretching::new(self.config.weight).distribution(n);
        let mut line: Vec<f64> = s.iter().map(|t| start + (radius - start) * t).collect();
        if let Some(last) = line.last_mut() {
            *last = radius;
        }
        line
    }

    /// March layers `1..N-1`.
    ///
    /// # Errors
    /// [`MarchingError::DegenerateRay`] if contour point 0 is at the origin or
    /// outside the far field, [`MarchingError::DegenerateSpacing`] if two
    /// consecutive layers of the distribution coincide in floating point,
    /// [`MarchingError::DegenerateTangent`] for coincident body nodes,
    /// [`MarchingError::SingularBlock`] from the elimination. `grid` is
    /// unchanged on error.
    pub fn march(&self, grid: &mut StructuredGrid) -> Result<MarchReport, GridError> {
        self.config.validate()?;
        check_body_row(grid)?;

        let start = Instant::now();
        let (m, n) = (grid.m, grid.n);
        let radius = grid.radius;

        let anchor = node(&grid.x, &grid.y, 0, 0);
        let d0 = anchor.norm();
        if !(d0 > 1e-12 * radius && d0 < radius) {
            return Err(MarchingError::DegenerateRay { distance: d0, radius }.into());
        }
        let direction = anchor * (1.0 / d0);
        let line = self.radial_line(d0, radius, n);
        if let Some((layer, gap)) = (1..n).map(|j| (j, line[j] - line[j - 1])).find(|&(_, gap)| !(gap > 0.0)) {
            warn!(
                "Parabolic distribution with weight {} collapses layers {} and {}",
                self.config.weight,
                layer - 1,
                layer
            );
            return Err(MarchingError::DegenerateSpacing { layer, gap }.into());
        }
        let g_line = GeometricStretching::new(self.config.weight).distribution(n);
        let rays = (0..m).map(|i| BodyRay::at(grid, i)).collect::<Result<Vec<_>, _>>()?;

        info!(
            "Parabolic march: M={}, N={}, weight={}, first gap={:.3e}",
            m,
            n,
            self.config.weight,
            line[1] - line[0]
        );

        let mut x = grid.x.clone();
        let mut y = grid.y.clone();
        for j in 1..n - 1 {
            let s = g_line[j + 1];
            let targets = rays
                .iter()
                .enumerate()
                .map(|(i, ray)| ray.target(s).ok_or(MarchingError::DegenerateTangent { index: i }))
                .collect::<Result<Vec<_>, _>>()?;

            let end = direction * line[j];
            let gap_next = line[j + 1] - line[j];
            let gap_prev = line[j] - line[j - 1];
            march_layer(&mut x, &mut y, j, &targets, end, gap_prev, gap_next)?;
            debug!("Parabolic layer {}: g={:.3e}, G={:.3e}", j, gap_prev, gap_next);
        }

        grid.x = x;
        grid.y = y;

        let (min_step, max_step) = step_range(&grid.x, &grid.y, n - 1);
        Ok(MarchReport {
            generator: "parabolic",
            layers: n - 2,
            min_step,
            max_step,
            wall_time: start.elapsed().as_secs_f64(),
        })
    }
}

/// Solve layer `j` given the next-layer targets and the endpoint position.
fn march_layer(
    x: &mut Mat<f64>,
    y: &mut Mat<f64>,
    j: usize,
    targets: &[Vec2],
    end: Vec2,
    gap_prev: f64,
    gap_next: f64,
) -> Result<(), MarchingError> {
    let m = x.nrows();
    let rows = m - 2;
    let radial = gap_prev + gap_next;
    let fraction = gap_prev / radial;

    let estimate: Vec<Vec2> = (0..m)
        .map(|i| {
            if i == 0 || i == m - 1 {
                end
            } else {
                let p = node(x, y, i, j - 1);
                p + (targets[i] - p) * fraction
            }
        })
        .collect();

    let mut system = BlockTridiagonal::new(rows);
    for k in 0..rows {
        let i = k + 1;
        let west = node(x, y, i - 1, j - 1);
        let centre = node(x, y, i, j - 1);
        let east = node(x, y, i + 1, j - 1);

        let f_east = (east - centre).norm();
        let f_west = (centre - west).norm();
        if f_east == 0.0 || f_west == 0.0 {
            return Err(MarchingError::DegenerateTangent { index: i });
        }
        let arc = f_east + f_west;

        let r_xi = (east - west) * (1.0 / arc);
        let r_eta = (targets[i] - centre) * (1.0 / radial);
        let alpha = r_eta.dot(r_eta);
        let beta = -2.0 * r_xi.dot(r_eta);
        let gamma = r_xi.dot(r_xi);

        let a = 2.0 * alpha / (f_west * arc);
        let c = 2.0 * alpha / (f_east * arc);
        let b_xi = -2.0 * alpha / arc * (1.0 / f_east + 1.0 / f_west);
        let b = b_xi - 2.0 * gamma / radial * (1.0 / gap_next + 1.0 / gap_prev);

        let cross = targets[i + 1] - targets[i - 1] - east + west;
        let mut rhs = cross * (-beta / (arc * radial))
            - (centre * (1.0 / gap_prev) + targets[i] * (1.0 / gap_next)) * (2.0 * gamma / radial)
            + estimate[i - 1] * a
            + estimate[i] * b_xi
            + estimate[i + 1] * c;
        if k == 0 {
            rhs = rhs - end * a;
        }
        if k == rows - 1 {
            rhs = rhs - end * c;
        }

        system.set_row(k, Block2::diagonal(a), Block2::diagonal(b), Block2::diagonal(c), rhs);
    }

    let solution = system.solve().map_err(|p| MarchingError::SingularBlock {
        layer: j,
        index: p.row + 1,
        determinant: p.determinant,
    })?;

    set_node(x, y, 0, j, end);
    set_node(x, y, m - 1, j, end);
    for (k, r) in solution.into_iter().enumerate() {
        set_node(x, y, k + 1, j, r);
    }

    if !layer_is_finite(x, y, j) {
        return Err(MarchingError::NonFiniteLayer { layer: j });
    }
    Ok(())
}

/// Body node with its outward normal and the direction to its far-field node.
struct BodyRay {
    point: Vec2,
    normal: Vec2,
    toward_far: Vec2,
    reach: f64,
}

impl BodyRay {
    fn at(grid: &StructuredGrid, i: usize) -> Result<Self, MarchingError> {
        let m = grid.m;
        let (im, ip) = if i == 0 || i == m - 1 { (m - 2, 1) } else { (i - 1, i + 1) };

        let point = node(&grid.x, &grid.y, i, 0);
        let far = node(&grid.x, &grid.y, i, grid.n - 1);
        let tangent = node(&grid.x, &grid.y, ip, 0) - node(&grid.x, &grid.y, im, 0);
        let normal = outward_normal(tangent).ok_or(MarchingError::DegenerateTangent { index: i })?;

        Ok(Self {
            point,
            normal,
            toward_far: (far - point).normalized().unwrap_or(normal),
            reach: (far - point).norm(),
        })
    }

    /// Target at fraction `s` of the far-field distance.
    fn target(&self, s: f64) -> Option<Vec2> {
        let heading = (self.normal * (1.0 - s) + self.toward_far * s).normalized()?;
        Some(self.point + heading * (s * self.reach))
    }
}

/// Unit outward normal `(−t.y, t.x)/|t|` of a clockwise tangent.
fn outward_normal(tangent: Vec2) -> Option<Vec2> {
    tangent.perp().normalized()
}
