//! Hyperbolic marching (Steger–Chaussee type).
//!
//! Each new layer satisfies grid orthogonality and a prescribed cell area,
//!
//! ```text
//! x_ξ x_η + y_ξ y_η = 0
//! x_ξ y_η − y_ξ x_η = F
//! ```
//!
//! linearised about the previous layer. With `r_ξ⁰` from the previous layer and
//! the orthogonal predictor `r_η⁰ = F (−y_ξ⁰, x_ξ⁰) / |r_ξ⁰|²`:
//!
//! ```text
//! A⁰ r_ξ + B⁰ r_η = (0, F + F⁰)
//! A⁰ = [[x_η⁰,  y_η⁰], [y_η⁰, −x_η⁰]]
//! B⁰ = [[x_ξ⁰,  y_ξ⁰], [−y_ξ⁰, x_ξ⁰]]
//! ```
//!
//! Multiplying by `B⁰⁻¹`, with `C = B⁰⁻¹ A⁰`, backward differences in η and
//! central differences in ξ on the new layer give one block row per node:
//!
//! ```text
//! −C/(2Δξ) r_{i-1} + I/Δη r_i + C/(2Δξ) r_{i+1} = B⁰⁻¹ (0, F + F⁰) + r_{i,j-1}/Δη
//! ```
//!
//! The area `F = |r_ξ| Δn_j / Δη` uses the mean arc-length spacing of the
//! previous layer and the radial step `Δn_j = Δs₁ · growth^(j-1)`.
//!
//! Implicit second-difference dissipation `ε = θ/Δη` damps odd-even modes:
//! `−εI` is added to both off-diagonal blocks, `2εI` to the diagonal, and
//! `−ε (r_{i+1} − 2r_i + r_{i-1})` of the previous layer to the right-hand
//! side, so a uniform layer is left unchanged.
//!
//! On a smooth contour the cut node is an ordinary node of a periodic system.
//! At a sharp trailing edge the central tangent there is meaningless; the cut
//! node instead steps `Δn_j` along the bisector normal of the two one-sided
//! tangents and is refined with the chord of the neighbouring new nodes.

use std::time::Instant;

use faer::Mat;
use log::{debug, info};

use super::block::{Block2, BlockTridiagonal, SingularPivot, Vec2};
use super::{MarchReport, MarchingError, layer_is_finite, node, set_node, step_range};
use crate::error::{ConfigError, GeometryError, GridError};
use crate::grid::{GeometricStretching, StructuredGrid};

/// Turning cosine at node 0 below which the contour counts as having a corner.
const CORNER_COS: f64 = 0.5;

/// Radial spacing control.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HyperbolicConfig {
    /// First radial step `Δs₁`.
    pub first_spacing: f64,
    /// Ratio between consecutive radial steps.
    pub growth: f64,
    /// Corner refinement passes per layer.
    pub corrector_passes: usize,
    /// Implicit smoothing coefficient `θ`, zero for none.
    pub dissipation: f64,
}

impl Default for HyperbolicConfig {
    fn default() -> Self {
        Self {
            first_spacing: 1e-3,
            growth: 1.001,
            corrector_passes: 4,
            dissipation: 1.0,
        }
    }
}

impl HyperbolicConfig {
    /// Spacing whose `layers` steps starting at `first` add up to `distance`.
    pub fn spanning(first: f64, distance: f64, layers: usize) -> Result<Self, ConfigError> {
        Self {
            first_spacing: first,
            ..Self::default()
        }
        .reaching(distance, layers)
    }

    /// Keep the first spacing and pick the growth that covers `distance` in
    /// `layers` steps.
    pub fn reaching(self, distance: f64, layers: usize) -> Result<Self, ConfigError> {
        let growth = GeometricStretching::ratio_for(self.first_spacing, distance, layers).ok_or(
            ConfigError::InvalidMarching {
                name: "distance",
                value: distance,
            },
        )?;
        Ok(Self { growth, ..self })
    }

    /// Set the first radial step.
    pub fn with_first_spacing(mut self, first_spacing: f64) -> Self {
        self.first_spacing = first_spacing;
        self
    }

    /// Set the ratio between consecutive steps.
    pub fn with_growth(mut self, growth: f64) -> Self {
        self.growth = growth;
        self
    }

    /// Set the number of corner refinement passes.
    pub fn with_corrector_passes(mut self, passes: usize) -> Self {
        self.corrector_passes = passes;
        self
    }

    /// Set the implicit smoothing coefficient.
    pub fn with_dissipation(mut self, dissipation: f64) -> Self {
        self.dissipation = dissipation;
        self
    }

    /// Radial step of layer `j >= 1`.
    #[inline]
    pub fn spacing(&self, j: usize) -> f64 {
        self.first_spacing * self.growth.powi(j as i32 - 1)
    }

    /// Total marching distance over `layers` layers.
    pub fn total_distance(&self, layers: usize) -> f64 {
        (1..=layers).map(|j| self.spacing(j)).sum()
    }

    /// Require a positive finite spacing law and a non-negative dissipation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.first_spacing.is_finite() && self.first_spacing > 0.0) {
            return Err(ConfigError::InvalidMarching {
                name: "first_spacing",
                value: self.first_spacing,
            });
        }
        if !(self.growth.is_finite() && self.growth > 0.0) {
            return Err(ConfigError::InvalidMarching {
                name: "growth",
                value: self.growth,
            });
        }
        if !(self.dissipation.is_finite() && self.dissipation >= 0.0) {
            return Err(ConfigError::InvalidMarching {
                name: "dissipation",
                value: self.dissipation,
            });
        }
        Ok(())
    }
}

/// Linearisation of one node of the previous layer.
struct NodeFrame {
    /// `C = B⁰⁻¹ A⁰`.
    c: Block2,
    /// `B⁰⁻¹ (0, F + F⁰)`.
    source: Vec2,
}

/// How the cut node `i = 0 ≡ M-1` is advanced.
#[derive(Clone, Copy, Debug, PartialEq)]
enum CutTreatment {
    /// Part of a periodic system over `M - 1` unknowns.
    Periodic,
    /// Stepped along the bisector normal of the corner.
    Corner,
}

impl CutTreatment {
    fn detect(body: &[Vec2]) -> Result<Self, MarchingError> {
        let m = body.len();
        let incoming = (body[0] - body[m - 2]).normalized().ok_or(MarchingError::DegenerateTangent { index: m - 2 })?;
        let outgoing = (body[1] - body[0]).normalized().ok_or(MarchingError::DegenerateTangent { index: 0 })?;
        if incoming.dot(outgoing) < CORNER_COS {
            Ok(Self::Corner)
        } else {
            Ok(Self::Periodic)
        }
    }
}

/// Layer-by-layer orthogonal marching generator.
///
/// Overwrites rows `1..N` of the grid, including the far-field row: the march
/// ends wherever the spacing law puts the last layer, and `grid.radius` is
/// set to the mean distance of that layer from the origin.
#[derive(Clone, Debug, Default)]
pub struct HyperbolicGridSolver {
    config: HyperbolicConfig,
}

impl HyperbolicGridSolver {
    /// Create a solver with the given spacing law.
    pub fn new(config: HyperbolicConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &HyperbolicConfig {
        &self.config
    }

    /// March every layer outward from the body row.
    ///
    /// # Errors
    /// [`MarchingError::SingularBlock`] with the failing layer and node;
    /// `grid` is unchanged in that case.
    pub fn march(&self, grid: &mut StructuredGrid) -> Result<MarchReport, GridError> {
        self.config.validate()?;
        check_body_row(grid)?;

        let start = Instant::now();
        let (d_xi, d_eta) = (grid.d_xi(), grid.d_eta());
        let mut x = grid.x.clone();
        let mut y = grid.y.clone();

        let body: Vec<Vec2> = (0..grid.m).map(|i| node(&x, &y, i, 0)).collect();
        let cut = CutTreatment::detect(&body)?;
        info!(
            "Hyperbolic march: M={}, N={}, first_spacing={:.3e}, growth={}, cut={:?}",
            grid.m, grid.n, self.config.first_spacing, self.config.growth, cut
        );

        for j in 1..grid.n {
            self.march_layer(&mut x, &mut y, j, cut, d_xi, d_eta)?;
            debug!("Hyperbolic layer {}: dn={:.3e}", j, self.config.spacing(j));
        }

        grid.x = x;
        grid.y = y;

        let last = grid.n - 1;
        let reached = (0..grid.m - 1)
            .map(|i| {
                let (px, py) = grid.point(i, last);
                px.hypot(py)
            })
            .sum::<f64>()
            / (grid.m - 1) as f64;
        info!("Hyperbolic march reached mean radius {:.4} (was R={})", reached, grid.radius);
        grid.radius = reached;

        let (min_step, max_step) = step_range(&grid.x, &grid.y, last);
        Ok(MarchReport {
            generator: "hyperbolic",
            layers: last,
            min_step,
            max_step,
            wall_time: start.elapsed().as_secs_f64(),
        })
    }

    fn march_layer(
        &self,
        x: &mut Mat<f64>,
        y: &mut Mat<f64>,
        j: usize,
        cut: CutTreatment,
        d_xi: f64,
        d_eta: f64,
    ) -> Result<(), MarchingError> {
        let m = x.nrows();
        let prev: Vec<Vec2> = (0..m).map(|i| node(x, y, i, j - 1)).collect();
        let dn = self.config.spacing(j);

        let mut system = BlockTridiagonal::new(m - 1);
        for i in 0..m - 1 {
            if i == 0 && cut == CutTreatment::Corner {
                continue;
            }
            let frame = node_frame(&prev, i, dn, d_xi, d_eta).map_err(|determinant| MarchingError::SingularBlock {
                layer: j,
                index: i,
                determinant,
            })?;
            self.set_layer_row(&mut system, &prev, i, &frame, d_xi, d_eta);
        }

        let layer = match cut {
            CutTreatment::Periodic => system.solve_periodic().map_err(|p| pivot_error(j, 0, p))?,
            CutTreatment::Corner => {
                let incoming = (prev[0] - prev[m - 2])
                    .normalized()
                    .ok_or(MarchingError::DegenerateTangent { index: m - 2 })?;
                let outgoing = (prev[1] - prev[0])
                    .normalized()
                    .ok_or(MarchingError::DegenerateTangent { index: 0 })?;
                let bisector = (incoming + outgoing)
                    .perp()
                    .normalized()
                    .ok_or(MarchingError::DegenerateTangent { index: 0 })?;

                let mut end = prev[0] + bisector * dn;
                let mut interior = solve_interior(&system, end, j)?;
                for _ in 0..self.config.corrector_passes {
                    // New-layer chord across the cut, kept only while it agrees with the corner
                    if let Some(normal) = (interior[0] - interior[m - 3]).perp().normalized() {
                        if normal.dot(bisector) > 0.0 {
                            end = prev[0] + normal * dn;
                        }
                    }
                    interior = solve_interior(&system, end, j)?;
                }
                let mut layer = Vec::with_capacity(m - 1);
                layer.push(end);
                layer.extend(interior);
                layer
            }
        };

        for (i, r) in layer.iter().enumerate() {
            set_node(x, y, i, j, *r);
        }
        set_node(x, y, m - 1, j, layer[0]);

        if !layer_is_finite(x, y, j) {
            return Err(MarchingError::NonFiniteLayer { layer: j });
        }
        Ok(())
    }

    /// Row `i` of the periodic layer system, previous-layer neighbours wrapping at the cut.
    fn set_layer_row(
        &self,
        system: &mut BlockTridiagonal,
        prev: &[Vec2],
        i: usize,
        frame: &NodeFrame,
        d_xi: f64,
        d_eta: f64,
    ) {
        let m = prev.len();
        let im = if i == 0 { m - 2 } else { i - 1 };
        let eps = self.config.dissipation / d_eta;
        let smoothing = Block2::diagonal(eps);

        let upper = frame.c * (1.0 / (2.0 * d_xi));
        let lower = -upper - smoothing;
        let diag = Block2::diagonal(1.0 / d_eta + 2.0 * eps);
        let second = prev[i + 1] - prev[i] * 2.0 + prev[im];
        let rhs = frame.source + prev[i] * (1.0 / d_eta) - second * eps;
        system.set_row(i, lower, diag, upper - smoothing, rhs);
    }
}

/// Linearise node `i` of the previous layer; `Err(det)` if `B⁰` is singular.
fn node_frame(prev: &[Vec2], i: usize, dn: f64, d_xi: f64, d_eta: f64) -> Result<NodeFrame, f64> {
    let m = prev.len();
    let im = if i == 0 { m - 2 } else { i - 1 };
    let ip = if i == m - 1 { 1 } else { i + 1 };

    let r_xi = (prev[ip] - prev[im]) * (1.0 / (2.0 * d_xi));
    let ds = 0.5 * ((prev[i] - prev[im]).norm() + (prev[ip] - prev[i]).norm());
    let area = ds / d_xi * dn / d_eta;

    let b = Block2::new(r_xi.x, r_xi.y, -r_xi.y, r_xi.x);
    let b_inv = b.inverse().ok_or(b.det())?;
    let g = b.det();

    let r_eta = r_xi.perp() * (area / g);
    let a = Block2::new(r_eta.x, r_eta.y, r_eta.y, -r_eta.x);
    let area0 = r_xi.x * r_eta.y - r_xi.y * r_eta.x;

    Ok(NodeFrame {
        c: b_inv * a,
        source: b_inv * Vec2::new(0.0, area + area0),
    })
}

/// Solve rows `1..M-1` of the layer system with the cut node fixed at `end`.
fn solve_interior(system: &BlockTridiagonal, end: Vec2, j: usize) -> Result<Vec<Vec2>, MarchingError> {
    let rows = system.len();
    let mut open = BlockTridiagonal {
        lower: system.lower[1..].to_vec(),
        diag: system.diag[1..].to_vec(),
        upper: system.upper[1..].to_vec(),
        rhs: system.rhs[1..].to_vec(),
    };
    let last = rows - 2;
    open.rhs[0] = open.rhs[0] - system.lower[1] * end;
    open.rhs[last] = open.rhs[last] - system.upper[rows - 1] * end;
    open.solve().map_err(|p| pivot_error(j, 1, p))
}

fn pivot_error(layer: usize, offset: usize, pivot: SingularPivot) -> MarchingError {
    MarchingError::SingularBlock {
        layer,
        index: pivot.row + offset,
        determinant: pivot.determinant,
    }
}

/// Body row must be finite before marching.
pub(super) fn check_body_row(grid: &StructuredGrid) -> Result<(), GeometryError> {
    for index in 0..grid.m {
        let (x, y) = grid.point(index, 0);
        if !(x.is_finite() && y.is_finite()) {
            return Err(GeometryError::NonFinite { index, x, y });
        }
    }
    Ok(())
}
