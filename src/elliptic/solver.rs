//! Elliptic grid relaxation driver.
//!
//! One sweep updates every interior node once, closes the periodic cut by
//! updating node `M - 1` with node `1` as its east neighbour and copying it
//! onto node `0`, then re-solves the seam nodes of a composite body.
//! Sweeps repeat until both coordinate changes fall below the tolerance or
//! the iteration cap is hit.

use std::ops::Range;
use std::time::Instant;

use faer::Mat;
use log::{debug, info, trace, warn};

use super::config::{EllipticConfig, IterationMethod};
use super::forcing::PoissonForcing;
use super::seam::{stitch_from, stitch_in_place};
use super::stencil::Stencil;
use crate::error::{GeometryError, GridError};
use crate::grid::{StructuredGrid, max_abs_diff};

// =============================================================================
// Modes, hooks and reports
// =============================================================================

/// Right-hand side of the elliptic system.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum EllipticMode {
    /// Homogeneous system, `P = Q = 0`.
    #[default]
    Laplace,
    /// Forced system with line-attraction terms.
    Poisson(PoissonForcing),
}

impl EllipticMode {
    /// Mode name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Laplace => "Laplace",
            Self::Poisson(_) => "Poisson",
        }
    }
}

/// Returned by a checkpoint hook to continue or stop the iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckpointAction {
    /// Keep iterating.
    Continue,
    /// Stop now; the grid keeps the last completed sweep.
    Abort,
}

/// How an elliptic solve ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// Both coordinate changes fell below the tolerance.
    Converged,
    /// The iteration cap was reached first.
    IterationCap,
    /// A checkpoint hook asked to stop.
    Aborted,
    /// A coordinate became NaN or infinite.
    Diverged,
}

/// Outcome of an elliptic solve.
#[derive(Clone, Debug)]
pub struct SolveReport {
    /// Update discipline used.
    pub method: IterationMethod,
    /// Sweeps performed.
    pub iterations: usize,
    /// Largest `|Δx|` of the last sweep.
    pub residual_x: f64,
    /// Largest `|Δy|` of the last sweep.
    pub residual_y: f64,
    /// Termination reason.
    pub status: ConvergenceStatus,
    /// `max(|Δx|, |Δy|)` per sweep.
    pub history: Vec<f64>,
    /// Wall-clock seconds.
    pub wall_time: f64,
}

impl SolveReport {
    /// True if the tolerance was met.
    pub fn converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }

    /// `max(|Δx|, |Δy|)` of the last sweep.
    pub fn residual(&self) -> f64 {
        self.residual_x.max(self.residual_y)
    }
}

// =============================================================================
// Solver
// =============================================================================

/// Point-iterative solver for the interior of an O-grid.
///
/// Boundary rows `j = 0` and `j = N - 1` are never moved, except the seam
/// nodes of a composite body.
///
/// # Example
///
/// ```
/// use ogrid_rs::elliptic::{EllipticConfig, EllipticGridSolver, IterationMethod};
/// use ogrid_rs::grid::{BoundaryAssembler, BoundaryContour, InteriorInitializer, TransfiniteInterpolation};
///
/// let contour = BoundaryContour::circle(1.0, 33).unwrap();
/// let mut grid = BoundaryAssembler::assemble(&contour, 10.0, 17).unwrap();
/// TransfiniteInterpolation::default().initialize(&mut grid);
///
/// let config = EllipticConfig::default()
///     .with_method(IterationMethod::GaussSeidel)
///     .with_tolerance(1e-8);
/// let report = EllipticGridSolver::laplace(config).solve(&mut grid).unwrap();
/// assert!(report.converged());
/// ```
#[derive(Clone, Debug)]
pub struct EllipticGridSolver {
    config: EllipticConfig,
    mode: EllipticMode,
}

impl EllipticGridSolver {
    /// Homogeneous (Laplace) solver.
    pub fn laplace(config: EllipticConfig) -> Self {
        Self {
            config,
            mode: EllipticMode::Laplace,
        }
    }

    /// Forced (Poisson) solver.
    pub fn poisson(config: EllipticConfig, forcing: PoissonForcing) -> Self {
        Self {
            config,
            mode: EllipticMode::Poisson(forcing),
        }
    }

    /// Iteration settings.
    pub fn config(&self) -> &EllipticConfig {
        &self.config
    }

    /// Laplace or Poisson.
    pub fn mode(&self) -> &EllipticMode {
        &self.mode
    }

    /// Relax `grid` until convergence or the iteration cap.
    ///
    /// # Errors
    /// [`GridError::Config`] for an invalid configuration and
    /// [`GridError::Geometry`] if the starting grid is not finite.
    pub fn solve(&self, grid: &mut StructuredGrid) -> Result<SolveReport, GridError> {
        self.solve_with_checkpoint(grid, |_, _| CheckpointAction::Continue)
    }

    /// Relax `grid`, calling `hook(sweeps, grid)` every
    /// `checkpoint_interval` sweeps.
    ///
    /// The hook sees the grid after the sweep, including the periodic and
    /// seam updates. Returning [`CheckpointAction::Abort`] stops the solve
    /// with [`ConvergenceStatus::Aborted`].
    pub fn solve_with_checkpoint<F>(&self, grid: &mut StructuredGrid, mut hook: F) -> Result<SolveReport, GridError>
    where
        F: FnMut(usize, &StructuredGrid) -> CheckpointAction,
    {
        self.config.validate()?;
        if let Some((i, j)) = grid.first_non_finite() {
            let (x, y) = grid.point(i, j);
            return Err(GeometryError::NonFinite { index: i, x, y }.into());
        }

        let start = Instant::now();
        let plan = SweepPlan::new(&self.config, &self.mode, grid);
        let method = self.config.method;
        let tolerance = self.config.tolerance;

        info!(
            "{} relaxation ({}, omega={}): M={}, N={}, tol={:.1e}, cap={}",
            self.mode.name(),
            method.name(),
            plan.omega,
            grid.m,
            grid.n,
            tolerance,
            self.config.max_iterations
        );

        let mut history = Vec::with_capacity(self.config.max_iterations.min(4096));
        let mut status = ConvergenceStatus::IterationCap;
        let mut residual = (f64::INFINITY, f64::INFINITY);
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            let (dx, dy) = plan.sweep(grid);
            iterations += 1;
            residual = (dx, dy);
            history.push(dx.max(dy));
            trace!("sweep {}: dx={:.3e}, dy={:.3e}", iterations, dx, dy);

            if !(dx.is_finite() && dy.is_finite()) {
                warn!("Elliptic relaxation diverged at sweep {}", iterations);
                status = ConvergenceStatus::Diverged;
                break;
            }

            if let Some(interval) = self.config.checkpoint_interval
                && iterations % interval == 0
            {
                debug!("Checkpoint at sweep {}: residual={:.3e}", iterations, dx.max(dy));
                if hook(iterations, grid) == CheckpointAction::Abort {
                    info!("Relaxation aborted by checkpoint at sweep {}", iterations);
                    status = ConvergenceStatus::Aborted;
                    break;
                }
            }

            if dx < tolerance && dy < tolerance {
                status = ConvergenceStatus::Converged;
                break;
            }
        }

        let wall_time = start.elapsed().as_secs_f64();
        match status {
            ConvergenceStatus::Converged => info!(
                "Converged in {} sweeps: dx={:.3e}, dy={:.3e} ({:.2}s)",
                iterations, residual.0, residual.1, wall_time
            ),
            ConvergenceStatus::IterationCap => warn!(
                "Iteration cap {} reached: dx={:.3e}, dy={:.3e}",
                iterations, residual.0, residual.1
            ),
            _ => {}
        }

        Ok(SolveReport {
            method,
            iterations,
            residual_x: residual.0,
            residual_y: residual.1,
            status,
            history,
            wall_time,
        })
    }

    /// Perform exactly one sweep; returns `(max |Δx|, max |Δy|)`.
    pub fn sweep(&self, grid: &mut StructuredGrid) -> (f64, f64) {
        SweepPlan::new(&self.config, &self.mode, grid).sweep(grid)
    }
}

// =============================================================================
// Sweep kernels
// =============================================================================

/// Per-solve data shared by every sweep.
struct SweepPlan {
    stencil: Stencil,
    method: IterationMethod,
    omega: f64,
    /// `P_i` and `Q_j`, indexed by node.
    forcing: Option<(Vec<f64>, Vec<f64>)>,
    seam: Option<Range<usize>>,
    m: usize,
    n: usize,
}

impl SweepPlan {
    fn new(config: &EllipticConfig, mode: &EllipticMode, grid: &StructuredGrid) -> Self {
        let forcing = match mode {
            EllipticMode::Laplace => None,
            EllipticMode::Poisson(f) => Some((f.xi.sample(grid.m), f.eta.sample(grid.n))),
        };
        Self {
            stencil: Stencil::new(grid.d_xi(), grid.d_eta()),
            method: config.method,
            omega: config.effective_omega(),
            forcing,
            seam: grid.seam_indices(),
            m: grid.m,
            n: grid.n,
        }
    }

    #[inline]
    fn forcing_at(&self, i: usize, j: usize) -> Option<(f64, f64)> {
        self.forcing.as_ref().map(|(p, q)| (p[i], q[j]))
    }

    /// East neighbour, wrapping node `M - 1` onto node `1`.
    #[inline]
    fn east(&self, i: usize) -> usize {
        if i == self.m - 1 { 1 } else { i + 1 }
    }

    fn sweep(&self, grid: &mut StructuredGrid) -> (f64, f64) {
        let old_x = grid.x.clone();
        let old_y = grid.y.clone();

        match self.method {
            IterationMethod::Jacobi => {
                let (x, y) = self.jacobi(&old_x, &old_y);
                grid.x = x;
                grid.y = y;
            }
            IterationMethod::GaussSeidel | IterationMethod::Sor => {
                self.gauss_seidel(&mut grid.x, &mut grid.y);
                if self.omega != 1.0 {
                    self.blend(&old_x, &old_y, &mut grid.x, &mut grid.y);
                }
            }
        }

        max_abs_diff(&grid.x, &old_x, &grid.y, &old_y)
    }

    /// Relaxed interior row `j` (nodes `1..M`) read from `(x, y)`.
    fn relax_row(&self, x: &Mat<f64>, y: &Mat<f64>, j: usize) -> Vec<(f64, f64)> {
        (1..self.m)
            .map(|i| self.stencil.relax(x, y, i, self.east(i), j, self.forcing_at(i, j)))
            .collect()
    }

    #[cfg_attr(feature = "parallel", allow(dead_code))]
    fn jacobi_rows(&self, x: &Mat<f64>, y: &Mat<f64>) -> Vec<Vec<(f64, f64)>> {
        (1..self.n - 1).map(|j| self.relax_row(x, y, j)).collect()
    }

    #[cfg(feature = "parallel")]
    fn jacobi_rows_parallel(&self, x: &Mat<f64>, y: &Mat<f64>) -> Vec<Vec<(f64, f64)>> {
        use rayon::prelude::*;

        (1..self.n - 1)
            .into_par_iter()
            .map(|j| self.relax_row(x, y, j))
            .collect()
    }

    /// Jacobi update: every read from the previous iterate.
    fn jacobi(&self, x: &Mat<f64>, y: &Mat<f64>) -> (Mat<f64>, Mat<f64>) {
        #[cfg(feature = "parallel")]
        let rows = self.jacobi_rows_parallel(x, y);
        #[cfg(not(feature = "parallel"))]
        let rows = self.jacobi_rows(x, y);

        let mut new_x = x.clone();
        let mut new_y = y.clone();
        for (j, row) in (1..self.n - 1).zip(rows) {
            for (i, (px, py)) in (1..self.m).zip(row) {
                new_x[(i, j)] = px;
                new_y[(i, j)] = py;
            }
        }

        close_cut(&mut new_x, &mut new_y);
        if let Some(seam) = &self.seam {
            stitch_from(&self.stencil, x, y, &mut new_x, &mut new_y, seam.clone());
        }
        (new_x, new_y)
    }

    /// Gauss-Seidel update in place, `j` outer and `i` inner.
    fn gauss_seidel(&self, x: &mut Mat<f64>, y: &mut Mat<f64>) {
        for j in 1..self.n - 1 {
            for i in 1..self.m {
                let (px, py) = self.stencil.relax(x, y, i, self.east(i), j, self.forcing_at(i, j));
                x[(i, j)] = px;
                y[(i, j)] = py;
            }
        }

        close_cut(x, y);
        if let Some(seam) = &self.seam {
            stitch_in_place(&self.stencil, x, y, seam.clone());
        }
    }

    /// Over-relaxation `r = ω r_gs + (1 - ω) r_old` on every node that moves.
    fn blend(&self, old_x: &Mat<f64>, old_y: &Mat<f64>, x: &mut Mat<f64>, y: &mut Mat<f64>) {
        let w = self.omega;
        for j in 1..self.n - 1 {
            for i in 1..self.m {
                x[(i, j)] = w * x[(i, j)] + (1.0 - w) * old_x[(i, j)];
                y[(i, j)] = w * y[(i, j)] + (1.0 - w) * old_y[(i, j)];
            }
        }
        close_cut(x, y);

        if let Some(seam) = &self.seam {
            for i in seam.clone() {
                let k = self.m - 1 - i;
                y[(i, 0)] = w * y[(i, 0)] + (1.0 - w) * old_y[(i, 0)];
                y[(k, 0)] = y[(i, 0)];
            }
        }
    }
}

/// Copy node `M - 1` onto node `0` in every row.
fn close_cut(x: &mut Mat<f64>, y: &mut Mat<f64>) {
    let last = x.nrows() - 1;
    for j in 0..x.ncols() {
        x[(0, j)] = x[(last, j)];
        y[(0, j)] = y[(last, j)];
    }
}
