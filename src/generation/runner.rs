//! Grid generation runner implementation.
//!
//! Provides a high-level interface for turning a body contour into a
//! finished grid.

use std::time::Instant;

use log::{info, warn};

use crate::analysis::{GridQuality, QualityThresholds};
use crate::elliptic::{
    CheckpointAction, ConvergenceStatus, EllipticConfig, EllipticGridSolver, EllipticMode, SolveReport,
};
use crate::error::{GeometryError, GridError};
use crate::grid::{
    BoundaryAssembler, BoundaryContour, InteriorInitializer, StructuredGrid, TransfiniteInterpolation,
};
use crate::marching::{
    HyperbolicConfig, HyperbolicGridSolver, MarchReport, ParabolicConfig, ParabolicGridSolver,
};
use crate::metrics::{MetricError, MetricTensor};

/// Accepted relative miss of the far-field radius by a hyperbolic march.
const RADIUS_TOL: f64 = 1e-3;

/// Growth corrections tried before a hyperbolic march keeps its last radius.
const RADIUS_PASSES: usize = 8;

// =============================================================================
// Generation Configuration
// =============================================================================

/// Which generator fills the grid, with its settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GeneratorChoice {
    /// Seed algebraically, then relax with the elliptic system.
    Elliptic {
        config: EllipticConfig,
        mode: EllipticMode,
    },
    /// March outward with the orthogonal hyperbolic scheme.
    ///
    /// The runner replaces `growth` with the ratio whose layers end on the
    /// far-field radius.
    Hyperbolic(HyperbolicConfig),
    /// March outward with the parabolic scheme.
    Parabolic(ParabolicConfig),
}

impl Default for GeneratorChoice {
    fn default() -> Self {
        Self::Elliptic {
            config: EllipticConfig::default(),
            mode: EllipticMode::Laplace,
        }
    }
}

impl GeneratorChoice {
    /// Generator name for logging and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Elliptic {
                mode: EllipticMode::Laplace,
                ..
            } => "elliptic-laplace",
            Self::Elliptic {
                mode: EllipticMode::Poisson(_),
                ..
            } => "elliptic-poisson",
            Self::Hyperbolic(_) => "hyperbolic",
            Self::Parabolic(_) => "parabolic",
        }
    }
}

/// Configuration for a generation run.
#[derive(Clone, Debug)]
pub struct GridConfig {
    /// Far-field radius.
    pub radius: f64,
    /// Node count along η.
    pub n_eta: usize,
    /// Generator and its settings.
    pub generator: GeneratorChoice,
    /// Thresholds for the final quality report.
    pub thresholds: QualityThresholds,
    /// Fail the run when the finished grid is folded.
    pub reject_folded: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            radius: 70.0,
            n_eta: 101,
            generator: GeneratorChoice::default(),
            thresholds: QualityThresholds::default(),
            reject_folded: true,
        }
    }
}

impl GridConfig {
    /// Set the far-field radius.
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Set the number of η nodes.
    pub fn with_n_eta(mut self, n_eta: usize) -> Self {
        self.n_eta = n_eta;
        self
    }

    /// Choose the generator.
    pub fn with_generator(mut self, generator: GeneratorChoice) -> Self {
        self.generator = generator;
        self
    }

    /// Set the quality thresholds.
    pub fn with_thresholds(mut self, thresholds: QualityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Keep folded grids instead of failing.
    pub fn allow_folded(mut self) -> Self {
        self.reject_folded = false;
        self
    }

    /// Check dimensions and generator settings.
    pub fn validate(&self) -> Result<(), GridError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(GeometryError::InvalidRadius(self.radius).into());
        }
        if self.n_eta < 3 {
            return Err(GeometryError::TooFewLayers(self.n_eta).into());
        }
        match &self.generator {
            GeneratorChoice::Elliptic { config, .. } => config.validate()?,
            GeneratorChoice::Hyperbolic(config) => config.validate()?,
            GeneratorChoice::Parabolic(config) => config.validate()?,
        }
        Ok(())
    }
}

// =============================================================================
// Generation Result
// =============================================================================

/// Generator-specific outcome.
#[derive(Clone, Debug)]
pub enum GeneratorOutcome {
    /// Elliptic relaxation report.
    Relaxed(SolveReport),
    /// Marching report.
    Marched(MarchReport),
}

/// Summary of a generation run.
#[derive(Clone, Debug)]
pub struct GenerationReport {
    /// Generator name.
    pub generator: &'static str,
    /// Iterations (elliptic) or layers (marching).
    pub steps: usize,
    /// Generator-specific details.
    pub outcome: GeneratorOutcome,
    /// Quality of the finished grid.
    pub quality: GridQuality,
    /// Total wall-clock time in seconds.
    pub wall_time: f64,
}

impl GenerationReport {
    /// Convergence status of an elliptic run, `None` for marching.
    pub fn status(&self) -> Option<ConvergenceStatus> {
        match &self.outcome {
            GeneratorOutcome::Relaxed(report) => Some(report.status),
            GeneratorOutcome::Marched(_) => None,
        }
    }

    /// Final `(max |Δx|, max |Δy|)` of an elliptic run.
    pub fn residuals(&self) -> Option<(f64, f64)> {
        match &self.outcome {
            GeneratorOutcome::Relaxed(report) => Some((report.residual_x, report.residual_y)),
            GeneratorOutcome::Marched(_) => None,
        }
    }
}

/// Finished grid and its report.
#[derive(Clone, Debug)]
pub struct GenerationResult {
    /// The generated grid.
    pub grid: StructuredGrid,
    /// Run summary.
    pub report: GenerationReport,
}

// =============================================================================
// Grid Generator
// =============================================================================

/// High-level generation runner.
///
/// Ties together boundary assembly, interior seeding, one generator and the
/// quality report.
pub struct GridGenerator {
    contour: BoundaryContour,
    config: GridConfig,
    initializer: Box<dyn InteriorInitializer>,
}

impl GridGenerator {
    /// Create a runner with transfinite seeding.
    pub fn new(contour: BoundaryContour, config: GridConfig) -> Self {
        Self {
            contour,
            config,
            initializer: Box::new(TransfiniteInterpolation::default()),
        }
    }

    /// Replace the interior seed used before elliptic relaxation.
    pub fn with_initializer<I>(mut self, initializer: I) -> Self
    where
        I: InteriorInitializer + 'static,
    {
        self.initializer = Box::new(initializer);
        self
    }

    /// Get the run configuration.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Get the body contour.
    pub fn contour(&self) -> &BoundaryContour {
        &self.contour
    }

    /// Generate the grid.
    pub fn run(&self) -> Result<GenerationResult, GridError> {
        self.run_with_checkpoint(|_, _| CheckpointAction::Continue)
    }

    /// Generate the grid, forwarding `hook` to the elliptic solver.
    ///
    /// The hook is called every `checkpoint_interval` sweeps of an elliptic
    /// run; marching generators never call it.
    pub fn run_with_checkpoint<F>(&self, hook: F) -> Result<GenerationResult, GridError>
    where
        F: FnMut(usize, &StructuredGrid) -> CheckpointAction,
    {
        let start_wall = Instant::now();
        self.config.validate()?;

        let generator = self.config.generator.name();
        let mut grid = BoundaryAssembler::assemble(&self.contour, self.config.radius, self.config.n_eta)?;
        info!(
            "Generating {}x{} O-grid with {} (R={}, composite={})",
            grid.m,
            grid.n,
            generator,
            self.config.radius,
            !grid.is_airfoil_alone()
        );

        let outcome = match &self.config.generator {
            GeneratorChoice::Elliptic { config, mode } => {
                self.initializer.initialize(&mut grid);
                info!("Seeded interior with {}", self.initializer.name());
                let solver = match mode {
                    EllipticMode::Laplace => EllipticGridSolver::laplace(*config),
                    EllipticMode::Poisson(forcing) => EllipticGridSolver::poisson(*config, *forcing),
                };
                GeneratorOutcome::Relaxed(solver.solve_with_checkpoint(&mut grid, hook)?)
            }
            GeneratorChoice::Hyperbolic(config) => GeneratorOutcome::Marched(self.march_to_radius(config, &mut grid)?),
            GeneratorChoice::Parabolic(config) => {
                GeneratorOutcome::Marched(ParabolicGridSolver::new(*config).march(&mut grid)?)
            }
        };

        let steps = match &outcome {
            GeneratorOutcome::Relaxed(report) => report.iterations,
            GeneratorOutcome::Marched(report) => report.layers,
        };

        if let Some((i, j)) = grid.first_non_finite() {
            return Err(MetricError::NonFiniteGrid { i, j }.into());
        }
        if self.config.reject_folded {
            MetricTensor::compute(&grid).check_jacobian()?;
        }

        let quality = GridQuality::compute(&grid, &self.config.thresholds);
        for warning in &quality.warnings {
            warn!("{}", warning);
        }

        let wall_time = start_wall.elapsed().as_secs_f64();
        info!(
            "Generation complete: {} steps, max skewness {:.3}, max aspect ratio {:.1} ({:.2}s)",
            steps, quality.max_skewness.0, quality.max_aspect_ratio.0, wall_time
        );

        Ok(GenerationResult {
            grid,
            report: GenerationReport {
                generator,
                steps,
                outcome,
                quality,
                wall_time,
            },
        })
    }

    /// March hyperbolically, correcting the growth until the last layer sits
    /// on the configured far-field radius.
    fn march_to_radius(&self, config: &HyperbolicConfig, grid: &mut StructuredGrid) -> Result<MarchReport, GridError> {
        let radius = self.config.radius;
        let layers = grid.n - 1;
        let body = mean_distance(grid, 0);
        let distance = radius - body;
        if !(distance > 0.0) {
            return Err(GeometryError::InvalidRadius(radius).into());
        }

        let seed = grid.clone();
        let mut target = distance;
        let mut pass = 1;
        loop {
            let config = config.reaching(target, layers)?;
            *grid = seed.clone();
            let report = HyperbolicGridSolver::new(config).march(grid)?;

            let reached = grid.radius - body;
            if (grid.radius - radius).abs() <= RADIUS_TOL * radius || pass == RADIUS_PASSES || !(reached > 0.0) {
                info!(
                    "Hyperbolic growth {:.5} reaches R={:.4} after {} pass(es)",
                    config.growth, grid.radius, pass
                );
                return Ok(report);
            }
            target *= distance / reached;
            pass += 1;
        }
    }
}

/// Mean distance from the origin of row `j`, periodic duplicate excluded.
fn mean_distance(grid: &StructuredGrid, j: usize) -> f64 {
    let count = grid.m - 1;
    (0..count)
        .map(|i| {
            let (x, y) = grid.point(i, j);
            x.hypot(y)
        })
        .sum::<f64>()
        / count as f64
}
