//! Quality report for finished grids.
//!
//! Provides cell-level diagnostics for deciding whether a grid is fit for a
//! flow solver: Jacobian sign, equiangle skewness, aspect ratio and
//! wall orthogonality.
//!
//! # Example
//!
//! ```
//! use ogrid_rs::analysis::{GridQuality, QualityThresholds};
//! use ogrid_rs::grid::{BoundaryAssembler, BoundaryContour, InteriorInitializer, TransfiniteInterpolation};
//!
//! let contour = BoundaryContour::circle(1.0, 41).unwrap();
//! let mut grid = BoundaryAssembler::assemble(&contour, 10.0, 21).unwrap();
//! TransfiniteInterpolation::default().initialize(&mut grid);
//!
//! let quality = GridQuality::compute(&grid, &QualityThresholds::default());
//! assert!(quality.is_valid());
//! for warning in &quality.warnings {
//!     eprintln!("{}", warning);
//! }
//! ```

use std::f64::consts::FRAC_PI_2;

use crate::grid::StructuredGrid;
use crate::metrics::{JacobianSign, MetricTensor};

/// Thresholds for quality warnings.
#[derive(Debug, Clone, Copy)]
pub struct QualityThresholds {
    /// Maximum equiangle skewness (0 = rectangle, 1 = degenerate).
    pub max_skewness: f64,
    /// Maximum ratio of the longer to the shorter cell side.
    pub max_aspect_ratio: f64,
    /// Maximum deviation from 90° between ξ and η lines on the body (degrees).
    pub max_wall_deviation: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            max_skewness: 0.8,
            max_aspect_ratio: 500.0,
            max_wall_deviation: 15.0,
        }
    }
}

impl QualityThresholds {
    /// Strict thresholds for production grids.
    ///
    /// - max_skewness: 0.5
    /// - max_aspect_ratio: 100
    /// - max_wall_deviation: 5°
    pub fn strict() -> Self {
        Self {
            max_skewness: 0.5,
            max_aspect_ratio: 100.0,
            max_wall_deviation: 5.0,
        }
    }

    /// Relaxed thresholds for exploratory runs.
    ///
    /// Only catches nearly degenerate cells.
    pub fn relaxed() -> Self {
        Self {
            max_skewness: 0.95,
            max_aspect_ratio: 1e4,
            max_wall_deviation: 45.0,
        }
    }

    /// Set maximum skewness.
    pub fn with_max_skewness(mut self, max_skewness: f64) -> Self {
        self.max_skewness = max_skewness;
        self
    }

    /// Set maximum aspect ratio.
    pub fn with_max_aspect_ratio(mut self, max_aspect_ratio: f64) -> Self {
        self.max_aspect_ratio = max_aspect_ratio;
        self
    }

    /// Set maximum wall deviation in degrees.
    pub fn with_max_wall_deviation(mut self, degrees: f64) -> Self {
        self.max_wall_deviation = degrees;
        self
    }
}

/// Types of quality warnings. Cell `(i, j)` spans nodes `i..=i+1`, `j..=j+1`.
#[derive(Debug, Clone, PartialEq)]
pub enum QualityWarning {
    /// Jacobian vanishes or flips sign.
    FoldedGrid {
        nodes: usize,
        first: (usize, usize),
    },
    /// Worst cell skewness above threshold.
    SkewnessExceedsMax {
        cell: (usize, usize),
        value: f64,
        threshold: f64,
    },
    /// Worst cell aspect ratio above threshold.
    AspectRatioExceedsMax {
        cell: (usize, usize),
        value: f64,
        threshold: f64,
    },
    /// Grid lines leave the body far from normal.
    WallDeviationExceedsMax {
        index: usize,
        degrees: f64,
        threshold: f64,
    },
    /// NaN or infinite coordinates.
    NonFiniteValue { i: usize, j: usize },
}

impl std::fmt::Display for QualityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FoldedGrid { nodes, first } => write!(
                f,
                "Folded grid: {} nodes with wrong Jacobian sign, first at ({}, {})",
                nodes, first.0, first.1
            ),
            Self::SkewnessExceedsMax {
                cell,
                value,
                threshold,
            } => write!(
                f,
                "Skewness exceeds max: {:.3} > {:.3} at cell ({}, {})",
                value, threshold, cell.0, cell.1
            ),
            Self::AspectRatioExceedsMax {
                cell,
                value,
                threshold,
            } => write!(
                f,
                "Aspect ratio exceeds max: {:.1} > {:.1} at cell ({}, {})",
                value, threshold, cell.0, cell.1
            ),
            Self::WallDeviationExceedsMax {
                index,
                degrees,
                threshold,
            } => write!(
                f,
                "Wall orthogonality deviation {:.1}° > {:.1}° at body node {}",
                degrees, threshold, index
            ),
            Self::NonFiniteValue { i, j } => write!(f, "Non-finite coordinate at node ({}, {})", i, j),
        }
    }
}

/// Quality summary of a grid.
#[derive(Debug, Clone)]
pub struct GridQuality {
    /// Jacobian range (min, max).
    pub jacobian_range: (f64, f64),
    /// Consistent Jacobian sign, `None` when the grid is folded.
    pub orientation: Option<JacobianSign>,
    /// Largest equiangle skewness and its cell.
    pub max_skewness: (f64, (usize, usize)),
    /// Largest aspect ratio and its cell.
    pub max_aspect_ratio: (f64, (usize, usize)),
    /// Largest deviation from orthogonality on the body, degrees.
    pub max_wall_deviation: f64,
    /// List of warnings detected.
    pub warnings: Vec<QualityWarning>,
}

impl GridQuality {
    /// Evaluate every cell of `grid` against `thresholds`.
    pub fn compute(grid: &StructuredGrid, thresholds: &QualityThresholds) -> Self {
        let mut warnings = Vec::new();

        if let Some((i, j)) = grid.first_non_finite() {
            warnings.push(QualityWarning::NonFiniteValue { i, j });
            return Self {
                jacobian_range: (f64::NAN, f64::NAN),
                orientation: None,
                max_skewness: (f64::NAN, (0, 0)),
                max_aspect_ratio: (f64::NAN, (0, 0)),
                max_wall_deviation: f64::NAN,
                warnings,
            };
        }

        let metrics = MetricTensor::compute(grid);
        let jacobian_range = metrics.jacobian_range();
        let orientation = match metrics.check_jacobian() {
            Ok(sign) => Some(sign),
            Err(_) => {
                let (nodes, first) = folded_nodes(&metrics);
                warnings.push(QualityWarning::FoldedGrid { nodes, first });
                None
            }
        };

        let mut max_skewness = (0.0, (0, 0));
        let mut max_aspect_ratio = (1.0, (0, 0));
        for j in 0..grid.n - 1 {
            for i in 0..grid.m - 1 {
                let corners = [
                    grid.point(i, j),
                    grid.point(i + 1, j),
                    grid.point(i + 1, j + 1),
                    grid.point(i, j + 1),
                ];
                let skew = cell_skewness(&corners);
                if skew > max_skewness.0 {
                    max_skewness = (skew, (i, j));
                }
                let aspect = cell_aspect_ratio(&corners);
                if aspect > max_aspect_ratio.0 {
                    max_aspect_ratio = (aspect, (i, j));
                }
            }
        }

        let mut max_wall_deviation: f64 = 0.0;
        let mut worst_wall = 0;
        for i in 0..grid.m {
            let cos = metrics.g12_cov[(i, 0)] / (metrics.g11_cov[(i, 0)] * metrics.g22_cov[(i, 0)]).sqrt();
            let deviation = (90.0 - cos.clamp(-1.0, 1.0).acos().to_degrees()).abs();
            if deviation > max_wall_deviation {
                max_wall_deviation = deviation;
                worst_wall = i;
            }
        }

        if max_skewness.0 > thresholds.max_skewness {
            warnings.push(QualityWarning::SkewnessExceedsMax {
                cell: max_skewness.1,
                value: max_skewness.0,
                threshold: thresholds.max_skewness,
            });
        }
        if max_aspect_ratio.0 > thresholds.max_aspect_ratio {
            warnings.push(QualityWarning::AspectRatioExceedsMax {
                cell: max_aspect_ratio.1,
                value: max_aspect_ratio.0,
                threshold: thresholds.max_aspect_ratio,
            });
        }
        if max_wall_deviation > thresholds.max_wall_deviation {
            warnings.push(QualityWarning::WallDeviationExceedsMax {
                index: worst_wall,
                degrees: max_wall_deviation,
                threshold: thresholds.max_wall_deviation,
            });
        }

        Self {
            jacobian_range,
            orientation,
            max_skewness,
            max_aspect_ratio,
            max_wall_deviation,
            warnings,
        }
    }

    /// Check if any warnings were generated.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// True when the grid is unfolded and finite.
    pub fn is_valid(&self) -> bool {
        self.orientation.is_some()
    }
}

/// Count nodes whose Jacobian disagrees with node `(0, 0)`.
fn folded_nodes(metrics: &MetricTensor) -> (usize, (usize, usize)) {
    let (m, n) = metrics.shape();
    let reference = metrics.jacobian[(0, 0)].signum();
    let mut count = 0;
    let mut first = None;
    for j in 0..n {
        for i in 0..m {
            let jac = metrics.jacobian[(i, j)];
            if !(jac * reference > 0.0) {
                count += 1;
                first.get_or_insert((i, j));
            }
        }
    }
    (count, first.unwrap_or((0, 0)))
}

/// Equiangle skewness of a quadrilateral.
///
/// `max((θ_max - 90°) / 90°, (90° - θ_min) / 90°)` over the four corner
/// angles; degenerate corners count as fully skewed.
fn cell_skewness(corners: &[(f64, f64); 4]) -> f64 {
    let mut skew: f64 = 0.0;
    for k in 0..4 {
        let p = corners[k];
        let a = corners[(k + 1) % 4];
        let b = corners[(k + 3) % 4];
        let (ux, uy) = (a.0 - p.0, a.1 - p.1);
        let (vx, vy) = (b.0 - p.0, b.1 - p.1);
        let norm = ux.hypot(uy) * vx.hypot(vy);
        if norm == 0.0 {
            return 1.0;
        }
        let angle = ((ux * vx + uy * vy) / norm).clamp(-1.0, 1.0).acos();
        skew = skew.max((angle - FRAC_PI_2).abs() / FRAC_PI_2);
    }
    skew
}

/// Ratio of the mean ξ side length to the mean η side length, or its inverse.
fn cell_aspect_ratio(corners: &[(f64, f64); 4]) -> f64 {
    let side = |a: (f64, f64), b: (f64, f64)| (b.0 - a.0).hypot(b.1 - a.1);
    let xi = 0.5 * (side(corners[0], corners[1]) + side(corners[3], corners[2]));
    let eta = 0.5 * (side(corners[0], corners[3]) + side(corners[1], corners[2]));
    let (long, short) = if xi > eta { (xi, eta) } else { (eta, xi) };
    if short == 0.0 { f64::INFINITY } else { long / short }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{BoundaryAssembler, BoundaryContour, InteriorInitializer, TransfiniteInterpolation};

    fn seeded_circle(m: usize, n: usize, radius: f64) -> StructuredGrid {
        let contour = BoundaryContour::circle(1.0, m).unwrap();
        let mut grid = BoundaryAssembler::assemble(&contour, radius, n).unwrap();
        TransfiniteInterpolation::default().initialize(&mut grid);
        grid
    }

    #[test]
    fn test_skewness_of_square_is_zero() {
        let square = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        assert!(cell_skewness(&square).abs() < 1e-12);
        assert!((cell_aspect_ratio(&square) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_skewness_of_rhombus() {
        // 60° / 120° corners
        let h = 3.0_f64.sqrt() / 2.0;
        let rhombus = [(0.0, 0.0), (1.0, 0.0), (1.5, h), (0.5, h)];
        assert!((cell_skewness(&rhombus) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_cell() {
        let collapsed = [(0.0, 0.0), (0.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        assert_eq!(cell_skewness(&collapsed), 1.0);
        let flat = [(0.0, 0.0), (1.0, 0.0), (1.0, 0.0), (0.0, 0.0)];
        assert!(cell_aspect_ratio(&flat).is_infinite());
    }

    #[test]
    fn test_circle_grid_clean() {
        let grid = seeded_circle(41, 11, 5.0);
        let quality = GridQuality::compute(&grid, &QualityThresholds::default());

        assert!(quality.is_valid());
        assert_eq!(quality.orientation, Some(JacobianSign::Positive));
        assert!(quality.max_wall_deviation < 1e-6);
        assert!(quality.max_skewness.0 < 0.1);
        assert!(!quality.has_warnings(), "{:?}", quality.warnings);
    }

    #[test]
    fn test_strict_thresholds_flag_stretched_cells() {
        // Far field at 200 body radii: outer cells are long in η
        let grid = seeded_circle(21, 5, 200.0);
        let quality = GridQuality::compute(&grid, &QualityThresholds::strict().with_max_aspect_ratio(10.0));

        assert!(quality.warnings.iter().any(|w| matches!(w, QualityWarning::AspectRatioExceedsMax { .. })));
    }

    #[test]
    fn test_folded_grid_warning() {
        let mut grid = seeded_circle(21, 7, 5.0);
        let (x, y) = grid.point(5, 4);
        grid.set_point(5, 3, (x * 1.5, y * 1.5));

        let quality = GridQuality::compute(&grid, &QualityThresholds::relaxed());
        assert!(!quality.is_valid());
        match &quality.warnings[0] {
            QualityWarning::FoldedGrid { nodes, first } => {
                assert!(*nodes >= 1);
                assert_eq!(first.0, 5);
            }
            other => panic!("expected fold warning, got {}", other),
        }
    }

    #[test]
    fn test_non_finite_short_circuits() {
        let mut grid = seeded_circle(21, 5, 5.0);
        grid.set_point(3, 2, (f64::NAN, 0.0));

        let quality = GridQuality::compute(&grid, &QualityThresholds::default());
        assert_eq!(quality.warnings, vec![QualityWarning::NonFiniteValue { i: 3, j: 2 }]);
        assert!(!quality.is_valid());
    }

    #[test]
    fn test_warning_display() {
        let warning = QualityWarning::SkewnessExceedsMax {
            cell: (3, 4),
            value: 0.9,
            threshold: 0.8,
        };
        assert_eq!(warning.to_string(), "Skewness exceeds max: 0.900 > 0.800 at cell (3, 4)");
    }
}
