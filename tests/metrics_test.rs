//! Metric tensors against closed-form values.
//!
//! On an algebraic annulus with uniform ξ and linear radial spacing the
//! discrete Jacobian is known exactly:
//!
//! ```text
//! J = 2π r (R − 1) · sin(Δθ) / Δθ,   Δθ = 2π / (M − 1)
//! ```
//!
//! where the `sin(Δθ)/Δθ` factor comes from the central difference in ξ.

use std::f64::consts::PI;

use ogrid_rs::analysis::{GridQuality, QualityThresholds};
use ogrid_rs::elliptic::{EllipticConfig, EllipticGridSolver, IterationMethod};
use ogrid_rs::grid::{
    BoundaryAssembler, BoundaryContour, InteriorInitializer, Naca4, StructuredGrid,
    TransfiniteInterpolation,
};
use ogrid_rs::metrics::{JacobianSign, MetricError, MetricTensor};

fn annulus(m: usize, n: usize, radius: f64) -> StructuredGrid {
    let contour = BoundaryContour::circle(1.0, m).unwrap();
    let mut grid = BoundaryAssembler::assemble(&contour, radius, n).unwrap();
    TransfiniteInterpolation::default().initialize(&mut grid);
    grid
}

#[test]
fn test_annulus_jacobian_closed_form() {
    let (m, n, radius) = (41, 9, 5.0);
    let grid = annulus(m, n, radius);
    let metrics = MetricTensor::compute(&grid);

    let dtheta = 2.0 * PI / (m - 1) as f64;
    let chord_factor = dtheta.sin() / dtheta;
    for j in 0..n {
        let r = 1.0 + (radius - 1.0) * j as f64 / (n - 1) as f64;
        let expected = 2.0 * PI * r * (radius - 1.0) * chord_factor;
        for i in 0..m {
            let jac = metrics.jacobian[(i, j)];
            assert!(
                (jac - expected).abs() < 1e-9 * expected,
                "J({}, {}) = {} expected {}",
                i,
                j,
                jac,
                expected
            );
        }
    }
}

#[test]
fn test_annulus_covariant_lengths() {
    let (m, n, radius) = (33, 7, 4.0);
    let grid = annulus(m, n, radius);
    let metrics = MetricTensor::compute(&grid);

    let dtheta = 2.0 * PI / (m - 1) as f64;
    let chord_factor = dtheta.sin() / dtheta;
    for j in 0..n {
        let r = 1.0 + (radius - 1.0) * j as f64 / (n - 1) as f64;
        let g11 = (2.0 * PI * r * chord_factor).powi(2);
        let g22 = (radius - 1.0).powi(2);
        for i in 0..m {
            assert!((metrics.g11_cov[(i, j)] - g11).abs() < 1e-9 * g11);
            assert!((metrics.g22_cov[(i, j)] - g22).abs() < 1e-9 * g22);
            // Contravariant g11 = g22_cov / J²
            let jac = metrics.jacobian[(i, j)];
            assert!((metrics.g11[(i, j)] * jac * jac - g22).abs() < 1e-9 * g22);
        }
    }
}

#[test]
fn test_relaxed_airfoil_grid_is_valid() {
    let contour = BoundaryContour::naca4(Naca4::from_digits(2, 4, 12, 1.0), 61).unwrap();
    let mut grid = BoundaryAssembler::assemble(&contour, 10.0, 21).unwrap();
    TransfiniteInterpolation::default().initialize(&mut grid);

    let config = EllipticConfig::default()
        .with_method(IterationMethod::Sor)
        .with_omega(1.5)
        .with_tolerance(1e-8)
        .with_max_iterations(20_000);
    EllipticGridSolver::laplace(config).solve(&mut grid).unwrap();

    let metrics = MetricTensor::compute(&grid);
    assert_eq!(metrics.shape(), (61, 21));
    assert_eq!(metrics.check_jacobian().unwrap(), JacobianSign::Positive);

    let (lo, hi) = metrics.jacobian_range();
    assert!(lo > 0.0 && hi.is_finite());
    for j in 0..grid.n {
        assert_eq!(metrics.jacobian[(0, j)], metrics.jacobian[(60, j)]);
    }

    let quality = GridQuality::compute(&grid, &QualityThresholds::relaxed());
    assert_eq!(quality.orientation, Some(JacobianSign::Positive));
    assert!(quality.max_skewness.0 < 1.0);
}

#[test]
fn test_swapped_rows_flip_orientation() {
    let grid = annulus(21, 5, 3.0);
    let mut reversed = grid.clone();
    for j in 0..grid.n {
        let row = grid.row(grid.n - 1 - j);
        reversed.set_row(j, &row);
    }

    let metrics = MetricTensor::compute(&reversed);
    assert_eq!(metrics.check_jacobian().unwrap(), JacobianSign::Negative);
}

#[test]
fn test_collapsed_layer_is_folded() {
    let mut grid = annulus(21, 6, 3.0);
    // Layer 2 pulled back onto the body: the central η difference at layer 1 vanishes
    let body = grid.row(0);
    grid.set_row(2, &body);

    let err = MetricTensor::compute(&grid).check_jacobian().unwrap_err();
    let MetricError::FoldedGrid { i, j, jacobian } = err else {
        panic!("expected MetricError::FoldedGrid");
    };
    assert_eq!((i, j), (0, 1));
    assert_eq!(jacobian, 0.0);
}
