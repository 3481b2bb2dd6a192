//! Marching generators on complete grids.
//!
//! Hyperbolic marching is checked for orthogonality on a circle, mirror
//! symmetry on a symmetric section and an unfolded trailing edge on cambered
//! sections; parabolic marching for its endpoint ray, its fixed far field,
//! unfolded airfoil grids and its use as a seed for elliptic smoothing.

use ogrid_rs::elliptic::{EllipticConfig, EllipticGridSolver, IterationMethod};
use ogrid_rs::grid::{BoundaryAssembler, BoundaryContour, Naca4, StructuredGrid};
use ogrid_rs::marching::{
    HyperbolicConfig, HyperbolicGridSolver, MarchingError, ParabolicConfig, ParabolicGridSolver,
};
use ogrid_rs::metrics::{JacobianSign, MetricTensor};
use ogrid_rs::GridError;

fn naca0012(m: usize) -> BoundaryContour {
    BoundaryContour::naca4(Naca4::from_digits(0, 0, 12, 1.0), m).unwrap()
}

fn assert_mirror_symmetric(grid: &StructuredGrid, tol: f64) {
    let m = grid.m;
    for j in 0..grid.n {
        for i in 0..m {
            let (xa, ya) = grid.point(i, j);
            let (xb, yb) = grid.point(m - 1 - i, j);
            assert!((xa - xb).abs() < tol, "x mismatch at ({}, {})", i, j);
            assert!((ya + yb).abs() < tol, "y mismatch at ({}, {})", i, j);
        }
    }
}

#[test]
fn test_hyperbolic_circle_is_orthogonal() {
    let contour = BoundaryContour::circle(1.0, 41).unwrap();
    let mut grid = BoundaryAssembler::assemble(&contour, 10.0, 16).unwrap();
    let config = HyperbolicConfig::default().with_first_spacing(0.02).with_growth(1.15);
    HyperbolicGridSolver::new(config).march(&mut grid).unwrap();

    let metrics = MetricTensor::compute(&grid);
    assert_eq!(metrics.check_jacobian().unwrap(), JacobianSign::Positive);

    for j in 1..grid.n - 1 {
        for i in 0..grid.m {
            let g12 = metrics.g12_cov[(i, j)];
            let scale = (metrics.g11_cov[(i, j)] * metrics.g22_cov[(i, j)]).sqrt();
            assert!(g12.abs() < 1e-5 * scale, "node ({}, {}): g12={}", i, j, g12);
        }
    }
}

#[test]
fn test_hyperbolic_symmetric_section() {
    let mut grid = BoundaryAssembler::assemble(&naca0012(61), 10.0, 11).unwrap();
    let config = HyperbolicConfig::spanning(5e-3, 0.5, 10).unwrap();
    let report = HyperbolicGridSolver::new(config).march(&mut grid).unwrap();

    assert_eq!(report.layers, 10);
    assert!(grid.is_finite());
    assert_eq!(grid.periodic_mismatch(), 0.0);
    assert_mirror_symmetric(&grid, 1e-7);
    assert_eq!(MetricTensor::compute(&grid).check_jacobian().unwrap(), JacobianSign::Positive);

    // The trailing-edge ray leaves along the chord line
    for j in 1..grid.n {
        let (x, y) = grid.point(0, j);
        assert!(y.abs() < 1e-7);
        assert!(x > grid.point(0, j - 1).0);
    }
}

#[test]
fn test_hyperbolic_cambered_section_unfolded() {
    let contour = BoundaryContour::naca4(Naca4::from_digits(2, 4, 12, 1.0), 61).unwrap();
    for (first, growth) in [(5e-3, 1.15), (2e-3, 1.25)] {
        let mut grid = BoundaryAssembler::assemble(&contour, 10.0, 31).unwrap();
        let config = HyperbolicConfig::default().with_first_spacing(first).with_growth(growth);
        HyperbolicGridSolver::new(config).march(&mut grid).unwrap();

        let metrics = MetricTensor::compute(&grid);
        assert_eq!(
            metrics.check_jacobian().unwrap(),
            JacobianSign::Positive,
            "first={} growth={}",
            first,
            growth
        );
    }
}

#[test]
fn test_hyperbolic_trailing_edge_ray_bisects_edge() {
    // Cambered section: the cut node must leave between the two surfaces
    let contour = BoundaryContour::naca4(Naca4::from_digits(2, 4, 12, 1.0), 81).unwrap();
    let mut grid = BoundaryAssembler::assemble(&contour, 10.0, 11).unwrap();
    let config = HyperbolicConfig::spanning(2e-3, 1.0, 10).unwrap();
    HyperbolicGridSolver::new(config).march(&mut grid).unwrap();

    let (tx, ty) = grid.point(0, 0);
    let (x1, y1) = grid.point(0, 1);
    // Node 1 starts the lower surface, node M-2 ends the upper one
    let (lx, ly) = grid.point(1, 0);
    let (ux, uy) = grid.point(grid.m - 2, 0);
    let cross = |ax: f64, ay: f64, bx: f64, by: f64| ax * by - ay * bx;
    assert!(cross(lx - tx, ly - ty, x1 - tx, y1 - ty) > 0.0);
    assert!(cross(ux - tx, uy - ty, x1 - tx, y1 - ty) < 0.0);
    assert!(x1 > tx);
}

#[test]
fn test_hyperbolic_first_step_matches_spacing() {
    let dn = 4e-3;
    let mut grid = BoundaryAssembler::assemble(&naca0012(81), 10.0, 6).unwrap();
    let config = HyperbolicConfig::default().with_first_spacing(dn).with_growth(1.1);
    HyperbolicGridSolver::new(config).march(&mut grid).unwrap();

    // Mid-chord on both surfaces, away from the edges
    for i in [20, 60] {
        let (x0, y0) = grid.point(i, 0);
        let (x1, y1) = grid.point(i, 1);
        let step = (x1 - x0).hypot(y1 - y0);
        assert!((step - dn).abs() < 0.25 * dn, "node {}: step {} vs {}", i, step, dn);
    }
}

#[test]
fn test_parabolic_endpoint_ray_follows_rotation() {
    let mut contour = naca0012(41);
    contour.rotate(-5.0);
    let mut grid = BoundaryAssembler::assemble(&contour, 10.0, 12).unwrap();
    let far = grid.row(grid.n - 1);

    ParabolicGridSolver::new(ParabolicConfig::default().with_weight(1.3))
        .march(&mut grid)
        .unwrap();

    assert_eq!(grid.row(grid.n - 1), far);
    assert_eq!(grid.periodic_mismatch(), 0.0);

    let (ax, ay) = grid.point(0, 0);
    let anchor = ax.hypot(ay);
    let mut previous = anchor;
    for j in 1..grid.n - 1 {
        let (x, y) = grid.point(0, j);
        let cross = ax * y - ay * x;
        let distance = x.hypot(y);
        assert!(cross.abs() < 1e-9 * distance * anchor, "layer {} leaves the ray", j);
        assert!(distance > previous);
        previous = distance;
    }
}

#[test]
fn test_parabolic_airfoils_unfolded() {
    for (digits, m, n, weight) in [((0, 0, 12), 61, 21, 1.2), ((2, 4, 12), 41, 21, 1.2), ((4, 4, 15), 81, 31, 1.1)] {
        let contour = BoundaryContour::naca4(Naca4::from_digits(digits.0, digits.1, digits.2, 1.0), m).unwrap();
        let mut grid = BoundaryAssembler::assemble(&contour, 10.0, n).unwrap();
        ParabolicGridSolver::new(ParabolicConfig::default().with_weight(weight))
            .march(&mut grid)
            .unwrap();

        let metrics = MetricTensor::compute(&grid);
        assert_eq!(
            metrics.check_jacobian().unwrap(),
            JacobianSign::Positive,
            "NACA {:?} M={} N={}",
            digits,
            m,
            n
        );
    }
}

#[test]
fn test_parabolic_error_leaves_grid_untouched() {
    let mut contour = BoundaryContour::circle(1.0, 21).unwrap();
    contour.translate(-1.0, 0.0);
    let mut grid = BoundaryAssembler::assemble(&contour, 10.0, 6).unwrap();
    let before = grid.clone();

    let err = ParabolicGridSolver::default().march(&mut grid).unwrap_err();
    assert!(matches!(err, GridError::Marching(MarchingError::DegenerateRay { .. })));
    assert_eq!(grid.max_change(&before), (0.0, 0.0));
}

#[test]
fn test_marched_grid_seeds_elliptic_smoothing() {
    let contour = BoundaryContour::circle(1.0, 33).unwrap();
    let mut grid = BoundaryAssembler::assemble(&contour, 8.0, 13).unwrap();
    ParabolicGridSolver::new(ParabolicConfig::default().with_weight(1.2))
        .march(&mut grid)
        .unwrap();

    let config = EllipticConfig::default()
        .with_method(IterationMethod::GaussSeidel)
        .with_max_iterations(200)
        .with_tolerance(1e-12);
    EllipticGridSolver::laplace(config).solve(&mut grid).unwrap();

    assert!(grid.is_finite());
    assert_eq!(grid.periodic_mismatch(), 0.0);
    let metrics = MetricTensor::compute(&grid);
    assert_eq!(metrics.check_jacobian().unwrap(), JacobianSign::Positive);
}
