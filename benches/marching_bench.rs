//! Benchmarks for marching generators.
//!
//! Run with: `cargo bench --bench marching_bench`
//!
//! Compares hyperbolic and parabolic marching on a NACA 2412 section, plus the
//! 2×2 block-tridiagonal solve they share.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ogrid_rs::grid::{BoundaryAssembler, BoundaryContour, Naca4, StructuredGrid};
use ogrid_rs::marching::{HyperbolicConfig, HyperbolicGridSolver, ParabolicConfig, ParabolicGridSolver};

/// Body and far-field rows only; the marchers fill the rest.
fn setup_grid(m: usize, n: usize) -> StructuredGrid {
    let contour = BoundaryContour::naca4(Naca4::from_digits(2, 4, 12, 1.0), m).unwrap();
    BoundaryAssembler::assemble(&contour, 20.0, n).unwrap()
}

/// Benchmark a full march with each generator.
fn bench_march(c: &mut Criterion) {
    let mut group = c.benchmark_group("march");
    group.sample_size(20);

    for (m, n) in [(81, 31), (161, 61)] {
        let grid = setup_grid(m, n);
        let hyperbolic = HyperbolicGridSolver::new(HyperbolicConfig::spanning(2e-3, 1.0, n - 1).unwrap());
        let parabolic = ParabolicGridSolver::new(ParabolicConfig::default().with_weight(1.1));

        group.bench_with_input(
            BenchmarkId::new("hyperbolic", format!("{}x{}", m, n)),
            &grid,
            |b, grid| {
                b.iter(|| {
                    let mut work = grid.clone();
                    hyperbolic.march(black_box(&mut work)).unwrap()
                });
            },
        );
        group.bench_with_input(
            BenchmarkId::new("parabolic", format!("{}x{}", m, n)),
            &grid,
            |b, grid| {
                b.iter(|| {
                    let mut work = grid.clone();
                    parabolic.march(black_box(&mut work)).unwrap()
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the trailing-edge corner refinement passes.
fn bench_corrector_passes(c: &mut Criterion) {
    let mut group = c.benchmark_group("corrector_passes");
    let grid = setup_grid(161, 31);

    for passes in [0, 2, 4, 8] {
        let config = HyperbolicConfig::spanning(2e-3, 0.5, 30)
            .unwrap()
            .with_corrector_passes(passes);
        let solver = HyperbolicGridSolver::new(config);
        group.bench_with_input(BenchmarkId::from_parameter(passes), &grid, |b, grid| {
            b.iter(|| {
                let mut work = grid.clone();
                solver.march(black_box(&mut work)).unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmark the implicit dissipation against an undamped march.
fn bench_dissipation(c: &mut Criterion) {
    let mut group = c.benchmark_group("dissipation");
    let grid = setup_grid(161, 31);

    for theta in [0.0, 1.0] {
        let config = HyperbolicConfig::spanning(2e-3, 0.5, 30)
            .unwrap()
            .with_dissipation(theta);
        let solver = HyperbolicGridSolver::new(config);
        group.bench_with_input(BenchmarkId::from_parameter(theta), &grid, |b, grid| {
            b.iter(|| {
                let mut work = grid.clone();
                solver.march(black_box(&mut work)).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_march, bench_corrector_passes, bench_dissipation);
criterion_main!(benches);
