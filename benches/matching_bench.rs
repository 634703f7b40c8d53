//! Criterion benchmarks for the u-matching solvers.
//!
//! Uses seeded random instances (dense cost matrices, random graphs and
//! color grids) so runs are comparable across machines and commits.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use u_matching::adaptor::{solve_pairing, PairingConfig, PairingStrategy};
use u_matching::assignment::{CostMatrix, HungarianSolver};
use u_matching::blossom::{BlossomConfig, BlossomSolver, WeightedGraph};
use u_matching::grid::{Color, Grid};

// ===========================================================================
// Instance generators
// ===========================================================================

fn random_matrix(rows: usize, cols: usize, seed: u64) -> CostMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..rows * cols).map(|_| rng.random_range(0.0..100.0)).collect();
    CostMatrix::new(rows, cols, data).expect("generated matrix is well formed")
}

fn random_graph(n: usize, density: f64, seed: u64) -> WeightedGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut g = WeightedGraph::new(n);
    for u in 0..n {
        for v in (u + 1)..n {
            if rng.random_bool(density) {
                g.add_edge(u, v, f64::from(rng.random_range(1u32..100)))
                    .expect("generated edge is valid");
            }
        }
    }
    g
}

fn random_grid(rows: usize, cols: usize, seed: u64) -> Grid {
    let mut rng = StdRng::seed_from_u64(seed);
    let colors = (0..rows)
        .map(|_| {
            (0..cols)
                .map(|_| Color::ALL[rng.random_range(0..Color::ALL.len())])
                .collect()
        })
        .collect();
    let values = (0..rows)
        .map(|_| (0..cols).map(|_| f64::from(rng.random_range(1u8..=10))).collect())
        .collect();
    Grid::new(rows, cols, colors, values).expect("generated grid is well formed")
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_hungarian(c: &mut Criterion) {
    let mut group = c.benchmark_group("hungarian");
    group.sample_size(10);

    for &(rows, cols) in &[(20usize, 20usize), (50, 50), (100, 100), (50, 150)] {
        let matrix = random_matrix(rows, cols, 42);
        group.bench_with_input(
            BenchmarkId::new(format!("{rows}x{cols}"), rows * cols),
            &matrix,
            |b, m| {
                b.iter(|| {
                    let result = HungarianSolver::solve(black_box(m));
                    black_box(result)
                })
            },
        );
    }
    group.finish();
}

fn bench_blossom(c: &mut Criterion) {
    let mut group = c.benchmark_group("blossom");
    group.sample_size(10);

    let config = BlossomConfig::default().with_verify_optimum(false);
    for &(n, density) in &[(50usize, 0.2f64), (100, 0.1), (200, 0.05), (100, 0.5)] {
        let graph = random_graph(n, density, 42);
        group.bench_with_input(
            BenchmarkId::new(format!("n{n}_d{density}"), n),
            &graph,
            |b, g| {
                b.iter(|| {
                    let result = BlossomSolver::solve(black_box(g), black_box(&config));
                    black_box(result)
                })
            },
        );
    }
    group.finish();
}

fn bench_grid_pairing(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_pairing");
    group.sample_size(10);

    for &side in &[8usize, 16, 24] {
        let grid = random_grid(side, side, 7);
        for strategy in [PairingStrategy::Blossom, PairingStrategy::Hungarian] {
            let config = PairingConfig::default().with_strategy(strategy);
            group.bench_with_input(
                BenchmarkId::new(format!("{strategy:?}"), side),
                &(grid.clone(), config),
                |b, (g, c)| {
                    b.iter(|| {
                        let result = solve_pairing(black_box(g), black_box(c));
                        black_box(result)
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_hungarian, bench_blossom, bench_grid_pairing);
criterion_main!(benches);
