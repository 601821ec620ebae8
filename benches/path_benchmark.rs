// ========================================================================================
//
//                 Sparsepath continuation path benchmark
//
// ========================================================================================
//
// Measures a full sparse fit (centering, spectral norm, ten-stage continuation path)
// against a single direct FISTA solve at the target weight, on synthetic Gaussian
// designs of increasing width.
//
// ========================================================================================

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use sparsepath::centering::center;
use sparsepath::config::{FitConfig, SparsityWeight};
use sparsepath::fista::{SmoothPart, run_stage};
use sparsepath::fit::fit_sparse_model;
use sparsepath::lipschitz::datafit_lipschitz;
use sparsepath::path::estimate_tau_max;

/// The number of samples in every synthetic design.
const NUM_SAMPLES: usize = 200;
/// Design widths to benchmark. The last one exceeds the sample count.
const NUM_FEATURES: [usize; 3] = [20, 100, 400];
/// Fraction of `tau_max` used as the target sparsity weight.
const TAU_FRACTION: f64 = 0.05;

fn synthetic_problem(n: usize, d: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(42);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let x = Array2::from_shape_fn((n, d), |_| normal.sample(&mut rng));
    let beta = Array1::from_shape_fn(d, |j| if j % 10 == 0 { 1.0 } else { 0.0 });
    let noise = Array1::from_shape_fn(n, |_| 0.5 * normal.sample(&mut rng));
    let y = x.dot(&beta) + noise;
    (x, y)
}

fn bench_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparse_fit");
    group.sample_size(10);

    for &d in NUM_FEATURES.iter() {
        let (x, y) = synthetic_problem(NUM_SAMPLES, d);
        let data = center(x.view(), y.view(), true);
        let tau = TAU_FRACTION * estimate_tau_max(data.x.view(), data.y.view());
        let l0 = datafit_lipschitz(data.x.view()).unwrap();
        let config = FitConfig::default();

        group.bench_with_input(BenchmarkId::new("continuation", d), &d, |b, _| {
            b.iter(|| {
                fit_sparse_model(
                    black_box(x.view()),
                    black_box(y.view()),
                    &SparsityWeight::Single(tau),
                    &config,
                )
                .unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("direct", d), &d, |b, _| {
            let smooth = SmoothPart::new(data.x.view(), data.y.view(), 0.0);
            b.iter(|| {
                run_stage(
                    &smooth,
                    Array1::zeros(d),
                    tau,
                    1.0 / l0,
                    config.tolerance,
                    config.max_iterations,
                )
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_paths);
criterion_main!(benches);
