use std::hint::black_box;

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use equity_lens::portfolio::Moments;
use equity_lens::portfolio::OptimizerConfig;
use equity_lens::portfolio::max_sharpe;
use equity_lens::portfolio::optimize;

/// Deterministic positive-definite covariance with a one-factor structure.
fn problem(n: usize) -> (Vec<f64>, Vec<Vec<f64>>) {
  let beta: Vec<f64> = (0..n).map(|i| 0.5 + (i % 7) as f64 * 0.1).collect();
  let mu = (0..n).map(|i| 0.02 + (i % 5) as f64 * 0.015).collect();
  let sigma = (0..n)
    .map(|i| {
      (0..n)
        .map(|j| {
          let common = 1e-4 * beta[i] * beta[j];
          if i == j {
            common + 2e-4 * (1.0 + (i % 3) as f64)
          } else {
            common
          }
        })
        .collect()
    })
    .collect();
  (mu, sigma)
}

fn bench_max_sharpe(c: &mut Criterion) {
  let mut group = c.benchmark_group("MaxSharpe");
  let cfg = OptimizerConfig::default();

  for n in [2usize, 10, 50, 200] {
    let (mu, sigma) = problem(n);
    group.bench_with_input(BenchmarkId::new("clarabel", n), &n, |b, _| {
      b.iter(|| black_box(max_sharpe(&mu, &sigma, &cfg)))
    });
  }
  group.finish();
}

fn bench_optimize(c: &mut Criterion) {
  let cfg = OptimizerConfig::default();
  let (mu, sigma) = problem(25);
  let tickers = (0..25).map(|i| format!("T{i:02}")).collect();
  let moments = Moments::new(tickers, mu, sigma, 250);

  c.bench_function("optimize_25", |b| {
    b.iter(|| black_box(optimize(&moments, &cfg)))
  });
}

criterion_group!(benches, bench_max_sharpe, bench_optimize);
criterion_main!(benches);
