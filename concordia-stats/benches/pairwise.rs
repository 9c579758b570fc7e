use criterion::{black_box, criterion_group, criterion_main, Criterion};
use concordia_stats::correlation::{kendall, StatsBackend};
use concordia_stats::normality::shapiro_wilk;
use concordia_stats::pairwise::{compute_pairwise, CorrMode, CorrelationOptions, MethodSeries, PairRule};

fn random_f64(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            (state >> 11) as f64 / (1u64 << 53) as f64
        })
        .collect()
}

fn method_series(methods: usize, rows: usize) -> Vec<MethodSeries> {
    let base = random_f64(rows, 7);
    (0..methods)
        .map(|m| {
            let noise = random_f64(rows, 100 + m as u64);
            let values = base.iter().zip(&noise).map(|(b, e)| b * 4.0 + e).collect();
            let p_values = random_f64(rows, 900 + m as u64)
                .into_iter()
                .map(|p| p * 0.1)
                .collect();
            MethodSeries::new(format!("method_{m}"), values, p_values)
        })
        .collect()
}

fn bench_pairwise(c: &mut Criterion) {
    let mut group = c.benchmark_group("pairwise");

    // 8 methods × 2000 gene/group rows → 28 pairs
    let series = method_series(8, 2_000);
    for (name, corr_mode) in [("auto", CorrMode::Auto), ("pearson", "pearson".parse().unwrap())] {
        let options = CorrelationOptions {
            pair_rule: PairRule::Any,
            corr_mode,
            ..CorrelationOptions::default()
        };
        group.bench_function(format!("8x2000_{name}"), |b| {
            b.iter(|| compute_pairwise(black_box(&series), &options))
        });
    }

    group.finish();
}

fn bench_kendall(c: &mut Criterion) {
    let mut group = c.benchmark_group("kendall");

    let x = random_f64(1_000, 42);
    let y = random_f64(1_000, 137);

    group.bench_function("1k_values", |b| {
        b.iter(|| kendall(black_box(&x), black_box(&y), StatsBackend::Extended))
    });

    group.finish();
}

fn bench_shapiro(c: &mut Criterion) {
    let mut group = c.benchmark_group("shapiro_wilk");

    let x = random_f64(5_000, 42);

    group.bench_function("5k_values", |b| b.iter(|| shapiro_wilk(black_box(&x))));

    group.finish();
}

criterion_group!(benches, bench_pairwise, bench_kendall, bench_shapiro);
criterion_main!(benches);
