use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vitalsynth_stats::{seeded_rng, KMeans, KernelDensity, RandomForestRegressor, Regressor};

fn cohort(n: usize, dim: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| (0..dim).map(|d| ((i * 31 + d * 17) % 97) as f64 / 9.7).collect())
        .collect()
}

fn bench_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_forest_fit");
    for &n in &[25usize, 100, 400] {
        let x = cohort(n, 6);
        let y: Vec<Vec<f64>> = x
            .iter()
            .map(|r| vec![r[0] + r[1], r[2] * 0.5, r[3] - r[4], r[5]])
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut rf = RandomForestRegressor::new(100);
                rf.fit(black_box(&x), black_box(&y), &mut seeded_rng(Some(42)))
                    .expect("fit");
                rf
            })
        });
    }
    group.finish();
}

fn bench_density_and_clusters(c: &mut Criterion) {
    let real = cohort(26, 6);
    let kde = KernelDensity::fit(&real, 0.5).expect("kde");
    c.bench_function("kde_sample_then_kmeans_100x6", |b| {
        b.iter(|| {
            let mut rng = seeded_rng(Some(42));
            let samples = kde.sample(100, &mut rng);
            KMeans::new(5)
                .fit_predict(black_box(&samples), &mut rng)
                .expect("kmeans")
        })
    });
}

criterion_group!(benches, bench_forest, bench_density_and_clusters);
criterion_main!(benches);
