//! Benchmarks for weight generation and First Fit packing.
//!
//! Measures a full generate-then-pack trial at the item counts used in
//! experiments.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use u_firstfit_core::{Capacity, ControlParameters, FirstFitPacker, WeightGenerator, WeightShape};

fn bench_first_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_fit");

    for &n in &[50usize, 100, 150] {
        let weights: Vec<f64> = (0..n).map(|i| 1.0 + ((i * 37) % 200) as f64).collect();
        let packer = FirstFitPacker::new(200.0).unwrap();

        group.bench_with_input(BenchmarkId::new("pack", n), &weights, |b, w| {
            b.iter(|| black_box(packer.count(black_box(w))))
        });
    }
    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generator");

    for shape in [WeightShape::normal(), WeightShape::Uniform, WeightShape::Exponential] {
        let params = ControlParameters::new(100, shape, Capacity::Units(200))
            .with_large_items_ratio(0.3)
            .with_standard_ratio(0.4);
        let generator = WeightGenerator::new(params).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        group.bench_function(BenchmarkId::new("generate", shape.label()), |b| {
            b.iter(|| black_box(generator.generate(&mut rng)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_first_fit, bench_generate);
criterion_main!(benches);
