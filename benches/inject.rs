//! Benchmarks for error map sampling and injection.

use bitflip::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_error_map_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("error_map_generate");

    for len in [1_024, 16_384, 131_072].iter() {
        let mut rng = StdRng::seed_from_u64(0);
        group.bench_with_input(BenchmarkId::from_parameter(len), len, |b, &len| {
            b.iter(|| ErrorMap::generate(black_box(len), 32, 1e-3, Device::Cpu, &mut rng).unwrap());
        });
    }

    group.finish();
}

fn bench_inject(c: &mut Criterion) {
    let mut group = c.benchmark_group("inject");

    for width in [16, 64, 128].iter() {
        let config = InjectorConfig::new()
            .with_probability(1e-4)
            .with_device(Device::Cpu)
            .with_param_names(["weight"])
            .with_seed(42);
        let mut injector = Injector::new(config).unwrap();
        let mut model = Sequential::new()
            .add(Linear::with_seed(*width, *width, Some(0)))
            .add(ReLU::new())
            .add(Linear::with_seed(*width, 10, Some(1)));

        group.bench_with_input(BenchmarkId::from_parameter(width), width, |b, _| {
            b.iter(|| injector.inject(black_box(&mut model)).unwrap());
        });
    }

    group.finish();
}

fn bench_to_sparse(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let map = ErrorMap::generate(131_072, 32, 1e-4, Device::Cpu, &mut rng).unwrap();

    c.bench_function("error_map_to_sparse", |b| {
        b.iter(|| black_box(&map).to_sparse());
    });
}

criterion_group!(benches, bench_error_map_generate, bench_inject, bench_to_sparse);
criterion_main!(benches);
