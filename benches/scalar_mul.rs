use criterion::{criterion_group, criterion_main, Criterion};

use ws_ecc::p256_generator;

const K_HEX: &str = "c51e4753afdec1e6b6c6a5b992f43f8dd0c7a8933072708b6522468b2ffb06fd";

fn bench_scalar_mul(c: &mut Criterion) {
    let mut group = c.benchmark_group("p256");
    let k = hex::decode(K_HEX).unwrap();
    group.bench_function("bench_scalar_mul", |b| {
        b.iter(|| {
            let mut p = p256_generator();
            p.scalar_mul(&k, 0).unwrap();
        })
    });
    group.bench_function("bench_scalar_mul_blinded", |b| {
        b.iter(|| {
            let mut p = p256_generator();
            p.scalar_mul(&k, 0x9e3779b97f4a7c15).unwrap();
        })
    });
    group.finish();
}

fn bench_point_double(c: &mut Criterion) {
    let mut group = c.benchmark_group("p256");
    let mut p = p256_generator();
    group.bench_function("bench_point_double", |b| {
        b.iter(|| {
            p.double();
        })
    });
    group.finish();
}

fn bench_point_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("p256");
    let g = p256_generator();
    let mut p = p256_generator();
    p.double();
    group.bench_function("bench_point_add", |b| {
        b.iter(|| {
            p.add(&g).unwrap();
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_scalar_mul,
    bench_point_double,
    bench_point_add
);
criterion_main!(benches);
