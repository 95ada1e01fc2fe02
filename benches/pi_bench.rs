use criterion::{black_box, criterion_group, criterion_main, Criterion};

use deepcount::deleglise_rivat::pi_deleglise_rivat;
use deepcount::generate;
use deepcount::phi::phi;
use deepcount::pi_table::PiTable;

fn bench_pi_1e8(c: &mut Criterion) {
    let mut group = c.benchmark_group("pi");
    group.sample_size(10);
    group.bench_function("pi_deleglise_rivat(1e8)", |b| {
        b.iter(|| pi_deleglise_rivat(black_box(100_000_000), 1));
    });
    group.finish();
}

fn bench_pi_1e9_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("pi_parallel");
    group.sample_size(10);
    group.bench_function("pi_deleglise_rivat(1e9, 4 threads)", |b| {
        b.iter(|| pi_deleglise_rivat(black_box(1_000_000_000), 4));
    });
    group.finish();
}

fn bench_phi(c: &mut Criterion) {
    c.bench_function("phi(1e10, 1000)", |b| {
        b.iter(|| phi(black_box(10_000_000_000), black_box(1_000), 1));
    });
}

fn bench_pi_table_build(c: &mut Criterion) {
    c.bench_function("PiTable::new(1e8)", |b| {
        b.iter(|| PiTable::new(black_box(100_000_000), 1));
    });
}

fn bench_generate_primes(c: &mut Criterion) {
    c.bench_function("generate_primes(1e7)", |b| {
        b.iter(|| generate::generate_primes(black_box(10_000_000)));
    });
}

fn bench_generate_moebius(c: &mut Criterion) {
    c.bench_function("generate_moebius(1e7)", |b| {
        b.iter(|| generate::generate_moebius(black_box(10_000_000)));
    });
}

criterion_group!(
    benches,
    bench_pi_1e8,
    bench_pi_1e9_threads,
    bench_phi,
    bench_pi_table_build,
    bench_generate_primes,
    bench_generate_moebius,
);
criterion_main!(benches);
