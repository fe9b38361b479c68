use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

use datacol::column::{BumpResource, Cell, Column, StringArena};
use datacol::core::Kind;

const RNG_SEED: u64 = 42;

fn bench_resize(c: &mut Criterion) {
    let mut group = c.benchmark_group("resize");
    for n in [1_000u32, 100_000, 1_000_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("one_by_one", n), &n, |b, &n| {
            b.iter(|| {
                let mut col = Column::new(Kind::Int);
                for i in 1..=n {
                    col.resize_with(i, Cell::from_int(Some(i as i64))).unwrap();
                }
                black_box(col.capacity())
            })
        });
        group.bench_with_input(BenchmarkId::new("one_by_one_bump", n), &n, |b, &n| {
            b.iter(|| {
                let res = BumpResource::new();
                let mut col = Column::with_resource(Kind::Int, &res);
                for i in 1..=n {
                    col.resize_with(i, Cell::from_int(Some(i as i64))).unwrap();
                }
                black_box(col.capacity())
            })
        });
    }
    group.finish();
}

fn bench_read_strings(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(RNG_SEED);
    let arena = StringArena::new();
    let n = 100_000u32;
    let mut col = Column::new(Kind::String);
    col.resize(n).unwrap();
    for pos in 0..n {
        let len = rng.gen_range(1..24);
        let s: String = (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect();
        col.set_string(pos, &s, &arena).unwrap();
    }

    let mut group = c.benchmark_group("read");
    group.throughput(Throughput::Elements(n as u64));
    group.bench_function("strings_mixed_inline", |b| {
        b.iter(|| {
            let total: usize = col
                .values()
                .map(|v| v.as_bytes().map_or(0, <[u8]>::len))
                .sum();
            black_box(total)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_resize, bench_read_strings);
criterion_main!(benches);
