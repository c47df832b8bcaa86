use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use packlock_hash::{FnvHash64, HashFunction, Sha512Hash};

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn bench_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_streaming_4k_chunks");
    for size in [64 * 1024, 1024 * 1024] {
        let data = payload(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("fnv1a64", size), &data, |b, data| {
            b.iter(|| {
                let mut hash = FnvHash64::new();
                for chunk in data.chunks(4096) {
                    hash.update_all(chunk).unwrap();
                }
                hash.finalize().unwrap()
            });
        });
        group.bench_with_input(BenchmarkId::new("sha512", size), &data, |b, data| {
            b.iter(|| {
                let mut hash = Sha512Hash::new();
                for chunk in data.chunks(4096) {
                    hash.update_all(chunk).unwrap();
                }
                hash.finalize().unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_streaming);
criterion_main!(benches);
