use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cryptex::chunk::ChunkOptions;
use cryptex::vault::{self, VaultOptions};

const SIZES: [usize; 3] = [64 * 1024, 4 * 1024 * 1024, 16 * 1024 * 1024];

fn options(parallel: bool) -> VaultOptions {
    VaultOptions {
        kdf_iterations: 1_000,
        chunks: ChunkOptions::new(parallel, 0),
    }
}

fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn bench_encrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("encrypt");
    group.sample_size(10);

    for size in SIZES {
        let data = sample(size);
        group.throughput(Throughput::Bytes(size as u64));

        for parallel in [false, true] {
            let opts = options(parallel);
            let label = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(label, size), &data, |b, data| {
                b.iter(|| {
                    vault::encrypt_file(
                        black_box(data),
                        "bench.bin",
                        "application/octet-stream",
                        "bench",
                        &opts,
                        None,
                        &mut (),
                    )
                })
            });
        }
    }

    group.finish();
}

fn bench_decrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("decrypt");
    group.sample_size(10);

    for size in SIZES {
        // video/* skips compression so the numbers reflect AEAD cost
        let opts = options(true);
        let blob = match vault::encrypt_file(
            &sample(size),
            "bench.mp4",
            "video/mp4",
            "bench",
            &opts,
            None,
            &mut (),
        ) {
            Ok(blob) => blob,
            Err(e) => panic!("setup failed: {}", e),
        };
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("parallel", size), &blob, |b, blob| {
            b.iter(|| vault::decrypt_file(black_box(blob), "bench", &opts, &mut ()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encrypt, bench_decrypt);
criterion_main!(benches);
