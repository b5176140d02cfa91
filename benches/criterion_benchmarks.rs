use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use detools::apply::apply_patch_in_place;
use detools::compress::crle;
use detools::{Compression, CreateOptions, apply_patch_vec, create_patch_vec};
use std::fs;
use std::path::Path;

const COMPRESSIONS: [Compression; 3] = [Compression::None, Compression::Lzma, Compression::Crle];

fn gen_data(size: usize, seed: u64) -> Vec<u8> {
    let mut s = seed;
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        out.push((s >> 33) as u8);
    }
    out
}

fn mutate(base: &[u8], stride: usize) -> Vec<u8> {
    let mut out = base.to_vec();
    for i in (0..out.len()).step_by(stride.max(1)) {
        out[i] = out[i].wrapping_add(1);
    }
    out
}

fn create(from: &[u8], to: &[u8], compression: Compression) -> Vec<u8> {
    create_patch_vec(from, to, &CreateOptions::default().with_compression(compression)).unwrap()
}

fn write_ratio_snapshot() {
    let from = gen_data(2 * 1024 * 1024, 123);
    let to = mutate(&from, 4096);
    let mut csv = String::from("compression,patch_bytes,to_bytes,ratio\n");
    for compression in COMPRESSIONS {
        let patch = create(&from, &to, compression);
        let ratio = patch.len() as f64 / to.len() as f64;
        csv.push_str(&format!("{compression},{},{},{}\n", patch.len(), to.len(), ratio));
    }
    let out_dir = Path::new("target/criterion/custom_reports");
    let _ = fs::create_dir_all(out_dir);
    let _ = fs::write(out_dir.join("ratio_snapshot.csv"), csv);
}

fn bench_create_speed(c: &mut Criterion) {
    let mut g = c.benchmark_group("create_speed_mb_s");
    for size in [64 * 1024usize, 1024 * 1024, 4 * 1024 * 1024] {
        let from = gen_data(size, 1);
        let to = mutate(&from, 1024);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let patch = create(black_box(&from), black_box(&to), Compression::None);
                black_box(patch);
            });
        });
    }
    g.finish();
}

fn bench_apply_speed(c: &mut Criterion) {
    let mut g = c.benchmark_group("apply_speed_vs_to");
    for size in [64 * 1024usize, 1024 * 1024, 4 * 1024 * 1024] {
        let from = gen_data(size, 2);
        let to = mutate(&from, 2048);
        let patch = create(&from, &to, Compression::Crle);
        g.throughput(Throughput::Bytes(to.len() as u64));
        g.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let out = apply_patch_vec(black_box(&from), black_box(&patch)).unwrap();
                black_box(out);
            });
        });
    }
    g.finish();
}

fn bench_ratio_vs_compression(c: &mut Criterion) {
    write_ratio_snapshot();
    let mut g = c.benchmark_group("patch_ratio_vs_compression");
    let from = gen_data(1024 * 1024, 3);
    let to = mutate(&from, 4096);
    for compression in COMPRESSIONS {
        g.bench_with_input(
            BenchmarkId::from_parameter(compression),
            &compression,
            |b, compression| {
                b.iter(|| {
                    let patch = create(&from, &to, *compression);
                    let ratio = patch.len() as f64 / to.len() as f64;
                    black_box(ratio);
                });
            },
        );
    }
    g.finish();
}

fn bench_crle(c: &mut Criterion) {
    let mut g = c.benchmark_group("crle_throughput");
    let mut data = vec![0u8; 1024 * 1024];
    for (i, byte) in data.iter_mut().enumerate().step_by(97) {
        *byte = i as u8;
    }
    g.throughput(Throughput::Bytes(data.len() as u64));
    g.bench_function("compress", |b| {
        b.iter(|| black_box(crle::compress(black_box(&data))));
    });
    let compressed = crle::compress(&data);
    g.bench_function("decompress", |b| {
        b.iter(|| black_box(crle::decompress(black_box(&compressed), data.len()).unwrap()));
    });
    g.finish();
}

fn bench_in_place_segments(c: &mut Criterion) {
    let mut g = c.benchmark_group("in_place_vs_segment_size");
    let from = gen_data(512 * 1024, 4);
    let to = mutate(&from, 1024);
    for segment_size in [16 * 1024usize, 64 * 1024, 256 * 1024] {
        let opts = CreateOptions::in_place(1024 * 1024, segment_size)
            .with_compression(Compression::Crle);
        let patch = create_patch_vec(&from, &to, &opts).unwrap();
        g.bench_with_input(
            BenchmarkId::from_parameter(segment_size),
            &segment_size,
            |b, _| {
                b.iter(|| {
                    let mut memory = from.clone();
                    apply_patch_in_place(&mut memory, black_box(&patch)).unwrap();
                    black_box(memory);
                });
            },
        );
    }
    g.finish();
}

fn bench_real_world_scenarios(c: &mut Criterion) {
    let mut g = c.benchmark_group("real_world_scenarios");
    let scenarios = [
        ("firmware_update", 1024 * 1024usize, 1024usize),
        ("config_blob", 64 * 1024usize, 256usize),
        ("filesystem_image", 4 * 1024 * 1024usize, 4096usize),
    ];

    for (name, size, stride) in scenarios {
        let from = gen_data(size, size as u64);
        let to = mutate(&from, stride);
        g.throughput(Throughput::Bytes(size as u64));
        g.bench_function(name, |b| {
            b.iter(|| {
                let patch = create(&from, &to, Compression::Lzma);
                let out = apply_patch_vec(&from, &patch).unwrap();
                black_box(out);
            });
        });
    }
    g.finish();
}

criterion_group!(
    benches,
    bench_create_speed,
    bench_apply_speed,
    bench_ratio_vs_compression,
    bench_crle,
    bench_in_place_segments,
    bench_real_world_scenarios
);
criterion_main!(benches);
