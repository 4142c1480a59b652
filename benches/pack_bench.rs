// benches/pack_bench.rs
// ============================================================================
// Pack Benchmark
// ============================================================================

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use wmmf_convert::sph::{pack_c, unpack_c};
use wmmf_convert::{Metadata, Model, SphCoeffSet};

fn generate_random_set(n: usize, m: usize) -> SphCoeffSet {
    let mut rng = rand::thread_rng();
    let mut set = SphCoeffSet::zeros(n, m);
    for d in 0..=n {
        for o in 0..=m.min(d) {
            set.c[(d, o)] = rng.gen_range(-30000.0..30000.0);
            if o > 0 {
                set.s[(d, o)] = rng.gen_range(-30000.0..30000.0);
            }
        }
    }
    set
}

fn bench_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pack");

    for degree in [6, 13, 60].iter() {
        let set = generate_random_set(*degree, *degree);

        group.bench_with_input(
            BenchmarkId::new("pack_set", degree),
            &set,
            |b, s| b.iter(|| black_box(s.pack().unwrap())),
        );

        let packed = pack_c(&set.c, *degree, *degree).unwrap();
        group.bench_with_input(
            BenchmarkId::new("unpack_c", degree),
            &packed,
            |b, p| b.iter(|| black_box(unpack_c(*degree, *degree, p).unwrap())),
        );
    }

    group.finish();
}

fn bench_save(c: &mut Criterion) {
    // Tamaño de IGRF-13: 25 épocas de grado 13
    let mut metadata = Metadata::default();
    metadata.name = "igrf13".to_string();
    metadata.num_models = 25;
    metadata.epoch = 1900;
    metadata.delta_epoch = 5;
    let epochs = metadata.get_years().unwrap().into_iter().map(|y| (y, generate_random_set(13, 13))).collect();
    let model = Model::new(metadata, epochs, generate_random_set(8, 8)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    c.bench_function("save_igrf13", |b| {
        b.iter(|| black_box(model.save(dir.path(), true).unwrap()))
    });
}

criterion_group!(benches, bench_pack, bench_save);
criterion_main!(benches);
