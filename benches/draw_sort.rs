use criterion::{black_box, criterion_group, criterion_main, Criterion};

use imdraw::{name_hash, RenderState};

// ---------------------------------------------------------------------------
// Key packing
// ---------------------------------------------------------------------------

fn bench_key_pack(c: &mut Criterion) {
    c.bench_function("render_state_pack_unpack", |b| {
        b.iter(|| {
            let state = RenderState::pack(
                black_box(2),
                black_box(17),
                black_box(123_456),
                black_box(987_654),
            );
            black_box((
                state.fullscreen(),
                state.hud(),
                state.depth(),
                state.translucency(),
            ));
        });
    });
}

// ---------------------------------------------------------------------------
// Name hashing
// ---------------------------------------------------------------------------

fn bench_name_hash(c: &mut Criterion) {
    c.bench_function("name_hash_short", |b| {
        b.iter(|| black_box(name_hash(black_box("a_position"))));
    });
}

// ---------------------------------------------------------------------------
// Queue sorting
// ---------------------------------------------------------------------------

fn pseudo_random_keys(count: usize) -> Vec<u64> {
    // Deterministic xorshift so runs are comparable.
    let mut state = 0x2545_f491_4f6c_dd1du64;
    (0..count)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        })
        .collect()
}

fn bench_sort_small(c: &mut Criterion) {
    let keys = pseudo_random_keys(64);
    c.bench_function("sort_draw_keys_64", |b| {
        b.iter(|| {
            let mut keys = keys.clone();
            keys.sort_unstable();
            black_box(&keys);
        });
    });
}

fn bench_sort_large(c: &mut Criterion) {
    let keys = pseudo_random_keys(4096);
    c.bench_function("sort_draw_keys_4096", |b| {
        b.iter(|| {
            let mut keys = keys.clone();
            keys.sort_unstable();
            black_box(&keys);
        });
    });
}

criterion_group!(
    benches,
    bench_key_pack,
    bench_name_hash,
    bench_sort_small,
    bench_sort_large
);
criterion_main!(benches);
