use arena_containers::{Handle, HashTable, TableConfig};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn filled(seed: u64, n: usize) -> (HashTable<String, u64>, Vec<String>) {
    let mut t = HashTable::new();
    let keys: Vec<String> = lcg(seed).take(n).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        t.insert(k.clone(), i as u64).unwrap();
    }
    (t, keys)
}

// Precomputed pseudo-random picks from `0..n`.
fn picks(n: usize, count: usize) -> Vec<usize> {
    let mut s = 0x9e3779b97f4a7c15u64;
    (0..count)
        .map(|_| {
            s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
            (s as usize) % n
        })
        .collect()
}

fn bench_insert_fresh_100k(c: &mut Criterion) {
    c.bench_function("table::insert_fresh_100k", |b| {
        b.iter_batched(
            HashTable::<String, u64>::new,
            |mut t| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    t.insert(key(x), i as u64).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_reserved_100k(c: &mut Criterion) {
    c.bench_function("table::insert_reserved_100k", |b| {
        b.iter_batched(
            || {
                let mut t = HashTable::<String, u64>::new();
                t.reserve(100_000);
                t
            },
            |mut t| {
                for (i, x) in lcg(3).take(100_000).enumerate() {
                    t.insert(key(x), i as u64).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("table::insert_load_factor_4_100k", |b| {
        let cfg = TableConfig::default().with_max_load_factor(4.0);
        b.iter_batched(
            || HashTable::<String, u64>::with_config(cfg).unwrap(),
            |mut t| {
                for (i, x) in lcg(4).take(100_000).enumerate() {
                    t.insert(key(x), i as u64).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_erase_random_10k(c: &mut Criterion) {
    c.bench_function("table::erase_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let (t, keys) = filled(5, 110_000);
                let to_erase: Vec<String> = picks(keys.len(), 10_000)
                    .into_iter()
                    .map(|i| keys[i].clone())
                    .collect();
                (t, to_erase)
            },
            |(mut t, to_erase)| {
                for k in &to_erase {
                    black_box(t.erase(k));
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_hit_10k(c: &mut Criterion) {
    c.bench_function("table::find_hit_10k_on_100k", |b| {
        let (t, keys) = filled(7, 100_000);
        let queries: Vec<&String> = picks(keys.len(), 10_000).into_iter().map(|i| &keys[i]).collect();
        b.iter(|| {
            for k in &queries {
                black_box(t.find(*k));
            }
        })
    });
}

fn bench_find_miss_10k(c: &mut Criterion) {
    c.bench_function("table::find_miss_10k_on_100k", |b| {
        let (t, _) = filled(11, 100_000);
        let misses: Vec<String> = lcg(0xdead_beef).take(10_000).map(key).collect();
        b.iter(|| {
            for k in &misses {
                black_box(t.find(k));
            }
        })
    });
}

fn bench_handle_access_increment(c: &mut Criterion) {
    c.bench_function("table::handle_access_increment_10k", |b| {
        b.iter_batched(
            || {
                let mut t = HashTable::new();
                let handles: Vec<Handle> = lcg(123)
                    .take(100_000)
                    .enumerate()
                    .map(|(i, x)| t.insert(key(x), i as u64).unwrap())
                    .collect();
                let targets: Vec<Handle> = picks(handles.len(), 10_000)
                    .into_iter()
                    .map(|i| handles[i])
                    .collect();
                (t, targets)
            },
            |(mut t, targets)| {
                for h in targets {
                    if let Some(v) = h.value_mut(&mut t) {
                        *v = v.wrapping_add(1);
                    }
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_iteration(c: &mut Criterion) {
    let (t, _) = filled(999, 100_000);

    c.bench_function("table::iter_order_100k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for (_, v) in t.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });

    c.bench_function("table::iter_buckets_100k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for (_, v) in t.bucket_iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });

    c.bench_function("table::values_mut_increment_100k", |b| {
        b.iter_batched(
            || t.clone(),
            |mut t| {
                for v in t.values_mut() {
                    *v = v.wrapping_add(1);
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_rehash(c: &mut Criterion) {
    c.bench_function("table::rehash_double_100k", |b| {
        let (t, _) = filled(31, 100_000);
        b.iter_batched(
            || t.clone(),
            |mut t| {
                let n = t.bucket_count() * 2;
                t.rehash(n);
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_insert_fresh_100k, bench_insert_reserved_100k
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_erase_random_10k,
              bench_find_hit_10k,
              bench_find_miss_10k,
              bench_handle_access_increment,
              bench_iteration,
              bench_rehash
}
criterion_main!(benches_insert, benches_ops);
