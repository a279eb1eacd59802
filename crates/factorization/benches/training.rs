//! Benchmarks for worker-side training
//!
//! Run with: cargo bench --package factorization
//!
//! Uses a synthetic shard so no dataset files are needed.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{DatasetShard, Rating};
use factorization::{FactorizationConfig, FactorizationEngine, RatingMatrix};

fn synthetic_shard(users: usize, items_per_user: usize) -> DatasetShard {
    let mut shard = DatasetShard::new("0");
    for user in 0..users {
        for k in 0..items_per_user {
            let item = (user * 7 + k * 13) % 2000;
            let value = ((user + k) % 5 + 1) as f64;
            shard.ratings.push(Rating::new(user.to_string(), item.to_string(), value));
        }
    }
    shard
}

fn bench_train(c: &mut Criterion) {
    let shard = synthetic_shard(1000, 40);
    let matrix = RatingMatrix::from_ratings(&shard.ratings);
    let engine = FactorizationEngine::new(FactorizationConfig::default().with_seed(42));

    c.bench_function("train_40k_ratings", |b| {
        b.iter(|| {
            let model = engine.train(black_box(&matrix));
            black_box(model)
        })
    });
}

fn bench_recommend(c: &mut Criterion) {
    let shard = synthetic_shard(1000, 40);
    let engine = FactorizationEngine::new(FactorizationConfig::default().with_seed(42));

    c.bench_function("recommend_end_to_end", |b| {
        b.iter(|| {
            let top = engine.recommend(black_box(&shard));
            black_box(top)
        })
    });
}

criterion_group!(benches, bench_train, bench_recommend);
criterion_main!(benches);
