//! Benchmark suite for lexicon-algo
//!
//! Run with: cargo bench

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lexicon_algo::{Card, CardState, Parameters, Rating, Scheduler};

fn review_card() -> Card {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Card {
        state: CardState::Review,
        step: 0,
        stability: 42.0,
        difficulty: 5.5,
        due: now,
        last_review: Some(now - Duration::days(40)),
        reps: 12,
        lapses: 1,
        scheduled_days: 40,
        elapsed_days: 40,
    }
}

fn bench_review(c: &mut Criterion) {
    let scheduler = Scheduler::new(Parameters::default()).unwrap();
    let card = review_card();
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    c.bench_function("Scheduler::review (Review, Good)", |b| {
        b.iter(|| scheduler.review(black_box(&card), black_box(Rating::Good), now))
    });

    c.bench_function("Scheduler::preview", |b| {
        b.iter(|| scheduler.preview(black_box(&card), now))
    });

    let new_card = Card::new(now);
    c.bench_function("Scheduler::review (New, Easy)", |b| {
        b.iter(|| scheduler.review(black_box(&new_card), black_box(Rating::Easy), now))
    });
}

criterion_group!(benches, bench_review);
criterion_main!(benches);
