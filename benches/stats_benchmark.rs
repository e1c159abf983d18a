// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stridesync::models::{LocationSample, NewShoe, Run, Shoe, StatsPeriod};
use stridesync::services::{route, stats};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn shoes(count: usize) -> Vec<Shoe> {
    (0..count)
        .map(|i| {
            Shoe::from_new(
                NewShoe {
                    name: format!("Shoe {}", i),
                    brand: "Asics".to_string(),
                    model: "Novablast".to_string(),
                    purchase_date: None,
                    max_distance: 800.0,
                    notes: None,
                },
                now(),
            )
        })
        .collect()
}

/// Roughly two years of near-daily runs spread across `shoes`.
fn runs(shoes: &[Shoe], count: usize) -> Vec<Run> {
    (0..count)
        .map(|i| {
            let start = now() - Duration::hours(i as i64 * 17);
            let shoe = &shoes[i % shoes.len()];
            let mut run = Run::new_draft(start, Some(shoe.id.clone()));
            run.distance = 4.0 + (i % 13) as f64;
            run.duration = (run.distance * 320.0) as u64;
            run.end_time = Some(start + Duration::seconds(run.duration as i64));
            run.refresh_pace();
            run
        })
        .collect()
}

/// A ~10 km out-and-back track sampled every second.
fn path(samples: usize) -> Vec<LocationSample> {
    (0..samples)
        .map(|i| {
            let leg = (i % 1000) as f64 / 1000.0;
            LocationSample {
                latitude: 37.33 + 0.045 * leg,
                longitude: -122.03 + 0.0005 * (i as f64 / 50.0).sin(),
                timestamp: now() + Duration::seconds(i as i64),
                altitude: None,
                accuracy: Some(5.0),
                speed: None,
            }
        })
        .collect()
}

fn benchmark_stats(c: &mut Criterion) {
    let shoes = shoes(6);
    let runs = runs(&shoes, 1000);
    let first_shoe_runs: Vec<Run> = runs
        .iter()
        .filter(|run| run.shoe_id.as_deref() == Some(shoes[0].id.as_str()))
        .cloned()
        .collect();

    let mut group = c.benchmark_group("stats");

    group.bench_function("shoe_stats", |b| {
        b.iter(|| stats::shoe_stats(black_box(&shoes[0]), black_box(&first_shoe_runs), now()))
    });

    group.bench_function("run_stats_year", |b| {
        b.iter(|| stats::run_stats(black_box(&runs), StatsPeriod::Year, now()))
    });

    group.bench_function("usage_trends_12", |b| {
        b.iter(|| stats::usage_trends(black_box(&runs), black_box(&shoes), 12, now()))
    });

    group.finish();
}

fn benchmark_route(c: &mut Criterion) {
    let path = path(3600);

    let mut group = c.benchmark_group("route");

    group.bench_function("path_distance_1h", |b| {
        b.iter(|| route::path_distance_km(black_box(&path)))
    });

    group.bench_function("encode_path_1h", |b| {
        b.iter(|| route::encode_path(black_box(&path)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_stats, benchmark_route);
criterion_main!(benches);
