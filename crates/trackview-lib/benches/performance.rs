//! Performance benchmarks for trackview-lib
//!
//! Run with: cargo bench --package trackview-lib

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geo::Point;
use std::hint::black_box;
use time::macros::datetime;
use trackview_lib::{
    Axis, CancellationToken, Haversine, Track, TrackPoint, TrackSegment, nearest_index,
    repair_track,
};

/// Generate a realistic recording with one point per second and every
/// fifth elevation sample missing
fn generate_track(num_points: usize, base_lat: f64, base_lon: f64) -> Track {
    let start = datetime!(2024-01-01 00:00:00 UTC);
    let mut segment = TrackSegment::new();

    for i in 0..num_points {
        let t = i as f64 / num_points as f64;
        let lat = base_lat + t * 0.1 + (t * 50.0).sin() * 0.001;
        let lon = base_lon + t * 0.1 + (t * 30.0).cos() * 0.001;
        let point = TrackPoint::new(
            Point::new(lon, lat),
            Some(start + time::Duration::seconds(i as i64)),
        );
        let point = if i % 5 == 0 && i != 0 && i + 1 != num_points {
            point
        } else {
            point.with_elevation(400.0 + (t * 20.0).sin() * 50.0)
        };
        segment.push(point);
    }

    let mut track = Track::with_name("bench");
    track.add_segment(segment);
    track
}

fn bench_repair(c: &mut Criterion) {
    let mut group = c.benchmark_group("repair");

    for size in [1_000, 10_000, 100_000] {
        let track = generate_track(size, 51.5, -0.1);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("repair_track", size), &track, |b, track| {
            b.iter_batched(
                || track.clone(),
                |mut track| {
                    repair_track(&mut track, &Haversine, &CancellationToken::new()).unwrap();
                    black_box(track)
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest");

    let mut track = generate_track(50_000, 51.5, -0.1);
    repair_track(&mut track, &Haversine, &CancellationToken::new()).unwrap();
    let distances: Vec<f64> = track.points().map(TrackPoint::distance).collect();
    let total = distances.last().copied().unwrap_or(0.0);

    group.bench_function("nearest_index_distance", |b| {
        let mut query = 0.0;
        b.iter(|| {
            query = (query + 137.0) % total;
            black_box(nearest_index(&distances, black_box(query)))
        })
    });

    group.bench_function("track_nearest_point_time", |b| {
        b.iter(|| black_box(track.nearest_point(Axis::Time, black_box(25_000_000.0))))
    });

    group.finish();
}

criterion_group!(benches, bench_repair, bench_nearest);
criterion_main!(benches);
