// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Benchmarks for the booking engine.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Price calculation across rental lengths
//! - Conflict checks against growing booking histories
//! - Booking throughput, single- and multi-threaded
//! - Contention when many threads target few bikes

use bike_rental_rs::interval::{Slot, find_conflict};
use bike_rental_rs::{
    BikeId, BookingId, BookingStatus, Engine, NewBike, NewBooking, TimeRange, calculate_price,
};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

const HOUR: i64 = 3_600_000;
const DAY1: i64 = 1_767_225_600_000;

// =============================================================================
// Helper Functions
// =============================================================================

fn engine_with_bikes(count: usize) -> (Engine, Vec<BikeId>) {
    let engine = Engine::new();
    let bikes = (0..count)
        .map(|i| {
            engine
                .add_bike(NewBike::new(
                    format!("Bike {i}"),
                    "city",
                    Decimal::new(1000, 2),
                    Decimal::new(5000, 2),
                ))
                .unwrap()
                .id
        })
        .collect();
    (engine, bikes)
}

/// One-hour request in the `slot`-th hour after `DAY1`.
fn hourly_request(bike: BikeId, slot: i64) -> NewBooking {
    NewBooking::new(bike, "bench", DAY1 + slot * HOUR, DAY1 + (slot + 1) * HOUR)
}

fn hourly_slots(count: usize) -> Vec<Slot> {
    (0..count)
        .map(|i| Slot {
            id: BookingId(i as u32 + 1),
            range: TimeRange::new(DAY1 + i as i64 * HOUR, DAY1 + (i as i64 + 1) * HOUR).unwrap(),
            status: BookingStatus::Confirmed,
        })
        .collect()
}

// =============================================================================
// Pricing Benchmarks
// =============================================================================

fn bench_pricing(c: &mut Criterion) {
    let mut group = c.benchmark_group("pricing");
    let hourly = Decimal::new(1250, 2);
    let daily = Decimal::new(4999, 2);

    for (label, length) in [("90min", 90 * 60_000), ("25h", 25 * HOUR), ("30d", 30 * 24 * HOUR)] {
        group.bench_function(label, |b| {
            b.iter(|| {
                calculate_price(
                    black_box(DAY1),
                    black_box(DAY1 + length),
                    black_box(hourly),
                    black_box(daily),
                )
                .unwrap()
            })
        });
    }
    group.finish();
}

// =============================================================================
// Conflict Benchmarks
// =============================================================================

fn bench_conflict_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("conflict_scan");

    for count in [10, 100, 1_000, 10_000].iter() {
        let slots = hourly_slots(*count);
        // Past the last slot, so every scan walks the full list.
        let candidate =
            TimeRange::new(DAY1 + *count as i64 * HOUR, DAY1 + (*count as i64 + 1) * HOUR)
                .unwrap();

        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| find_conflict(black_box(&candidate), &slots, None))
        });
    }
    group.finish();
}

// =============================================================================
// Single-Threaded Benchmarks
// =============================================================================

fn bench_single_booking(c: &mut Criterion) {
    c.bench_function("single_booking", |b| {
        b.iter(|| {
            let (engine, bikes) = engine_with_bikes(1);
            engine
                .create_booking(black_box(hourly_request(bikes[0], 0)))
                .unwrap();
        })
    });
}

fn bench_booking_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("booking_throughput");

    for count in [100, 1_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let (engine, bikes) = engine_with_bikes(10);
                for i in 0..count {
                    let bike = bikes[i % bikes.len()];
                    let slot = (i / bikes.len()) as i64;
                    engine.create_booking(hourly_request(bike, slot)).unwrap();
                }
                black_box(&engine);
            })
        });
    }
    group.finish();
}

fn bench_booking_lifecycle(c: &mut Criterion) {
    c.bench_function("booking_lifecycle", |b| {
        b.iter_batched(
            || engine_with_bikes(1),
            |(engine, bikes)| {
                let booking = engine.create_booking(hourly_request(bikes[0], 0)).unwrap();
                engine
                    .update_booking_times(booking.id, None, Some(DAY1 + 3 * HOUR))
                    .unwrap();
                engine
                    .transition_status(booking.id, BookingStatus::Confirmed)
                    .unwrap();
                engine
                    .transition_status(booking.id, BookingStatus::Completed)
                    .unwrap();
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_booking_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("booking_history");

    // Each new booking scans the bike's existing bookings.
    for history_size in [100, 1_000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(history_size),
            history_size,
            |b, &history_size| {
                b.iter_batched(
                    || {
                        let (engine, bikes) = engine_with_bikes(1);
                        for slot in 0..history_size {
                            engine
                                .create_booking(hourly_request(bikes[0], slot as i64))
                                .unwrap();
                        }
                        (engine, bikes[0])
                    },
                    |(engine, bike)| {
                        engine
                            .create_booking(black_box(hourly_request(bike, history_size as i64)))
                            .unwrap();
                    },
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }
    group.finish();
}

// =============================================================================
// Multi-Threaded Benchmarks
// =============================================================================

fn bench_parallel_bookings_different_bikes(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_bookings_different_bikes");
    let total = 1_000usize;

    group.throughput(Throughput::Elements(total as u64));
    group.bench_function("100_bikes", |b| {
        b.iter(|| {
            let (engine, bikes) = engine_with_bikes(100);
            let engine = Arc::new(engine);

            (0..total).into_par_iter().for_each(|i| {
                let bike = bikes[i % bikes.len()];
                let slot = (i / bikes.len()) as i64;
                engine.create_booking(hourly_request(bike, slot)).unwrap();
            });

            black_box(&engine);
        })
    });
    group.finish();
}

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("contention");
    let total_ops = 1_000usize;

    // Fewer bikes = more threads competing for the same bike lock
    for num_bikes in [1, 10, 100].iter() {
        group.throughput(Throughput::Elements(total_ops as u64));
        group.bench_with_input(
            BenchmarkId::new("bikes", num_bikes),
            num_bikes,
            |b, &num_bikes| {
                b.iter(|| {
                    let (engine, bikes) = engine_with_bikes(num_bikes);

                    // Half the requests collide with an earlier one.
                    (0..total_ops).into_par_iter().for_each(|i| {
                        let bike = bikes[i % num_bikes];
                        let slot = (i / (2 * num_bikes)) as i64;
                        let _ = engine.create_booking(hourly_request(bike, slot));
                    });

                    black_box(&engine);
                })
            },
        );
    }
    group.finish();
}

fn bench_thread_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("thread_scaling");
    let total = 10_000usize;

    for num_threads in [1, 2, 4, 8].iter() {
        group.throughput(Throughput::Elements(total as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_threads),
            num_threads,
            |b, &num_threads| {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build()
                    .unwrap();

                b.iter(|| {
                    let (engine, bikes) = engine_with_bikes(1_000);

                    pool.install(|| {
                        (0..total).into_par_iter().for_each(|i| {
                            let bike = bikes[i % bikes.len()];
                            let slot = (i / bikes.len()) as i64;
                            engine.create_booking(hourly_request(bike, slot)).unwrap();
                        });
                    });

                    black_box(&engine);
                })
            },
        );
    }
    group.finish();
}

// =============================================================================
// Criterion Groups
// =============================================================================

criterion_group!(calculation, bench_pricing, bench_conflict_scan,);

criterion_group!(
    single_threaded,
    bench_single_booking,
    bench_booking_throughput,
    bench_booking_lifecycle,
    bench_booking_history,
);

criterion_group!(
    multi_threaded,
    bench_parallel_bookings_different_bikes,
    bench_contention,
    bench_thread_scaling,
);

criterion_main!(calculation, single_threaded, multi_threaded);
