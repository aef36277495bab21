//! Criterion benchmarks for the planning pipeline.
//!
//! Measures end-to-end planning with the insertion engine across problem
//! sizes to track performance and detect regressions.
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench --package courier-solver
//! ```

#![allow(missing_docs, reason = "Criterion macros generate undocumented code")]

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use courier_core::Planner;
use courier_engine::InsertionEngine;
use courier_solver::CpPlanner;


use bench_support::{BENCHMARK_SEED, generate_request};

/// Stop counts to benchmark.
const PROBLEM_SIZES: &[usize] = &[10, 20, 40];

/// Trucks available in every benchmark request.
const VEHICLES: usize = 3;

fn bench_plan_times(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_time");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(10));

    let planner = CpPlanner::<InsertionEngine>::new();
    for &size in PROBLEM_SIZES {
        let request = generate_request(size, VEHICLES, BENCHMARK_SEED);

        #[expect(
            clippy::as_conversions,
            reason = "Safe conversion for small problem sizes"
        )]
        let throughput_size = size as u64;
        group.throughput(Throughput::Elements(throughput_size));
        group.bench_with_input(BenchmarkId::new("stops", size), &size, |b, _| {
            b.iter(|| {
                #[expect(
                    clippy::let_underscore_must_use,
                    reason = "Benchmarking planning performance, result is intentionally discarded"
                )]
                let _ = planner.plan(&request);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_plan_times);
criterion_main!(benches);
