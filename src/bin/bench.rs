//! Benchmark for end-to-end simulation throughput.
//!
//! Run with: cargo run --release --bin bench

use chrono::NaiveTime;
use rayon::prelude::*;
use std::time::Instant;

use fleet_simulation::config::SimulationPolicy;
use fleet_simulation::demo_data::{self, DemoData};
use fleet_simulation::domain::SimulationRequest;
use fleet_simulation::dto::SimulationResultDto;
use fleet_simulation::simulation::run_simulation;

const RUNS: usize = 200;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let fleet = demo_data::generate(DemoData::Large);
    let policy = SimulationPolicy::default();
    let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default();

    println!("Benchmark: Simulation Runs");
    println!("  Drivers: {}", fleet.drivers.len());
    println!("  Routes: {}", fleet.routes.len());
    println!("  Orders: {}", fleet.orders.len());
    println!();

    // Sequential runs over a growing driver pool
    let bench_start = Instant::now();
    let mut delivered = 0usize;
    for i in 0..RUNS {
        let request = SimulationRequest::new(1 + i % fleet.drivers.len(), start, 8.0);
        delivered += run_simulation(&fleet, &request, &policy)?.delivered();
    }
    let elapsed = bench_start.elapsed();

    println!("Results:");
    println!("  Runs: {}", RUNS);
    println!("  Deliveries scored: {}", delivered);
    println!("  Time: {:.2?}", elapsed);
    println!("  Runs/sec: {:.0}", RUNS as f64 / elapsed.as_secs_f64());

    // Parallel runs of one request must match the sequential result exactly
    let request = SimulationRequest::new(fleet.drivers.len(), start, 8.0);
    let expected = serde_json::to_string(&SimulationResultDto::from_result(&run_simulation(
        &fleet, &request, &policy,
    )?))?;

    let par_start = Instant::now();
    let results = (0..RUNS)
        .into_par_iter()
        .map(|_| {
            run_simulation(&fleet, &request, &policy)
                .map(|result| SimulationResultDto::from_result(&result))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let par_elapsed = par_start.elapsed();

    for result in &results {
        assert_eq!(serde_json::to_string(result)?, expected, "Parallel run diverged!");
    }
    println!("  Parallel time: {:.2?}", par_elapsed);
    println!("  Parallel results: {} (verified)", results.len());
    Ok(())
}
