//! Fleet Simulation
//!
//! Assigns pending delivery orders to drivers for one simulated day and
//! scores the outcome: profit after incentives and fuel, on-time rate,
//! driver utilization and a composite efficiency score.
//!
//! # Pipeline
//!
//! - [`cost`]: Travel time and fuel cost of a route under its traffic level
//! - [`capacity`]: Fatigue rule and remaining daily hours per driver
//! - [`assignment`]: Greedy value-first placement onto driver timelines
//! - [`incentives`]: Bonus and late penalty per delivered order
//! - [`kpi`]: Rollup of outcomes into a [`SimulationResult`](kpi::SimulationResult)
//!
//! [`simulation::run_simulation`] chains these stages over a
//! [`FleetSnapshot`](domain::FleetSnapshot). [`simulation::SimulationService`]
//! adds a store, run history and write-back, and [`api`] serves it over HTTP.

pub mod api;
pub mod assignment;
pub mod capacity;
pub mod config;
pub mod console;
pub mod cost;
pub mod demo_data;
pub mod domain;
pub mod dto;
pub mod error;
pub mod incentives;
pub mod kpi;
pub mod simulation;
pub mod store;
