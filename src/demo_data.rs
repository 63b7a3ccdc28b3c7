//! Demo data generators for fleet simulation.
//!
//! Datasets are seeded, so every call returns the same fleet.

use chrono::NaiveTime;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::domain::{Driver, FleetSnapshot, Order, Route, TrafficLevel, DAYS_PER_WEEK};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoData {
    Small,
    Large,
}

impl std::str::FromStr for DemoData {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMALL" => Ok(DemoData::Small),
            "LARGE" => Ok(DemoData::Large),
            _ => Err(()),
        }
    }
}

impl DemoData {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoData::Small => "SMALL",
            DemoData::Large => "LARGE",
        }
    }

    fn parameters(&self) -> DemoDataParameters {
        match self {
            DemoData::Small => DemoDataParameters {
                seed: 0,
                driver_count: 10,
                route_count: 10,
                order_count: 50,
                inactive_driver_rate: 0.1,
                inactive_route_rate: 0.1,
                deadline_rate: 0.6,
                heavy_week_rate: 0.2,
            },
            DemoData::Large => DemoDataParameters {
                seed: 1,
                driver_count: 60,
                route_count: 40,
                order_count: 600,
                inactive_driver_rate: 0.05,
                inactive_route_rate: 0.05,
                deadline_rate: 0.5,
                heavy_week_rate: 0.25,
            },
        }
    }
}

struct DemoDataParameters {
    seed: u64,
    driver_count: usize,
    route_count: usize,
    order_count: usize,
    inactive_driver_rate: f64,
    inactive_route_rate: f64,
    /// Share of orders with a delivery deadline.
    deadline_rate: f64,
    /// Share of drivers whose past week pushes them into fatigue.
    heavy_week_rate: f64,
}

/// List of available demo data sets.
pub fn list_demo_data() -> Vec<&'static str> {
    vec!["SMALL", "LARGE"]
}

/// Generates a demo fleet of the given size.
///
/// # Examples
///
/// ```
/// use fleet_simulation::demo_data::{generate, DemoData};
///
/// let fleet = generate(DemoData::Small);
/// assert_eq!(fleet.drivers.len(), 10);
/// assert_eq!(fleet.orders.len(), 50);
/// assert!(fleet.validate().is_ok());
/// ```
pub fn generate(demo: DemoData) -> FleetSnapshot {
    let params = demo.parameters();
    let mut rng = StdRng::seed_from_u64(params.seed);

    let names = generate_name_permutations(&mut rng);
    let drivers: Vec<Driver> = (0..params.driver_count)
        .map(|i| {
            let heavy = rng.gen_bool(params.heavy_week_rate);
            let mut week = [0.0; DAYS_PER_WEEK];
            for day in week.iter_mut() {
                *day = if heavy {
                    half_hours(&mut rng, 14, 22)
                } else {
                    half_hours(&mut rng, 0, 16)
                };
            }
            let driver = Driver::new(format!("D{}", i + 1), names[i % names.len()].clone())
                .with_current_shift_hours(half_hours(&mut rng, 0, 12))
                .with_past_week_hours(week);
            if rng.gen_bool(params.inactive_driver_rate) {
                driver.inactive()
            } else {
                driver
            }
        })
        .collect();

    let routes: Vec<Route> = (0..params.route_count)
        .map(|i| {
            let distance_km = (rng.gen_range(2.0..25.0_f64) * 10.0).round() / 10.0;
            let traffic = TrafficLevel::ALL[i % TrafficLevel::ALL.len()];
            let minutes_per_km = rng.gen_range(2.0..4.0_f64);
            let base_time_min = (distance_km * minutes_per_km).round().max(5.0);
            let route = Route::new(format!("R{}", i + 1), distance_km, traffic, base_time_min);
            if rng.gen_bool(params.inactive_route_rate) {
                route.inactive()
            } else {
                route
            }
        })
        .collect();

    let orders: Vec<Order> = (0..params.order_count)
        .map(|i| {
            let value_rs = rng.gen_range(10..=250) as f64 * 10.0;
            let route_id = routes
                .choose(&mut rng)
                .map(|r| r.route_id.clone())
                .unwrap_or_default();
            let order = Order::new(format!("O{}", i + 1), value_rs, route_id);
            if rng.gen_bool(params.deadline_rate) {
                // 10:00 to 18:00 in quarter hours
                let minute = 600 + 15 * rng.gen_range(0..=32);
                order.with_deadline(time(minute / 60, minute % 60))
            } else {
                order
            }
        })
        .collect();

    FleetSnapshot::new(drivers, routes, orders)
}

/// Generates demo data by name.
///
/// ```
/// use fleet_simulation::demo_data::generate_by_name;
///
/// assert!(generate_by_name("large").is_some());
/// assert!(generate_by_name("HUGE").is_none());
/// ```
pub fn generate_by_name(name: &str) -> Option<FleetSnapshot> {
    name.parse::<DemoData>().ok().map(generate)
}

fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

/// Random hours in half-hour steps within `[min, max]`.
fn half_hours(rng: &mut StdRng, min: u32, max: u32) -> f64 {
    rng.gen_range(min * 2..=max * 2) as f64 / 2.0
}

const FIRST_NAMES: &[&str] = &[
    "Aarav", "Bhavna", "Chetan", "Divya", "Farhan", "Gita", "Harish", "Isha", "Jatin", "Kavya",
];
const LAST_NAMES: &[&str] = &[
    "Bose", "Das", "Iyer", "Joshi", "Kapoor", "Menon", "Nair", "Patel", "Rao", "Singh",
];

fn generate_name_permutations(rng: &mut StdRng) -> Vec<String> {
    let mut names = Vec::with_capacity(FIRST_NAMES.len() * LAST_NAMES.len());
    for first in FIRST_NAMES {
        for last in LAST_NAMES {
            names.push(format!("{} {}", first, last));
        }
    }
    names.shuffle(rng);
    names
}
