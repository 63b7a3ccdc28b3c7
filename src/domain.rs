//! Domain model for fleet simulation.
//!
//! # Overview
//!
//! Models one simulated working day with:
//! - [`Driver`]s with their current shift and trailing weekly load
//! - [`Route`]s with distance, base time and [`TrafficLevel`]
//! - [`Order`]s with value, route and optional deadline
//! - [`SimulationRequest`] as the per-run parameters
//! - [`FleetSnapshot`] as the immutable input of one run
//!
//! # Design
//!
//! These are the canonical shapes the engine works on. Wire formats and legacy
//! field names are normalized in [`dto`](crate::dto) before anything here is
//! built. Times of day are [`NaiveTime`]s; the engine measures instants as
//! minutes since midnight of the simulated day.

use chrono::{NaiveTime, Timelike};
use std::collections::HashSet;

use crate::error::SimulationError;

/// Number of trailing days tracked in [`Driver::past_week_hours`].
pub const DAYS_PER_WEEK: usize = 7;

/// Hours in the simulated day, the upper bound for `maxHoursPerDay`.
pub const HOURS_PER_DAY: f64 = 24.0;

/// Traffic condition on a route.
///
/// Ordered so that `Low < Medium < High`.
///
/// # Examples
///
/// ```
/// use fleet_simulation::domain::TrafficLevel;
///
/// assert_eq!("high".parse::<TrafficLevel>(), Ok(TrafficLevel::High));
/// assert!(TrafficLevel::Low < TrafficLevel::High);
/// assert_eq!(TrafficLevel::Medium.as_str(), "Medium");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrafficLevel {
    Low,
    Medium,
    High,
}

impl TrafficLevel {
    pub const ALL: [TrafficLevel; 3] = [TrafficLevel::Low, TrafficLevel::Medium, TrafficLevel::High];

    pub fn as_str(self) -> &'static str {
        match self {
            TrafficLevel::Low => "Low",
            TrafficLevel::Medium => "Medium",
            TrafficLevel::High => "High",
        }
    }
}

impl std::str::FromStr for TrafficLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(TrafficLevel::Low),
            "medium" => Ok(TrafficLevel::Medium),
            "high" => Ok(TrafficLevel::High),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for TrafficLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A driver in the fleet.
///
/// # Examples
///
/// ```
/// use fleet_simulation::domain::Driver;
///
/// let driver = Driver::new("D1", "Asha")
///     .with_current_shift_hours(2.0)
///     .with_past_week_hours([8.0, 8.0, 6.0, 0.0, 9.0, 7.5, 8.0]);
///
/// assert!(driver.is_active);
/// assert_eq!(driver.weekly_hours(), 46.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Driver {
    pub id: String,
    pub name: String,
    /// Hours already worked today before the simulated start.
    pub current_shift_hours: f64,
    /// Hours worked on each of the seven prior days, oldest first.
    pub past_week_hours: [f64; DAYS_PER_WEEK],
    pub is_active: bool,
}

impl Driver {
    /// Creates an active driver with no prior hours.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            current_shift_hours: 0.0,
            past_week_hours: [0.0; DAYS_PER_WEEK],
            is_active: true,
        }
    }

    pub fn with_current_shift_hours(mut self, hours: f64) -> Self {
        self.current_shift_hours = hours;
        self
    }

    pub fn with_past_week_hours(mut self, hours: [f64; DAYS_PER_WEEK]) -> Self {
        self.past_week_hours = hours;
        self
    }

    /// Marks the driver inactive.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Sum of the trailing seven days.
    pub fn weekly_hours(&self) -> f64 {
        self.past_week_hours.iter().sum()
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.id.trim().is_empty() {
            return Err(SimulationError::record("driver", &self.id, "id must not be empty"));
        }
        if !(self.current_shift_hours.is_finite() && self.current_shift_hours >= 0.0) {
            return Err(SimulationError::record(
                "driver",
                &self.id,
                "currentShiftHours must be a non-negative number",
            ));
        }
        if self.past_week_hours.iter().any(|h| !(h.is_finite() && *h >= 0.0)) {
            return Err(SimulationError::record(
                "driver",
                &self.id,
                "pastWeekHours must be non-negative numbers",
            ));
        }
        Ok(())
    }
}

/// A delivery route.
///
/// # Examples
///
/// ```
/// use fleet_simulation::domain::{Route, TrafficLevel};
///
/// let route = Route::new("R1", 12.5, TrafficLevel::Medium, 45.0);
/// assert!(route.is_active);
/// assert!(!route.clone().inactive().is_active);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub route_id: String,
    pub distance_km: f64,
    pub traffic_level: TrafficLevel,
    /// Transit time in free-flowing traffic.
    pub base_time_min: f64,
    pub is_active: bool,
}

impl Route {
    /// Creates an active route.
    pub fn new(
        route_id: impl Into<String>,
        distance_km: f64,
        traffic_level: TrafficLevel,
        base_time_min: f64,
    ) -> Self {
        Self {
            route_id: route_id.into(),
            distance_km,
            traffic_level,
            base_time_min,
            is_active: true,
        }
    }

    /// Marks the route inactive.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.route_id.trim().is_empty() {
            return Err(SimulationError::record("route", &self.route_id, "routeId must not be empty"));
        }
        if !(self.distance_km.is_finite() && self.distance_km > 0.0) {
            return Err(SimulationError::record(
                "route",
                &self.route_id,
                "distanceKm must be positive",
            ));
        }
        if !(self.base_time_min.is_finite() && self.base_time_min > 0.0) {
            return Err(SimulationError::record(
                "route",
                &self.route_id,
                "baseTimeMin must be positive",
            ));
        }
        Ok(())
    }
}

/// An order waiting for delivery.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use fleet_simulation::domain::Order;
///
/// let order = Order::new("O1", 1200.0, "R1")
///     .with_deadline(NaiveTime::from_hms_opt(11, 30, 0).unwrap());
///
/// assert_eq!(order.deadline_minute(), Some(690.0));
/// assert!(!order.is_assigned());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub order_id: String,
    pub value_rs: f64,
    pub route_id: String,
    /// Latest acceptable delivery time on the simulated day.
    pub delivery_time: Option<NaiveTime>,
    /// Set only once a run's assignments are committed.
    pub assigned_driver_id: Option<String>,
    /// Run that produced `assigned_driver_id`.
    pub simulation_id: Option<String>,
}

impl Order {
    /// Creates an unassigned order without a deadline.
    pub fn new(order_id: impl Into<String>, value_rs: f64, route_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            value_rs,
            route_id: route_id.into(),
            delivery_time: None,
            assigned_driver_id: None,
            simulation_id: None,
        }
    }

    pub fn with_deadline(mut self, deadline: NaiveTime) -> Self {
        self.delivery_time = Some(deadline);
        self
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_driver_id.is_some()
    }

    /// Deadline as minutes since midnight of the simulated day.
    pub fn deadline_minute(&self) -> Option<f64> {
        self.delivery_time.map(minute_of_day)
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.order_id.trim().is_empty() {
            return Err(SimulationError::record("order", &self.order_id, "orderId must not be empty"));
        }
        if !(self.value_rs.is_finite() && self.value_rs >= 0.0) {
            return Err(SimulationError::record(
                "order",
                &self.order_id,
                "valueRs must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// Parameters of one simulation run.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use fleet_simulation::domain::SimulationRequest;
/// use fleet_simulation::error::SimulationError;
///
/// let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
/// assert!(SimulationRequest::new(3, start, 8.0).validate().is_ok());
/// assert_eq!(
///     SimulationRequest::new(3, start, 0.0).validate(),
///     Err(SimulationError::InvalidCapacity(0.0))
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRequest {
    /// Upper bound on the driver pool size.
    pub available_drivers: usize,
    /// Start of the simulated day.
    pub start_time: NaiveTime,
    /// Daily working-hours ceiling for every driver.
    pub max_hours_per_day: f64,
}

impl SimulationRequest {
    pub fn new(available_drivers: usize, start_time: NaiveTime, max_hours_per_day: f64) -> Self {
        Self {
            available_drivers,
            start_time,
            max_hours_per_day,
        }
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        validate_max_hours(self.max_hours_per_day)?;
        if self.available_drivers == 0 {
            return Err(SimulationError::InvalidDriverCount(0));
        }
        Ok(())
    }

    /// Start of the day in minutes since midnight.
    pub fn start_minute(&self) -> f64 {
        minute_of_day(self.start_time)
    }
}

/// Checks the `(0, 24]` range of a daily hour ceiling.
pub fn validate_max_hours(max_hours_per_day: f64) -> Result<(), SimulationError> {
    if max_hours_per_day.is_finite() && max_hours_per_day > 0.0 && max_hours_per_day <= HOURS_PER_DAY {
        Ok(())
    } else {
        Err(SimulationError::InvalidCapacity(max_hours_per_day))
    }
}

/// Minutes since midnight, including fractional seconds.
///
/// ```
/// use chrono::NaiveTime;
/// use fleet_simulation::domain::minute_of_day;
///
/// assert_eq!(minute_of_day(NaiveTime::from_hms_opt(8, 30, 30).unwrap()), 510.5);
/// ```
pub fn minute_of_day(time: NaiveTime) -> f64 {
    time.num_seconds_from_midnight() as f64 / 60.0
}

/// Immutable fleet state read at the start of a run.
///
/// The engine never holds a live reference into storage; every run gets its
/// own snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetSnapshot {
    pub drivers: Vec<Driver>,
    pub routes: Vec<Route>,
    pub orders: Vec<Order>,
}

impl FleetSnapshot {
    pub fn new(drivers: Vec<Driver>, routes: Vec<Route>, orders: Vec<Order>) -> Self {
        Self {
            drivers,
            routes,
            orders,
        }
    }

    /// Validates every record and the uniqueness of ids.
    ///
    /// Orders may reference unknown routes; those are reported per run, not
    /// rejected here.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let mut seen = HashSet::new();
        for driver in &self.drivers {
            driver.validate()?;
            if !seen.insert(driver.id.as_str()) {
                return Err(SimulationError::record("driver", &driver.id, "duplicate id"));
            }
        }

        let mut seen = HashSet::new();
        for route in &self.routes {
            route.validate()?;
            if !seen.insert(route.route_id.as_str()) {
                return Err(SimulationError::record("route", &route.route_id, "duplicate routeId"));
            }
        }

        let mut seen = HashSet::new();
        for order in &self.orders {
            order.validate()?;
            if !seen.insert(order.order_id.as_str()) {
                return Err(SimulationError::record("order", &order.order_id, "duplicate orderId"));
            }
        }
        Ok(())
    }
}
