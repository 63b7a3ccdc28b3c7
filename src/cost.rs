//! Route cost model: transit time and fuel cost per trip.

use std::collections::HashMap;

use crate::config::SimulationPolicy;
use crate::domain::Route;

/// Expected cost of one trip over a route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEstimate {
    /// Minutes to traverse the route under its traffic level.
    pub transit_minutes: f64,
    /// Fuel cost in rupees for one trip.
    pub fuel_cost_per_trip: f64,
}

impl RouteEstimate {
    pub fn transit_hours(&self) -> f64 {
        self.transit_minutes / 60.0
    }
}

/// Estimates transit time and fuel cost for a route.
///
/// # Examples
///
/// ```
/// use fleet_simulation::config::SimulationPolicy;
/// use fleet_simulation::cost::estimate;
/// use fleet_simulation::domain::{Route, TrafficLevel};
///
/// let policy = SimulationPolicy::default();
///
/// let calm = estimate(&Route::new("R1", 10.0, TrafficLevel::Low, 30.0), &policy);
/// assert_eq!(calm.transit_minutes, 30.0);
/// assert_eq!(calm.fuel_cost_per_trip, 50.0);
///
/// let jammed = estimate(&Route::new("R2", 10.0, TrafficLevel::High, 30.0), &policy);
/// assert!(jammed.transit_minutes > calm.transit_minutes);
/// assert!(jammed.fuel_cost_per_trip > calm.fuel_cost_per_trip);
/// ```
pub fn estimate(route: &Route, policy: &SimulationPolicy) -> RouteEstimate {
    let level = route.traffic_level;
    RouteEstimate {
        transit_minutes: route.base_time_min * policy.traffic_time_multipliers.get(level),
        fuel_cost_per_trip: route.distance_km
            * policy.fuel_cost_per_km
            * policy.traffic_fuel_factors.get(level),
    }
}

/// Active routes of one run with their precomputed estimates.
///
/// Inactive routes are left out entirely, so a lookup for one behaves like a
/// lookup for a route that does not exist.
#[derive(Debug, Clone)]
pub struct RouteCatalog<'a> {
    routes: HashMap<&'a str, (&'a Route, RouteEstimate)>,
}

impl<'a> RouteCatalog<'a> {
    pub fn build(routes: &'a [Route], policy: &SimulationPolicy) -> Self {
        let routes = routes
            .iter()
            .filter(|route| route.is_active)
            .map(|route| (route.route_id.as_str(), (route, estimate(route, policy))))
            .collect();
        Self { routes }
    }

    /// Returns the route and its estimate if the route is usable.
    pub fn get(&self, route_id: &str) -> Option<(&'a Route, RouteEstimate)> {
        self.routes.get(route_id).copied()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
