//! Assignment engine: greedy highest-value-first, most-capacity-first.
//!
//! # Algorithm
//!
//! 1. Build the driver pool: active drivers with remaining capacity, ranked by
//!    capacity (descending, ties by id), truncated to `availableDrivers`.
//! 2. Sort the backlog by value (descending, ties by order id).
//! 3. For each order, give it to the driver with the most remaining capacity
//!    if the route's transit time fits; otherwise report it unassigned.
//!
//! Drivers deliver sequentially, so an order completes at the driver's start
//! time plus the transit time of everything before it on that driver's
//! timeline, itself included.
//!
//! Every tie is broken on ids, so identical inputs always yield identical
//! timelines.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::capacity::remaining_hours;
use crate::config::SimulationPolicy;
use crate::cost::RouteCatalog;
use crate::domain::{Driver, Order, SimulationRequest};
use crate::error::SimulationError;

/// Slack for comparing hour totals accumulated in floating point.
pub const CAPACITY_EPSILON: f64 = 1e-9;

/// Why an order was left without a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnassignedReason {
    /// The order's route is missing or inactive.
    RouteUnavailable,
    /// No active driver had any capacity left.
    NoEligibleDrivers,
    /// No driver had enough capacity left for this order's transit time.
    CapacityExhausted,
}

impl UnassignedReason {
    /// ```
    /// use fleet_simulation::assignment::UnassignedReason;
    ///
    /// assert_eq!(UnassignedReason::CapacityExhausted.as_str(), "CAPACITY_EXHAUSTED");
    /// ```
    pub fn as_str(self) -> &'static str {
        match self {
            UnassignedReason::RouteUnavailable => "ROUTE_UNAVAILABLE",
            UnassignedReason::NoEligibleDrivers => "NO_ELIGIBLE_DRIVERS",
            UnassignedReason::CapacityExhausted => "CAPACITY_EXHAUSTED",
        }
    }
}

/// An order the engine could not place.
#[derive(Debug, Clone, PartialEq)]
pub struct UnassignedOrder {
    pub order_id: String,
    pub reason: UnassignedReason,
}

/// One delivery on a driver's timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledDelivery {
    pub order_id: String,
    pub route_id: String,
    pub transit_minutes: f64,
    pub fuel_cost: f64,
    /// Minutes since midnight at which the delivery completes.
    pub completion_minute: f64,
}

/// A pooled driver and the work given to it.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverTimeline {
    pub driver_id: String,
    /// Capacity at the start of the run, after fatigue derating.
    pub capacity_hours: f64,
    pub remaining_hours: f64,
    /// Minutes since midnight at which the driver is next free.
    pub clock_minute: f64,
    pub deliveries: Vec<ScheduledDelivery>,
}

impl DriverTimeline {
    fn new(driver_id: String, capacity_hours: f64, start_minute: f64) -> Self {
        Self {
            driver_id,
            capacity_hours,
            remaining_hours: capacity_hours,
            clock_minute: start_minute,
            deliveries: Vec::new(),
        }
    }

    /// Returns true if `hours` of work still fit.
    pub fn fits(&self, hours: f64) -> bool {
        hours <= self.remaining_hours + CAPACITY_EPSILON
    }

    /// Total hours of assigned transit.
    pub fn hours_used(&self) -> f64 {
        self.deliveries.iter().map(|d| d.transit_minutes).sum::<f64>() / 60.0
    }

    fn push(&mut self, order: &Order, transit_minutes: f64, fuel_cost: f64) {
        self.clock_minute += transit_minutes;
        self.remaining_hours = (self.remaining_hours - transit_minutes / 60.0).max(0.0);
        self.deliveries.push(ScheduledDelivery {
            order_id: order.order_id.clone(),
            route_id: order.route_id.clone(),
            transit_minutes,
            fuel_cost,
            completion_minute: self.clock_minute,
        });
    }

    /// Ranking used for pool selection and order placement: more remaining
    /// capacity first, then lower driver id.
    fn priority_cmp(&self, other: &Self) -> Ordering {
        other
            .remaining_hours
            .total_cmp(&self.remaining_hours)
            .then_with(|| self.driver_id.cmp(&other.driver_id))
    }
}

/// Output of [`assign`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentPlan {
    /// One timeline per pooled driver, in pool order.
    pub timelines: Vec<DriverTimeline>,
    /// Orders left without a driver, in backlog priority order.
    pub unassigned: Vec<UnassignedOrder>,
}

impl AssignmentPlan {
    pub fn assigned_count(&self) -> usize {
        self.timelines.iter().map(|t| t.deliveries.len()).sum()
    }

    pub fn total_capacity_hours(&self) -> f64 {
        self.timelines.iter().map(|t| t.capacity_hours).sum()
    }

    pub fn total_hours_used(&self) -> f64 {
        self.timelines.iter().map(DriverTimeline::hours_used).sum()
    }
}

/// Builds the driver pool for a run.
///
/// Inactive drivers and drivers without capacity are left out; the rest are
/// ranked by capacity and truncated to `request.available_drivers`.
pub fn select_pool(
    drivers: &[Driver],
    request: &SimulationRequest,
    policy: &SimulationPolicy,
) -> Result<Vec<DriverTimeline>, SimulationError> {
    let start_minute = request.start_minute();
    let mut pool = Vec::with_capacity(drivers.len());

    for driver in drivers.iter().filter(|d| d.is_active) {
        let capacity = remaining_hours(driver, request.max_hours_per_day, policy)?;
        if capacity > 0.0 {
            pool.push(DriverTimeline::new(driver.id.clone(), capacity, start_minute));
        } else {
            debug!(driver_id = %driver.id, "Driver has no capacity left today");
        }
    }

    pool.sort_by(DriverTimeline::priority_cmp);
    pool.truncate(request.available_drivers);
    Ok(pool)
}

/// Orders the backlog by descending value, then ascending order id.
pub fn prioritize<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Vec<&'a Order> {
    let mut backlog: Vec<&Order> = orders.into_iter().collect();
    backlog.sort_by(|a, b| {
        b.value_rs
            .total_cmp(&a.value_rs)
            .then_with(|| a.order_id.cmp(&b.order_id))
    });
    backlog
}

/// Assigns orders to drivers.
///
/// Orders that already carry an `assigned_driver_id` are not part of the
/// backlog and are ignored.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use fleet_simulation::assignment::{assign, UnassignedReason};
/// use fleet_simulation::config::SimulationPolicy;
/// use fleet_simulation::cost::RouteCatalog;
/// use fleet_simulation::domain::{Driver, Order, Route, SimulationRequest, TrafficLevel};
///
/// let policy = SimulationPolicy::default();
/// let routes = vec![Route::new("R1", 10.0, TrafficLevel::Low, 120.0)];
/// let catalog = RouteCatalog::build(&routes, &policy);
/// let drivers = vec![Driver::new("D1", "Asha")];
/// let orders = vec![Order::new("O1", 500.0, "R1"), Order::new("O2", 300.0, "R9")];
/// let request = SimulationRequest::new(1, NaiveTime::from_hms_opt(9, 0, 0).unwrap(), 8.0);
///
/// let plan = assign(&drivers, &catalog, &orders, &request, &policy).unwrap();
///
/// assert_eq!(plan.timelines[0].deliveries[0].order_id, "O1");
/// assert_eq!(plan.timelines[0].deliveries[0].completion_minute, 11.0 * 60.0);
/// assert_eq!(plan.unassigned[0].reason, UnassignedReason::RouteUnavailable);
/// ```
pub fn assign(
    drivers: &[Driver],
    catalog: &RouteCatalog<'_>,
    orders: &[Order],
    request: &SimulationRequest,
    policy: &SimulationPolicy,
) -> Result<AssignmentPlan, SimulationError> {
    request.validate()?;

    let mut timelines = select_pool(drivers, request, policy)?;
    let mut unassigned = Vec::new();

    if timelines.is_empty() {
        warn!(
            drivers = drivers.len(),
            "No eligible drivers, every order stays unassigned"
        );
    }

    for order in prioritize(orders.iter().filter(|o| !o.is_assigned())) {
        let Some((route, estimate)) = catalog.get(&order.route_id) else {
            warn!(
                order_id = %order.order_id,
                route_id = %order.route_id,
                "Order references a missing or inactive route"
            );
            unassigned.push(UnassignedOrder {
                order_id: order.order_id.clone(),
                reason: UnassignedReason::RouteUnavailable,
            });
            continue;
        };

        if timelines.is_empty() {
            unassigned.push(UnassignedOrder {
                order_id: order.order_id.clone(),
                reason: UnassignedReason::NoEligibleDrivers,
            });
            continue;
        }

        let hours = estimate.transit_hours();
        let best = timelines
            .iter_mut()
            .filter(|t| t.fits(hours))
            .min_by(|a, b| a.priority_cmp(b));

        match best {
            Some(timeline) => {
                debug!(
                    order_id = %order.order_id,
                    driver_id = %timeline.driver_id,
                    route_id = %route.route_id,
                    transit_minutes = estimate.transit_minutes,
                    "Order assigned"
                );
                timeline.push(order, estimate.transit_minutes, estimate.fuel_cost_per_trip);
            }
            None => unassigned.push(UnassignedOrder {
                order_id: order.order_id.clone(),
                reason: UnassignedReason::CapacityExhausted,
            }),
        }
    }

    Ok(AssignmentPlan {
        timelines,
        unassigned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Route, TrafficLevel};
    use chrono::NaiveTime;

    fn nine_am(available_drivers: usize, max_hours: f64) -> SimulationRequest {
        SimulationRequest::new(
            available_drivers,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            max_hours,
        )
    }

    fn three_hour_route() -> Vec<Route> {
        vec![Route::new("R1", 30.0, TrafficLevel::Low, 180.0)]
    }

    #[test]
    fn test_backlog_priority_is_value_then_id() {
        let orders = vec![
            Order::new("O3", 100.0, "R1"),
            Order::new("O1", 500.0, "R1"),
            Order::new("O2", 100.0, "R1"),
        ];
        let ids: Vec<&str> = prioritize(&orders).iter().map(|o| o.order_id.as_str()).collect();
        assert_eq!(ids, vec!["O1", "O2", "O3"]);
    }

    #[test]
    fn test_pool_is_truncated_to_highest_capacity() {
        let policy = SimulationPolicy::default();
        let drivers = vec![
            Driver::new("D1", "A").with_current_shift_hours(6.0),
            Driver::new("D2", "B").with_current_shift_hours(1.0),
            Driver::new("D3", "C").with_current_shift_hours(3.0),
            Driver::new("D4", "D").inactive(),
        ];
        let pool = select_pool(&drivers, &nine_am(2, 8.0), &policy).unwrap();
        let ids: Vec<&str> = pool.iter().map(|t| t.driver_id.as_str()).collect();
        assert_eq!(ids, vec!["D2", "D3"]);
    }

    #[test]
    fn test_pool_larger_than_fleet_is_not_an_error() {
        let policy = SimulationPolicy::default();
        let drivers = vec![Driver::new("D1", "A")];
        let pool = select_pool(&drivers, &nine_am(10, 8.0), &policy).unwrap();
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_zero_capacity_drivers_receive_nothing() {
        let policy = SimulationPolicy::default();
        let routes = three_hour_route();
        let catalog = RouteCatalog::build(&routes, &policy);
        let drivers = vec![Driver::new("D1", "A").with_current_shift_hours(8.0)];
        let orders = vec![Order::new("O1", 100.0, "R1")];

        let plan = assign(&drivers, &catalog, &orders, &nine_am(1, 8.0), &policy).unwrap();
        assert!(plan.timelines.is_empty());
        assert_eq!(plan.unassigned[0].reason, UnassignedReason::NoEligibleDrivers);
    }

    #[test]
    fn test_two_drivers_three_long_orders() {
        let policy = SimulationPolicy::default();
        let routes = three_hour_route();
        let catalog = RouteCatalog::build(&routes, &policy);
        let drivers = vec![Driver::new("D1", "A"), Driver::new("D2", "B")];
        let orders = vec![
            Order::new("O1", 300.0, "R1"),
            Order::new("O2", 200.0, "R1"),
            Order::new("O3", 100.0, "R1"),
        ];

        let plan = assign(&drivers, &catalog, &orders, &nine_am(2, 4.0), &policy).unwrap();

        assert_eq!(plan.assigned_count(), 2);
        assert_eq!(plan.timelines[0].deliveries[0].order_id, "O1");
        assert_eq!(plan.timelines[1].deliveries[0].order_id, "O2");
        assert_eq!(
            plan.unassigned,
            vec![UnassignedOrder {
                order_id: "O3".to_string(),
                reason: UnassignedReason::CapacityExhausted,
            }]
        );
        assert_eq!(plan.total_hours_used(), 6.0);
        assert_eq!(plan.total_capacity_hours(), 8.0);
    }

    #[test]
    fn test_load_balances_to_most_remaining_capacity() {
        let policy = SimulationPolicy::default();
        let routes = vec![Route::new("R1", 5.0, TrafficLevel::Low, 60.0)];
        let catalog = RouteCatalog::build(&routes, &policy);
        let drivers = vec![Driver::new("D1", "A"), Driver::new("D2", "B")];
        let orders: Vec<Order> = (1..=4)
            .map(|i| Order::new(format!("O{}", i), 100.0, "R1"))
            .collect();

        let plan = assign(&drivers, &catalog, &orders, &nine_am(2, 8.0), &policy).unwrap();

        let d1: Vec<&str> = plan.timelines[0].deliveries.iter().map(|d| d.order_id.as_str()).collect();
        let d2: Vec<&str> = plan.timelines[1].deliveries.iter().map(|d| d.order_id.as_str()).collect();
        assert_eq!(d1, vec!["O1", "O3"]);
        assert_eq!(d2, vec!["O2", "O4"]);
    }

    #[test]
    fn test_completion_is_cumulative_per_driver() {
        let policy = SimulationPolicy::default();
        let routes = vec![
            Route::new("R1", 5.0, TrafficLevel::Low, 30.0),
            Route::new("R2", 5.0, TrafficLevel::Low, 45.0),
        ];
        let catalog = RouteCatalog::build(&routes, &policy);
        let drivers = vec![Driver::new("D1", "A")];
        let orders = vec![Order::new("O1", 900.0, "R1"), Order::new("O2", 800.0, "R2")];

        let plan = assign(&drivers, &catalog, &orders, &nine_am(1, 8.0), &policy).unwrap();
        let deliveries = &plan.timelines[0].deliveries;

        assert_eq!(deliveries[0].completion_minute, 540.0 + 30.0);
        assert_eq!(deliveries[1].completion_minute, 540.0 + 75.0);
        assert_eq!(plan.timelines[0].clock_minute, 615.0);
    }

    #[test]
    fn test_exact_fit_is_accepted() {
        let policy = SimulationPolicy::default();
        let routes = vec![Route::new("R1", 5.0, TrafficLevel::Low, 20.0)];
        let catalog = RouteCatalog::build(&routes, &policy);
        let drivers = vec![Driver::new("D1", "A")];
        // Three 20-minute trips fill exactly one hour.
        let orders: Vec<Order> = (1..=4)
            .map(|i| Order::new(format!("O{}", i), 10.0, "R1"))
            .collect();

        let plan = assign(&drivers, &catalog, &orders, &nine_am(1, 1.0), &policy).unwrap();
        assert_eq!(plan.assigned_count(), 3);
        assert_eq!(plan.unassigned.len(), 1);
    }

    #[test]
    fn test_previously_assigned_orders_are_skipped() {
        let policy = SimulationPolicy::default();
        let routes = three_hour_route();
        let catalog = RouteCatalog::build(&routes, &policy);
        let drivers = vec![Driver::new("D1", "A")];
        let mut done = Order::new("O1", 100.0, "R1");
        done.assigned_driver_id = Some("D9".to_string());
        let orders = vec![done, Order::new("O2", 50.0, "R1")];

        let plan = assign(&drivers, &catalog, &orders, &nine_am(1, 8.0), &policy).unwrap();
        assert_eq!(plan.assigned_count(), 1);
        assert_eq!(plan.timelines[0].deliveries[0].order_id, "O2");
        assert!(plan.unassigned.is_empty());
    }

    #[test]
    fn test_invalid_request_is_fatal() {
        let policy = SimulationPolicy::default();
        let catalog = RouteCatalog::build(&[], &policy);
        let err = assign(&[], &catalog, &[], &nine_am(1, 0.0), &policy).unwrap_err();
        assert_eq!(err, SimulationError::InvalidCapacity(0.0));
    }
}
