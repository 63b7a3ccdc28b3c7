//! Fleet storage seam.
//!
//! The engine never talks to storage directly. [`FleetStore`] is read once per
//! run through [`FleetStore::snapshot`], and the only write is the optional
//! commit of a finished run's assignments.

use parking_lot::RwLock;
use tracing::info;

use crate::domain::{Driver, FleetSnapshot, Order, Route};
use crate::error::SimulationError;
use crate::kpi::DriverAssignment;

/// Source of drivers, routes and the order backlog.
pub trait FleetStore: Send + Sync {
    fn list_active_drivers(&self) -> Vec<Driver>;

    fn list_active_routes(&self) -> Vec<Route>;

    fn list_unassigned_orders(&self) -> Vec<Order>;

    /// Marks the orders of `assignments` as delivered by their driver in run
    /// `simulation_id`. Orders already assigned are left alone.
    ///
    /// Returns the number of orders updated.
    fn record_assignments(&self, simulation_id: &str, assignments: &[DriverAssignment]) -> usize;

    /// Reads everything a run needs.
    fn snapshot(&self) -> FleetSnapshot {
        FleetSnapshot::new(
            self.list_active_drivers(),
            self.list_active_routes(),
            self.list_unassigned_orders(),
        )
    }
}

/// [`FleetStore`] held in memory behind a single lock.
///
/// # Examples
///
/// ```
/// use fleet_simulation::domain::{Driver, FleetSnapshot, Order, Route, TrafficLevel};
/// use fleet_simulation::store::{FleetStore, InMemoryFleetStore};
///
/// let store = InMemoryFleetStore::new();
/// store
///     .replace(FleetSnapshot::new(
///         vec![Driver::new("D1", "Asha"), Driver::new("D2", "Ravi").inactive()],
///         vec![Route::new("R1", 5.0, TrafficLevel::Low, 20.0)],
///         vec![Order::new("O1", 250.0, "R1")],
///     ))
///     .unwrap();
///
/// assert_eq!(store.list_active_drivers().len(), 1);
/// assert_eq!(store.all().drivers.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryFleetStore {
    fleet: RwLock<FleetSnapshot>,
}

impl InMemoryFleetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `fleet`, validating it first.
    pub fn with_fleet(fleet: FleetSnapshot) -> Result<Self, SimulationError> {
        fleet.validate()?;
        Ok(Self {
            fleet: RwLock::new(fleet),
        })
    }

    /// Replaces the whole fleet. The current fleet is kept if `fleet` is
    /// invalid.
    pub fn replace(&self, fleet: FleetSnapshot) -> Result<(), SimulationError> {
        fleet.validate()?;
        info!(
            drivers = fleet.drivers.len(),
            routes = fleet.routes.len(),
            orders = fleet.orders.len(),
            "Fleet replaced"
        );
        *self.fleet.write() = fleet;
        Ok(())
    }

    /// Every stored record, including inactive and assigned ones.
    pub fn all(&self) -> FleetSnapshot {
        self.fleet.read().clone()
    }
}

impl FleetStore for InMemoryFleetStore {
    fn list_active_drivers(&self) -> Vec<Driver> {
        active_drivers(&self.fleet.read())
    }

    fn list_active_routes(&self) -> Vec<Route> {
        active_routes(&self.fleet.read())
    }

    fn list_unassigned_orders(&self) -> Vec<Order> {
        unassigned_orders(&self.fleet.read())
    }

    fn record_assignments(&self, simulation_id: &str, assignments: &[DriverAssignment]) -> usize {
        let mut fleet = self.fleet.write();
        let mut updated = 0;
        for assignment in assignments {
            for order_id in &assignment.assigned_orders {
                let order = fleet
                    .orders
                    .iter_mut()
                    .find(|o| &o.order_id == order_id && !o.is_assigned());
                if let Some(order) = order {
                    order.assigned_driver_id = Some(assignment.driver_id.clone());
                    order.simulation_id = Some(simulation_id.to_string());
                    updated += 1;
                }
            }
        }
        updated
    }

    /// Reads all three lists under one lock so a concurrent
    /// [`replace`](InMemoryFleetStore::replace) cannot split them.
    fn snapshot(&self) -> FleetSnapshot {
        let fleet = self.fleet.read();
        FleetSnapshot::new(active_drivers(&fleet), active_routes(&fleet), unassigned_orders(&fleet))
    }
}

fn active_drivers(fleet: &FleetSnapshot) -> Vec<Driver> {
    fleet.drivers.iter().filter(|d| d.is_active).cloned().collect()
}

fn active_routes(fleet: &FleetSnapshot) -> Vec<Route> {
    fleet.routes.iter().filter(|r| r.is_active).cloned().collect()
}

fn unassigned_orders(fleet: &FleetSnapshot) -> Vec<Order> {
    fleet.orders.iter().filter(|o| !o.is_assigned()).cloned().collect()
}
