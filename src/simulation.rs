//! Simulation runs and their history.
//!
//! [`run_simulation`] is the pure pipeline: capacity, route costs, assignment,
//! incentives, KPIs. [`SimulationService`] wraps it with a [`FleetStore`], keeps
//! finished runs for lookup and optionally commits assignments.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::assignment::assign;
use crate::config::SimulationPolicy;
use crate::console;
use crate::cost::RouteCatalog;
use crate::domain::{FleetSnapshot, SimulationRequest};
use crate::error::SimulationError;
use crate::incentives::evaluate;
use crate::kpi::{aggregate, SimulationResult};
use crate::store::FleetStore;

/// Finished runs kept for lookup. Older ones are dropped first.
pub const MAX_STORED_RUNS: usize = 100;

/// Runs one simulation over a fleet snapshot.
///
/// Deterministic: the same snapshot, request and policy always produce the
/// same result. The snapshot is validated first, so duplicate ids are
/// rejected rather than resolved silently.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use fleet_simulation::config::SimulationPolicy;
/// use fleet_simulation::domain::{Driver, FleetSnapshot, Order, Route, SimulationRequest, TrafficLevel};
/// use fleet_simulation::simulation::run_simulation;
///
/// let fleet = FleetSnapshot::new(
///     vec![Driver::new("D1", "Asha")],
///     vec![Route::new("R1", 10.0, TrafficLevel::Low, 120.0)],
///     vec![Order::new("O1", 800.0, "R1")],
/// );
/// let request = SimulationRequest::new(1, NaiveTime::from_hms_opt(9, 0, 0).unwrap(), 8.0);
///
/// let result = run_simulation(&fleet, &request, &SimulationPolicy::default()).unwrap();
/// assert_eq!(result.on_time_deliveries, 1);
/// assert_eq!(result.late_deliveries, 0);
/// assert_eq!(result.total_profit, 800.0 - 50.0);
/// ```
pub fn run_simulation(
    fleet: &FleetSnapshot,
    request: &SimulationRequest,
    policy: &SimulationPolicy,
) -> Result<SimulationResult, SimulationError> {
    policy.validate()?;
    request.validate()?;
    fleet.validate()?;

    let catalog = RouteCatalog::build(&fleet.routes, policy);
    let plan = assign(&fleet.drivers, &catalog, &fleet.orders, request, policy)?;
    let outcomes = evaluate(&plan, &fleet.orders, policy);
    Ok(aggregate(&plan, outcomes, request, policy))
}

/// A finished run as kept by [`SimulationService`].
#[derive(Debug, Clone)]
pub struct SimulationRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub request: SimulationRequest,
    pub result: SimulationResult,
    /// Orders written back to the store, 0 unless the run was committed.
    pub committed_orders: usize,
}

/// Runs simulations against a fleet store and keeps their results.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use std::sync::Arc;
/// use fleet_simulation::config::SimulationPolicy;
/// use fleet_simulation::demo_data::{generate, DemoData};
/// use fleet_simulation::domain::SimulationRequest;
/// use fleet_simulation::simulation::SimulationService;
/// use fleet_simulation::store::InMemoryFleetStore;
///
/// let store = InMemoryFleetStore::with_fleet(generate(DemoData::Small)).unwrap();
/// let service = SimulationService::new(Arc::new(store), SimulationPolicy::default());
///
/// let request = SimulationRequest::new(5, NaiveTime::from_hms_opt(9, 0, 0).unwrap(), 8.0);
/// let record = service.run(request, false).unwrap();
///
/// assert_eq!(service.latest().unwrap().id, record.id);
/// assert!(service.get_run(&record.id).is_some());
/// ```
pub struct SimulationService {
    store: Arc<dyn FleetStore>,
    policy: SimulationPolicy,
    runs: RwLock<Vec<Arc<SimulationRecord>>>,
}

impl SimulationService {
    pub fn new(store: Arc<dyn FleetStore>, policy: SimulationPolicy) -> Self {
        Self {
            store,
            policy,
            runs: RwLock::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn FleetStore> {
        &self.store
    }

    pub fn policy(&self) -> &SimulationPolicy {
        &self.policy
    }

    /// Runs a simulation over a fresh snapshot of the store.
    ///
    /// With `commit`, the orders of the result are written back as assigned,
    /// so the next run no longer sees them in the backlog.
    pub fn run(&self, request: SimulationRequest, commit: bool) -> Result<Arc<SimulationRecord>, SimulationError> {
        let id = Uuid::new_v4().to_string();
        let fleet = self.store.snapshot();
        let started = Instant::now();

        info!(
            simulation_id = %id,
            drivers = fleet.drivers.len(),
            routes = fleet.routes.len(),
            orders = fleet.orders.len(),
            available_drivers = request.available_drivers,
            start_time = %request.start_time,
            max_hours_per_day = request.max_hours_per_day,
            "Starting simulation"
        );
        console::print_run_started(
            &id,
            fleet.drivers.len(),
            fleet.routes.len(),
            fleet.orders.len(),
            request.available_drivers,
        );

        let result = match run_simulation(&fleet, &request, &self.policy) {
            Ok(result) => result,
            Err(err) => {
                warn!(simulation_id = %id, error = %err, "Simulation rejected");
                return Err(err);
            }
        };
        let duration = started.elapsed();

        let committed_orders = if commit {
            self.store.record_assignments(&id, &result.driver_assignments)
        } else {
            0
        };

        info!(
            simulation_id = %id,
            duration_ms = duration.as_secs_f64() * 1000.0,
            on_time = result.on_time_deliveries,
            late = result.late_deliveries,
            unassigned = result.unassigned_orders.len(),
            total_profit = result.total_profit,
            efficiency = result.efficiency_score,
            committed_orders,
            "Simulation complete"
        );
        console::print_run_ended(&id, duration, &result);

        let record = Arc::new(SimulationRecord {
            id,
            created_at: Utc::now(),
            request,
            result,
            committed_orders,
        });

        let mut runs = self.runs.write();
        runs.push(record.clone());
        if runs.len() > MAX_STORED_RUNS {
            let excess = runs.len() - MAX_STORED_RUNS;
            runs.drain(..excess);
        }
        Ok(record)
    }

    /// Gets a run by ID.
    pub fn get_run(&self, id: &str) -> Option<Arc<SimulationRecord>> {
        self.runs.read().iter().find(|r| r.id == id).cloned()
    }

    /// Lists stored runs, newest first.
    pub fn list_runs(&self) -> Vec<Arc<SimulationRecord>> {
        self.runs.read().iter().rev().cloned().collect()
    }

    /// The most recent run, shown on the dashboard.
    pub fn latest(&self) -> Option<Arc<SimulationRecord>> {
        self.runs.read().last().cloned()
    }
}
