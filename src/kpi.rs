//! KPI aggregator: folds timelines and order outcomes into a run result.

use std::collections::BTreeMap;

use crate::assignment::{AssignmentPlan, UnassignedOrder};
use crate::config::SimulationPolicy;
use crate::domain::SimulationRequest;
use crate::incentives::OrderOutcome;

/// Work given to one pooled driver.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverAssignment {
    pub driver_id: String,
    /// Order ids in delivery order.
    pub assigned_orders: Vec<String>,
    pub total_hours: f64,
    pub total_profit: f64,
}

/// Fuel spent on one route across all trips.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteFuelCost {
    pub route_id: String,
    pub total_cost: f64,
}

/// Fleet-wide totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceMetrics {
    pub total_fuel_cost: f64,
    pub total_bonuses: f64,
    pub total_penalties: f64,
    /// Mean transit minutes over delivered orders.
    pub average_delivery_time: f64,
    /// Hours used as a percentage of `pool size x maxHoursPerDay`, in
    /// `[0, 100]`.
    pub utilization_rate: f64,
}

/// Everything one run produces. Immutable once returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationResult {
    pub total_profit: f64,
    /// Composite of on-time ratio and utilization, in `[0, 100]`.
    pub efficiency_score: f64,
    pub on_time_deliveries: usize,
    pub late_deliveries: usize,
    /// One entry per route used, sorted by route id.
    pub fuel_cost_breakdown: Vec<RouteFuelCost>,
    /// One entry per pooled driver, in pool order.
    pub driver_assignments: Vec<DriverAssignment>,
    pub performance_metrics: PerformanceMetrics,
    pub unassigned_orders: Vec<UnassignedOrder>,
    pub outcomes: Vec<OrderOutcome>,
}

impl SimulationResult {
    pub fn delivered(&self) -> usize {
        self.on_time_deliveries + self.late_deliveries
    }
}

/// Percentage of `capacity_hours` used, clamped to `[0, 100]`.
///
/// ```
/// use fleet_simulation::kpi::utilization_rate;
///
/// assert_eq!(utilization_rate(6.0, 8.0), 75.0);
/// assert_eq!(utilization_rate(0.0, 0.0), 0.0);
/// ```
pub fn utilization_rate(hours_used: f64, capacity_hours: f64) -> f64 {
    if capacity_hours <= 0.0 {
        return 0.0;
    }
    (hours_used / capacity_hours * 100.0).clamp(0.0, 100.0)
}

/// Weighted blend of on-time percentage and utilization, clamped to
/// `[0, 100]`. Zero when nothing was delivered.
///
/// ```
/// use fleet_simulation::config::SimulationPolicy;
/// use fleet_simulation::kpi::efficiency_score;
///
/// let policy = SimulationPolicy::default();
/// // 100% on time, 50% utilization: 0.7 * 100 + 0.3 * 50
/// assert!((efficiency_score(4, 4, 50.0, &policy) - 85.0).abs() < 1e-9);
/// assert_eq!(efficiency_score(0, 0, 50.0, &policy), 0.0);
/// ```
pub fn efficiency_score(
    on_time: usize,
    delivered: usize,
    utilization: f64,
    policy: &SimulationPolicy,
) -> f64 {
    if delivered == 0 {
        return 0.0;
    }
    let weights = policy.on_time_weight + policy.utilization_weight;
    if weights <= 0.0 {
        return 0.0;
    }
    let on_time_pct = on_time as f64 / delivered as f64 * 100.0;
    let blended = (policy.on_time_weight * on_time_pct + policy.utilization_weight * utilization) / weights;
    blended.clamp(0.0, 100.0)
}

/// Reduces a plan and its scored outcomes into the run result.
///
/// Utilization is measured against the nominal day of every pooled driver,
/// `timelines x request.max_hours_per_day`, not against the capacity left
/// after current shifts and fatigue.
pub fn aggregate(
    plan: &AssignmentPlan,
    outcomes: Vec<OrderOutcome>,
    request: &SimulationRequest,
    policy: &SimulationPolicy,
) -> SimulationResult {
    let mut profit_by_order: BTreeMap<&str, f64> = BTreeMap::new();
    let mut fuel_by_route: BTreeMap<&str, f64> = BTreeMap::new();
    let mut metrics = PerformanceMetrics::default();
    let mut on_time = 0;
    let mut late = 0;
    let mut transit_total = 0.0;

    for outcome in &outcomes {
        if outcome.score.on_time {
            on_time += 1;
        } else {
            late += 1;
        }
        metrics.total_bonuses += outcome.score.bonus;
        metrics.total_penalties += outcome.score.penalty;
        metrics.total_fuel_cost += outcome.fuel_cost;
        transit_total += outcome.transit_minutes;
        *fuel_by_route.entry(outcome.route_id.as_str()).or_insert(0.0) += outcome.fuel_cost;
        profit_by_order.insert(outcome.order_id.as_str(), outcome.profit());
    }

    let driver_assignments: Vec<DriverAssignment> = plan
        .timelines
        .iter()
        .map(|timeline| DriverAssignment {
            driver_id: timeline.driver_id.clone(),
            assigned_orders: timeline.deliveries.iter().map(|d| d.order_id.clone()).collect(),
            total_hours: timeline.hours_used(),
            total_profit: timeline
                .deliveries
                .iter()
                .filter_map(|d| profit_by_order.get(d.order_id.as_str()))
                .sum(),
        })
        .collect();

    let delivered = on_time + late;
    if delivered > 0 {
        metrics.average_delivery_time = transit_total / delivered as f64;
    }
    let nominal_hours = plan.timelines.len() as f64 * request.max_hours_per_day;
    metrics.utilization_rate = utilization_rate(plan.total_hours_used(), nominal_hours);

    let fuel_cost_breakdown = fuel_by_route
        .into_iter()
        .map(|(route_id, total_cost)| RouteFuelCost {
            route_id: route_id.to_string(),
            total_cost,
        })
        .collect();

    // Summed in timeline order so the total does not depend on map iteration.
    let total_profit = outcomes.iter().map(OrderOutcome::profit).sum();
    let efficiency = efficiency_score(on_time, delivered, metrics.utilization_rate, policy);

    SimulationResult {
        total_profit,
        efficiency_score: efficiency,
        on_time_deliveries: on_time,
        late_deliveries: late,
        fuel_cost_breakdown,
        driver_assignments,
        performance_metrics: metrics,
        unassigned_orders: plan.unassigned.clone(),
        outcomes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::assign;
    use crate::cost::RouteCatalog;
    use crate::domain::{Driver, Order, Route, SimulationRequest, TrafficLevel};
    use crate::incentives::evaluate;
    use chrono::NaiveTime;

    fn run(drivers: &[Driver], routes: &[Route], orders: &[Order], request: &SimulationRequest) -> SimulationResult {
        let policy = SimulationPolicy::default();
        let catalog = RouteCatalog::build(routes, &policy);
        let plan = assign(drivers, &catalog, orders, request, &policy).unwrap();
        let outcomes = evaluate(&plan, orders, &policy);
        aggregate(&plan, outcomes, request, &policy)
    }

    #[test]
    fn test_fuel_breakdown_has_one_entry_per_used_route() {
        let routes = vec![
            Route::new("R2", 10.0, TrafficLevel::High, 30.0),
            Route::new("R1", 4.0, TrafficLevel::Low, 20.0),
            Route::new("R3", 8.0, TrafficLevel::Low, 20.0),
        ];
        let orders = vec![
            Order::new("O1", 300.0, "R2"),
            Order::new("O2", 200.0, "R1"),
            Order::new("O3", 100.0, "R2"),
        ];
        let request = SimulationRequest::new(1, NaiveTime::from_hms_opt(8, 0, 0).unwrap(), 8.0);
        let result = run(&[Driver::new("D1", "A")], &routes, &orders, &request);

        let ids: Vec<&str> = result.fuel_cost_breakdown.iter().map(|f| f.route_id.as_str()).collect();
        assert_eq!(ids, vec!["R1", "R2"]);
        assert_eq!(result.fuel_cost_breakdown[0].total_cost, 20.0);
        assert!((result.fuel_cost_breakdown[1].total_cost - 140.0).abs() < 1e-9);
        assert!((result.performance_metrics.total_fuel_cost - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_driver_profit_sums_its_orders() {
        let routes = vec![Route::new("R1", 2.0, TrafficLevel::Low, 30.0)];
        let orders = vec![Order::new("O1", 300.0, "R1"), Order::new("O2", 200.0, "R1")];
        let request = SimulationRequest::new(1, NaiveTime::from_hms_opt(8, 0, 0).unwrap(), 8.0);
        let result = run(&[Driver::new("D1", "A")], &routes, &orders, &request);

        let assignment = &result.driver_assignments[0];
        assert_eq!(assignment.assigned_orders, vec!["O1", "O2"]);
        assert_eq!(assignment.total_hours, 1.0);
        assert_eq!(assignment.total_profit, (300.0 - 10.0) + (200.0 - 10.0));
        assert_eq!(result.total_profit, assignment.total_profit);
        assert_eq!(result.performance_metrics.average_delivery_time, 30.0);
    }

    #[test]
    fn test_capacity_bound_run_reports_partial_utilization() {
        let routes = vec![Route::new("R1", 30.0, TrafficLevel::Low, 180.0)];
        let orders = vec![
            Order::new("O1", 300.0, "R1"),
            Order::new("O2", 200.0, "R1"),
            Order::new("O3", 100.0, "R1"),
        ];
        let request = SimulationRequest::new(2, NaiveTime::from_hms_opt(9, 0, 0).unwrap(), 4.0);
        let result = run(&[Driver::new("D1", "A"), Driver::new("D2", "B")], &routes, &orders, &request);

        assert_eq!(result.delivered(), 2);
        assert_eq!(result.unassigned_orders.len(), 1);
        assert_eq!(result.performance_metrics.utilization_rate, 75.0);
        // All on time: 0.7 * 100 + 0.3 * 75
        assert!((result.efficiency_score - 92.5).abs() < 1e-9);
        assert_eq!(result.performance_metrics.average_delivery_time, 180.0);
    }

    #[test]
    fn test_utilization_uses_nominal_day_not_remaining_capacity() {
        let routes = vec![Route::new("R1", 20.0, TrafficLevel::Low, 240.0)];
        let orders = vec![Order::new("O1", 500.0, "R1")];
        let request = SimulationRequest::new(1, NaiveTime::from_hms_opt(9, 0, 0).unwrap(), 8.0);
        let driver = Driver::new("D1", "A").with_current_shift_hours(4.0);
        let result = run(&[driver], &routes, &orders, &request);

        // 4h used out of one 8h day, although the driver had only 4h left.
        assert_eq!(result.delivered(), 1);
        assert_eq!(result.driver_assignments[0].total_hours, 4.0);
        assert_eq!(result.performance_metrics.utilization_rate, 50.0);
    }

    #[test]
    fn test_fatigued_driver_utilization_against_full_day() {
        let routes = vec![Route::new("R1", 10.0, TrafficLevel::Low, 120.0)];
        let orders = vec![Order::new("O1", 500.0, "R1"), Order::new("O2", 400.0, "R1")];
        let request = SimulationRequest::new(1, NaiveTime::from_hms_opt(9, 0, 0).unwrap(), 8.0);
        // 63h last week: 8h derated to 5.6h, room for two 2h trips.
        let driver = Driver::new("D1", "A").with_past_week_hours([9.0; 7]);
        let result = run(&[driver], &routes, &orders, &request);

        assert_eq!(result.delivered(), 2);
        assert_eq!(result.performance_metrics.utilization_rate, 50.0);
    }

    #[test]
    fn test_late_orders_are_counted_and_penalized() {
        let routes = vec![Route::new("R1", 2.0, TrafficLevel::Low, 60.0)];
        let orders = vec![
            Order::new("O1", 2000.0, "R1").with_deadline(NaiveTime::from_hms_opt(9, 30, 0).unwrap()),
            Order::new("O2", 1500.0, "R1").with_deadline(NaiveTime::from_hms_opt(11, 0, 0).unwrap()),
        ];
        let request = SimulationRequest::new(1, NaiveTime::from_hms_opt(9, 0, 0).unwrap(), 8.0);
        let result = run(&[Driver::new("D1", "A")], &routes, &orders, &request);

        assert_eq!(result.on_time_deliveries, 1);
        assert_eq!(result.late_deliveries, 1);
        assert_eq!(result.performance_metrics.total_penalties, 50.0);
        assert_eq!(result.performance_metrics.total_bonuses, 150.0);
        assert_eq!(result.total_profit, (2000.0 - 50.0 - 10.0) + (1500.0 + 150.0 - 10.0));
    }

    #[test]
    fn test_empty_run_has_zero_kpis() {
        let request = SimulationRequest::new(1, NaiveTime::from_hms_opt(8, 0, 0).unwrap(), 8.0);
        let result = run(&[], &[], &[], &request);

        assert_eq!(result, SimulationResult::default());
        assert_eq!(result.delivered(), 0);
    }

    #[test]
    fn test_scores_stay_in_range() {
        assert_eq!(utilization_rate(12.0, 8.0), 100.0);
        let policy = SimulationPolicy::default();
        assert!(efficiency_score(3, 3, 100.0, &policy) <= 100.0);
        assert!(efficiency_score(0, 3, 0.0, &policy) >= 0.0);
    }
}
