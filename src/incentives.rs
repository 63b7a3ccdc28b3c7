//! Incentive evaluator: on-time classification, bonuses and penalties.

use std::collections::HashMap;

use crate::assignment::AssignmentPlan;
use crate::config::SimulationPolicy;
use crate::domain::Order;

/// Result of scoring one delivered order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncentiveScore {
    pub on_time: bool,
    /// Minutes past the deadline, 0 when on time.
    pub minutes_late: f64,
    pub bonus: f64,
    pub penalty: f64,
}

/// Scores a delivery completing at `completion_minute` (minutes since
/// midnight of the simulated day).
///
/// Orders without a deadline are always on time. The bonus is paid only on
/// time and only above `policy.bonus_min_value`; the penalty is charged only
/// when late and never exceeds the order's value.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use fleet_simulation::config::SimulationPolicy;
/// use fleet_simulation::domain::Order;
/// use fleet_simulation::incentives::score;
///
/// let policy = SimulationPolicy::default();
/// let order = Order::new("O1", 2000.0, "R1")
///     .with_deadline(NaiveTime::from_hms_opt(10, 0, 0).unwrap());
///
/// let early = score(&order, 9.5 * 60.0, &policy);
/// assert!(early.on_time);
/// assert_eq!(early.bonus, 200.0);
///
/// let late = score(&order, 10.25 * 60.0, &policy);
/// assert!(!late.on_time);
/// assert_eq!(late.minutes_late, 15.0);
/// assert_eq!(late.bonus, 0.0);
/// assert_eq!(late.penalty, 50.0);
/// ```
pub fn score(order: &Order, completion_minute: f64, policy: &SimulationPolicy) -> IncentiveScore {
    let minutes_late = order
        .deadline_minute()
        .map_or(0.0, |deadline| (completion_minute - deadline).max(0.0));

    if minutes_late <= 0.0 {
        let bonus = if order.value_rs > policy.bonus_min_value {
            order.value_rs * policy.bonus_rate
        } else {
            0.0
        };
        return IncentiveScore {
            on_time: true,
            minutes_late: 0.0,
            bonus,
            penalty: 0.0,
        };
    }

    let penalty = policy.late_penalty_flat + policy.late_penalty_per_minute * minutes_late;
    IncentiveScore {
        on_time: false,
        minutes_late,
        bonus: 0.0,
        penalty: penalty.min(order.value_rs),
    }
}

/// Per-order result of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderOutcome {
    pub order_id: String,
    pub driver_id: String,
    pub route_id: String,
    pub value_rs: f64,
    pub transit_minutes: f64,
    pub completion_minute: f64,
    pub fuel_cost: f64,
    pub score: IncentiveScore,
}

impl OrderOutcome {
    /// `value + bonus - penalty - fuel`.
    pub fn profit(&self) -> f64 {
        self.value_rs + self.score.bonus - self.score.penalty - self.fuel_cost
    }
}

/// Scores every delivery of a plan, in timeline order.
///
/// Each order is one trip over its route and bears that trip's full fuel
/// cost.
pub fn evaluate(plan: &AssignmentPlan, orders: &[Order], policy: &SimulationPolicy) -> Vec<OrderOutcome> {
    let by_id: HashMap<&str, &Order> = orders.iter().map(|o| (o.order_id.as_str(), o)).collect();

    plan.timelines
        .iter()
        .flat_map(|timeline| {
            timeline
                .deliveries
                .iter()
                .map(move |delivery| (timeline.driver_id.as_str(), delivery))
        })
        .filter_map(|(driver_id, delivery)| {
            let order = by_id.get(delivery.order_id.as_str())?;
            Some(OrderOutcome {
                order_id: delivery.order_id.clone(),
                driver_id: driver_id.to_string(),
                route_id: delivery.route_id.clone(),
                value_rs: order.value_rs,
                transit_minutes: delivery.transit_minutes,
                completion_minute: delivery.completion_minute,
                fuel_cost: delivery.fuel_cost,
                score: score(order, delivery.completion_minute, policy),
            })
        })
        .collect()
}
