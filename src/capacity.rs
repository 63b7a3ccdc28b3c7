//! Capacity model: how many hours a driver may still work today.

use crate::config::SimulationPolicy;
use crate::domain::{validate_max_hours, Driver};
use crate::error::SimulationError;

/// Returns true if the trailing weekly load exceeds the fatigue threshold.
pub fn is_fatigued(driver: &Driver, policy: &SimulationPolicy) -> bool {
    driver.weekly_hours() > policy.fatigue_weekly_hours
}

/// Remaining usable hours for the simulated day.
///
/// Base capacity is `max_hours_per_day - current_shift_hours`, floored at 0.
/// A fatigued driver keeps `policy.fatigue_derating` of that; fatigue shrinks
/// capacity but never removes the driver.
///
/// # Examples
///
/// ```
/// use fleet_simulation::capacity::remaining_hours;
/// use fleet_simulation::config::SimulationPolicy;
/// use fleet_simulation::domain::Driver;
///
/// let policy = SimulationPolicy::default();
///
/// let fresh = Driver::new("D1", "Asha").with_current_shift_hours(2.0);
/// assert_eq!(remaining_hours(&fresh, 8.0, &policy).unwrap(), 6.0);
///
/// // 7 x 9h = 63h last week, above the 48h threshold
/// let tired = Driver::new("D2", "Ravi").with_past_week_hours([9.0; 7]);
/// assert!((remaining_hours(&tired, 8.0, &policy).unwrap() - 5.6).abs() < 1e-9);
///
/// assert!(remaining_hours(&fresh, 0.0, &policy).is_err());
/// ```
pub fn remaining_hours(
    driver: &Driver,
    max_hours_per_day: f64,
    policy: &SimulationPolicy,
) -> Result<f64, SimulationError> {
    validate_max_hours(max_hours_per_day)?;

    let base = (max_hours_per_day - driver.current_shift_hours).max(0.0);
    if is_fatigued(driver, policy) {
        Ok(base * policy.fatigue_derating)
    } else {
        Ok(base)
    }
}
