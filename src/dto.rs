//! DTOs for REST API requests/responses.
//!
//! Every wire shape is camelCase. Fleet records also accept the snake_case
//! and `_id` spellings older clients send; those are folded into the domain
//! types here and nowhere else.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::assignment::UnassignedReason;
use crate::domain::{
    validate_max_hours, Driver, FleetSnapshot, Order, Route, SimulationRequest, TrafficLevel,
    DAYS_PER_WEEK,
};
use crate::error::SimulationError;
use crate::kpi::SimulationResult;
use crate::simulation::SimulationRecord;

/// Rounds money and hour figures for output.
///
/// ```
/// use fleet_simulation::dto::round2;
///
/// assert_eq!(round2(10.0 / 3.0), 3.33);
/// assert_eq!(round2(2.675_000_1), 2.68);
/// ```
pub fn round2(value: f64) -> f64 {
    // Adding 0.0 turns -0.0 into 0.0.
    (value * 100.0).round() / 100.0 + 0.0
}

/// Parses a time of day from `HH:MM`, `HH:MM:SS`, a `datetime-local` value
/// or an RFC 3339 timestamp. Dates are dropped.
///
/// ```
/// use chrono::NaiveTime;
/// use fleet_simulation::dto::parse_time_of_day;
///
/// let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
/// assert_eq!(parse_time_of_day("09:00"), Some(nine));
/// assert_eq!(parse_time_of_day("2025-03-01T09:00"), Some(nine));
/// assert_eq!(parse_time_of_day("2025-03-01T09:00:00Z"), Some(nine));
/// assert_eq!(parse_time_of_day("nine"), None);
/// ```
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    for format in ["%H:%M", "%H:%M:%S"] {
        if let Ok(time) = NaiveTime::parse_from_str(value, format) {
            return Some(time);
        }
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.time());
        }
    }
    DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.time())
}

/// Formats a time of day as `HH:MM`, or `HH:MM:SS` when seconds are set.
pub fn format_time_of_day(time: NaiveTime) -> String {
    if time.second() == 0 {
        time.format("%H:%M").to_string()
    } else {
        time.format("%H:%M:%S").to_string()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn default_true() -> bool {
    true
}

fn default_week() -> Vec<f64> {
    vec![0.0; DAYS_PER_WEEK]
}

// ============================================================================
// Simulation request
// ============================================================================

/// Parameters of one run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequestDto {
    /// Upper bound on the driver pool, at least 1.
    #[serde(alias = "available_drivers")]
    pub available_drivers: i64,
    /// Start of the day as `HH:MM` (a `datetime-local` value is accepted).
    #[serde(alias = "start_time")]
    pub start_time: String,
    /// Daily working-hours ceiling in `(0, 24]`.
    #[serde(alias = "max_hours_per_day")]
    pub max_hours_per_day: f64,
}

impl SimulationRequestDto {
    pub fn from_domain(request: &SimulationRequest) -> Self {
        Self {
            available_drivers: request.available_drivers as i64,
            start_time: format_time_of_day(request.start_time),
            max_hours_per_day: request.max_hours_per_day,
        }
    }

    /// Validates and converts to the engine's request.
    pub fn to_domain(&self) -> Result<SimulationRequest, SimulationError> {
        validate_max_hours(self.max_hours_per_day)?;
        let available_drivers = usize::try_from(self.available_drivers)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or(SimulationError::InvalidDriverCount(self.available_drivers))?;
        let start_time = parse_time_of_day(&self.start_time)
            .ok_or_else(|| SimulationError::InvalidStartTime(self.start_time.clone()))?;
        Ok(SimulationRequest::new(
            available_drivers,
            start_time,
            self.max_hours_per_day,
        ))
    }
}

// ============================================================================
// Simulation result
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteFuelCostDto {
    pub route_id: String,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverAssignmentDto {
    pub driver_id: String,
    pub total_hours: f64,
    pub total_profit: f64,
    /// Order ids in delivery order.
    pub assigned_orders: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetricsDto {
    pub total_fuel_cost: f64,
    pub total_bonuses: f64,
    pub total_penalties: f64,
    /// Mean transit minutes per delivered order.
    pub average_delivery_time: f64,
    /// Percentage of pooled driver capacity used.
    pub utilization_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnassignedOrderDto {
    pub order_id: String,
    pub reason: UnassignedReason,
}

/// Result of one run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResultDto {
    pub total_profit: f64,
    /// Composite KPI in `[0, 100]`.
    pub efficiency_score: f64,
    pub on_time_deliveries: usize,
    pub late_deliveries: usize,
    pub fuel_cost_breakdown: Vec<RouteFuelCostDto>,
    pub driver_assignments: Vec<DriverAssignmentDto>,
    pub performance_metrics: PerformanceMetricsDto,
    pub unassigned_orders: Vec<UnassignedOrderDto>,
}

impl SimulationResultDto {
    pub fn from_result(result: &SimulationResult) -> Self {
        let metrics = &result.performance_metrics;
        Self {
            total_profit: round2(result.total_profit),
            efficiency_score: round2(result.efficiency_score),
            on_time_deliveries: result.on_time_deliveries,
            late_deliveries: result.late_deliveries,
            fuel_cost_breakdown: result
                .fuel_cost_breakdown
                .iter()
                .map(|f| RouteFuelCostDto {
                    route_id: f.route_id.clone(),
                    total_cost: round2(f.total_cost),
                })
                .collect(),
            driver_assignments: result
                .driver_assignments
                .iter()
                .map(|a| DriverAssignmentDto {
                    driver_id: a.driver_id.clone(),
                    total_hours: round2(a.total_hours),
                    total_profit: round2(a.total_profit),
                    assigned_orders: a.assigned_orders.clone(),
                })
                .collect(),
            performance_metrics: PerformanceMetricsDto {
                total_fuel_cost: round2(metrics.total_fuel_cost),
                total_bonuses: round2(metrics.total_bonuses),
                total_penalties: round2(metrics.total_penalties),
                average_delivery_time: round2(metrics.average_delivery_time),
                utilization_rate: round2(metrics.utilization_rate),
            },
            unassigned_orders: result
                .unassigned_orders
                .iter()
                .map(|u| UnassignedOrderDto {
                    order_id: u.order_id.clone(),
                    reason: u.reason,
                })
                .collect(),
        }
    }
}

/// A stored run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRecordDto {
    pub simulation_id: String,
    pub created_at: DateTime<Utc>,
    pub request: SimulationRequestDto,
    /// Orders written back to the fleet, 0 for dry runs.
    pub committed_orders: usize,
    pub result: SimulationResultDto,
}

impl SimulationRecordDto {
    pub fn from_record(record: &SimulationRecord) -> Self {
        Self {
            simulation_id: record.id.clone(),
            created_at: record.created_at,
            request: SimulationRequestDto::from_domain(&record.request),
            committed_orders: record.committed_orders,
            result: SimulationResultDto::from_result(&record.result),
        }
    }
}

// ============================================================================
// Fleet
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverDto {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "current_shift_hours", alias = "shift_hours")]
    pub current_shift_hours: f64,
    /// Hours worked on each of the last seven days, oldest first.
    #[serde(default = "default_week", alias = "past_week_hours")]
    pub past_week_hours: Vec<f64>,
    #[serde(default = "default_true", alias = "is_active")]
    pub is_active: bool,
}

impl DriverDto {
    pub fn from_domain(driver: &Driver) -> Self {
        Self {
            id: driver.id.clone(),
            name: driver.name.clone(),
            current_shift_hours: driver.current_shift_hours,
            past_week_hours: driver.past_week_hours.to_vec(),
            is_active: driver.is_active,
        }
    }

    pub fn to_domain(&self) -> Result<Driver, SimulationError> {
        let past_week_hours: [f64; DAYS_PER_WEEK] =
            self.past_week_hours.as_slice().try_into().map_err(|_| {
                SimulationError::record(
                    "driver",
                    &self.id,
                    format!(
                        "pastWeekHours must have {} entries, got {}",
                        DAYS_PER_WEEK,
                        self.past_week_hours.len()
                    ),
                )
            })?;
        let mut driver = Driver::new(self.id.trim(), self.name.trim())
            .with_current_shift_hours(self.current_shift_hours)
            .with_past_week_hours(past_week_hours);
        driver.is_active = self.is_active;
        Ok(driver)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteDto {
    #[serde(alias = "route_id")]
    pub route_id: String,
    #[serde(alias = "distance_km")]
    pub distance_km: f64,
    /// `Low`, `Medium` or `High`, any case.
    #[serde(alias = "traffic_level")]
    pub traffic_level: String,
    #[serde(alias = "base_time_min")]
    pub base_time_min: f64,
    #[serde(default = "default_true", alias = "is_active")]
    pub is_active: bool,
}

impl RouteDto {
    pub fn from_domain(route: &Route) -> Self {
        Self {
            route_id: route.route_id.clone(),
            distance_km: route.distance_km,
            traffic_level: route.traffic_level.as_str().to_string(),
            base_time_min: route.base_time_min,
            is_active: route.is_active,
        }
    }

    pub fn to_domain(&self) -> Result<Route, SimulationError> {
        let traffic: TrafficLevel = self.traffic_level.parse().map_err(|_| {
            SimulationError::record(
                "route",
                &self.route_id,
                format!("unknown trafficLevel {:?}", self.traffic_level),
            )
        })?;
        let mut route = Route::new(self.route_id.trim(), self.distance_km, traffic, self.base_time_min);
        route.is_active = self.is_active;
        Ok(route)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    #[serde(alias = "order_id")]
    pub order_id: String,
    #[serde(alias = "value_rs")]
    pub value_rs: f64,
    #[serde(alias = "route_id")]
    pub route_id: String,
    /// Deadline on the simulated day.
    #[serde(default, alias = "delivery_time", skip_serializing_if = "Option::is_none")]
    pub delivery_time: Option<String>,
    #[serde(default, alias = "assigned_driver_id", skip_serializing_if = "Option::is_none")]
    pub assigned_driver_id: Option<String>,
    #[serde(default, alias = "simulation_id", skip_serializing_if = "Option::is_none")]
    pub simulation_id: Option<String>,
}

impl OrderDto {
    pub fn from_domain(order: &Order) -> Self {
        Self {
            order_id: order.order_id.clone(),
            value_rs: order.value_rs,
            route_id: order.route_id.clone(),
            delivery_time: order.delivery_time.map(format_time_of_day),
            assigned_driver_id: order.assigned_driver_id.clone(),
            simulation_id: order.simulation_id.clone(),
        }
    }

    pub fn to_domain(&self) -> Result<Order, SimulationError> {
        let mut order = Order::new(self.order_id.trim(), self.value_rs, self.route_id.trim());
        if let Some(raw) = non_blank(&self.delivery_time) {
            let deadline = parse_time_of_day(raw).ok_or_else(|| {
                SimulationError::record(
                    "order",
                    &self.order_id,
                    format!("deliveryTime {:?} is not a time of day", raw),
                )
            })?;
            order = order.with_deadline(deadline);
        }
        order.assigned_driver_id = non_blank(&self.assigned_driver_id).map(str::to_string);
        order.simulation_id = non_blank(&self.simulation_id).map(str::to_string);
        Ok(order)
    }
}

/// Whole fleet, as loaded and exported.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FleetDto {
    #[serde(default)]
    pub drivers: Vec<DriverDto>,
    #[serde(default)]
    pub routes: Vec<RouteDto>,
    #[serde(default)]
    pub orders: Vec<OrderDto>,
}

impl FleetDto {
    pub fn from_snapshot(fleet: &FleetSnapshot) -> Self {
        Self {
            drivers: fleet.drivers.iter().map(DriverDto::from_domain).collect(),
            routes: fleet.routes.iter().map(RouteDto::from_domain).collect(),
            orders: fleet.orders.iter().map(OrderDto::from_domain).collect(),
        }
    }

    /// Converts and validates every record.
    pub fn to_domain(&self) -> Result<FleetSnapshot, SimulationError> {
        let fleet = FleetSnapshot::new(
            self.drivers.iter().map(DriverDto::to_domain).collect::<Result<_, _>>()?,
            self.routes.iter().map(RouteDto::to_domain).collect::<Result<_, _>>()?,
            self.orders.iter().map(OrderDto::to_domain).collect::<Result<_, _>>()?,
        );
        fleet.validate()?;
        Ok(fleet)
    }
}

// ============================================================================
// Dashboard
// ============================================================================

/// One labelled value for a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartPointDto {
    pub name: String,
    pub value: f64,
}

/// Summary of the latest run for the dashboard. All zeros before any run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation_id: Option<String>,
    pub total_profit: f64,
    pub efficiency_score: f64,
    pub total_deliveries: usize,
    /// On-time and late counts.
    pub delivery_stats: Vec<ChartPointDto>,
    /// Fuel cost per route.
    pub fuel_cost_breakdown: Vec<ChartPointDto>,
}

impl DashboardDto {
    pub fn from_record(record: Option<&SimulationRecord>) -> Self {
        let Some(record) = record else {
            return Self::default();
        };
        let result = &record.result;
        Self {
            simulation_id: Some(record.id.clone()),
            total_profit: round2(result.total_profit),
            efficiency_score: round2(result.efficiency_score),
            total_deliveries: result.delivered(),
            delivery_stats: vec![
                ChartPointDto {
                    name: "On Time".to_string(),
                    value: result.on_time_deliveries as f64,
                },
                ChartPointDto {
                    name: "Late".to_string(),
                    value: result.late_deliveries as f64,
                },
            ],
            fuel_cost_breakdown: result
                .fuel_cost_breakdown
                .iter()
                .map(|f| ChartPointDto {
                    name: f.route_id.clone(),
                    value: round2(f.total_cost),
                })
                .collect(),
        }
    }

    /// `Metric,Value` report of the summary.
    ///
    /// ```
    /// use fleet_simulation::dto::DashboardDto;
    ///
    /// let csv = DashboardDto::default().to_csv().unwrap();
    /// assert!(csv.starts_with("Metric,Value\n"));
    /// assert!(csv.contains("Total Profit,0.00\n"));
    /// ```
    pub fn to_csv(&self) -> Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["Metric", "Value"])?;
        writer.write_record(["Total Profit".to_string(), format!("{:.2}", self.total_profit)])?;
        writer.write_record(["Efficiency Score".to_string(), format!("{:.2}", self.efficiency_score)])?;
        writer.write_record(["Total Deliveries".to_string(), self.total_deliveries.to_string()])?;
        for stat in &self.delivery_stats {
            writer.write_record([format!("{} Deliveries", stat.name), stat.value.to_string()])?;
        }
        writer.write_record([
            "Active Routes".to_string(),
            self.fuel_cost_breakdown.len().to_string(),
        ])?;
        for fuel in &self.fuel_cost_breakdown {
            writer.write_record([format!("Fuel Cost {}", fuel.name), format!("{:.2}", fuel.value)])?;
        }
        let bytes = writer.into_inner().map_err(|err| err.into_error())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::UnassignedOrder;
    use crate::kpi::{DriverAssignment, PerformanceMetrics, RouteFuelCost};

    #[test]
    fn test_request_accepts_datetime_local() {
        let dto: SimulationRequestDto = serde_json::from_str(
            r#"{"availableDrivers": 3, "startTime": "2025-08-01T08:30", "maxHoursPerDay": 8}"#,
        )
        .unwrap();
        let request = dto.to_domain().unwrap();
        assert_eq!(request.available_drivers, 3);
        assert_eq!(request.start_time, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
    }

    #[test]
    fn test_request_validation_errors() {
        let dto = SimulationRequestDto {
            available_drivers: 0,
            start_time: "09:00".to_string(),
            max_hours_per_day: 8.0,
        };
        assert_eq!(dto.to_domain(), Err(SimulationError::InvalidDriverCount(0)));

        let dto = SimulationRequestDto {
            available_drivers: -2,
            ..dto
        };
        assert_eq!(dto.to_domain(), Err(SimulationError::InvalidDriverCount(-2)));

        let dto = SimulationRequestDto {
            available_drivers: 2,
            start_time: "25:99".to_string(),
            max_hours_per_day: 8.0,
        };
        assert!(matches!(dto.to_domain(), Err(SimulationError::InvalidStartTime(_))));

        let dto = SimulationRequestDto {
            start_time: "09:00".to_string(),
            max_hours_per_day: 0.0,
            ..dto
        };
        assert_eq!(dto.to_domain(), Err(SimulationError::InvalidCapacity(0.0)));
    }

    #[test]
    fn test_legacy_field_names_are_normalized() {
        let fleet: FleetDto = serde_json::from_str(
            r#"{
                "drivers": [{"_id": "D1", "name": "Asha", "shift_hours": 3, "is_active": false}],
                "routes": [{"route_id": "R1", "distance_km": 12, "traffic_level": "high", "base_time_min": 40}],
                "orders": [{"order_id": "O1", "value_rs": 900, "route_id": "R1",
                            "delivery_time": "2025-08-01T14:15", "assigned_driver_id": ""}]
            }"#,
        )
        .unwrap();
        let snapshot = fleet.to_domain().unwrap();

        let driver = &snapshot.drivers[0];
        assert_eq!(driver.id, "D1");
        assert_eq!(driver.current_shift_hours, 3.0);
        assert_eq!(driver.past_week_hours, [0.0; DAYS_PER_WEEK]);
        assert!(!driver.is_active);

        assert_eq!(snapshot.routes[0].traffic_level, TrafficLevel::High);
        assert!(snapshot.routes[0].is_active);

        let order = &snapshot.orders[0];
        assert_eq!(order.delivery_time, NaiveTime::from_hms_opt(14, 15, 0));
        assert!(!order.is_assigned());
    }

    #[test]
    fn test_invalid_records_are_rejected() {
        let route = RouteDto {
            route_id: "R1".to_string(),
            distance_km: 5.0,
            traffic_level: "Gridlock".to_string(),
            base_time_min: 10.0,
            is_active: true,
        };
        assert_eq!(route.to_domain().unwrap_err().code(), "INVALID_RECORD");

        let driver = DriverDto {
            id: "D1".to_string(),
            name: "A".to_string(),
            current_shift_hours: 0.0,
            past_week_hours: vec![8.0; 5],
            is_active: true,
        };
        assert_eq!(driver.to_domain().unwrap_err().code(), "INVALID_RECORD");

        let fleet = FleetDto {
            drivers: vec![DriverDto {
                current_shift_hours: -1.0,
                past_week_hours: default_week(),
                ..driver
            }],
            ..FleetDto::default()
        };
        assert!(fleet.to_domain().is_err());
    }

    #[test]
    fn test_result_is_rounded_for_output() {
        let result = SimulationResult {
            total_profit: 1234.5678,
            efficiency_score: 66.666_666,
            on_time_deliveries: 2,
            late_deliveries: 1,
            fuel_cost_breakdown: vec![RouteFuelCost {
                route_id: "R1".to_string(),
                total_cost: 70.004,
            }],
            driver_assignments: vec![DriverAssignment {
                driver_id: "D1".to_string(),
                assigned_orders: vec!["O1".to_string()],
                total_hours: 1.0 / 3.0,
                total_profit: 10.0,
            }],
            performance_metrics: PerformanceMetrics {
                utilization_rate: 41.666_666,
                ..PerformanceMetrics::default()
            },
            unassigned_orders: vec![UnassignedOrder {
                order_id: "O9".to_string(),
                reason: UnassignedReason::RouteUnavailable,
            }],
            outcomes: Vec::new(),
        };

        let json = serde_json::to_value(SimulationResultDto::from_result(&result)).unwrap();
        assert_eq!(json["totalProfit"], 1234.57);
        assert_eq!(json["efficiencyScore"], 66.67);
        assert_eq!(json["driverAssignments"][0]["totalHours"], 0.33);
        assert_eq!(json["performanceMetrics"]["utilizationRate"], 41.67);
        assert_eq!(json["fuelCostBreakdown"][0]["totalCost"], 70.0);
        assert_eq!(json["unassignedOrders"][0]["reason"], "ROUTE_UNAVAILABLE");
    }

    #[test]
    fn test_fleet_round_trip_keeps_deadlines() {
        let order = Order::new("O1", 100.0, "R1").with_deadline(NaiveTime::from_hms_opt(16, 45, 0).unwrap());
        let dto = OrderDto::from_domain(&order);
        assert_eq!(dto.delivery_time.as_deref(), Some("16:45"));
        assert_eq!(dto.to_domain().unwrap(), order);
    }

    #[test]
    fn test_csv_quotes_route_names_with_commas() {
        let dashboard = DashboardDto {
            fuel_cost_breakdown: vec![ChartPointDto {
                name: "North, Ring".to_string(),
                value: 12.5,
            }],
            ..DashboardDto::default()
        };
        let csv = dashboard.to_csv().unwrap();
        assert!(csv.contains("\"Fuel Cost North, Ring\",12.50\n"));
        assert!(csv.contains("Active Routes,1\n"));
    }

    #[test]
    fn test_csv_escapes_quotes_in_route_names() {
        let dashboard = DashboardDto {
            fuel_cost_breakdown: vec![ChartPointDto {
                name: "Old \"Mill\" Road".to_string(),
                value: 3.0,
            }],
            ..DashboardDto::default()
        };
        let csv = dashboard.to_csv().unwrap();
        assert!(csv.contains("\"Fuel Cost Old \"\"Mill\"\" Road\",3.00\n"));
        assert!(csv.ends_with('\n'));
    }
}
