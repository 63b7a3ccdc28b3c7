//! Simulation policy and server configuration.
//!
//! [`SimulationPolicy`] groups every tunable business constant of the engine
//! (fatigue derating, traffic multipliers, fuel pricing, incentives, KPI
//! weights) so they can be calibrated without touching the pipeline.
//! [`ServerConfig`] is read from the environment by the binary.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;
use utoipa::ToSchema;

use crate::demo_data::DemoData;
use crate::domain::TrafficLevel;
use crate::error::SimulationError;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 7860;

/// One factor per [`TrafficLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrafficFactors {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl TrafficFactors {
    pub fn new(low: f64, medium: f64, high: f64) -> Self {
        Self { low, medium, high }
    }

    pub fn get(&self, level: TrafficLevel) -> f64 {
        match level {
            TrafficLevel::Low => self.low,
            TrafficLevel::Medium => self.medium,
            TrafficLevel::High => self.high,
        }
    }

    fn is_non_decreasing(&self) -> bool {
        self.low <= self.medium && self.medium <= self.high
    }

    fn is_positive(&self) -> bool {
        [self.low, self.medium, self.high]
            .iter()
            .all(|f| f.is_finite() && *f > 0.0)
    }
}

/// Tunable constants of the simulation engine.
///
/// Deserializes with `#[serde(default)]`, so a policy file only needs the
/// fields it overrides.
///
/// # Examples
///
/// ```
/// use fleet_simulation::config::SimulationPolicy;
///
/// let policy: SimulationPolicy = serde_json::from_str(r#"{"bonusRate": 0.2}"#).unwrap();
/// assert_eq!(policy.bonus_rate, 0.2);
/// assert_eq!(policy.fuel_cost_per_km, SimulationPolicy::default().fuel_cost_per_km);
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationPolicy {
    /// Trailing seven-day load above which a driver counts as fatigued.
    pub fatigue_weekly_hours: f64,
    /// Share of remaining capacity a fatigued driver keeps, in `(0, 1]`.
    pub fatigue_derating: f64,
    /// Transit time multipliers, strictly increasing with traffic.
    pub traffic_time_multipliers: TrafficFactors,
    /// Fuel price per kilometre in rupees.
    pub fuel_cost_per_km: f64,
    /// Fuel multipliers, non-decreasing with traffic.
    pub traffic_fuel_factors: TrafficFactors,
    /// Bonus as a share of order value for on-time deliveries.
    pub bonus_rate: f64,
    /// Orders must be worth more than this to earn the bonus.
    pub bonus_min_value: f64,
    /// Flat charge for a late delivery.
    pub late_penalty_flat: f64,
    /// Additional charge per minute of lateness.
    pub late_penalty_per_minute: f64,
    /// Weight of the on-time percentage in the efficiency score.
    pub on_time_weight: f64,
    /// Weight of the utilization rate in the efficiency score.
    pub utilization_weight: f64,
}

impl Default for SimulationPolicy {
    fn default() -> Self {
        Self {
            fatigue_weekly_hours: 48.0,
            fatigue_derating: 0.7,
            traffic_time_multipliers: TrafficFactors::new(1.0, 1.3, 1.6),
            fuel_cost_per_km: 5.0,
            traffic_fuel_factors: TrafficFactors::new(1.0, 1.2, 1.4),
            bonus_rate: 0.10,
            bonus_min_value: 1000.0,
            late_penalty_flat: 50.0,
            late_penalty_per_minute: 0.0,
            on_time_weight: 0.7,
            utilization_weight: 0.3,
        }
    }
}

impl SimulationPolicy {
    /// Checks ranges and traffic monotonicity.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let time = &self.traffic_time_multipliers;
        if !time.is_positive() || !(time.low < time.medium && time.medium < time.high) {
            return Err(SimulationError::InvalidPolicy(
                "trafficTimeMultipliers must be positive and strictly increasing".to_string(),
            ));
        }
        let fuel = &self.traffic_fuel_factors;
        if !fuel.is_positive() || !fuel.is_non_decreasing() {
            return Err(SimulationError::InvalidPolicy(
                "trafficFuelFactors must be positive and non-decreasing".to_string(),
            ));
        }
        if !(self.fatigue_derating > 0.0 && self.fatigue_derating <= 1.0) {
            return Err(SimulationError::InvalidPolicy(
                "fatigueDerating must be in (0, 1]".to_string(),
            ));
        }

        let non_negative = [
            ("fatigueWeeklyHours", self.fatigue_weekly_hours),
            ("fuelCostPerKm", self.fuel_cost_per_km),
            ("bonusRate", self.bonus_rate),
            ("bonusMinValue", self.bonus_min_value),
            ("latePenaltyFlat", self.late_penalty_flat),
            ("latePenaltyPerMinute", self.late_penalty_per_minute),
            ("onTimeWeight", self.on_time_weight),
            ("utilizationWeight", self.utilization_weight),
        ];
        if let Some((name, _)) = non_negative
            .iter()
            .find(|(_, value)| !(value.is_finite() && *value >= 0.0))
        {
            return Err(SimulationError::InvalidPolicy(format!(
                "{} must be a non-negative number",
                name
            )));
        }
        if self.on_time_weight + self.utilization_weight <= 0.0 {
            return Err(SimulationError::InvalidPolicy(
                "efficiency weights must not both be zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads a policy from a JSON file and validates it.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::PolicyFile {
            path: path.to_path_buf(),
            source,
        })?;
        let policy: SimulationPolicy =
            serde_json::from_str(&raw).map_err(|source| ConfigError::PolicyParse {
                path: path.to_path_buf(),
                source,
            })?;
        policy.validate()?;
        Ok(policy)
    }
}

/// Errors raised while reading [`ServerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("cannot read policy file {path:?}: {source}")]
    PolicyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse policy file {path:?}: {source}")]
    PolicyParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Policy(#[from] SimulationError),
}

/// Runtime configuration of the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Dataset loaded into the fleet store at startup, if any.
    pub demo_data: Option<DemoData>,
    pub policy: SimulationPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            demo_data: Some(DemoData::Small),
            policy: SimulationPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Reads `FLEET_SIM_HOST`, `FLEET_SIM_PORT`, `FLEET_SIM_DEMO_DATA` and
    /// `FLEET_SIM_POLICY` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    ///
    /// ```
    /// use fleet_simulation::config::ServerConfig;
    ///
    /// let config = ServerConfig::from_lookup(|key| match key {
    ///     "FLEET_SIM_PORT" => Some("8080".to_string()),
    ///     "FLEET_SIM_DEMO_DATA" => Some("none".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(config.port, 8080);
    /// assert!(config.demo_data.is_none());
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ServerConfig::default();

        if let Some(value) = lookup("FLEET_SIM_HOST") {
            config.host = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "FLEET_SIM_HOST",
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("FLEET_SIM_PORT") {
            config.port = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "FLEET_SIM_PORT",
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("FLEET_SIM_DEMO_DATA") {
            config.demo_data = if value.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "FLEET_SIM_DEMO_DATA",
                    value: value.clone(),
                })?)
            };
        }
        if let Some(path) = lookup("FLEET_SIM_POLICY") {
            config.policy = SimulationPolicy::from_json_file(Path::new(&path))?;
        }
        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid_and_monotonic() {
        let policy = SimulationPolicy::default();
        assert!(policy.validate().is_ok());

        let time = policy.traffic_time_multipliers;
        assert!(time.get(TrafficLevel::Low) < time.get(TrafficLevel::Medium));
        assert!(time.get(TrafficLevel::Medium) < time.get(TrafficLevel::High));
    }

    #[test]
    fn test_policy_rejects_decreasing_multipliers() {
        let policy = SimulationPolicy {
            traffic_time_multipliers: TrafficFactors::new(1.0, 1.6, 1.3),
            ..SimulationPolicy::default()
        };
        assert!(matches!(policy.validate(), Err(SimulationError::InvalidPolicy(_))));
    }

    #[test]
    fn test_policy_rejects_out_of_range_derating() {
        let policy = SimulationPolicy {
            fatigue_derating: 0.0,
            ..SimulationPolicy::default()
        };
        assert!(policy.validate().is_err());

        let policy = SimulationPolicy {
            late_penalty_flat: -1.0,
            ..SimulationPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_policy_file_round_trip() {
        let path = std::env::temp_dir().join(format!("fleet-policy-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"latePenaltyFlat": 75.0, "fatigueDerating": 0.5}"#).unwrap();

        let policy = SimulationPolicy::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(policy.late_penalty_flat, 75.0);
        assert_eq!(policy.fatigue_derating, 0.5);
        assert_eq!(policy.bonus_rate, 0.10);
    }

    #[test]
    fn test_missing_policy_file_is_reported() {
        let err = ServerConfig::from_lookup(|key| match key {
            "FLEET_SIM_POLICY" => Some("/nonexistent/policy.json".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::PolicyFile { .. }));
    }

    #[test]
    fn test_invalid_port_is_reported() {
        let err = ServerConfig::from_lookup(|key| match key {
            "FLEET_SIM_PORT" => Some("seventy".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "FLEET_SIM_PORT", .. }));
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.demo_data, Some(DemoData::Small));
        assert_eq!(config.socket_addr().port(), DEFAULT_PORT);
    }
}
