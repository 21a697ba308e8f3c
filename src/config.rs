//! Planner configuration.
//!
//! Every section has defaults; `from_env` overrides a few values commonly
//! set per deployment.

use std::env;
use std::str::FromStr;

use serde::Deserialize;
use tracing::warn;

use crate::cost::FuelParams;
use crate::error::ConfigError;
use crate::optimizer::OptimizerOptions;
use crate::osrm::OsrmConfig;
use crate::tolls::TollConfig;
use crate::traits::TravelMode;

pub const ENV_OSRM_URL: &str = "ROUTE_PLANNER_OSRM_URL";
pub const ENV_OSRM_PROFILE: &str = "ROUTE_PLANNER_OSRM_PROFILE";
pub const ENV_FUEL_PRICE: &str = "ROUTE_PLANNER_FUEL_PRICE";
pub const ENV_FUEL_CONSUMPTION: &str = "ROUTE_PLANNER_FUEL_CONSUMPTION";
pub const ENV_TOLL_RATE: &str = "ROUTE_PLANNER_TOLL_RATE";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub osrm: OsrmConfig,
    pub optimizer: OptimizerOptions,
    pub fuel: FuelParams,
    pub tolls: TollConfig,
    #[serde(skip)]
    pub travel_mode: TravelMode,
}

impl PlannerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_OSRM_URL) {
            config.osrm.base_url = url;
        }
        if let Some(profile) = lookup(ENV_OSRM_PROFILE) {
            config.osrm.profile = profile;
        }
        if let Some(price) = amount(&lookup, ENV_FUEL_PRICE) {
            config.fuel.price_per_liter = price;
        }
        if let Some(consumption) = amount(&lookup, ENV_FUEL_CONSUMPTION) {
            config.fuel.consumption_l_per_100km = consumption;
        }
        if let Some(rate) = amount(&lookup, ENV_TOLL_RATE) {
            config.tolls.rate_per_km = rate;
        }

        config
    }

    /// Rejects rates and prices that would make cost estimates meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_amount("fuel.price_per_liter", self.fuel.price_per_liter)?;
        check_amount("fuel.consumption_l_per_100km", self.fuel.consumption_l_per_100km)?;
        check_amount("tolls.rate_per_km", self.tolls.rate_per_km)?;
        check_amount("optimizer.epsilon_km", self.optimizer.epsilon_km)
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidAmount { field, value })
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = raw.as_str(), "ignoring unparseable setting");
            None
        }
    }
}

/// Like [`parsed`], but also ignores NaN, infinities and negatives.
fn amount(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<f64> {
    let value: f64 = parsed(lookup, key)?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        warn!(key, value, "ignoring setting that is not a finite, non-negative number");
        None
    }
}
