//! Trip cost estimation: fuel, tolls and logistics stops.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::directions::RouteMetrics;
use crate::error::ValidationError;
use crate::tolls::{round_cents, TollEstimate};
use crate::waypoints::LogisticsStop;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelParams {
    /// Litres per 100 km.
    pub consumption_l_per_100km: f64,
    /// Euros per litre.
    pub price_per_liter: f64,
}

impl Default for FuelParams {
    fn default() -> Self {
        Self {
            consumption_l_per_100km: 7.5,
            price_per_liter: 1.80,
        }
    }
}

/// `(km / 100) * consumption * price`, rounded to cents.
pub fn fuel_cost(distance_km: f64, params: &FuelParams) -> f64 {
    round_cents(distance_km / 100.0 * params.consumption_l_per_100km * params.price_per_liter)
}

/// Sum of the stops' estimated costs, unset counting as zero.
///
/// `None` when no stop carries a cost.
pub fn parking_total(stops: &[LogisticsStop]) -> Option<f64> {
    let costs: Vec<f64> = stops.iter().filter_map(|stop| stop.estimated_cost).collect();
    if costs.is_empty() {
        None
    } else {
        Some(round_cents(costs.iter().sum()))
    }
}

/// Estimated trip cost. Every input stays user-editable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub distance_km: Option<f64>,
    pub toll_cost: Option<f64>,
    pub toll_count: Option<usize>,
    pub fuel_cost: Option<f64>,
    pub fuel_consumption_rate: f64,
    pub fuel_price_per_liter: f64,
    pub parking_cost: Option<f64>,
    pub total_cost: Option<f64>,
    /// Amount actually spent, entered after the trip.
    pub real_cost: Option<f64>,
    pub notes: String,
    #[serde(default)]
    total_overridden: bool,
    #[serde(default)]
    parking_overridden: bool,
}

/// Builds the breakdown from the provider's metrics and the estimates.
///
/// Without metrics there is no distance, so no fuel cost.
pub fn estimate(
    metrics: Option<&RouteMetrics>,
    tolls: &TollEstimate,
    fuel: FuelParams,
    parking_total: Option<f64>,
) -> CostBreakdown {
    let distance_km = metrics.map(|metrics| metrics.distance_km);
    let mut breakdown = CostBreakdown {
        distance_km,
        toll_cost: tolls.toll_cost,
        toll_count: tolls.toll_cost.map(|_| tolls.toll_count),
        fuel_cost: distance_km.map(|km| fuel_cost(km, &fuel)),
        fuel_consumption_rate: fuel.consumption_l_per_100km,
        fuel_price_per_liter: fuel.price_per_liter,
        parking_cost: parking_total,
        total_cost: None,
        real_cost: None,
        notes: String::new(),
        total_overridden: false,
        parking_overridden: false,
    };
    breakdown.recompute_total();

    debug!(
        fuel = ?breakdown.fuel_cost,
        tolls = ?breakdown.toll_cost,
        parking = ?breakdown.parking_cost,
        total = ?breakdown.total_cost,
        "estimated route cost"
    );

    breakdown
}

impl CostBreakdown {
    pub fn fuel_params(&self) -> FuelParams {
        FuelParams {
            consumption_l_per_100km: self.fuel_consumption_rate,
            price_per_liter: self.fuel_price_per_liter,
        }
    }

    pub fn is_total_overridden(&self) -> bool {
        self.total_overridden
    }

    /// Re-derives fuel cost and the total. A manual total is discarded.
    pub fn set_consumption_rate(&mut self, rate: f64) -> Result<(), ValidationError> {
        self.fuel_consumption_rate = amount("fuel_consumption_rate", rate)?;
        self.refresh_fuel();
        Ok(())
    }

    /// Re-derives fuel cost and the total. A manual total is discarded.
    pub fn set_price_per_liter(&mut self, price: f64) -> Result<(), ValidationError> {
        self.fuel_price_per_liter = amount("fuel_price_per_liter", price)?;
        self.refresh_fuel();
        Ok(())
    }

    pub fn set_toll_cost(&mut self, cost: Option<f64>) -> Result<(), ValidationError> {
        self.toll_cost = cost.map(|c| amount("toll_cost", c)).transpose()?;
        self.recompute_total();
        Ok(())
    }

    /// Manual parking amount, kept by [`CostBreakdown::carry_edits`].
    /// `None` clears it.
    pub fn set_parking_cost(&mut self, cost: Option<f64>) -> Result<(), ValidationError> {
        self.parking_cost = cost.map(|c| amount("parking_cost", c)).transpose()?;
        self.parking_overridden = cost.is_some();
        self.recompute_total();
        Ok(())
    }

    /// Drops a manual parking amount in favour of `derived`.
    pub fn reset_parking_cost(&mut self, derived: Option<f64>) {
        self.parking_cost = derived;
        self.parking_overridden = false;
        self.recompute_total();
    }

    pub fn is_parking_overridden(&self) -> bool {
        self.parking_overridden
    }

    /// Takes over the user-entered values of `previous` that do not depend
    /// on the route: real cost, notes and a manual parking amount. A manual
    /// total belongs to the route it was entered for and is not carried.
    pub fn carry_edits(&mut self, previous: &CostBreakdown) {
        self.real_cost = previous.real_cost;
        self.notes = previous.notes.clone();
        if previous.parking_overridden {
            self.parking_cost = previous.parking_cost;
            self.parking_overridden = true;
            self.recompute_total();
        }
    }

    /// Replaces the derived total until a fuel input changes.
    pub fn override_total(&mut self, total: f64) -> Result<(), ValidationError> {
        self.total_cost = Some(amount("total_cost", total)?);
        self.total_overridden = true;
        Ok(())
    }

    pub fn set_real_cost(&mut self, cost: Option<f64>) -> Result<(), ValidationError> {
        self.real_cost = cost.map(|c| amount("real_cost", c)).transpose()?;
        Ok(())
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    fn refresh_fuel(&mut self) {
        let params = self.fuel_params();
        self.fuel_cost = self.distance_km.map(|km| fuel_cost(km, &params));
        if self.total_overridden {
            debug!("fuel inputs changed, dropping manual total");
            self.total_overridden = false;
        }
        self.recompute_total();
    }

    /// Sum of the present components; `None` only when all are absent.
    fn recompute_total(&mut self) {
        if self.total_overridden {
            return;
        }
        let components = [self.toll_cost, self.fuel_cost, self.parking_cost];
        self.total_cost = if components.iter().all(Option::is_none) {
            None
        } else {
            Some(round_cents(components.iter().flatten().sum()))
        };
    }
}

fn amount(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::InvalidAmount { field, value })
    }
}
