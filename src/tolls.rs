//! Toll estimate from turn-by-turn instructions.
//!
//! Road identifiers are matched against a motorway naming pattern. Every
//! instruction on a matched road adds its distance to that road's total;
//! tolled distance times a flat per-km rate is the estimate. This is an
//! approximation and never authoritative.

use std::collections::HashMap;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::directions::RouteInstruction;
use crate::error::ConfigError;

/// Motorway codes (A1, A 22, A-5) and Lisbon ring roads.
pub const DEFAULT_ROAD_PATTERN: &str = r"(?i)\b(A\s?-?\d{1,2}|CREL|CRIL)\b";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TollConfig {
    /// Euros per tolled kilometre.
    pub rate_per_km: f64,
    pub road_pattern: String,
}

impl Default for TollConfig {
    fn default() -> Self {
        Self {
            rate_per_km: 0.09,
            road_pattern: DEFAULT_ROAD_PATTERN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TollEstimate {
    /// `None` when no tolled road was found.
    pub toll_cost: Option<f64>,
    /// Distinct tolled roads.
    pub toll_count: usize,
    pub tolled_km: f64,
    /// Tolled kilometres per normalised road id, sorted by road id.
    pub roads: Vec<(String, f64)>,
}

#[derive(Debug, Clone)]
pub struct TollEstimator {
    rate_per_km: f64,
    pattern: Regex,
}

impl TollEstimator {
    pub fn new(config: &TollConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            rate_per_km: config.rate_per_km,
            pattern: Regex::new(&config.road_pattern)?,
        })
    }

    pub fn estimate(&self, instructions: &[RouteInstruction]) -> TollEstimate {
        let mut per_road: HashMap<String, f64> = HashMap::new();

        for step in instructions {
            if let Some(road) = self.matched_road(step) {
                *per_road.entry(road).or_default() += step.distance_m / 1000.0;
            }
        }

        if per_road.is_empty() {
            return TollEstimate::default();
        }

        let mut roads: Vec<(String, f64)> = per_road.into_iter().collect();
        roads.sort_by(|a, b| a.0.cmp(&b.0));
        let tolled_km: f64 = roads.iter().map(|(_, km)| km).sum();
        let toll_cost = round_cents(tolled_km * self.rate_per_km);

        debug!(roads = roads.len(), tolled_km, toll_cost, "estimated tolls");

        TollEstimate {
            toll_cost: Some(toll_cost),
            toll_count: roads.len(),
            tolled_km,
            roads,
        }
    }

    /// First pattern match in the road reference, else in the text.
    fn matched_road(&self, step: &RouteInstruction) -> Option<String> {
        step.road_ref
            .as_deref()
            .and_then(|road_ref| self.pattern.find(road_ref))
            .or_else(|| self.pattern.find(&step.text))
            .map(|found| normalize_road(found.as_str()))
    }
}

fn normalize_road(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_uppercase)
        .collect()
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> TollEstimator {
        TollEstimator::new(&TollConfig::default()).unwrap()
    }

    fn step(text: &str, road_ref: Option<&str>, distance_m: f64) -> RouteInstruction {
        RouteInstruction {
            text: text.to_string(),
            road_ref: road_ref.map(str::to_string),
            distance_m,
        }
    }

    #[test]
    fn test_no_matches_is_not_an_error() {
        let estimate = estimator().estimate(&[
            step("Rua Augusta", None, 500.0),
            step("Avenida da Liberdade", None, 1_200.0),
        ]);
        assert_eq!(estimate.toll_cost, None);
        assert_eq!(estimate.toll_count, 0);
        assert_eq!(estimate.tolled_km, 0.0);
    }

    #[test]
    fn test_distinct_roads_accumulate_distance() {
        let estimate = estimator().estimate(&[
            step("Autoestrada do Norte", Some("A1"), 40_000.0),
            step("Rua do Ouro", None, 300.0),
            step("Continue on A 1", None, 10_000.0),
            step("Take exit towards A-8", None, 50_000.0),
        ]);

        assert_eq!(estimate.toll_count, 2);
        assert_eq!(
            estimate.roads,
            vec![("A1".to_string(), 50.0), ("A8".to_string(), 50.0)]
        );
        assert_eq!(estimate.tolled_km, 100.0);
        assert_eq!(estimate.toll_cost, Some(9.0));
    }

    #[test]
    fn test_ring_roads() {
        let estimate = estimator().estimate(&[
            step("Merge onto CREL", None, 12_500.0),
            step("crel", None, 2_500.0),
        ]);
        assert_eq!(estimate.toll_count, 1);
        assert_eq!(estimate.roads[0].0, "CREL");
        assert_eq!(estimate.toll_cost, Some(1.35));
    }

    #[test]
    fn test_word_boundaries() {
        let estimate = estimator().estimate(&[
            step("Rua A123", None, 1_000.0),
            step("CA12", None, 1_000.0),
        ]);
        assert_eq!(estimate.toll_count, 0);
    }

    #[test]
    fn test_custom_rate() {
        let config = TollConfig {
            rate_per_km: 0.12,
            ..Default::default()
        };
        let estimate = TollEstimator::new(&config)
            .unwrap()
            .estimate(&[step("A2", Some("A2"), 25_000.0)]);
        assert_eq!(estimate.toll_cost, Some(3.0));
    }

    #[test]
    fn test_invalid_pattern() {
        let config = TollConfig {
            road_pattern: "(".to_string(),
            ..Default::default()
        };
        assert!(TollEstimator::new(&config).is_err());
    }
}
