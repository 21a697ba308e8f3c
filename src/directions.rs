//! Typed directions payloads and the route metrics derived from them.

use serde::{Deserialize, Serialize};

use crate::error::DirectionsError;
use crate::polyline::Polyline;

/// One leg between consecutive waypoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub distance_m: f64,
    pub duration_s: f64,
}

/// One turn-by-turn step, as needed for toll detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInstruction {
    /// Human-readable road name or instruction text.
    pub text: String,
    /// Road reference code when the provider supplies one (e.g. "A1").
    pub road_ref: Option<String>,
    pub distance_m: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsResponse {
    pub legs: Vec<RouteLeg>,
    pub instructions: Vec<RouteInstruction>,
    pub geometry: Polyline,
}

impl DirectionsResponse {
    /// Rejects responses that do not describe a path through
    /// `waypoint_count` waypoints.
    pub fn validate(&self, waypoint_count: usize) -> Result<(), DirectionsError> {
        let expected = waypoint_count.saturating_sub(1);
        if self.legs.len() != expected {
            return Err(DirectionsError::Malformed(format!(
                "expected {} legs, got {}",
                expected,
                self.legs.len()
            )));
        }

        let bad_leg = self.legs.iter().any(|leg| {
            !leg.distance_m.is_finite()
                || !leg.duration_s.is_finite()
                || leg.distance_m < 0.0
                || leg.duration_s < 0.0
        });
        if bad_leg {
            return Err(DirectionsError::Malformed(
                "leg with invalid distance or duration".to_string(),
            ));
        }

        if self
            .instructions
            .iter()
            .any(|step| !step.distance_m.is_finite() || step.distance_m < 0.0)
        {
            return Err(DirectionsError::Malformed("instruction with invalid distance".to_string()));
        }

        Ok(())
    }
}

/// Totals reported to the user once the provider answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMetrics {
    pub distance_km: f64,
    pub duration_secs: f64,
    pub total_distance_text: String,
    pub total_duration_text: String,
}

impl RouteMetrics {
    pub fn from_legs(legs: &[RouteLeg]) -> Self {
        let distance_m: f64 = legs.iter().map(|leg| leg.distance_m).sum();
        let duration_secs: f64 = legs.iter().map(|leg| leg.duration_s).sum();
        let distance_km = distance_m / 1000.0;

        Self {
            distance_km,
            duration_secs,
            total_distance_text: format_distance(distance_km),
            total_duration_text: format_duration(duration_secs),
        }
    }
}

fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{} m", (km * 1000.0).round() as i64)
    } else {
        format!("{:.1} km", km)
    }
}

fn format_duration(seconds: f64) -> String {
    let minutes = (seconds / 60.0).round() as i64;
    if minutes < 60 {
        format!("{} min", minutes)
    } else {
        format!("{} h {:02} min", minutes / 60, minutes % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(distance_m: f64, duration_s: f64) -> RouteLeg {
        RouteLeg {
            distance_m,
            duration_s,
        }
    }

    fn response(legs: Vec<RouteLeg>) -> DirectionsResponse {
        DirectionsResponse {
            legs,
            instructions: Vec::new(),
            geometry: Polyline::new(Vec::new()),
        }
    }

    #[test]
    fn test_metrics_sum_legs() {
        let metrics = RouteMetrics::from_legs(&[leg(12_000.0, 900.0), leg(30_400.0, 2_880.0)]);
        assert!((metrics.distance_km - 42.4).abs() < 1e-9);
        assert_eq!(metrics.duration_secs, 3_780.0);
        assert_eq!(metrics.total_distance_text, "42.4 km");
        assert_eq!(metrics.total_duration_text, "1 h 03 min");
    }

    #[test]
    fn test_short_route_text() {
        let metrics = RouteMetrics::from_legs(&[leg(850.0, 150.0)]);
        assert_eq!(metrics.total_distance_text, "850 m");
        assert_eq!(metrics.total_duration_text, "3 min");
    }

    #[test]
    fn test_validate_leg_count() {
        let ok = response(vec![leg(1.0, 1.0), leg(2.0, 2.0)]);
        assert!(ok.validate(3).is_ok());
        assert!(matches!(ok.validate(4), Err(DirectionsError::Malformed(_))));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let bad = response(vec![leg(f64::NAN, 1.0)]);
        assert!(bad.validate(2).is_err());

        let negative = response(vec![leg(10.0, -1.0)]);
        assert!(negative.validate(2).is_err());
    }
}
