//! OSRM HTTP adapter for directions.
//!
//! Calls the `route` service with turn-by-turn steps and maps the JSON
//! body into [`DirectionsResponse`] at the boundary.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::directions::{DirectionsResponse, RouteInstruction, RouteLeg};
use crate::error::DirectionsError;
use crate::model::Coordinates;
use crate::polyline::{Polyline, PRECISION_5};
use crate::traits::{DirectionsProvider, TravelMode};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OsrmConfig {
    pub base_url: String,
    /// Profile used for driving; walking and cycling use `foot` and `bike`.
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn profile(&self, mode: TravelMode) -> &str {
        match mode {
            TravelMode::Driving => &self.config.profile,
            TravelMode::Walking => "foot",
            TravelMode::Cycling => "bike",
        }
    }

    fn route_url(&self, waypoints: &[Coordinates], mode: TravelMode) -> String {
        let coords = waypoints
            .iter()
            .map(|point| format!("{:.6},{:.6}", point.lng, point.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/route/v1/{}/{}?overview=full&steps=true&geometries=polyline",
            self.config.base_url.trim_end_matches('/'),
            self.profile(mode),
            coords
        )
    }
}

impl DirectionsProvider for OsrmClient {
    fn route(
        &self,
        waypoints: &[Coordinates],
        mode: TravelMode,
    ) -> Result<DirectionsResponse, DirectionsError> {
        if waypoints.len() < 2 {
            return Err(DirectionsError::TooFewWaypoints(waypoints.len()));
        }

        let url = self.route_url(waypoints, mode);
        debug!(waypoints = waypoints.len(), "requesting OSRM route");

        let body = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<OsrmRouteResponse>())
            .inspect_err(|err| warn!(error = %err, "OSRM route request failed"))?;

        into_directions(body, waypoints.len())
    }
}

/// Maps an OSRM `route` body, taking the first (best) route.
pub fn into_directions(
    body: OsrmRouteResponse,
    waypoint_count: usize,
) -> Result<DirectionsResponse, DirectionsError> {
    if body.code != "Ok" {
        return Err(DirectionsError::Provider {
            code: body.code,
            message: body.message.unwrap_or_default(),
        });
    }

    let route = body
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| DirectionsError::Malformed("response contains no routes".to_string()))?;

    let geometry = match route.geometry {
        Some(encoded) => Polyline::decode(&encoded, PRECISION_5)?,
        None => Polyline::new(Vec::new()),
    };

    let mut legs = Vec::with_capacity(route.legs.len());
    let mut instructions = Vec::new();
    for leg in route.legs {
        legs.push(RouteLeg {
            distance_m: leg.distance,
            duration_s: leg.duration,
        });
        instructions.extend(leg.steps.into_iter().map(OsrmStep::into_instruction));
    }

    let response = DirectionsResponse {
        legs,
        instructions,
        geometry,
    };
    response.validate(waypoint_count)?;
    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: Option<String>,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    distance: f64,
    duration: f64,
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    distance: f64,
    #[serde(default)]
    name: String,
    #[serde(rename = "ref")]
    road_ref: Option<String>,
    maneuver: Option<OsrmManeuver>,
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    #[serde(rename = "type")]
    kind: String,
    modifier: Option<String>,
}

impl OsrmStep {
    fn into_instruction(self) -> RouteInstruction {
        let action = self.maneuver.map(|maneuver| match maneuver.modifier {
            Some(modifier) => format!("{} {}", maneuver.kind, modifier),
            None => maneuver.kind,
        });

        let text = match (action, self.name.is_empty()) {
            (Some(action), false) => format!("{} onto {}", action, self.name),
            (Some(action), true) => action,
            (None, _) => self.name,
        };

        RouteInstruction {
            text,
            road_ref: self.road_ref.filter(|road_ref| !road_ref.is_empty()),
            distance_m: self.distance,
        }
    }
}
