//! Directions provider stand-in with scripted answers.

use std::cell::{Cell, RefCell};

use field_route_planner::directions::{DirectionsResponse, RouteInstruction, RouteLeg};
use field_route_planner::error::DirectionsError;
use field_route_planner::haversine::haversine_km;
use field_route_planner::model::Coordinates;
use field_route_planner::polyline::Polyline;
use field_route_planner::traits::{DirectionsProvider, TravelMode};

/// Road distance is taken as 1.3x the straight line at 50 km/h. Every leg
/// gets one instruction, on the A1 when `tolled` is set.
pub struct ScriptedDirections {
    pub fail: Cell<bool>,
    pub tolled: bool,
    pub calls: Cell<usize>,
    pub last_waypoints: RefCell<Vec<Coordinates>>,
}

impl ScriptedDirections {
    pub fn new() -> Self {
        Self {
            fail: Cell::new(false),
            tolled: false,
            calls: Cell::new(0),
            last_waypoints: RefCell::new(Vec::new()),
        }
    }

    pub fn tolled() -> Self {
        Self {
            tolled: true,
            ..Self::new()
        }
    }

    pub fn failing() -> Self {
        let provider = Self::new();
        provider.fail.set(true);
        provider
    }

    pub fn answer(&self, waypoints: &[Coordinates]) -> Result<DirectionsResponse, DirectionsError> {
        if self.fail.get() {
            return Err(DirectionsError::Provider {
                code: "NoRoute".to_string(),
                message: "scripted failure".to_string(),
            });
        }

        let legs: Vec<RouteLeg> = waypoints
            .windows(2)
            .map(|pair| {
                let km = haversine_km(pair[0], pair[1]) * 1.3;
                RouteLeg {
                    distance_m: km * 1000.0,
                    duration_s: km / 50.0 * 3600.0,
                }
            })
            .collect();

        let instructions = legs
            .iter()
            .map(|leg| RouteInstruction {
                text: if self.tolled {
                    "Autoestrada do Norte".to_string()
                } else {
                    "Avenida da Liberdade".to_string()
                },
                road_ref: self.tolled.then(|| "A1".to_string()),
                distance_m: leg.distance_m,
            })
            .collect();

        Ok(DirectionsResponse {
            legs,
            instructions,
            geometry: Polyline::new(waypoints.to_vec()),
        })
    }
}

impl DirectionsProvider for ScriptedDirections {
    fn route(
        &self,
        waypoints: &[Coordinates],
        _mode: TravelMode,
    ) -> Result<DirectionsResponse, DirectionsError> {
        self.calls.set(self.calls.get() + 1);
        *self.last_waypoints.borrow_mut() = waypoints.to_vec();
        self.answer(waypoints)
    }
}
