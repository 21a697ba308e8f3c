//! Route planning session.
//!
//! A [`RoutePlan`] owns one user's selection, the optimized order, the
//! logistics stops and the derived metrics and costs. Directions calls
//! happen outside the plan: the plan hands out a [`CalculationTicket`] with
//! the waypoints to route, and the caller returns the provider's answer
//! through [`RoutePlan::complete`]. Only the answer for the latest ticket
//! is applied; older answers are discarded.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::cost::{self, parking_total, CostBreakdown, FuelParams};
use crate::directions::{DirectionsResponse, RouteMetrics};
use crate::error::{ConfigError, DirectionsError, PlanError, ValidationError};
use crate::haversine::HaversineMatrix;
use crate::model::{Coordinates, Location, RoutePoint, StartingPoint};
use crate::optimizer::optimize_with;
use crate::saved::{SavedDestination, SavedRoute};
use crate::tolls::{TollEstimate, TollEstimator};
use crate::traits::{DirectionsProvider, NearbyPlace, RouteRepository, TravelMode};
use crate::waypoints::{
    build_waypoints, validate_stop_index, LogisticsStop, StopCategory, WaypointSequence,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanState {
    Empty,
    Selecting,
    Calculating,
    Calculated,
    Recalculating,
    Saved,
}

impl PlanState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanState::Empty => "empty",
            PlanState::Selecting => "selecting",
            PlanState::Calculating => "calculating",
            PlanState::Calculated => "calculated",
            PlanState::Recalculating => "recalculating",
            PlanState::Saved => "saved",
        }
    }

    fn has_route(&self) -> bool {
        matches!(self, PlanState::Calculated | PlanState::Saved)
    }

    fn is_calculation_requested(&self) -> bool {
        !matches!(self, PlanState::Empty | PlanState::Selecting)
    }
}

/// A pending directions request.
///
/// `waypoints` starts at the starting point and ends at the last
/// destination.
#[derive(Debug, Clone)]
pub struct CalculationTicket {
    generation: u64,
    pub waypoints: Vec<Coordinates>,
    pub mode: TravelMode,
}

impl CalculationTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationOutcome {
    Applied,
    /// A newer request or a reset superseded this one.
    Stale,
}

/// Last stable state, restored when a recalculation fails.
#[derive(Debug, Clone)]
struct Snapshot {
    state: PlanState,
    start: Option<StartingPoint>,
    candidates: Vec<Location>,
    order: Vec<String>,
    stops: Vec<LogisticsStop>,
    metrics: Option<RouteMetrics>,
    tolls: TollEstimate,
    costs: Option<CostBreakdown>,
}

#[derive(Debug, Clone)]
pub struct RoutePlan {
    config: PlannerConfig,
    toll_estimator: TollEstimator,
    state: PlanState,
    start: Option<StartingPoint>,
    candidates: Vec<Location>,
    order: Vec<String>,
    stops: Vec<LogisticsStop>,
    metrics: Option<RouteMetrics>,
    tolls: TollEstimate,
    costs: Option<CostBreakdown>,
    fuel: FuelParams,
    generation: u64,
    in_flight: Option<u64>,
    rollback: Option<Snapshot>,
    saved_id: Option<u64>,
}

impl RoutePlan {
    pub fn new(config: PlannerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let toll_estimator = TollEstimator::new(&config.tolls)?;
        Ok(Self {
            fuel: config.fuel,
            config,
            toll_estimator,
            state: PlanState::Empty,
            start: None,
            candidates: Vec::new(),
            order: Vec::new(),
            stops: Vec::new(),
            metrics: None,
            tolls: TollEstimate::default(),
            costs: None,
            generation: 0,
            in_flight: None,
            rollback: None,
            saved_id: None,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> PlanState {
        self.state
    }

    pub fn start(&self) -> Option<&StartingPoint> {
        self.start.as_ref()
    }

    pub fn candidates(&self) -> &[Location] {
        &self.candidates
    }

    /// Optimized destination ids; empty before the first calculation.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn stops(&self) -> &[LogisticsStop] {
        &self.stops
    }

    pub fn metrics(&self) -> Option<&RouteMetrics> {
        self.metrics.as_ref()
    }

    pub fn tolls(&self) -> &TollEstimate {
        &self.tolls
    }

    pub fn costs(&self) -> Option<&CostBreakdown> {
        self.costs.as_ref()
    }

    pub fn saved_id(&self) -> Option<u64> {
        self.saved_id
    }

    pub fn destination_count(&self) -> usize {
        self.order.len()
    }

    /// Destinations and stops in travel order, without the starting point.
    pub fn waypoints(&self) -> Result<WaypointSequence<String>, ValidationError> {
        build_waypoints(&self.ordered_destinations(), &self.stops)
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Sets the starting point. Recalculates if a route was requested.
    pub fn set_start(
        &mut self,
        start: StartingPoint,
    ) -> Result<Option<CalculationTicket>, PlanError> {
        let recalculate = self.state.is_calculation_requested();
        let rollback = self.rollback_point();
        self.start = Some(start);
        self.after_change(rollback, recalculate)
    }

    /// Adds a destination. Already selected ids are ignored.
    pub fn select(&mut self, location: Location) -> Result<Option<CalculationTicket>, PlanError> {
        if self.candidates.iter().any(|selected| selected.id == location.id) {
            return Ok(None);
        }
        if location.coordinates.is_none() {
            warn!(location = location.id.as_str(), "selected location has no coordinates");
        }

        let recalculate = self.state.is_calculation_requested();
        let rollback = self.rollback_point();
        self.candidates.push(location);
        self.after_change(rollback, recalculate)
    }

    pub fn deselect(&mut self, id: &str) -> Result<Option<CalculationTicket>, PlanError> {
        let Some(position) = self.candidates.iter().position(|selected| selected.id == id) else {
            return Ok(None);
        };

        let recalculate = self.state.is_calculation_requested();
        let rollback = self.rollback_point();
        self.candidates.remove(position);
        self.after_change(rollback, recalculate)
    }

    /// Back to `Empty`. Saved routes are untouched; any pending directions
    /// answer will be discarded.
    pub fn clear(&mut self) {
        self.discard_route();
        self.start = None;
        self.candidates.clear();
        self.fuel = self.config.fuel;
        self.saved_id = None;
        self.transition(PlanState::Empty);
    }

    // ------------------------------------------------------------------
    // Calculation
    // ------------------------------------------------------------------

    /// Orders the destinations and requests directions for them.
    pub fn calculate(&mut self) -> Result<CalculationTicket, PlanError> {
        if self.candidates.is_empty() {
            return Err(PlanError::PreconditionFailed("no destinations selected".to_string()));
        }
        let rollback = self.rollback_point();
        self.launch(rollback)
    }

    /// Applies the answer to `ticket`.
    ///
    /// On failure the plan returns to its last stable state: the previous
    /// calculated route, or `Selecting` with the optimized order kept.
    pub fn complete(
        &mut self,
        ticket: CalculationTicket,
        result: Result<DirectionsResponse, DirectionsError>,
    ) -> Result<CalculationOutcome, PlanError> {
        if self.in_flight != Some(ticket.generation) {
            debug!(
                generation = ticket.generation,
                current = self.generation,
                "discarding stale directions response"
            );
            return Ok(CalculationOutcome::Stale);
        }
        self.in_flight = None;

        let checked = result.and_then(|response| {
            response.validate(ticket.waypoints.len())?;
            Ok(response)
        });

        match checked {
            Ok(response) => {
                self.apply(response);
                Ok(CalculationOutcome::Applied)
            }
            Err(err) => {
                warn!(error = %err, "route calculation failed");
                let rollback = self.rollback.take();
                self.abort(rollback);
                Err(PlanError::RouteCalculationFailed(err))
            }
        }
    }

    /// Sends `ticket` to `provider` and applies the answer.
    pub fn run<P: DirectionsProvider>(
        &mut self,
        ticket: CalculationTicket,
        provider: &P,
    ) -> Result<CalculationOutcome, PlanError> {
        let result = provider.route(&ticket.waypoints, ticket.mode);
        self.complete(ticket, result)
    }

    pub fn calculate_with<P: DirectionsProvider>(
        &mut self,
        provider: &P,
    ) -> Result<CalculationOutcome, PlanError> {
        let ticket = self.calculate()?;
        self.run(ticket, provider)
    }

    // ------------------------------------------------------------------
    // Logistics stops
    // ------------------------------------------------------------------

    /// Inserts a stop and requests a fresh route.
    pub fn add_stop(&mut self, stop: LogisticsStop) -> Result<CalculationTicket, PlanError> {
        self.require_order()?;
        validate_stop_index(stop.after_stop_index(), self.order.len())?;

        let rollback = self.rollback_point();
        info!(stop = stop.name.as_str(), after = stop.after_stop_index(), "adding logistics stop");
        self.stops.push(stop);
        self.launch(rollback)
    }

    pub fn add_stop_from_place(
        &mut self,
        place: NearbyPlace,
        category: StopCategory,
        after_stop_index: usize,
    ) -> Result<CalculationTicket, PlanError> {
        self.require_order()?;
        let stop = LogisticsStop::from_place(place, category, after_stop_index, self.order.len())?;
        self.add_stop(stop)
    }

    /// Removes the stop at `index` and requests a fresh route, also when
    /// it was the last stop.
    pub fn remove_stop(&mut self, index: usize) -> Result<CalculationTicket, PlanError> {
        self.require_order()?;
        if index >= self.stops.len() {
            return Err(ValidationError::UnknownStop(index).into());
        }

        let rollback = self.rollback_point();
        let removed = self.stops.remove(index);
        info!(stop = removed.name.as_str(), "removed logistics stop");
        self.launch(rollback)
    }

    // ------------------------------------------------------------------
    // Cost edits
    // ------------------------------------------------------------------

    pub fn set_consumption_rate(&mut self, rate: f64) -> Result<(), PlanError> {
        self.edit_costs(|costs| costs.set_consumption_rate(rate))?;
        self.fuel.consumption_l_per_100km = rate;
        Ok(())
    }

    pub fn set_fuel_price(&mut self, price: f64) -> Result<(), PlanError> {
        self.edit_costs(|costs| costs.set_price_per_liter(price))?;
        self.fuel.price_per_liter = price;
        Ok(())
    }

    /// Manual toll amount; replaced by the next route calculation.
    pub fn set_toll_cost(&mut self, cost: Option<f64>) -> Result<(), PlanError> {
        self.edit_costs(|costs| costs.set_toll_cost(cost))
    }

    /// Manual parking total; kept across recalculations and saves. `None`
    /// returns to the sum of the stops' estimated costs.
    pub fn set_parking_cost(&mut self, cost: Option<f64>) -> Result<(), PlanError> {
        let derived = parking_total(&self.stops);
        self.edit_costs(|costs| match cost {
            Some(amount) => costs.set_parking_cost(Some(amount)),
            None => {
                costs.reset_parking_cost(derived);
                Ok(())
            }
        })
    }

    pub fn override_total(&mut self, total: f64) -> Result<(), PlanError> {
        self.edit_costs(|costs| costs.override_total(total))
    }

    pub fn set_real_cost(&mut self, cost: Option<f64>) -> Result<(), PlanError> {
        self.edit_costs(|costs| costs.set_real_cost(cost))
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> Result<(), PlanError> {
        let notes = notes.into();
        self.edit_costs(|costs| {
            costs.set_notes(notes);
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Persists the current route. The first save creates a record, later
    /// saves replace it.
    pub fn save<R: RouteRepository>(
        &mut self,
        repository: &mut R,
        name: Option<String>,
        date: NaiveDate,
    ) -> Result<u64, PlanError> {
        if !self.state.has_route() {
            return Err(PlanError::InvalidState(self.state.as_str()));
        }

        let route = self.snapshot_route(name, date)?;
        let id = match self.saved_id {
            Some(id) => {
                repository.update(id, route)?;
                id
            }
            None => repository.create(route)?,
        };

        info!(id, "saved route");
        self.saved_id = Some(id);
        self.transition(PlanState::Saved);
        Ok(id)
    }

    /// Replaces this plan with a saved route.
    pub fn load(&mut self, id: u64, route: SavedRoute) {
        self.discard_route();

        self.candidates = route
            .destinations
            .iter()
            .map(|destination| Location {
                id: destination.location_id.clone(),
                name: destination.name.clone(),
                kind: destination.kind,
                coordinates: Some(destination.coordinates),
                address: None,
                postal_code: None,
                city: None,
            })
            .collect();
        self.order = route
            .destinations
            .into_iter()
            .map(|destination| destination.location_id)
            .collect();
        self.start = Some(route.start);
        self.stops = route.logistics_stops;
        self.metrics = route.metrics;
        if let Some(costs) = &route.costs {
            self.fuel = costs.fuel_params();
            self.tolls = TollEstimate {
                toll_cost: costs.toll_cost,
                toll_count: costs.toll_count.unwrap_or(0),
                ..Default::default()
            };
        }
        self.costs = route.costs;
        self.saved_id = Some(id);
        self.transition(PlanState::Saved);
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn transition(&mut self, to: PlanState) {
        if self.state != to {
            debug!(from = self.state.as_str(), to = to.as_str(), "route plan state");
        }
        self.state = to;
    }

    /// State to fall back to when nothing is calculated.
    fn idle_state(&self) -> PlanState {
        if self.candidates.is_empty() {
            PlanState::Empty
        } else {
            PlanState::Selecting
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            start: self.start.clone(),
            candidates: self.candidates.clone(),
            order: self.order.clone(),
            stops: self.stops.clone(),
            metrics: self.metrics.clone(),
            tolls: self.tolls.clone(),
            costs: self.costs.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.start = snapshot.start;
        self.candidates = snapshot.candidates;
        self.order = snapshot.order;
        self.stops = snapshot.stops;
        self.metrics = snapshot.metrics;
        self.tolls = snapshot.tolls;
        self.costs = snapshot.costs;
        self.transition(snapshot.state);
    }

    /// The stable state a new calculation would fall back to.
    fn rollback_point(&mut self) -> Option<Snapshot> {
        match self.state {
            PlanState::Calculated | PlanState::Saved => Some(self.snapshot()),
            PlanState::Recalculating => self.rollback.take(),
            _ => None,
        }
    }

    fn abort(&mut self, rollback: Option<Snapshot>) {
        self.in_flight = None;
        match rollback {
            Some(snapshot) => self.restore(snapshot),
            None => {
                let idle = self.idle_state();
                self.transition(idle);
            }
        }
    }

    fn after_change(
        &mut self,
        rollback: Option<Snapshot>,
        recalculate: bool,
    ) -> Result<Option<CalculationTicket>, PlanError> {
        if self.candidates.is_empty() {
            self.discard_route();
            self.transition(PlanState::Empty);
            return Ok(None);
        }
        if !recalculate {
            let idle = self.idle_state();
            self.transition(idle);
            return Ok(None);
        }
        self.launch(rollback).map(Some)
    }

    fn require_order(&self) -> Result<(), PlanError> {
        if self.order.is_empty() || !self.state.is_calculation_requested() {
            return Err(PlanError::InvalidState(self.state.as_str()));
        }
        Ok(())
    }

    fn edit_costs(
        &mut self,
        edit: impl FnOnce(&mut CostBreakdown) -> Result<(), ValidationError>,
    ) -> Result<(), PlanError> {
        if !self.state.has_route() {
            return Err(PlanError::InvalidState(self.state.as_str()));
        }
        let costs = self
            .costs
            .as_mut()
            .ok_or(PlanError::InvalidState(self.state.as_str()))?;
        edit(costs)?;
        self.transition(PlanState::Calculated);
        Ok(())
    }

    /// Drops everything derived from the selection and invalidates any
    /// pending ticket.
    fn discard_route(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        self.rollback = None;
        self.order.clear();
        self.stops.clear();
        self.metrics = None;
        self.tolls = TollEstimate::default();
        self.costs = None;
    }

    fn resolved_points(&self) -> Result<(Coordinates, Vec<RoutePoint>), PlanError> {
        let start = self
            .start
            .as_ref()
            .and_then(|start| start.coordinates)
            .ok_or_else(|| {
                PlanError::PreconditionFailed("starting point has no coordinates".to_string())
            })?;

        let points: Vec<RoutePoint> = self
            .candidates
            .iter()
            .filter_map(|location| {
                location.coordinates.map(|coordinates| RoutePoint {
                    id: location.id.clone(),
                    coordinates,
                })
            })
            .collect();

        if points.is_empty() {
            return Err(PlanError::PreconditionFailed(
                "no selected destination has coordinates".to_string(),
            ));
        }
        if points.len() < self.candidates.len() {
            warn!(
                excluded = self.candidates.len() - points.len(),
                "destinations without coordinates left out of the route"
            );
        }

        Ok((start, points))
    }

    /// Re-runs ordering and waypoint reconstruction and issues a ticket.
    fn launch(&mut self, rollback: Option<Snapshot>) -> Result<CalculationTicket, PlanError> {
        let (start, points) = match self.resolved_points() {
            Ok(resolved) => resolved,
            Err(err) => {
                self.abort(rollback);
                return Err(err);
            }
        };

        let anchors = self.stop_anchors();
        let result = optimize_with(start, &points, &HaversineMatrix, &self.config.optimizer);
        self.order = result.order;
        self.reanchor_stops(anchors);

        let sequence = match self.waypoints() {
            Ok(sequence) => sequence,
            Err(err) => {
                self.abort(rollback);
                return Err(err.into());
            }
        };

        let mut waypoints = Vec::with_capacity(sequence.len() + 1);
        waypoints.push(start);
        waypoints.extend(sequence.coordinates());

        self.generation += 1;
        self.in_flight = Some(self.generation);
        self.metrics = None;
        self.costs = None;
        self.tolls = TollEstimate::default();

        let state = if rollback.is_some() {
            PlanState::Recalculating
        } else {
            PlanState::Calculating
        };
        self.rollback = rollback;
        self.transition(state);

        info!(
            generation = self.generation,
            destinations = self.order.len(),
            stops = self.stops.len(),
            "requesting route"
        );

        Ok(CalculationTicket {
            generation: self.generation,
            waypoints,
            mode: self.config.travel_mode,
        })
    }

    fn apply(&mut self, response: DirectionsResponse) {
        let metrics = RouteMetrics::from_legs(&response.legs);
        self.tolls = self.toll_estimator.estimate(&response.instructions);
        let parking = parking_total(&self.stops);

        let mut costs = cost::estimate(Some(&metrics), &self.tolls, self.fuel, parking);
        if let Some(previous) = self.rollback.take().and_then(|snapshot| snapshot.costs) {
            costs.carry_edits(&previous);
        }

        info!(
            distance = metrics.total_distance_text.as_str(),
            duration = metrics.total_duration_text.as_str(),
            total_cost = ?costs.total_cost,
            "route calculated"
        );

        self.metrics = Some(metrics);
        self.costs = Some(costs);
        self.transition(PlanState::Calculated);
    }

    /// Destination id each stop currently follows.
    fn stop_anchors(&self) -> Vec<Option<String>> {
        self.stops
            .iter()
            .map(|stop| self.order.get(stop.after_stop_index()).cloned())
            .collect()
    }

    /// Moves each stop to its anchor's position in the new order. Stops
    /// whose anchor was deselected or is now the last destination are
    /// dropped.
    fn reanchor_stops(&mut self, anchors: Vec<Option<String>>) {
        let order = &self.order;
        let stops = std::mem::take(&mut self.stops);
        self.stops = stops
            .into_iter()
            .zip(anchors)
            .filter_map(|(mut stop, anchor)| {
                let position = anchor
                    .as_ref()
                    .and_then(|id| order.iter().position(|candidate| candidate == id));
                let moved = position.map(|index| stop.move_after(index, order.len()));
                match moved {
                    Some(Ok(())) => Some(stop),
                    _ => {
                        warn!(
                            stop = stop.name.as_str(),
                            anchor = anchor.as_deref().unwrap_or("none"),
                            "dropping logistics stop whose destination is gone or now last"
                        );
                        None
                    }
                }
            })
            .collect();
    }

    fn location(&self, id: &str) -> Option<&Location> {
        self.candidates.iter().find(|location| location.id == id)
    }

    fn ordered_destinations(&self) -> Vec<(String, Coordinates)> {
        self.order
            .iter()
            .filter_map(|id| {
                let coordinates = self.location(id)?.coordinates?;
                Some((id.clone(), coordinates))
            })
            .collect()
    }

    fn snapshot_route(
        &self,
        name: Option<String>,
        date: NaiveDate,
    ) -> Result<SavedRoute, PlanError> {
        let start = self
            .start
            .clone()
            .ok_or(PlanError::InvalidState(self.state.as_str()))?;

        let destinations = self
            .order
            .iter()
            .filter_map(|id| {
                let location = self.location(id)?;
                Some(SavedDestination {
                    location_id: location.id.clone(),
                    name: location.name.clone(),
                    kind: location.kind,
                    coordinates: location.coordinates?,
                })
            })
            .collect();

        Ok(SavedRoute {
            name,
            date,
            start,
            destinations,
            logistics_stops: self.stops.clone(),
            metrics: self.metrics.clone(),
            costs: self.costs.clone(),
        })
    }
}
