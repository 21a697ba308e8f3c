//! Saved route snapshots and an in-memory repository.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cost::CostBreakdown;
use crate::directions::RouteMetrics;
use crate::error::RepositoryError;
use crate::model::{Coordinates, LocationKind, StartingPoint};
use crate::traits::RouteRepository;
use crate::waypoints::LogisticsStop;

/// A destination as it was when the route was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedDestination {
    pub location_id: String,
    pub name: String,
    pub kind: LocationKind,
    pub coordinates: Coordinates,
}

/// Immutable snapshot of a calculated plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRoute {
    pub name: Option<String>,
    pub date: NaiveDate,
    pub start: StartingPoint,
    pub destinations: Vec<SavedDestination>,
    pub logistics_stops: Vec<LogisticsStop>,
    pub metrics: Option<RouteMetrics>,
    pub costs: Option<CostBreakdown>,
}

/// Process-local repository, mostly for tests and demos.
#[derive(Debug, Default)]
pub struct InMemoryRouteStore {
    next_id: u64,
    routes: BTreeMap<u64, SavedRoute>,
}

impl InMemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteRepository for InMemoryRouteStore {
    fn create(&mut self, route: SavedRoute) -> Result<u64, RepositoryError> {
        self.next_id += 1;
        self.routes.insert(self.next_id, route);
        Ok(self.next_id)
    }

    fn update(&mut self, id: u64, route: SavedRoute) -> Result<(), RepositoryError> {
        let slot = self.routes.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;
        *slot = route;
        Ok(())
    }

    fn delete(&mut self, id: u64) -> Result<SavedRoute, RepositoryError> {
        self.routes.remove(&id).ok_or(RepositoryError::NotFound(id))
    }

    fn get(&self, id: u64) -> Result<SavedRoute, RepositoryError> {
        self.routes.get(&id).cloned().ok_or(RepositoryError::NotFound(id))
    }

    fn list_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<(u64, SavedRoute)> {
        let mut found: Vec<(u64, SavedRoute)> = self
            .routes
            .iter()
            .filter(|(_, route)| route.date >= from && route.date <= to)
            .map(|(id, route)| (*id, route.clone()))
            .collect();
        found.sort_by_key(|(id, route)| (route.date, *id));
        found
    }
}
