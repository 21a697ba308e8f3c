//! Core traits for the route planner.
//!
//! The planner talks to its collaborators (directions, geocoding, places,
//! persistence) only through these seams. Concrete apps implement them for
//! their own providers and stores.

use std::hash::Hash;

use chrono::NaiveDate;

use crate::directions::DirectionsResponse;
use crate::error::{DirectionsError, GeocodeError, RepositoryError};
use crate::model::Coordinates;
use crate::saved::SavedRoute;
use crate::waypoints::StopCategory;

/// Unique identifier for planner entities.
pub trait Id: Clone + Eq + Hash {}

impl<T> Id for T where T: Clone + Eq + Hash {}

/// Anything the optimizer can put in order.
pub trait Place {
    type Id: Id;

    fn id(&self) -> &Self::Id;

    /// Location coordinates.
    fn coordinates(&self) -> Coordinates;
}

/// Provides a pairwise distance matrix (kilometres) for a set of locations.
///
/// The matrix is indexed by the provided location order.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[Coordinates]) -> Vec<Vec<f64>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Cycling,
}

/// Authoritative path between ordered waypoints.
pub trait DirectionsProvider {
    fn route(
        &self,
        waypoints: &[Coordinates],
        mode: TravelMode,
    ) -> Result<DirectionsResponse, DirectionsError>;
}

/// Free-text address to coordinates. `Ok(None)` means "not found".
pub trait Geocoder {
    fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError>;
}

/// Memoized geocoding results, shared for the lifetime of the process.
pub trait GeocodeCache {
    fn get(&self, address: &str) -> Option<Coordinates>;
    fn put(&self, address: &str, coordinates: Coordinates);
}

/// A candidate logistics stop returned by a places search.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyPlace {
    pub name: String,
    pub coordinates: Coordinates,
    pub address: Option<String>,
}

pub trait PlacesProvider {
    fn nearby(
        &self,
        center: Coordinates,
        radius_m: u32,
        category: StopCategory,
    ) -> Result<Vec<NearbyPlace>, GeocodeError>;
}

/// Persistence for saved routes. Each call is atomic for its single record.
pub trait RouteRepository {
    fn create(&mut self, route: SavedRoute) -> Result<u64, RepositoryError>;

    /// Replace the stored snapshot under `id` with `route`.
    fn update(&mut self, id: u64, route: SavedRoute) -> Result<(), RepositoryError>;

    fn delete(&mut self, id: u64) -> Result<SavedRoute, RepositoryError>;

    fn get(&self, id: u64) -> Result<SavedRoute, RepositoryError>;

    /// Routes dated within `[from, to]`, ordered by date then id.
    fn list_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<(u64, SavedRoute)>;
}
