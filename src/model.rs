//! Reference data consumed by the planner.
//!
//! Locations belong to the CRM; the planner only reads them.

use serde::{Deserialize, Serialize};

use crate::traits::Place;

/// A WGS84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl From<(f64, f64)> for Coordinates {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationKind {
    Client,
    Prospect,
}

/// A client or prospect that can be visited.
///
/// `coordinates` is `None` until the geocoder resolved the address; such
/// locations are never handed to the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub kind: LocationKind,
    pub coordinates: Option<Coordinates>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
}

impl Location {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: LocationKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            coordinates: None,
            address: None,
            postal_code: None,
            city: None,
        }
    }

    pub fn with_coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.coordinates = Some(Coordinates::new(lat, lng));
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Administrative region of this location, see [`crate::region::classify_region`].
    pub fn region(&self) -> String {
        crate::region::classify_region(self.postal_code.as_deref(), self.city.as_deref())
    }
}

/// Where the route begins: the user's position or a geocoded address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingPoint {
    pub label: String,
    pub coordinates: Option<Coordinates>,
}

impl StartingPoint {
    pub fn new(label: impl Into<String>, coordinates: Option<Coordinates>) -> Self {
        Self {
            label: label.into(),
            coordinates,
        }
    }

    pub fn at(label: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self::new(label, Some(Coordinates::new(lat, lng)))
    }
}

/// A location with resolved coordinates, ready for ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub id: String,
    pub coordinates: Coordinates,
}

impl Place for RoutePoint {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn coordinates(&self) -> Coordinates {
        self.coordinates
    }
}
