//! Real Lisbon-area locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap. They are routable with the OSRM
//! Portugal extract.

use field_route_planner::model::{Location, LocationKind, StartingPoint};

/// A named site with coordinates and postal code.
#[derive(Debug, Clone)]
pub struct Site {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub postal_code: &'static str,
}

impl Site {
    pub const fn new(name: &'static str, lat: f64, lng: f64, postal_code: &'static str) -> Self {
        Self {
            name,
            lat,
            lng,
            postal_code,
        }
    }

    pub fn client(&self, id: &str) -> Location {
        Location::new(id, self.name, LocationKind::Client)
            .with_coordinates(self.lat, self.lng)
            .with_postal_code(self.postal_code)
    }

    pub fn prospect(&self, id: &str) -> Location {
        Location::new(id, self.name, LocationKind::Prospect)
            .with_coordinates(self.lat, self.lng)
            .with_postal_code(self.postal_code)
    }
}

pub fn office() -> StartingPoint {
    StartingPoint::at("Escritório Marquês de Pombal", 38.7253, -9.1500)
}

// ============================================================================
// Lisbon city
// ============================================================================

pub const LISBON_SITES: &[Site] = &[
    Site::new("Mercado da Ribeira", 38.7069, -9.1459, "1200-184"),
    Site::new("Centro Comercial Colombo", 38.7549, -9.1886, "1500-392"),
    Site::new("Amoreiras Shopping", 38.7236, -9.1623, "1070-103"),
    Site::new("Parque das Nações", 38.7681, -9.0946, "1990-094"),
    Site::new("Belém", 38.6979, -9.2063, "1400-206"),
    Site::new("Alvalade", 38.7533, -9.1430, "1700-097"),
    Site::new("Campo de Ourique", 38.7167, -9.1667, "1350-211"),
    Site::new("Graça", 38.7167, -9.1303, "1170-165"),
];

// ============================================================================
// Greater Lisbon and further out
// ============================================================================

pub const OUTER_SITES: &[Site] = &[
    Site::new("Cascais Marina", 38.6920, -9.4180, "2750-800"),
    Site::new("Sintra Centro", 38.7980, -9.3880, "2710-616"),
    Site::new("Almada Fórum", 38.6516, -9.1770, "2810-354"),
    Site::new("Setúbal Centro", 38.5244, -8.8882, "2900-459"),
    Site::new("Santarém Centro", 39.2362, -8.6859, "2000-124"),
    Site::new("Braga Centro", 41.5503, -8.4200, "4700-000"),
];

pub fn lisbon_clients(count: usize) -> Vec<Location> {
    LISBON_SITES
        .iter()
        .take(count)
        .enumerate()
        .map(|(i, site)| site.client(&format!("lx-{}", i)))
        .collect()
}
