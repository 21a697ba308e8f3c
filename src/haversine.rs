//! Great-circle distances.
//!
//! Straight-line distance is what the optimizer orders by. The directions
//! provider supplies the authoritative road distance afterwards.

use rayon::prelude::*;

use crate::model::Coordinates;
use crate::traits::DistanceMatrixProvider;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points in kilometers.
///
/// Symmetric, and exactly zero when `a == b`.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    if a == b {
        return 0.0;
    }

    // Order the operands so that d(a, b) and d(b, a) run the same arithmetic.
    let (from, to) = if (a.lat, a.lng) <= (b.lat, b.lng) {
        (a, b)
    } else {
        (b, a)
    };

    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Haversine-based distance matrix provider.
///
/// Rows are computed in parallel; the result does not depend on scheduling.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineMatrix;

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[Coordinates]) -> Vec<Vec<f64>> {
        locations
            .par_iter()
            .map(|from| {
                locations
                    .iter()
                    .map(|to| haversine_km(*from, *to))
                    .collect()
            })
            .collect()
    }
}
