//! Route geometry returned by the directions provider.
//!
//! Geometry arrives as an encoded polyline string and is decoded once at
//! the boundary. Internally it is a plain coordinate sequence.

use serde::{Deserialize, Serialize};

use crate::error::DirectionsError;
use crate::haversine::haversine_km;
use crate::model::Coordinates;

/// Coordinate precision of the OSRM `polyline` geometry format.
pub const PRECISION_5: u32 = 5;

/// A polyline representing a route geometry as decoded coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinates>,
}

impl Polyline {
    pub fn new(points: Vec<Coordinates>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Coordinates] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Coordinates> {
        self.points
    }

    /// Sum of the great-circle lengths of the segments.
    pub fn length_km(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| haversine_km(pair[0], pair[1]))
            .sum()
    }

    /// Decodes the Google encoded polyline format.
    pub fn decode(encoded: &str, precision: u32) -> Result<Self, DirectionsError> {
        let factor = 10f64.powi(precision as i32);
        let mut bytes = encoded.bytes();
        let mut points = Vec::new();
        let (mut lat, mut lng) = (0i64, 0i64);

        loop {
            let Some(delta_lat) = next_value(&mut bytes)? else {
                break;
            };
            let delta_lng = next_value(&mut bytes)?.ok_or_else(|| {
                DirectionsError::Malformed(
                    "polyline ends between latitude and longitude".to_string(),
                )
            })?;

            lat += delta_lat;
            lng += delta_lng;
            points.push(Coordinates::new(lat as f64 / factor, lng as f64 / factor));
        }

        Ok(Self { points })
    }

    pub fn encode(&self, precision: u32) -> String {
        let factor = 10f64.powi(precision as i32);
        let mut out = String::new();
        let (mut prev_lat, mut prev_lng) = (0i64, 0i64);

        for point in &self.points {
            let lat = (point.lat * factor).round() as i64;
            let lng = (point.lng * factor).round() as i64;
            push_value(&mut out, lat - prev_lat);
            push_value(&mut out, lng - prev_lng);
            prev_lat = lat;
            prev_lng = lng;
        }

        out
    }
}

fn next_value(bytes: &mut impl Iterator<Item = u8>) -> Result<Option<i64>, DirectionsError> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let Some(byte) = bytes.next() else {
            if shift == 0 {
                return Ok(None);
            }
            return Err(DirectionsError::Malformed("truncated polyline".to_string()));
        };
        if !(63..127).contains(&byte) || shift > 60 {
            return Err(DirectionsError::Malformed(format!("invalid polyline byte {}", byte)));
        }

        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    let value = if result & 1 == 1 { !(result >> 1) } else { result >> 1 };
    Ok(Some(value))
}

fn push_value(out: &mut String, value: i64) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };
    while v >= 0x20 {
        out.push((((v & 0x1f) | 0x20) as u8 + 63) as char);
        v >>= 5;
    }
    out.push((v as u8 + 63) as char);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference example from the encoded polyline format documentation.
    const ENCODED: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn reference_points() -> Vec<Coordinates> {
        vec![
            Coordinates::new(38.5, -120.2),
            Coordinates::new(40.7, -120.95),
            Coordinates::new(43.252, -126.453),
        ]
    }

    #[test]
    fn test_decode_reference() {
        let polyline = Polyline::decode(ENCODED, PRECISION_5).unwrap();
        let points = polyline.points();
        assert_eq!(points.len(), 3);
        for (got, want) in points.iter().zip(reference_points()) {
            assert!((got.lat - want.lat).abs() < 1e-9);
            assert!((got.lng - want.lng).abs() < 1e-9);
        }
    }

    #[test]
    fn test_encode_reference() {
        let polyline = Polyline::new(reference_points());
        assert_eq!(polyline.encode(PRECISION_5), ENCODED);
    }

    #[test]
    fn test_empty_polyline() {
        let polyline = Polyline::decode("", PRECISION_5).unwrap();
        assert!(polyline.points().is_empty());
        assert_eq!(polyline.length_km(), 0.0);
    }

    #[test]
    fn test_truncated_input() {
        assert!(Polyline::decode("_p~iF", PRECISION_5).is_err());
        assert!(Polyline::decode("_p~i", PRECISION_5).is_err());
        assert!(Polyline::decode("_p~iF ", PRECISION_5).is_err());
    }

    #[test]
    fn test_length_km() {
        let polyline = Polyline::new(vec![
            Coordinates::new(38.7223, -9.1393),
            Coordinates::new(41.1579, -8.6291),
        ]);
        let length = polyline.length_km();
        assert!(length > 265.0 && length < 285.0);
    }
}
