//! Postal code to administrative region lookup.
//!
//! Portuguese postal codes have the form `NNNN-NNN`; the four-digit prefix
//! identifies the delivery area. The table maps prefix ranges to mainland
//! districts. Island codes are not listed and fall back to the city.

use std::collections::BTreeMap;

use crate::model::Location;

/// Returned when neither the postal code nor the city identifies a region.
pub const UNKNOWN_REGION: &str = "Unknown";

/// Inclusive prefix ranges, sorted and non-overlapping.
const REGION_RANGES: &[(u16, u16, &str)] = &[
    (1000, 1999, "Lisboa"),
    (2000, 2399, "Santarém"),
    (2400, 2549, "Leiria"),
    (2550, 2799, "Lisboa"),
    (2800, 2999, "Setúbal"),
    (3000, 3449, "Coimbra"),
    (3450, 3699, "Viseu"),
    (3700, 3899, "Aveiro"),
    (4000, 4499, "Porto"),
    (4500, 4549, "Aveiro"),
    (4550, 4699, "Porto"),
    (4700, 4899, "Braga"),
    (4900, 4999, "Viana do Castelo"),
    (5000, 5099, "Vila Real"),
    (5100, 5199, "Viseu"),
    (5200, 5399, "Bragança"),
    (5400, 5499, "Vila Real"),
    (6000, 6299, "Castelo Branco"),
    (6300, 6399, "Guarda"),
    (7000, 7299, "Évora"),
    (7300, 7499, "Portalegre"),
    (7500, 7599, "Setúbal"),
    (7600, 7999, "Beja"),
    (8000, 8999, "Faro"),
];

/// Maps a postal code (or, failing that, a city) to a region name.
///
/// Pure table lookup; the same input always yields the same region.
pub fn classify_region(postal_code: Option<&str>, city_fallback: Option<&str>) -> String {
    if let Some(region) = postal_code.and_then(postal_prefix).and_then(region_for_prefix) {
        return region.to_string();
    }

    match city_fallback.map(str::trim) {
        Some(city) if !city.is_empty() => city.to_string(),
        _ => UNKNOWN_REGION.to_string(),
    }
}

fn postal_prefix(postal_code: &str) -> Option<u16> {
    let prefix = postal_code.trim().get(..4)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

fn region_for_prefix(prefix: u16) -> Option<&'static str> {
    let idx = REGION_RANGES.partition_point(|&(_, end, _)| end < prefix);
    REGION_RANGES
        .get(idx)
        .filter(|&&(start, _, _)| start <= prefix)
        .map(|&(_, _, region)| region)
}

/// Buckets locations by region, keeping input order inside each bucket.
pub fn group_by_region(locations: &[Location]) -> BTreeMap<String, Vec<&Location>> {
    let mut groups: BTreeMap<String, Vec<&Location>> = BTreeMap::new();
    for location in locations {
        groups.entry(location.region()).or_default().push(location);
    }
    groups
}
