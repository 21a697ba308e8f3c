//! Logistics stops and waypoint reconstruction.
//!
//! A logistics stop (parking, fuel) is anchored after a destination index.
//! The waypoint sequence handed to the directions provider interleaves the
//! ordered destinations with those stops.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::Coordinates;
use crate::traits::{Id, NearbyPlace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StopCategory {
    Parking,
    Fuel,
    #[default]
    Other,
}

/// A non-destination waypoint visited right after destination
/// `after_stop_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticsStop {
    pub name: String,
    pub coordinates: Coordinates,
    pub category: StopCategory,
    pub address: Option<String>,
    pub estimated_cost: Option<f64>,
    after_stop_index: usize,
}

impl LogisticsStop {
    /// Builds a stop for a route of `destinations` destinations.
    ///
    /// `after_stop_index` must lie in `[0, destinations - 2]`: nothing is
    /// inserted after the terminal destination.
    pub fn new(
        name: impl Into<String>,
        coordinates: Coordinates,
        after_stop_index: usize,
        destinations: usize,
    ) -> Result<Self, ValidationError> {
        validate_stop_index(after_stop_index, destinations)?;
        if !coordinates.is_finite() {
            return Err(ValidationError::InvalidCoordinates {
                lat: coordinates.lat,
                lng: coordinates.lng,
            });
        }

        Ok(Self {
            name: name.into(),
            coordinates,
            category: StopCategory::default(),
            address: None,
            estimated_cost: None,
            after_stop_index,
        })
    }

    /// Builds a stop from a places search result.
    pub fn from_place(
        place: NearbyPlace,
        category: StopCategory,
        after_stop_index: usize,
        destinations: usize,
    ) -> Result<Self, ValidationError> {
        let mut stop = Self::new(place.name, place.coordinates, after_stop_index, destinations)?;
        stop.category = category;
        stop.address = place.address;
        Ok(stop)
    }

    pub fn with_category(mut self, category: StopCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_estimated_cost(mut self, cost: f64) -> Result<Self, ValidationError> {
        if !cost.is_finite() || cost < 0.0 {
            return Err(ValidationError::InvalidAmount {
                field: "estimated_cost",
                value: cost,
            });
        }
        self.estimated_cost = Some(cost);
        Ok(self)
    }

    pub fn after_stop_index(&self) -> usize {
        self.after_stop_index
    }

    /// Re-anchors the stop after its destination moved to `after_stop_index`.
    pub fn move_after(
        &mut self,
        after_stop_index: usize,
        destinations: usize,
    ) -> Result<(), ValidationError> {
        validate_stop_index(after_stop_index, destinations)?;
        self.after_stop_index = after_stop_index;
        Ok(())
    }
}

pub(crate) fn validate_stop_index(
    index: usize,
    destinations: usize,
) -> Result<(), ValidationError> {
    if destinations < 2 {
        return Err(ValidationError::NoStopPositions { destinations });
    }
    let max = destinations - 2;
    if index > max {
        return Err(ValidationError::StopIndexOutOfRange {
            index,
            max,
            destinations,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub enum WaypointKind<I> {
    Destination(I),
    /// Index into the stop list passed to [`build_waypoints`].
    Logistics(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint<I> {
    pub kind: WaypointKind<I>,
    pub coordinates: Coordinates,
    /// `false` only for the terminal destination.
    pub stopover: bool,
}

/// Destinations and stops in travel order.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointSequence<I> {
    pub waypoints: Vec<Waypoint<I>>,
}

impl<I> WaypointSequence<I> {
    pub fn coordinates(&self) -> Vec<Coordinates> {
        self.waypoints.iter().map(|waypoint| waypoint.coordinates).collect()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Flattens the ordered destinations and their stops.
///
/// Stops attached after destination `i` follow it in insertion order. The
/// last destination is always the final waypoint; a stop whose index is
/// not a valid position is rejected.
pub fn build_waypoints<I: Id>(
    order: &[(I, Coordinates)],
    stops: &[LogisticsStop],
) -> Result<WaypointSequence<I>, ValidationError> {
    for stop in stops {
        validate_stop_index(stop.after_stop_index, order.len())?;
    }

    let mut waypoints = Vec::with_capacity(order.len() + stops.len());
    let last = order.len().saturating_sub(1);

    for (index, (id, coordinates)) in order.iter().enumerate() {
        waypoints.push(Waypoint {
            kind: WaypointKind::Destination(id.clone()),
            coordinates: *coordinates,
            stopover: index != last,
        });

        if index == last {
            break;
        }

        waypoints.extend(
            stops
                .iter()
                .enumerate()
                .filter(|(_, stop)| stop.after_stop_index == index)
                .map(|(stop_index, stop)| Waypoint {
                    kind: WaypointKind::Logistics(stop_index),
                    coordinates: stop.coordinates,
                    stopover: true,
                }),
        );
    }

    Ok(WaypointSequence { waypoints })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Vec<(&'static str, Coordinates)> {
        vec![
            ("A", Coordinates::new(38.70, -9.10)),
            ("B", Coordinates::new(38.72, -9.14)),
            ("C", Coordinates::new(38.75, -9.20)),
        ]
    }

    fn stop(name: &str, after: usize) -> LogisticsStop {
        LogisticsStop::new(name, Coordinates::new(38.71, -9.12), after, 3).unwrap()
    }

    fn labels(sequence: &WaypointSequence<&'static str>, stops: &[LogisticsStop]) -> Vec<String> {
        sequence
            .waypoints
            .iter()
            .map(|waypoint| match &waypoint.kind {
                WaypointKind::Destination(id) => id.to_string(),
                WaypointKind::Logistics(index) => stops[*index].name.clone(),
            })
            .collect()
    }

    #[test]
    fn test_no_stops() {
        let sequence = build_waypoints(&order(), &[]).unwrap();
        assert_eq!(labels(&sequence, &[]), vec!["A", "B", "C"]);
        let stopovers: Vec<bool> = sequence.waypoints.iter().map(|w| w.stopover).collect();
        assert_eq!(stopovers, vec![true, true, false]);
    }

    #[test]
    fn test_stop_after_first() {
        let stops = vec![stop("park", 0)];
        let sequence = build_waypoints(&order(), &stops).unwrap();
        assert_eq!(labels(&sequence, &stops), vec!["A", "park", "B", "C"]);
    }

    #[test]
    fn test_stop_after_last_valid_index() {
        let stops = vec![stop("fuel", 1)];
        let sequence = build_waypoints(&order(), &stops).unwrap();
        assert_eq!(labels(&sequence, &stops), vec!["A", "B", "fuel", "C"]);
        let last = sequence.waypoints.last().unwrap();
        assert_eq!(last.kind, WaypointKind::Destination("C"));
        assert!(!last.stopover);
    }

    #[test]
    fn test_shared_index_keeps_insertion_order() {
        let stops = vec![stop("fuel", 1), stop("park", 0), stop("coffee", 1)];
        let sequence = build_waypoints(&order(), &stops).unwrap();
        assert_eq!(
            labels(&sequence, &stops),
            vec!["A", "park", "B", "fuel", "coffee", "C"]
        );
    }

    #[test]
    fn test_rejects_index_after_terminus() {
        let err = LogisticsStop::new("late", Coordinates::new(0.0, 0.0), 2, 3).unwrap_err();
        assert_eq!(
            err,
            ValidationError::StopIndexOutOfRange {
                index: 2,
                max: 1,
                destinations: 3
            }
        );
    }

    #[test]
    fn test_single_destination_has_no_stop_positions() {
        let err = LogisticsStop::new("p", Coordinates::new(0.0, 0.0), 0, 1).unwrap_err();
        assert_eq!(err, ValidationError::NoStopPositions { destinations: 1 });
    }

    #[test]
    fn test_stale_stop_rejected_when_route_shrinks() {
        let stops = vec![stop("fuel", 1)];
        let short = &order()[..2];
        assert!(build_waypoints(short, &stops).is_err());
    }

    #[test]
    fn test_from_place() {
        let place = NearbyPlace {
            name: "Parque Marquês".to_string(),
            coordinates: Coordinates::new(38.7253, -9.1500),
            address: Some("Av. Fontes Pereira de Melo".to_string()),
        };

        let stop = LogisticsStop::from_place(place, StopCategory::Parking, 0, 2).unwrap();
        assert_eq!(stop.category, StopCategory::Parking);
        assert_eq!(stop.address.as_deref(), Some("Av. Fontes Pereira de Melo"));
        assert_eq!(stop.after_stop_index(), 0);
    }

    #[test]
    fn test_negative_cost_rejected() {
        assert!(stop("park", 0).with_estimated_cost(-1.0).is_err());
        assert_eq!(stop("park", 0).with_estimated_cost(2.5).unwrap().estimated_cost, Some(2.5));
    }

    #[test]
    fn test_move_after() {
        let mut park = stop("park", 0);
        park.move_after(1, 3).unwrap();
        assert_eq!(park.after_stop_index(), 1);

        assert!(park.move_after(2, 3).is_err());
        assert_eq!(park.after_stop_index(), 1);
    }
}
