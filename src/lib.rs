//! field-route-planner core
//!
//! Orders field visits, interleaves logistics stops, and estimates trip
//! cost. Directions, geocoding, places and persistence are reached through
//! the traits in [`traits`].

pub mod traits;
pub mod model;
pub mod error;
pub mod config;
pub mod haversine;
pub mod region;
pub mod optimizer;
pub mod waypoints;
pub mod directions;
pub mod polyline;
pub mod osrm;
pub mod tolls;
pub mod cost;
pub mod geocode;
pub mod saved;
pub mod plan;
