//! Error types for the planner.

use thiserror::Error;

/// Input rejected at construction time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("stop index {index} is outside [0, {max}] for a route of {destinations} destinations")]
    StopIndexOutOfRange {
        index: usize,
        max: usize,
        destinations: usize,
    },

    #[error("a route of {destinations} destinations cannot take logistics stops")]
    NoStopPositions { destinations: usize },

    #[error("no logistics stop at position {0}")]
    UnknownStop(usize),

    #[error("{field} must be a finite, non-negative number, got {value}")]
    InvalidAmount { field: &'static str, value: f64 },

    #[error("invalid coordinates ({lat}, {lng})")]
    InvalidCoordinates { lat: f64, lng: f64 },
}

/// Failure of the external directions call.
#[derive(Error, Debug)]
pub enum DirectionsError {
    #[error("directions request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("directions provider answered {code}: {message}")]
    Provider { code: String, message: String },

    #[error("malformed directions response: {0}")]
    Malformed(String),

    #[error("at least two waypoints are required, got {0}")]
    TooFewWaypoints(usize),
}

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoding provider error: {0}")]
    Provider(String),

    #[error("could not build geocoding worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid toll road pattern: {0}")]
    RoadPattern(#[from] regex::Error),

    #[error("{field} must be a finite, non-negative number, got {value}")]
    InvalidAmount { field: &'static str, value: f64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("saved route {0} not found")]
    NotFound(u64),

    #[error("storage failure: {0}")]
    Storage(String),
}

/// Errors reported by [`crate::plan::RoutePlan`].
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("cannot calculate route: {0}")]
    PreconditionFailed(String),

    #[error("route calculation failed: {0}")]
    RouteCalculationFailed(#[from] DirectionsError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("operation not allowed while the plan is {0}")]
    InvalidState(&'static str),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
