//! Test fixtures for field-route-planner.
//!
//! Provides real Lisbon-area client sites and a scripted directions
//! provider for driving the plan without a network.

#![allow(dead_code)]

pub mod lisbon_locations;
pub mod scripted_directions;

pub use lisbon_locations::*;
pub use scripted_directions::*;

/// Routes planner logs to the test output; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
