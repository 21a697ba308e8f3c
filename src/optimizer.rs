//! Visit ordering: nearest-neighbour construction followed by 2-opt.
//!
//! The route is an open path from a fixed start through every point; there
//! is no return leg. This is a local search, not an exact TSP solver.

use serde::Deserialize;
use tracing::debug;

use crate::haversine::HaversineMatrix;
use crate::model::Coordinates;
use crate::traits::{DistanceMatrixProvider, Place};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OptimizerOptions {
    /// Minimum gain (km) for a 2-opt move to be accepted.
    pub epsilon_km: f64,
    /// Upper bound on accepted 2-opt moves.
    pub max_improvements: usize,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            epsilon_km: 1e-9,
            max_improvements: 1000,
        }
    }
}

/// Result of [`optimize_with`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrderResult<I> {
    pub order: Vec<I>,
    /// Path length after the construction phase.
    pub nearest_neighbor_km: f64,
    /// Path length of `order`.
    pub total_km: f64,
    /// Number of accepted 2-opt moves.
    pub improvements: usize,
}

/// Orders `points` by straight-line distance from `start`.
///
/// Returns a permutation of the point ids.
pub fn optimize<P: Place>(start: Coordinates, points: &[P]) -> Vec<P::Id> {
    optimize_with(start, points, &HaversineMatrix, &OptimizerOptions::default()).order
}

pub fn optimize_with<P, M>(
    start: Coordinates,
    points: &[P],
    matrix_provider: &M,
    options: &OptimizerOptions,
) -> OrderResult<P::Id>
where
    P: Place,
    M: DistanceMatrixProvider,
{
    if points.len() <= 1 {
        let total_km = points
            .first()
            .map(|point| matrix_provider.matrix_for(&[start, point.coordinates()])[0][1])
            .unwrap_or(0.0);
        return OrderResult {
            order: points.iter().map(|point| point.id().clone()).collect(),
            nearest_neighbor_km: total_km,
            total_km,
            improvements: 0,
        };
    }

    // Index 0 is the start, point k sits at k + 1.
    let mut locations = Vec::with_capacity(points.len() + 1);
    locations.push(start);
    locations.extend(points.iter().map(|point| point.coordinates()));
    let matrix = matrix_provider.matrix_for(&locations);

    let mut order = nearest_neighbor(&matrix);
    let nearest_neighbor_km = path_length(&order, &matrix);

    let (improvements, total_km) = two_opt(&mut order, &matrix, options);

    debug!(
        points = points.len(),
        nearest_neighbor_km,
        total_km,
        improvements,
        "optimized visit order"
    );

    OrderResult {
        order: order
            .into_iter()
            .map(|node| points[node - 1].id().clone())
            .collect(),
        nearest_neighbor_km,
        total_km,
        improvements,
    }
}

/// Greedy construction from node 0. Ties go to the lowest index.
fn nearest_neighbor(matrix: &[Vec<f64>]) -> Vec<usize> {
    let n = matrix.len();
    let mut visited = vec![false; n];
    visited[0] = true;

    let mut order = Vec::with_capacity(n - 1);
    let mut current = 0;

    while order.len() < n - 1 {
        let mut best: Option<(usize, f64)> = None;
        for candidate in 1..n {
            if visited[candidate] {
                continue;
            }
            let dist = matrix[current][candidate];
            if best.is_none_or(|(_, best_dist)| dist < best_dist) {
                best = Some((candidate, dist));
            }
        }

        let Some((next, _)) = best else { break };
        visited[next] = true;
        order.push(next);
        current = next;
    }

    order
}

/// Length of the open path 0 -> order[0] -> ... -> order[last].
fn path_length(order: &[usize], matrix: &[Vec<f64>]) -> f64 {
    let mut total = 0.0;
    let mut prev = 0;
    for &node in order {
        total += matrix[prev][node];
        prev = node;
    }
    total
}

/// 2-opt: reverse `order[i..=j]` whenever that shortens the path by more
/// than `epsilon_km`, restarting the scan after each accepted move.
///
/// Returns the number of accepted moves and the final length.
fn two_opt(order: &mut [usize], matrix: &[Vec<f64>], options: &OptimizerOptions) -> (usize, f64) {
    let n = order.len();
    let mut current = path_length(order, matrix);
    let mut improvements = 0;

    'scan: while improvements < options.max_improvements {
        for i in 0..n - 1 {
            for j in i + 1..n {
                order[i..=j].reverse();
                let candidate = path_length(order, matrix);
                if candidate < current - options.epsilon_km {
                    current = candidate;
                    improvements += 1;
                    continue 'scan;
                }
                order[i..=j].reverse();
            }
        }
        break;
    }

    (improvements, current)
}
