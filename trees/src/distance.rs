//! Distance metrics for the KD-tree.
//!
//! A metric provides both the point-to-point distance and a lower bound on the
//! distance from a point to any point inside an axis-aligned rectangle. The tree
//! prunes a subtree when that bound exceeds the current search radius, so the
//! bound must never overestimate.
//!
//! Distances are reported in the metric's own units: [`SquaredEuclidean`] returns
//! squared distances and search ranges given to the tree use the same units.

use crate::error::{Result, TreeError};
use serde::{Deserialize, Serialize};

pub trait DistanceMetric<const N: usize>: Send + Sync {
    fn distance(&self, a: &[f64; N], b: &[f64; N]) -> f64;

    /// Smallest possible distance from `point` to the box `[min, max]`; zero inside.
    fn distance_to_rect(&self, point: &[f64; N], min: &[f64; N], max: &[f64; N]) -> f64;
}

/// Per-dimension distance from `p` to the interval `[min, max]`.
#[inline]
fn gap(p: f64, min: f64, max: f64) -> f64 {
    if p < min {
        min - p
    } else if p > max {
        p - max
    } else {
        0.0
    }
}

fn validate_weights<const N: usize>(weights: &[f64]) -> Result<[f64; N]> {
    let weights: [f64; N] = weights
        .try_into()
        .map_err(|_| TreeError::dimension_mismatch(N, weights.len()))?;
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(TreeError::invalid_argument(format!(
            "weights must be finite and non-negative: {:?}",
            weights
        )));
    }
    Ok(weights)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SquaredEuclidean;

impl<const N: usize> DistanceMetric<N> for SquaredEuclidean {
    #[inline]
    fn distance(&self, a: &[f64; N], b: &[f64; N]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    }

    fn distance_to_rect(&self, point: &[f64; N], min: &[f64; N], max: &[f64; N]) -> f64 {
        (0..N)
            .map(|i| {
                let d = gap(point[i], min[i], max[i]);
                d * d
            })
            .sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Manhattan;

impl<const N: usize> DistanceMetric<N> for Manhattan {
    #[inline]
    fn distance(&self, a: &[f64; N], b: &[f64; N]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
    }

    fn distance_to_rect(&self, point: &[f64; N], min: &[f64; N], max: &[f64; N]) -> f64 {
        (0..N).map(|i| gap(point[i], min[i], max[i])).sum()
    }
}

/// Largest per-dimension difference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Chebyshev;

impl<const N: usize> DistanceMetric<N> for Chebyshev {
    #[inline]
    fn distance(&self, a: &[f64; N], b: &[f64; N]) -> f64 {
        a.iter()
            .zip(b)
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max)
    }

    fn distance_to_rect(&self, point: &[f64; N], min: &[f64; N], max: &[f64; N]) -> f64 {
        (0..N)
            .map(|i| gap(point[i], min[i], max[i]))
            .fold(0.0, f64::max)
    }
}

/// Squared Euclidean distance with a weight per dimension: `Σ wᵢ (aᵢ - bᵢ)²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedSquaredEuclidean<const N: usize> {
    weights: [f64; N],
}

impl<const N: usize> WeightedSquaredEuclidean<N> {
    pub fn new(weights: &[f64]) -> Result<Self> {
        Ok(Self {
            weights: validate_weights(weights)?,
        })
    }

    pub fn weights(&self) -> &[f64; N] {
        &self.weights
    }
}

impl<const N: usize> DistanceMetric<N> for WeightedSquaredEuclidean<N> {
    #[inline]
    fn distance(&self, a: &[f64; N], b: &[f64; N]) -> f64 {
        (0..N)
            .map(|i| {
                let d = a[i] - b[i];
                self.weights[i] * d * d
            })
            .sum()
    }

    fn distance_to_rect(&self, point: &[f64; N], min: &[f64; N], max: &[f64; N]) -> f64 {
        (0..N)
            .map(|i| {
                let d = gap(point[i], min[i], max[i]);
                self.weights[i] * d * d
            })
            .sum()
    }
}

/// Manhattan distance with a weight per dimension: `Σ wᵢ |aᵢ - bᵢ|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedManhattan<const N: usize> {
    weights: [f64; N],
}

impl<const N: usize> WeightedManhattan<N> {
    pub fn new(weights: &[f64]) -> Result<Self> {
        Ok(Self {
            weights: validate_weights(weights)?,
        })
    }

    pub fn weights(&self) -> &[f64; N] {
        &self.weights
    }
}

impl<const N: usize> DistanceMetric<N> for WeightedManhattan<N> {
    #[inline]
    fn distance(&self, a: &[f64; N], b: &[f64; N]) -> f64 {
        (0..N).map(|i| self.weights[i] * (a[i] - b[i]).abs()).sum()
    }

    fn distance_to_rect(&self, point: &[f64; N], min: &[f64; N], max: &[f64; N]) -> f64 {
        (0..N)
            .map(|i| self.weights[i] * gap(point[i], min[i], max[i]))
            .sum()
    }
}
