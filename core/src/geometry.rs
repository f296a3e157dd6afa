//! Convex hull of 2D point sets.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Convex polygon with vertices in counter-clockwise order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvexHull {
    vertices: Vec<(f64, f64)>,
}

/// Twice the signed area of the triangle `o, a, b`; positive for a left turn.
fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

impl ConvexHull {
    /// Build the hull with Andrew's monotone chain.
    ///
    /// Collinear points on the boundary are dropped. Returns `None` when the input
    /// has different lengths, contains non-finite values, or has fewer than three
    /// non-collinear points.
    pub fn create(xs: &[f64], ys: &[f64]) -> Option<Self> {
        if xs.len() != ys.len() {
            return None;
        }
        let mut points: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
        if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return None;
        }
        points.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        });
        points.dedup();
        if points.len() < 3 {
            return None;
        }

        let mut hull: Vec<(f64, f64)> = Vec::with_capacity(2 * points.len());
        // Lower chain
        for &p in &points {
            while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
                hull.pop();
            }
            hull.push(p);
        }
        // Upper chain
        let lower_len = hull.len() + 1;
        for &p in points.iter().rev().skip(1) {
            while hull.len() >= lower_len
                && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
            {
                hull.pop();
            }
            hull.push(p);
        }
        // The last point repeats the first
        hull.pop();

        if hull.len() < 3 {
            return None;
        }
        Some(Self { vertices: hull })
    }

    pub fn vertices(&self) -> &[(f64, f64)] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn edges(&self) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
        self.vertices.iter().copied().circular_tuple_windows()
    }

    /// Enclosed area (shoelace formula).
    pub fn area(&self) -> f64 {
        0.5 * self
            .edges()
            .map(|(a, b)| a.0 * b.1 - b.0 * a.1)
            .sum::<f64>()
            .abs()
    }

    pub fn perimeter(&self) -> f64 {
        self.edges()
            .map(|(a, b)| crate::maths::distance(a.0, a.1, b.0, b.1))
            .sum()
    }

    /// Area-weighted centroid of the polygon.
    pub fn centroid(&self) -> (f64, f64) {
        let (mut cx, mut cy, mut a2) = (0.0, 0.0, 0.0);
        for (p, q) in self.edges() {
            let c = p.0 * q.1 - q.0 * p.1;
            a2 += c;
            cx += (p.0 + q.0) * c;
            cy += (p.1 + q.1) * c;
        }
        (cx / (3.0 * a2), cy / (3.0 * a2))
    }

    /// Whether the point is inside or on the boundary.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let scale = self
            .vertices
            .iter()
            .fold(1.0f64, |m, (vx, vy)| m.max(vx.abs()).max(vy.abs()));
        let tolerance = 1e-12 * scale * scale;
        self.edges().all(|(a, b)| cross(a, b, (x, y)) >= -tolerance)
    }

    /// Bounding box `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.vertices.iter().fold(
            (
                f64::INFINITY,
                f64::INFINITY,
                f64::NEG_INFINITY,
                f64::NEG_INFINITY,
            ),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }
}
