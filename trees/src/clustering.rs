//! Cluster and OPTICS result types.

use crate::error::{Result, TreeError};
use serde::{Deserialize, Serialize};

/// A weighted 2D point with an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterPoint {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub weight: f64,
}

impl ClusterPoint {
    /// Point with unit weight.
    pub fn new(id: usize, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn distance2(&self, other: &ClusterPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// A group of points with a weighted centroid maintained incrementally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    points: Vec<ClusterPoint>,
    sum_x: f64,
    sum_y: f64,
    sum_weight: f64,
}

impl Cluster {
    pub fn new(point: ClusterPoint) -> Self {
        let mut cluster = Self::default();
        cluster.add(point);
        cluster
    }

    pub fn add(&mut self, point: ClusterPoint) {
        self.sum_x += point.x * point.weight;
        self.sum_y += point.y * point.weight;
        self.sum_weight += point.weight;
        self.points.push(point);
    }

    /// Absorb all points of `other`.
    pub fn merge(&mut self, other: Cluster) {
        self.sum_x += other.sum_x;
        self.sum_y += other.sum_y;
        self.sum_weight += other.sum_weight;
        self.points.extend(other.points);
    }

    pub fn size(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[ClusterPoint] {
        &self.points
    }

    pub fn total_weight(&self) -> f64 {
        self.sum_weight
    }

    /// Weighted centroid; `None` for an empty or zero-weight cluster.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        (self.sum_weight > 0.0).then(|| (self.sum_x / self.sum_weight, self.sum_y / self.sum_weight))
    }

    /// Squared distance between centroids.
    pub fn distance2_to(&self, other: &Cluster) -> Option<f64> {
        let (x1, y1) = self.centroid()?;
        let (x2, y2) = other.centroid()?;
        Some((x1 - x2).powi(2) + (y1 - y2).powi(2))
    }
}

/// A cluster extracted from an OPTICS ordering: the inclusive range
/// `start..=end` of the ordering plus any nested child clusters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpticsCluster {
    pub start: usize,
    pub end: usize,
    pub level: usize,
    pub cluster_id: usize,
    pub children: Vec<OpticsCluster>,
}

impl OpticsCluster {
    pub fn new(start: usize, end: usize, cluster_id: usize) -> Result<Self> {
        if start > end {
            return Err(TreeError::invalid_argument(format!(
                "cluster start {} is after end {}",
                start, end
            )));
        }
        Ok(Self {
            start,
            end,
            level: 0,
            cluster_id,
            children: Vec::new(),
        })
    }

    pub fn size(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }

    /// Attach a child one level below this cluster. The child range must lie
    /// inside this one.
    pub fn add_child(&mut self, mut child: OpticsCluster) -> Result<()> {
        if child.start < self.start || child.end > self.end {
            return Err(TreeError::invalid_argument(format!(
                "child {}..={} is outside parent {}..={}",
                child.start, child.end, self.start, self.end
            )));
        }
        child.set_level(self.level + 1);
        self.children.push(child);
        Ok(())
    }

    fn set_level(&mut self, level: usize) {
        let mut stack = vec![(self, level)];
        while let Some((cluster, level)) = stack.pop() {
            cluster.level = level;
            stack.extend(cluster.children.iter_mut().map(|c| (c, level + 1)));
        }
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Pre-order traversal of this cluster and all descendants.
    pub fn depth_first(&self) -> impl Iterator<Item = &OpticsCluster> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }
}

/// One entry of an OPTICS ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpticsOrder {
    /// Index of the point in the input data
    pub parent: usize,
    /// Point from which this one was reached, `None` for the start of a component
    pub predecessor: Option<usize>,
    pub reachability_distance: f64,
    pub core_distance: f64,
}

impl OpticsOrder {
    /// Noise at `threshold`: neither reachable within it nor a core point at it.
    pub fn is_noise(&self, threshold: f64) -> bool {
        self.reachability_distance > threshold && self.core_distance > threshold
    }
}
