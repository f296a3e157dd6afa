//! Bucket KD-tree with an optional size limit.
//!
//! # Structure
//!
//! Points live in leaf buckets. When a bucket grows past `bucket_size` it is split
//! at the midpoint of the widest dimension of its points, and the leaf becomes an
//! interior node with two new leaves. Every node records the bounding box of the
//! points added beneath it, which lets queries skip subtrees that cannot contain a
//! closer point.
//!
//! Nodes are stored in a flat arena and point records in a slab, each with a free
//! list, so the tree never needs recursion or reference-counted links.
//!
//! # Size limit
//!
//! With [`KdTreeConfig::size_limit`] set, the tree behaves as a sliding window over
//! the most recent points: adding a point to a full tree first evicts the oldest.
//! A leaf emptied by eviction is removed and its parent split replaced by the
//! sibling subtree, so every split keeps two non-empty children and the arena
//! stays within `2 * size_limit + 1` nodes. Other bounds are not shrunk on
//! eviction; they remain valid (if loose) bounds for the remaining points.
//!
//! # Example
//!
//! ```rust
//! use gdsc_trees::KdTree2D;
//!
//! let mut tree = KdTree2D::<&str>::new();
//! tree.add_point([0.0, 0.0], "origin")?;
//! tree.add_point([3.0, 4.0], "far")?;
//! tree.add_point([1.0, 1.0], "near")?;
//!
//! let found = tree.nearest_neighbours(&[0.9, 0.8], 2, true);
//! assert_eq!(*found[0].value, "near");
//! assert_eq!(*found[1].value, "origin");
//! # Ok::<(), gdsc_trees::TreeError>(())
//! ```

use crate::distance::{DistanceMetric, SquaredEuclidean};
use crate::error::{Result, TreeError};
use crate::heap::{BoundedMaxHeap, MinHeap};
use derive_builder::Builder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::trace;

const NONE: usize = usize::MAX;
const ROOT: usize = 0;

/// Configuration for [`KdTree`]
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq, Eq)]
#[builder(default)]
pub struct KdTreeConfig {
    /// Points per leaf before the leaf is split (default: 24)
    pub bucket_size: usize,

    /// Maximum number of points kept; the oldest is evicted first (default: unlimited)
    #[builder(setter(strip_option))]
    pub size_limit: Option<usize>,
}

impl Default for KdTreeConfig {
    fn default() -> Self {
        Self {
            bucket_size: 24,
            size_limit: None,
        }
    }
}

impl KdTreeConfig {
    fn validate(&self) -> Result<()> {
        if self.bucket_size == 0 {
            return Err(TreeError::invalid_argument("bucket size must be positive"));
        }
        if self.size_limit == Some(0) {
            return Err(TreeError::invalid_argument("size limit must be positive"));
        }
        Ok(())
    }
}

/// A query result: the distance in the metric's units and the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entry<T> {
    pub distance: f64,
    pub value: T,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Leaf {
        entries: Vec<usize>,
    },
    Split {
        dimension: usize,
        value: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct Node<const N: usize> {
    min: [f64; N],
    max: [f64; N],
    count: usize,
    parent: usize,
    kind: NodeKind,
}

impl<const N: usize> Node<N> {
    fn empty_leaf(parent: usize) -> Self {
        Self {
            min: [f64::INFINITY; N],
            max: [f64::NEG_INFINITY; N],
            count: 0,
            parent,
            kind: NodeKind::Leaf {
                entries: Vec::new(),
            },
        }
    }

    fn reset_bounds(&mut self) {
        self.min = [f64::INFINITY; N];
        self.max = [f64::NEG_INFINITY; N];
    }

    fn extend(&mut self, location: &[f64; N]) {
        for (i, &x) in location.iter().enumerate() {
            self.min[i] = self.min[i].min(x);
            self.max[i] = self.max[i].max(x);
        }
    }
}

#[derive(Debug, Clone)]
struct Point<T, const N: usize> {
    location: [f64; N],
    value: T,
    leaf: usize,
}

/// Progress through an interior node during the depth-first search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    None,
    LeftVisited,
    RightVisited,
    AllVisited,
}

/// KD-tree over `N`-dimensional `f64` locations carrying a value of type `T`.
#[derive(Debug, Clone)]
pub struct KdTree<T, const N: usize, M = SquaredEuclidean> {
    nodes: Vec<Node<N>>,
    /// Node slots released by collapsed splits
    free_nodes: Vec<usize>,
    points: Vec<Option<Point<T, N>>>,
    free: Vec<usize>,
    /// Point slots in insertion order, oldest first
    order: VecDeque<usize>,
    metric: M,
    config: KdTreeConfig,
}

pub type KdTree2D<T, M = SquaredEuclidean> = KdTree<T, 2, M>;
pub type KdTree3D<T, M = SquaredEuclidean> = KdTree<T, 3, M>;

impl<T, const N: usize, M: DistanceMetric<N> + Default> KdTree<T, N, M> {
    pub fn new() -> Self {
        Self::build(KdTreeConfig::default(), M::default())
    }

    pub fn with_config(config: KdTreeConfig) -> Result<Self> {
        Self::with_metric(config, M::default())
    }
}

impl<T, const N: usize, M: DistanceMetric<N> + Default> Default for KdTree<T, N, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize, M: DistanceMetric<N>> KdTree<T, N, M> {
    pub fn with_metric(config: KdTreeConfig, metric: M) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, metric))
    }

    fn build(config: KdTreeConfig, metric: M) -> Self {
        Self {
            nodes: vec![Node::empty_leaf(NONE)],
            free_nodes: Vec::new(),
            points: Vec::new(),
            free: Vec::new(),
            order: VecDeque::new(),
            metric,
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        N
    }

    pub fn size_limit(&self) -> Option<usize> {
        self.config.size_limit
    }

    pub fn bucket_size(&self) -> usize {
        self.config.bucket_size
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Stored points, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (&[f64; N], &T)> + '_ {
        self.order
            .iter()
            .filter_map(|&slot| self.points[slot].as_ref())
            .map(|p| (&p.location, &p.value))
    }

    /// Insert a point. With a size limit, the oldest point is evicted first when
    /// the tree is full.
    pub fn add_point(&mut self, location: [f64; N], value: T) -> Result<()> {
        if location.iter().any(|x| !x.is_finite()) {
            return Err(TreeError::non_finite(&location));
        }
        if self.config.size_limit.is_some_and(|limit| self.len() >= limit) {
            self.evict_oldest();
        }

        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.points.push(None);
                self.points.len() - 1
            }
        };
        self.order.push_back(slot);

        // Descend, widening bounds on the way
        let mut node = ROOT;
        loop {
            let n = &mut self.nodes[node];
            n.extend(&location);
            n.count += 1;
            match &mut n.kind {
                NodeKind::Split {
                    dimension,
                    value: split,
                    left,
                    right,
                } => {
                    node = if location[*dimension] <= *split {
                        *left
                    } else {
                        *right
                    };
                }
                NodeKind::Leaf { entries } => {
                    entries.push(slot);
                    break;
                }
            }
        }
        self.points[slot] = Some(Point {
            location,
            value,
            leaf: node,
        });
        self.split_if_full(node);
        Ok(())
    }

    /// Add several points, stopping at the first invalid location.
    pub fn extend_points(&mut self, points: impl IntoIterator<Item = ([f64; N], T)>) -> Result<()> {
        for (location, value) in points {
            self.add_point(location, value)?;
        }
        Ok(())
    }

    /// Leaf entries only reference occupied slots.
    fn point(&self, slot: usize) -> Option<&Point<T, N>> {
        self.points.get(slot).and_then(Option::as_ref)
    }

    fn evict_oldest(&mut self) {
        let Some(slot) = self.order.pop_front() else {
            return;
        };
        let Some(point) = self.points[slot].take() else {
            return;
        };
        if let NodeKind::Leaf { entries } = &mut self.nodes[point.leaf].kind {
            entries.retain(|&e| e != slot);
        }
        let mut node = point.leaf;
        while node != NONE {
            self.nodes[node].count -= 1;
            node = self.nodes[node].parent;
        }
        self.free.push(slot);
        trace!(leaf = point.leaf, remaining = self.len(), "evicted oldest point");

        let leaf = &mut self.nodes[point.leaf];
        if leaf.count == 0 {
            leaf.reset_bounds();
            let parent = leaf.parent;
            if parent != NONE {
                self.collapse(parent, point.leaf);
            }
        }
    }

    /// Replace the split node `split` by the sibling of its empty child `empty`.
    fn collapse(&mut self, split: usize, empty: usize) {
        let sibling = match self.nodes[split].kind {
            NodeKind::Split { left, right, .. } if left == empty => right,
            NodeKind::Split { left, .. } => left,
            NodeKind::Leaf { .. } => return,
        };
        let mut node = std::mem::replace(&mut self.nodes[sibling], Node::empty_leaf(NONE));
        node.parent = self.nodes[split].parent;
        match &node.kind {
            NodeKind::Leaf { entries } => {
                for &slot in entries {
                    if let Some(p) = self.points[slot].as_mut() {
                        p.leaf = split;
                    }
                }
            }
            NodeKind::Split { left, right, .. } => {
                self.nodes[*left].parent = split;
                self.nodes[*right].parent = split;
            }
        }
        self.nodes[split] = node;
        self.free_nodes.push(empty);
        self.free_nodes.push(sibling);
        trace!(node = split, free = self.free_nodes.len(), "collapsed split");
    }

    fn alloc_node(&mut self, parent: usize) -> usize {
        match self.free_nodes.pop() {
            Some(index) => {
                self.nodes[index] = Node::empty_leaf(parent);
                index
            }
            None => {
                self.nodes.push(Node::empty_leaf(parent));
                self.nodes.len() - 1
            }
        }
    }

    fn split_if_full(&mut self, leaf: usize) {
        let entries = match &self.nodes[leaf].kind {
            NodeKind::Leaf { entries } if entries.len() > self.config.bucket_size => entries.clone(),
            _ => return,
        };

        // Widest dimension of the points actually present
        let mut min = [f64::INFINITY; N];
        let mut max = [f64::NEG_INFINITY; N];
        for p in entries.iter().filter_map(|&slot| self.point(slot)) {
            for (i, &x) in p.location.iter().enumerate() {
                min[i] = min[i].min(x);
                max[i] = max[i].max(x);
            }
        }
        let Some((dimension, width)) = (0..N)
            .map(|i| (i, max[i] - min[i]))
            .max_by(|a, b| a.1.total_cmp(&b.1))
        else {
            return;
        };
        if width <= 0.0 {
            // All points identical; the leaf stays over-full
            return;
        }
        let mut split = min[dimension] + width / 2.0;
        if split >= max[dimension] {
            split = min[dimension];
        }

        let left = self.alloc_node(leaf);
        let right = self.alloc_node(leaf);
        for &slot in &entries {
            let Some(location) = self.point(slot).map(|p| p.location) else {
                continue;
            };
            let child = if location[dimension] <= split {
                left
            } else {
                right
            };
            let node = &mut self.nodes[child];
            node.extend(&location);
            node.count += 1;
            if let NodeKind::Leaf { entries } = &mut node.kind {
                entries.push(slot);
            }
            if let Some(p) = self.points[slot].as_mut() {
                p.leaf = child;
            }
        }
        self.nodes[leaf].kind = NodeKind::Split {
            dimension,
            value: split,
            left,
            right,
        };
        trace!(
            node = leaf,
            dimension,
            split,
            left = self.nodes[left].count,
            right = self.nodes[right].count,
            "split leaf"
        );
    }

    /// The `count` entries closest to `location`.
    ///
    /// With `sequential_sorting` the result is in ascending distance; otherwise it
    /// is in heap order (the farthest kept entry first). The search is a
    /// depth-first descent driven by an explicit stack, nearer child first, that
    /// skips any subtree whose bounds lie beyond the current worst candidate once
    /// `count` candidates are held.
    pub fn nearest_neighbours(
        &self,
        location: &[f64; N],
        count: usize,
        sequential_sorting: bool,
    ) -> Vec<Entry<&T>> {
        let count = count.min(self.len());
        if count == 0 {
            return Vec::new();
        }
        let mut heap = BoundedMaxHeap::new(count);
        let mut stack: Vec<(usize, Status)> = vec![(ROOT, Status::None)];

        while let Some(top) = stack.last_mut() {
            let node = &self.nodes[top.0];
            if top.1 == Status::None && !self.should_visit(node, location, &heap) {
                stack.pop();
                continue;
            }
            let next = match &node.kind {
                NodeKind::Leaf { entries } => {
                    for &slot in entries {
                        if let Some(p) = self.point(slot) {
                            heap.offer(self.metric.distance(location, &p.location), slot);
                        }
                    }
                    None
                }
                NodeKind::Split {
                    dimension,
                    value,
                    left,
                    right,
                } => match top.1 {
                    Status::None => {
                        if location[*dimension] <= *value {
                            top.1 = Status::LeftVisited;
                            Some(*left)
                        } else {
                            top.1 = Status::RightVisited;
                            Some(*right)
                        }
                    }
                    Status::LeftVisited => {
                        top.1 = Status::AllVisited;
                        Some(*right)
                    }
                    Status::RightVisited => {
                        top.1 = Status::AllVisited;
                        Some(*left)
                    }
                    Status::AllVisited => None,
                },
            };
            match next {
                Some(child) => stack.push((child, Status::None)),
                None => {
                    stack.pop();
                }
            }
        }

        let found = if sequential_sorting {
            heap.into_sorted_vec()
        } else {
            heap.into_vec()
        };
        found
            .into_iter()
            .filter_map(|(distance, slot)| {
                self.point(slot).map(|p| Entry {
                    distance,
                    value: &p.value,
                })
            })
            .collect()
    }

    fn should_visit(&self, node: &Node<N>, location: &[f64; N], heap: &BoundedMaxHeap<usize>) -> bool {
        if node.count == 0 {
            return false;
        }
        match heap.peek_max_key() {
            Some(worst) if heap.is_full() => {
                self.metric.distance_to_rect(location, &node.min, &node.max) < worst
            }
            _ => true,
        }
    }

    pub fn nearest_neighbour(&self, location: &[f64; N]) -> Option<Entry<&T>> {
        self.nearest_neighbours(location, 1, false).into_iter().next()
    }

    /// Call `handler(distance, value)` for every point within `range` of `location`
    /// (inclusive, in the metric's units). Points are visited in tree order.
    pub fn find_neighbours<F>(&self, location: &[f64; N], range: f64, mut handler: F)
    where
        F: FnMut(f64, &T),
    {
        let mut stack = vec![ROOT];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if node.count == 0 || self.metric.distance_to_rect(location, &node.min, &node.max) > range {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf { entries } => {
                    for &slot in entries {
                        if let Some(p) = self.point(slot) {
                            let d = self.metric.distance(location, &p.location);
                            if d <= range {
                                handler(d, &p.value);
                            }
                        }
                    }
                }
                NodeKind::Split { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }
    }

    /// Lazily yield every stored entry in ascending distance from `location`.
    pub fn nearest_iter(&self, location: &[f64; N]) -> NearestNeighbourIter<'_, T, N, M> {
        let mut pending = MinHeap::new();
        if self.nodes[ROOT].count > 0 {
            pending.push(0.0, ROOT);
        }
        NearestNeighbourIter {
            tree: self,
            location: *location,
            pending,
            candidates: MinHeap::new(),
        }
    }
}

impl<T: Sync, const N: usize, M: DistanceMetric<N>> KdTree<T, N, M> {
    /// Run [`KdTree::nearest_neighbours`] for many locations in parallel.
    pub fn nearest_neighbours_batch(
        &self,
        locations: &[[f64; N]],
        count: usize,
        sequential_sorting: bool,
    ) -> Vec<Vec<Entry<&T>>> {
        locations
            .par_iter()
            .map(|location| self.nearest_neighbours(location, count, sequential_sorting))
            .collect()
    }
}

/// Iterator returned by [`KdTree::nearest_iter`].
///
/// Holds a min-heap of unexplored nodes keyed by their bound distance and a
/// min-heap of points already scanned. A point is yielded once no unexplored node
/// could hold anything closer.
pub struct NearestNeighbourIter<'a, T, const N: usize, M> {
    tree: &'a KdTree<T, N, M>,
    location: [f64; N],
    pending: MinHeap<usize>,
    candidates: MinHeap<usize>,
}

impl<'a, T, const N: usize, M: DistanceMetric<N>> Iterator for NearestNeighbourIter<'a, T, N, M> {
    type Item = Entry<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        loop {
            let explore = match (self.pending.peek_key(), self.candidates.peek_key()) {
                (Some(node), Some(point)) => node < point,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if !explore {
                let (distance, slot) = self.candidates.pop()?;
                return tree.point(slot).map(|p| Entry {
                    distance,
                    value: &p.value,
                });
            }
            let (_, index) = self.pending.pop()?;
            match &tree.nodes[index].kind {
                NodeKind::Leaf { entries } => {
                    for &slot in entries {
                        if let Some(p) = tree.point(slot) {
                            let d = tree.metric.distance(&self.location, &p.location);
                            self.candidates.push(d, slot);
                        }
                    }
                }
                NodeKind::Split { left, right, .. } => {
                    for &child in [left, right] {
                        let node = &tree.nodes[child];
                        if node.count > 0 {
                            let d = tree
                                .metric
                                .distance_to_rect(&self.location, &node.min, &node.max);
                            self.pending.push(d, child);
                        }
                    }
                }
            }
        }
    }
}

/// Payload-free 2D point set using Euclidean distances.
#[derive(Debug, Clone, Default)]
pub struct SimpleKdTree2D {
    tree: KdTree2D<()>,
}

impl SimpleKdTree2D {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: KdTreeConfig) -> Result<Self> {
        Ok(Self {
            tree: KdTree2D::<()>::with_config(config)?,
        })
    }

    pub fn add_point(&mut self, x: f64, y: f64) -> Result<()> {
        self.tree.add_point([x, y], ())
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Number of points within Euclidean `distance` of `(x, y)`, inclusive.
    pub fn count_neighbours(&self, x: f64, y: f64, distance: f64) -> usize {
        if distance < 0.0 {
            return 0;
        }
        let mut count = 0;
        self.tree
            .find_neighbours(&[x, y], distance * distance, |_, _| count += 1);
        count
    }

    /// Euclidean distance to the closest point, `None` when empty.
    pub fn nearest_distance(&self, x: f64, y: f64) -> Option<f64> {
        self.tree
            .nearest_neighbour(&[x, y])
            .map(|e| e.distance.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Manhattan;

    fn grid_tree(bucket_size: usize) -> KdTree2D<usize> {
        let config = KdTreeConfigBuilder::default()
            .bucket_size(bucket_size)
            .build()
            .unwrap();
        let mut tree = KdTree2D::<usize>::with_config(config).unwrap();
        for i in 0..100 {
            tree.add_point([(i % 10) as f64, (i / 10) as f64], i).unwrap();
        }
        tree
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(KdTreeConfig::default().bucket_size, 24);
        let bad = KdTreeConfig {
            bucket_size: 0,
            ..Default::default()
        };
        assert!(KdTree2D::<()>::with_config(bad).is_err());
        let bad = KdTreeConfigBuilder::default().size_limit(0).build().unwrap();
        assert!(KdTree2D::<()>::with_config(bad).is_err());
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut tree = KdTree3D::<u8>::new();
        assert!(matches!(
            tree.add_point([0.0, f64::NAN, 1.0], 0),
            Err(TreeError::NonFiniteLocation { .. })
        ));
        assert!(tree.add_point([f64::INFINITY, 0.0, 0.0], 0).is_err());
        assert!(tree.is_empty());
        assert_eq!(tree.dimensions(), 3);
    }

    #[test]
    fn test_leaves_split_and_counts_agree() {
        let tree = grid_tree(4);
        assert!(tree.nodes.len() > 1);
        assert_eq!(tree.nodes[ROOT].count, 100);
        for node in &tree.nodes {
            match &node.kind {
                NodeKind::Leaf { entries } => {
                    assert!(entries.len() <= 4);
                    assert_eq!(entries.len(), node.count);
                }
                NodeKind::Split { left, right, .. } => {
                    assert_eq!(node.count, tree.nodes[*left].count + tree.nodes[*right].count);
                }
            }
        }
    }

    #[test]
    fn test_identical_points_stay_in_one_leaf() {
        let config = KdTreeConfig {
            bucket_size: 2,
            ..Default::default()
        };
        let mut tree = KdTree2D::<usize>::with_config(config).unwrap();
        for i in 0..10 {
            tree.add_point([1.0, 1.0], i).unwrap();
        }
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.nearest_neighbours(&[0.0, 0.0], 20, true).len(), 10);
    }

    #[test]
    fn test_nearest_neighbours_on_grid() {
        let tree = grid_tree(3);
        let found = tree.nearest_neighbours(&[4.1, 5.0], 4, true);
        assert_eq!(*found[0].value, 54);
        assert!((found[0].distance - 0.01).abs() < 1e-12);
        assert_eq!(*found[1].value, 55);
        // Vertical neighbours tie
        let mut rest: Vec<usize> = found[2..].iter().map(|e| *e.value).collect();
        rest.sort_unstable();
        assert_eq!(rest, vec![44, 64]);

        let unsorted = tree.nearest_neighbours(&[4.1, 5.0], 3, false);
        assert_eq!(unsorted.len(), 3);
        assert!(tree.nearest_neighbours(&[0.0, 0.0], 0, true).is_empty());
        assert_eq!(tree.nearest_neighbours(&[0.0, 0.0], 500, true).len(), 100);
    }

    #[test]
    fn test_find_neighbours_range_is_inclusive() {
        let tree = grid_tree(5);
        let mut found = Vec::new();
        tree.find_neighbours(&[5.0, 5.0], 1.0, |_, v| found.push(*v));
        found.sort_unstable();
        assert_eq!(found, vec![45, 54, 55, 56, 65]);
    }

    #[test]
    fn test_eviction_is_fifo() {
        let config = KdTreeConfigBuilder::default()
            .bucket_size(2)
            .size_limit(5)
            .build()
            .unwrap();
        let mut tree = KdTree::<usize, 1>::with_config(config).unwrap();
        for i in 0..12 {
            tree.add_point([i as f64], i).unwrap();
        }
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.size_limit(), Some(5));
        let kept: Vec<usize> = tree.iter().map(|(_, v)| *v).collect();
        assert_eq!(kept, vec![7, 8, 9, 10, 11]);
        assert_eq!(*tree.nearest_neighbour(&[0.0]).unwrap().value, 7);
        assert_eq!(tree.nodes[ROOT].count, 5);
        // Slots are reused
        assert!(tree.points.len() <= 6);
    }

    #[test]
    fn test_drifting_stream_keeps_arena_bounded() {
        let limit = 100;
        let config = KdTreeConfigBuilder::default()
            .bucket_size(4)
            .size_limit(limit)
            .build()
            .unwrap();
        let mut tree = KdTree2D::<usize>::with_config(config).unwrap();
        for i in 0..20_000 {
            tree.add_point([i as f64, (i % 7) as f64], i).unwrap();
            assert!(tree.nodes.len() <= 2 * limit + 1, "{} nodes at {}", tree.nodes.len(), i);
        }
        assert_eq!(tree.len(), limit);

        // Every reachable split has two non-empty children and counts add up
        let mut stack = vec![ROOT];
        let mut points = 0;
        while let Some(index) = stack.pop() {
            let node = &tree.nodes[index];
            match &node.kind {
                NodeKind::Leaf { entries } => {
                    assert_eq!(entries.len(), node.count);
                    for &slot in entries {
                        assert_eq!(tree.points[slot].as_ref().unwrap().leaf, index);
                    }
                    points += entries.len();
                }
                NodeKind::Split { left, right, .. } => {
                    for child in [*left, *right] {
                        assert!(tree.nodes[child].count > 0);
                        assert_eq!(tree.nodes[child].parent, index);
                        stack.push(child);
                    }
                    assert_eq!(node.count, tree.nodes[*left].count + tree.nodes[*right].count);
                }
            }
        }
        assert_eq!(points, limit);

        let nearest = tree.nearest_neighbours(&[0.0, 0.0], 3, true);
        let values: Vec<usize> = nearest.iter().map(|e| *e.value).collect();
        assert_eq!(values, vec![19_900, 19_901, 19_902]);
    }

    #[test]
    fn test_emptied_tree_accepts_new_points() {
        let config = KdTreeConfigBuilder::default()
            .bucket_size(1)
            .size_limit(3)
            .build()
            .unwrap();
        let mut tree = KdTree::<u32, 1>::with_config(config).unwrap();
        for i in 0..3 {
            tree.add_point([i as f64], i).unwrap();
        }
        for i in 3..6 {
            tree.add_point([100.0 + i as f64], i).unwrap();
        }
        let kept: Vec<u32> = tree.iter().map(|(_, v)| *v).collect();
        assert_eq!(kept, vec![3, 4, 5]);
        assert_eq!(*tree.nearest_neighbour(&[0.0]).unwrap().value, 3);
        assert!(tree.nodes.len() <= 7);
    }

    #[test]
    fn test_nearest_iter_is_sorted_and_complete() {
        let tree = grid_tree(4);
        let distances: Vec<f64> = tree.nearest_iter(&[2.3, 7.6]).map(|e| e.distance).collect();
        assert_eq!(distances.len(), 100);
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(KdTree2D::<u8>::new().nearest_iter(&[0.0, 0.0]).count(), 0);
    }

    #[test]
    fn test_other_metric() {
        let mut tree = KdTree::<char, 2, Manhattan>::new();
        tree.add_point([0.0, 3.0], 'a').unwrap();
        tree.add_point([2.0, 2.0], 'b').unwrap();
        // Euclidean would pick 'b' (√5 < 3), Manhattan picks 'a' (3 < 4)
        let nearest = tree.nearest_neighbour(&[0.0, 0.0]).unwrap();
        assert_eq!(*nearest.value, 'a');
        assert_eq!(nearest.distance, 3.0);
    }

    #[test]
    fn test_simple_tree() {
        let mut tree = SimpleKdTree2D::new();
        assert_eq!(tree.nearest_distance(0.0, 0.0), None);
        for (x, y) in [(0.0, 0.0), (3.0, 4.0), (1.0, 0.0), (10.0, 10.0)] {
            tree.add_point(x, y).unwrap();
        }
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.count_neighbours(0.0, 0.0, 5.0), 3);
        assert_eq!(tree.count_neighbours(0.0, 0.0, 0.5), 1);
        assert_eq!(tree.count_neighbours(0.0, 0.0, -1.0), 0);
        assert_eq!(tree.nearest_distance(3.0, 0.0), Some(2.0));
    }
}
