//! # gdsc-trees
//!
//! KD-trees for nearest-neighbour search over localisation data, plus the point
//! and cluster types used by density-based clustering.
//!
//! - [`KdTree`]: bucket KD-tree generic over payload, dimension and
//!   [`DistanceMetric`], with an optional size limit that evicts the oldest point
//! - [`SimpleKdTree2D`]: payload-free 2D variant for neighbour counting
//! - [`heap`]: bounded and unbounded distance-keyed heaps used by the searches
//! - [`clustering`]: [`ClusterPoint`], [`Cluster`] and the OPTICS result types
//!
//! ## Quick Start
//!
//! ```rust
//! use gdsc_trees::{KdTree3D, KdTreeConfigBuilder};
//!
//! let config = KdTreeConfigBuilder::default().size_limit(1000).build().unwrap();
//! let mut tree = KdTree3D::<usize>::with_config(config)?;
//! for i in 0..2000 {
//!     let f = i as f64;
//!     tree.add_point([f.sin(), f.cos(), f * 1e-3], i)?;
//! }
//! // Only the most recent 1000 points remain
//! assert_eq!(tree.len(), 1000);
//!
//! let nearest = tree.nearest_neighbours(&[0.0, 1.0, 1.5], 5, true);
//! assert_eq!(nearest.len(), 5);
//! assert!(nearest.iter().all(|e| *e.value >= 1000));
//! # Ok::<(), gdsc_trees::TreeError>(())
//! ```

pub mod clustering;
pub mod distance;
pub mod error;
pub mod heap;
pub mod kdtree;

// Re-export error types
pub use error::{Result, TreeError};

pub use clustering::{Cluster, ClusterPoint, OpticsCluster, OpticsOrder};
pub use distance::{
    Chebyshev, DistanceMetric, Manhattan, SquaredEuclidean, WeightedManhattan,
    WeightedSquaredEuclidean,
};
pub use heap::{BoundedMaxHeap, MinHeap};
pub use kdtree::{
    Entry, KdTree, KdTree2D, KdTree3D, KdTreeConfig, KdTreeConfigBuilder, NearestNeighbourIter,
    SimpleKdTree2D,
};
