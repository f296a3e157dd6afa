//! # gdsc-core
//!
//! Numeric and data-structure utilities for single-molecule localisation
//! microscopy image analysis.
//!
//! The crate is a flat collection of independent modules:
//!
//! - **Numerics**: [`maths`], [`rounding`], [`arrays`]
//! - **Statistics**: running and stored summaries in [`statistics`], fixed-size
//!   rolling windows in [`rolling`], rolling medians in [`median`]
//! - **Image analysis**: noise estimation in [`noise`], pixel helpers in [`image`],
//!   convex hulls in [`geometry`]
//! - **Scoring**: point matching and classification metrics in [`matching`]
//! - **Support**: [`text`] and [`xml`] formatting, [`random`] sampling adapters,
//!   atomic locks in [`sync`], [`boolean_array`], file-name helpers in [`files`]
//!
//! Fallible operations return [`Result`] with a [`GdscError`]. Diagnostics are
//! emitted through `tracing`; no subscriber is installed here.
//!
//! ## Quick Start
//!
//! ```rust
//! use gdsc_core::median::FloatLinkedMedianWindow;
//!
//! let mut window = FloatLinkedMedianWindow::new(&[1.0, 5.0, 3.0])?;
//! assert_eq!(window.median(), 3.0);
//!
//! // Replaces the oldest value (1.0)
//! window.add(9.0)?;
//! assert_eq!(window.median(), 5.0);
//! # Ok::<(), gdsc_core::GdscError>(())
//! ```

pub mod arrays;
pub mod boolean_array;
pub mod error;
pub mod files;
pub mod geometry;
pub mod image;
pub mod matching;
pub mod maths;
pub mod median;
pub mod noise;
pub mod random;
pub mod rolling;
pub mod rounding;
pub mod statistics;
pub mod sync;
pub mod text;
pub mod xml;

// Re-export error types
pub use error::{GdscError, Result};

pub use boolean_array::{BooleanArray, SharedBooleanArray};
pub use geometry::ConvexHull;
pub use matching::{
    ClassificationResult, FractionClassificationResult, MatchCalculator, MatchResult, Matching,
};
pub use median::{
    DoubleLinkedMedianWindow, DoubleMedianWindow, FloatLinkedMedianWindow, FloatMedianWindow,
    LinkedMedianWindow, MedianWindow,
};
pub use noise::{NoiseEstimator, NoiseEstimatorConfig, NoiseEstimatorConfigBuilder, NoiseMethod};
pub use rolling::{BooleanRollingArray, RollingArray};
pub use rounding::{Rounder, RounderFactory, Rounding};
pub use statistics::{RollingStatistics, StatisticalSummary, Statistics, StoredDataStatistics};
pub use sync::{SimpleLock, SoftLock};
