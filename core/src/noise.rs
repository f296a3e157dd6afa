//! Image noise estimation.
//!
//! Estimates the standard deviation of additive Gaussian noise in a single image.
//! The residual methods remove local structure first by computing a pseudo-residual
//! at each interior pixel, the pixel minus the mean of its neighbours, scaled so that
//! its variance equals the noise variance when the noise is independent:
//!
//! ```text
//! r = (4·I(x,y) − I(x−1,y) − I(x+1,y) − I(x,y−1) − I(x,y+1)) / √20
//! ```
//!
//! The quick variants use only the horizontal neighbours on every other row,
//! `r = (2·I − I(x−1) − I(x+1)) / √6`, which is cheaper and less sensitive to
//! row-correlated structure.
//!
//! The residuals are then reduced with a robust scale estimator (least median of
//! squares, least trimmed squares) or plainly (least mean of squares).
//!
//! # Example
//!
//! ```rust
//! use gdsc_core::noise::{NoiseEstimator, NoiseMethod};
//!
//! let width = 16;
//! let height = 16;
//! let data: Vec<f32> = (0..width * height).map(|i| (i % 7) as f32).collect();
//! let estimator = NoiseEstimator::new(data, width, height)?;
//! let sigma = estimator.estimate_noise(NoiseMethod::ResidualsLeastMedianOfSquares)?;
//! assert!(sigma >= 0.0);
//! # Ok::<(), gdsc_core::GdscError>(())
//! ```

use crate::error::{GdscError, Result};
use crate::statistics::{RollingStatistics, StatisticalSummary, median};
use derive_builder::Builder;
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::debug;

/// Consistency factor relating the median absolute deviation to σ for normal data.
pub const MAD_SCALE_FACTOR: f64 = 1.4826;

/// Upper quartile of the standard normal distribution.
const NORMAL_Q3: f64 = 0.674_489_750_196_081_7;

/// Smallest image dimension that has interior pixels.
const MIN_DIMENSION: usize = 3;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
pub enum NoiseMethod {
    /// Standard deviation of all pixels
    AllPixels,
    /// Standard deviation of the pixels left after iterative clipping of bright values
    LowestPixels,
    ResidualsLeastMedianOfSquares,
    ResidualsLeastTrimmedOfSquares,
    ResidualsLeastMeanOfSquares,
    QuickResidualsLeastMedianOfSquares,
    QuickResidualsLeastTrimmedOfSquares,
    QuickResidualsLeastMeanOfSquares,
}

impl NoiseMethod {
    fn uses_residuals(self) -> bool {
        !matches!(self, Self::AllPixels | Self::LowestPixels)
    }
}

/// Configuration for [`NoiseEstimator`]
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(default)]
pub struct NoiseEstimatorConfig {
    /// Keep computed residuals for reuse by later estimates (default: true)
    pub preserve_residuals: bool,

    /// Clipping threshold, in standard deviations above the mean, for
    /// [`NoiseMethod::LowestPixels`] (default: 2.0)
    pub lowest_pixels_sigma: f64,

    /// Iteration cap for [`NoiseMethod::LowestPixels`] (default: 10)
    pub lowest_pixels_max_iterations: usize,
}

impl Default for NoiseEstimatorConfig {
    fn default() -> Self {
        Self {
            preserve_residuals: true,
            lowest_pixels_sigma: 2.0,
            lowest_pixels_max_iterations: 10,
        }
    }
}

/// Noise estimator for a single row-major image.
#[derive(Debug)]
pub struct NoiseEstimator {
    data: Vec<f32>,
    width: usize,
    height: usize,
    config: NoiseEstimatorConfig,
    residuals: OnceCell<Vec<f64>>,
    quick_residuals: OnceCell<Vec<f64>>,
}

impl NoiseEstimator {
    pub fn new(data: Vec<f32>, width: usize, height: usize) -> Result<Self> {
        Self::with_config(data, width, height, NoiseEstimatorConfig::default())
    }

    pub fn with_config(
        data: Vec<f32>,
        width: usize,
        height: usize,
        config: NoiseEstimatorConfig,
    ) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .ok_or_else(|| GdscError::invalid_argument("image dimensions overflow"))?;
        if data.len() != expected {
            return Err(GdscError::dimension_mismatch(expected, data.len()));
        }
        Ok(Self {
            data,
            width,
            height,
            config,
            residuals: OnceCell::new(),
            quick_residuals: OnceCell::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn config(&self) -> &NoiseEstimatorConfig {
        &self.config
    }

    /// Estimate the noise standard deviation with the given method.
    pub fn estimate_noise(&self, method: NoiseMethod) -> Result<f64> {
        if self.data.is_empty() {
            return Err(GdscError::insufficient_data(1, 0));
        }
        if method.uses_residuals() {
            let min_side = self.width.min(self.height);
            if min_side < MIN_DIMENSION {
                return Err(GdscError::insufficient_data(MIN_DIMENSION, min_side));
            }
        }

        let sigma = match method {
            NoiseMethod::AllPixels => self.all_pixels(),
            NoiseMethod::LowestPixels => self.lowest_pixels(),
            NoiseMethod::ResidualsLeastMedianOfSquares => {
                least_median_of_squares(&self.residuals(false))
            }
            NoiseMethod::ResidualsLeastTrimmedOfSquares => {
                least_trimmed_of_squares(&self.residuals(false))
            }
            NoiseMethod::ResidualsLeastMeanOfSquares => {
                least_mean_of_squares(&self.residuals(false))
            }
            NoiseMethod::QuickResidualsLeastMedianOfSquares => {
                least_median_of_squares(&self.residuals(true))
            }
            NoiseMethod::QuickResidualsLeastTrimmedOfSquares => {
                least_trimmed_of_squares(&self.residuals(true))
            }
            NoiseMethod::QuickResidualsLeastMeanOfSquares => {
                least_mean_of_squares(&self.residuals(true))
            }
        };
        debug!(%method, sigma, width = self.width, height = self.height, "estimated noise");
        Ok(sigma)
    }

    /// Estimate with every method, in declaration order.
    pub fn estimate_noise_all(&self) -> Result<Vec<(NoiseMethod, f64)>> {
        let methods: Vec<NoiseMethod> = NoiseMethod::iter().collect();
        methods
            .into_par_iter()
            .map(|m| self.estimate_noise(m).map(|s| (m, s)))
            .collect()
    }

    fn all_pixels(&self) -> f64 {
        let stats: RollingStatistics = self.data.iter().map(|&v| v as f64).collect();
        if stats.n() < 2 {
            0.0
        } else {
            stats.standard_deviation()
        }
    }

    fn lowest_pixels(&self) -> f64 {
        let mut kept: Vec<f64> = self.data.iter().map(|&v| v as f64).collect();
        for iteration in 0..self.config.lowest_pixels_max_iterations {
            let stats: RollingStatistics = kept.iter().copied().collect();
            if stats.n() < 2 {
                break;
            }
            let limit = stats.mean() + self.config.lowest_pixels_sigma * stats.standard_deviation();
            let before = kept.len();
            kept.retain(|&v| v <= limit);
            if kept.len() == before {
                debug!(iteration, kept = kept.len(), "lowest pixels converged");
                break;
            }
        }
        let stats: RollingStatistics = kept.into_iter().collect();
        if stats.n() < 2 {
            0.0
        } else {
            stats.standard_deviation()
        }
    }

    fn residuals(&self, quick: bool) -> Cow<'_, [f64]> {
        let compute = || {
            if quick {
                self.compute_quick_residuals()
            } else {
                self.compute_residuals()
            }
        };
        if !self.config.preserve_residuals {
            return Cow::Owned(compute());
        }
        let cell = if quick {
            &self.quick_residuals
        } else {
            &self.residuals
        };
        Cow::Borrowed(cell.get_or_init(compute).as_slice())
    }

    fn compute_residuals(&self) -> Vec<f64> {
        let w = self.width;
        let scale = 20f64.sqrt();
        let mut out = Vec::with_capacity((w - 2) * (self.height - 2));
        for y in 1..self.height - 1 {
            for x in 1..w - 1 {
                let i = y * w + x;
                let centre = 4.0 * self.data[i] as f64;
                let neighbours = self.data[i - 1] as f64
                    + self.data[i + 1] as f64
                    + self.data[i - w] as f64
                    + self.data[i + w] as f64;
                out.push((centre - neighbours) / scale);
            }
        }
        out
    }

    fn compute_quick_residuals(&self) -> Vec<f64> {
        let w = self.width;
        let scale = 6f64.sqrt();
        let mut out = Vec::with_capacity((w - 2) * self.height.div_ceil(2));
        for y in (0..self.height).step_by(2) {
            let row = &self.data[y * w..(y + 1) * w];
            for x in 1..w - 1 {
                let r = 2.0 * row[x] as f64 - row[x - 1] as f64 - row[x + 1] as f64;
                out.push(r / scale);
            }
        }
        out
    }
}

/// `1.4826 · median(|r|)`
fn least_median_of_squares(residuals: &[f64]) -> f64 {
    let abs: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
    MAD_SCALE_FACTOR * median(&abs)
}

/// Root of the mean of the lowest half of `r²`, corrected for the trimming.
fn least_trimmed_of_squares(residuals: &[f64]) -> f64 {
    let mut squares: Vec<f64> = residuals.iter().map(|r| r * r).collect();
    squares.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let h = (squares.len() / 2).max(1);
    let mean = squares[..h].iter().sum::<f64>() / h as f64;
    (mean / trimmed_consistency()).sqrt()
}

fn least_mean_of_squares(residuals: &[f64]) -> f64 {
    let mean = residuals.iter().map(|r| r * r).sum::<f64>() / residuals.len() as f64;
    mean.sqrt()
}

/// `E[Z² | |Z| ≤ q]` for a standard normal `Z` and `q` the upper quartile.
fn trimmed_consistency() -> f64 {
    let q = NORMAL_Q3;
    let density = (-0.5 * q * q).exp() / (2.0 * std::f64::consts::PI).sqrt();
    // P(|Z| <= q) is 0.5 by the choice of q
    1.0 - 2.0 * q * density / 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Box-Muller so the tests do not depend on the random module.
    fn gaussian_image(width: usize, height: usize, sigma: f64, seed: u64) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..width * height)
            .map(|i| {
                let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE);
                let u2: f64 = rng.random();
                let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
                // A smooth gradient the residual methods should ignore
                let background = 100.0 + 0.5 * (i % width) as f64;
                (background + sigma * z) as f32
            })
            .collect()
    }

    #[test]
    fn test_trimmed_consistency_value() {
        assert_relative_eq!(trimmed_consistency(), 0.1426, epsilon = 1e-3);
    }

    #[test]
    fn test_dimension_checks() {
        assert!(matches!(
            NoiseEstimator::new(vec![0.0; 10], 3, 3),
            Err(GdscError::DimensionMismatch {
                expected: 9,
                actual: 10
            })
        ));
        let small = NoiseEstimator::new(vec![1.0; 4], 2, 2).unwrap();
        assert!(small.estimate_noise(NoiseMethod::AllPixels).is_ok());
        assert!(small
            .estimate_noise(NoiseMethod::ResidualsLeastMeanOfSquares)
            .is_err());
    }

    #[test]
    fn test_flat_image_has_zero_noise() {
        let e = NoiseEstimator::new(vec![5.0; 25], 5, 5).unwrap();
        for (method, sigma) in e.estimate_noise_all().unwrap() {
            assert!(sigma.abs() < 1e-12, "{} estimated {}", method, sigma);
        }
    }

    #[test]
    fn test_residual_methods_recover_sigma() {
        let (w, h, sigma) = (128, 128, 3.0);
        let e = NoiseEstimator::new(gaussian_image(w, h, sigma, 42), w, h).unwrap();
        for method in NoiseMethod::iter().filter(|m| m.uses_residuals()) {
            let estimate = e.estimate_noise(method).unwrap();
            assert!(
                (estimate - sigma).abs() < 0.25 * sigma,
                "{} estimated {} for sigma {}",
                method,
                estimate,
                sigma
            );
        }
    }

    #[test]
    fn test_all_pixels_includes_background_structure() {
        let (w, h) = (64, 64);
        let e = NoiseEstimator::new(gaussian_image(w, h, 1.0, 7), w, h).unwrap();
        let all = e.estimate_noise(NoiseMethod::AllPixels).unwrap();
        let residual = e
            .estimate_noise(NoiseMethod::ResidualsLeastMedianOfSquares)
            .unwrap();
        // The gradient spans 32 units so the raw standard deviation is much larger
        assert!(all > 5.0 * residual);
    }

    #[test]
    fn test_lowest_pixels_ignores_bright_spots() {
        let (w, h) = (32, 32);
        let mut data = vec![10.0f32; w * h];
        for (i, v) in data.iter_mut().enumerate() {
            *v += if i % 2 == 0 { 1.0 } else { -1.0 };
        }
        for i in (0..data.len()).step_by(97) {
            data[i] = 1000.0;
        }
        let e = NoiseEstimator::new(data, w, h).unwrap();
        let lowest = e.estimate_noise(NoiseMethod::LowestPixels).unwrap();
        let all = e.estimate_noise(NoiseMethod::AllPixels).unwrap();
        assert!(lowest < 1.5);
        assert!(all > 50.0);
    }

    #[test]
    fn test_residual_cache_is_optional() {
        let (w, h) = (16, 16);
        let data = gaussian_image(w, h, 2.0, 3);
        let cached = NoiseEstimator::new(data.clone(), w, h).unwrap();
        let config = NoiseEstimatorConfigBuilder::default()
            .preserve_residuals(false)
            .build()
            .unwrap();
        let uncached = NoiseEstimator::with_config(data, w, h, config).unwrap();
        let m = NoiseMethod::QuickResidualsLeastTrimmedOfSquares;
        assert_relative_eq!(
            cached.estimate_noise(m).unwrap(),
            uncached.estimate_noise(m).unwrap()
        );
        assert!(cached.quick_residuals.get().is_some());
        assert!(uncached.quick_residuals.get().is_none());
    }
}
