//! Scalar numeric helpers.
//!
//! Small functions shared by the statistics, geometry and fitting code: clamping,
//! powers of two, interpolation, Euclidean distances and the information criteria
//! used to compare fitted models.

use crate::error::{GdscError, Result};

/// Minimum and maximum of the finite and infinite values, skipping NaN.
///
/// Returns `None` when the slice has no non-NaN values.
pub fn min_max(data: &[f64]) -> Option<(f64, f64)> {
    data.iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Clamp `value` into `[lower, upper]`.
pub fn clip(lower: f64, upper: f64, value: f64) -> f64 {
    if value < lower {
        lower
    } else if value > upper {
        upper
    } else {
        value
    }
}

pub fn is_pow2(value: u64) -> bool {
    value != 0 && (value & (value - 1)) == 0
}

/// Smallest power of two `>= value`. Zero maps to one.
pub fn next_pow2(value: u64) -> u64 {
    value.max(1).next_power_of_two()
}

pub fn log2(value: f64) -> f64 {
    value.log2()
}

pub fn pow2(value: f64) -> f64 {
    value * value
}

pub fn pow3(value: f64) -> f64 {
    value * value * value
}

/// Euclidean distance between two 2D points.
pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    distance2(x1, y1, x2, y2).sqrt()
}

/// Squared Euclidean distance between two 2D points.
pub fn distance2(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x1 - x2;
    let dy = y1 - y2;
    dx * dx + dy * dy
}

/// Euclidean distance between two 3D points.
pub fn distance_3d(x1: f64, y1: f64, z1: f64, x2: f64, y2: f64, z2: f64) -> f64 {
    distance2_3d(x1, y1, z1, x2, y2, z2).sqrt()
}

/// Squared Euclidean distance between two 3D points.
pub fn distance2_3d(x1: f64, y1: f64, z1: f64, x2: f64, y2: f64, z2: f64) -> f64 {
    let dx = x1 - x2;
    let dy = y1 - y2;
    let dz = z1 - z2;
    dx * dx + dy * dy + dz * dz
}

pub fn sum(data: &[f64]) -> f64 {
    data.iter().sum()
}

pub fn sum_of_squares(data: &[f64]) -> f64 {
    data.iter().map(|v| v * v).sum()
}

/// Linear interpolation of y at `x` on the line through `(x1, y1)` and `(x2, y2)`.
pub fn interpolate_y(x1: f64, y1: f64, x2: f64, y2: f64, x: f64) -> f64 {
    let m = (y2 - y1) / (x2 - x1);
    y1 + m * (x - x1)
}

/// Linear interpolation of x at `y` on the line through `(x1, y1)` and `(x2, y2)`.
pub fn interpolate_x(x1: f64, y1: f64, x2: f64, y2: f64, y: f64) -> f64 {
    let m = (x2 - x1) / (y2 - y1);
    x1 + m * (y - y1)
}

/// Modulus that is always in `[0, modulus)`. The modulus must be positive.
pub fn mod_positive(value: i64, modulus: i64) -> Result<i64> {
    if modulus <= 0 {
        return Err(GdscError::invalid_argument(format!(
            "modulus must be positive, got {}",
            modulus
        )));
    }
    Ok(value.rem_euclid(modulus))
}

/// Log-likelihood of a least-squares fit assuming Gaussian errors.
///
/// `ll = -n/2 * (ln(2π) + ln(ss/n) + 1)`
pub fn log_likelihood_from_ss(sum_of_squares: f64, n: usize) -> f64 {
    let n = n as f64;
    -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + (sum_of_squares / n).ln() + 1.0)
}

/// Akaike information criterion for `k` parameters.
pub fn aic(log_likelihood: f64, k: usize) -> f64 {
    2.0 * k as f64 - 2.0 * log_likelihood
}

/// Akaike information criterion with the small-sample correction.
///
/// Returns infinity when `n <= k + 1`, where the correction is undefined.
pub fn aicc(log_likelihood: f64, n: usize, k: usize) -> f64 {
    let base = aic(log_likelihood, k);
    if n <= k + 1 {
        return f64::INFINITY;
    }
    let k = k as f64;
    base + (2.0 * k * (k + 1.0)) / (n as f64 - k - 1.0)
}

/// Bayesian information criterion for `k` parameters and `n` observations.
pub fn bic(log_likelihood: f64, n: usize, k: usize) -> f64 {
    k as f64 * (n as f64).ln() - 2.0 * log_likelihood
}

/// Sum of squared deviations from the mean.
pub fn total_sum_of_squares(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mean = sum(data) / data.len() as f64;
    data.iter().map(|v| pow2(v - mean)).sum()
}

/// Adjusted R² for a fit with residual sum of squares `ssr`, total sum of squares
/// `sst`, `n` observations and `k` parameters.
pub fn adjusted_coefficient_of_determination(ssr: f64, sst: f64, n: usize, k: usize) -> f64 {
    let n = n as f64;
    let k = k as f64;
    1.0 - (ssr / sst) * ((n - 1.0) / (n - k - 1.0))
}

/// Round to a number of decimal places (half away from zero).
pub fn round_to_decimal_places(value: f64, decimal_places: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    if decimal_places < 0 {
        let scale = 10f64.powi(-decimal_places);
        return (value / scale).round() * scale;
    }
    let scale = 10f64.powi(decimal_places);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / scale
}

/// Round to a number of significant digits (half away from zero).
///
/// Zero and non-finite values are returned unchanged; `significant_digits` of zero
/// disables rounding.
pub fn round_to_significant(value: f64, significant_digits: u32) -> f64 {
    if significant_digits == 0 || value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let places = significant_digits as i32 - 1 - magnitude;
    round_to_decimal_places(value, places)
}
