//! Descriptive statistics accumulators.
//!
//! Three accumulators share the [`StatisticalSummary`] trait:
//!
//! - [`Statistics`] keeps the sum and sum of squares. Cheap and mergeable, but loses
//!   precision when values sit far from zero.
//! - [`RollingStatistics`] uses Welford's online update and is stable for large
//!   offsets.
//! - [`StoredDataStatistics`] additionally stores every value so that the median and
//!   percentiles are available.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Common read-only view of an accumulator.
pub trait StatisticalSummary {
    /// Number of values added
    fn n(&self) -> usize;
    fn sum(&self) -> f64;
    /// Sample variance (`n - 1` denominator); NaN when `n <= 1`
    fn variance(&self) -> f64;
    fn min(&self) -> f64;
    fn max(&self) -> f64;

    /// Arithmetic mean; NaN when empty
    fn mean(&self) -> f64 {
        if self.n() == 0 {
            f64::NAN
        } else {
            self.sum() / self.n() as f64
        }
    }

    fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Standard error of the mean
    fn standard_error(&self) -> f64 {
        if self.n() <= 1 {
            f64::NAN
        } else {
            self.standard_deviation() / (self.n() as f64).sqrt()
        }
    }
}

// Empty accumulators hold infinite bounds, which JSON cannot represent
fn positive_infinity() -> f64 {
    f64::INFINITY
}

fn negative_infinity() -> f64 {
    f64::NEG_INFINITY
}

fn is_positive_infinity(value: &f64) -> bool {
    *value == f64::INFINITY
}

fn is_negative_infinity(value: &f64) -> bool {
    *value == f64::NEG_INFINITY
}

/// Sum-based accumulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    n: usize,
    sum: f64,
    sum_sq: f64,
    #[serde(default = "positive_infinity", skip_serializing_if = "is_positive_infinity")]
    min: f64,
    #[serde(default = "negative_infinity", skip_serializing_if = "is_negative_infinity")]
    max: f64,
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

impl Statistics {
    pub fn new() -> Self {
        Self {
            n: 0,
            sum: 0.0,
            sum_sq: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn add(&mut self, value: f64) {
        self.n += 1;
        self.sum += value;
        self.sum_sq += value * value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn add_slice(&mut self, values: &[f64]) {
        for &v in values {
            self.add(v);
        }
    }

    /// Add the same value `n` times.
    pub fn add_count(&mut self, n: usize, value: f64) {
        if n == 0 {
            return;
        }
        self.n += n;
        self.sum += n as f64 * value;
        self.sum_sq += n as f64 * value * value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Merge another accumulator into this one.
    pub fn add_statistics(&mut self, other: &Statistics) {
        if other.n == 0 {
            return;
        }
        self.n += other.n;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn sum_of_squares(&self) -> f64 {
        self.sum_sq
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl StatisticalSummary for Statistics {
    fn n(&self) -> usize {
        self.n
    }

    fn sum(&self) -> f64 {
        self.sum
    }

    fn variance(&self) -> f64 {
        if self.n <= 1 {
            return f64::NAN;
        }
        let n = self.n as f64;
        let v = (self.sum_sq - (self.sum * self.sum) / n) / (n - 1.0);
        // Cancellation can produce a tiny negative value for constant data
        v.max(0.0)
    }

    fn min(&self) -> f64 {
        if self.n == 0 { f64::NAN } else { self.min }
    }

    fn max(&self) -> f64 {
        if self.n == 0 { f64::NAN } else { self.max }
    }
}

impl Extend<f64> for Statistics {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for v in iter {
            self.add(v);
        }
    }
}

impl FromIterator<f64> for Statistics {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::new();
        stats.extend(iter);
        stats
    }
}

/// Welford online accumulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingStatistics {
    n: usize,
    mean: f64,
    m2: f64,
    #[serde(default = "positive_infinity", skip_serializing_if = "is_positive_infinity")]
    min: f64,
    #[serde(default = "negative_infinity", skip_serializing_if = "is_negative_infinity")]
    max: f64,
}

impl Default for RollingStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingStatistics {
    pub fn new() -> Self {
        Self {
            n: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn add(&mut self, value: f64) {
        self.n += 1;
        let delta = value - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (value - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn add_slice(&mut self, values: &[f64]) {
        for &v in values {
            self.add(v);
        }
    }

    /// Add the same value `n` times.
    pub fn add_count(&mut self, n: usize, value: f64) {
        if n == 0 {
            return;
        }
        let other = RollingStatistics {
            n,
            mean: value,
            m2: 0.0,
            min: value,
            max: value,
        };
        self.add_statistics(&other);
    }

    /// Merge using the parallel combination of Chan et al.
    pub fn add_statistics(&mut self, other: &RollingStatistics) {
        if other.n == 0 {
            return;
        }
        if self.n == 0 {
            *self = other.clone();
            return;
        }
        let n_a = self.n as f64;
        let n_b = other.n as f64;
        let n = n_a + n_b;
        let delta = other.mean - self.mean;
        self.mean += delta * n_b / n;
        self.m2 += other.m2 + delta * delta * n_a * n_b / n;
        self.n += other.n;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl StatisticalSummary for RollingStatistics {
    fn n(&self) -> usize {
        self.n
    }

    fn sum(&self) -> f64 {
        self.mean * self.n as f64
    }

    fn mean(&self) -> f64 {
        if self.n == 0 { f64::NAN } else { self.mean }
    }

    fn variance(&self) -> f64 {
        if self.n <= 1 {
            f64::NAN
        } else {
            self.m2 / (self.n - 1) as f64
        }
    }

    fn min(&self) -> f64 {
        if self.n == 0 { f64::NAN } else { self.min }
    }

    fn max(&self) -> f64 {
        if self.n == 0 { f64::NAN } else { self.max }
    }
}

impl Extend<f64> for RollingStatistics {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for v in iter {
            self.add(v);
        }
    }
}

impl FromIterator<f64> for RollingStatistics {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::new();
        stats.extend(iter);
        stats
    }
}

/// Growable store of values supporting order statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredData {
    values: Vec<f64>,
}

impl StoredData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, value: f64) {
        self.values.push(value);
    }

    pub fn add_slice(&mut self, values: &[f64]) {
        self.values.extend_from_slice(values);
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn sorted_values(&self) -> Vec<f64> {
        let mut sorted = self.values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        sorted
    }

    /// Median; NaN when empty. Even counts average the two central values.
    pub fn median(&self) -> f64 {
        median(&self.values)
    }

    /// Percentile `p` in `[0, 100]` with linear interpolation between ranks.
    pub fn percentile(&self, p: f64) -> f64 {
        percentile(&self.sorted_values(), p)
    }
}

impl Extend<f64> for StoredData {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}

/// Accumulator that keeps every value for order statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredDataStatistics {
    stats: Statistics,
    data: StoredData,
}

impl StoredDataStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slice(values: &[f64]) -> Self {
        let mut s = Self::new();
        s.add_slice(values);
        s
    }

    pub fn add(&mut self, value: f64) {
        self.stats.add(value);
        self.data.add(value);
    }

    pub fn add_slice(&mut self, values: &[f64]) {
        self.stats.add_slice(values);
        self.data.add_slice(values);
    }

    pub fn values(&self) -> &[f64] {
        self.data.values()
    }

    pub fn sorted_values(&self) -> Vec<f64> {
        self.data.sorted_values()
    }

    pub fn median(&self) -> f64 {
        self.data.median()
    }

    pub fn percentile(&self, p: f64) -> f64 {
        self.data.percentile(p)
    }

    /// Snapshot of the headline values.
    pub fn summary(&self) -> Summary {
        Summary {
            n: self.n(),
            mean: self.mean(),
            standard_deviation: self.standard_deviation(),
            min: self.min(),
            max: self.max(),
            median: self.median(),
        }
    }
}

impl StatisticalSummary for StoredDataStatistics {
    fn n(&self) -> usize {
        self.stats.n()
    }

    fn sum(&self) -> f64 {
        self.stats.sum()
    }

    fn variance(&self) -> f64 {
        self.stats.variance()
    }

    fn min(&self) -> f64 {
        self.stats.min()
    }

    fn max(&self) -> f64 {
        self.stats.max()
    }
}

impl Extend<f64> for StoredDataStatistics {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for v in iter {
            self.add(v);
        }
    }
}

impl FromIterator<f64> for StoredDataStatistics {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut s = Self::new();
        s.extend(iter);
        s
    }
}

/// Headline statistics of a data set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub n: usize,
    pub mean: f64,
    pub standard_deviation: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

impl Summary {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Median of unsorted data; NaN when empty.
pub fn median(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let len = sorted.len();
    if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    }
}

/// Calculate percentile from sorted data
///
/// Uses linear interpolation between ranks
pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }

    let n = sorted_values.len();
    if n == 1 {
        return sorted_values[0];
    }

    let p = p.clamp(0.0, 100.0);
    let rank = (p / 100.0) * (n - 1) as f64;
    let lower_index = rank.floor() as usize;
    let upper_index = rank.ceil() as usize;

    if lower_index == upper_index {
        sorted_values[lower_index]
    } else {
        let lower_value = sorted_values[lower_index];
        let upper_value = sorted_values[upper_index];
        let fraction = rank - lower_index as f64;
        lower_value + fraction * (upper_value - lower_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_statistics_basic() {
        let stats: Statistics = [1.0, 2.0, 3.0, 4.0, 5.0].into_iter().collect();
        assert_eq!(stats.n(), 5);
        assert_relative_eq!(stats.mean(), 3.0);
        assert_relative_eq!(stats.variance(), 2.5);
        assert_relative_eq!(stats.standard_error(), (2.5f64).sqrt() / 5f64.sqrt());
        assert_eq!(stats.min(), 1.0);
        assert_eq!(stats.max(), 5.0);
    }

    #[test]
    fn test_empty_is_nan() {
        let stats = Statistics::new();
        assert!(stats.mean().is_nan());
        assert!(stats.variance().is_nan());
        assert!(stats.min().is_nan());

        let mut one = RollingStatistics::new();
        one.add(4.0);
        assert_eq!(one.mean(), 4.0);
        assert!(one.variance().is_nan());
    }

    #[test]
    fn test_json_round_trip_of_empty_and_filled() {
        let json = serde_json::to_string(&Statistics::new()).unwrap();
        assert!(!json.contains("null"));
        let empty: Statistics = serde_json::from_str(&json).unwrap();
        assert_eq!(empty.n(), 0);
        assert!(empty.min().is_nan());

        let mut rolling: RollingStatistics =
            serde_json::from_str(&serde_json::to_string(&RollingStatistics::new()).unwrap()).unwrap();
        rolling.add_slice(&[3.0, -1.0]);
        assert_eq!(rolling.min(), -1.0);
        assert_eq!(rolling.max(), 3.0);

        let back: RollingStatistics =
            serde_json::from_str(&serde_json::to_string(&rolling).unwrap()).unwrap();
        assert_eq!(back.n(), 2);
        assert_eq!(back.min(), -1.0);
        assert_eq!(back.max(), 3.0);
        assert_relative_eq!(back.mean(), 1.0);
    }

    #[test]
    fn test_constant_data_variance_not_negative() {
        let mut stats = Statistics::new();
        stats.add_count(1000, 0.1);
        assert!(stats.variance() >= 0.0);
    }

    #[test]
    fn test_rolling_matches_sum_based() {
        let values: Vec<f64> = (0..100).map(|i| (i as f64 * 0.37).sin() * 10.0).collect();
        let a: Statistics = values.iter().copied().collect();
        let b: RollingStatistics = values.iter().copied().collect();
        assert_relative_eq!(a.mean(), b.mean(), epsilon = 1e-12);
        assert_relative_eq!(a.variance(), b.variance(), epsilon = 1e-9);
    }

    #[test]
    fn test_rolling_stable_with_large_offset() {
        let offset = 1e9;
        let stats: RollingStatistics = [4.0, 7.0, 13.0, 16.0]
            .iter()
            .map(|v| v + offset)
            .collect();
        assert_relative_eq!(stats.variance(), 30.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rolling_merge() {
        let mut a: RollingStatistics = [1.0, 2.0, 3.0].into_iter().collect();
        let b: RollingStatistics = [4.0, 5.0].into_iter().collect();
        a.add_statistics(&b);
        assert_eq!(a.n(), 5);
        assert_relative_eq!(a.mean(), 3.0);
        assert_relative_eq!(a.variance(), 2.5, epsilon = 1e-12);

        let mut c = RollingStatistics::new();
        c.add_count(3, 2.0);
        assert_relative_eq!(c.variance(), 0.0);
        assert_eq!(c.n(), 3);
    }

    #[test]
    fn test_statistics_merge() {
        let mut a: Statistics = [1.0, 2.0].into_iter().collect();
        let b: Statistics = [3.0, 10.0].into_iter().collect();
        a.add_statistics(&b);
        assert_eq!(a.n(), 4);
        assert_eq!(a.max(), 10.0);
        assert_relative_eq!(a.sum(), 16.0);
    }

    #[test]
    fn test_median_and_percentile() {
        assert_relative_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
        assert_relative_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert!(median(&[]).is_nan());

        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&data, 0.0), 1.0);
        assert_eq!(percentile(&data, 50.0), 3.0);
        assert_eq!(percentile(&data, 100.0), 5.0);
        assert_relative_eq!(percentile(&data, 10.0), 1.4);
    }

    #[test]
    fn test_stored_data_statistics_summary() {
        let stats = StoredDataStatistics::from_slice(&[3.0, 1.0, 2.0, 10.0]);
        let summary = stats.summary();
        assert_eq!(summary.n, 4);
        assert_relative_eq!(summary.median, 2.5);
        assert_relative_eq!(summary.mean, 4.0);
        assert_eq!(stats.sorted_values(), vec![1.0, 2.0, 3.0, 10.0]);
        let json = summary.to_json().expect("json");
        assert!(json.contains("\"median\":2.5"));
    }
}
