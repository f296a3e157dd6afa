//! Helpers for numeric slices.

use crate::error::{GdscError, Result};
use itertools::Itertools;
use std::cmp::Ordering;

/// `[0, 1, ..., n-1]`
pub fn natural_order(n: usize) -> Vec<usize> {
    (0..n).collect()
}

/// `n` values starting at `start` separated by `increment`.
pub fn new_array(n: usize, start: f64, increment: f64) -> Vec<f64> {
    (0..n).map(|i| start + i as f64 * increment).collect()
}

/// Sorted unique copy of the data.
pub fn flatten(data: &[i32]) -> Vec<i32> {
    data.iter().copied().sorted_unstable().dedup().collect()
}

/// True if every consecutive difference equals the first within `tolerance`.
///
/// Slices of fewer than three values are trivially uniform.
pub fn is_uniform(data: &[f64], tolerance: f64) -> bool {
    if data.len() < 3 {
        return true;
    }
    let reference = data[1] - data[0];
    data.iter()
        .tuple_windows()
        .all(|(a, b)| ((b - a) - reference).abs() <= tolerance)
}

pub fn is_integers(data: &[f64]) -> bool {
    data.iter().all(|v| v.is_finite() && v.fract() == 0.0)
}

/// Replace non-positive values with the smallest strictly positive value.
///
/// When nothing is positive the data is left unchanged.
pub fn ensure_strictly_positive(data: &mut [f32]) {
    let min_positive = data
        .iter()
        .copied()
        .filter(|&v| v > 0.0)
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    if let Some(min) = min_positive {
        for v in data.iter_mut() {
            if !(*v > 0.0) {
                *v = min;
            }
        }
    }
}

/// Runs of consecutive integers in sorted unique data, as inclusive `(start, end)`.
pub fn get_ranges(data: &[i32]) -> Vec<(i32, i32)> {
    let flat = flatten(data);
    let mut ranges = Vec::new();
    let mut iter = flat.into_iter();
    let Some(first) = iter.next() else {
        return ranges;
    };
    let (mut start, mut end) = (first, first);
    for v in iter {
        if v == end + 1 {
            end = v;
        } else {
            ranges.push((start, end));
            start = v;
            end = v;
        }
    }
    ranges.push((start, end));
    ranges
}

/// Index of the first minimum, ignoring NaN.
pub fn find_min_index(data: &[f64]) -> Option<usize> {
    data.iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b <= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Index of the first maximum, ignoring NaN.
pub fn find_max_index(data: &[f64]) -> Option<usize> {
    data.iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

pub fn find_min_max_index(data: &[f64]) -> Option<(usize, usize)> {
    Some((find_min_index(data)?, find_max_index(data)?))
}

pub fn reverse<T>(data: &mut [T]) {
    data.reverse();
}

pub fn swap<T>(data: &mut [T], i: usize, j: usize) {
    data.swap(i, j);
}

pub fn multiply(data: &mut [f64], factor: f64) {
    data.iter_mut().for_each(|v| *v *= factor);
}

pub fn add(data: &mut [f64], value: f64) {
    data.iter_mut().for_each(|v| *v += value);
}

pub fn to_f32(data: &[f64]) -> Vec<f32> {
    data.iter().map(|&v| v as f32).collect()
}

pub fn to_f64(data: &[f32]) -> Vec<f64> {
    data.iter().map(|&v| v as f64).collect()
}

/// True if any value is non-zero.
pub fn has_data(data: &[f32]) -> bool {
    data.iter().any(|&v| v != 0.0)
}

pub fn is_finite(data: &[f64]) -> bool {
    data.iter().all(|v| v.is_finite())
}

/// Stable sort of `indices` by the value each one points at.
///
/// Every index must be in bounds of `values`.
pub fn sort_indices(indices: &mut [usize], values: &[f64], descending: bool) -> Result<()> {
    if let Some(&bad) = indices.iter().find(|&&i| i >= values.len()) {
        return Err(GdscError::invalid_argument(format!(
            "index {} out of bounds for {} values",
            bad,
            values.len()
        )));
    }
    indices.sort_by(|&a, &b| {
        let ord = values[a].total_cmp(&values[b]);
        if descending { ord.reverse() } else { ord }
    });
    Ok(())
}
