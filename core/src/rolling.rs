//! Fixed-capacity circular buffers with running totals.

use crate::error::{GdscError, Result};

/// Circular buffer of the most recent `capacity` values with a running sum.
#[derive(Debug, Clone)]
pub struct RollingArray {
    data: Vec<f64>,
    index: usize,
    count: usize,
    sum: f64,
}

impl RollingArray {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(GdscError::invalid_argument("capacity must be positive"));
        }
        Ok(Self {
            data: vec![0.0; capacity],
            index: 0,
            count: 0,
            sum: 0.0,
        })
    }

    /// Add a value, evicting the oldest when full.
    pub fn add(&mut self, value: f64) {
        self.sum -= self.data[self.index];
        self.sum += value;
        self.data[self.index] = value;
        self.index = (self.index + 1) % self.data.len();
        if self.count < self.data.len() {
            self.count += 1;
        }
    }

    /// Add the same value `n` times.
    pub fn add_count(&mut self, value: f64, n: usize) {
        let capacity = self.data.len();
        if n >= capacity {
            self.data.fill(value);
            self.sum = value * capacity as f64;
            self.count = capacity;
            self.index = 0;
            return;
        }
        for _ in 0..n {
            self.add(value);
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Mean of the held values; NaN when empty.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn is_full(&self) -> bool {
        self.count == self.data.len()
    }

    /// Held values from oldest to youngest.
    pub fn to_vec(&self) -> Vec<f64> {
        let capacity = self.data.len();
        let start = (self.index + capacity - self.count) % capacity;
        (0..self.count)
            .map(|i| self.data[(start + i) % capacity])
            .collect()
    }

    pub fn clear(&mut self) {
        self.data.fill(0.0);
        self.index = 0;
        self.count = 0;
        self.sum = 0.0;
    }
}

/// Circular buffer of booleans tracking how many are `true`.
#[derive(Debug, Clone)]
pub struct BooleanRollingArray {
    data: Vec<bool>,
    index: usize,
    count: usize,
    true_count: usize,
}

impl BooleanRollingArray {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(GdscError::invalid_argument("capacity must be positive"));
        }
        Ok(Self {
            data: vec![false; capacity],
            index: 0,
            count: 0,
            true_count: 0,
        })
    }

    pub fn add(&mut self, value: bool) {
        if self.data[self.index] {
            self.true_count -= 1;
        }
        if value {
            self.true_count += 1;
        }
        self.data[self.index] = value;
        self.index = (self.index + 1) % self.data.len();
        if self.count < self.data.len() {
            self.count += 1;
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn true_count(&self) -> usize {
        self.true_count
    }

    pub fn false_count(&self) -> usize {
        self.count - self.true_count
    }

    pub fn is_full(&self) -> bool {
        self.count == self.data.len()
    }

    pub fn clear(&mut self) {
        self.data.fill(false);
        self.index = 0;
        self.count = 0;
        self.true_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(RollingArray::new(0).is_err());
        assert!(BooleanRollingArray::new(0).is_err());
    }

    #[test]
    fn test_rolling_sum_evicts_oldest() {
        let mut r = RollingArray::new(3).unwrap();
        assert!(r.average().is_nan());
        for v in [1.0, 2.0, 3.0, 4.0] {
            r.add(v);
        }
        assert!(r.is_full());
        assert_relative_eq!(r.sum(), 9.0);
        assert_relative_eq!(r.average(), 3.0);
        assert_eq!(r.to_vec(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_partial_to_vec_order() {
        let mut r = RollingArray::new(5).unwrap();
        r.add(1.0);
        r.add(2.0);
        assert_eq!(r.count(), 2);
        assert_eq!(r.to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_add_count_saturates() {
        let mut r = RollingArray::new(4).unwrap();
        r.add(10.0);
        r.add_count(2.0, 10);
        assert_relative_eq!(r.sum(), 8.0);
        assert_eq!(r.to_vec(), vec![2.0; 4]);
        r.add(6.0);
        assert_eq!(r.to_vec(), vec![2.0, 2.0, 2.0, 6.0]);
    }

    #[test]
    fn test_boolean_rolling_counts() {
        let mut r = BooleanRollingArray::new(3).unwrap();
        for v in [true, false, true, true] {
            r.add(v);
        }
        // window holds [false, true, true]
        assert_eq!(r.true_count(), 2);
        assert_eq!(r.false_count(), 1);
        r.clear();
        assert_eq!(r.count(), 0);
    }
}
