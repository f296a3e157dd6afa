//! Rolling median estimators.
//!
//! [`MedianWindow`] computes the median at successive positions of a fixed data set,
//! using a window of `radius` values either side of the position (truncated at the
//! ends). It keeps the current window in a sorted cache so that a step of one
//! position costs two binary searches and two shifts instead of a full sort.
//!
//! [`LinkedMedianWindow`] holds the `n` most recent values of a stream in a sorted
//! doubly-linked list and tracks the median node, so the median is available in
//! constant time after each addition.

use crate::error::{GdscError, Result};
use num_traits::Float;
use std::cmp::Ordering;
use tracing::trace;

pub type FloatMedianWindow = MedianWindow<f32>;
pub type DoubleMedianWindow = MedianWindow<f64>;
pub type FloatLinkedMedianWindow = LinkedMedianWindow<f32>;
pub type DoubleLinkedMedianWindow = LinkedMedianWindow<f64>;

fn cmp<T: Float>(a: &T, b: &T) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

fn two<T: Float>() -> T {
    T::one() + T::one()
}

/// Median of a sorted slice; NaN when empty.
fn sorted_median<T: Float>(sorted: &[T]) -> T {
    let n = sorted.len();
    if n == 0 {
        return T::nan();
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / two()
    }
}

/// Rolling median over a fixed data set.
#[derive(Debug, Clone)]
pub struct MedianWindow<T> {
    data: Vec<T>,
    radius: usize,
    position: usize,
    /// Sorted copy of `data[cache_start..cache_end]`
    cache: Vec<T>,
    cache_start: usize,
    cache_end: usize,
}

impl<T: Float> MedianWindow<T> {
    /// Create a window over `data`. NaN values are rejected.
    pub fn new(data: Vec<T>, radius: usize) -> Result<Self> {
        if data.iter().any(|v| v.is_nan()) {
            return Err(GdscError::invalid_argument(
                "median window data must not contain NaN",
            ));
        }
        let capacity = radius.saturating_mul(2).saturating_add(1).min(data.len());
        Ok(Self {
            cache: Vec::with_capacity(capacity),
            data,
            radius,
            position: 0,
            cache_start: 0,
            cache_end: 0,
        })
    }

    pub fn from_slice(data: &[T], radius: usize) -> Result<Self> {
        Self::new(data.to_vec(), radius)
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_valid_position(&self) -> bool {
        self.position < self.data.len()
    }

    pub fn increment(&mut self) {
        self.position = self.position.saturating_add(1);
    }

    pub fn increment_by(&mut self, n: usize) {
        self.position = self.position.saturating_add(n);
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    fn window(&self) -> (usize, usize) {
        let start = self.position.saturating_sub(self.radius);
        let end = self
            .position
            .saturating_add(self.radius)
            .saturating_add(1)
            .min(self.data.len());
        (start, end)
    }

    /// Median of the window at the current position; NaN past the end of the data.
    pub fn median(&mut self) -> T {
        if !self.is_valid_position() {
            return T::nan();
        }
        let (start, end) = self.window();
        self.update_cache(start, end);
        sorted_median(&self.cache)
    }

    fn update_cache(&mut self, start: usize, end: usize) {
        if start == self.cache_start && end == self.cache_end && !self.cache.is_empty() {
            return;
        }
        let (old_start, old_end) = (self.cache_start, self.cache_end);
        let overlaps = !self.cache.is_empty() && start < old_end && old_start < end;
        // Values leaving and entering the window
        let removed = [(old_start, old_end.min(start)), (old_start.max(end), old_end)];
        let added = [(start, end.min(old_start)), (start.max(old_end), end)];
        let changes: usize = removed
            .iter()
            .chain(added.iter())
            .map(|&(a, b)| b.saturating_sub(a))
            .sum();

        if overlaps && changes <= self.radius.max(1).saturating_mul(2) {
            for &(a, b) in &removed {
                for i in a..b {
                    let v = self.data[i];
                    if let Ok(idx) = self.cache.binary_search_by(|x| cmp(x, &v)) {
                        self.cache.remove(idx);
                    }
                }
            }
            for &(a, b) in &added {
                for i in a..b {
                    let v = self.data[i];
                    let idx = self.cache.partition_point(|x| cmp(x, &v) == Ordering::Less);
                    self.cache.insert(idx, v);
                }
            }
        } else {
            trace!(start, end, changes, "rebuilding median window cache");
            self.cache.clear();
            self.cache.extend_from_slice(&self.data[start..end]);
            self.cache.sort_by(cmp);
        }
        self.cache_start = start;
        self.cache_end = end;
    }
}

const NONE: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
struct Node<T> {
    value: T,
    prev: usize,
    next: usize,
}

/// Rolling median of the most recent `n` values of a stream.
///
/// Nodes live in an arena indexed by their slot in the age ring, so the oldest value
/// is always `nodes[oldest]` and replacing it reuses the slot.
#[derive(Debug, Clone)]
pub struct LinkedMedianWindow<T> {
    nodes: Vec<Node<T>>,
    head: usize,
    tail: usize,
    /// Node at rank `(n - 1) / 2` in sorted order
    median: usize,
    oldest: usize,
}

impl<T: Float> LinkedMedianWindow<T> {
    /// Create a window holding `initial`, where `initial[0]` is the oldest value.
    pub fn new(initial: &[T]) -> Result<Self> {
        if initial.is_empty() {
            return Err(GdscError::invalid_argument(
                "linked median window needs at least one value",
            ));
        }
        if initial.iter().any(|v| v.is_nan()) {
            return Err(GdscError::invalid_argument(
                "linked median window values must not be NaN",
            ));
        }
        let n = initial.len();
        let mut nodes: Vec<Node<T>> = initial
            .iter()
            .map(|&value| Node {
                value,
                prev: NONE,
                next: NONE,
            })
            .collect();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| cmp(&initial[a], &initial[b]));
        for (rank, &slot) in order.iter().enumerate() {
            nodes[slot].prev = if rank == 0 { NONE } else { order[rank - 1] };
            nodes[slot].next = if rank + 1 == n { NONE } else { order[rank + 1] };
        }

        Ok(Self {
            head: order[0],
            tail: order[n - 1],
            median: order[(n - 1) / 2],
            nodes,
            oldest: 0,
        })
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Median of all values in the window.
    pub fn median(&self) -> T {
        let m = &self.nodes[self.median];
        if self.size() % 2 == 1 {
            m.value
        } else {
            (m.value + self.nodes[m.next].value) / two()
        }
    }

    pub fn min(&self) -> T {
        self.nodes[self.head].value
    }

    pub fn max(&self) -> T {
        self.nodes[self.tail].value
    }

    /// Replace the oldest value with `value`, returning the value removed.
    pub fn add(&mut self, value: T) -> Result<T> {
        if value.is_nan() {
            return Err(GdscError::invalid_argument("cannot add NaN to median window"));
        }
        let slot = self.oldest;
        let old_value = self.nodes[slot].value;
        self.oldest = (self.oldest + 1) % self.size();

        if self.size() == 1 {
            self.nodes[slot].value = value;
            return Ok(old_value);
        }

        let target_rank = (self.size() - 1) / 2;

        // Rank of the tracked median in the list once `slot` is unlinked
        let mut rank = target_rank;
        if slot == self.median {
            // The size is at least two so the median always has a successor
            self.median = self.nodes[slot].next;
        } else if self.is_before_median(slot) {
            rank -= 1;
        }
        self.unlink(slot);

        self.nodes[slot].value = value;
        let median_value = self.nodes[self.median].value;
        if cmp(&value, &median_value) == Ordering::Less {
            self.insert_before_median(slot);
            rank += 1;
        } else {
            self.insert_after_median(slot);
        }

        match rank.cmp(&target_rank) {
            Ordering::Greater => self.median = self.nodes[self.median].prev,
            Ordering::Less => self.median = self.nodes[self.median].next,
            Ordering::Equal => {}
        }
        Ok(old_value)
    }

    /// Median of the `k` oldest values (`k` is clamped to the window size).
    pub fn median_oldest(&self, k: usize) -> T {
        let n = self.size();
        let k = k.min(n);
        self.median_by_age(k, |age| age < k)
    }

    /// Median of the `k` youngest values (`k` is clamped to the window size).
    pub fn median_youngest(&self, k: usize) -> T {
        let n = self.size();
        let k = k.min(n);
        self.median_by_age(k, |age| age >= n - k)
    }

    /// Values in ascending order.
    pub fn values_sorted(&self) -> Vec<T> {
        self.iter_sorted().map(|i| self.nodes[i].value).collect()
    }

    /// Values from oldest to youngest.
    pub fn values(&self) -> Vec<T> {
        let n = self.size();
        (0..n)
            .map(|i| self.nodes[(self.oldest + i) % n].value)
            .collect()
    }

    fn age(&self, slot: usize) -> usize {
        let n = self.size();
        (slot + n - self.oldest) % n
    }

    fn median_by_age(&self, k: usize, selected: impl Fn(usize) -> bool) -> T {
        if k == 0 {
            return T::nan();
        }
        let lower = (k - 1) / 2;
        let upper = k / 2;
        let mut seen = 0;
        let mut lower_value = T::nan();
        for i in self.iter_sorted() {
            if !selected(self.age(i)) {
                continue;
            }
            if seen == lower {
                lower_value = self.nodes[i].value;
            }
            if seen == upper {
                return (lower_value + self.nodes[i].value) / two();
            }
            seen += 1;
        }
        T::nan()
    }

    fn iter_sorted(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(self.head), move |&i| {
            let next = self.nodes[i].next;
            (next != NONE).then_some(next)
        })
    }

    /// Whether `slot` sits before the median node in list order.
    fn is_before_median(&self, slot: usize) -> bool {
        let median_value = self.nodes[self.median].value;
        match cmp(&self.nodes[slot].value, &median_value) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => {
                // Ties: walk back through equal values from the median
                let mut i = self.nodes[self.median].prev;
                while i != NONE && cmp(&self.nodes[i].value, &median_value) == Ordering::Equal {
                    if i == slot {
                        return true;
                    }
                    i = self.nodes[i].prev;
                }
                false
            }
        }
    }

    fn unlink(&mut self, slot: usize) {
        let Node { prev, next, .. } = self.nodes[slot];
        if prev == NONE {
            self.head = next;
        } else {
            self.nodes[prev].next = next;
        }
        if next == NONE {
            self.tail = prev;
        } else {
            self.nodes[next].prev = prev;
        }
        self.nodes[slot].prev = NONE;
        self.nodes[slot].next = NONE;
    }

    /// Insert a value known to be below the median, after any equal values.
    fn insert_before_median(&mut self, slot: usize) {
        let value = self.nodes[slot].value;
        let mut p = self.nodes[self.median].prev;
        while p != NONE && cmp(&self.nodes[p].value, &value) == Ordering::Greater {
            p = self.nodes[p].prev;
        }
        self.link_after(p, slot);
    }

    /// Insert a value known to be at or above the median, after any equal values.
    fn insert_after_median(&mut self, slot: usize) {
        let value = self.nodes[slot].value;
        let mut p = self.median;
        loop {
            let next = self.nodes[p].next;
            if next == NONE || cmp(&self.nodes[next].value, &value) == Ordering::Greater {
                break;
            }
            p = next;
        }
        self.link_after(p, slot);
    }

    /// Link `slot` after node `p`, or at the head when `p` is `NONE`.
    fn link_after(&mut self, p: usize, slot: usize) {
        let next = if p == NONE {
            self.head
        } else {
            self.nodes[p].next
        };
        self.nodes[slot].prev = p;
        self.nodes[slot].next = next;
        if p == NONE {
            self.head = slot;
        } else {
            self.nodes[p].next = slot;
        }
        if next == NONE {
            self.tail = slot;
        } else {
            self.nodes[next].prev = slot;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn brute_median(values: &[f64]) -> f64 {
        let mut v = values.to_vec();
        v.sort_by(|a, b| a.partial_cmp(b).unwrap());
        sorted_median(&v)
    }

    #[test]
    fn test_median_window_truncates_at_ends() {
        let data = vec![5.0, 1.0, 4.0, 2.0, 3.0];
        let mut w = DoubleMedianWindow::new(data, 1).unwrap();
        // window [0,1] -> (5+1)/2
        assert_relative_eq!(w.median(), 3.0);
        w.increment();
        assert_relative_eq!(w.median(), 4.0);
        w.increment();
        assert_relative_eq!(w.median(), 2.0);
        w.increment_by(2);
        // window [3,4]
        assert_relative_eq!(w.median(), 2.5);
        w.increment();
        assert!(!w.is_valid_position());
        assert!(w.median().is_nan());
    }

    #[test]
    fn test_median_window_matches_brute_force() {
        let data: Vec<f64> = (0..200).map(|i| ((i * 37) % 101) as f64 * 0.5).collect();
        for radius in [0, 1, 3, 10] {
            let mut w = DoubleMedianWindow::from_slice(&data, radius).unwrap();
            for p in 0..data.len() {
                let start = p.saturating_sub(radius);
                let end = (p + radius + 1).min(data.len());
                assert_relative_eq!(w.median(), brute_median(&data[start..end]));
                w.increment();
            }
        }
    }

    #[test]
    fn test_median_window_random_jumps() {
        let data: Vec<f32> = (0..64).map(|i| ((i * 13) % 17) as f32).collect();
        let mut w = FloatMedianWindow::new(data.clone(), 4).unwrap();
        for p in [10usize, 11, 3, 40, 41, 39, 63, 0] {
            w.set_position(p);
            let start = p.saturating_sub(4);
            let end = (p + 5).min(data.len());
            let expected: Vec<f64> = data[start..end].iter().map(|&v| v as f64).collect();
            assert_relative_eq!(w.median() as f64, brute_median(&expected));
        }
    }

    #[test]
    fn test_median_window_with_huge_radius_and_position() {
        let data = vec![4.0, 1.0, 3.0, 2.0];
        let mut w = DoubleMedianWindow::new(data, usize::MAX).unwrap();
        assert_relative_eq!(w.median(), 2.5);
        w.increment_by(2);
        assert_relative_eq!(w.median(), 2.5);
        w.set_position(usize::MAX - 1);
        w.increment_by(10);
        assert_eq!(w.position(), usize::MAX);
        assert!(w.median().is_nan());
    }

    #[test]
    fn test_median_window_rejects_nan() {
        assert!(DoubleMedianWindow::new(vec![1.0, f64::NAN], 1).is_err());
    }

    #[test]
    fn test_linked_window_initial_median() {
        let w = DoubleLinkedMedianWindow::new(&[3.0, 1.0, 2.0]).unwrap();
        assert_relative_eq!(w.median(), 2.0);
        let w = DoubleLinkedMedianWindow::new(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_relative_eq!(w.median(), 2.5);
        assert!(DoubleLinkedMedianWindow::new(&[]).is_err());
    }

    #[test]
    fn test_linked_window_streaming_matches_brute_force() {
        for size in [1usize, 2, 5, 8] {
            let stream: Vec<f64> = (0..300).map(|i| ((i * 7919) % 23) as f64).collect();
            let mut w = DoubleLinkedMedianWindow::new(&stream[..size]).unwrap();
            for i in size..stream.len() {
                let removed = w.add(stream[i]).unwrap();
                assert_eq!(removed, stream[i - size]);
                let window = &stream[i + 1 - size..=i];
                assert_relative_eq!(w.median(), brute_median(window));
                assert_eq!(w.values(), window.to_vec());
                assert_eq!(w.min(), window.iter().copied().fold(f64::INFINITY, f64::min));
                assert_eq!(w.max(), window.iter().copied().fold(f64::NEG_INFINITY, f64::max));
            }
        }
    }

    #[test]
    fn test_linked_window_oldest_youngest() {
        let w = DoubleLinkedMedianWindow::new(&[1.0, 9.0, 2.0, 8.0, 3.0]).unwrap();
        assert_relative_eq!(w.median_oldest(2), 5.0);
        assert_relative_eq!(w.median_oldest(3), 2.0);
        assert_relative_eq!(w.median_youngest(2), 5.5);
        assert_relative_eq!(w.median_youngest(100), w.median());
        assert!(w.median_oldest(0).is_nan());
    }

    #[test]
    fn test_linked_window_rejects_nan() {
        let mut w = FloatLinkedMedianWindow::new(&[1.0, 2.0]).unwrap();
        assert!(w.add(f32::NAN).is_err());
        assert_eq!(w.values_sorted(), vec![1.0, 2.0]);
    }
}
