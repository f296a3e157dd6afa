//! Priority queues keyed by `f64` distance.
//!
//! Keys are ordered with [`f64::total_cmp`], so NaN keys sort above every finite
//! distance instead of breaking the heap.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Debug, Clone)]
struct Keyed<T> {
    key: f64,
    item: T,
}

impl<T> PartialEq for Keyed<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key.total_cmp(&other.key) == Ordering::Equal
    }
}

impl<T> Eq for Keyed<T> {}

impl<T> PartialOrd for Keyed<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Keyed<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.total_cmp(&other.key)
    }
}

/// Keeps the `capacity` items with the smallest keys seen so far.
///
/// The largest kept key is at the top, so a new candidate only has to beat that
/// one to get in.
#[derive(Debug, Clone)]
pub struct BoundedMaxHeap<T> {
    heap: BinaryHeap<Keyed<T>>,
    capacity: usize,
}

impl<T> BoundedMaxHeap<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Add an item if there is room or its key is below the current maximum.
    /// Returns whether the item was kept.
    pub fn offer(&mut self, key: f64, item: T) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.heap.len() < self.capacity {
            self.heap.push(Keyed { key, item });
            return true;
        }
        match self.heap.peek_mut() {
            Some(mut top) if key.total_cmp(&top.key) == Ordering::Less => {
                *top = Keyed { key, item };
                true
            }
            _ => false,
        }
    }

    pub fn peek_max_key(&self) -> Option<f64> {
        self.heap.peek().map(|k| k.key)
    }

    /// Items in ascending key order.
    pub fn into_sorted_vec(self) -> Vec<(f64, T)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|k| (k.key, k.item))
            .collect()
    }

    /// Items in internal heap order.
    pub fn into_vec(self) -> Vec<(f64, T)> {
        self.heap
            .into_vec()
            .into_iter()
            .map(|k| (k.key, k.item))
            .collect()
    }
}

/// Unbounded min-heap keyed by distance.
#[derive(Debug, Clone)]
pub struct MinHeap<T> {
    heap: BinaryHeap<Reverse<Keyed<T>>>,
}

impl<T> Default for MinHeap<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }
}

impl<T> MinHeap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: f64, item: T) {
        self.heap.push(Reverse(Keyed { key, item }));
    }

    pub fn pop(&mut self) -> Option<(f64, T)> {
        self.heap.pop().map(|Reverse(k)| (k.key, k.item))
    }

    pub fn peek_key(&self) -> Option<f64> {
        self.heap.peek().map(|Reverse(k)| k.key)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
