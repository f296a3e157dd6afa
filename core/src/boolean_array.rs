//! Growable bit-packed boolean list.

use crate::error::{GdscError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

const BITS: usize = 64;

/// Booleans packed 64 per word.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBooleanArray")]
pub struct BooleanArray {
    words: Vec<u64>,
    len: usize,
}

/// Unchecked serialized form of [`BooleanArray`].
#[derive(Deserialize)]
struct RawBooleanArray {
    words: Vec<u64>,
    len: usize,
}

impl TryFrom<RawBooleanArray> for BooleanArray {
    type Error = GdscError;

    fn try_from(raw: RawBooleanArray) -> Result<Self> {
        let RawBooleanArray { mut words, len } = raw;
        let needed = len.div_ceil(BITS);
        if words.len() < needed {
            return Err(GdscError::insufficient_data(needed, words.len()));
        }
        words.truncate(needed);
        // Bits past len must be zero for true_count
        if let Some(last) = words.last_mut().filter(|_| len % BITS != 0) {
            *last &= (1u64 << (len % BITS)) - 1;
        }
        Ok(Self { words, len })
    }
}

impl BooleanArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: Vec::with_capacity(capacity.div_ceil(BITS)),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn add(&mut self, value: bool) {
        let (word, bit) = (self.len / BITS, self.len % BITS);
        if word == self.words.len() {
            self.words.push(0);
        }
        if value {
            self.words[word] |= 1u64 << bit;
        }
        self.len += 1;
    }

    pub fn add_slice(&mut self, values: &[bool]) {
        self.words.reserve((self.len + values.len()).div_ceil(BITS).saturating_sub(self.words.len()));
        for &v in values {
            self.add(v);
        }
    }

    /// `None` when `index` is out of range.
    pub fn get(&self, index: usize) -> Option<bool> {
        (index < self.len).then(|| self.words[index / BITS] & (1u64 << (index % BITS)) != 0)
    }

    /// Overwrite an existing element. Returns `false` when `index` is out of range.
    pub fn set(&mut self, index: usize, value: bool) -> bool {
        if index >= self.len {
            return false;
        }
        let mask = 1u64 << (index % BITS);
        if value {
            self.words[index / BITS] |= mask;
        } else {
            self.words[index / BITS] &= !mask;
        }
        true
    }

    pub fn clear(&mut self) {
        self.words.clear();
        self.len = 0;
    }

    /// Number of `true` elements. Bits past `len` are always zero.
    pub fn true_count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(|i| self.words[i / BITS] & (1u64 << (i % BITS)) != 0)
    }

    pub fn to_vec(&self) -> Vec<bool> {
        self.iter().collect()
    }
}

impl FromIterator<bool> for BooleanArray {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut array = BooleanArray::new();
        for v in iter {
            array.add(v);
        }
        array
    }
}

/// [`BooleanArray`] behind a mutex for appends from several threads.
#[derive(Debug, Default)]
pub struct SharedBooleanArray {
    inner: Mutex<BooleanArray>,
}

impl SharedBooleanArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(BooleanArray::with_capacity(capacity)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BooleanArray> {
        // A panic while holding the guard cannot leave the array inconsistent
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add(&self, value: bool) {
        self.lock().add(value);
    }

    pub fn add_slice(&self, values: &[bool]) {
        self.lock().add_slice(values);
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.lock().get(index)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn to_vec(&self) -> Vec<bool> {
        self.lock().to_vec()
    }

    pub fn into_inner(self) -> BooleanArray {
        self.inner.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_add_get_set_across_word_boundary() {
        let mut array = BooleanArray::with_capacity(10);
        let values: Vec<bool> = (0..130).map(|i| i % 3 == 0).collect();
        array.add_slice(&values);
        assert_eq!(array.len(), 130);
        assert_eq!(array.to_vec(), values);
        assert_eq!(array.true_count(), 44);
        assert_eq!(array.get(129), Some(true));
        assert_eq!(array.get(130), None);

        assert!(array.set(64, true));
        assert!(array.set(63, false));
        assert!(!array.set(130, true));
        assert_eq!(array.get(64), Some(true));
        assert_eq!(array.get(63), Some(false));

        array.clear();
        assert!(array.is_empty());
        assert_eq!(array.true_count(), 0);
    }

    #[test]
    fn test_serde_round_trip() {
        let array: BooleanArray = (0..70).map(|i| i % 3 == 0).collect();
        let json = serde_json::to_string(&array).unwrap();
        let back: BooleanArray = serde_json::from_str(&json).unwrap();
        assert_eq!(back, array);
        assert_eq!(back.true_count(), 24);
    }

    #[test]
    fn test_deserialize_checks_length_and_tail_bits() {
        assert!(serde_json::from_str::<BooleanArray>(r#"{"words":[],"len":5}"#).is_err());

        let array: BooleanArray = serde_json::from_str(r#"{"words":[255],"len":2}"#).unwrap();
        assert_eq!(array.true_count(), 2);
        assert_eq!(array.to_vec(), vec![true, true]);

        // Surplus words are dropped
        let mut array: BooleanArray = serde_json::from_str(r#"{"words":[1,7],"len":1}"#).unwrap();
        assert_eq!(array.true_count(), 1);
        array.add_slice(&[false; 64]);
        assert_eq!(array.true_count(), 1);
        assert_eq!(array.len(), 65);
    }

    #[test]
    fn test_shared_concurrent_append() {
        let shared = SharedBooleanArray::new();
        (0..1_000).into_par_iter().for_each(|i| shared.add(i % 2 == 0));
        let array = shared.into_inner();
        assert_eq!(array.len(), 1_000);
        assert_eq!(array.true_count(), 500);
    }
}
