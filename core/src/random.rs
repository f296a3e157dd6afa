//! Random sampling adapters over any [`rand::Rng`].

use crate::error::{GdscError, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use rustc_hash::FxHashSet;

/// Fisher-Yates shuffle in place.
pub fn shuffle<T, R: Rng + ?Sized>(data: &mut [T], rng: &mut R) {
    data.shuffle(rng);
}

/// Draw `k` distinct values from `0..n` in random order.
///
/// Uses a partial Fisher-Yates shuffle when `k` is a large fraction of `n` and
/// rejection sampling otherwise, so memory stays proportional to `k`.
pub fn sample<R: Rng + ?Sized>(k: usize, n: usize, rng: &mut R) -> Result<Vec<usize>> {
    if k > n {
        return Err(GdscError::invalid_argument(format!(
            "cannot sample {} distinct values from {}",
            k, n
        )));
    }
    if k == 0 {
        return Ok(Vec::new());
    }
    if k > n / 4 {
        let mut values: Vec<usize> = (0..n).collect();
        for i in 0..k {
            let j = rng.random_range(i..n);
            values.swap(i, j);
        }
        values.truncate(k);
        return Ok(values);
    }
    let mut seen = FxHashSet::default();
    let mut out = Vec::with_capacity(k);
    while out.len() < k {
        let v = rng.random_range(0..n);
        if seen.insert(v) {
            out.push(v);
        }
    }
    Ok(out)
}

/// Repeatedly samples `k` of `n` indices.
#[derive(Debug, Clone, Copy)]
pub struct PermutationSampler {
    n: usize,
    k: usize,
}

impl PermutationSampler {
    pub fn new(n: usize, k: usize) -> Result<Self> {
        if k > n {
            return Err(GdscError::invalid_argument(format!(
                "permutation size {} exceeds domain {}",
                k, n
            )));
        }
        Ok(Self { n, k })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<usize> {
        // k <= n is checked at construction
        sample(self.k, self.n, rng).unwrap_or_default()
    }
}

/// Normal deviates from a uniform source via the Box-Muller transform.
///
/// Each transform yields two independent deviates; the second is cached for the
/// next call.
#[derive(Debug)]
pub struct GaussianSampler<R> {
    rng: R,
    mean: f64,
    standard_deviation: f64,
    next: Option<f64>,
}

impl<R: Rng> GaussianSampler<R> {
    pub fn new(rng: R, mean: f64, standard_deviation: f64) -> Result<Self> {
        if standard_deviation.is_nan() || standard_deviation < 0.0 || !mean.is_finite() {
            return Err(GdscError::invalid_argument(format!(
                "invalid normal distribution N({}, {}²)",
                mean, standard_deviation
            )));
        }
        Ok(Self {
            rng,
            mean,
            standard_deviation,
            next: None,
        })
    }

    /// Standard normal deviate.
    pub fn next_standard(&mut self) -> f64 {
        if let Some(z) = self.next.take() {
            return z;
        }
        // u1 in (0, 1] so the log is finite
        let u1 = 1.0 - self.rng.random::<f64>();
        let u2: f64 = self.rng.random();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * std::f64::consts::PI * u2;
        self.next = Some(r * theta.sin());
        r * theta.cos()
    }

    pub fn sample(&mut self) -> f64 {
        self.mean + self.standard_deviation * self.next_standard()
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

/// Shorthand for [`GaussianSampler::new`].
pub fn gaussian<R: Rng>(rng: R, mean: f64, standard_deviation: f64) -> Result<GaussianSampler<R>> {
    GaussianSampler::new(rng, mean, standard_deviation)
}
