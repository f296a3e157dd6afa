//! Host-independent pixel helpers for row-major `f32` images.

use crate::error::{GdscError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Region {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Overlap of two regions; empty regions have zero size at the clamped origin.
    pub fn intersection(&self, other: &Region) -> Region {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        Region {
            x,
            y,
            width: right.saturating_sub(x),
            height: bottom.saturating_sub(y),
        }
    }
}

/// Read-only view of an image used to cut out sub-regions.
#[derive(Debug, Clone, Copy)]
pub struct ImageExtractor<'a> {
    data: &'a [f32],
    width: usize,
    height: usize,
}

impl<'a> ImageExtractor<'a> {
    pub fn new(data: &'a [f32], width: usize, height: usize) -> Result<Self> {
        if data.len() != width * height {
            return Err(GdscError::dimension_mismatch(width * height, data.len()));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> Region {
        Region::new(0, 0, self.width, self.height)
    }

    /// Square region of side `2 * radius + 1` centred on `(x, y)`, clipped to the image.
    pub fn box_region(&self, x: usize, y: usize, radius: usize) -> Region {
        let x0 = x.saturating_sub(radius);
        let y0 = y.saturating_sub(radius);
        let x1 = (x + radius + 1).min(self.width);
        let y1 = (y + radius + 1).min(self.height);
        Region::new(
            x0.min(x1),
            y0.min(y1),
            x1.saturating_sub(x0),
            y1.saturating_sub(y0),
        )
    }

    /// Copy the pixels of `region` (clipped to the image) in row-major order.
    pub fn crop(&self, region: &Region) -> Vec<f32> {
        let region = region.intersection(&self.bounds());
        let mut out = Vec::with_capacity(region.area());
        for row in region.y..region.y + region.height {
            let start = row * self.width + region.x;
            out.extend_from_slice(&self.data[start..start + region.width]);
        }
        out
    }

    pub fn crop_f64(&self, region: &Region) -> Vec<f64> {
        self.crop(region).into_iter().map(f64::from).collect()
    }
}

/// Hann window of `n` points: `0.5 - 0.5 cos(2πi / (n - 1))`.
pub fn hanning(n: usize) -> Vec<f64> {
    window(n, |f| 0.5 - 0.5 * (2.0 * PI * f).cos())
}

/// Sine window of `n` points: `sin(πi / (n - 1))`.
pub fn cosine(n: usize) -> Vec<f64> {
    window(n, |f| (PI * f).sin())
}

/// Tapered cosine window. `alpha = 0` is rectangular, `alpha = 1` is Hann.
pub fn tukey(n: usize, alpha: f64) -> Vec<f64> {
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha == 0.0 {
        return vec![1.0; n];
    }
    let half = alpha / 2.0;
    window(n, |f| {
        if f < half {
            0.5 * (1.0 + (PI * (f / half - 1.0)).cos())
        } else if f > 1.0 - half {
            0.5 * (1.0 + (PI * ((f - 1.0) / half + 1.0)).cos())
        } else {
            1.0
        }
    })
}

/// Evaluate `f` at `i / (n - 1)` for each of the `n` points.
fn window(n: usize, f: impl Fn(f64) -> f64) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let last = (n - 1) as f64;
            (0..n).map(|i| f(i as f64 / last)).collect()
        }
    }
}

/// Multiply each pixel by the separable 2D window `w(x) * w(y)`.
pub fn apply_window(
    data: &[f32],
    width: usize,
    height: usize,
    window_fn: impl Fn(usize) -> Vec<f64>,
) -> Result<Vec<f32>> {
    if data.len() != width * height {
        return Err(GdscError::dimension_mismatch(width * height, data.len()));
    }
    let wx = window_fn(width);
    let wy = window_fn(height);
    if wx.len() != width || wy.len() != height {
        return Err(GdscError::invalid_argument(
            "window function returned the wrong number of weights",
        ));
    }
    Ok(data
        .chunks_exact(width.max(1))
        .zip(&wy)
        .flat_map(|(row, &fy)| row.iter().zip(&wx).map(move |(&v, &fx)| (v as f64 * fx * fy) as f32))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(width: usize, height: usize) -> Vec<f32> {
        (0..width * height).map(|i| i as f32).collect()
    }

    #[test]
    fn test_box_region_is_clipped() {
        let data = ramp(5, 4);
        let image = ImageExtractor::new(&data, 5, 4).unwrap();
        assert_eq!(image.box_region(2, 2, 1), Region::new(1, 1, 3, 3));
        assert_eq!(image.box_region(0, 0, 2), Region::new(0, 0, 3, 3));
        assert_eq!(image.box_region(4, 3, 2), Region::new(2, 1, 3, 3));
    }

    #[test]
    fn test_crop() {
        let data = ramp(5, 4);
        let image = ImageExtractor::new(&data, 5, 4).unwrap();
        assert_eq!(image.crop(&Region::new(1, 1, 2, 2)), vec![6.0, 7.0, 11.0, 12.0]);
        // Partially outside
        assert_eq!(image.crop(&Region::new(4, 2, 3, 5)), vec![14.0, 19.0]);
        assert!(image.crop(&Region::new(10, 10, 2, 2)).is_empty());
        assert!(ImageExtractor::new(&data, 4, 4).is_err());
    }

    #[test]
    fn test_intersection() {
        let a = Region::new(0, 0, 4, 4);
        let b = Region::new(2, 3, 4, 4);
        assert_eq!(a.intersection(&b), Region::new(2, 3, 2, 1));
        assert!(a.intersection(&Region::new(5, 5, 1, 1)).is_empty());
    }

    #[test]
    fn test_windows() {
        let h = hanning(5);
        assert_relative_eq!(h[0], 0.0);
        assert_relative_eq!(h[2], 1.0);
        assert_relative_eq!(h[1], 0.5, epsilon = 1e-12);
        let c = cosine(3);
        assert_relative_eq!(c[1], 1.0);
        assert_relative_eq!(c[0], 0.0, epsilon = 1e-12);
        assert_eq!(tukey(4, 0.0), vec![1.0; 4]);
        let t = tukey(11, 0.5);
        assert_relative_eq!(t[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(t[5], 1.0);
        for (a, b) in tukey(9, 1.0).iter().zip(hanning(9)) {
            assert_relative_eq!(*a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_apply_window() {
        let data = vec![1.0f32; 9];
        let out = apply_window(&data, 3, 3, hanning).unwrap();
        assert_relative_eq!(out[4], 1.0);
        assert_relative_eq!(out[0], 0.0);
        assert!(apply_window(&data, 2, 3, hanning).is_err());
    }
}
