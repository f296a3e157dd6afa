//! End-to-end checks combining the image helpers with noise estimation,
//! sampling and spot matching.

use anyhow::Result;
use gdsc_core::image::{ImageExtractor, Region, apply_window, tukey};
use gdsc_core::matching::MatchCalculator;
use gdsc_core::noise::{NoiseEstimator, NoiseEstimatorConfigBuilder, NoiseMethod};
use gdsc_core::random::{GaussianSampler, sample};
use rand::SeedableRng;
use rand::rngs::StdRng;
use strum::IntoEnumIterator;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const WIDTH: usize = 96;
const HEIGHT: usize = 80;
const SIGMA: f64 = 4.0;

/// Route debug logs to the test output; set `RUST_LOG=gdsc_core=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env())
        .try_init();
}

/// Flat background with Gaussian noise and a few bright square spots.
fn synthetic_image(seed: u64) -> Result<(Vec<f32>, Vec<(f64, f64)>)> {
    let mut noise = GaussianSampler::new(StdRng::seed_from_u64(seed), 100.0, SIGMA)?;
    let mut data: Vec<f32> = (0..WIDTH * HEIGHT).map(|_| noise.sample() as f32).collect();

    let mut rng = StdRng::seed_from_u64(seed + 1);
    let mut spots = Vec::new();
    for index in sample(6, (WIDTH - 8) * (HEIGHT - 8), &mut rng)? {
        let x = 4 + index % (WIDTH - 8);
        let y = 4 + index / (WIDTH - 8);
        for dy in 0..2 {
            for dx in 0..2 {
                data[(y + dy) * WIDTH + x + dx] += 400.0;
            }
        }
        spots.push((x as f64 + 0.5, y as f64 + 0.5));
    }
    Ok((data, spots))
}

#[test]
fn test_noise_estimates_of_cropped_background() -> Result<()> {
    init_tracing();
    let (data, _) = synthetic_image(5)?;
    let image = ImageExtractor::new(&data, WIDTH, HEIGHT)?;
    let region = image.box_region(WIDTH / 2, HEIGHT / 2, 30);
    assert_eq!(region, Region::new(18, 10, 61, 61));

    let crop = image.crop(&region);
    let config = NoiseEstimatorConfigBuilder::default()
        .preserve_residuals(false)
        .build()?;
    let estimator = NoiseEstimator::with_config(crop, region.width, region.height, config)?;

    // Residual methods are robust to the few spots that fall inside the crop
    for method in [
        NoiseMethod::ResidualsLeastMedianOfSquares,
        NoiseMethod::ResidualsLeastTrimmedOfSquares,
        NoiseMethod::QuickResidualsLeastMedianOfSquares,
        NoiseMethod::QuickResidualsLeastTrimmedOfSquares,
    ] {
        let sigma = estimator.estimate_noise(method)?;
        assert!(
            (sigma - SIGMA).abs() < 0.15 * SIGMA,
            "{} estimated {:.3}, expected about {}",
            method,
            sigma,
            SIGMA
        );
    }

    let all = estimator.estimate_noise_all()?;
    assert_eq!(all.len(), NoiseMethod::iter().count());
    assert!(all.iter().all(|(_, s)| s.is_finite() && *s >= 0.0));
    Ok(())
}

#[test]
fn test_windowed_image_keeps_centre() -> Result<()> {
    init_tracing();
    let (data, _) = synthetic_image(9)?;
    let windowed = apply_window(&data, WIDTH, HEIGHT, |n| tukey(n, 0.25))?;
    assert_eq!(windowed.len(), data.len());
    assert_eq!(windowed[0], 0.0);
    let centre = (HEIGHT / 2) * WIDTH + WIDTH / 2;
    assert_eq!(windowed[centre], data[centre]);
    Ok(())
}

#[test]
fn test_spot_candidates_match_ground_truth() -> Result<()> {
    init_tracing();
    let (data, spots) = synthetic_image(13)?;

    // Crude detector: local 2x2 sums far above background
    let mut candidates = Vec::new();
    for y in 0..HEIGHT - 1 {
        for x in 0..WIDTH - 1 {
            let sum: f32 = [0, 1, WIDTH, WIDTH + 1]
                .iter()
                .map(|o| data[y * WIDTH + x + o])
                .sum();
            if sum > 400.0 * 4.0 {
                candidates.push((x as f64 + 0.5, y as f64 + 0.5));
            }
        }
    }

    let matching = MatchCalculator::analyse_2d(&spots, &candidates, 1.0)?;
    assert_eq!(matching.result.tp, spots.len());
    assert!(matching.unmatched_actual.is_empty());
    assert!(matching.result.recall() > 0.99);
    Ok(())
}
