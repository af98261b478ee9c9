//! Synthetic Gaussian noise for normalized patches.

use std::fmt;

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{Error, Result};
use crate::image::PatchTensor;

/// Highest supported noise level, in 8-bit intensity units.
pub const MAX_NOISE_LEVEL: u8 = 45;

/// Standard deviation of additive noise, in 8-bit intensity units (0-45).
///
/// Level `n` adds noise with σ = n/255 to values normalized to [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct NoiseLevel(u8);

impl NoiseLevel {
    /// Noise-free level.
    pub const ZERO: Self = Self(0);

    /// Create a noise level.
    ///
    /// # Errors
    ///
    /// Returns an error if `level` exceeds [`MAX_NOISE_LEVEL`].
    pub fn new(level: u8) -> Result<Self> {
        if level > MAX_NOISE_LEVEL {
            return Err(Error::InvalidParameter {
                name: "noise_level".to_string(),
                reason: format!("must be between 0 and {MAX_NOISE_LEVEL}"),
            });
        }
        Ok(Self(level))
    }

    /// Raw level value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Standard deviation on the normalized [0, 1] scale.
    #[must_use]
    pub fn sigma(self) -> f32 {
        f32::from(self.0) / 255.0
    }
}

impl fmt::Display for NoiseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Add zero-mean Gaussian noise to normalized patches and clip to [0, 1].
///
/// Level zero returns an exact copy of the input.
///
/// # Errors
///
/// Returns an error if no normal distribution can be built for `level`.
pub fn add_gaussian_noise<R: Rng + ?Sized>(
    patches: &PatchTensor,
    level: NoiseLevel,
    rng: &mut R,
) -> Result<PatchTensor> {
    if level == NoiseLevel::ZERO {
        return Ok(patches.clone());
    }

    let normal = Normal::new(0.0_f32, level.sigma()).map_err(|err| Error::InvalidParameter {
        name: "noise_level".to_string(),
        reason: format!("no normal distribution for level {level}: {err}"),
    })?;

    Ok(patches.mapv(|v| (v + normal.sample(&mut *rng)).clamp(0.0, 1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mid_grey(n: usize) -> PatchTensor {
        Array4::from_elem((n, 40, 40, 3), 0.5)
    }

    #[test]
    fn test_level_bounds() {
        assert!(NoiseLevel::new(0).is_ok());
        assert!(NoiseLevel::new(MAX_NOISE_LEVEL).is_ok());
        assert!(matches!(
            NoiseLevel::new(46),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_zero_level_is_identity() {
        let mut rng = StdRng::seed_from_u64(7);
        let patches = Array4::from_shape_fn((2, 40, 40, 3), |(n, y, x, c)| {
            #[allow(clippy::cast_precision_loss)]
            let v = ((n + y + x + c) % 7) as f32 / 7.0;
            v
        });

        let noisy = add_gaussian_noise(&patches, NoiseLevel::ZERO, &mut rng).unwrap();
        assert_eq!(noisy, patches);
    }

    #[test]
    fn test_output_is_clipped() {
        let mut rng = StdRng::seed_from_u64(1);
        let patches = Array4::from_shape_fn((4, 40, 40, 3), |(n, ..)| if n % 2 == 0 { 0.0 } else { 1.0 });

        let noisy = add_gaussian_noise(&patches, NoiseLevel::new(45).unwrap(), &mut rng).unwrap();
        assert!(noisy.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert_ne!(noisy, patches);
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn test_noise_spread_matches_sigma() {
        let mut rng = StdRng::seed_from_u64(42);
        let patches = mid_grey(16);
        let level = NoiseLevel::new(25).unwrap();

        let noisy = add_gaussian_noise(&patches, level, &mut rng).unwrap();
        let diff = &noisy - &patches;
        let mean = diff.mean().unwrap();
        let std = (diff.mapv(|d| (d - mean).powi(2)).sum() / diff.len() as f32).sqrt();

        // Mid-grey is ~5σ from either bound, so clipping is negligible.
        assert!(mean.abs() < 0.002, "mean {mean}");
        assert!((std - level.sigma()).abs() < 0.003, "std {std}");
    }

    #[test]
    fn test_every_nonzero_level_adds_noise() {
        let patches = mid_grey(1);
        let mut rng = StdRng::seed_from_u64(21);

        for raw in 1..=MAX_NOISE_LEVEL {
            let level = NoiseLevel::new(raw).unwrap();
            let noisy = add_gaussian_noise(&patches, level, &mut rng).unwrap();
            assert_ne!(noisy, patches, "level {level} left the patches clean");
        }
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let patches = mid_grey(1);
        let level = NoiseLevel::new(15).unwrap();

        let a = add_gaussian_noise(&patches, level, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = add_gaussian_noise(&patches, level, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }
}
