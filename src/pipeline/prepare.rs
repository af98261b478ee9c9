//! Ground truth and noisy input preparation.

use rand::Rng;

use crate::error::Result;
use crate::image::{ImageTensor, PatchTensor};
use crate::metrics::{psnr, DEFAULT_MAX_VALUE};
use crate::noise::{add_gaussian_noise, NoiseLevel};
use crate::patch::{extract_patches, reconstruct, PatchGrid, PATCH_SIZE};

/// A test image split into patches, with and without noise.
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Clean image, cropped to whole patches and rebuilt from them.
    pub ground_truth: ImageTensor,
    /// Noisy image rebuilt from the noisy patches.
    pub noisy_image: ImageTensor,
    /// Noisy patches in scan order, ready for inference.
    pub noisy_patches: PatchTensor,
    /// Layout shared by every patch collection of this image.
    pub grid: PatchGrid,
    /// Noise level that was applied.
    pub noise_level: NoiseLevel,
}

impl Prepared {
    /// PSNR of the noisy input against the ground truth.
    ///
    /// # Errors
    ///
    /// Returns an error if the two images differ in shape.
    pub fn noisy_psnr(&self) -> Result<f64> {
        psnr(&self.ground_truth, &self.noisy_image, DEFAULT_MAX_VALUE)
    }
}

/// Crop and tile an image, then add Gaussian noise to its patches.
///
/// # Errors
///
/// Returns an error if the image is smaller than one patch or the noise
/// cannot be generated.
pub fn prepare<R: Rng + ?Sized>(
    image: &ImageTensor,
    noise_level: NoiseLevel,
    rng: &mut R,
) -> Result<Prepared> {
    let (patches, grid) = extract_patches(image, PATCH_SIZE)?;
    let ground_truth = reconstruct(&patches, &grid)?;

    let noisy_patches = add_gaussian_noise(&patches, noise_level, rng)?;
    let noisy_image = reconstruct(&noisy_patches, &grid)?;

    tracing::info!(
        "Prepared {} patches at noise level {noise_level}",
        grid.len()
    );

    Ok(Prepared {
        ground_truth,
        noisy_image,
        noisy_patches,
        grid,
        noise_level,
    })
}
