//! Batched patch inference.

use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{concatenate, s, Axis};

use crate::error::{Error, Result};
use crate::image::{ImageTensor, PatchTensor};
use crate::metrics::{psnr, DEFAULT_MAX_VALUE};
use crate::model::Denoiser;
use crate::patch::reconstruct;

use super::prepare::Prepared;

/// Result of denoising one prepared image.
#[derive(Debug, Clone)]
pub struct Denoised {
    /// Reassembled denoised image, values in [0, 1].
    pub image: ImageTensor,
    /// PSNR of the denoised image against the ground truth, in dB.
    pub psnr: f64,
}

/// Progress bar over inference batches.
#[must_use]
pub fn batch_progress(num_batches: usize) -> ProgressBar {
    let pb = ProgressBar::new(num_batches as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Denoising [{bar:40.cyan/blue}] {pos}/{len} batches")
            .expect("valid template")
            .progress_chars("#>-"),
    );
    pb
}

/// Run a denoiser over patches in batches and clip the output to [0, 1].
///
/// Patch order is preserved, so the result can be passed straight to
/// [`reconstruct`].
///
/// # Errors
///
/// Returns an error if `batch_size` is zero, inference fails, or the model
/// returns a batch whose shape differs from its input.
pub fn denoise_patches<D: Denoiser + ?Sized>(
    denoiser: &mut D,
    noisy: &PatchTensor,
    batch_size: usize,
    progress: &ProgressBar,
) -> Result<PatchTensor> {
    if batch_size == 0 {
        return Err(Error::InvalidParameter {
            name: "batch_size".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    let total = noisy.len_of(Axis(0));
    let mut outputs = Vec::with_capacity(total.div_ceil(batch_size));

    for start in (0..total).step_by(batch_size) {
        let end = (start + batch_size).min(total);
        let batch = noisy.slice(s![start..end, .., .., ..]).to_owned();

        let denoised = denoiser.denoise(&batch)?;
        if denoised.dim() != batch.dim() {
            return Err(Error::ShapeMismatch {
                expected: format!("{:?}", batch.dim()),
                actual: format!("{:?}", denoised.dim()),
            });
        }

        tracing::debug!("{} denoised patches {start}..{end}", denoiser.name());
        outputs.push(denoised.mapv_into(|v| v.clamp(0.0, 1.0)));
        progress.inc(1);
    }

    if outputs.is_empty() {
        return Ok(noisy.clone());
    }

    let views: Vec<_> = outputs.iter().map(PatchTensor::view).collect();
    concatenate(Axis(0), &views).map_err(|err| Error::ShapeMismatch {
        expected: format!("{total} patches"),
        actual: err.to_string(),
    })
}

/// Denoise a prepared image and score it against its ground truth.
///
/// # Errors
///
/// Returns an error if inference fails or its output cannot be reassembled.
pub fn denoise_prepared<D: Denoiser + ?Sized>(
    denoiser: &mut D,
    prepared: &Prepared,
    batch_size: usize,
    progress: &ProgressBar,
) -> Result<Denoised> {
    let patches = denoise_patches(denoiser, &prepared.noisy_patches, batch_size, progress)?;
    let image = reconstruct(&patches, &prepared.grid)?;
    let psnr = psnr(&prepared.ground_truth, &image, DEFAULT_MAX_VALUE)?;

    Ok(Denoised { image, psnr })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    /// Returns its input unchanged, recording batch sizes.
    struct Identity {
        batches: Vec<usize>,
    }

    impl Denoiser for Identity {
        fn name(&self) -> &str {
            "identity"
        }

        fn denoise(&mut self, batch: &PatchTensor) -> Result<PatchTensor> {
            self.batches.push(batch.len_of(Axis(0)));
            Ok(batch.clone())
        }
    }

    /// Pushes every value out of range.
    struct Overshoot;

    impl Denoiser for Overshoot {
        fn name(&self) -> &str {
            "overshoot"
        }

        fn denoise(&mut self, batch: &PatchTensor) -> Result<PatchTensor> {
            Ok(batch.mapv(|v| v * 4.0 - 1.5))
        }
    }

    /// Drops the last patch of every batch.
    struct Lossy;

    impl Denoiser for Lossy {
        fn name(&self) -> &str {
            "lossy"
        }

        fn denoise(&mut self, batch: &PatchTensor) -> Result<PatchTensor> {
            let n = batch.len_of(Axis(0));
            Ok(batch.slice(s![..n - 1, .., .., ..]).to_owned())
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn numbered_patches(n: usize) -> PatchTensor {
        Array4::from_shape_fn((n, 40, 40, 3), |(i, ..)| i as f32 / n as f32)
    }

    #[test]
    fn test_batches_preserve_order() {
        let patches = numbered_patches(10);

        for batch_size in [1, 3, 4, 10, 64] {
            let mut model = Identity { batches: Vec::new() };
            let out =
                denoise_patches(&mut model, &patches, batch_size, &ProgressBar::hidden()).unwrap();

            assert_eq!(out, patches);
            assert_eq!(model.batches.iter().sum::<usize>(), 10);
            assert!(model.batches.iter().all(|&b| b <= batch_size));
        }
    }

    #[test]
    fn test_uneven_final_batch() {
        let patches = numbered_patches(10);
        let mut model = Identity { batches: Vec::new() };
        denoise_patches(&mut model, &patches, 4, &ProgressBar::hidden()).unwrap();

        assert_eq!(model.batches, vec![4, 4, 2]);
    }

    #[test]
    fn test_output_is_clipped() {
        let patches = numbered_patches(5);
        let out = denoise_patches(&mut Overshoot, &patches, 2, &ProgressBar::hidden()).unwrap();

        assert!(out.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert_eq!(out[[0, 0, 0, 0]], 0.0);
        assert_eq!(out[[4, 0, 0, 0]], 1.0);
    }

    #[test]
    fn test_rejects_shape_change() {
        let patches = numbered_patches(4);
        assert!(matches!(
            denoise_patches(&mut Lossy, &patches, 2, &ProgressBar::hidden()),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_batch_size() {
        let patches = numbered_patches(2);
        let mut model = Identity { batches: Vec::new() };
        assert!(denoise_patches(&mut model, &patches, 0, &ProgressBar::hidden()).is_err());
    }
}
