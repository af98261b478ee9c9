//! Pretrained denoising models.

mod loader;
mod onnx;

pub use loader::{ModelKind, ModelStore};
pub use onnx::OnnxDenoiser;

use crate::error::Result;
use crate::image::PatchTensor;

/// A model that maps a batch of noisy patches to denoised patches.
///
/// Implementations receive an NHWC batch with values in [0, 1] and must
/// return a batch of the same shape. Output values are not required to stay
/// in range; callers clip them.
pub trait Denoiser {
    /// Name shown in reports and logs.
    fn name(&self) -> &str;

    /// Denoise one batch of patches.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn denoise(&mut self, batch: &PatchTensor) -> Result<PatchTensor>;
}
