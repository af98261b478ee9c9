//! ONNX Runtime backed denoiser.

use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use crate::error::{Error, Result};
use crate::image::PatchTensor;

use super::{Denoiser, ModelKind};

/// A pretrained denoising network executed through ONNX Runtime.
///
/// The network takes an NHWC batch of patches with values in [0, 1] and
/// returns a batch of the same shape.
pub struct OnnxDenoiser {
    kind: ModelKind,
    session: Session,
}

impl OnnxDenoiser {
    /// Wrap a loaded session.
    #[must_use]
    pub const fn new(kind: ModelKind, session: Session) -> Self {
        Self { kind, session }
    }

    /// Which model this denoiser runs.
    #[must_use]
    pub const fn kind(&self) -> ModelKind {
        self.kind
    }
}

impl Denoiser for OnnxDenoiser {
    fn name(&self) -> &str {
        self.kind.display_name()
    }

    fn denoise(&mut self, batch: &PatchTensor) -> Result<PatchTensor> {
        let expected = batch.dim();
        let input =
            Tensor::from_array(batch.clone()).map_err(|source| Error::Inference { source })?;

        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(|source| Error::Inference { source })?;

        // Both networks have a single output: the denoised batch.
        let denoised = outputs
            .values()
            .next()
            .ok_or_else(|| Error::ShapeMismatch {
                expected: nhwc_label(expected),
                actual: format!("no output from {}", self.kind),
            })?;

        let (shape, data) = denoised
            .try_extract_tensor::<f32>()
            .map_err(|source| Error::Inference { source })?;
        let dims: Vec<i64> = shape.iter().copied().collect();

        patches_from_output(&dims, data, expected)
    }
}

fn nhwc_label((n, h, w, c): (usize, usize, usize, usize)) -> String {
    format!("NHWC ({n}, {h}, {w}, {c})")
}

/// Rebuild a patch batch from a raw model output, which must have exactly the
/// NHWC shape of the batch that was fed in.
fn patches_from_output(
    dims: &[i64],
    data: &[f32],
    expected: (usize, usize, usize, usize),
) -> Result<PatchTensor> {
    let mismatch = || Error::ShapeMismatch {
        expected: nhwc_label(expected),
        actual: format!("{dims:?}"),
    };

    let dims = dims
        .iter()
        .map(|&d| usize::try_from(d))
        .collect::<std::result::Result<Vec<usize>, _>>()
        .map_err(|_| mismatch())?;

    let [n, h, w, c] = dims[..] else {
        return Err(mismatch());
    };

    if (n, h, w, c) != expected {
        return Err(mismatch());
    }

    Array4::from_shape_vec(expected, data.to_vec()).map_err(|_| Error::ShapeMismatch {
        expected: format!("{} values", n * h * w * c),
        actual: format!("{} values", data.len()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH: (usize, usize, usize, usize) = (2, 40, 40, 3);

    #[test]
    fn test_output_matching_input_shape() {
        #[allow(clippy::cast_precision_loss)]
        let data: Vec<f32> = (0..2 * 40 * 40 * 3).map(|i| i as f32).collect();
        let patches = patches_from_output(&[2, 40, 40, 3], &data, BATCH).unwrap();

        assert_eq!(patches.dim(), BATCH);
        assert_eq!(patches[[1, 0, 0, 0]], 4800.0);
    }

    #[test]
    fn test_rejects_negative_dims() {
        let err = patches_from_output(&[-1, 40, 40, 3], &[], BATCH).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
        assert!(err.to_string().contains("NHWC (2, 40, 40, 3)"), "{err}");
    }

    #[test]
    fn test_rejects_wrong_rank_and_layout() {
        let data = vec![0.0; 2 * 40 * 40 * 3];
        assert!(patches_from_output(&[2, 4800], &data, BATCH).is_err());
        // Channel-first output from a mis-exported model.
        assert!(patches_from_output(&[2, 3, 40, 40], &data, BATCH).is_err());
    }

    #[test]
    fn test_rejects_short_data() {
        let data = vec![0.0; 10];
        assert!(matches!(
            patches_from_output(&[2, 40, 40, 3], &data, BATCH),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
