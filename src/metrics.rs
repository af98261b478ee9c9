//! Image fidelity metrics.

use ndarray::{ArrayBase, Data, Dimension, Zip};

use crate::error::{Error, Result};

/// Peak value of normalized images.
pub const DEFAULT_MAX_VALUE: f64 = 1.0;

/// PSNR reported for identical images, where the ratio is unbounded.
pub const IDENTICAL_PSNR: f64 = 100.0;

/// Mean squared error between two arrays of the same shape.
///
/// # Errors
///
/// Returns an error if the shapes differ or the arrays are empty.
#[allow(clippy::cast_precision_loss)]
pub fn mse<S1, S2, D>(a: &ArrayBase<S1, D>, b: &ArrayBase<S2, D>) -> Result<f64>
where
    S1: Data<Elem = f32>,
    S2: Data<Elem = f32>,
    D: Dimension,
{
    if a.shape() != b.shape() {
        return Err(Error::ShapeMismatch {
            expected: format!("{:?}", a.shape()),
            actual: format!("{:?}", b.shape()),
        });
    }

    if a.is_empty() {
        return Err(Error::InvalidParameter {
            name: "image".to_string(),
            reason: "cannot compare empty images".to_string(),
        });
    }

    let mut sum = 0.0_f64;
    Zip::from(a).and(b).for_each(|&x, &y| {
        let d = f64::from(x) - f64::from(y);
        sum += d * d;
    });

    Ok(sum / a.len() as f64)
}

/// Peak signal-to-noise ratio in decibels.
///
/// Computes `20 * log10(max_value / sqrt(mse))`, or [`IDENTICAL_PSNR`] when
/// the images are identical. Both images must already be cropped to the
/// same shape.
///
/// # Errors
///
/// Returns an error if the shapes differ or `max_value` is not positive.
pub fn psnr<S1, S2, D>(
    ground_truth: &ArrayBase<S1, D>,
    image: &ArrayBase<S2, D>,
    max_value: f64,
) -> Result<f64>
where
    S1: Data<Elem = f32>,
    S2: Data<Elem = f32>,
    D: Dimension,
{
    if max_value.is_nan() || max_value <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "max_value".to_string(),
            reason: "must be positive".to_string(),
        });
    }

    let mse = mse(ground_truth, image)?;
    if mse == 0.0 {
        return Ok(IDENTICAL_PSNR);
    }

    Ok(20.0 * (max_value / mse.sqrt()).log10())
}
