//! Image loading utilities.

use std::path::Path;

use image::RgbImage;
use ndarray::Array3;

use crate::error::{Error, Result};

use super::{ImageTensor, RGB_CHANNELS};

/// Load an image from disk and convert to a normalized tensor.
///
/// The image is:
/// 1. Loaded from the specified path (format inferred from its content)
/// 2. Converted to RGB if necessary
/// 3. Normalized to [0, 1] range
/// 4. Returned as an HWC tensor at its original size
///
/// # Errors
///
/// Returns an error if the image cannot be loaded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<ImageTensor> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    let rgb = img.to_rgb8();
    tracing::debug!(
        "Loaded {} ({}x{})",
        path.display(),
        rgb.width(),
        rgb.height()
    );

    Ok(rgb_to_tensor(&rgb))
}

/// Convert an RGB image to a normalized HWC tensor.
#[must_use]
pub fn rgb_to_tensor(rgb: &RgbImage) -> ImageTensor {
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);

    let mut tensor = Array3::<f32>::zeros((height, width, RGB_CHANNELS));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..RGB_CHANNELS {
            tensor[[y, x, c]] = f32::from(pixel[c]) / 255.0;
        }
    }

    tensor
}
