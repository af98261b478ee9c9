//! Image saving utilities.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::error::{Error, Result};

use super::{ImageTensor, RGB_CHANNELS};

/// File format of written images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// JPEG at the configured quality.
    Jpeg,
}

impl OutputFormat {
    /// File extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            _ => Err(Error::InvalidParameter {
                name: "format".to_string(),
                reason: format!("unknown format {s:?}, expected png or jpg"),
            }),
        }
    }
}

/// Save a tensor as an image file.
///
/// The tensor is denormalized from [0, 1] to [0, 255] and saved to the
/// specified path, with the format inferred from the extension.
///
/// # Arguments
///
/// * `tensor` - HWC tensor with values in [0, 1]
/// * `path` - Output file path
/// * `quality` - JPEG quality (1-100), ignored for other formats
///
/// # Errors
///
/// Returns an error if the tensor is not RGB or the image cannot be saved.
pub fn save_image<P: AsRef<Path>>(tensor: &ImageTensor, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();

    let img = image::DynamicImage::ImageRgb8(tensor_to_rgb(tensor)?);

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => {
            let mut output = std::fs::File::create(path)?;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
            img.write_with_encoder(encoder)
                .map_err(|source| Error::ImageSave {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        _ => {
            img.save(path).map_err(|source| Error::ImageSave {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    tracing::debug!("Saved {}", path.display());
    Ok(())
}

/// Convert a normalized HWC tensor to an RGB image.
///
/// # Errors
///
/// Returns an error if the tensor does not have three channels or is too
/// large to address with `u32` coordinates.
#[allow(clippy::cast_possible_truncation)]
pub fn tensor_to_rgb(tensor: &ImageTensor) -> Result<RgbImage> {
    let (height, width, channels) = tensor.dim();

    if channels != RGB_CHANNELS {
        return Err(Error::ShapeMismatch {
            expected: format!("{RGB_CHANNELS} channels"),
            actual: format!("{channels} channels"),
        });
    }

    let (w, h) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(Error::UnsupportedDimensions {
                width,
                height,
                reason: "exceeds u32 pixel coordinates".to_string(),
            })
        }
    };

    let mut img: RgbImage = ImageBuffer::new(w, h);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let (xi, yi) = (x as usize, y as usize);
        *pixel = Rgb([
            denormalize(tensor[[yi, xi, 0]]),
            denormalize(tensor[[yi, xi, 1]]),
            denormalize(tensor[[yi, xi, 2]]),
        ]);
    }

    Ok(img)
}

/// Denormalize a value from [0, 1] to [0, 255] with clamping.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn denormalize(value: f32) -> u8 {
    // Safe: clamped to [0, 255] range before casting
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
