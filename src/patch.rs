//! Splitting images into square patches and stitching them back together.
//!
//! Patches are non-overlapping and taken in row-major scan order: left to
//! right within a row of patches, rows top to bottom. Trailing pixels that do
//! not fill a whole patch are cropped away, never padded.

use ndarray::{s, Array3, Array4, ArrayView3};

use crate::error::{Error, Result};
use crate::image::{ImageTensor, PatchTensor};

/// Side length of the square patches the denoising models were trained on.
pub const PATCH_SIZE: usize = 40;

/// Layout of a tiled image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchGrid {
    /// Number of patch rows.
    pub rows: usize,
    /// Number of patch columns.
    pub cols: usize,
    /// Patch side length in pixels.
    pub patch_size: usize,
    /// Channels per pixel.
    pub channels: usize,
}

impl PatchGrid {
    /// Grid covering the largest patch-aligned region of an image.
    ///
    /// # Errors
    ///
    /// Returns an error if `patch_size` is zero or the image is smaller than
    /// one patch in either dimension.
    pub fn for_image(image: &ImageTensor, patch_size: usize) -> Result<Self> {
        let (height, width, channels) = image.dim();

        if patch_size == 0 {
            return Err(Error::InvalidParameter {
                name: "patch_size".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if height < patch_size || width < patch_size {
            return Err(Error::UnsupportedDimensions {
                width,
                height,
                reason: format!("smaller than one {patch_size}x{patch_size} patch"),
            });
        }

        Ok(Self {
            rows: height / patch_size,
            cols: width / patch_size,
            patch_size,
            channels,
        })
    }

    /// Number of patches in the grid.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Whether the grid holds no patches.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shape (height, width, channels) of the image the grid covers.
    #[must_use]
    pub const fn image_shape(&self) -> (usize, usize, usize) {
        (
            self.rows * self.patch_size,
            self.cols * self.patch_size,
            self.channels,
        )
    }

    /// Top-left pixel (row, column) of the patch at scan position `index`.
    #[must_use]
    pub const fn origin(&self, index: usize) -> (usize, usize) {
        (
            (index / self.cols) * self.patch_size,
            (index % self.cols) * self.patch_size,
        )
    }
}

/// Crop an image to the largest region whose sides are multiples of
/// `patch_size`, discarding trailing rows and columns.
///
/// # Errors
///
/// Returns an error if the image is smaller than one patch.
pub fn crop_to_multiple(image: &ImageTensor, patch_size: usize) -> Result<ImageTensor> {
    let grid = PatchGrid::for_image(image, patch_size)?;
    Ok(cropped_view(image, &grid).to_owned())
}

fn cropped_view<'a>(image: &'a ImageTensor, grid: &PatchGrid) -> ArrayView3<'a, f32> {
    let (height, width, _) = grid.image_shape();
    image.slice(s![..height, ..width, ..])
}

/// Split an image into patches in scan order.
///
/// Returns the patches as an NHWC tensor together with the grid needed to
/// reassemble them.
///
/// # Errors
///
/// Returns an error if the image is smaller than one patch.
pub fn extract_patches(image: &ImageTensor, patch_size: usize) -> Result<(PatchTensor, PatchGrid)> {
    let grid = PatchGrid::for_image(image, patch_size)?;
    let mut patches = Array4::<f32>::zeros((grid.len(), patch_size, patch_size, grid.channels));

    for (index, mut patch) in patches.outer_iter_mut().enumerate() {
        let (y, x) = grid.origin(index);
        patch.assign(&image.slice(s![y..y + patch_size, x..x + patch_size, ..]));
    }

    tracing::debug!(
        "Extracted {} patches ({}x{} grid) from {:?}",
        grid.len(),
        grid.rows,
        grid.cols,
        image.dim()
    );

    Ok((patches, grid))
}

/// Reassemble patches into a single image, replaying the scan order used by
/// [`extract_patches`].
///
/// # Errors
///
/// Returns an error if the number or shape of the patches does not exactly
/// fill the grid.
pub fn reconstruct(patches: &PatchTensor, grid: &PatchGrid) -> Result<ImageTensor> {
    let expected = (grid.len(), grid.patch_size, grid.patch_size, grid.channels);

    if patches.dim() != expected {
        return Err(Error::ShapeMismatch {
            expected: format!("{expected:?}"),
            actual: format!("{:?}", patches.dim()),
        });
    }

    let mut image = Array3::<f32>::zeros(grid.image_shape());
    let size = grid.patch_size;

    for (index, patch) in patches.outer_iter().enumerate() {
        let (y, x) = grid.origin(index);
        image
            .slice_mut(s![y..y + size, x..x + size, ..])
            .assign(&patch);
    }

    Ok(image)
}
