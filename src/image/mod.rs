//! Image loading, listing, and saving utilities.

mod list;
mod load;
mod save;

pub use list::{list_images, pick_image, DEFAULT_PICK_INDEX};
pub use load::{load_image, rgb_to_tensor};
pub use save::{save_image, tensor_to_rgb, OutputFormat};

use ndarray::{Array3, Array4};

/// Image tensor in HWC format (height, width, channels).
/// Values are normalized to [0, 1].
pub type ImageTensor = Array3<f32>;

/// Batch of square patches in NHWC format (patch, height, width, channels).
/// This is the input and output layout of the denoising models.
pub type PatchTensor = Array4<f32>;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;
