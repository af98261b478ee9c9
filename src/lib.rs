//! # denoiselab
//!
//! Compare pretrained image denoisers (DnCNN and RIDNet) on test images with
//! synthetic Gaussian noise.
//!
//! Images are cropped to whole 40x40 patches, noise is added per patch, each
//! patch is denoised by an ONNX model, and the patches are stitched back into
//! an image that is scored with PSNR against the clean crop.
//!
//! ## Example
//!
//! ```no_run
//! use denoiselab::{Config, ModelKind, Pipeline};
//!
//! # fn main() -> denoiselab::Result<()> {
//! let config = Config {
//!     noise_level: 25,
//!     model: ModelKind::RidNet,
//!     ..Config::default()
//! };
//! let mut pipeline = Pipeline::new(config)?;
//!
//! let report = pipeline.process("images/house.jpg", "out")?;
//! println!("PSNR: {:.3} dB", report.psnr);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod metrics;
pub mod model;
pub mod noise;
pub mod patch;
pub mod pipeline;

pub use error::{Error, Result};
pub use model::{Denoiser, ModelKind};
pub use noise::NoiseLevel;
pub use pipeline::{Config, Pipeline, Report};
