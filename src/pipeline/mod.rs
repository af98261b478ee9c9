//! Noise, inference and scoring pipeline.

mod inference;
mod prepare;
mod runner;

pub use inference::{batch_progress, denoise_patches, denoise_prepared, Denoised};
pub use prepare::{prepare, Prepared};
pub use runner::{write_outputs, Config, OutputPaths, Pipeline, Report};
