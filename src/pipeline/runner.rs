//! Main pipeline comparing denoising models on a test image.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{Error, Result};
use crate::image::{self, ImageTensor, OutputFormat};
use crate::model::{ModelKind, ModelStore, OnnxDenoiser};
use crate::noise::NoiseLevel;
use crate::patch::PATCH_SIZE;

use super::inference::{batch_progress, denoise_prepared};
use super::prepare::{prepare, Prepared};

/// Configuration for the denoising pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Noise level (0-45) added to the test image.
    pub noise_level: u8,

    /// Model used by [`Pipeline::process`].
    pub model: ModelKind,

    /// Directory holding `dncnn.onnx` and `ridnet.onnx`.
    pub model_dir: PathBuf,

    /// Number of patches per inference call.
    pub batch_size: usize,

    /// Format of the written images.
    pub output_format: OutputFormat,

    /// Output JPEG quality (1-100), used when `output_format` is JPEG.
    pub output_quality: u8,

    /// Random seed for reproducible noise. None for random.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            noise_level: 0,
            model: ModelKind::DnCnn,
            model_dir: PathBuf::from("."),
            batch_size: 64,
            output_format: OutputFormat::Png,
            output_quality: 95,
            seed: None,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        NoiseLevel::new(self.noise_level)?;

        if self.batch_size == 0 {
            return Err(Error::InvalidParameter {
                name: "batch_size".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if !(1..=100).contains(&self.output_quality) {
            return Err(Error::InvalidParameter {
                name: "output_quality".to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        Ok(())
    }
}

/// Outcome of one denoising run.
#[derive(Debug, Clone)]
pub struct Report {
    /// Model that produced the image.
    pub model: ModelKind,
    /// Denoised image, values in [0, 1].
    pub denoised: ImageTensor,
    /// PSNR of the denoised image against the ground truth, in dB.
    pub psnr: f64,
    /// PSNR of the noisy input against the ground truth, in dB.
    pub noisy_psnr: f64,
    /// Wall time spent in inference.
    pub elapsed: Duration,
    /// Size of the model artifact in MiB.
    pub model_size_mb: f64,
}

/// Files written by [`write_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Cropped clean image.
    pub ground_truth: PathBuf,
    /// Noisy model input.
    pub noisy: PathBuf,
    /// Model output.
    pub denoised: PathBuf,
}

/// Write the ground truth, noisy and denoised images of a run to `output_dir`.
///
/// File extensions follow `format`; `quality` applies to JPEG output.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or an image cannot be
/// saved.
pub fn write_outputs(
    prepared: &Prepared,
    report: &Report,
    output_dir: &Path,
    format: OutputFormat,
    quality: u8,
) -> Result<OutputPaths> {
    fs::create_dir_all(output_dir)?;

    let ext = format.extension();
    let paths = OutputPaths {
        ground_truth: output_dir.join(format!("ground_truth.{ext}")),
        noisy: output_dir.join(format!("noisy.{ext}")),
        denoised: output_dir.join(format!("denoised_{}.{ext}", report.model.id())),
    };

    image::save_image(&prepared.ground_truth, &paths.ground_truth, quality)?;
    image::save_image(&prepared.noisy_image, &paths.noisy, quality)?;
    image::save_image(&report.denoised, &paths.denoised, quality)?;

    Ok(paths)
}

struct LoadedModel {
    denoiser: OnnxDenoiser,
    size_mb: f64,
}

/// Pipeline that adds noise to test images and denoises them.
///
/// Models are loaded on first use and kept for the lifetime of the pipeline.
pub struct Pipeline {
    config: Config,
    noise_level: NoiseLevel,
    store: ModelStore,
    models: HashMap<ModelKind, LoadedModel>,
    rng: StdRng,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tracing::info!("Initializing pipeline with config: {config:?}");

        let noise_level = NoiseLevel::new(config.noise_level)?;
        let store = ModelStore::new(&config.model_dir);
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

        Ok(Self {
            config,
            noise_level,
            store,
            models: HashMap::new(),
            rng,
        })
    }

    /// The pipeline configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Crop, tile and add noise to an image at the configured noise level.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is smaller than one patch.
    pub fn prepare(&mut self, image: &ImageTensor) -> Result<Prepared> {
        prepare(image, self.noise_level, &mut self.rng)
    }

    /// Denoise a prepared image with the given model.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded or inference fails.
    pub fn denoise(&mut self, prepared: &Prepared, kind: ModelKind) -> Result<Report> {
        let batch_size = self.config.batch_size;
        let loaded = self.model(kind)?;

        let num_batches = prepared.grid.len().div_ceil(batch_size);
        let pb = batch_progress(num_batches);

        tracing::info!("Denoising with {kind}...");
        let start = Instant::now();
        let result = denoise_prepared(&mut loaded.denoiser, prepared, batch_size, &pb)?;
        let elapsed = start.elapsed();
        pb.finish_and_clear();

        Ok(Report {
            model: kind,
            denoised: result.image,
            psnr: result.psnr,
            noisy_psnr: prepared.noisy_psnr()?,
            elapsed,
            model_size_mb: loaded.size_mb,
        })
    }

    /// Load a test image, add noise, denoise it with the configured model and
    /// write the ground truth, noisy and denoised images to `output_dir` in
    /// the configured format.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage fails.
    pub fn process<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        input_path: P,
        output_dir: Q,
    ) -> Result<Report> {
        let input_path = input_path.as_ref();
        let output_dir = output_dir.as_ref();

        tracing::info!("Processing image: {}", input_path.display());

        let image = image::load_image(input_path)?;
        let prepared = self.prepare(&image)?;
        let report = self.denoise(&prepared, self.config.model)?;

        let paths = write_outputs(
            &prepared,
            &report,
            output_dir,
            self.config.output_format,
            self.config.output_quality,
        )?;

        tracing::info!("Processing complete, denoised image at {}", paths.denoised.display());
        Ok(report)
    }

    /// Get a loaded model, loading it on first use.
    fn model(&mut self, kind: ModelKind) -> Result<&mut LoadedModel> {
        if !self.models.contains_key(&kind) {
            tracing::info!(
                "Loading {kind} from {}...",
                self.store.model_dir().display()
            );
            let size_mb = self.store.file_size_mb(kind)?;
            let session = self.store.load_session(kind)?;
            tracing::info!("{kind} loaded ({size_mb:.3} MB, {PATCH_SIZE}x{PATCH_SIZE} patches)");

            self.models.insert(
                kind,
                LoadedModel {
                    denoiser: OnnxDenoiser::new(kind, session),
                    size_mb,
                },
            );
        }

        self.models.get_mut(&kind).ok_or_else(|| Error::ModelNotFound {
            name: kind.filename().to_string(),
            path: self.store.model_dir().join(kind.filename()),
        })
    }
}
