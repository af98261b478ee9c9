//! `denoiselab` CLI - compare DnCNN and RIDNet on noisy test images.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use denoiselab::image::{list_images, pick_image, OutputFormat};
use denoiselab::noise::MAX_NOISE_LEVEL;
use denoiselab::{Config, ModelKind, Pipeline};

/// Add Gaussian noise to a test image and denoise it with a pretrained model.
#[derive(Parser, Debug)]
#[command(name = "denoiselab")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input image, or a directory of .jpg test images.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Directory the ground truth, noisy and denoised images are written to.
    #[arg(short, long, default_value = "output", value_name = "DIR")]
    output: PathBuf,

    /// Noise level (0-45). Level 0 leaves the image unchanged.
    #[arg(
        short,
        long,
        default_value = "0",
        value_name = "INT",
        value_parser = clap::value_parser!(u8).range(0..=i64::from(MAX_NOISE_LEVEL))
    )]
    noise_level: u8,

    /// Denoising model: dncnn or ridnet.
    #[arg(short, long, default_value = "dncnn", value_name = "MODEL")]
    model: ModelKind,

    /// Image to pick when INPUT is a directory. Defaults to the eleventh image.
    #[arg(long, value_name = "NAME")]
    pick: Option<String>,

    /// Directory holding dncnn.onnx and ridnet.onnx.
    #[arg(long, default_value = ".", value_name = "DIR")]
    model_dir: PathBuf,

    /// Number of patches per inference call.
    #[arg(long, default_value = "64", value_name = "INT")]
    batch_size: usize,

    /// Format of the written images: png or jpg.
    #[arg(short, long, default_value = "png", value_name = "FORMAT")]
    format: OutputFormat,

    /// Output JPEG quality (1-100), used with --format jpg.
    #[arg(short, long, default_value = "95", value_name = "INT")]
    quality: u8,

    /// Random seed for reproducible noise.
    #[arg(long, value_name = "INT")]
    seed: Option<u64>,

    /// List the images of the INPUT directory and exit.
    #[arg(long)]
    list: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("denoiselab={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input does not exist: {}", args.input.display());
    }

    if args.input.is_dir() {
        let images = list_images(&args.input).context("Failed to list test images")?;

        if args.list {
            for image in &images {
                println!("{}", file_name(image));
            }
            return Ok(());
        }

        let picked = pick_image(&images, args.pick.as_deref())?;
        return denoise(args, picked);
    }

    if args.list {
        anyhow::bail!("--list needs a directory, got {}", args.input.display());
    }

    if args.pick.is_some() {
        anyhow::bail!("--pick needs a directory, got {}", args.input.display());
    }

    denoise(args, &args.input)
}

fn denoise(args: &Args, input: &Path) -> Result<()> {
    let config = Config {
        noise_level: args.noise_level,
        model: args.model,
        model_dir: args.model_dir.clone(),
        batch_size: args.batch_size,
        output_format: args.format,
        output_quality: args.quality,
        seed: args.seed,
    };

    let mut pipeline = Pipeline::new(config).context("Failed to initialize pipeline")?;

    let report = pipeline
        .process(input, &args.output)
        .with_context(|| format!("Failed to denoise {}", input.display()))?;

    println!("Input image: {}", file_name(input));
    println!(
        "Noise level: {} (PSNR of noisy image: {:.3} dB)",
        args.noise_level, report.noisy_psnr
    );
    println!("Denoised image using {} model", report.model);
    println!(
        "Model size: {:.3} MB, prediction time: {:.3} seconds",
        report.model_size_mb,
        report.elapsed.as_secs_f64()
    );
    println!("PSNR of denoised image: {:.3} dB", report.psnr);
    println!("Images written to {}", args.output.display());

    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_for_file(extra: &[&str]) -> Args {
        let manifest = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml");
        let head = ["denoiselab", manifest];
        let argv = head.iter().chain(extra).copied();
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_pick_requires_directory() {
        let err = run(&args_for_file(&["--pick", "house.jpg"])).unwrap_err();
        assert!(err.to_string().contains("--pick needs a directory"), "{err}");
    }

    #[test]
    fn test_list_requires_directory() {
        let err = run(&args_for_file(&["--list"])).unwrap_err();
        assert!(err.to_string().contains("--list needs a directory"), "{err}");
    }

    #[test]
    fn test_format_and_quality_flags() {
        let args = args_for_file(&["--format", "jpg", "-q", "40"]);
        assert_eq!(args.format, OutputFormat::Jpeg);
        assert_eq!(args.quality, 40);
        assert_eq!(args_for_file(&[]).format, OutputFormat::Png);
        assert!(Args::try_parse_from(["denoiselab", "x.jpg", "--format", "gif"]).is_err());
    }
}
