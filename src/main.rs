use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use planktool::dataset::{DatasetRow, csv_line, dataset_header};
use planktool::loader::{self, DEFAULT_EXTENSIONS};
use planktool::{Pipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "planktool")]
#[command(about = "Find plankton in microscope images and compute their shape and texture features")]
struct Cli {
    /// Image file, or a dataset directory with one subdirectory per class
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the minimum contour area (px²)
    #[arg(long, value_name = "N")]
    min_area: Option<f64>,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(min_area) = args.min_area {
        config.regions.min_area = min_area;
    }

    let mut pipeline = Pipeline::from_config(&config)?;
    if let Some(debug_dir) = args.debug_out {
        pipeline = pipeline.with_debug(debug_dir)?;
    }

    if args.path.is_dir() {
        run_dataset(&pipeline, &args.path)
    } else {
        run_single(&pipeline, &args.path)
    }
}

fn run_single(pipeline: &Pipeline, path: &Path) -> anyhow::Result<()> {
    let image = loader::load_grayscale(path)?;
    info!("Image loaded: {}x{}", image.width(), image.height());

    let name = image_name(path);
    let results = pipeline.run_named(&image, &name)?;

    println!("=== Regions in {} ===", path.display());
    println!("Total regions: {}", results.len());
    for (i, item) in results.iter().enumerate() {
        let b = item.bbox;
        println!(
            "\nRegion {} at ({}, {}) size {}x{}",
            i + 1,
            b.x,
            b.y,
            b.width,
            b.height
        );
        for (label, value) in item.features.iter() {
            println!("  {label:<20} {value:.6}");
        }
    }
    Ok(())
}

fn run_dataset(pipeline: &Pipeline, root: &Path) -> anyhow::Result<()> {
    println!("{}", csv_line(dataset_header()));

    // Deepest directories first
    let mut dirs = loader::directories(root)?;
    dirs.reverse();

    for dir in dirs {
        info!("Getting features for {}", dir.display());
        let paths = loader::find_images(&dir, DEFAULT_EXTENSIONS, Some(0))?;

        let mut images = Vec::with_capacity(paths.len());
        let mut loaded = Vec::with_capacity(paths.len());
        for path in paths {
            match loader::load_grayscale(&path) {
                Ok(img) => {
                    images.push(img);
                    loaded.push(path);
                }
                Err(e) => warn!("skipping {}: {e}", path.display()),
            }
        }

        let names: Vec<String> = loaded.iter().map(|p| relative_name(root, p)).collect();
        for (path, result) in loaded.iter().zip(pipeline.run_batch_named(&images, &names)) {
            match result {
                Ok(regions) => {
                    for region in &regions {
                        println!("{}", DatasetRow::from_path(root, path, region).to_csv_line());
                    }
                }
                Err(e) => warn!("failed on {}: {e}", path.display()),
            }
        }
    }
    Ok(())
}

fn image_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

/// Path below the dataset root without extension, flattened to one
/// directory name
fn relative_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path).with_extension("");
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("_")
}
