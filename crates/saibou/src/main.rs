//! Batch driver: segment every image in a directory and write one
//! label map and one measurement table per input.
//!
//! Per-image failures (unreadable file, degenerate segmentation) are
//! reported and the batch continues; the exit status is non-zero only
//! when no image succeeded.

use std::path::{Path, PathBuf};

use clap::Parser;
use saibou_pipeline::{SegmentationConfig, segment_and_measure};

/// Segment membrane-labeled microscopy images and measure every cell.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Input image file, or a directory of .tif/.tiff/.png images.
    input: PathBuf,

    /// Output directory for `<stem>_labels.png` and
    /// `<stem>_measurements.csv` files.
    #[arg(short, long)]
    output: PathBuf,

    /// JSON file holding a full segmentation configuration
    /// (individual flags below override its fields).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Gaussian smoothing sigma for the segmentation channel.
    #[arg(long)]
    sigma: Option<f32>,

    /// Disk radius for the local-mean threshold neighborhood.
    #[arg(long)]
    threshold_radius: Option<u32>,

    /// Disk radius for morphological closing of the membrane mask.
    #[arg(long)]
    closing_radius: Option<u32>,

    /// Gaussian sigma for distance-map smoothing before seeding.
    #[arg(long)]
    seed_sigma: Option<f32>,

    /// Minimum separation between seed points in pixels.
    #[arg(long)]
    min_seed_separation: Option<u32>,

    /// Index of the channel that drives segmentation.
    #[arg(long)]
    channel: Option<usize>,
}

impl Args {
    /// Resolve the effective configuration: file (if given), then
    /// per-field flag overrides.
    fn resolve_config(&self) -> Result<SegmentationConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
                serde_json::from_str(&text)
                    .map_err(|e| format!("cannot parse {}: {e}", path.display()))?
            }
            None => SegmentationConfig::default(),
        };
        if let Some(sigma) = self.sigma {
            config.smoothing_sigma = sigma;
        }
        if let Some(radius) = self.threshold_radius {
            config.threshold_radius = radius;
        }
        if let Some(radius) = self.closing_radius {
            config.closing_radius = radius;
        }
        if let Some(sigma) = self.seed_sigma {
            config.seed_smoothing_sigma = sigma;
        }
        if let Some(separation) = self.min_seed_separation {
            config.min_seed_separation = separation;
        }
        if let Some(channel) = self.channel {
            config.segmentation_channel = channel;
        }
        Ok(config)
    }
}

/// Collect the input worklist: a single file as-is, or a directory's
/// image files sorted by name so batch order is reproducible.
fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(input)
        .map_err(|e| format!("cannot read directory {}: {e}", input.display()))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    matches!(ext.to_ascii_lowercase().as_str(), "tif" | "tiff" | "png")
                })
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Process one image end to end; returns the surviving cell count.
fn process_image(
    path: &Path,
    output_dir: &Path,
    config: &SegmentationConfig,
) -> Result<usize, Box<dyn std::error::Error>> {
    let stack = saibou_io::load_channels(path)?;
    let channel_count = stack.channel_count();
    let result = segment_and_measure(stack, config)?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    saibou_io::write_label_map_png(&output_dir.join(format!("{stem}_labels.png")), &result.labels)?;
    saibou_io::write_measurements_csv(
        &output_dir.join(format!("{stem}_measurements.csv")),
        &result.measurements,
        channel_count,
    )?;

    let degenerate = result
        .measurements
        .iter()
        .filter(|m| m.edge_degenerate)
        .count();
    if degenerate > 0 {
        eprintln!(
            "  {}: {degenerate} cell(s) had no edge pixels; edge means reported as NaN",
            path.display(),
        );
    }
    Ok(result.measurements.len())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = args.resolve_config()?;

    let inputs = collect_inputs(&args.input)?;
    if inputs.is_empty() {
        return Err(format!("no input images found in {}", args.input.display()).into());
    }
    std::fs::create_dir_all(&args.output)
        .map_err(|e| format!("cannot create {}: {e}", args.output.display()))?;

    let mut succeeded = 0usize;
    for path in &inputs {
        eprintln!("Processing {}", path.display());
        match process_image(path, &args.output, &config) {
            Ok(cells) => {
                eprintln!("  {cells} cell(s) segmented");
                succeeded += 1;
            }
            Err(error) => {
                eprintln!("  skipped: {error}");
            }
        }
    }

    eprintln!("Done: {succeeded}/{} image(s) processed", inputs.len());
    if succeeded == 0 {
        return Err("no image could be processed".into());
    }
    Ok(())
}
