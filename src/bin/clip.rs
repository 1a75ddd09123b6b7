// Usage: target/release/clip [input] [output.csv] --bbox 103.2,0.5,104.9,2.7 --sample 5000

use anyhow::{anyhow, Context, Result};
use cellspeed::config::Settings;
use cellspeed::loader::{load_path, write_records_csv};
use cellspeed::logging::setup_logging;
use cellspeed::{parse_bbox, BoundingBox, MeasurementRecord};
use clap::Parser;
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

/// Narrows a dataset to a region of interest and writes it as CSV
#[derive(Parser)]
#[command(name = "clip")]
struct Args {
    input: PathBuf,
    output: PathBuf,

    /// "min_lon,min_lat,max_lon,max_lat", defaults to the configured box
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    bbox: Option<BoundingBox>,

    /// Keep at most this many records, picked at random with a fixed seed
    #[arg(long)]
    sample: Option<usize>,

    #[arg(short, long, default_value = "cellspeed.toml")]
    config: PathBuf,
}

pub fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(&args.config)?;
    setup_logging(&settings.logging, false)
        .map_err(|e| anyhow!("failed to set up logging: {}", e))?;

    let bbox = args.bbox.unwrap_or(settings.bbox);

    let dataset = load_path(&args.input, &ProgressBar::new(0))
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    let clipped = dataset.clip_to_bbox(bbox);
    info!(
        "{} of {} records inside the bounding box",
        clipped.len(),
        dataset.len()
    );

    let records = match args.sample {
        Some(n) => sample(clipped.records(), n),
        None => clipped.records().iter().collect(),
    };

    let out = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    write_records_csv(records, BufWriter::new(out))?;
    info!("saved {}", args.output.display());
    Ok(())
}

// seeded, so that the same input always gives the same sample
fn sample(records: &[MeasurementRecord], n: usize) -> Vec<&MeasurementRecord> {
    if records.len() <= n {
        return records.iter().collect();
    }
    let mut rng = StdRng::seed_from_u64(1);
    let mut indices = rand::seq::index::sample(&mut rng, records.len(), n).into_vec();
    indices.sort_unstable();
    indices.into_iter().map(|i| &records[i]).collect()
}
