// Usage: target/release/speeds [--dataset FILE] radius --lon 103.7414 --lat 1.4927
//        target/release/speeds polygon --vertices "103.6,1.4;103.8,1.4;103.8,1.6"
//        target/release/speeds polygon --geojson drawing.geojson
//        target/release/speeds operators

use anyhow::{anyhow, bail, Context, Result};
use cellspeed::config::Settings;
use cellspeed::loader::{load_path, write_summaries_csv};
use cellspeed::logging::setup_logging;
use cellspeed::{
    parse_vertices, sort_by_download_desc, summarize, Dataset, OperatorSummary,
    RegionDescriptor,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "speeds",
    about = "Average network speed per operator around a point or inside a polygon"
)]
struct Cli {
    /// Config file, defaults are used if it doesn't exist
    #[arg(short, long, default_value = "cellspeed.toml")]
    config: PathBuf,

    /// Dataset to query (.geojson, .json or .csv), overrides the config
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "cellspeed=debug"
    #[arg(long)]
    log_level: Option<String>,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Records within a radius of a point
    Radius {
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Defaults to the configured radius
        #[arg(long, allow_negative_numbers = true)]
        radius_km: Option<f64>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Records inside a polygon, or within a radius of a drawn point
    Polygon {
        /// "lon,lat;lon,lat;..."
        #[arg(
            long,
            value_parser = parse_ring,
            allow_hyphen_values = true,
            conflicts_with = "geojson",
            required_unless_present = "geojson"
        )]
        vertices: Option<Ring>,
        /// A GeoJSON drawing; the last feature is used
        #[arg(long)]
        geojson: Option<PathBuf>,
        /// Radius used when the drawing is a point
        #[arg(long, allow_negative_numbers = true)]
        radius_km: Option<f64>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List the operators in the dataset
    Operators,
}

#[derive(Args)]
struct OutputArgs {
    /// Only report these operators, can be repeated
    #[arg(long = "operator")]
    operators: Vec<String>,

    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[derive(Clone)]
struct Ring(Vec<(f64, f64)>);

fn parse_ring(s: &str) -> Result<Ring, String> {
    parse_vertices(s).map(Ring)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(&cli.config)?;
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }
    setup_logging(&settings.logging, cli.json_logs)
        .map_err(|e| anyhow!("failed to set up logging: {}", e))?;

    let dataset_path = cli.dataset.unwrap_or(settings.dataset);
    let dataset = load_dataset(&dataset_path)?;

    match cli.command {
        Command::Radius {
            lon,
            lat,
            radius_km,
            output,
        } => {
            let radius_km = radius_km.unwrap_or(settings.default_radius_km);
            let region = RegionDescriptor::circle(lon, lat, radius_km);
            query(&dataset, &region, &output)
        }
        Command::Polygon {
            vertices,
            geojson,
            radius_km,
            output,
        } => {
            let region = match (vertices, geojson) {
                (Some(Ring(vertices)), _) => RegionDescriptor::polygon(vertices),
                (None, Some(path)) => {
                    let text = fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    let radius_km = radius_km.unwrap_or(settings.default_radius_km);
                    RegionDescriptor::from_geojson(&text, radius_km)?
                }
                (None, None) => bail!("either --vertices or --geojson is required"),
            };
            query(&dataset, &region, &output)
        }
        Command::Operators => {
            let mut stdout = io::stdout().lock();
            for operator in dataset.operators() {
                writeln!(stdout, "{}", operator)?;
            }
            Ok(())
        }
    }
}

fn load_dataset(path: &Path) -> Result<Dataset> {
    info!("loading {}...", path.display());
    let bar = ProgressBar::new(0);
    bar.set_style(ProgressStyle::with_template(
        "[{elapsed}] {wide_bar} {percent}% ({eta})",
    )?);
    load_path(path, &bar).with_context(|| format!("failed to load {}", path.display()))
}

fn query(dataset: &Dataset, region: &RegionDescriptor, output: &OutputArgs) -> Result<()> {
    let allowlist: BTreeSet<String> = output.operators.iter().cloned().collect();
    let mut summaries = summarize(dataset, region, Some(&allowlist))?;

    if summaries.is_empty() {
        info!("no data points in the region");
    }
    sort_by_download_desc(&mut summaries);
    write_table(&summaries, output.format)
}

fn write_table(summaries: &[OperatorSummary], format: Format) -> Result<()> {
    match format {
        Format::Csv => write_summaries_csv(summaries, io::stdout())?,
        Format::Json => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, summaries)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_radius_with_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "speeds", "radius", "--lon", "-0.127", "--lat", "51.4475", "--operator", "EE",
        ])
        .unwrap();
        match cli.command {
            Command::Radius { lon, output, .. } => {
                assert_eq!(lon, -0.127);
                assert_eq!(output.operators, vec!["EE"]);
            }
            _ => panic!("expected the radius command"),
        }
    }

    #[test]
    fn test_polygon_needs_a_shape() {
        assert!(Cli::try_parse_from(["speeds", "polygon"]).is_err());
        assert!(Cli::try_parse_from([
            "speeds",
            "polygon",
            "--vertices",
            "0,0;1,0;1,1",
            "--geojson",
            "drawing.geojson"
        ])
        .is_err());
    }

    #[test]
    fn test_polygon_vertices() {
        let cli = Cli::try_parse_from([
            "speeds",
            "polygon",
            "--vertices",
            "103.6,1.4;103.8,1.4;103.8,1.6",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Command::Polygon {
                vertices: Some(Ring(vertices)),
                ..
            } => assert_eq!(vertices.len(), 3),
            _ => panic!("expected the polygon command"),
        }
    }
}
