//! Air-quality surface CLI.
//!
//! Builds an interpolated surface from a station feed and a region boundary,
//! then either writes the whole grid or answers point queries:
//! - `grid`: masked lattice as JSON (nulls outside the boundary)
//! - `query`: values and AQI bands at one or more `lon,lat` points

mod config;
mod input;
mod output;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use surface::{Surface, SurfaceCache, SurfaceEngine};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::ConfigOverrides;
use output::QueryResponse;

#[derive(Parser, Debug)]
#[command(name = "surface-cli")]
#[command(about = "Interpolate air-quality surfaces from monitoring stations")]
struct Cli {
    /// YAML configuration file (replaces SURFACE_* environment settings)
    #[arg(long, global = true, env = "SURFACE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Abort when the surface takes longer than this many seconds
    #[arg(long, global = true, default_value = "300")]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the masked prediction grid as JSON
    Grid {
        #[command(flatten)]
        inputs: SurfaceInputs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Query the surface at one or more points
    Query {
        #[command(flatten)]
        inputs: SurfaceInputs,

        /// Query point as `lon,lat` (repeatable)
        #[arg(long = "point", required = true, value_parser = input::parse_point)]
        points: Vec<(f64, f64)>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct SurfaceInputs {
    /// Station feed JSON
    #[arg(short, long)]
    stations: PathBuf,

    /// Region boundary GeoJSON
    #[arg(short, long)]
    boundary: PathBuf,

    /// Bounding box as `lat1,lon1,lat2,lon2` (default: boundary extent)
    #[arg(long)]
    bbox: Option<String>,

    /// Lattice sites per axis
    #[arg(short, long)]
    resolution: Option<usize>,

    /// Fixed UTM zone (default: zone of the bounding box center)
    #[arg(long)]
    utm_zone: Option<u8>,

    /// Drop outside-boundary answers farther than this from any valid site
    #[arg(long)]
    max_fallback_distance_m: Option<f64>,
}

impl SurfaceInputs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            resolution: self.resolution,
            utm_zone: self.utm_zone,
            max_fallback_distance_m: self.max_fallback_distance_m,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs)?;

    let timeout = Duration::from_secs(cli.timeout_secs);
    match &cli.command {
        Command::Grid { inputs, output } => {
            let surface = build_surface(cli.config.as_deref(), inputs, timeout).await?;
            output::write_json(&surface.to_export(), output.as_deref())?;
        }
        Command::Query {
            inputs,
            points,
            output,
        } => {
            let surface = build_surface(cli.config.as_deref(), inputs, timeout).await?;
            let response = QueryResponse::from_surface(&surface, points);
            output::write_json(&response, output.as_deref())?;
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries the JSON result, so logs go to stderr
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

async fn build_surface(
    config_path: Option<&std::path::Path>,
    inputs: &SurfaceInputs,
    timeout: Duration,
) -> Result<Arc<Surface>> {
    let config = config::resolve(config_path, &inputs.overrides())?;

    let stations = input::load_stations(&inputs.stations)?;
    let boundary = input::load_boundary(&inputs.boundary)?;
    let bbox = input::resolve_bbox(inputs.bbox.as_deref(), &boundary)?;

    info!(
        stations = stations.len(),
        resolution = config.resolution,
        lat_min = bbox.lat_min,
        lat_max = bbox.lat_max,
        lon_min = bbox.lon_min,
        lon_max = bbox.lon_max,
        "Building surface"
    );

    let cache = SurfaceCache::from_config(&config);
    let engine = Arc::new(SurfaceEngine::new(config)?);
    let request = engine.request(stations, bbox, boundary);

    let surface = tokio::time::timeout(timeout, cache.get_or_compute(engine, request))
        .await
        .with_context(|| format!("Surface computation exceeded {}s", timeout.as_secs()))?
        .context("Surface computation failed")?;

    info!(
        crs = %surface.crs(),
        method = %surface.strategy(),
        params = %surface.description(),
        valid_sites = surface.grid().valid_count(),
        "Surface ready"
    );
    Ok(surface)
}
