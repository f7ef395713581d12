//! Tile pyramid generator.
//!
//! Renders census tract choropleths from GeoJSON into a z/x/y PNG pyramid,
//! and dumps color ramps for the web client.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use renderer::{build_ramp, RenderOptions, DEFAULT_SAMPLES};
use tile_common::layer::DEFAULT_POPULATION_ATTRIBUTE;
use tile_common::ZeroFlag;
use tile_pyramid::{run, LayersFile, PyramidConfig, TracingObserver, DEFAULT_RAMP, DEFAULT_ZOOM};

#[derive(Parser, Debug)]
#[command(name = "tile-pyramid")]
#[command(about = "Render census tract choropleths into a z/x/y PNG tile pyramid")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, default_value = "info", env = "TILE_PYRAMID_LOG_LEVEL", global = true)]
    log_level: String,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a tile pyramid from GeoJSON tract files
    Render(RenderArgs),
    /// Print a color ramp as a JavaScript Colormap literal
    Colormap(ColormapArgs),
}

#[derive(ClapArgs, Debug)]
struct RenderArgs {
    /// GeoJSON FeatureCollection files, concatenated in order
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long, env = "TILE_PYRAMID_OUTPUT")]
    output: PathBuf,

    /// Zoom level
    #[arg(short, long, default_value_t = DEFAULT_ZOOM)]
    zoom: u32,

    /// First tile column (default: from data extent)
    #[arg(short = 'x', long)]
    min_x: Option<u32>,

    /// Last tile column (default: from data extent)
    #[arg(short = 'X', long)]
    max_x: Option<u32>,

    /// First tile row (default: from data extent)
    #[arg(short = 'y', long)]
    min_y: Option<u32>,

    /// Last tile row (default: from data extent)
    #[arg(short = 'Y', long)]
    max_y: Option<u32>,

    /// Color ramp name (append `_r` to reverse)
    #[arg(short, long, default_value = DEFAULT_RAMP)]
    cmap: String,

    /// Total population attribute; tracts where it is 0 are drawn gray
    #[arg(short = 't', long, default_value = DEFAULT_POPULATION_ATTRIBUTE)]
    total_pop: String,

    /// Skip the gray overlay for unpopulated tracts
    #[arg(long, conflicts_with = "total_pop")]
    no_zero_flag: bool,

    /// YAML file with layer names and value ranges
    #[arg(long)]
    layers_config: Option<PathBuf>,

    /// Tile edge length in pixels
    #[arg(long, default_value_t = 256)]
    tile_size: u32,

    /// Entries sampled from continuous ramps
    #[arg(long, default_value_t = DEFAULT_SAMPLES)]
    samples: usize,

    /// Disable anti-aliasing of polygon edges
    #[arg(long)]
    no_anti_alias: bool,

    /// Stop at the first failed tile
    #[arg(long)]
    fail_fast: bool,
}

#[derive(ClapArgs, Debug)]
struct ColormapArgs {
    /// Color ramp name (append `_r` to reverse)
    #[arg(short, long, default_value = "YlGn")]
    cmap: String,

    /// Entries sampled from continuous ramps
    #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLES)]
    samples: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level, args.verbose, args.json_logs)?;

    match args.command {
        Command::Render(render) => render_command(render),
        Command::Colormap(colormap) => colormap_command(colormap),
    }
}

/// Logs go to stderr so `colormap` output can be redirected cleanly.
/// `RUST_LOG` takes precedence over `--log-level`.
fn init_tracing(log_level: &str, verbose: bool, json: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => default_filter(log_level, verbose)?,
    };

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        let subscriber = builder.with_target(true).with_thread_ids(true).json().finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = builder.with_target(false).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Filter used when `RUST_LOG` is unset. `-v` raises anything below debug.
fn default_filter(log_level: &str, verbose: bool) -> Result<EnvFilter> {
    let directive = if verbose && !log_level.eq_ignore_ascii_case("trace") {
        "debug"
    } else {
        log_level
    };
    EnvFilter::try_new(directive).with_context(|| format!("Invalid log level '{}'", log_level))
}

fn render_command(args: RenderArgs) -> Result<()> {
    let config = build_config(&args)?;

    info!(inputs = args.inputs.len(), "Loading features");
    let features = geojson_parser::read_feature_files(&args.inputs)
        .context("Failed to load input features")?;
    info!(features = features.len(), crs = %features.crs(), "Loaded features");

    let report = match run(features, &config, &TracingObserver) {
        Ok(report) => report,
        Err(e) if e.is_setup_error() => return Err(anyhow::Error::new(e).context("Invalid run setup")),
        Err(e) => return Err(anyhow::Error::new(e).context("Tile pyramid run aborted")),
    };

    if !report.is_success() {
        for failure in &report.failures {
            eprintln!(
                "{} [{}]: {}",
                failure.coord,
                failure.layer.as_deref().unwrap_or("-"),
                failure.error
            );
        }
        bail!(
            "{} of {} tiles failed",
            report.failures.len(),
            report.tiles_attempted
        );
    }
    Ok(())
}

fn build_config(args: &RenderArgs) -> Result<PyramidConfig> {
    let mut config = PyramidConfig::new(&args.output).with_ramp(&args.cmap);
    config.zoom = args.zoom;
    config.min_x = args.min_x;
    config.max_x = args.max_x;
    config.min_y = args.min_y;
    config.max_y = args.max_y;
    config.samples = args.samples;
    config.fail_fast = args.fail_fast;
    config.options = RenderOptions {
        size: args.tile_size,
        anti_alias: !args.no_anti_alias,
    };
    config.zero_flag = if args.no_zero_flag {
        ZeroFlag::Disabled
    } else {
        ZeroFlag::Attribute(args.total_pop.clone())
    };

    if let Some(path) = &args.layers_config {
        let file = LayersFile::load(path)
            .with_context(|| format!("Failed to load layers config {}", path.display()))?;
        config.apply_layers_file(file);
    }

    config.validate()?;
    Ok(config)
}

fn colormap_command(args: ColormapArgs) -> Result<()> {
    let ramp = build_ramp(&args.cmap, args.samples)?;
    print!("{}", ramp.to_js_snippet());
    Ok(())
}
