mod config;
mod cycling;
mod data;
mod errors;
mod etl;

use std::fs::create_dir_all;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::info;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use crate::config::{load_user_config, UserConfig};
use crate::errors::Result;
use crate::etl::classify_cycling::ClassifyCyclingEtl;
use crate::etl::fetch_overpass::FetchOverpassEtl;
use crate::etl::osm_to_geojson::OsmToGeoJsonEtl;
use crate::etl::Etl;

/// Fetch OpenStreetMap cycling infrastructure and reclassify it for the bike map.
#[derive(Parser, Debug)]
#[command(name = "bikemap_etl", author, version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, default_value = "config/charlotte.json")]
    config: PathBuf,

    /// Write compact output regardless of the configured `pretty` setting
    #[arg(long)]
    compact: bool,

    /// Discard cached stage outputs and run every stage again
    #[arg(long)]
    refresh: bool,
}

/// Working directory of a dataset under `root`.
fn create_output_dir(root: &Path, config: &UserConfig) -> Result<PathBuf> {
    if config.name.is_empty() {
        return Err("Config name must not be empty".into());
    }
    let output_dir = root.join(&config.name);
    create_dir_all(&output_dir)?;
    Ok(output_dir)
}

/// `--compact` wins over the configured `pretty` setting.
fn resolve_pretty(cli: &Cli, config: &UserConfig) -> bool {
    config.pretty && !cli.compact
}

fn clean_all(stages: &[&dyn Cleanable], dir: &Path) -> Result<()> {
    for stage in stages {
        stage.clean_output(dir)?;
    }
    Ok(())
}

/// Object-safe view of [`Etl::clean`], so stages with different inputs can be cleaned together.
trait Cleanable {
    fn clean_output(&self, dir: &Path) -> Result<()>;
}

impl<T: Etl> Cleanable for T {
    fn clean_output(&self, dir: &Path) -> Result<()> {
        self.clean(dir)
    }
}

fn setup_logging() {
    Builder::with_level("info")
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn main() -> Result<()> {
    setup_logging();

    let cli = Cli::parse();
    let user_config = load_user_config(&cli.config)?;
    let output_dir = create_output_dir(Path::new("output"), &user_config)?;
    let pretty = resolve_pretty(&cli, &user_config);

    let mut fetch = FetchOverpassEtl::new(&user_config);
    let mut convert = OsmToGeoJsonEtl::new();
    let mut classify = ClassifyCyclingEtl::new(&user_config, pretty);

    if cli.refresh {
        clean_all(&[&fetch, &convert, &classify], &output_dir)?;
    }

    fetch.process(&output_dir)?;
    convert.process(&output_dir)?;
    classify.process(&output_dir)?;

    info!(dest_path = user_config.dest_path.as_str(); "Wrote classified features");
    Ok(())
}
