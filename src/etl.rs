pub mod classify_cycling;
pub mod fetch_overpass;
pub mod osm_to_geojson;

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::{error, info};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::Result;

pub trait Etl {
    type Input;
    type Output;

    fn etl_name(&self) -> &str;

    fn is_cached(&self, dir: &Path) -> Result<bool>;
    fn clean(&self, dir: &Path) -> Result<()>;

    fn extract(&mut self, dir: &Path) -> Result<Self::Input>;
    fn transform(&mut self, input: Self::Input) -> Result<Self::Output>;
    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()>;

    fn process(&mut self, dir: &Path) -> Result<()> {
        let name = self.etl_name().to_string();
        info!(etl_name = name.as_str(); "Starting ETL process");
        if self.is_cached(dir)? {
            info!(etl_name = name.as_str(); "Using cached value");
        } else {
            let input = run_phase(&name, "Extracting", || self.extract(dir))?;
            let output = run_phase(&name, "Transforming", || self.transform(input))?;
            run_phase(&name, "Loading", || self.load(dir, output))?;
        }
        info!(etl_name = name.as_str(); "Process finished");
        Ok(())
    }
}

/// Runs one stage phase, logging its start and any error it fails with.
fn run_phase<T>(etl_name: &str, phase: &str, run: impl FnOnce() -> Result<T>) -> Result<T> {
    info!(etl_name = etl_name, phase = phase; "Running phase");
    run().inspect_err(|err| {
        error!(etl_name = etl_name, phase = phase, err = err.to_string(); "Phase failed with error");
    })
}

/// Removes a stage output if it exists.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    if path.try_exists()? {
        fs::remove_file(path)?;
    }
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Writes `value` as JSON, indented when `pretty` is set.
pub fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(path)?);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writer.flush()?;
    Ok(())
}
