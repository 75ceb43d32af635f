use std::path::{Path, PathBuf};

use crate::config::UserConfig;
use crate::cycling::partition::{partition, ErrorPolicy};
use crate::data::geojson::FeatureCollection;
use crate::errors::Result;

use super::{osm_to_geojson, read_json, remove_if_exists, write_json, Etl};

pub const ETL_NAME: &str = "classify_cycling";

pub struct ClassifyCyclingEtl {
    dest_path: PathBuf,
    pretty: bool,
    error_policy: ErrorPolicy,
}

impl ClassifyCyclingEtl {
    pub fn new(config: &UserConfig, pretty: bool) -> ClassifyCyclingEtl {
        ClassifyCyclingEtl {
            dest_path: PathBuf::from(&config.dest_path),
            pretty,
            error_policy: config.error_policy,
        }
    }
}

impl Etl for ClassifyCyclingEtl {
    type Input = FeatureCollection;
    type Output = FeatureCollection;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    // Classification is cheap and its rules change, always rerun it.
    fn is_cached(&self, _dir: &Path) -> Result<bool> {
        Ok(false)
    }

    fn clean(&self, _dir: &Path) -> Result<()> {
        remove_if_exists(&self.dest_path)
    }

    fn extract(&mut self, dir: &Path) -> Result<Self::Input> {
        read_json(&dir.join(osm_to_geojson::OUTPUT_FILE_NAME))
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let partition = partition(tqdm::tqdm(input.features.iter()), self.error_policy)?;
        partition.log_summary();
        Ok(partition.into_collection())
    }

    fn load(&mut self, _dir: &Path, output: Self::Output) -> Result<()> {
        write_json(&self.dest_path, &output, self.pretty)
    }
}
