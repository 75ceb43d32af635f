use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::cycling::partition::ErrorPolicy;
use crate::errors::Result;

fn default_area_id() -> u64 {
    3600177415
}

fn default_overpass_url() -> String {
    "http://overpass-api.de/api/interpreter".to_string()
}

fn default_timeout_secs() -> u64 {
    25
}

fn default_pretty() -> bool {
    true
}

#[derive(Deserialize, Debug, Clone)]
pub struct UserConfig {
    pub name: String,
    #[serde(default = "default_area_id")]
    pub area_id: u64,
    #[serde(default = "default_overpass_url")]
    pub overpass_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Local Overpass JSON dump (optionally `.xz`) used instead of querying the API.
    #[serde(default)]
    pub input_path: Option<String>,
    pub dest_path: String,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

pub fn load_user_config(path: &Path) -> Result<UserConfig> {
    let file = File::open(path)
        .map_err(|err| format!("Could not open config file {}: {}", path.display(), err))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
