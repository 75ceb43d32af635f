use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use xz::bufread::XzDecoder;

use crate::config::UserConfig;
use crate::data::osm::OverpassResponse;
use crate::errors::Result;

use super::{remove_if_exists, write_json, Etl};

pub const ETL_NAME: &str = "fetch_overpass";
pub const OUTPUT_FILE_NAME: &str = "overpass.json";

/// Slack on top of the server-side query timeout before the HTTP call gives up.
const HTTP_TIMEOUT_MARGIN_SECS: u64 = 30;

/// Cycle lanes and tracks on ways, dedicated cycleways, and bicycle route
/// relations inside the area, followed by the skeleton of everything they reference.
pub fn overpass_query(area_id: u64, timeout_secs: u64) -> String {
    format!(
        r#"[out:json][timeout:{timeout_secs}];
area(id:{area_id})->.searchArea;
(
  way[~"^cycleway:.*$"~"."](area.searchArea);
  way["highway"="cycleway"](area.searchArea);
  relation["route"="bicycle"](area.searchArea);
);
out body;
>;
out skel qt;
"#
    )
}

/// HTTP timeout for a query the server may run for `timeout_secs`.
pub fn http_timeout(timeout_secs: u64) -> Duration {
    Duration::from_secs(timeout_secs.saturating_add(HTTP_TIMEOUT_MARGIN_SECS))
}

/// Reads an Overpass JSON dump from disk, decompressing `.xz` files on the fly.
pub fn read_dump(path: &Path) -> Result<String> {
    let mut file_reader = BufReader::new(File::open(path)?);
    let mut text = String::new();
    if path.extension().is_some_and(|ext| ext == "xz") {
        XzDecoder::new(file_reader).read_to_string(&mut text)?;
    } else {
        file_reader.read_to_string(&mut text)?;
    }
    Ok(text)
}

pub struct FetchOverpassEtl<'a> {
    config: &'a UserConfig,
}

impl FetchOverpassEtl<'_> {
    pub fn new(config: &UserConfig) -> FetchOverpassEtl<'_> {
        FetchOverpassEtl { config }
    }

    pub fn output_path(dir: &Path) -> PathBuf {
        dir.join(OUTPUT_FILE_NAME)
    }

    fn fetch(&self) -> Result<String> {
        let query = overpass_query(self.config.area_id, self.config.timeout_secs);
        let agent = ureq::AgentBuilder::new()
            .timeout(http_timeout(self.config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build();

        info!(url = self.config.overpass_url.as_str(), area_id = self.config.area_id; "Querying Overpass API");
        let response = agent
            .get(&self.config.overpass_url)
            .query("data", &query)
            .call()?;

        let mut body = String::new();
        response.into_reader().read_to_string(&mut body)?;
        Ok(body)
    }
}

impl Etl for FetchOverpassEtl<'_> {
    type Input = String;
    type Output = OverpassResponse;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        Ok(Self::output_path(dir).try_exists()?)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        remove_if_exists(&Self::output_path(dir))
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        let body = match &self.config.input_path {
            Some(input_path) => {
                info!(path = input_path.as_str(); "Reading local Overpass dump");
                read_dump(Path::new(input_path))?
            }
            None => self.fetch()?,
        };
        info!(bytes = body.len(); "Received Overpass data");
        Ok(body)
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let response: OverpassResponse = serde_json::from_str(&input)?;
        if let Some(remark) = response.failure() {
            return Err(format!("Overpass query failed: {}", remark).into());
        }
        info!(elements = response.elements.len(); "Parsed Overpass response");
        Ok(response)
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        write_json(&Self::output_path(dir), &output, false)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::tempdir;
    use xz::write::XzEncoder;

    use super::*;
    use crate::cycling::partition::ErrorPolicy;

    const DUMP: &str = r#"{"elements": [{"type": "node", "id": 1, "lat": 35.2, "lon": -80.8}]}"#;

    fn config(input_path: Option<String>) -> UserConfig {
        UserConfig {
            name: "test".to_string(),
            area_id: 3600177415,
            overpass_url: "http://localhost:1/api/interpreter".to_string(),
            timeout_secs: 1,
            input_path,
            dest_path: "export.geojson".to_string(),
            pretty: true,
            error_policy: ErrorPolicy::FailFast,
        }
    }

    #[test]
    fn query_targets_area() {
        let query = overpass_query(42, 60);
        assert!(query.starts_with("[out:json][timeout:60];"));
        assert!(query.contains("area(id:42)->.searchArea;"));
        assert!(query.contains(r#"way["highway"="cycleway"](area.searchArea);"#));
        assert!(query.contains(r#"relation["route"="bicycle"](area.searchArea);"#));
        assert!(query.contains("out skel qt;"));
    }

    #[test]
    fn http_timeout_adds_margin_without_overflow() {
        assert_eq!(http_timeout(25), Duration::from_secs(55));
        assert_eq!(http_timeout(u64::MAX), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn reads_plain_and_xz_dumps() {
        let dir = tempdir().unwrap();

        let plain = dir.path().join("dump.json");
        std::fs::write(&plain, DUMP).unwrap();
        assert_eq!(read_dump(&plain).unwrap(), DUMP);

        let compressed = dir.path().join("dump.json.xz");
        let mut encoder = XzEncoder::new(File::create(&compressed).unwrap(), 6);
        encoder.write_all(DUMP.as_bytes()).unwrap();
        encoder.finish().unwrap();
        assert_eq!(read_dump(&compressed).unwrap(), DUMP);
    }

    #[test]
    fn processes_local_dump_and_caches() {
        let dir = tempdir().unwrap();
        let dump = dir.path().join("dump.json");
        std::fs::write(&dump, DUMP).unwrap();

        let config = config(Some(dump.to_string_lossy().into_owned()));
        let mut etl = FetchOverpassEtl::new(&config);
        assert!(!etl.is_cached(dir.path()).unwrap());

        etl.process(dir.path()).unwrap();
        assert!(etl.is_cached(dir.path()).unwrap());
        let cached: OverpassResponse =
            crate::etl::read_json(&FetchOverpassEtl::output_path(dir.path())).unwrap();
        assert_eq!(cached.elements.len(), 1);

        etl.clean(dir.path()).unwrap();
        assert!(!etl.is_cached(dir.path()).unwrap());
    }

    #[test]
    fn rejects_non_overpass_json() {
        let config = config(None);
        let mut etl = FetchOverpassEtl::new(&config);
        assert!(etl.transform(r#"{"features": []}"#.to_string()).is_err());
    }

    #[test]
    fn timed_out_query_is_not_cached() {
        let dir = tempdir().unwrap();
        let dump = dir.path().join("timeout.json");
        std::fs::write(
            &dump,
            r#"{"elements": [], "remark": "runtime error: Query timed out in \"query\" at line 3 after 26 seconds."}"#,
        )
        .unwrap();

        let config = config(Some(dump.to_string_lossy().into_owned()));
        let mut etl = FetchOverpassEtl::new(&config);
        let err = etl.process(dir.path()).unwrap_err();

        assert!(matches!(err, crate::errors::Error::Message(ref m) if m.contains("runtime error")));
        assert!(!etl.is_cached(dir.path()).unwrap());
    }
}
