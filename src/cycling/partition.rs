use log::{info, warn};
use serde::Deserialize;

use crate::cycling::classifier::{classify_feature, Classified};
use crate::data::geojson::{Feature, FeatureCollection};
use crate::errors::{Error, Result};

/// What to do when a single feature cannot be classified because of bad input.
#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Abort the whole run on the first bad feature.
    #[default]
    FailFast,
    /// Drop the bad feature, remember why, and keep going.
    SkipAndReport,
}

#[derive(Debug)]
pub struct RejectedFeature {
    pub feature: String,
    pub error: Error,
}

/// Classified features split by bucket, plus what was left out of the output.
#[derive(Debug, Default)]
pub struct Partition {
    pub relations: Vec<Feature>,
    pub ways: Vec<Feature>,
    pub unknown: usize,
    pub rejected: Vec<RejectedFeature>,
}

impl Partition {
    pub fn log_summary(&self) {
        if self.unknown > 0 {
            info!(count = self.unknown; "Unknown features");
        }
        if !self.rejected.is_empty() {
            for rejected in &self.rejected {
                warn!(feature = rejected.feature.as_str(), err = rejected.error.to_string(); "Rejected feature");
            }
            warn!(count = self.rejected.len(); "Rejected features");
        }
        info!(count = self.relations.len(); "Relation features");
        info!(count = self.ways.len(); "Way features");
    }

    /// Relations first, then ways, each in input order.
    pub fn into_collection(self) -> FeatureCollection {
        let mut features = self.relations;
        features.extend(self.ways);
        FeatureCollection::new(features)
    }
}

/// Runs every feature through the classifier and sorts the results into buckets.
pub fn partition<'a, I>(features: I, policy: ErrorPolicy) -> Result<Partition>
where
    I: IntoIterator<Item = &'a Feature>,
{
    let mut partition = Partition::default();

    for feature in features {
        let classified = match feature.osm_type() {
            Some("relation") | Some("way") => classify_feature(feature),
            _ => Ok(Classified::Unclassifiable),
        };

        match classified {
            Ok(Classified::Relation(classified)) => partition.relations.push(classified),
            Ok(Classified::Way(classified)) => partition.ways.push(classified),
            Ok(Classified::Unclassifiable) => partition.unknown += 1,
            Err(err) => match policy {
                ErrorPolicy::FailFast => return Err(err),
                ErrorPolicy::SkipAndReport => partition.rejected.push(RejectedFeature {
                    feature: feature.label(),
                    error: err,
                }),
            },
        }
    }

    Ok(partition)
}
