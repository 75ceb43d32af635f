use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::tags::Tags;

fn feature_collection_type() -> String {
    "FeatureCollection".to_string()
}

fn feature_type() -> String {
    "Feature".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_type")]
    pub collection_type: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        FeatureCollection {
            collection_type: feature_collection_type(),
            features,
        }
    }
}

/// A GeoJSON feature. The geometry is carried through untouched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub feature_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub geometry: Value,
}

impl Feature {
    pub fn new(id: Option<Value>, geometry: Value, properties: Map<String, Value>) -> Self {
        Feature {
            feature_type: feature_type(),
            id,
            properties,
            geometry,
        }
    }

    /// The declared OSM element type: `node`, `way`, `relation`.
    pub fn osm_type(&self) -> Option<&str> {
        self.properties.get("type").and_then(Value::as_str)
    }

    pub fn tags(&self) -> Option<Tags> {
        self.properties.get("tags").and_then(Tags::from_json)
    }

    /// Human-readable identifier used in logs and errors.
    pub fn label(&self) -> String {
        match &self.id {
            Some(Value::String(id)) => id.clone(),
            Some(other) => other.to_string(),
            None => match (self.osm_type(), self.properties.get("id")) {
                (Some(osm_type), Some(id)) => format!("{}/{}", osm_type, id),
                _ => "<no id>".to_string(),
            },
        }
    }
}
