use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::info;
use serde_json::{json, Map, Value};

use crate::data::geojson::{Feature, FeatureCollection};
use crate::data::osm::{Element, MemberType, Node, OsmId, OverpassResponse, Relation, Way};
use crate::data::tags::Tags;
use crate::errors::Result;

use super::{fetch_overpass, read_json, remove_if_exists, write_json, Etl};

pub const ETL_NAME: &str = "osm_to_geojson";
pub const OUTPUT_FILE_NAME: &str = "features.geojson";

trait Tagged: Clone {
    fn tags(&self) -> &Tags;
}

impl Tagged for Node {
    fn tags(&self) -> &Tags {
        &self.tags
    }
}

impl Tagged for Way {
    fn tags(&self) -> &Tags {
        &self.tags
    }
}

impl Tagged for Relation {
    fn tags(&self) -> &Tags {
        &self.tags
    }
}

/// Keeps the first copy of an element, unless a later copy brings the tags the
/// first one was missing. Returns whether the element was seen for the first time.
fn merge_element<T: Tagged>(seen: &mut IndexMap<OsmId, T>, id: OsmId, element: &T) -> bool {
    match seen.get_mut(&id) {
        Some(existing) => {
            if existing.tags().is_empty() && !element.tags().is_empty() {
                *existing = element.clone();
            }
            false
        }
        None => {
            seen.insert(id, element.clone());
            true
        }
    }
}

fn way_coordinates(way: &Way, nodes: &IndexMap<OsmId, Node>) -> Vec<[f64; 2]> {
    way.nodes
        .iter()
        .filter_map(|node_id| nodes.get(node_id))
        .map(|node| [node.lon, node.lat])
        .collect()
}

fn base_properties(osm_type: MemberType, id: OsmId, tags: &Tags) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("type".to_string(), Value::from(osm_type.as_str()));
    properties.insert("id".to_string(), Value::from(id));
    if !tags.is_empty() {
        properties.insert("tags".to_string(), json!(tags));
    }
    properties
}

fn feature_id(osm_type: MemberType, id: OsmId) -> Option<Value> {
    Some(Value::from(format!("{}/{}", osm_type.as_str(), id)))
}

fn node_feature(node: &Node) -> Feature {
    Feature::new(
        feature_id(MemberType::Node, node.id),
        json!({"type": "Point", "coordinates": [node.lon, node.lat]}),
        base_properties(MemberType::Node, node.id, &node.tags),
    )
}

fn way_feature(way: &Way, nodes: &IndexMap<OsmId, Node>) -> Feature {
    let coordinates = way_coordinates(way, nodes);
    let geometry = if coordinates.len() >= 2 {
        json!({"type": "LineString", "coordinates": coordinates})
    } else {
        Value::Null
    };

    let mut properties = base_properties(MemberType::Way, way.id, &way.tags);
    properties.insert("nodes".to_string(), json!(way.nodes));
    Feature::new(feature_id(MemberType::Way, way.id), geometry, properties)
}

fn relation_feature(
    relation: &Relation,
    ways: &IndexMap<OsmId, Way>,
    nodes: &IndexMap<OsmId, Node>,
) -> Feature {
    let lines: Vec<Vec<[f64; 2]>> = relation
        .members
        .iter()
        .filter(|member| member.member_type == MemberType::Way)
        .filter_map(|member| ways.get(&member.reference))
        .map(|way| way_coordinates(way, nodes))
        .filter(|line| line.len() >= 2)
        .collect();
    let geometry = if lines.is_empty() {
        Value::Null
    } else {
        json!({"type": "MultiLineString", "coordinates": lines})
    };

    let members: Vec<Value> = relation
        .members
        .iter()
        .map(|member| {
            json!({
                "type": member.member_type.as_str(),
                "ref": member.reference,
                "role": member.role,
            })
        })
        .collect();
    let mut properties = base_properties(MemberType::Relation, relation.id, &relation.tags);
    properties.insert("members".to_string(), Value::Array(members));
    Feature::new(feature_id(MemberType::Relation, relation.id), geometry, properties)
}

/// Turns raw Overpass elements into GeoJSON features, one per tagged node, way and
/// relation, in the order the elements were first delivered.
pub fn osm_to_geojson(response: &OverpassResponse) -> FeatureCollection {
    let mut nodes: IndexMap<OsmId, Node> = IndexMap::new();
    let mut ways: IndexMap<OsmId, Way> = IndexMap::new();
    let mut relations: IndexMap<OsmId, Relation> = IndexMap::new();
    let mut order: Vec<(MemberType, OsmId)> = Vec::new();

    for element in &response.elements {
        let (member_type, first_seen) = match element {
            Element::Node(node) => (MemberType::Node, merge_element(&mut nodes, node.id, node)),
            Element::Way(way) => (MemberType::Way, merge_element(&mut ways, way.id, way)),
            Element::Relation(relation) => (
                MemberType::Relation,
                merge_element(&mut relations, relation.id, relation),
            ),
        };
        if first_seen {
            order.push((member_type, element.id()));
        }
    }

    // Untagged ways that only exist as parts of a relation are drawn by the relation.
    let relation_ways: HashSet<OsmId> = relations
        .values()
        .flat_map(|relation| relation.members.iter())
        .filter(|member| member.member_type == MemberType::Way)
        .map(|member| member.reference)
        .collect();

    let features: Vec<Feature> = order
        .iter()
        .filter_map(|(member_type, id)| match member_type {
            MemberType::Node => nodes
                .get(id)
                .filter(|node| !node.tags.is_empty())
                .map(node_feature),
            MemberType::Way => ways
                .get(id)
                .filter(|way| !(way.tags.is_empty() && relation_ways.contains(&way.id)))
                .map(|way| way_feature(way, &nodes)),
            MemberType::Relation => relations
                .get(id)
                .map(|relation| relation_feature(relation, &ways, &nodes)),
        })
        .collect();

    info!(
        nodes = nodes.len(),
        ways = ways.len(),
        relations = relations.len(),
        features = features.len();
        "Converted OSM elements to GeoJSON"
    );

    FeatureCollection::new(features)
}

pub struct OsmToGeoJsonEtl {}

impl OsmToGeoJsonEtl {
    pub fn new() -> OsmToGeoJsonEtl {
        OsmToGeoJsonEtl {}
    }

    pub fn output_path(dir: &Path) -> PathBuf {
        dir.join(OUTPUT_FILE_NAME)
    }
}

impl Etl for OsmToGeoJsonEtl {
    type Input = OverpassResponse;
    type Output = FeatureCollection;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        Ok(Self::output_path(dir).try_exists()?)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        remove_if_exists(&Self::output_path(dir))
    }

    fn extract(&mut self, dir: &Path) -> Result<Self::Input> {
        read_json(&dir.join(fetch_overpass::OUTPUT_FILE_NAME))
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        Ok(osm_to_geojson(&input))
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        write_json(&Self::output_path(dir), &output, false)
    }
}
