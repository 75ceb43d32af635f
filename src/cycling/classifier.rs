use serde_json::{Map, Value};

use crate::cycling::buffer::parse_buffer;
use crate::cycling::highway::HighwayCategory;
use crate::data::geojson::Feature;
use crate::data::tags::{Side, Tags};
use crate::errors::Result;

pub const HIGHWAY_TYPE_KEY: &str = "highwayType";
pub const BICYCLE_KEY: &str = "bicycle";

/// Outcome of classifying a single feature.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Relation(Feature),
    Way(Feature),
    Unclassifiable,
}

fn cycleway_key(side: Side) -> &'static str {
    match side {
        Side::Left => "cyclewayLeft",
        Side::Right => "cyclewayRight",
    }
}

fn cycleway_buffer_key(side: Side) -> &'static str {
    match side {
        Side::Left => "cyclewayLeftBuffer",
        Side::Right => "cyclewayRightBuffer",
    }
}

/// New properties: the originals with every tag copied over them.
fn flattened(feature: &Feature, tags: &Tags) -> Map<String, Value> {
    let mut properties = feature.properties.clone();
    tags.flatten_into(&mut properties);
    properties
}

fn with_properties(feature: &Feature, properties: Map<String, Value>) -> Feature {
    Feature::new(feature.id.clone(), feature.geometry.clone(), properties)
}

fn bicycle_access(tags: &Tags) -> &'static str {
    if tags.is("highway", "cycleway") || tags.bicycle() == Some("designated") {
        "designated"
    } else if tags.bicycle() == Some("yes") {
        "yes"
    } else {
        "unknown"
    }
}

fn transform_path(feature: &Feature, tags: &Tags) -> Feature {
    let mut properties = flattened(feature, tags);
    properties.insert(HIGHWAY_TYPE_KEY.to_string(), Value::from("path"));
    properties.insert(BICYCLE_KEY.to_string(), Value::from(bicycle_access(tags)));
    with_properties(feature, properties)
}

fn transform_road(feature: &Feature, tags: &Tags) -> Result<Feature> {
    let mut properties = flattened(feature, tags);
    for side in [Side::Left, Side::Right] {
        if let Some(cycleway) = tags.cycleway(side) {
            properties.insert(cycleway_key(side).to_string(), Value::from(cycleway));
        }
        if parse_buffer(tags.cycleway_buffer(side))? {
            properties.insert(cycleway_buffer_key(side).to_string(), Value::from("yes"));
        }
    }
    Ok(with_properties(feature, properties))
}

fn classify_relation(feature: &Feature) -> Classified {
    match feature.tags() {
        Some(tags) if tags.relation_type() == Some("route") => {
            Classified::Relation(with_properties(feature, flattened(feature, &tags)))
        }
        _ => Classified::Unclassifiable,
    }
}

fn classify_way(feature: &Feature) -> Result<Classified> {
    let tags = match feature.tags() {
        Some(tags) => tags,
        None => return Ok(Classified::Unclassifiable),
    };
    let category = tags.highway().and_then(HighwayCategory::from_highway);
    Ok(match category {
        Some(HighwayCategory::Road) => Classified::Way(transform_road(feature, &tags)?),
        Some(HighwayCategory::Path) => Classified::Way(transform_path(feature, &tags)),
        None => Classified::Unclassifiable,
    })
}

/// Classifies one feature by its declared OSM type. The input is left untouched.
///
/// Only a malformed buffer value is an error; every other feature that does not
/// fit the schema comes back as [`Classified::Unclassifiable`].
pub fn classify_feature(feature: &Feature) -> Result<Classified> {
    match feature.osm_type() {
        Some("relation") => Ok(classify_relation(feature)),
        Some("way") => classify_way(feature).map_err(|err| err.for_feature(&feature.label())),
        _ => Ok(Classified::Unclassifiable),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::errors::Error;

    fn way(tags: Value) -> Feature {
        serde_json::from_value(json!({
            "type": "Feature",
            "id": "way/1",
            "properties": {"type": "way", "id": 1, "tags": tags},
            "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]}
        }))
        .unwrap()
    }

    fn relation(tags: Value) -> Feature {
        serde_json::from_value(json!({
            "type": "Feature",
            "id": "relation/2",
            "properties": {"type": "relation", "id": 2, "tags": tags},
            "geometry": null
        }))
        .unwrap()
    }

    fn classified_way(feature: &Feature) -> Feature {
        match classify_feature(feature).unwrap() {
            Classified::Way(feature) => feature,
            other => panic!("expected a classified way, got {:?}", other),
        }
    }

    #[test]
    fn plain_road_gets_no_cycleway_fields() {
        for highway in ["primary", "residential", "service", "trunk_link"] {
            let out = classified_way(&way(json!({"highway": highway, "name": "Main St"})));
            for key in ["cyclewayLeft", "cyclewayRight", "cyclewayLeftBuffer", "cyclewayRightBuffer"] {
                assert!(!out.properties.contains_key(key), "{} set on {}", key, highway);
            }
            assert_eq!(out.properties["name"], json!("Main St"));
            assert!(!out.properties.contains_key(HIGHWAY_TYPE_KEY));
        }
    }

    #[test]
    fn road_sides_follow_fallback_chain() {
        let out = classified_way(&way(json!({
            "highway": "secondary",
            "cycleway:left": "lane",
            "cycleway:both": "track",
            "cycleway": "shared"
        })));
        assert_eq!(out.properties["cyclewayLeft"], json!("lane"));
        assert_eq!(out.properties["cyclewayRight"], json!("track"));

        let out = classified_way(&way(json!({
            "highway": "secondary",
            "cycleway:both": "track",
            "cycleway": "shared"
        })));
        assert_eq!(out.properties["cyclewayLeft"], json!("track"));
        assert_eq!(out.properties["cyclewayRight"], json!("track"));
    }

    #[test]
    fn road_sides_are_independent() {
        let out = classified_way(&way(json!({"highway": "tertiary", "cycleway:right": "lane"})));
        assert_eq!(out.properties["cyclewayRight"], json!("lane"));
        assert!(!out.properties.contains_key("cyclewayLeft"));
    }

    #[test]
    fn road_buffers() {
        let out = classified_way(&way(json!({
            "highway": "primary",
            "cycleway:both": "lane",
            "cycleway:left:buffer": "0.5 m",
            "cycleway:right:buffer": "no"
        })));
        assert_eq!(out.properties["cyclewayLeftBuffer"], json!("yes"));
        assert!(!out.properties.contains_key("cyclewayRightBuffer"));

        let out = classified_way(&way(json!({"highway": "primary", "cycleway:buffer": "yes"})));
        assert_eq!(out.properties["cyclewayLeftBuffer"], json!("yes"));
        assert_eq!(out.properties["cyclewayRightBuffer"], json!("yes"));
    }

    #[test]
    fn malformed_buffer_names_the_feature() {
        let err = classify_feature(&way(json!({
            "highway": "primary",
            "cycleway:left:buffer": "wide"
        })))
        .unwrap_err();

        match err {
            Error::MalformedBufferValue { value, feature } => {
                assert_eq!(value, "wide");
                assert_eq!(feature.as_deref(), Some("way/1"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn cycleway_is_always_designated() {
        for bicycle in [None, Some("no"), Some("yes"), Some("designated")] {
            let mut tags = json!({"highway": "cycleway"});
            if let Some(bicycle) = bicycle {
                tags["bicycle"] = json!(bicycle);
            }
            let out = classified_way(&way(tags));
            assert_eq!(out.properties[BICYCLE_KEY], json!("designated"));
            assert_eq!(out.properties[HIGHWAY_TYPE_KEY], json!("path"));
        }
    }

    #[test]
    fn path_bicycle_access() {
        let out = classified_way(&way(json!({"highway": "footway", "bicycle": "designated"})));
        assert_eq!(out.properties[BICYCLE_KEY], json!("designated"));

        let out = classified_way(&way(json!({"highway": "path", "bicycle": "yes"})));
        assert_eq!(out.properties[BICYCLE_KEY], json!("yes"));

        let out = classified_way(&way(json!({"highway": "footway", "bicycle": "no"})));
        assert_eq!(out.properties[BICYCLE_KEY], json!("unknown"));

        let out = classified_way(&way(json!({"highway": "steps"})));
        assert_eq!(out.properties[BICYCLE_KEY], json!("unknown"));
        assert_eq!(out.properties[HIGHWAY_TYPE_KEY], json!("path"));
    }

    #[test]
    fn unknown_highway_is_unclassifiable() {
        let result = classify_feature(&way(json!({"highway": "proposed"}))).unwrap();
        assert_eq!(result, Classified::Unclassifiable);

        let result = classify_feature(&way(json!({"cycleway:left": "lane"}))).unwrap();
        assert_eq!(result, Classified::Unclassifiable);
    }

    #[test]
    fn tagless_way_is_unclassifiable() {
        let feature: Feature = serde_json::from_value(json!({
            "properties": {"type": "way", "id": 5},
            "geometry": null
        }))
        .unwrap();
        assert_eq!(classify_feature(&feature).unwrap(), Classified::Unclassifiable);
    }

    #[test]
    fn route_relation_is_flattened() {
        let feature = relation(json!({"type": "route", "route": "bicycle", "ref": "4"}));
        match classify_feature(&feature).unwrap() {
            Classified::Relation(out) => {
                assert_eq!(out.properties["type"], json!("route"));
                assert_eq!(out.properties["route"], json!("bicycle"));
                assert_eq!(out.properties["ref"], json!("4"));
                assert_eq!(out.properties["id"], json!(2));
                assert_eq!(out.geometry, Value::Null);
            }
            other => panic!("expected a relation, got {:?}", other),
        }
    }

    #[test]
    fn other_relations_are_unclassifiable() {
        for tags in [json!({"type": "multipolygon"}), json!({"route": "bicycle"})] {
            assert_eq!(classify_feature(&relation(tags)).unwrap(), Classified::Unclassifiable);
        }
    }

    #[test]
    fn nodes_are_unclassifiable() {
        let feature: Feature = serde_json::from_value(json!({
            "properties": {"type": "node", "tags": {"highway": "crossing"}},
            "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}
        }))
        .unwrap();
        assert_eq!(classify_feature(&feature).unwrap(), Classified::Unclassifiable);
    }

    #[test]
    fn tags_survive_classification() {
        let tags = json!({
            "highway": "residential",
            "cycleway:right": "lane",
            "cycleway:right:buffer": "1 ft",
            "surface": "asphalt",
            "maxspeed": "25 mph"
        });
        let input = way(tags.clone());
        let out = classified_way(&input);

        for (key, value) in tags.as_object().unwrap() {
            assert_eq!(&out.properties[key], value, "tag {} changed", key);
        }
        assert_eq!(out.geometry, input.geometry);
        assert_eq!(out.id, input.id);
        assert_eq!(input.properties.len(), 3);
    }
}
