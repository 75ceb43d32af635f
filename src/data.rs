pub mod geojson;
pub mod osm;
pub mod tags;
