//! Reclassification of raw OSM tags into the normalized cycling schema
//! (cycleway side, buffer, bicycle access, highway type).

pub mod buffer;
pub mod classifier;
pub mod highway;
pub mod partition;
