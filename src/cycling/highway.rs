/// Which of the two closed sets of `highway` values a way falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighwayCategory {
    Road,
    Path,
}

impl HighwayCategory {
    pub fn from_highway(value: &str) -> Option<HighwayCategory> {
        match value {
            "motorway" | "trunk" | "primary" | "secondary" | "tertiary" | "unclassified"
            | "residential" | "motorway_link" | "trunk_link" | "primary_link"
            | "secondary_link" | "tertiary_link" | "living_street" | "service"
            | "pedestrian" | "track" | "bus_guideway" | "escape" | "raceway" | "road"
            | "busway" => Some(HighwayCategory::Road),
            "footway" | "bridleway" | "steps" | "corridor" | "path" | "via_ferrata"
            | "cycleway" => Some(HighwayCategory::Path),
            _ => None,
        }
    }
}
