use serde::{Deserialize, Serialize};

use super::tags::Tags;

pub type OsmId = u64;

/// Body of an Overpass API `[out:json]` response.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct OverpassResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    /// Set by the server when the query did not run to completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    pub elements: Vec<Element>,
}

impl OverpassResponse {
    /// The server's remark when it reports a failed or truncated query.
    pub fn failure(&self) -> Option<&str> {
        self.remark.as_deref().filter(|remark| {
            let remark = remark.trim_start();
            remark.starts_with("runtime error") || remark.starts_with("runtime remark")
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Node(Node),
    Way(Way),
    Relation(Relation),
}

impl Element {
    pub fn id(&self) -> OsmId {
        match self {
            Element::Node(node) => node.id,
            Element::Way(way) => way.id,
            Element::Relation(relation) => relation.id,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Node {
    pub id: OsmId,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Way {
    pub id: OsmId,
    #[serde(default)]
    pub nodes: Vec<OsmId>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: OsmId,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Member {
    #[serde(rename = "type")]
    pub member_type: MemberType,
    #[serde(rename = "ref")]
    pub reference: OsmId,
    #[serde(default)]
    pub role: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberType {
    Node,
    Way,
    Relation,
}

impl MemberType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberType::Node => "node",
            MemberType::Way => "way",
            MemberType::Relation => "relation",
        }
    }
}
