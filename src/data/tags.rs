use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw OSM tags, in the order they were delivered.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Tags(IndexMap<String, String>);

/// Side of the carriageway a cycleway tag refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    /// Keys consulted for the cycleway on this side, most specific first.
    pub fn cycleway_keys(&self) -> [String; 3] {
        [
            format!("cycleway:{}", self.as_str()),
            "cycleway:both".to_string(),
            "cycleway".to_string(),
        ]
    }

    /// Keys consulted for the cycleway buffer on this side, most specific first.
    pub fn cycleway_buffer_keys(&self) -> [String; 3] {
        [
            format!("cycleway:{}:buffer", self.as_str()),
            "cycleway:both:buffer".to_string(),
            "cycleway:buffer".to_string(),
        ]
    }
}

impl Tags {
    /// Reads a `tags` object out of GeoJSON properties. Scalars are kept in their
    /// textual form, nested values are dropped. Anything but an object yields `None`.
    pub fn from_json(value: &Value) -> Option<Tags> {
        let object = value.as_object()?;
        let tags = object
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((key.clone(), text))
            })
            .collect();
        Some(Tags(tags))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is(&self, key: &str, value: &str) -> bool {
        self.get(key) == Some(value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Walks `keys` in order and returns the first one whose value is present and
    /// non-empty, together with that value.
    pub fn first_non_empty<'a, K: AsRef<str>>(&'a self, keys: &[K]) -> Option<(&'a str, &'a str)> {
        keys.iter().find_map(|key| {
            let (key, value) = self.0.get_key_value(key.as_ref())?;
            if value.is_empty() {
                None
            } else {
                Some((key.as_str(), value.as_str()))
            }
        })
    }

    pub fn highway(&self) -> Option<&str> {
        self.get("highway")
    }

    pub fn bicycle(&self) -> Option<&str> {
        self.get("bicycle")
    }

    /// The relation's `type` tag, e.g. `route` or `multipolygon`.
    pub fn relation_type(&self) -> Option<&str> {
        self.get("type")
    }

    pub fn cycleway(&self, side: Side) -> Option<&str> {
        self.first_non_empty(&side.cycleway_keys())
            .map(|(_, value)| value)
    }

    pub fn cycleway_buffer(&self, side: Side) -> Option<&str> {
        self.first_non_empty(&side.cycleway_buffer_keys())
            .map(|(_, value)| value)
    }

    /// Copies every tag into `properties` as a string, overriding same-named keys.
    pub fn flatten_into(&self, properties: &mut Map<String, Value>) {
        for (key, value) in self.iter() {
            properties.insert(key.to_string(), Value::String(value.to_string()));
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Tags(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
