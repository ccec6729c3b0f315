use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;

pub type RegionKey = String;

/// Value driving a region's fill: numeric for linear scales, a category name
/// for ordinal ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorValue {
    Number(f64),
    Category(String),
}

impl From<f64> for ColorValue {
    fn from(value: f64) -> Self {
        ColorValue::Number(value)
    }
}

impl From<&str> for ColorValue {
    fn from(value: &str) -> Self {
        ColorValue::Category(value.to_string())
    }
}

/// Per-region metric values valid at one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub timestamp: Timestamp,
    #[serde(default)]
    pub size: HashMap<RegionKey, f64>,
    #[serde(default)]
    pub color: HashMap<RegionKey, ColorValue>,
    #[serde(default)]
    pub label: HashMap<RegionKey, String>,
    /// Entity key -> geo id of the shape it describes, when the two differ.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub key_aliases: HashMap<RegionKey, String>,
}

impl Frame {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            size: HashMap::new(),
            color: HashMap::new(),
            label: HashMap::new(),
            key_aliases: HashMap::new(),
        }
    }

    pub fn with_size(mut self, key: impl Into<RegionKey>, value: f64) -> Self {
        self.size.insert(key.into(), value);
        self
    }

    pub fn with_color(mut self, key: impl Into<RegionKey>, value: impl Into<ColorValue>) -> Self {
        self.color.insert(key.into(), value.into());
        self
    }

    pub fn with_alias(mut self, key: impl Into<RegionKey>, geo_id: impl Into<String>) -> Self {
        self.key_aliases.insert(key.into(), geo_id.into());
        self
    }

    /// Finite size value for `key`, if any.
    pub fn size_of(&self, key: &str) -> Option<f64> {
        self.size.get(key).copied().filter(|v| v.is_finite())
    }

    pub fn color_of(&self, key: &str) -> Option<&ColorValue> {
        self.color.get(key)
    }

    pub fn label_of(&self, key: &str) -> Option<&str> {
        self.label.get(key).map(String::as_str)
    }

    pub fn max_size(&self) -> Option<f64> {
        self.size
            .values()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }
}
