//! Plain-data feature records.
//!
//! A [`Feature`] is an identified bag of named attribute values with an
//! optional point geometry. The editor logic never interprets attribute
//! values beyond equality, so [`Value`] stays a small closed enum.

use std::collections::BTreeMap;
use std::fmt;

use crate::geometry::Point;

/// Stable identifier of a feature within its store.
pub type FeatureId = i64;

/// An attribute value. `Null` compares equal only to `Null`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Double(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
        }
    }
}

/// Attribute name to value. Ordered so record snapshots compare and
/// print deterministically.
pub type AttributeMap = BTreeMap<String, Value>;

/// A single record of a feature store.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    id: FeatureId,
    attributes: AttributeMap,
    geometry: Option<Point>,
}

impl Feature {
    pub fn new(id: FeatureId, attributes: AttributeMap) -> Self {
        Self {
            id,
            attributes,
            geometry: None,
        }
    }

    pub fn with_geometry(id: FeatureId, attributes: AttributeMap, geometry: Point) -> Self {
        Self {
            id,
            attributes,
            geometry: Some(geometry),
        }
    }

    pub fn id(&self) -> FeatureId {
        self.id
    }

    /// Look up an attribute by name. Missing attributes read as `Null`,
    /// so relation field matching treats them like unset foreign keys.
    pub fn attribute(&self, name: &str) -> Value {
        self.attributes.get(name).cloned().unwrap_or(Value::Null)
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn set_attribute(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.to_string(), value);
    }

    pub fn geometry(&self) -> Option<Point> {
        self.geometry
    }
}

/// Per-feature edit status as reported by a store's edit buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EditState {
    pub added: bool,
    pub attributes_changed: bool,
    pub geometry_changed: bool,
}

impl EditState {
    pub fn is_edited(&self) -> bool {
        self.added || self.attributes_changed || self.geometry_changed
    }
}
