//! Zone features loaded from a polygon file.

use geo::{BoundingRect, Geometry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::GeoBbox;

/// Display name used when a feature carries no usable area name
pub const UNNAMED_ZONE: &str = "Unnamed Zone";

/// Value of the zone index property.
///
/// The loader assigns a position-based number when the property is absent,
/// but hand-authored files may carry strings or an explicit `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ZoneIndex {
    Number(i64),
    Label(String),
    Missing,
}

impl ZoneIndex {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => ZoneIndex::Missing,
            Value::Number(n) => match n.as_i64() {
                Some(i) => ZoneIndex::Number(i),
                None => ZoneIndex::Label(n.to_string()),
            },
            Value::String(s) => ZoneIndex::Label(s.clone()),
            other => ZoneIndex::Label(other.to_string()),
        }
    }
}

impl std::fmt::Display for ZoneIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZoneIndex::Number(n) => write!(f, "{}", n),
            ZoneIndex::Label(s) => write!(f, "{}", s),
            ZoneIndex::Missing => write!(f, "N/A"),
        }
    }
}

/// Identity of a zone: "{name}-{index}"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId {
    pub name: String,
    pub index: ZoneIndex,
}

impl ZoneId {
    /// Read the identity from a property mapping using the configured keys
    pub fn from_properties(properties: &Map<String, Value>, name_key: &str, index_key: &str) -> Self {
        let name = match properties.get(name_key) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => UNNAMED_ZONE.to_string(),
        };
        let index = properties
            .get(index_key)
            .map(ZoneIndex::from_json)
            .unwrap_or(ZoneIndex::Missing);

        Self { name, index }
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.name, self.index)
    }
}

/// Geometry of a zone as it appeared in the file
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneGeometry {
    /// GeoJSON type tag ("Polygon", "MultiPolygon", ...), or "null"
    pub kind: String,
    /// Converted shape; `None` when the geometry was absent or malformed
    pub shape: Option<Geometry<f64>>,
}

impl ZoneGeometry {
    pub fn bbox(&self) -> Option<GeoBbox> {
        self.shape
            .as_ref()
            .and_then(|g| g.bounding_rect())
            .map(GeoBbox::from_rect)
    }
}

/// A zone loaded from file
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneFeature {
    /// 0-based position in the loaded sequence
    pub position: usize,
    pub id: ZoneId,
    pub geometry: ZoneGeometry,
    pub properties: Map<String, Value>,
}

impl ZoneFeature {
    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn index(&self) -> &ZoneIndex {
        &self.id.index
    }

    pub fn bbox(&self) -> Option<GeoBbox> {
        self.geometry.bbox()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_zone_id_from_properties() {
        let p = props(json!({ "area_name": "Marina", "zone_index": 7 }));
        let id = ZoneId::from_properties(&p, "area_name", "zone_index");
        assert_eq!(id.name, "Marina");
        assert_eq!(id.index, ZoneIndex::Number(7));
        assert_eq!(id.to_string(), "Marina-7");
    }

    #[test]
    fn test_zone_id_defaults() {
        let p = props(json!({ "area_name": "", "zone_index": null }));
        let id = ZoneId::from_properties(&p, "area_name", "zone_index");
        assert_eq!(id.name, UNNAMED_ZONE);
        assert_eq!(id.to_string(), "Unnamed Zone-N/A");
    }

    #[test]
    fn test_zone_index_labels() {
        assert_eq!(
            ZoneIndex::from_json(&json!("Z-12")),
            ZoneIndex::Label("Z-12".to_string())
        );
        assert_eq!(ZoneIndex::from_json(&json!(1.5)).to_string(), "1.5");
    }
}
