//! Conversion of GeoJSON geometry objects into `geo` shapes.

use geo::{Geometry, LineString, Polygon};
use serde_json::Value;

use crate::models::ZoneGeometry;

/// Convert a feature's `geometry` member.
///
/// Unknown or malformed geometry keeps its type tag with no shape, so the
/// search layer can report it instead of the loader rejecting the feature.
pub fn parse_geometry(value: Option<&Value>) -> ZoneGeometry {
    let value = match value {
        Some(v) if !v.is_null() => v,
        _ => {
            return ZoneGeometry {
                kind: "null".to_string(),
                shape: None,
            }
        }
    };

    match geojson::Geometry::from_json_value(value.clone()) {
        Ok(g) => {
            let kind = g.value.type_name().to_string();
            let shape = if positions_ok(&g.value) {
                Geometry::<f64>::try_from(g.value)
                    .ok()
                    .filter(has_valid_rings)
            } else {
                None
            };
            ZoneGeometry { kind, shape }
        }
        Err(_) => ZoneGeometry {
            kind: value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            shape: None,
        },
    }
}

fn position_ok(position: &geojson::Position) -> bool {
    position.len() >= 2
}

/// Every position carries at least a longitude and a latitude
fn positions_ok(value: &geojson::Value) -> bool {
    use geojson::Value as G;
    match value {
        G::Point(p) => position_ok(p),
        G::MultiPoint(ps) | G::LineString(ps) => ps.iter().all(position_ok),
        G::MultiLineString(ls) | G::Polygon(ls) => ls.iter().flatten().all(position_ok),
        G::MultiPolygon(ps) => ps.iter().flatten().flatten().all(position_ok),
        G::GeometryCollection(gs) => gs.iter().all(|g| positions_ok(&g.value)),
    }
}

/// A closed ring needs at least three distinct corners
fn ring_ok(ring: &LineString<f64>) -> bool {
    ring.0.len() >= 4
}

fn polygon_ok(polygon: &Polygon<f64>) -> bool {
    ring_ok(polygon.exterior()) && polygon.interiors().iter().all(ring_ok)
}

fn has_valid_rings(shape: &Geometry<f64>) -> bool {
    match shape {
        Geometry::Polygon(p) => polygon_ok(p),
        Geometry::MultiPolygon(mp) => mp.0.iter().all(polygon_ok),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_polygon_with_hole() {
        let g = json!({
            "type": "Polygon",
            "coordinates": [
                [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
                [[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0], [4.0, 4.0]]
            ]
        });
        let parsed = parse_geometry(Some(&g));
        assert_eq!(parsed.kind, "Polygon");
        match parsed.shape {
            Some(Geometry::Polygon(p)) => {
                assert_eq!(p.exterior().0.len(), 5);
                assert_eq!(p.interiors().len(), 1);
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_open_ring_is_closed() {
        let g = json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]]
        });
        let parsed = parse_geometry(Some(&g));
        match parsed.shape {
            Some(Geometry::Polygon(p)) => {
                assert_eq!(p.exterior().0.first(), p.exterior().0.last());
                assert_eq!(p.exterior().0.len(), 4);
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_degenerate_ring_has_no_shape() {
        let g = json!({ "type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 1.0]]] });
        let parsed = parse_geometry(Some(&g));
        assert_eq!(parsed.kind, "Polygon");
        assert!(parsed.shape.is_none());
    }

    #[test]
    fn test_malformed_coordinates_keep_kind() {
        let g = json!({ "type": "Polygon", "coordinates": "nope" });
        let parsed = parse_geometry(Some(&g));
        assert_eq!(parsed.kind, "Polygon");
        assert!(parsed.shape.is_none());

        let g = json!({ "type": "Point", "coordinates": [1.0] });
        let parsed = parse_geometry(Some(&g));
        assert_eq!(parsed.kind, "Point");
        assert!(parsed.shape.is_none());

        let g = json!({ "type": "Hexagon", "coordinates": [] });
        assert_eq!(parse_geometry(Some(&g)).kind, "Hexagon");
    }

    #[test]
    fn test_multipolygon_and_other_kinds() {
        let g = json!({
            "type": "MultiPolygon",
            "coordinates": [[[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]]
        });
        assert!(matches!(
            parse_geometry(Some(&g)).shape,
            Some(Geometry::MultiPolygon(_))
        ));

        let g = json!({ "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] });
        let parsed = parse_geometry(Some(&g));
        assert_eq!(parsed.kind, "LineString");
        assert!(matches!(parsed.shape, Some(Geometry::LineString(_))));

        let g = json!({ "type": "GeometryCollection", "geometries": [] });
        assert_eq!(parse_geometry(Some(&g)).kind, "GeometryCollection");

        assert_eq!(parse_geometry(None).kind, "null");
    }
}
