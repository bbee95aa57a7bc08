//! Even-odd containment of points in zone polygons.
//!
//! Boundary convention: a point lying exactly on an edge or vertex of the
//! outer ring is outside. A point on a hole's boundary is not strictly
//! inside the hole, so it counts as contained.
//!
//! The on-edge test is an exact cross-product check in `f64`. It holds for
//! vertices, axis-aligned edges and diagonal points whose arithmetic is
//! exact; a point on a diagonal edge that rounds off the line falls to the
//! crossing rule and may land on either side.

use geo::{BoundingRect, Coord, Geometry, Polygon};

use crate::models::{CandidatePoint, GeoBbox, LatLng, ZoneFeature};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("unsupported geometry type {kind}, only simple polygons are supported")]
    Unsupported { kind: String },
    #[error("malformed {kind} geometry")]
    Malformed { kind: String },
}

/// Strict interior test for a single ring (open or closed)
pub fn ring_contains(ring: &[Coord<f64>], point: Coord<f64>) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = ring[i];
        let b = ring[j];

        if on_segment(a, b, point) {
            return false;
        }

        // Half-open rule so a vertex shared by two edges is crossed once
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }

    inside
}

fn on_segment(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> bool {
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    cross == 0.0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

/// Inside the exterior ring and outside every hole
pub fn polygon_contains(polygon: &Polygon<f64>, point: Coord<f64>) -> bool {
    ring_contains(&polygon.exterior().0, point)
        && polygon
            .interiors()
            .iter()
            .all(|hole| !ring_contains(&hole.0, point))
}

/// A zone's polygon, ready for screening search results
#[derive(Debug, Clone)]
pub struct ZonePolygon {
    polygon: Polygon<f64>,
    bbox: GeoBbox,
}

impl ZonePolygon {
    pub fn new(polygon: Polygon<f64>) -> Result<Self, GeometryError> {
        let bbox = polygon
            .bounding_rect()
            .map(GeoBbox::from_rect)
            .ok_or_else(|| GeometryError::Malformed {
                kind: "Polygon".to_string(),
            })?;
        Ok(Self { polygon, bbox })
    }

    /// Only single-polygon zones can be screened
    pub fn from_zone(zone: &ZoneFeature) -> Result<Self, GeometryError> {
        match &zone.geometry.shape {
            Some(Geometry::Polygon(p)) => Self::new(p.clone()),
            None if zone.geometry.kind == "Polygon" => Err(GeometryError::Malformed {
                kind: zone.geometry.kind.clone(),
            }),
            _ => Err(GeometryError::Unsupported {
                kind: zone.geometry.kind.clone(),
            }),
        }
    }

    pub fn bbox(&self) -> GeoBbox {
        self.bbox
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    pub fn contains(&self, point: LatLng) -> bool {
        self.bbox.contains(point) && polygon_contains(&self.polygon, point.to_coord())
    }

    /// Location of a candidate if it lies strictly inside this zone
    pub fn accepts(&self, candidate: &CandidatePoint) -> Option<LatLng> {
        candidate.location.filter(|loc| self.contains(*loc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ZoneGeometry, ZoneId, ZoneIndex};
    use geo::{Contains, LineString, Point};

    /// Ring from (lat, lng) pairs
    fn ring(points: &[(f64, f64)]) -> Vec<Coord<f64>> {
        points
            .iter()
            .map(|&(lat, lng)| LatLng::new(lat, lng).to_coord())
            .collect()
    }

    fn pt(lat: f64, lng: f64) -> Coord<f64> {
        LatLng::new(lat, lng).to_coord()
    }

    fn closed(mut r: Vec<Coord<f64>>) -> LineString<f64> {
        r.push(r[0]);
        LineString::new(r)
    }

    const UNIT_SQUARE: [(f64, f64); 4] = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)];

    #[test]
    fn test_unit_square() {
        let square = ring(&UNIT_SQUARE);
        assert!(ring_contains(&square, pt(0.5, 0.5)));
        assert!(!ring_contains(&square, pt(2.0, 2.0)));
    }

    #[test]
    fn test_boundary_is_outside() {
        let square = ring(&UNIT_SQUARE);
        assert!(!ring_contains(&square, pt(0.0, 0.0)));
        assert!(!ring_contains(&square, pt(1.0, 1.0)));
        assert!(!ring_contains(&square, pt(0.5, 0.0)));
        assert!(!ring_contains(&square, pt(1.0, 0.25)));
    }

    #[test]
    fn test_exact_diagonal_edge_is_outside() {
        // right triangle with hypotenuse from (0, 0) to (2, 2)
        let triangle = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 2.0, y: 0.0 },
            Coord { x: 2.0, y: 2.0 },
        ];
        assert!(!ring_contains(&triangle, Coord { x: 1.0, y: 1.0 }));
        assert!(!ring_contains(&triangle, Coord { x: 0.5, y: 0.5 }));
        assert!(ring_contains(&triangle, Coord { x: 1.5, y: 0.5 }));
    }

    #[test]
    fn test_rotation_invariance() {
        let base = ring(&[(0.0, 0.0), (0.0, 4.0), (2.0, 6.0), (4.0, 4.0), (4.0, 0.0), (2.0, 2.0)]);
        let samples = [
            pt(1.0, 2.0),
            pt(2.0, 1.0),
            pt(3.0, 4.5),
            pt(2.0, 5.5),
            pt(5.0, 5.0),
            pt(-1.0, 2.0),
        ];

        for shift in 0..base.len() {
            let mut rotated = base.clone();
            rotated.rotate_left(shift);
            let closed_rotated = closed(rotated.clone());
            for p in samples {
                assert_eq!(ring_contains(&base, p), ring_contains(&rotated, p));
                assert_eq!(ring_contains(&base, p), ring_contains(&closed_rotated.0, p));
            }
        }
    }

    #[test]
    fn test_far_point_and_centroid() {
        let hexagon = ring(&[
            (0.0, 2.0),
            (1.0, 3.7),
            (3.0, 3.7),
            (4.0, 2.0),
            (3.0, 0.3),
            (1.0, 0.3),
        ]);
        let n = hexagon.len() as f64;
        let centroid = Coord {
            x: hexagon.iter().map(|c| c.x).sum::<f64>() / n,
            y: hexagon.iter().map(|c| c.y).sum::<f64>() / n,
        };
        assert!(ring_contains(&hexagon, centroid));
        assert!(!ring_contains(&hexagon, pt(100.0, -50.0)));
        assert!(!ring_contains(&hexagon, pt(2.0, 40.0)));
    }

    #[test]
    fn test_hole_excludes_point() {
        let outer = closed(ring(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]));
        let hole = closed(ring(&[(4.0, 4.0), (4.0, 6.0), (6.0, 6.0), (6.0, 4.0)]));
        let p = pt(5.0, 5.0);

        let with_hole = Polygon::new(outer.clone(), vec![hole]);
        assert!(!polygon_contains(&with_hole, p));
        assert!(polygon_contains(&with_hole, pt(2.0, 2.0)));
        // on the hole edge
        assert!(polygon_contains(&with_hole, pt(4.0, 5.0)));

        let without_hole = Polygon::new(outer, vec![]);
        assert!(polygon_contains(&without_hole, p));
    }

    #[test]
    fn test_agrees_with_geo_contains_off_boundary() {
        let outer = closed(ring(&[(0.0, 0.0), (0.0, 4.0), (2.0, 6.0), (4.0, 4.0), (4.0, 0.0), (2.0, 2.0)]));
        let poly = Polygon::new(outer, vec![]);
        for lat in 0..9 {
            for lng in 0..13 {
                let p = pt(lat as f64 * 0.5 - 0.25, lng as f64 * 0.5 - 0.25);
                assert_eq!(
                    polygon_contains(&poly, p),
                    poly.contains(&Point::from(p)),
                    "mismatch at {:?}",
                    p
                );
            }
        }
    }

    fn zone(geometry: ZoneGeometry) -> ZoneFeature {
        ZoneFeature {
            position: 0,
            id: ZoneId {
                name: "Test".to_string(),
                index: ZoneIndex::Number(0),
            },
            geometry,
            properties: Default::default(),
        }
    }

    #[test]
    fn test_zone_polygon_rejects_other_geometry() {
        let line = ZoneGeometry {
            kind: "LineString".to_string(),
            shape: Some(Geometry::LineString(LineString::new(ring(&UNIT_SQUARE)))),
        };
        assert_eq!(
            ZonePolygon::from_zone(&zone(line)).unwrap_err(),
            GeometryError::Unsupported {
                kind: "LineString".to_string()
            }
        );

        let broken = ZoneGeometry {
            kind: "Polygon".to_string(),
            shape: None,
        };
        assert!(matches!(
            ZonePolygon::from_zone(&zone(broken)),
            Err(GeometryError::Malformed { .. })
        ));
    }

    #[test]
    fn test_zone_polygon_accepts_candidates() {
        let square = ZoneGeometry {
            kind: "Polygon".to_string(),
            shape: Some(Geometry::Polygon(Polygon::new(closed(ring(&UNIT_SQUARE)), vec![]))),
        };
        let zp = ZonePolygon::from_zone(&zone(square)).unwrap();
        assert_eq!(zp.bbox(), GeoBbox::new(0.0, 0.0, 1.0, 1.0));

        let inside = CandidatePoint::new("In", LatLng::new(0.25, 0.75));
        let outside = CandidatePoint::new("Out", LatLng::new(1.25, 0.75));
        let nowhere = CandidatePoint {
            name: "Nowhere".to_string(),
            formatted_address: None,
            location: None,
        };
        assert_eq!(zp.accepts(&inside), Some(LatLng::new(0.25, 0.75)));
        assert_eq!(zp.accepts(&outside), None);
        assert_eq!(zp.accepts(&nowhere), None);
    }
}
