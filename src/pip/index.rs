//! Spatial index for resolving a clicked location to a zone.

use geo::{Contains, Geometry, Point};
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use super::polygon_contains;
use crate::models::{LatLng, ZoneFeature};

/// Wrapper for R-tree indexing of zone shapes
#[derive(Clone)]
pub struct IndexedZone {
    pub position: usize,
    shape: Geometry<f64>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedZone {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedZone {
    pub fn new(zone: &ZoneFeature) -> Option<Self> {
        let shape = zone.geometry.shape.clone()?;
        let bbox = zone.bbox()?;
        Some(Self {
            position: zone.position,
            shape,
            envelope: AABB::from_corners([bbox.min_lng, bbox.min_lat], [bbox.max_lng, bbox.max_lat]),
        })
    }

    fn contains(&self, point: LatLng) -> bool {
        match &self.shape {
            Geometry::Polygon(p) => polygon_contains(p, point.to_coord()),
            Geometry::MultiPolygon(mp) => mp.contains(&Point::from(point.to_coord())),
            _ => false,
        }
    }
}

/// Spatial index over loaded zones using R-tree
pub struct ZoneSpatialIndex {
    tree: RTree<IndexedZone>,
}

impl ZoneSpatialIndex {
    /// Build spatial index from loaded zones
    pub fn build(zones: &[ZoneFeature]) -> Self {
        let indexed: Vec<IndexedZone> = zones.iter().filter_map(IndexedZone::new).collect();
        let skipped = zones.len() - indexed.len();

        let tree = RTree::bulk_load(indexed);

        info!(
            "Zone index built with {} entries ({} without usable geometry)",
            tree.size(),
            skipped
        );

        Self { tree }
    }

    /// Positions of all zones containing a point, ascending
    pub fn lookup(&self, point: LatLng) -> Vec<usize> {
        let query_envelope = AABB::from_point([point.lng, point.lat]);

        // Envelope intersection narrows candidates, exact containment decides
        let mut positions: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|iz| iz.contains(point))
            .map(|iz| iz.position)
            .collect();
        positions.sort_unstable();
        positions
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for ZoneSpatialIndex {
    fn default() -> Self {
        Self::build(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{load, PropertyKeys};
    use serde_json::json;

    fn zones() -> Vec<ZoneFeature> {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "area_name": "West" },
                    "geometry": { "type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]] }
                },
                {
                    "type": "Feature",
                    "properties": { "area_name": "Islands" },
                    "geometry": { "type": "MultiPolygon", "coordinates": [
                        [[[2.0, 0.0], [3.0, 0.0], [3.0, 1.0], [2.0, 1.0], [2.0, 0.0]]],
                        [[[4.0, 0.0], [5.0, 0.0], [5.0, 1.0], [4.0, 1.0], [4.0, 0.0]]]
                    ] }
                },
                {
                    "type": "Feature",
                    "properties": { "area_name": "Road" },
                    "geometry": { "type": "LineString", "coordinates": [[0.0, 0.5], [5.0, 0.5]] }
                },
                {
                    "type": "Feature",
                    "properties": { "area_name": "Overlap" },
                    "geometry": { "type": "Polygon", "coordinates": [[[0.5, 0.0], [2.5, 0.0], [2.5, 1.0], [0.5, 1.0], [0.5, 0.0]]] }
                }
            ]
        });
        load(&doc.to_string(), &PropertyKeys::default()).unwrap().zones
    }

    #[test]
    fn test_lookup() {
        let index = ZoneSpatialIndex::build(&zones());
        assert_eq!(index.len(), 4);

        assert_eq!(index.lookup(LatLng::new(0.5, 0.25)), vec![0]);
        assert_eq!(index.lookup(LatLng::new(0.5, 0.75)), vec![0, 3]);
        assert_eq!(index.lookup(LatLng::new(0.5, 2.25)), vec![1, 3]);
        assert_eq!(index.lookup(LatLng::new(0.5, 4.5)), vec![1]);
        assert!(index.lookup(LatLng::new(0.5, 3.5)).is_empty());
        assert!(index.lookup(LatLng::new(10.0, 10.0)).is_empty());
    }

    #[test]
    fn test_empty_index() {
        let index = ZoneSpatialIndex::default();
        assert!(index.is_empty());
        assert!(index.lookup(LatLng::new(0.0, 0.0)).is_empty());
    }
}
