//! Point-in-Polygon (PIP) screening of search results.
//!
//! Containment tests for zone polygons, and an R-tree index for finding
//! which zone a location falls in.

mod index;
mod polygon;

pub use index::{IndexedZone, ZoneSpatialIndex};
pub use polygon::{polygon_contains, ring_contains, GeometryError, ZonePolygon};
