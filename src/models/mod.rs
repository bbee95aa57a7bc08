//! Core data models for zones and search results.

pub mod place;
pub mod zone;

pub use place::{CandidatePoint, GeoBbox, LatLng, ResultRecord};
pub use zone::{ZoneFeature, ZoneGeometry, ZoneId, ZoneIndex, UNNAMED_ZONE};
