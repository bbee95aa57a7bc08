//! Zonesweep - find places of interest inside polygon zones
//!
//! Loads zone polygons from GeoJSON or newline-delimited GeoJSON, queries a
//! places search provider around each zone, keeps only the places strictly
//! inside the zone polygon and exports them as CSV.

pub mod config;
pub mod export;
pub mod loader;
pub mod models;
pub mod pip;
pub mod search;
pub mod session;
pub mod status;

pub use config::Config;
pub use models::{CandidatePoint, GeoBbox, LatLng, ResultRecord, ZoneFeature, ZoneId};
pub use session::Session;
