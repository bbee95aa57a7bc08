//! Places search providers.
//!
//! A provider takes a text query plus a bounding region used as a location
//! bias, and returns candidate places. Results are not guaranteed to fall
//! inside the region; callers screen them against zone polygons.

mod http;

use std::future::Future;

use crate::models::{CandidatePoint, GeoBbox};

pub use http::{decode_features, HttpSearchProvider};

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("could not decode provider response: {0}")]
    Decode(String),
    #[error("{0}")]
    Other(String),
}

pub trait SearchProvider: Send + Sync {
    fn search(
        &self,
        query: &str,
        bias: GeoBbox,
    ) -> impl Future<Output = Result<Vec<CandidatePoint>, SearchError>> + Send;
}
