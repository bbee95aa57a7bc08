//! HTTP client for a Pelias-style `/v1/search` endpoint.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{SearchError, SearchProvider};
use crate::models::{CandidatePoint, GeoBbox, LatLng};

const USER_AGENT: &str = concat!("zonesweep/", env!("CARGO_PKG_VERSION"));

/// Search provider speaking the geocoder JSON API
#[derive(Clone)]
pub struct HttpSearchProvider {
    client: Client,
    endpoint: Url,
    max_results: usize,
}

impl HttpSearchProvider {
    pub fn new(base_url: &str, max_results: usize, timeout: Duration) -> Result<Self, SearchError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join("v1/search")?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            max_results,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_url(&self, query: &str, bias: GeoBbox) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("text", query)
            .append_pair("bbox", &bias.to_query_string())
            .append_pair("size", &self.max_results.to_string());
        url
    }
}

impl SearchProvider for HttpSearchProvider {
    async fn search(&self, query: &str, bias: GeoBbox) -> Result<Vec<CandidatePoint>, SearchError> {
        let url = self.request_url(query, bias);
        debug!("Search request: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let code = response.status().as_u16();
            let body = response.text().await?;
            return Err(SearchError::Status { code, body });
        }

        let body = response.json::<Value>().await?;
        let mut places = decode_features(&body)?;
        places.truncate(self.max_results);

        debug!("Search '{}' returned {} places", query, places.len());
        Ok(places)
    }
}

fn prop_str<'a>(props: &'a Value, key: &str) -> Option<&'a str> {
    props[key].as_str().filter(|s| !s.is_empty())
}

/// Build a one-line address from the response's address parts
fn formatted_address(props: &Value) -> Option<String> {
    if let Some(label) = prop_str(props, "label") {
        return Some(label.to_string());
    }

    let street = match (prop_str(props, "housenumber"), prop_str(props, "street")) {
        (Some(num), Some(street)) => Some(format!("{} {}", num, street)),
        (None, Some(street)) => Some(street.to_string()),
        _ => None,
    };

    let parts: Vec<String> = street
        .into_iter()
        .chain(
            ["locality", "region", "country"]
                .iter()
                .filter_map(|k| prop_str(props, k).map(String::from)),
        )
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Parse a GeoJSON-like `{ "features": [...] }` response body
pub fn decode_features(body: &Value) -> Result<Vec<CandidatePoint>, SearchError> {
    let features = body["features"]
        .as_array()
        .ok_or_else(|| SearchError::Decode("response has no features array".to_string()))?;

    let places = features
        .iter()
        .map(|feature| {
            let props = &feature["properties"];
            let coords = &feature["geometry"]["coordinates"];
            let location = match (coords[0].as_f64(), coords[1].as_f64()) {
                (Some(lon), Some(lat)) => Some(LatLng::new(lat, lon)),
                _ => None,
            };

            CandidatePoint {
                name: prop_str(props, "name").unwrap_or_default().to_string(),
                formatted_address: formatted_address(props),
                location,
            }
        })
        .collect();

    Ok(places)
}
