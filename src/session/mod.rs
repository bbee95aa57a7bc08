//! Search session state and orchestration.
//!
//! A `Session` owns the loaded zones, the accumulated results and the set of
//! zones already swept for the predefined categories. Searches take
//! `&mut self`, so two passes can never write into the same result list
//! concurrently.

use std::path::Path;

use futures::future::join_all;
use hashbrown::HashSet;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::export::{self, ExportError};
use crate::loader::{self, LoadError, LoadWarning, SourceFormat};
use crate::models::{CandidatePoint, LatLng, ResultRecord, ZoneFeature, ZoneId};
use crate::pip::{GeometryError, ZonePolygon, ZoneSpatialIndex};
use crate::search::SearchProvider;
use crate::status::{status_channel, StatusMessage, StatusSender};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no zone at position {0}")]
    UnknownZone(usize),
    #[error("no zone contains {0}")]
    NoZoneAt(LatLng),
    #[error("zone {zone}: {source}")]
    Geometry {
        zone: ZoneId,
        #[source]
        source: GeometryError,
    },
    #[error("search query is empty")]
    EmptyQuery,
    #[error("no zones loaded")]
    NoZones,
}

#[derive(Debug, Clone)]
pub struct LoadSummary {
    pub zones: usize,
    pub warnings: Vec<LoadWarning>,
    pub format: SourceFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneSearchOutcome {
    /// The zone was swept before; nothing was searched
    AlreadySearched,
    Completed { found: usize },
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Search pass that produced the current results
    pub generation: u64,
    pub found: usize,
    /// Accepted places per searched zone, in zone order
    pub per_zone: Vec<(ZoneId, usize)>,
    /// Zones whose provider call failed
    pub failed: Vec<ZoneId>,
    /// Zones rejected before searching
    pub skipped: Vec<(ZoneId, GeometryError)>,
}

/// Keep the candidates that fall strictly inside the zone
pub fn screen_candidates(
    zone: &ZoneId,
    polygon: &ZonePolygon,
    category: &str,
    candidates: &[CandidatePoint],
) -> Vec<ResultRecord> {
    candidates
        .iter()
        .filter_map(|candidate| {
            let location = polygon.accepts(candidate)?;
            Some(ResultRecord {
                name: candidate.name.clone(),
                category: category.to_string(),
                area_name: zone.name.clone(),
                zone_index: zone.index.clone(),
                latitude: location.lat,
                longitude: location.lng,
                formatted_address: candidate.formatted_address.clone(),
            })
        })
        .collect()
}

pub struct Session<P> {
    provider: P,
    config: Config,
    status: StatusSender,
    zones: Vec<ZoneFeature>,
    index: ZoneSpatialIndex,
    results: Vec<ResultRecord>,
    searched: HashSet<ZoneId>,
    generation: u64,
}

impl<P: SearchProvider> Session<P> {
    pub fn new(provider: P, config: Config) -> (Self, UnboundedReceiver<StatusMessage>) {
        let (status, rx) = status_channel();
        let session = Self {
            provider,
            config,
            status,
            zones: Vec::new(),
            index: ZoneSpatialIndex::default(),
            results: Vec::new(),
            searched: HashSet::new(),
            generation: 0,
        };
        (session, rx)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn zones(&self) -> &[ZoneFeature] {
        &self.zones
    }

    pub fn results(&self) -> &[ResultRecord] {
        &self.results
    }

    pub fn is_searched(&self, zone: &ZoneId) -> bool {
        self.searched.contains(zone)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the loaded zones with the contents of a file.
    ///
    /// On failure the previous zones and results are kept.
    pub fn load_text(&mut self, raw: &str) -> Result<LoadSummary, LoadError> {
        let outcome = match loader::load(raw, &self.config.keys) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.report_load_error(&e);
                return Err(e);
            }
        };

        self.index = ZoneSpatialIndex::build(&outcome.zones);
        self.zones = outcome.zones;
        self.reset();

        let count = self.zones.len();
        match outcome.format {
            SourceFormat::LineStream if !outcome.warnings.is_empty() => {
                let lines = outcome
                    .warnings
                    .iter()
                    .map(|w| w.line.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                self.status.info(
                    format!("Loaded {} features. Could not parse lines: {}.", count, lines),
                    15_000,
                );
            }
            SourceFormat::LineStream => self.status.success(
                format!(
                    "Newline-delimited GeoJSON loaded successfully with {} features.",
                    count
                ),
                7_000,
            ),
            SourceFormat::Document => self.status.success(
                format!("GeoJSON loaded successfully with {} features.", count),
                7_000,
            ),
        }

        Ok(LoadSummary {
            zones: count,
            warnings: outcome.warnings,
            format: outcome.format,
        })
    }

    pub fn load_file<Q: AsRef<Path>>(&mut self, path: Q) -> Result<LoadSummary, LoadError> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(raw) => self.load_text(&raw),
            Err(e) => {
                let e = LoadError::from(e);
                self.report_load_error(&e);
                Err(e)
            }
        }
    }

    fn report_load_error(&self, e: &LoadError) {
        match e {
            LoadError::NoValidRecords => self.status.error(
                "Error: No valid GeoJSON features could be parsed from the file.",
                10_000,
            ),
            _ => self
                .status
                .error(format!("Error: Could not read the GeoJSON file ({}).", e), 5_000),
        }
    }

    /// Clear accumulated results and the searched-zone set
    pub fn reset(&mut self) {
        self.results.clear();
        self.searched.clear();
    }

    /// First zone (by load position) containing a point
    pub fn zone_at(&self, point: LatLng) -> Option<&ZoneFeature> {
        self.index
            .lookup(point)
            .first()
            .and_then(|&position| self.zones.get(position))
    }

    /// Sweep the zone containing a clicked location
    pub async fn search_zone_at(&mut self, point: LatLng) -> Result<ZoneSearchOutcome, SessionError> {
        let position = match self.zone_at(point) {
            Some(zone) => zone.position,
            None => {
                self.status.info(format!("No zone at {}.", point), 3_000);
                return Err(SessionError::NoZoneAt(point));
            }
        };
        self.search_zone(position).await
    }

    /// Search one zone for every predefined category.
    ///
    /// The zone is marked as searched once the sweep finishes, even when
    /// nothing was found or some categories failed.
    pub async fn search_zone(&mut self, position: usize) -> Result<ZoneSearchOutcome, SessionError> {
        let zone = self
            .zones
            .get(position)
            .ok_or(SessionError::UnknownZone(position))?;
        let zone_id = zone.id.clone();

        if self.searched.contains(&zone_id) {
            self.status.info(
                format!(
                    "Zone {} has already been searched for pre-defined categories.",
                    zone_id.name
                ),
                5_000,
            );
            return Ok(ZoneSearchOutcome::AlreadySearched);
        }

        let polygon = match ZonePolygon::from_zone(zone) {
            Ok(polygon) => polygon,
            Err(source) => {
                self.status.error(
                    format!(
                        "Could not process the geometry for zone {}. Only simple polygons are supported.",
                        zone_id.name
                    ),
                    5_000,
                );
                return Err(SessionError::Geometry {
                    zone: zone_id,
                    source,
                });
            }
        };

        self.results.clear();
        self.generation += 1;
        self.status
            .loading(format!("Searching for common places in {}...", zone_id.name));

        let bias = polygon.bbox();
        let mut found = 0;
        for category in &self.config.categories {
            let candidates = match self.provider.search(&category.query, bias).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    error!("Search failed for {}: {}", category.query, e);
                    self.status
                        .error(format!("Search failed for {}.", category.query), 5_000);
                    Vec::new()
                }
            };

            let accepted = screen_candidates(&zone_id, &polygon, &category.label, &candidates);
            debug!(
                "{} in {}: {} of {} candidates inside zone",
                category.label,
                zone_id,
                accepted.len(),
                candidates.len()
            );
            found += accepted.len();
            self.results.extend(accepted);
        }

        if found > 0 {
            self.status
                .success(format!("Found {} places in {}.", found, zone_id.name), 5_000);
        } else {
            self.status
                .info(format!("No new places found in {}.", zone_id.name), 5_000);
        }
        self.searched.insert(zone_id);

        Ok(ZoneSearchOutcome::Completed { found })
    }

    /// Search every loaded zone for a free-text query.
    ///
    /// One provider call per zone is issued concurrently and all are awaited
    /// before any results are recorded. A failed call contributes nothing.
    pub async fn search_all(&mut self, query: &str) -> Result<BatchOutcome, SessionError> {
        let query = query.trim();
        if query.is_empty() {
            self.status
                .error("Please enter an amenity to search for.", 3_000);
            return Err(SessionError::EmptyQuery);
        }
        if self.zones.is_empty() {
            self.status.error("Please upload a GeoJSON file first.", 3_000);
            return Err(SessionError::NoZones);
        }

        self.results.clear();
        self.generation += 1;
        self.status
            .loading(format!("Searching all zones for '{}'...", query));

        let status = &self.status;
        let provider = &self.provider;

        let mut skipped = Vec::new();
        let targets: Vec<(&ZoneId, ZonePolygon)> = self
            .zones
            .iter()
            .filter_map(|zone| match ZonePolygon::from_zone(zone) {
                Ok(polygon) => Some((&zone.id, polygon)),
                Err(e) => {
                    warn!("Skipping zone {}: {}", zone.id, e);
                    status.error(
                        format!("Skipping zone {}: {}.", zone.id.name, e),
                        5_000,
                    );
                    skipped.push((zone.id.clone(), e));
                    None
                }
            })
            .collect();

        let responses = join_all(targets.iter().map(|(zone, polygon)| async move {
            let result = provider.search(query, polygon.bbox()).await;
            (*zone, polygon, result)
        }))
        .await;

        let mut found = 0;
        let mut per_zone = Vec::with_capacity(responses.len());
        let mut failed = Vec::new();
        for (zone, polygon, result) in responses {
            let candidates = match result {
                Ok(candidates) => candidates,
                Err(e) => {
                    error!("Search failed for {} in zone {}: {}", query, zone, e);
                    status.error(format!("Search failed for {} in {}.", query, zone.name), 5_000);
                    failed.push(zone.clone());
                    Vec::new()
                }
            };

            let accepted = screen_candidates(zone, polygon, query, &candidates);
            found += accepted.len();
            per_zone.push((zone.clone(), accepted.len()));
            self.results.extend(accepted);
        }

        info!(
            "Batch search '{}' found {} places across {} zones ({} failed, {} skipped)",
            query,
            found,
            per_zone.len(),
            failed.len(),
            skipped.len()
        );

        if found > 0 {
            status.success(
                format!("Found {} results for '{}' across all zones.", found, query),
                5_000,
            );
        } else {
            status.info(format!("No results found for '{}' in any zone.", query), 5_000);
        }

        Ok(BatchOutcome {
            generation: self.generation,
            found,
            per_zone,
            failed,
            skipped,
        })
    }

    /// Write the accumulated results as CSV
    pub fn export_csv<Q: AsRef<Path>>(&self, path: Q) -> Result<(), ExportError> {
        if self.results.is_empty() {
            self.status.info("No results to export.", 3_000);
            return Err(ExportError::Empty);
        }
        export::export_to_file(&self.results, path.as_ref())?;
        self.status.success(
            format!(
                "Exported {} places to {}.",
                self.results.len(),
                path.as_ref().display()
            ),
            5_000,
        );
        Ok(())
    }
}
