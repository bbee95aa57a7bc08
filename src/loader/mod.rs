//! Zone file loading.
//!
//! Accepts either a single GeoJSON `FeatureCollection` document or
//! newline-delimited GeoJSON features, and produces normalized zones that
//! always carry a zone index property.

mod geometry;

use std::fmt;
use std::path::Path;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::models::{ZoneFeature, ZoneId};

pub use geometry::parse_geometry;

pub const DEFAULT_AREA_NAME_KEY: &str = "area_name";
pub const DEFAULT_ZONE_INDEX_KEY: &str = "zone_index";

/// Property keys used to read a zone's display name and index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyKeys {
    pub area_name: String,
    pub zone_index: String,
}

impl Default for PropertyKeys {
    fn default() -> Self {
        Self {
            area_name: DEFAULT_AREA_NAME_KEY.to_string(),
            zone_index: DEFAULT_ZONE_INDEX_KEY.to_string(),
        }
    }
}

impl PropertyKeys {
    /// Blank keys fall back to the defaults
    pub fn normalized(self) -> Self {
        let area_name = match self.area_name.trim() {
            "" => DEFAULT_AREA_NAME_KEY.to_string(),
            k => k.to_string(),
        };
        let zone_index = match self.zone_index.trim() {
            "" => DEFAULT_ZONE_INDEX_KEY.to_string(),
            k => k.to_string(),
        };
        Self {
            area_name,
            zone_index,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("no valid GeoJSON features could be parsed from the input")]
    NoValidRecords,
    #[error("input is not a GeoJSON FeatureCollection")]
    NotFeatureCollection,
    #[error("feature at position {position} is not a JSON object")]
    InvalidFeature { position: usize },
    #[error("could not read the input: {0}")]
    Io(#[from] std::io::Error),
}

/// Which form the input took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Document,
    LineStream,
}

/// Result of the single upfront parse attempt
#[derive(Debug)]
pub enum RawInput<'a> {
    /// The whole text is one JSON value
    Document(Value),
    /// Not one JSON value; to be read line by line
    LineStream(&'a str),
}

/// Decide how the input should be read.
///
/// Syntax errors (including trailing data and empty input) select line
/// mode; any other failure is fatal.
pub fn classify(raw: &str) -> Result<RawInput<'_>, LoadError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => Ok(RawInput::Document(value)),
        Err(e) if e.is_syntax() || e.is_eof() => {
            debug!("Whole-document parse failed ({}), reading as line stream", e);
            Ok(RawInput::LineStream(raw))
        }
        Err(e) => Err(LoadError::Io(e.into())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningReason {
    /// The line is not valid JSON
    Syntax(String),
    /// Valid JSON without a Feature type tag and geometry
    NotAFeature,
}

/// A skipped line in newline-delimited input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// 1-based position among the non-blank lines of the input
    pub line: usize,
    pub reason: WarningReason,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            WarningReason::Syntax(e) => write!(f, "line {}: invalid JSON ({})", self.line, e),
            WarningReason::NotAFeature => {
                write!(f, "line {}: not a GeoJSON feature with geometry", self.line)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub zones: Vec<ZoneFeature>,
    /// Ascending by line number; always empty for document input
    pub warnings: Vec<LoadWarning>,
    pub format: SourceFormat,
}

impl LoadOutcome {
    pub fn warning_lines(&self) -> Vec<usize> {
        self.warnings.iter().map(|w| w.line).collect()
    }
}

/// Load zones from raw file text
pub fn load(raw: &str, keys: &PropertyKeys) -> Result<LoadOutcome, LoadError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let (features, warnings, format) = match classify(raw)? {
        RawInput::Document(value) => {
            let features = document_features(value)?;
            (features, Vec::new(), SourceFormat::Document)
        }
        RawInput::LineStream(text) => {
            let (features, warnings) = read_lines(text);
            if features.is_empty() {
                warn!(
                    "No valid features in line-delimited input ({} bad lines)",
                    warnings.len()
                );
                return Err(LoadError::NoValidRecords);
            }
            (features, warnings, SourceFormat::LineStream)
        }
    };

    let zones = normalize(features, keys)?;

    info!(
        "Loaded {} zones ({:?}, {} skipped lines)",
        zones.len(),
        format,
        warnings.len()
    );

    Ok(LoadOutcome {
        zones,
        warnings,
        format,
    })
}

/// Read and load a zone file from disk
pub fn load_path<P: AsRef<Path>>(path: P, keys: &PropertyKeys) -> Result<LoadOutcome, LoadError> {
    let raw = std::fs::read_to_string(path)?;
    load(&raw, keys)
}

fn is_feature(value: &Value) -> bool {
    value.get("type").and_then(Value::as_str) == Some("Feature")
        && value.get("geometry").is_some_and(|g| !g.is_null())
}

/// Extract the feature list from a whole-document parse
fn document_features(value: Value) -> Result<Vec<Value>, LoadError> {
    let kind = value.get("type").and_then(Value::as_str).map(str::to_owned);
    match kind.as_deref() {
        Some("FeatureCollection") => {}
        Some("Feature") => {
            // A one-line newline-delimited file parses as a whole document
            return if is_feature(&value) {
                Ok(vec![value])
            } else {
                Err(LoadError::NoValidRecords)
            };
        }
        _ => return Err(LoadError::NotFeatureCollection),
    }

    match value {
        Value::Object(mut obj) => match obj.remove("features") {
            Some(Value::Array(features)) => Ok(features),
            _ => Err(LoadError::NotFeatureCollection),
        },
        _ => Err(LoadError::NotFeatureCollection),
    }
}

fn read_lines(text: &str) -> (Vec<Value>, Vec<LoadWarning>) {
    let mut features = Vec::new();
    let mut warnings = Vec::new();

    let records = text.lines().map(str::trim).filter(|l| !l.is_empty());
    for (i, trimmed) in records.enumerate() {
        let line_no = i + 1;
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) if is_feature(&value) => features.push(value),
            Ok(_) => {
                warn!("Line {} is not a GeoJSON feature, skipping", line_no);
                warnings.push(LoadWarning {
                    line: line_no,
                    reason: WarningReason::NotAFeature,
                });
            }
            Err(e) => {
                warn!("Line {} could not be parsed: {}", line_no, e);
                warnings.push(LoadWarning {
                    line: line_no,
                    reason: WarningReason::Syntax(e.to_string()),
                });
            }
        }
    }

    (features, warnings)
}

/// Ensure every feature has a property mapping and a zone index
fn normalize(features: Vec<Value>, keys: &PropertyKeys) -> Result<Vec<ZoneFeature>, LoadError> {
    let mut seen = HashSet::new();
    let mut zones = Vec::with_capacity(features.len());

    for (position, feature) in features.into_iter().enumerate() {
        let mut obj = match feature {
            Value::Object(obj) => obj,
            _ => return Err(LoadError::InvalidFeature { position }),
        };

        let mut properties = match obj.remove("properties") {
            Some(Value::Object(p)) => p,
            _ => Map::new(),
        };
        if !properties.contains_key(&keys.zone_index) {
            properties.insert(keys.zone_index.clone(), Value::from(position));
        }

        let id = ZoneId::from_properties(&properties, &keys.area_name, &keys.zone_index);
        if !seen.insert(id.clone()) {
            warn!("Duplicate zone id {} at position {}", id, position);
        }

        let geometry = parse_geometry(obj.get("geometry"));

        zones.push(ZoneFeature {
            position,
            id,
            geometry,
            properties,
        });
    }

    Ok(zones)
}
