//! Telemetry data loading.
//!
//! The store is read once at startup from the first candidate file that
//! exists and is shared read-only for the rest of the process lifetime.
//! Any failure to load degrades to an empty store.

use crate::models::TelemetryRecord;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Data file names tried when no explicit path is configured.
pub const DEFAULT_CANDIDATES: &[&str] = &[
    "q-vercel-latency.json",
    "data/q-vercel-latency.json",
    "api/q-vercel-latency.json",
    "../q-vercel-latency.json",
];

/// Errors raised while loading a telemetry file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read telemetry file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse telemetry file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported telemetry layout in {path}: expected an object keyed by region or an array of records")]
    UnsupportedLayout { path: PathBuf },
}

/// A record in the flat array layout, tagged with its region.
#[derive(Debug, Deserialize)]
struct FlatRecord {
    region: String,
    latency_ms: f64,
    #[serde(alias = "uptime_pct")]
    uptime: f64,
}

/// Immutable mapping of region name to its recorded observations.
#[derive(Debug, Clone, Default)]
pub struct TelemetryStore {
    regions: HashMap<String, Vec<TelemetryRecord>>,
    source: Option<PathBuf>,
}

impl TelemetryStore {
    /// Creates an empty store.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a store from in-memory data.
    pub fn from_regions(regions: HashMap<String, Vec<TelemetryRecord>>) -> Self {
        Self {
            regions,
            source: None,
        }
    }

    /// Load a store from a JSON file.
    ///
    /// Accepts either `{ "region": [record, ...] }` or a flat
    /// `[{ "region": ..., "latency_ms": ..., "uptime": ... }]` array.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut store = Self::parse(&content).map_err(|e| match e {
            ParseFailure::Json(source) => StoreError::Parse {
                path: path.to_path_buf(),
                source,
            },
            ParseFailure::Layout => StoreError::UnsupportedLayout {
                path: path.to_path_buf(),
            },
        })?;
        store.source = Some(path.to_path_buf());

        Ok(store)
    }

    fn parse(content: &str) -> Result<Self, ParseFailure> {
        let value: serde_json::Value = serde_json::from_str(content).map_err(ParseFailure::Json)?;

        let regions = match value {
            serde_json::Value::Object(_) => {
                serde_json::from_value::<HashMap<String, Vec<TelemetryRecord>>>(value)
                    .map_err(ParseFailure::Json)?
            }
            serde_json::Value::Array(_) => {
                let flat: Vec<FlatRecord> =
                    serde_json::from_value(value).map_err(ParseFailure::Json)?;
                let mut grouped: HashMap<String, Vec<TelemetryRecord>> = HashMap::new();
                for entry in flat {
                    grouped
                        .entry(entry.region)
                        .or_default()
                        .push(TelemetryRecord::new(entry.latency_ms, entry.uptime));
                }
                grouped
            }
            _ => return Err(ParseFailure::Layout),
        };

        Ok(Self::from_regions(regions))
    }

    /// Load from the first candidate path that exists.
    ///
    /// Never fails: a missing or broken data file yields an empty store.
    pub fn from_candidates(candidates: &[PathBuf]) -> Self {
        let Some(path) = candidates.iter().find(|p| p.is_file()) else {
            warn!(
                "No telemetry data file found (tried {}), serving empty dataset",
                candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            return Self::empty();
        };

        debug!("Loading telemetry from {}", path.display());
        match Self::load(path) {
            Ok(store) => {
                info!(
                    "Loaded {} records across {} regions from {}",
                    store.record_count(),
                    store.region_count(),
                    path.display()
                );
                debug!("Regions: {}", store.regions().join(", "));
                store
            }
            Err(e) => {
                warn!("{}, serving empty dataset", e);
                Self::empty()
            }
        }
    }

    /// Records for a region; empty when the region is unknown.
    pub fn records(&self, region: &str) -> &[TelemetryRecord] {
        self.regions.get(region).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, region: &str) -> bool {
        self.regions.contains_key(region)
    }

    /// Region names in sorted order.
    pub fn regions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.regions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Total number of records across all regions.
    pub fn record_count(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// File the store was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

enum ParseFailure {
    Json(serde_json::Error),
    Layout,
}

/// Resolve the ordered list of data file candidates.
///
/// An explicit path is tried first, followed by the configured names.
pub fn candidate_paths(explicit: Option<&Path>, configured: &[String]) -> Vec<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain(configured.iter().map(PathBuf::from))
        .collect()
}
