//! Data models for the latency analyzer.
//!
//! This module contains the telemetry records loaded from disk and the
//! request/response shapes exchanged with callers.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Threshold applied when a request does not carry one.
pub const DEFAULT_THRESHOLD_MS: i64 = 180;

/// A single recorded observation for a region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Observed latency in milliseconds.
    pub latency_ms: f64,
    /// Observed uptime ratio.
    #[serde(alias = "uptime_pct")]
    pub uptime: f64,
}

impl TelemetryRecord {
    /// Creates a new record.
    pub fn new(latency_ms: f64, uptime: f64) -> Self {
        Self { latency_ms, uptime }
    }
}

/// Request body for an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Regions to analyze, in the order results should be reported.
    pub regions: Vec<String>,
    /// Breach threshold in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_ms: Option<i64>,
}

impl AnalysisRequest {
    /// Creates a request for the given regions with no explicit threshold.
    pub fn new<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            regions: regions.into_iter().map(Into::into).collect(),
            threshold_ms: None,
        }
    }

    /// Sets an explicit threshold.
    pub fn with_threshold(mut self, threshold_ms: i64) -> Self {
        self.threshold_ms = Some(threshold_ms);
        self
    }

    /// Returns the request threshold, or `default` when none was given.
    pub fn threshold_or(&self, default: i64) -> i64 {
        self.threshold_ms.unwrap_or(default)
    }
}

/// Computed metrics for one region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionMetrics {
    /// Mean latency, rounded to 2 decimal places.
    pub avg_latency: f64,
    /// Interpolated 95th percentile latency, rounded to 2 decimal places.
    pub p95_latency: f64,
    /// Mean uptime, rounded to 4 decimal places.
    pub avg_uptime: f64,
    /// Number of records whose latency strictly exceeds the threshold.
    pub breaches: u64,
}

impl RegionMetrics {
    /// The all-zero record reported for regions without data.
    pub const ZERO: RegionMetrics = RegionMetrics {
        avg_latency: 0.0,
        p95_latency: 0.0,
        avg_uptime: 0.0,
        breaches: 0,
    };
}

/// Analysis result keyed by region name.
///
/// Entries keep insertion order, which mirrors the order of the request.
/// Serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResponse {
    entries: Vec<(String, RegionMetrics)>,
}

impl AnalysisResponse {
    /// Creates an empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts metrics for a region.
    ///
    /// A region that is already present keeps its position and gets the new value.
    pub fn insert(&mut self, region: impl Into<String>, metrics: RegionMetrics) {
        let region = region.into();
        match self.entries.iter_mut().find(|(name, _)| *name == region) {
            Some((_, existing)) => *existing = metrics,
            None => self.entries.push((region, metrics)),
        }
    }

    /// Looks up the metrics for a region.
    pub fn get(&self, region: &str) -> Option<&RegionMetrics> {
        self.entries
            .iter()
            .find(|(name, _)| name == region)
            .map(|(_, metrics)| metrics)
    }

    /// Iterates over `(region, metrics)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegionMetrics)> {
        self.entries.iter().map(|(name, m)| (name.as_str(), m))
    }

    /// Region names in insertion order.
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for AnalysisResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (region, metrics) in &self.entries {
            map.serialize_entry(region, metrics)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AnalysisResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ResponseVisitor;

        impl<'de> Visitor<'de> for ResponseVisitor {
            type Value = AnalysisResponse;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a map of region name to metrics")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut response = AnalysisResponse::new();
                while let Some((region, metrics)) =
                    access.next_entry::<String, RegionMetrics>()?
                {
                    response.insert(region, metrics);
                }
                Ok(response)
            }
        }

        deserializer.deserialize_map(ResponseVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_default_threshold() {
        let req: AnalysisRequest = serde_json::from_str(r#"{"regions": ["apac"]}"#).unwrap();
        assert_eq!(req.regions, vec!["apac"]);
        assert_eq!(req.threshold_ms, None);
        assert_eq!(req.threshold_or(DEFAULT_THRESHOLD_MS), 180);

        let req: AnalysisRequest =
            serde_json::from_str(r#"{"regions": [], "threshold_ms": 150}"#).unwrap();
        assert_eq!(req.threshold_or(DEFAULT_THRESHOLD_MS), 150);
    }

    #[test]
    fn test_request_rejects_missing_regions() {
        let result: Result<AnalysisRequest, _> = serde_json::from_str(r#"{"threshold_ms": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_request_threshold_must_be_integer() {
        for body in [
            r#"{"regions": [], "threshold_ms": 180.0}"#,
            r#"{"regions": [], "threshold_ms": 180.5}"#,
            r#"{"regions": [], "threshold_ms": "180"}"#,
        ] {
            let result: Result<AnalysisRequest, _> = serde_json::from_str(body);
            assert!(result.is_err(), "accepted {}", body);
        }
    }

    #[test]
    fn test_record_uptime_alias() {
        let record: TelemetryRecord =
            serde_json::from_str(r#"{"latency_ms": 120.5, "uptime_pct": 99.1, "service": "x"}"#)
                .unwrap();
        assert_eq!(record, TelemetryRecord::new(120.5, 99.1));
    }

    #[test]
    fn test_zero_metrics() {
        assert_eq!(RegionMetrics::default(), RegionMetrics::ZERO);
        let json = serde_json::to_value(RegionMetrics::ZERO).unwrap();
        assert_eq!(json["breaches"], 0);
        assert_eq!(json["avg_latency"].as_f64(), Some(0.0));
    }

    #[test]
    fn test_response_preserves_insertion_order() {
        let mut response = AnalysisResponse::new();
        response.insert("emea", RegionMetrics::ZERO);
        response.insert("apac", RegionMetrics::ZERO);
        response.insert("amer", RegionMetrics::ZERO);

        let json = serde_json::to_string(&response).unwrap();
        let emea = json.find("emea").unwrap();
        let apac = json.find("apac").unwrap();
        let amer = json.find("amer").unwrap();
        assert!(emea < apac && apac < amer);
    }

    #[test]
    fn test_response_duplicate_region_keeps_first_position() {
        let mut response = AnalysisResponse::new();
        response.insert("emea", RegionMetrics::ZERO);
        response.insert("apac", RegionMetrics::ZERO);
        let updated = RegionMetrics {
            breaches: 3,
            ..RegionMetrics::ZERO
        };
        response.insert("emea", updated);

        assert_eq!(response.len(), 2);
        assert_eq!(response.regions().collect::<Vec<_>>(), vec!["emea", "apac"]);
        assert_eq!(response.get("emea"), Some(&updated));
    }

    #[test]
    fn test_response_json_round_trip() {
        let mut response = AnalysisResponse::new();
        response.insert(
            "apac",
            RegionMetrics {
                avg_latency: 163.42,
                p95_latency: 219.77,
                avg_uptime: 0.9812,
                breaches: 4,
            },
        );
        response.insert("nowhere", RegionMetrics::ZERO);

        let json = serde_json::to_string(&response).unwrap();
        let decoded: AnalysisResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, response);
        assert_eq!(
            decoded.regions().collect::<Vec<_>>(),
            response.regions().collect::<Vec<_>>()
        );
    }
}
