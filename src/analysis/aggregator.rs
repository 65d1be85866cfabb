//! Latency aggregation and statistics.
//!
//! This module computes per-region summary statistics over recorded
//! telemetry: mean latency, interpolated p95 latency, mean uptime and the
//! number of threshold breaches.

use crate::models::{AnalysisRequest, AnalysisResponse, RegionMetrics, TelemetryRecord};
use crate::store::TelemetryStore;
use tracing::debug;

/// Percentile reported as `p95_latency`.
const P95: f64 = 95.0;

/// Linearly interpolated percentile of `values`.
///
/// Sorts a copy of the samples, takes the fractional rank
/// `p/100 * (n-1)` and interpolates between the two bracketing order
/// statistics. `p` is clamped to `[0, 100]`. Returns `0.0` for no samples.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let p = p.clamp(0.0, 100.0);
    let index = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = lower + 1;
    let weight = index - lower as f64;

    if upper >= sorted.len() {
        return sorted[sorted.len() - 1];
    }

    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// Arithmetic mean, `0.0` for no samples.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Round to `places` decimal places.
///
/// Rounds the exact decimal expansion of `value`, so `2.675` (stored just
/// below the midpoint) becomes `2.67`. Formatting does the rounding and is
/// parsed back.
pub fn round_to(value: f64, places: usize) -> f64 {
    format!("{:.*}", places, value).parse().unwrap_or(value)
}

/// Count records whose latency strictly exceeds the threshold.
pub fn count_breaches(records: &[TelemetryRecord], threshold_ms: i64) -> u64 {
    let threshold = threshold_ms as f64;
    records.iter().filter(|r| r.latency_ms > threshold).count() as u64
}

/// Compute metrics for one region's records.
pub fn analyze_region(records: &[TelemetryRecord], threshold_ms: i64) -> RegionMetrics {
    if records.is_empty() {
        return RegionMetrics::ZERO;
    }

    let latencies: Vec<f64> = records.iter().map(|r| r.latency_ms).collect();
    let uptimes: Vec<f64> = records.iter().map(|r| r.uptime).collect();

    RegionMetrics {
        avg_latency: round_to(mean(&latencies), 2),
        p95_latency: round_to(percentile(&latencies, P95), 2),
        avg_uptime: round_to(mean(&uptimes), 4),
        breaches: count_breaches(records, threshold_ms),
    }
}

/// Analyze every requested region against the store.
///
/// Results follow request order. Regions missing from the store get the
/// all-zero record; `default_threshold_ms` applies when the request has no
/// threshold of its own.
pub fn analyze(
    store: &TelemetryStore,
    request: &AnalysisRequest,
    default_threshold_ms: i64,
) -> AnalysisResponse {
    let threshold_ms = request.threshold_or(default_threshold_ms);
    debug!(
        "Analyzing {} regions with threshold {}ms",
        request.regions.len(),
        threshold_ms
    );

    let mut response = AnalysisResponse::new();
    for region in &request.regions {
        if response.get(region).is_some() {
            continue;
        }
        if !store.contains(region) {
            debug!("Region {} not in dataset, reporting zeros", region);
        }
        let metrics = analyze_region(store.records(region), threshold_ms);
        response.insert(region.clone(), metrics);
    }

    response
}

/// Regions in the request that have no records in the store.
pub fn regions_without_data<'a>(
    store: &TelemetryStore,
    request: &'a AnalysisRequest,
) -> Vec<&'a str> {
    let mut missing: Vec<&str> = Vec::new();
    for region in &request.regions {
        if store.records(region).is_empty() && !missing.contains(&region.as_str()) {
            missing.push(region);
        }
    }
    missing
}
