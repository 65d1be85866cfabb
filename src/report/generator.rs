//! Report generation.
//!
//! This module renders one-shot analysis results as JSON (the same body
//! the HTTP endpoint returns) or as a Markdown table.

use crate::models::{AnalysisResponse, RegionMetrics};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;

/// Metadata about a one-shot report.
#[derive(Debug, Clone)]
pub struct ReportMetadata {
    /// Time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Data file the store was loaded from.
    pub data_source: Option<String>,
    /// Threshold applied to the breach count.
    pub threshold_ms: i64,
    /// Requested regions with no recorded data.
    pub regions_without_data: Vec<String>,
}

/// A one-shot analysis report.
#[derive(Debug, Clone)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub results: AnalysisResponse,
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Latency Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_results_section(&report.results));

    if !report.metadata.regions_without_data.is_empty() {
        output.push_str(&generate_missing_section(
            &report.metadata.regions_without_data,
        ));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Data Source:** {}\n",
        metadata
            .data_source
            .as_deref()
            .map(|s| format!("`{}`", s))
            .unwrap_or_else(|| "none (empty dataset)".to_string())
    ));
    section.push_str(&format!(
        "- **Breach Threshold:** {} ms\n",
        metadata.threshold_ms
    ));
    section.push('\n');

    section
}

/// Generate the per-region results table.
fn generate_results_section(results: &AnalysisResponse) -> String {
    let mut section = String::new();

    section.push_str("## Results\n\n");

    if results.is_empty() {
        section.push_str("No regions requested.\n\n");
        return section;
    }

    section.push_str(
        "| Region | Avg Latency (ms) | P95 Latency (ms) | Avg Uptime | Breaches |\n",
    );
    section.push_str("|:---|---:|---:|---:|---:|\n");

    for (region, metrics) in results.iter() {
        section.push_str(&generate_region_row(region, metrics));
    }
    section.push('\n');

    section
}

fn generate_region_row(region: &str, metrics: &RegionMetrics) -> String {
    format!(
        "| {} | {:.2} | {:.2} | {:.4} | {} |\n",
        region, metrics.avg_latency, metrics.p95_latency, metrics.avg_uptime, metrics.breaches
    )
}

fn generate_missing_section(regions: &[String]) -> String {
    let mut section = String::new();

    section.push_str("## Regions Without Data\n\n");
    section.push_str("These regions have no recorded telemetry and report zeros:\n\n");
    for region in regions {
        section.push_str(&format!("- `{}`\n", region));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    format!(
        "---\n\n*Generated by latencyscope v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Generate the JSON report: the analysis result exactly as the API returns it.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(&report.results).map_err(Into::into)
}

/// Write a rendered report to a file, or to stdout when no path is given.
pub fn write_report(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            file.write_all(content.as_bytes())
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                handle.write_all(b"\n")?;
            }
        }
    }

    Ok(())
}
