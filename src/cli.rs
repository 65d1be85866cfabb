//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// latencyscope - per-region latency statistics over recorded telemetry
///
/// Serves `POST /api` computing average latency, p95 latency, average
/// uptime and threshold breaches for the requested regions. With
/// --regions, runs a single analysis and prints the result instead.
///
/// Examples:
///   latencyscope
///   latencyscope --port 9000 --data ./q-vercel-latency.json
///   latencyscope --regions apac,emea --threshold 170
///   latencyscope --regions apac --format markdown --output report.md
///   latencyscope --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Address to bind the HTTP server to
    #[arg(long, value_name = "HOST", env = "LATENCYSCOPE_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, value_name = "PORT", env = "LATENCYSCOPE_PORT")]
    pub port: Option<u16>,

    /// Telemetry data file
    ///
    /// Tried before the candidate locations from the config file.
    #[arg(short, long, value_name = "FILE", env = "LATENCYSCOPE_DATA")]
    pub data: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .latencyscope.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Regions to analyze once, without starting the server (comma-separated)
    ///
    /// Example: --regions apac,emea
    #[arg(short, long, value_name = "REGIONS", value_delimiter = ',')]
    pub regions: Option<Vec<String>>,

    /// Breach threshold in milliseconds
    ///
    /// Overrides the configured default threshold.
    #[arg(short, long, value_name = "MS", allow_negative_numbers = true)]
    pub threshold: Option<i64>,

    /// Output format for --regions (json, markdown)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the --regions report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Generate a default .latencyscope.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for one-shot reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON format, identical to the HTTP response body (default)
    #[default]
    Json,
    /// Markdown table
    Markdown,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.port == Some(0) {
            return Err("Port must be between 1 and 65535".to_string());
        }

        match self.regions {
            Some(ref regions) => {
                if regions.is_empty() || regions.iter().any(|r| r.trim().is_empty()) {
                    return Err("Region names must not be empty".to_string());
                }
            }
            None => {
                if self.format.is_some() || self.output.is_some() {
                    return Err("--format and --output require --regions".to_string());
                }
            }
        }

        Ok(())
    }

    /// True when a single analysis should be printed instead of serving.
    pub fn is_one_shot(&self) -> bool {
        self.regions.is_some()
    }

    /// Returns the report format, defaulting to JSON.
    pub fn output_format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            host: None,
            port: None,
            data: None,
            config: None,
            verbose: false,
            quiet: false,
            regions: None,
            threshold: None,
            format: None,
            output: None,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_one_shot_flags() {
        let args = Args::try_parse_from([
            "latencyscope",
            "--regions",
            "apac,emea",
            "--threshold",
            "170",
            "--format",
            "markdown",
        ])
        .unwrap();

        assert_eq!(
            args.regions,
            Some(vec!["apac".to_string(), "emea".to_string()])
        );
        assert_eq!(args.threshold, Some(170));
        assert_eq!(args.output_format(), OutputFormat::Markdown);
        assert!(args.is_one_shot());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_negative_threshold() {
        let args =
            Args::try_parse_from(["latencyscope", "--regions", "apac", "--threshold", "-5"])
                .unwrap();
        assert_eq!(args.threshold, Some(-5));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_port_zero() {
        let mut args = make_args();
        args.port = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_empty_region() {
        let mut args = make_args();
        args.regions = Some(vec!["apac".to_string(), " ".to_string()]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_report_flags_need_regions() {
        let mut args = make_args();
        args.format = Some(OutputFormat::Json);
        assert!(args.validate().is_err());

        args.format = None;
        args.output = Some(PathBuf::from("out.json"));
        assert!(args.validate().is_err());

        args.regions = Some(vec!["apac".to_string()]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
