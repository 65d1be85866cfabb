//! latencyscope - per-region latency statistics service
//!
//! Loads recorded per-region telemetry once at startup and serves
//! `POST /api`, returning average latency, p95 latency, average uptime and
//! threshold breaches for each requested region. With `--regions` it runs
//! a single analysis and prints the result instead of serving.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Invalid arguments, bad config file, or server failure

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod server;
mod store;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use models::AnalysisRequest;
use report::{Report, ReportMetadata};
use server::AppState;
use std::sync::Arc;
use store::TelemetryStore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("latencyscope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .latencyscope.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over the CLI verbosity flags.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(args.log_level()).into())
    });

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Load config and data, then either serve or print a one-shot report.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // The store is loaded exactly once and shared read-only from here on.
    let candidates = store::candidate_paths(args.data.as_deref(), &config.data.candidates);
    let store = Arc::new(TelemetryStore::from_candidates(&candidates));
    if store.is_empty() {
        warn!("Telemetry dataset is empty, every region will report zeros");
    }

    if args.is_one_shot() {
        return run_report(&args, &config, &store);
    }

    let state = AppState::new(store, config.analysis.default_threshold_ms);
    server::serve(state, &config.server).await
}

/// Handle --regions: analyze once and write the report.
fn run_report(args: &Args, config: &Config, store: &TelemetryStore) -> Result<()> {
    let regions = args.regions.clone().unwrap_or_default();
    let mut request = AnalysisRequest::new(regions);
    if let Some(threshold) = args.threshold {
        request = request.with_threshold(threshold);
    }
    let threshold_ms = request.threshold_or(config.analysis.default_threshold_ms);

    let results = analysis::analyze(store, &request, config.analysis.default_threshold_ms);
    debug!(
        "Analyzed regions: {}",
        results.regions().collect::<Vec<_>>().join(", ")
    );
    let missing = analysis::regions_without_data(store, &request);
    if !missing.is_empty() {
        warn!("No telemetry for: {}", missing.join(", "));
    }

    let report = Report {
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            data_source: store.source().map(|p| p.display().to_string()),
            threshold_ms,
            regions_without_data: missing.into_iter().map(String::from).collect(),
        },
        results,
    };

    let output = match args.output_format() {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    report::write_report(&output, args.output.as_deref())?;

    if let Some(ref path) = args.output {
        info!("Report saved to {}", path.display());
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
