//! COVID-19 case API entry point.

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use covid19_api::api::{create_router, AppState};
use covid19_api::config::{Config, LogFormat, SourceKind};
use covid19_api::data::{sample_dataset, CaseSource, StaticSource};
use covid19_api::metrics;
use covid19_api::utils::shutdown_signal;

/// Read-only HTTP API over COVID-19 case data.
#[derive(Parser, Debug)]
#[command(name = "covid19-api")]
#[command(about = "Serve JHU CSSE COVID-19 case data over HTTP")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format, pretty or json (overrides LOG_FORMAT).
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,

        /// Read the CSV files from this directory instead of downloading them.
        #[arg(long)]
        data_dir: Option<String>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Fetch the data once and print a summary.
    Snapshot {
        /// Use the built-in sample dataset.
        #[arg(long)]
        demo: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging from RUST_LOG / LOG_FORMAT; commands report config errors
    let env_config = Config::load().unwrap_or_default();
    let filter = EnvFilter::try_new(env_config.log_directive(args.verbose))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match args.log_format.unwrap_or(env_config.log_format) {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init(),
    }

    // Handle subcommands
    match args.command {
        Some(Command::Serve { port, data_dir }) => cmd_serve(port.or(args.port), data_dir).await,
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Snapshot { demo }) => cmd_snapshot(demo).await,
        None => cmd_serve(args.port, None).await,
    }
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("COVID-19 API - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Bind: {}", config.bind_addr());
    println!("  Data Source: {}", config.data_source);
    match config.data_source {
        SourceKind::Remote => {
            println!("  Base URL: {}", config.data_base_url);
            println!("  HTTP Timeout: {}ms", config.http_timeout_ms);
        }
        SourceKind::Directory => {
            println!("  Directory: {}", config.data_dir.as_deref().unwrap_or("-"));
        }
    }
    println!("  CORS (any origin): {}", config.cors_allow_any);
    println!("  Metrics: {}", if config.metrics_enabled { "Enabled" } else { "Disabled" });
    println!("  Log Level: {}", config.rust_log);
    println!("  Log Format: {}", config.log_format);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Fetch the data once and print a summary.
async fn cmd_snapshot(demo: bool) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("COVID-19 API - SNAPSHOT");
    println!("======================================================================");

    let source = if demo {
        CaseSource::Static(StaticSource::new(sample_dataset()))
    } else {
        let config = Config::load()?;
        config.validate().map_err(|e| anyhow::anyhow!(e))?;
        CaseSource::from_config(&config)?
    };

    println!("Source: {}", source.describe());
    print!("Fetching case tables... ");
    let model = match source.load_model().await {
        Ok(model) => {
            println!("OK");
            model
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Snapshot failed"));
        }
    };

    let totals = model.total();
    let status = model.current_status();
    println!("----------------------------------------------------------------------");
    println!("  Date: {} (ts {})", model.datetime_raw(), model.timestamp());
    println!("  Countries: {}", status.countries.len());
    println!("  Confirmed: {}", totals.stats.confirmed);
    println!("  Deaths: {}", totals.stats.deaths);
    println!("  Recovered: {}", totals.stats.recovered);

    let mut ranked: Vec<_> = status.countries.iter().collect();
    ranked.sort_by(|a, b| b.1.confirmed.cmp(&a.1.confirmed));
    println!("  Top countries by confirmed:");
    for (country, stats) in ranked.iter().take(5) {
        println!(
            "   - {}: {} confirmed, {} deaths, {} recovered",
            country, stats.confirmed, stats.deaths, stats.recovered
        );
    }
    println!("======================================================================");

    Ok(())
}

/// Run the HTTP server.
async fn cmd_serve(port_override: Option<u16>, data_dir: Option<String>) -> anyhow::Result<()> {
    // Load configuration
    info!("Loading configuration...");
    let mut config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    // Override with CLI args if provided
    if let Some(port) = port_override {
        config.port = port;
    }
    if let Some(dir) = data_dir {
        config.data_source = SourceKind::Directory;
        config.data_dir = Some(dir);
    }

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    let source = CaseSource::from_config(&config)?;
    info!(source = %source.describe(), "Data source configured");

    // Create app state
    let mut app_state = AppState::new(source);
    if config.metrics_enabled {
        let handle = metrics::init_metrics()?;
        app_state = app_state.with_metrics(handle);
        info!("Prometheus metrics enabled at /metrics");
    }

    // Start HTTP server
    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("HTTP server listening on {}", listener.local_addr()?);

    let router = create_router(app_state, config.cors_allow_any);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
