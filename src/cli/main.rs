//! Command-line front end.
//!
//! Loads a zone file, runs a single-zone category sweep or a whole-file
//! query against the configured search provider, and writes the accepted
//! places as CSV.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use zonesweep::loader::{self, PropertyKeys};
use zonesweep::search::HttpSearchProvider;
use zonesweep::status::{Severity, StatusMessage};
use zonesweep::{Config, LatLng, ResultRecord, Session};

#[derive(Parser, Debug)]
#[command(name = "zonesweep")]
#[command(about = "Find places of interest inside polygon zones")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Search provider base URL (overrides config)
    #[arg(long, global = true)]
    provider_url: Option<String>,

    /// Property holding the zone display name
    #[arg(long, global = true)]
    area_name_prop: Option<String>,

    /// Property holding the zone index
    #[arg(long, global = true)]
    zone_index_prop: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a zone file and list its zones and skipped lines
    Inspect {
        /// GeoJSON or newline-delimited GeoJSON file
        file: PathBuf,
    },
    /// Search one zone for the predefined categories
    Zone {
        file: PathBuf,

        /// Zone position in the file (0-based)
        #[arg(long, required_unless_present = "at", conflicts_with = "at")]
        index: Option<usize>,

        /// Pick the zone containing this location: "lat,lng"
        #[arg(long, value_parser = parse_lat_lng)]
        at: Option<LatLng>,

        /// CSV output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Search every zone for a free-text query
    Search {
        file: PathBuf,

        #[arg(short, long)]
        query: String,

        /// CSV output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(url) = &args.provider_url {
        config.provider.url = url.clone();
    }
    config.keys = PropertyKeys {
        area_name: args
            .area_name_prop
            .clone()
            .unwrap_or(config.keys.area_name),
        zone_index: args
            .zone_index_prop
            .clone()
            .unwrap_or(config.keys.zone_index),
    }
    .normalized();

    match args.command {
        Command::Inspect { file } => inspect(&file, &config.keys),
        Command::Zone {
            file,
            index,
            at,
            output,
        } => {
            let target = match (at, index) {
                (Some(point), _) => ZoneTarget::At(point),
                (None, Some(position)) => ZoneTarget::Position(position),
                (None, None) => anyhow::bail!("either --index or --at is required"),
            };
            run_zone(&file, target, output, config).await
        }
        Command::Search {
            file,
            query,
            output,
        } => run_search(&file, &query, output, config).await,
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Parse "lat,lng"
fn parse_lat_lng(s: &str) -> Result<LatLng, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid coordinate: {}", e))?;
    match parts.as_slice() {
        [lat, lng] => Ok(LatLng::new(*lat, *lng)),
        _ => Err("expected \"lat,lng\"".to_string()),
    }
}

fn inspect(file: &Path, keys: &PropertyKeys) -> Result<()> {
    let outcome = loader::load_path(file, keys)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    println!("{} zones ({:?})", outcome.zones.len(), outcome.format);
    for zone in &outcome.zones {
        let bbox = zone
            .bbox()
            .map(|b| b.to_query_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  [{}] {}  {}  bbox={}",
            zone.position, zone.id, zone.geometry.kind, bbox
        );
    }
    for warning in &outcome.warnings {
        println!("  skipped {}", warning);
    }
    Ok(())
}

enum ZoneTarget {
    Position(usize),
    At(LatLng),
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Show status messages until the session is dropped
async fn print_status(mut rx: UnboundedReceiver<StatusMessage>, pb: ProgressBar) {
    while let Some(message) = rx.recv().await {
        match message.severity {
            Severity::Loading => pb.set_message(message.text),
            Severity::Info => pb.println(format!("[info] {}", message.text)),
            Severity::Success => pb.println(format!("[ok] {}", message.text)),
            Severity::Error => pb.println(format!("[error] {}", message.text)),
        }
    }
    pb.finish_and_clear();
}

fn build_session(
    config: Config,
) -> Result<(Session<HttpSearchProvider>, tokio::task::JoinHandle<()>)> {
    let provider = HttpSearchProvider::new(
        &config.provider.url,
        config.provider.max_results,
        config.provider.timeout(),
    )
    .context("Failed to create search provider")?;
    info!("Using search provider at {}", provider.endpoint());

    let (session, rx) = Session::new(provider, config);
    let printer = tokio::spawn(print_status(rx, spinner()));
    Ok((session, printer))
}

fn print_results(results: &[ResultRecord]) {
    for r in results {
        println!(
            "{} | {} | {} ({}) | {:.6}, {:.6}",
            r.name, r.category, r.area_name, r.zone_index, r.latitude, r.longitude
        );
    }
}

/// Export when there is anything to export, then shut the printer down
async fn finish(
    session: Session<HttpSearchProvider>,
    printer: tokio::task::JoinHandle<()>,
    output: Option<PathBuf>,
) -> Result<()> {
    let results = session.results().to_vec();
    let exported = if results.is_empty() {
        None
    } else {
        let path = output.unwrap_or_else(|| PathBuf::from(&session.config().export.file_name));
        session
            .export_csv(&path)
            .with_context(|| format!("Failed to export {}", path.display()))?;
        Some(path)
    };

    drop(session);
    printer.await?;

    print_results(&results);
    if let Some(path) = exported {
        info!("Wrote {} rows to {}", results.len(), path.display());
    }
    Ok(())
}

/// Flush pending status lines before reporting a failure
async fn abort(
    session: Session<HttpSearchProvider>,
    printer: tokio::task::JoinHandle<()>,
    err: anyhow::Error,
) -> Result<()> {
    drop(session);
    printer.await?;
    Err(err)
}

async fn sweep_zone(
    session: &mut Session<HttpSearchProvider>,
    file: &Path,
    target: ZoneTarget,
) -> Result<()> {
    session
        .load_file(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    let outcome = match target {
        ZoneTarget::Position(position) => session.search_zone(position).await,
        ZoneTarget::At(point) => session.search_zone_at(point).await,
    };
    let outcome = outcome.context("Zone search failed")?;
    info!("Zone search finished: {:?}", outcome);
    Ok(())
}

async fn run_zone(
    file: &Path,
    target: ZoneTarget,
    output: Option<PathBuf>,
    config: Config,
) -> Result<()> {
    let (mut session, printer) = build_session(config)?;
    match sweep_zone(&mut session, file, target).await {
        Ok(()) => finish(session, printer, output).await,
        Err(e) => abort(session, printer, e).await,
    }
}

async fn search_every_zone(
    session: &mut Session<HttpSearchProvider>,
    file: &Path,
    query: &str,
) -> Result<()> {
    session
        .load_file(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    let outcome = session.search_all(query).await.context("Search failed")?;
    info!(
        "Searched {} zones, {} failed, {} skipped",
        outcome.per_zone.len(),
        outcome.failed.len(),
        outcome.skipped.len()
    );
    Ok(())
}

async fn run_search(
    file: &Path,
    query: &str,
    output: Option<PathBuf>,
    config: Config,
) -> Result<()> {
    let (mut session, printer) = build_session(config)?;
    match search_every_zone(&mut session, file, query).await {
        Ok(()) => finish(session, printer, output).await,
        Err(e) => abort(session, printer, e).await,
    }
}
