//! ClickPulse — replay driver for the behavioral telemetry collector.
//!
//! Streams recorded interaction events (JSON Lines) through a capture engine
//! and delivers the resulting records to the configured collection endpoint.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};

use clickpulse_collector::{
    CaptureEngine, CollectorConfig, HttpDispatcher, ReplaySurface, SurfaceEvent, TrackedElement,
};

#[derive(Parser, Debug)]
#[command(name = "clickpulse")]
#[command(about = "Replay interaction event streams through the telemetry collector")]
#[command(version)]
struct Cli {
    /// Interaction event stream (JSON Lines); reads stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,

    /// Collection endpoint base URL (overrides config)
    #[arg(long, env = "CLICKPULSE__ENDPOINT")]
    endpoint: Option<String>,

    /// Scroll debounce window in milliseconds (overrides config)
    #[arg(long, env = "CLICKPULSE__SCROLL_DEBOUNCE_MS")]
    scroll_debounce_ms: Option<u64>,

    /// Initial page URL of the replayed session
    #[arg(long, default_value = "http://localhost/")]
    page_url: String,

    /// Initial page title of the replayed session
    #[arg(long, default_value = "")]
    page_title: String,

    /// JSON file declaring markup-tracked elements, scanned at installation
    #[arg(long)]
    tracked: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clickpulse=info,clickpulse_collector=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = CollectorConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        CollectorConfig::default()
    });
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(window) = cli.scroll_debounce_ms {
        config.scroll_debounce_ms = window;
    }

    info!(
        endpoint = %config.endpoint,
        track_path = %config.track_path,
        scroll_debounce_ms = config.scroll_debounce_ms,
        "Configuration loaded"
    );

    let surface = Arc::new(ReplaySurface::new(cli.page_url, cli.page_title));
    if let Some(path) = &cli.tracked {
        let declared = std::fs::read_to_string(path)
            .with_context(|| format!("reading tracked elements from {}", path.display()))?;
        let elements: Vec<TrackedElement> =
            serde_json::from_str(&declared).context("parsing tracked elements")?;
        info!(count = elements.len(), "Declared tracked elements");
        for element in elements {
            surface.add_tracked(element);
        }
    }

    let dispatcher = Arc::new(HttpDispatcher::new(&config)?);
    let engine = CaptureEngine::install(surface.clone(), dispatcher, &config);
    info!(session_id = %engine.session_id(), "Replay session started");

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut replayed = 0u64;
    let mut skipped = 0u64;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match apply_line(&surface, line) {
            Ok(()) => replayed += 1,
            Err(error) => {
                warn!(error = %error, "Skipping malformed replay line");
                skipped += 1;
            }
        }
    }

    // Let the debounce window elapse and in-flight deliveries settle before
    // tearing down; delivery stays fire-and-forget either way.
    tokio::time::sleep(Duration::from_millis(config.scroll_debounce_ms + 250)).await;
    engine.detach();

    info!(replayed, skipped, "Replay finished");
    Ok(())
}

/// A replay line is either a `navigate` directive (moves the surface, which
/// reports a history navigation) or a raw surface event.
fn apply_line(surface: &ReplaySurface, line: &str) -> anyhow::Result<()> {
    let value: serde_json::Value = serde_json::from_str(line)?;
    if value.get("kind").and_then(serde_json::Value::as_str) == Some("navigate") {
        #[derive(Debug, Deserialize)]
        struct NavigateLine {
            url: String,
            title: String,
        }
        let nav: NavigateLine = serde_json::from_value(value)?;
        surface.navigate(nav.url, nav.title);
    } else {
        let event: SurfaceEvent = serde_json::from_value(value)?;
        surface.emit(event);
    }
    Ok(())
}
