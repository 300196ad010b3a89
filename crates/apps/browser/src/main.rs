use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use foundation::Coordinate;
use scene::headless::{HeadlessMap, RecordingList};
use scene::{Session, SessionConfig};
use streaming::HttpBackend;
use tokio::io::AsyncBufReadExt;
use tracing::{info, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod command;
mod driver;

/// Width of the tile list panel next to the map.
const LIST_PANEL_PX: u32 = 400;

#[derive(Parser, Debug)]
#[command(author, version, about = "Filming-location browser driven by a command script on stdin")]
struct Args {
    /// Backend base URL (default: $REELMAP_BACKEND_URL or http://127.0.0.1:8080)
    #[arg(long)]
    backend_url: Option<String>,

    /// JSON file overriding session settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Window width; the map gets what the tile list leaves over
    #[arg(long, default_value_t = 1200)]
    width: u32,

    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Tiles visible in the list without scrolling
    #[arg(long, default_value_t = 4)]
    visible_rows: usize,
}

fn load_config(path: Option<&PathBuf>) -> Result<SessionConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("reading {}: {e}", path.display()))?;
    let config = serde_json::from_str(&raw)
        .map_err(|e| format!("parsing {}: {e}", path.display()))?;
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let backend_url = args.backend_url.clone().unwrap_or_else(|| {
        env::var("REELMAP_BACKEND_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string())
    });
    let config = load_config(args.config.as_ref())?;

    let map_width = args.width.saturating_sub(LIST_PANEL_PX).max(1);
    let map = HeadlessMap::new(Coordinate::new(0.0, 0.0), 2, map_width, args.height);
    let list = RecordingList::new(args.visible_rows);
    let session = Session::new(config, map, list);
    let backend = Arc::new(HttpBackend::new(backend_url.clone()));

    let session_id = Uuid::new_v4();
    let span = tracing::info_span!("session", id = %session_id);
    info!(parent: &span, backend = %backend_url, "starting");

    let lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let session = driver::Driver::new(session, backend)
        .run(lines)
        .instrument(span.clone())
        .await;

    let snapshot = session.metrics().snapshot();
    for (name, value) in snapshot.counters {
        info!(parent: &span, counter = name, value, "metrics");
    }
    Ok(())
}
