pub mod db;
pub mod kiosk;
pub mod models;
pub mod presentation;
pub mod sensing;
pub mod settings;
pub mod store;
mod utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};

use db::Database;
use kiosk::{LaneController, SessionController};
use presentation::LogSink;
use sensing::{DetectionSampler, ReplayDetector};
use settings::SettingsStore;
use store::SessionStore;

const SETTINGS_ENV: &str = "KIOSK_SETTINGS";
const DEFAULT_SETTINGS_PATH: &str = "kiosk-settings.json";

/// Runs one lane against the configured replay recording until it is exhausted.
pub async fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Parking kiosk starting up...");

    let settings_path = std::env::var_os(SETTINGS_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));
    let settings = SettingsStore::new(settings_path)?.current();

    let database = Database::new(settings.database_path.clone())?;
    let open_stays = database.count_open_stays().await?;
    if open_stays > 0 {
        warn!("{} stays still open from a previous run", open_stays);
    }
    for sector in database
        .list_sectors()
        .await
        .context("failed to list sectors")?
    {
        info!(
            "Sector {} ({}) at row {}, column {}",
            sector.name,
            sector.vehicle_class_name,
            sector.grid_position.row,
            sector.grid_position.column
        );
    }

    let sink = LogSink::new(settings.duration_locale);
    let controller = SessionController::new(database, sink, settings.controller_config());
    let mut lane = LaneController::start(controller, settings.lane_config());

    let detector = ReplayDetector::open(&settings.replay_path)?;
    info!("Replaying detections from {}", detector.path().display());
    lane.switch_source(DetectionSampler::new(detector)).await?;
    lane.wait_for_source().await?;

    let controller = lane.stop().await?;
    let snapshot = controller.snapshot();
    info!(
        "Replay finished in phase {:?} ({} matching samples, {} since last detection)",
        snapshot.state.phase,
        snapshot.matching_sample_count,
        snapshot.samples_since_any_detection
    );

    Ok(())
}
