use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    kiosk::{ControllerConfig, LaneConfig},
    presentation::DurationLocale,
    sensing::DebounceConfig,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KioskSettings {
    pub stability_threshold: u32,
    pub absence_threshold: u32,
    pub storage_timeout_ms: u64,
    pub tick_interval_ms: u64,
    pub frame_queue_capacity: usize,
    pub database_path: PathBuf,
    /// JSON-lines detector recording fed to the lane at startup.
    pub replay_path: PathBuf,
    pub duration_locale: DurationLocale,
}

impl Default for KioskSettings {
    fn default() -> Self {
        let debounce = DebounceConfig::default();
        Self {
            stability_threshold: debounce.stability_threshold,
            absence_threshold: debounce.absence_threshold,
            storage_timeout_ms: 2_000,
            tick_interval_ms: 30,
            frame_queue_capacity: 64,
            database_path: PathBuf::from("kiosk.sqlite3"),
            replay_path: PathBuf::from("detections.jsonl"),
            duration_locale: DurationLocale::default(),
        }
    }
}

impl KioskSettings {
    pub fn validate(&self) -> Result<()> {
        if self.stability_threshold < 1 {
            bail!("stabilityThreshold must be at least 1");
        }
        if self.absence_threshold < 1 {
            bail!("absenceThreshold must be at least 1");
        }
        if self.storage_timeout_ms == 0 {
            bail!("storageTimeoutMs must be positive");
        }
        if self.tick_interval_ms == 0 {
            bail!("tickIntervalMs must be positive");
        }
        if self.frame_queue_capacity == 0 {
            bail!("frameQueueCapacity must be positive");
        }
        Ok(())
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            debounce: DebounceConfig {
                stability_threshold: self.stability_threshold,
                absence_threshold: self.absence_threshold,
            },
            storage_timeout: Duration::from_millis(self.storage_timeout_ms),
        }
    }

    pub fn lane_config(&self) -> LaneConfig {
        LaneConfig {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            queue_capacity: self.frame_queue_capacity,
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: KioskSettings,
}

impl SettingsStore {
    /// Loads settings from `path`. A missing file is created with the defaults
    /// so operators have a template to edit.
    pub fn new(path: PathBuf) -> Result<Self> {
        let existed = path.exists();
        let data = if existed {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<KioskSettings>(&contents) {
                Ok(settings) => settings,
                Err(err) => {
                    warn!(
                        "Ignoring unparsable settings in {}: {err}; using defaults",
                        path.display()
                    );
                    KioskSettings::default()
                }
            }
        } else {
            KioskSettings::default()
        };

        data.validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;

        let store = Self { path, data };
        if !existed {
            match store.persist() {
                Ok(()) => info!("Wrote default settings to {}", store.path.display()),
                Err(err) => warn!("{err:#}; continuing with defaults"),
            }
        }
        Ok(store)
    }

    pub fn current(&self) -> KioskSettings {
        self.data.clone()
    }

    fn persist(&self) -> Result<()> {
        let serialized = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let settings = store.current();

        assert_eq!(settings, KioskSettings::default());
        assert_eq!(settings.controller_config().debounce, DebounceConfig::default());
        assert_eq!(settings.lane_config().tick_interval, Duration::from_millis(30));
        assert_eq!(settings.lane_config().queue_capacity, 64);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "stabilityThreshold": 3, "durationLocale": "english" }"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().current();
        assert_eq!(settings.stability_threshold, 3);
        assert_eq!(settings.absence_threshold, 61);
        assert_eq!(settings.duration_locale, DurationLocale::English);
    }

    #[test]
    fn garbage_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let settings = SettingsStore::new(path).unwrap().current();
        assert_eq!(settings, KioskSettings::default());
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "absenceThreshold": 0 }"#).unwrap();

        assert!(SettingsStore::new(path).is_err());
    }

    #[test]
    fn missing_file_is_seeded_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        SettingsStore::new(path.clone()).unwrap();

        let written: KioskSettings =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, KioskSettings::default());
        assert!(fs::read_to_string(&path).unwrap().contains("\"stabilityThreshold\": 6"));
    }

    #[test]
    fn existing_file_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        SettingsStore::new(path.clone()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json");
    }

    #[test]
    fn unwritable_template_still_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("settings.json");

        let settings = SettingsStore::new(path).unwrap().current();
        assert_eq!(settings.storage_timeout_ms, 2_000);
    }
}
