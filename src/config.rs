//! User settings and their persistence.
//!
//! Settings are loaded once at startup and handed to the app; the app
//! writes them back through a [`SettingsStore`] whenever they change.

use crate::i18n::Language;
use crate::speedtest::{Server, ThroughputUnit};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const ORGANIZATION: &str = "ALGYazilim";
const APPLICATION: &str = "RunnerSpeedTest";

pub const DEFAULT_SERVER_URL: &str = "https://speed.cloudflare.com";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub language: Language,
    pub unit: ThroughputUnit,
    pub ping_count: usize,
    pub download_size_mb: u64,
    pub upload_size_mb: u64,
    pub servers: Vec<Server>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: Language::default(),
            unit: ThroughputUnit::default(),
            ping_count: 10,
            download_size_mb: 25,
            upload_size_mb: 10,
            servers: vec![Server::new("Cloudflare", DEFAULT_SERVER_URL)],
        }
    }
}

impl Settings {
    pub fn download_size_bytes(&self) -> u64 {
        self.download_size_mb * 1_000_000
    }

    pub fn upload_size_bytes(&self) -> usize {
        (self.upload_size_mb * 1_000_000) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Language,
    Unit,
    PingCount,
    DownloadSize,
    UploadSize,
}

impl SettingsField {
    pub fn next(self) -> Self {
        match self {
            SettingsField::Language => SettingsField::Unit,
            SettingsField::Unit => SettingsField::PingCount,
            SettingsField::PingCount => SettingsField::DownloadSize,
            SettingsField::DownloadSize => SettingsField::UploadSize,
            SettingsField::UploadSize => SettingsField::Language,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            SettingsField::Language => SettingsField::UploadSize,
            SettingsField::Unit => SettingsField::Language,
            SettingsField::PingCount => SettingsField::Unit,
            SettingsField::DownloadSize => SettingsField::PingCount,
            SettingsField::UploadSize => SettingsField::DownloadSize,
        }
    }
}

/// Loads and saves [`Settings`].
pub trait SettingsStore: Send {
    fn load(&self) -> Result<Settings>;
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// Settings kept as JSON on disk.
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `settings.json` in the platform config directory.
    pub fn default_location() -> Result<Self> {
        let dirs = project_dirs()?;
        Ok(Self::new(dirs.config_dir().join("settings.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no settings file, using defaults");
            return Ok(Settings::default());
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let raw = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

/// In-memory store; clones share the same slot. Used when there is no
/// config directory to write to.
#[derive(Clone, Default)]
pub struct MemorySettingsStore {
    slot: std::sync::Arc<std::sync::Mutex<Option<Settings>>>,
}

impl MemorySettingsStore {
    pub fn saved(&self) -> Option<Settings> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Settings> {
        Ok(self.saved().unwrap_or_default())
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("settings store poisoned"))?;
        *slot = Some(settings.clone());
        Ok(())
    }
}

/// Opens the settings store at `location` and loads it. Neither a missing
/// config directory nor an unreadable file stops startup: both fall back to
/// defaults.
pub fn open_settings(location: Result<JsonSettingsStore>) -> (Settings, Box<dyn SettingsStore>) {
    let store: Box<dyn SettingsStore> = match location {
        Ok(store) => {
            info!(path = %store.path().display(), "using settings file");
            Box::new(store)
        }
        Err(err) => {
            warn!(error = %err, "no config directory, settings will not be saved");
            Box::new(MemorySettingsStore::default())
        }
    };

    let settings = store.load().unwrap_or_else(|err| {
        warn!(error = %err, "failed to load settings, using defaults");
        Settings::default()
    });
    (settings, store)
}

pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", ORGANIZATION, APPLICATION).context("Failed to get project directories")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("settings.json"));
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("nested").join("settings.json"));

        let settings = Settings {
            language: Language::English,
            unit: ThroughputUnit::MiBps,
            ping_count: 5,
            ..Settings::default()
        };
        store.save(&settings).unwrap();

        assert!(store.path().exists());
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "language": "en" }"#).unwrap();

        let loaded = JsonSettingsStore::new(&path).load().unwrap();
        assert_eq!(loaded.language, Language::English);
        assert_eq!(loaded.ping_count, Settings::default().ping_count);
        assert_eq!(loaded.servers, Settings::default().servers);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let err = JsonSettingsStore::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn memory_store_shares_slot_between_clones() {
        let store = MemorySettingsStore::default();
        let other = store.clone();
        assert_eq!(other.load().unwrap(), Settings::default());

        let settings = Settings {
            language: Language::English,
            ..Settings::default()
        };
        store.save(&settings).unwrap();
        assert_eq!(other.saved(), Some(settings));
    }

    #[test]
    fn missing_config_dir_falls_back_to_memory() {
        let (settings, store) = open_settings(Err(anyhow::anyhow!("no home directory")));
        assert_eq!(settings, Settings::default());

        let changed = Settings {
            language: Language::English,
            ..Settings::default()
        };
        store.save(&changed).unwrap();
        assert_eq!(store.load().unwrap(), changed);
    }

    #[test]
    fn unreadable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ broken").unwrap();

        let (settings, store) = open_settings(Ok(JsonSettingsStore::new(&path)));
        assert_eq!(settings, Settings::default());

        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn settings_fields_cycle() {
        let mut field = SettingsField::Language;
        for _ in 0..5 {
            field = field.next();
        }
        assert_eq!(field, SettingsField::Language);
        assert_eq!(SettingsField::Language.prev(), SettingsField::UploadSize);
    }
}
