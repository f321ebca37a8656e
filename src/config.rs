use crate::calendar::{Category, EventDefaults, MAX_IMPORT_BYTES};
use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const STATE_DIR: &str = ".pocketcal";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Directory holding `calendar-events.json`; `~/.pocketcal` when unset
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventsConfig {
    pub default_time: String,
    pub default_duration_minutes: u32,
    pub default_category: Category,
}

impl Default for EventsConfig {
    fn default() -> Self {
        let defaults = EventDefaults::default();
        Self {
            default_time: defaults.time,
            default_duration_minutes: defaults.duration_minutes,
            default_category: defaults.category,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportConfig {
    pub max_file_bytes: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: MAX_IMPORT_BYTES,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_path()?)
    }

    /// Read the config at `config_path`, writing the defaults there first if it is missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let default_config = Config::default();
            default_config.save_to(config_path)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(config_path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => {
                let home_dir =
                    dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
                Ok(home_dir.join(STATE_DIR))
            }
        }
    }

    pub fn event_defaults(&self) -> EventDefaults {
        EventDefaults {
            time: self.events.default_time.clone(),
            duration_minutes: self.events.default_duration_minutes,
            category: self.events.default_category,
        }
    }
}

fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "pocketcal", "pocketcal")
        .context("Failed to determine config directory")?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}
