use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::page::probe::ProbeConfig;

const SETTINGS_FILE_NAME: &str = "settings.json";

pub const DEFAULT_ISSUE_TYPE: &str = "Bug";
pub const DEFAULT_SCRAPE_SELECTOR: &str = "p.--technology-version";
pub const DEFAULT_FE_PREFIX: &str = "FE:";
pub const DEFAULT_BE_PREFIX: &str = "BE:";

/// Persisted tracker credentials and capture settings. Every field is
/// optional on disk; operations that need credentials fail fast via
/// [`Settings::tracker_auth`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub identity: Option<String>,
    pub secret: Option<String>,
    pub tracker_host: Option<String>,
    pub project_key: Option<String>,
    pub issue_type_name: Option<String>,
    pub scrape_selector: Option<String>,
    pub fe_prefix: Option<String>,
    pub be_prefix: Option<String>,
}

/// Borrowed view of the settings a tracker call requires.
#[derive(Debug)]
pub struct TrackerAuth<'a> {
    pub host: &'a str,
    pub identity: &'a str,
    pub secret: &'a str,
    pub project_key: &'a str,
    pub issue_type: &'a str,
}

impl Settings {
    pub fn load() -> AppResult<Self> {
        Self::load_from(&config_file_path()?)
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str::<Settings>(&contents)
                .map_err(|err| AppError::Configuration(format!("invalid settings file: {err}"))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to encode settings: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn issue_type(&self) -> &str {
        self.issue_type_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_ISSUE_TYPE)
    }

    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            selector: self
                .scrape_selector
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SCRAPE_SELECTOR.to_string()),
            fe_prefix: self
                .fe_prefix
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FE_PREFIX.to_string()),
            be_prefix: self
                .be_prefix
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BE_PREFIX.to_string()),
        }
    }

    /// Fails fast when any credential required for a tracker call is absent.
    pub fn tracker_auth(&self) -> AppResult<TrackerAuth<'_>> {
        let host = self
            .tracker_host
            .as_deref()
            .ok_or_else(|| AppError::Configuration("tracker host not configured".to_string()))?;
        let identity = self
            .identity
            .as_deref()
            .ok_or_else(|| AppError::Configuration("tracker identity not configured".to_string()))?;
        let secret = self
            .secret
            .as_deref()
            .ok_or_else(|| AppError::Configuration("tracker secret not configured".to_string()))?;
        let project_key = self
            .project_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("project key not configured".to_string()))?;
        Ok(TrackerAuth {
            host,
            identity,
            secret,
            project_key,
            issue_type: self.issue_type(),
        })
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| AppError::Configuration("no config directory on this system".to_string()))?;
    Ok(base.join("bugsnap"))
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(SETTINGS_FILE_NAME))
}
