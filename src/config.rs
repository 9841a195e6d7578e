// File: ./src/config.rs
use crate::storage::LocalStorage;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

pub const CONFIG_ENV: &str = "SUBPACK_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON snapshot of the planning store.
    pub data_file: Option<PathBuf>,
    /// Optional ICS feed merged into calendar events.
    pub calendar_ics: Option<PathBuf>,
    pub audit_file: Option<PathBuf>,
    pub outbox_dir: Option<PathBuf>,
    pub default_user: String,
    pub mail_from: String,
    pub default_days: u32,
    pub max_days: u32,
    pub reminder_lead_days: u32,
    pub recent_planning_days: i64,
    pub day_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: None,
            calendar_ics: None,
            audit_file: None,
            outbox_dir: None,
            default_user: "teacher".to_string(),
            mail_from: "substitute-plans@localhost".to_string(),
            default_days: 1,
            max_days: 14,
            reminder_lead_days: 1,
            recent_planning_days: 7,
            day_concurrency: 4,
        }
    }
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(p) = env::var(CONFIG_ENV) {
            return Some(PathBuf::from(p));
        }
        LocalStorage::config_dir().map(|d| d.join("config.toml"))
    }

    /// Loads the config file, or defaults when there is none.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path().context("no config directory on this platform")?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        let raw = toml::to_string_pretty(self)?;
        LocalStorage::atomic_write(path, raw)
    }

    pub fn data_file(&self) -> Option<PathBuf> {
        self.data_file
            .clone()
            .or_else(|| LocalStorage::data_dir().map(|d| d.join("planning.json")))
    }

    pub fn audit_file(&self) -> Option<PathBuf> {
        self.audit_file
            .clone()
            .or_else(|| LocalStorage::data_dir().map(|d| d.join("packs.json")))
    }

    pub fn outbox_dir(&self) -> Option<PathBuf> {
        self.outbox_dir
            .clone()
            .or_else(|| LocalStorage::data_dir().map(|d| d.join("outbox")))
    }
}
