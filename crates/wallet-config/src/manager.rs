use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{Config, ConfigError};

const APP_DIR: &str = "vision-wallet";
const CONFIG_FILE: &str = "config.json";
const BACKUP_PREFIX: &str = "config";
const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";

/// Loads, saves and snapshots a [`Config`] file.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
    backups_dir: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf, backups_dir: PathBuf) -> Self {
        Self {
            config_path,
            backups_dir,
        }
    }

    /// Lays out `<base>/config.json` and `<base>/backups/`, creating both.
    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        let backups_dir = base.join("backups");
        fs::create_dir_all(&backups_dir)?;
        Ok(Self::new(base.join(CONFIG_FILE), backups_dir))
    }

    /// Uses the platform configuration directory, e.g. `~/.config/vision-wallet`.
    pub fn from_default_dir() -> Result<Self, ConfigError> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Self::with_base_dir(base.join(APP_DIR))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Reads the config file, or returns defaults when none exists yet.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }
        let config = read_config(&self.config_path)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes through a temporary file and renames it over the target so a
    /// crash never leaves a truncated config behind.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        config.validate()?;
        let json = to_json(config)?;
        let tmp = tmp_path(&self.config_path);
        write_file(&tmp, &json)?;
        fs::rename(&tmp, &self.config_path)?;
        Ok(())
    }

    /// Stores a timestamped copy of `config` and returns the backup file name.
    pub fn backup(&self, config: &Config, note: Option<&str>) -> Result<String, ConfigError> {
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT);
        let name = match sanitize_note(note) {
            Some(label) => format!("{BACKUP_PREFIX}_{timestamp}_{label}.{BACKUP_EXTENSION}"),
            None => format!("{BACKUP_PREFIX}_{timestamp}.{BACKUP_EXTENSION}"),
        };
        write_file(&self.backups_dir.join(&name), &to_json(config)?)?;
        Ok(name)
    }

    pub fn restore(&self, backup_name: &str) -> Result<Config, ConfigError> {
        let path = self.backups_dir.join(backup_name);
        if !path.is_file() {
            return Err(ConfigError::BackupNotFound(backup_name.to_string()));
        }
        let config = read_config(&path)?;
        config.validate()?;
        self.save(&config)?;
        Ok(config)
    }

    /// Backup file names, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>, ConfigError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort_by_key(|name| Reverse((parse_timestamp(name), name.clone())));
        Ok(names)
    }
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|err| ConfigError::Serde(err.to_string()))
}

fn to_json(config: &Config) -> Result<String, ConfigError> {
    serde_json::to_string_pretty(config).map_err(|err| ConfigError::Serde(err.to_string()))
}

fn sanitize_note(note: Option<&str>) -> Option<String> {
    let mut label = String::new();
    for ch in note?.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            label.push(ch.to_ascii_lowercase());
        } else if !label.is_empty() && !label.ends_with('-') {
            label.push('-');
        }
    }
    let label = label.trim_end_matches('-');
    (!label.is_empty()).then(|| label.to_string())
}

/// Extracts the `YYYYMMDD_HHMMSS` stamp from `config_<stamp>[_<note>].json`.
fn parse_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_suffix(BACKUP_EXTENSION)?.strip_suffix('.')?;
    let rest = stem.strip_prefix(BACKUP_PREFIX)?.strip_prefix('_')?;
    let stamp = rest.get(..15)?;
    NaiveDateTime::parse_from_str(stamp, BACKUP_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_file(path: &Path, data: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}
