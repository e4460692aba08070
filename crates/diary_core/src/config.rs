//! Runtime locations and endpoints.
//!
//! Resolution order per field: explicit environment variable, then a path
//! derived from the data directory, then `<temp>/diary`.

use crate::backup::DEFAULT_DRIVE_API_BASE;
use std::path::{Path, PathBuf};

pub const ENV_DATA_DIR: &str = "DIARY_DATA_DIR";
pub const ENV_DB_PATH: &str = "DIARY_DB_PATH";
pub const ENV_PREFS_DIR: &str = "DIARY_PREFS_DIR";
pub const ENV_DRIVE_API_BASE: &str = "DIARY_DRIVE_API_BASE";

pub const DEFAULT_APP_NAME: &str = "Diary";
const DB_FILE_NAME: &str = "diary.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryConfig {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub prefs_dir: PathBuf,
    pub log_dir: PathBuf,
    pub drive_api_base: String,
    pub app_name: String,
}

impl DiaryConfig {
    /// Lays every location out under `data_dir`.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            prefs_dir: data_dir.join("prefs"),
            log_dir: data_dir.join("logs"),
            data_dir,
            drive_api_base: DEFAULT_DRIVE_API_BASE.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }

    /// Reads the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves the config through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = read(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("diary"));
        let mut config = Self::with_data_dir(data_dir);
        if let Some(db_path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(db_path);
        }
        if let Some(prefs_dir) = read(ENV_PREFS_DIR) {
            config.prefs_dir = PathBuf::from(prefs_dir);
        }
        if let Some(api_base) = read(ENV_DRIVE_API_BASE) {
            config.drive_api_base = api_base.trim_end_matches('/').to_string();
        }
        config
    }

    /// Creates the data, preference and log directories plus the database
    /// file's parent.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.prefs_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DiaryConfig, ENV_DATA_DIR, ENV_DB_PATH, ENV_DRIVE_API_BASE};
    use crate::backup::DEFAULT_DRIVE_API_BASE;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_live_under_temp_dir() {
        let config = DiaryConfig::from_lookup(lookup(&[]));
        let base = std::env::temp_dir().join("diary");
        assert_eq!(config.data_dir, base);
        assert_eq!(config.db_path, base.join("diary.sqlite3"));
        assert_eq!(config.prefs_dir, base.join("prefs"));
        assert_eq!(config.drive_api_base, DEFAULT_DRIVE_API_BASE);
    }

    #[test]
    fn explicit_variables_override_derived_paths() {
        let config = DiaryConfig::from_lookup(lookup(&[
            (ENV_DATA_DIR, "/srv/diary"),
            (ENV_DB_PATH, "/var/db/notes.sqlite3"),
            (ENV_DRIVE_API_BASE, "http://127.0.0.1:8080/"),
        ]));
        assert_eq!(config.log_dir, PathBuf::from("/srv/diary/logs"));
        assert_eq!(config.db_path, PathBuf::from("/var/db/notes.sqlite3"));
        assert_eq!(config.drive_api_base, "http://127.0.0.1:8080");
    }

    #[test]
    fn blank_variables_are_ignored() {
        let config = DiaryConfig::from_lookup(lookup(&[(ENV_DATA_DIR, "  ")]));
        assert_eq!(config.data_dir, std::env::temp_dir().join("diary"));
    }

    #[test]
    fn ensure_dirs_creates_layout() {
        let root = tempfile::tempdir().unwrap();
        let config = DiaryConfig::with_data_dir(root.path().join("nested"));
        config.ensure_dirs().unwrap();
        assert!(config.prefs_dir.is_dir());
        assert!(config.log_dir.is_dir());
    }
}
