//! JSON-file preference store.
//!
//! Each named store lives in `<dir>/<name>.preferences.json`. Writes go to a
//! temporary file in the same directory and are renamed into place.

use super::{PreferenceStore, Preferences, PrefsError, PrefsResult};
use log::{debug, error};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

const FILE_SUFFIX: &str = ".preferences.json";

/// File-backed preference store.
#[derive(Debug)]
pub struct FilePreferenceStore {
    dir: PathBuf,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePreferenceStore {
    /// Opens (without creating) the store `name` under `dir`.
    ///
    /// Store names are limited to ASCII letters, digits, `_` and `-`.
    pub fn new(dir: impl AsRef<Path>, name: &str) -> PrefsResult<Self> {
        if !is_valid_store_name(name) {
            return Err(PrefsError::InvalidStoreName(name.to_string()));
        }
        let dir = dir.as_ref().to_path_buf();
        let path = dir.join(format!("{name}{FILE_SUFFIX}"));
        Ok(Self {
            dir,
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_snapshot(&self) -> PrefsResult<Preferences> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Preferences::default());
            }
            Err(source) => {
                return Err(PrefsError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if raw.trim().is_empty() {
            return Ok(Preferences::default());
        }
        serde_json::from_str(&raw).map_err(|source| PrefsError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_snapshot(&self, prefs: &Preferences) -> PrefsResult<()> {
        let io_error = |source| PrefsError::Io {
            path: self.path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(io_error)?;
        let body = serde_json::to_vec_pretty(prefs).map_err(|source| PrefsError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_error)?;
        tmp.write_all(&body).map_err(io_error)?;
        tmp.as_file().sync_all().map_err(io_error)?;
        tmp.persist(&self.path)
            .map_err(|err| io_error(err.error))?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> PrefsResult<Preferences> {
        self.read_snapshot()
    }

    fn edit(&self, mutate: &mut dyn FnMut(&mut Preferences)) -> PrefsResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|err| err.into_inner());
        let mut prefs = self.read_snapshot()?;
        mutate(&mut prefs);
        match self.write_snapshot(&prefs) {
            Ok(()) => {
                debug!(
                    "event=prefs_write module=prefs status=ok file={}",
                    self.path.display()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=prefs_write module=prefs status=error file={} error={}",
                    self.path.display(),
                    err
                );
                Err(err)
            }
        }
    }
}

fn is_valid_store_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
