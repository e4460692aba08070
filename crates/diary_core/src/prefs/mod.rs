//! Key-value preference storage.
//!
//! # Responsibility
//! - Persist small typed settings (strings, booleans, floats) per named store.
//! - Back the font and login repositories.
//!
//! # Invariants
//! - `edit` applies a mutation atomically: readers observe either the old or
//!   the new snapshot, never a partial write.
//! - Reading a key with the wrong type behaves like a missing key.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Mutex;

mod file_store;
pub mod font_repo;
pub mod login_repo;

pub use file_store::FilePreferenceStore;

pub type PrefsResult<T> = Result<T, PrefsError>;

/// Preference store failure.
#[derive(Debug)]
pub enum PrefsError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidStoreName(String),
}

impl Display for PrefsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "preference file `{}` I/O failed: {source}", path.display())
            }
            Self::Corrupt { path, source } => write!(
                f,
                "preference file `{}` is not valid JSON: {source}",
                path.display()
            ),
            Self::InvalidStoreName(name) => write!(f, "invalid preference store name `{name}`"),
        }
    }
}

impl Error for PrefsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Corrupt { source, .. } => Some(source),
            Self::InvalidStoreName(_) => None,
        }
    }
}

/// Snapshot of one preference store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preferences {
    values: BTreeMap<String, Value>,
}

impl Preferences {
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        self.values
            .get(key)
            .and_then(Value::as_f64)
            .map(|value| value as f32)
    }

    pub fn set_string(&mut self, key: &str, value: impl Into<String>) {
        self.values
            .insert(key.to_string(), Value::String(value.into()));
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_string(), Value::Bool(value));
    }

    /// Stores a float. Non-finite values are not representable and are
    /// dropped instead.
    pub fn set_float(&mut self, key: &str, value: f32) {
        match serde_json::Number::from_f64(f64::from(value)) {
            Some(number) => {
                self.values.insert(key.to_string(), Value::Number(number));
            }
            None => {
                self.values.remove(key);
            }
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Storage backend for one named preference set.
pub trait PreferenceStore {
    /// Returns the current snapshot.
    fn load(&self) -> PrefsResult<Preferences>;
    /// Applies `mutate` to the current snapshot and persists the result.
    fn edit(&self, mutate: &mut dyn FnMut(&mut Preferences)) -> PrefsResult<()>;
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for &T {
    fn load(&self) -> PrefsResult<Preferences> {
        (**self).load()
    }

    fn edit(&self, mutate: &mut dyn FnMut(&mut Preferences)) -> PrefsResult<()> {
        (**self).edit(mutate)
    }
}

/// Process-local store used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    current: Mutex<Preferences>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> PrefsResult<Preferences> {
        Ok(self
            .current
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone())
    }

    fn edit(&self, mutate: &mut dyn FnMut(&mut Preferences)) -> PrefsResult<()> {
        let mut guard = self.current.lock().unwrap_or_else(|err| err.into_inner());
        let mut next = guard.clone();
        mutate(&mut next);
        *guard = next;
        Ok(())
    }
}
