//! Cloud backup providers.
//!
//! # Responsibility
//! - Define the provider contract used to store JSON note backups remotely.
//! - Name backup files and map provider failures to a success/error result.
//!
//! # Invariants
//! - Providers list backups newest first.
//! - Provider calls never panic; failures surface as `BackupError`.
//! - No retry or backoff is layered on top of provider calls.

use chrono::Utc;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod drive;
mod memory;

pub use drive::{DriveBackupProvider, DEFAULT_DRIVE_API_BASE};
pub use memory::MemoryBackupProvider;

/// Drive space that holds application-private files.
pub const APP_DATA_FOLDER: &str = "appDataFolder";
/// MIME type of uploaded backups.
pub const BACKUP_MIME_TYPE: &str = "application/json";

pub(crate) const BACKUP_FILE_PREFIX: &str = "database_backup_";
const BACKUP_FILE_SUFFIX: &str = ".json";

pub type BackupProviderResult<T> = Result<T, BackupError>;

/// Provider-level failure.
#[derive(Debug)]
pub enum BackupError {
    /// The provider has not been initialized with an account.
    NotInitialized,
    /// Account or credential data is unusable.
    InvalidAccount(String),
    /// The configured API base cannot address files.
    InvalidEndpoint(String),
    /// Transport failure.
    Http(reqwest::Error),
    /// Remote returned a non-success status.
    Status { status: u16, body: String },
    /// Remote payload did not match the expected shape.
    InvalidResponse(String),
    /// Requested file does not exist.
    NotFound(String),
}

impl Display for BackupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "drive service is not initialized"),
            Self::InvalidAccount(details) => write!(f, "invalid drive account: {details}"),
            Self::InvalidEndpoint(details) => write!(f, "invalid drive endpoint: {details}"),
            Self::Http(err) => write!(f, "{err}"),
            Self::Status { status, body } => write!(f, "drive returned HTTP {status}: {body}"),
            Self::InvalidResponse(details) => write!(f, "unexpected drive response: {details}"),
            Self::NotFound(id) => write!(f, "backup file not found: {id}"),
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackupError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

/// Outcome of a backup upload as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupResult {
    Success(String),
    Error(String),
}

impl BackupResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success(message) | Self::Error(message) => message,
        }
    }
}

/// Remote backup file metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub id: String,
    pub name: String,
    /// Creation time in epoch milliseconds.
    pub created_time: i64,
}

/// Signed-in account used to authorize provider calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveAccount {
    pub account_name: String,
    /// OAuth bearer token with drive file/appdata scopes.
    pub access_token: Option<String>,
}

/// Builds `database_backup_<epoch-millis>.json`.
pub fn backup_file_name(epoch_millis: i64) -> String {
    format!("{BACKUP_FILE_PREFIX}{epoch_millis}{BACKUP_FILE_SUFFIX}")
}

/// Whether `name` follows the backup file naming scheme.
pub fn is_backup_file_name(name: &str) -> bool {
    name.strip_prefix(BACKUP_FILE_PREFIX)
        .and_then(|rest| rest.strip_suffix(BACKUP_FILE_SUFFIX))
        .is_some_and(|millis| !millis.is_empty() && millis.bytes().all(|b| b.is_ascii_digit()))
}

/// Remote storage for note backups.
pub trait BackupProvider {
    /// Stable provider id used in logs.
    fn provider_id(&self) -> &str;

    /// Binds the provider to a signed-in account.
    fn initialize(&mut self, account: &DriveAccount) -> BackupProviderResult<()>;

    fn is_initialized(&self) -> bool;

    /// Stores one file in the app data space.
    fn put(&self, name: &str, data: &[u8]) -> BackupProviderResult<BackupInfo>;

    /// Lists backups newest first, at most `limit` when given.
    fn list(&self, limit: Option<u32>) -> BackupProviderResult<Vec<BackupInfo>>;

    /// Downloads one file's content.
    fn get(&self, file_id: &str) -> BackupProviderResult<Vec<u8>>;

    fn delete(&self, file_id: &str) -> BackupProviderResult<()>;

    /// Uploads a JSON export under a fresh timestamped name.
    fn upload_backup(&self, json: &str) -> BackupResult {
        let name = backup_file_name(Utc::now().timestamp_millis());
        match self.put(&name, json.as_bytes()) {
            Ok(info) => {
                info!(
                    "event=backup_upload module=backup status=ok provider={} file_id={} bytes={}",
                    self.provider_id(),
                    info.id,
                    json.len()
                );
                BackupResult::Success("Backup uploaded successfully".to_string())
            }
            Err(err) => {
                error!(
                    "event=backup_upload module=backup status=error provider={} error={}",
                    self.provider_id(),
                    err
                );
                BackupResult::Error(format!("Upload failed: {err}"))
            }
        }
    }

    /// Downloads the newest backup, or `None` when there is none.
    fn download_latest_backup(&self) -> BackupProviderResult<Option<String>> {
        let Some(latest) = self.list(Some(1))?.into_iter().next() else {
            info!(
                "event=backup_download module=backup status=ok provider={} found=false",
                self.provider_id()
            );
            return Ok(None);
        };

        let bytes = self.get(&latest.id)?;
        let json = String::from_utf8(bytes).map_err(|err| {
            BackupError::InvalidResponse(format!("backup `{}` is not UTF-8: {err}", latest.name))
        })?;
        info!(
            "event=backup_download module=backup status=ok provider={} found=true file_id={} bytes={}",
            self.provider_id(),
            latest.id,
            json.len()
        );
        Ok(Some(json))
    }
}

impl<T: BackupProvider + ?Sized> BackupProvider for &mut T {
    fn provider_id(&self) -> &str {
        (**self).provider_id()
    }

    fn initialize(&mut self, account: &DriveAccount) -> BackupProviderResult<()> {
        (**self).initialize(account)
    }

    fn is_initialized(&self) -> bool {
        (**self).is_initialized()
    }

    fn put(&self, name: &str, data: &[u8]) -> BackupProviderResult<BackupInfo> {
        (**self).put(name, data)
    }

    fn list(&self, limit: Option<u32>) -> BackupProviderResult<Vec<BackupInfo>> {
        (**self).list(limit)
    }

    fn get(&self, file_id: &str) -> BackupProviderResult<Vec<u8>> {
        (**self).get(file_id)
    }

    fn delete(&self, file_id: &str) -> BackupProviderResult<()> {
        (**self).delete(file_id)
    }

    fn upload_backup(&self, json: &str) -> BackupResult {
        (**self).upload_backup(json)
    }

    fn download_latest_backup(&self) -> BackupProviderResult<Option<String>> {
        (**self).download_latest_backup()
    }
}

#[cfg(test)]
mod tests {
    use super::{backup_file_name, is_backup_file_name, BackupResult};

    #[test]
    fn backup_names_embed_millis() {
        let name = backup_file_name(1_743_465_600_000);
        assert_eq!(name, "database_backup_1743465600000.json");
        assert!(is_backup_file_name(&name));
        assert!(!is_backup_file_name("database_backup_.json"));
        assert!(!is_backup_file_name("notes.json"));
    }

    #[test]
    fn result_exposes_message() {
        let ok = BackupResult::Success("done".to_string());
        assert!(ok.is_success());
        assert_eq!(ok.message(), "done");
        assert!(!BackupResult::Error("nope".to_string()).is_success());
    }
}
