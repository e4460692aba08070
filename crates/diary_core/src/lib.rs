//! Core of the diary app: note storage, preferences and drive backups.
//!
//! Front ends (the Flutter FFI crate and the CLI) go through the services in
//! [`service`]; storage details stay behind [`repo`] and [`prefs`].

pub mod backup;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod prefs;
pub mod repo;
pub mod service;

pub use backup::{
    BackupError, BackupInfo, BackupProvider, BackupResult, DriveAccount, DriveBackupProvider,
    MemoryBackupProvider,
};
pub use config::DiaryConfig;
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::date::{format_date, is_valid_date, parse_date_input};
pub use model::images::ImageUriMap;
pub use model::note::{Note, NoteBrief, NoteDraft, NoteId, NoteValidationError};
pub use prefs::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, PrefsError};
pub use repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
pub use service::backup_service::{
    BackupService, DriveUiState, LoginState, SessionSnapshot, SignInCredential,
};
pub use service::font_service::{FontFamily, FontService, FontSettings};
pub use service::note_service::{NoteService, NoteServiceError};

/// Health check used by front ends before wiring anything else.
pub fn ping() -> &'static str {
    "pong"
}

pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
