//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose note, font, backup and drive session use-cases to Dart via FRB.
//! - Flatten core errors into UTF-8 messages inside response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Storage locations are resolved once per process from `DiaryConfig`.
//! - Drive sign-in state lives in one process-wide session guarded by a
//!   mutex; each drive call resumes it and stores it back.

use diary_core::model::images::{insert_label_at, new_image_label};
use diary_core::prefs::font_repo::{FontRepository, FONT_STORE_NAME};
use diary_core::prefs::login_repo::{LoginRepository, LOGIN_STORE_NAME};
use diary_core::{
    core_version as core_version_inner, format_date, init_logging as init_logging_inner,
    is_valid_date, open_db, ping as ping_inner, BackupInfo, BackupService, DiaryConfig,
    DriveBackupProvider, FilePreferenceStore, FontFamily, FontService, ImageUriMap, LoginState,
    Note, NoteBrief, NoteDraft, NoteService, SessionSnapshot, SignInCredential,
    SqliteNoteRepository,
};
use log::warn;
use std::sync::{Mutex, OnceLock, PoisonError};

static CONFIG: OnceLock<DiaryConfig> = OnceLock::new();
static DRIVE_RUNTIME: OnceLock<Mutex<DriveRuntime>> = OnceLock::new();

/// Provider and session state shared by every drive call.
#[derive(Default)]
struct DriveRuntime {
    provider: Option<DriveBackupProvider>,
    snapshot: SessionSnapshot,
}

type DriveSession<'conn, 'p> =
    BackupService<SqliteNoteRepository<'conn>, FilePreferenceStore, &'p mut DriveBackupProvider>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Core crate version.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns an empty string on success and the error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Placeholder label and the image it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteImageItem {
    pub label: String,
    pub uri: String,
}

/// Row of the home screen list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListItem {
    pub id: i64,
    /// `YYYYMMDD`.
    pub date: i32,
    /// `YYYY-MM-DD`.
    pub date_label: String,
    pub title: String,
}

/// Full note for the edit screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDetail {
    pub id: i64,
    pub date: i32,
    pub title: String,
    pub content: String,
    pub images: Vec<NoteImageItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListResponse {
    pub ok: bool,
    pub items: Vec<NoteListItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDetailResponse {
    pub ok: bool,
    /// `None` when the note does not exist or the call failed.
    pub note: Option<NoteDetail>,
    pub message: String,
}

/// Generic action envelope for note writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteActionResponse {
    pub ok: bool,
    pub note_id: Option<i64>,
    pub message: String,
}

impl NoteActionResponse {
    fn success(message: impl Into<String>, note_id: Option<i64>) -> Self {
        Self {
            ok: true,
            note_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            note_id: None,
            message: message.into(),
        }
    }
}

/// Content after inserting an image placeholder at the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInsertResponse {
    pub content: String,
    pub cursor: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontResponse {
    pub ok: bool,
    pub family: String,
    pub size: f32,
    pub families: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupExportResponse {
    pub ok: bool,
    pub json: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupImportResponse {
    pub ok: bool,
    pub imported: u32,
    pub message: String,
}

/// Remote backup row of the backup screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveBackupItem {
    pub id: String,
    pub name: String,
    /// Epoch milliseconds.
    pub created_time: i64,
}

/// Sign-in state plus backup screen state after a drive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveStateResponse {
    pub ok: bool,
    /// One of `idle|loading|success|error`.
    pub login_status: String,
    pub user_id: Option<String>,
    /// Error text when `login_status == "error"`.
    pub login_message: Option<String>,
    pub is_loading: bool,
    pub is_uploading: bool,
    pub is_downloading: bool,
    pub message: Option<String>,
    pub is_error: bool,
    pub available_backups: Vec<DriveBackupItem>,
}

/// Creates a note from the entry screen.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Rejects an empty title or an impossible date without writing.
#[flutter_rust_bridge::frb(sync)]
pub fn note_create(
    date: i32,
    title: String,
    content: String,
    images: Vec<NoteImageItem>,
) -> NoteActionResponse {
    let draft = NoteDraft {
        date,
        title,
        content,
        image_uris: to_image_map(images),
        ..NoteDraft::default()
    };
    match with_note_service(|service| Ok(service.create_note(&draft)?)) {
        Ok(note) => NoteActionResponse::success("Note created.", Some(note.id)),
        Err(err) => NoteActionResponse::failure(format!("note_create failed: {err}")),
    }
}

/// Saves edits to an existing note. The note keeps its stored date.
#[flutter_rust_bridge::frb(sync)]
pub fn note_update(
    id: i64,
    title: String,
    content: String,
    images: Vec<NoteImageItem>,
) -> NoteActionResponse {
    let draft = NoteDraft {
        id,
        title,
        content,
        image_uris: to_image_map(images),
        ..NoteDraft::default()
    };
    match with_note_service(|service| Ok(service.update_note(&draft.to_note())?)) {
        Ok(note) => NoteActionResponse::success("Note updated.", Some(note.id)),
        Err(err) => NoteActionResponse::failure(format!("note_update failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(id: i64) -> NoteActionResponse {
    match with_note_service(|service| Ok(service.delete_note(id)?)) {
        Ok(()) => NoteActionResponse::success("Note deleted.", Some(id)),
        Err(err) => NoteActionResponse::failure(format!("note_delete failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn note_get(id: i64) -> NoteDetailResponse {
    match with_note_service(|service| Ok(service.get_note(id)?)) {
        Ok(Some(note)) => NoteDetailResponse {
            ok: true,
            note: Some(to_note_detail(note)),
            message: String::new(),
        },
        Ok(None) => NoteDetailResponse {
            ok: true,
            note: None,
            message: format!("Note {id} not found."),
        },
        Err(err) => NoteDetailResponse {
            ok: false,
            note: None,
            message: format!("note_get failed: {err}"),
        },
    }
}

/// Lists notes oldest date first.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_list() -> NoteListResponse {
    match with_note_service(|service| Ok(service.list_note_briefs()?)) {
        Ok(briefs) => {
            let items: Vec<NoteListItem> = briefs.into_iter().map(to_list_item).collect();
            let message = if items.is_empty() {
                "No notes yet.".to_string()
            } else {
                format!("{} note(s).", items.len())
            };
            NoteListResponse {
                ok: true,
                items,
                message,
            }
        }
        Err(err) => NoteListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("notes_list failed: {err}"),
        },
    }
}

/// Splices a fresh image placeholder into `content` at `cursor` (in chars).
///
/// The caller maps the returned label to the picked image URI.
#[flutter_rust_bridge::frb(sync)]
pub fn note_insert_image(content: String, cursor: u32) -> ImageInsertResponse {
    let label = new_image_label();
    let inserted = insert_label_at(content.as_str(), cursor as usize, label.as_str());
    ImageInsertResponse {
        content: inserted.content,
        cursor: u32::try_from(inserted.cursor).unwrap_or(u32::MAX),
        label,
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn date_is_valid(date: i32) -> bool {
    is_valid_date(date)
}

/// Current font selection plus the families the picker offers.
#[flutter_rust_bridge::frb(sync)]
pub fn font_get() -> FontResponse {
    match open_font_service() {
        Ok(service) => font_response(service.current(), String::new()),
        Err(err) => font_failure(format!("font_get failed: {err}")),
    }
}

/// Persists a font selection; sizes are clamped to the slider range.
#[flutter_rust_bridge::frb(sync)]
pub fn font_set(family: String, size: f32) -> FontResponse {
    let Some(family) = FontFamily::from_label(family.as_str()) else {
        return font_failure(format!("font_set failed: unknown font family `{family}`"));
    };
    let mut service = match open_font_service() {
        Ok(service) => service,
        Err(err) => return font_failure(format!("font_set failed: {err}")),
    };
    match service.update(family, size) {
        Ok(settings) => font_response(settings, "Font saved.".to_string()),
        Err(err) => font_failure(format!("font_set failed: {err}")),
    }
}

/// Exports every note as the backup JSON document.
#[flutter_rust_bridge::frb(sync)]
pub fn backup_export() -> BackupExportResponse {
    match with_note_service(|service| Ok(service.export_json()?)) {
        Ok(json) => BackupExportResponse {
            ok: true,
            json: Some(json),
            message: "Backup exported.".to_string(),
        },
        Err(err) => BackupExportResponse {
            ok: false,
            json: None,
            message: format!("backup_export failed: {err}"),
        },
    }
}

/// Replaces every note with the contents of a backup JSON document.
#[flutter_rust_bridge::frb(sync)]
pub fn backup_import(json: String) -> BackupImportResponse {
    match with_note_service(|service| Ok(service.import_json(json.as_str())?)) {
        Ok(count) => BackupImportResponse {
            ok: true,
            imported: u32::try_from(count).unwrap_or(u32::MAX),
            message: format!("Imported {count} note(s)."),
        },
        Err(err) => BackupImportResponse {
            ok: false,
            imported: 0,
            message: format!("backup_import failed: {err}"),
        },
    }
}

/// Restores the sign-in saved by a previous run.
///
/// # FFI contract
/// - Sync call; touches local preferences only.
/// - `ok` is true when a complete saved login was found.
#[flutter_rust_bridge::frb(sync)]
pub fn drive_restore_login() -> DriveStateResponse {
    with_drive_session("drive_restore_login", |session| {
        session.restore_saved_login().is_signed_in()
    })
}

/// Completes sign-in with the credential returned by the platform sheet.
#[flutter_rust_bridge::frb(sync)]
pub fn drive_sign_in(
    credential_type: String,
    account_id: String,
    id_token: String,
    display_name: Option<String>,
    access_token: Option<String>,
) -> DriveStateResponse {
    let credential = SignInCredential {
        credential_type,
        account_id,
        id_token,
        display_name,
        access_token,
    };
    with_drive_session("drive_sign_in", |session| {
        session.sign_in(credential).is_signed_in()
    })
}

/// Records a failure reported by the host's credential manager.
#[flutter_rust_bridge::frb(sync)]
pub fn drive_sign_in_failed(reason: String) -> DriveStateResponse {
    with_drive_session("drive_sign_in_failed", |session| {
        session.sign_in_failed(reason.as_str()).is_signed_in()
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn drive_sign_out() -> DriveStateResponse {
    with_drive_session("drive_sign_out", |session| {
        !session.sign_out().is_signed_in()
    })
}

/// Hands a fresh OAuth access token to the drive client.
///
/// `ok` is false unless the session is signed in and the token is usable.
#[flutter_rust_bridge::frb(sync)]
pub fn drive_authorize(access_token: String) -> DriveStateResponse {
    with_drive_session("drive_authorize", |session| {
        session.authorize_drive(access_token.as_str())
    })
}

/// Exports every note and uploads it as a new drive backup.
///
/// # FFI contract
/// - Sync call, blocking network I/O.
#[flutter_rust_bridge::frb(sync)]
pub fn drive_upload() -> DriveStateResponse {
    with_drive_session("drive_upload", |session| !session.upload_backup().is_error)
}

/// Replaces local notes with the newest drive backup.
#[flutter_rust_bridge::frb(sync)]
pub fn drive_download() -> DriveStateResponse {
    with_drive_session("drive_download", |session| {
        !session.download_backup().is_error
    })
}

/// Refreshes `available_backups`, newest first.
#[flutter_rust_bridge::frb(sync)]
pub fn drive_list() -> DriveStateResponse {
    with_drive_session("drive_list", |session| {
        session.login_state().is_signed_in() && !session.list_backups().is_error
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn drive_delete(file_id: String) -> DriveStateResponse {
    with_drive_session("drive_delete", |session| {
        !session.delete_backup(file_id.as_str()).is_error
    })
}

fn resolve_config() -> &'static DiaryConfig {
    CONFIG.get_or_init(DiaryConfig::from_env)
}

fn with_note_service<T>(
    f: impl FnOnce(&mut NoteService<SqliteNoteRepository<'_>>) -> Result<T, Box<dyn std::error::Error>>,
) -> Result<T, String> {
    let config = resolve_config();
    let mut conn = open_db(&config.db_path).map_err(|err| {
        warn!("event=ffi_db_open module=ffi status=error error={err}");
        format!("note DB open failed: {err}")
    })?;
    let repo = SqliteNoteRepository::try_new(&mut conn)
        .map_err(|err| format!("note repo init failed: {err}"))?;
    let mut service = NoteService::new(repo);
    f(&mut service).map_err(|err| err.to_string())
}

fn with_drive_session(
    op: &str,
    f: impl FnOnce(&mut DriveSession<'_, '_>) -> bool,
) -> DriveStateResponse {
    let config = resolve_config();
    let mut runtime = DRIVE_RUNTIME
        .get_or_init(|| Mutex::new(DriveRuntime::default()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    if runtime.provider.is_none() {
        match DriveBackupProvider::new(&config.drive_api_base, &config.app_name) {
            Ok(provider) => runtime.provider = Some(provider),
            Err(err) => return drive_failure(&runtime.snapshot, format!("{op} failed: {err}")),
        }
    }
    let mut conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            warn!("event=ffi_db_open module=ffi status=error error={err}");
            return drive_failure(&runtime.snapshot, format!("{op} failed: {err}"));
        }
    };
    let repo = match SqliteNoteRepository::try_new(&mut conn) {
        Ok(repo) => repo,
        Err(err) => return drive_failure(&runtime.snapshot, format!("{op} failed: {err}")),
    };
    let store = match FilePreferenceStore::new(&config.prefs_dir, LOGIN_STORE_NAME) {
        Ok(store) => store,
        Err(err) => return drive_failure(&runtime.snapshot, format!("{op} failed: {err}")),
    };

    let DriveRuntime {
        provider: Some(provider),
        snapshot,
    } = &mut *runtime
    else {
        return drive_failure(&SessionSnapshot::default(), format!("{op} failed"));
    };
    let mut session = BackupService::resume(
        NoteService::new(repo),
        LoginRepository::new(store),
        provider,
        std::mem::take(snapshot),
    );
    let ok = f(&mut session);
    *snapshot = session.snapshot();
    drive_response(ok, snapshot)
}

fn drive_response(ok: bool, snapshot: &SessionSnapshot) -> DriveStateResponse {
    let (login_status, user_id, login_message) = match &snapshot.login_state {
        LoginState::Idle => ("idle", None, None),
        LoginState::Loading => ("loading", None, None),
        LoginState::Success { user_id, .. } => ("success", Some(user_id.clone()), None),
        LoginState::Error(message) => ("error", None, Some(message.clone())),
    };
    let drive = &snapshot.drive_state;
    DriveStateResponse {
        ok,
        login_status: login_status.to_string(),
        user_id,
        login_message,
        is_loading: drive.is_loading,
        is_uploading: drive.is_uploading,
        is_downloading: drive.is_downloading,
        message: drive.message.clone(),
        is_error: drive.is_error,
        available_backups: drive
            .available_backups
            .iter()
            .map(to_backup_item)
            .collect(),
    }
}

fn drive_failure(snapshot: &SessionSnapshot, message: String) -> DriveStateResponse {
    DriveStateResponse {
        message: Some(message),
        is_error: true,
        ..drive_response(false, snapshot)
    }
}

fn to_backup_item(info: &BackupInfo) -> DriveBackupItem {
    DriveBackupItem {
        id: info.id.clone(),
        name: info.name.clone(),
        created_time: info.created_time,
    }
}

fn open_font_service() -> Result<FontService<FilePreferenceStore>, String> {
    let config = resolve_config();
    let store = FilePreferenceStore::new(&config.prefs_dir, FONT_STORE_NAME)
        .map_err(|err| err.to_string())?;
    FontService::load(FontRepository::new(store)).map_err(|err| err.to_string())
}

fn font_response(settings: diary_core::FontSettings, message: String) -> FontResponse {
    FontResponse {
        ok: true,
        family: settings.family.label().to_string(),
        size: settings.size,
        families: font_families(),
        message,
    }
}

fn font_failure(message: String) -> FontResponse {
    let fallback = diary_core::FontSettings {
        family: FontFamily::Default,
        size: diary_core::prefs::font_repo::DEFAULT_FONT_SIZE,
    };
    FontResponse {
        ok: false,
        message,
        ..font_response(fallback, String::new())
    }
}

fn font_families() -> Vec<String> {
    FontFamily::ALL
        .iter()
        .map(|family| family.label().to_string())
        .collect()
}

fn to_image_map(images: Vec<NoteImageItem>) -> ImageUriMap {
    let mut map = ImageUriMap::new();
    for image in images {
        map.insert(image.label, image.uri);
    }
    map
}

fn to_list_item(brief: NoteBrief) -> NoteListItem {
    NoteListItem {
        id: brief.id,
        date: brief.date,
        date_label: format_date(brief.date),
        title: brief.title,
    }
}

fn to_note_detail(note: Note) -> NoteDetail {
    let images = note
        .image_uris
        .iter()
        .map(|(label, uri)| NoteImageItem {
            label: label.to_string(),
            uri: uri.to_string(),
        })
        .collect();
    NoteDetail {
        id: note.id,
        date: note.date,
        title: note.title,
        content: note.content,
        images,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        backup_export, core_version, date_is_valid, drive_authorize, drive_delete,
        drive_restore_login, drive_sign_in, drive_sign_in_failed, drive_sign_out, drive_upload,
        font_get, font_set, init_logging, note_create, note_delete, note_get, note_insert_image,
        note_update, notes_list, ping, NoteImageItem, CONFIG,
    };
    use diary_core::service::backup_service::GOOGLE_ID_TOKEN_CREDENTIAL_TYPE;
    use diary_core::DiaryConfig;
    use std::sync::OnceLock;
    use std::time::{SystemTime, UNIX_EPOCH};

    /// Points every storage location at one temp dir for the test process.
    fn use_temp_config() {
        static TEST_DIR: OnceLock<tempfile::TempDir> = OnceLock::new();
        let dir = TEST_DIR.get_or_init(|| tempfile::tempdir().expect("create temp dir"));
        let config = CONFIG.get_or_init(|| {
            let mut config = DiaryConfig::with_data_dir(dir.path());
            config.drive_api_base = "http://127.0.0.1:9".to_string();
            config
        });
        assert!(config.db_path.starts_with(dir.path()));
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn date_validation_follows_calendar() {
        assert!(date_is_valid(20240229));
        assert!(!date_is_valid(20230229));
        assert!(!date_is_valid(20240000));
    }

    #[test]
    fn note_create_rejects_empty_title() {
        use_temp_config();
        let response = note_create(20250401, String::new(), String::new(), Vec::new());
        assert!(!response.ok);
        assert!(response.note_id.is_none());
    }

    #[test]
    fn note_lifecycle_round_trips_through_db() {
        use_temp_config();
        let title = unique_token("ffi-note");
        let inserted = note_insert_image("before after".to_string(), 7);
        assert_eq!(inserted.content, format!("before {}after", inserted.label));

        let created = note_create(
            20250401,
            title.clone(),
            inserted.content.clone(),
            vec![NoteImageItem {
                label: inserted.label.clone(),
                uri: "content://media/1".to_string(),
            }],
        );
        assert!(created.ok, "{}", created.message);
        let id = created.note_id.unwrap();

        let listed = notes_list();
        assert!(listed
            .items
            .iter()
            .any(|item| item.id == id && item.date_label == "2025-04-01"));

        let updated = note_update(id, title.clone(), "plain".to_string(), Vec::new());
        assert!(updated.ok, "{}", updated.message);
        let fetched = note_get(id).note.unwrap();
        assert_eq!(fetched.date, 20250401);
        assert_eq!(fetched.content, "plain");
        assert!(fetched.images.is_empty());

        assert!(backup_export().json.unwrap().contains(&title));

        assert!(note_delete(id).ok);
        assert!(note_get(id).note.is_none());
        assert!(!note_delete(id).ok);
    }

    #[test]
    fn font_set_clamps_and_rejects_unknown_family() {
        use_temp_config();
        let saved = font_set("serif".to_string(), 40.0);
        assert!(saved.ok, "{}", saved.message);
        assert_eq!(saved.family, "Serif");
        assert_eq!(saved.size, 24.0);
        assert_eq!(font_get().family, "Serif");

        let rejected = font_set("Comic".to_string(), 18.0);
        assert!(!rejected.ok);
        assert_eq!(rejected.families, vec!["Default", "Serif", "Monospace"]);
    }

    #[test]
    fn drive_session_flows_through_sign_in_and_out() {
        use_temp_config();

        let refused = drive_upload();
        assert!(!refused.ok);
        assert_eq!(refused.login_status, "idle");
        assert_eq!(refused.message.as_deref(), Some("Please login first"));

        let signed_in = drive_sign_in(
            GOOGLE_ID_TOKEN_CREDENTIAL_TYPE.to_string(),
            "reader@example.com".to_string(),
            "id-token".to_string(),
            Some("Reader".to_string()),
            None,
        );
        assert!(signed_in.ok, "{:?}", signed_in.login_message);
        assert_eq!(signed_in.login_status, "success");
        assert_eq!(signed_in.user_id.as_deref(), Some("reader@example.com"));

        let unauthorized = drive_upload();
        assert!(!unauthorized.ok);
        assert!(!unauthorized.is_uploading);
        assert_eq!(
            unauthorized.message.as_deref(),
            Some("Upload failed: drive service is not initialized")
        );
        assert!(drive_authorize("tok".to_string()).ok);

        let failed = drive_sign_in_failed("cancelled".to_string());
        assert_eq!(failed.login_status, "error");
        assert_eq!(failed.login_message.as_deref(), Some("Sign-in failed: cancelled"));
        assert!(!drive_authorize("tok".to_string()).ok);

        let restored = drive_restore_login();
        assert!(restored.ok);
        assert_eq!(restored.user_id.as_deref(), Some("reader@example.com"));

        let signed_out = drive_sign_out();
        assert!(signed_out.ok);
        assert_eq!(signed_out.login_status, "idle");
        let deleted = drive_delete("mem-1".to_string());
        assert!(!deleted.ok);
        assert_eq!(deleted.message.as_deref(), Some("Please sign in first"));

        let restored = drive_restore_login();
        assert!(!restored.ok);
        assert_eq!(restored.login_message.as_deref(), Some("No saved login info"));
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
