use diary_core::backup::BackupProvider;
use diary_core::db::{open_db, open_db_in_memory};
use diary_core::prefs::login_repo::{LoginRepository, LOGIN_STORE_NAME};
use diary_core::service::backup_service::GOOGLE_ID_TOKEN_CREDENTIAL_TYPE;
use diary_core::{
    BackupService, FilePreferenceStore, LoginState, MemoryBackupProvider, MemoryPreferenceStore,
    Note, NoteDraft, NoteService, NoteServiceError, SignInCredential, SqliteNoteRepository,
};
use serde_json::Value;

fn credential() -> SignInCredential {
    SignInCredential {
        credential_type: GOOGLE_ID_TOKEN_CREDENTIAL_TYPE.to_string(),
        account_id: "reader@example.com".to_string(),
        id_token: "header.payload.signature".to_string(),
        display_name: Some("Reader".to_string()),
        access_token: Some("access".to_string()),
    }
}

fn draft(date: i32, title: &str, content: &str) -> NoteDraft {
    NoteDraft {
        date,
        title: title.to_string(),
        content: content.to_string(),
        ..NoteDraft::default()
    }
}

#[test]
fn export_document_has_expected_shape() {
    let mut conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap());

    let mut with_image = draft(20250401, "photo", "");
    let label = with_image.insert_image("content://media/1");
    service.create_note(&with_image).unwrap();
    service.create_note(&draft(20250301, "plain", "text")).unwrap();

    let document: Value = serde_json::from_str(&service.export_json().unwrap()).unwrap();
    let notes = document["notes"].as_array().unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0]["title"], "plain");
    assert_eq!(notes[0]["imageUrisJson"], Value::Null);
    assert_eq!(notes[1]["date"], 20250401);

    let images: Value =
        serde_json::from_str(notes[1]["imageUrisJson"].as_str().unwrap()).unwrap();
    assert_eq!(images[label.as_str()]["uriString"], "content://media/1");
}

#[test]
fn import_replaces_notes_and_keeps_ids() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap());
    service.create_note(&draft(20250101, "local", "")).unwrap();

    let json = r#"{"notes":[
        {"id":7,"date":20240229,"title":"restored","content":"a","imageUrisJson":null},
        {"id":9,"date":20240301,"title":"second","content":"b"}
    ]}"#;
    assert_eq!(service.import_json(json).unwrap(), 2);

    let briefs = service.list_note_briefs().unwrap();
    let ids: Vec<i64> = briefs.iter().map(|brief| brief.id).collect();
    assert_eq!(ids, vec![7, 9]);
    assert_eq!(service.get_note(7).unwrap().unwrap().title, "restored");
}

#[test]
fn malformed_import_leaves_notes_untouched() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap());
    service.create_note(&draft(20250101, "keep me", "")).unwrap();

    let err = service.import_json("{\"notes\": [").unwrap_err();
    assert!(matches!(err, NoteServiceError::InvalidBackup(_)));
    assert_eq!(service.list_note_briefs().unwrap().len(), 1);
}

#[test]
fn document_without_notes_key_clears_everything() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap());
    service.create_note(&draft(20250101, "gone", "")).unwrap();

    assert_eq!(service.import_json("{}").unwrap(), 0);
    assert!(service.list_note_briefs().unwrap().is_empty());
}

#[test]
fn upload_then_download_restores_backup() {
    let mut conn = open_db_in_memory().unwrap();
    let prefs = MemoryPreferenceStore::new();
    let mut session = BackupService::new(
        NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap()),
        LoginRepository::new(&prefs),
        MemoryBackupProvider::new(),
    );

    assert!(session.sign_in(credential()).is_signed_in());
    let first = session.notes().create_note(&draft(20250401, "spring", "")).unwrap();

    let state = session.upload_backup();
    assert_eq!(state.message.as_deref(), Some("Backup uploaded successfully!"));
    assert!(!state.is_error);

    session.notes().delete_note(first.id).unwrap();
    session.notes().create_note(&draft(20250501, "after backup", "")).unwrap();

    let state = session.download_backup();
    assert_eq!(state.message.as_deref(), Some("Backup restored successfully!"));
    assert!(!state.is_loading);
    assert!(!state.is_downloading);

    let titles: Vec<String> = session
        .notes()
        .list_note_briefs()
        .unwrap()
        .into_iter()
        .map(|brief| brief.title)
        .collect();
    assert_eq!(titles, vec!["spring"]);
    assert_eq!(session.notes().get_note(first.id).unwrap().unwrap().id, first.id);
}

#[test]
fn download_picks_newest_backup() {
    let mut conn = open_db_in_memory().unwrap();
    let prefs = MemoryPreferenceStore::new();
    let mut session = BackupService::new(
        NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap()),
        LoginRepository::new(&prefs),
        MemoryBackupProvider::new(),
    );
    session.sign_in(credential());

    session.notes().create_note(&draft(20250101, "one", "")).unwrap();
    session.upload_backup();
    session.notes().create_note(&draft(20250102, "two", "")).unwrap();
    session.upload_backup();

    let backups = session.list_backups().available_backups.clone();
    assert_eq!(backups.len(), 2);
    assert!(backups[0].created_time > backups[1].created_time);

    session.download_backup();
    assert_eq!(session.notes().list_note_briefs().unwrap().len(), 2);

    let state = session.delete_backup(&backups[0].id);
    assert_eq!(state.available_backups, vec![backups[1].clone()]);
    assert_eq!(session.provider().file_count(), 1);
}

#[test]
fn download_without_backup_reports_missing() {
    let mut conn = open_db_in_memory().unwrap();
    let prefs = MemoryPreferenceStore::new();
    let mut session = BackupService::new(
        NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap()),
        LoginRepository::new(&prefs),
        MemoryBackupProvider::new(),
    );
    session.sign_in(credential());

    let state = session.download_backup();
    assert!(state.is_error);
    assert_eq!(state.message.as_deref(), Some("No backup found in Google Drive"));
}

#[test]
fn flows_are_gated_on_login_state() {
    let mut conn = open_db_in_memory().unwrap();
    let prefs = MemoryPreferenceStore::new();
    let mut session = BackupService::new(
        NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap()),
        LoginRepository::new(&prefs),
        MemoryBackupProvider::new(),
    );

    let state = session.upload_backup();
    assert_eq!(state.message.as_deref(), Some("Please login first"));
    assert!(state.is_error);

    let state = session.download_backup();
    assert_eq!(state.message.as_deref(), Some("Please sign in first"));

    assert!(session.list_backups().available_backups.is_empty());
}

#[test]
fn sign_in_without_display_name_fails_and_clears_prefs() {
    let mut conn = open_db_in_memory().unwrap();
    let prefs = MemoryPreferenceStore::new();
    let mut session = BackupService::new(
        NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap()),
        LoginRepository::new(&prefs),
        MemoryBackupProvider::new(),
    );

    let mut anonymous = credential();
    anonymous.display_name = None;
    assert!(matches!(session.sign_in(anonymous), LoginState::Error(_)));
    assert!(!session.provider().is_initialized());
    assert!(!LoginRepository::new(&prefs).check_saved_login_state().unwrap());
}

#[test]
fn saved_login_survives_restart_until_sign_out() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("diary.sqlite3");
    let prefs_dir = dir.path().join("prefs");

    {
        let mut conn = open_db(&db_path).unwrap();
        let store = FilePreferenceStore::new(&prefs_dir, LOGIN_STORE_NAME).unwrap();
        let mut session = BackupService::new(
            NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap()),
            LoginRepository::new(store),
            MemoryBackupProvider::new(),
        );
        session.sign_in(credential());
    }

    {
        let mut conn = open_db(&db_path).unwrap();
        let store = FilePreferenceStore::new(&prefs_dir, LOGIN_STORE_NAME).unwrap();
        let mut session = BackupService::new(
            NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap()),
            LoginRepository::new(store),
            MemoryBackupProvider::new(),
        );
        assert_eq!(
            session.restore_saved_login(),
            &LoginState::Success {
                user_id: "reader@example.com".to_string(),
                id_token: Some("header.payload.signature".to_string()),
            }
        );
        assert!(session.provider().is_initialized());
        assert_eq!(session.sign_out(), &LoginState::Idle);
    }

    let store = FilePreferenceStore::new(&prefs_dir, LOGIN_STORE_NAME).unwrap();
    let saved = LoginRepository::new(store).saved_login().unwrap();
    assert!(!saved.is_logged_in);
    assert_eq!(saved.user_id.as_deref(), Some(""));
}

#[test]
fn offline_provider_surfaces_upload_error() {
    let mut conn = open_db_in_memory().unwrap();
    let prefs = MemoryPreferenceStore::new();
    let mut session = BackupService::new(
        NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap()),
        LoginRepository::new(&prefs),
        MemoryBackupProvider::new(),
    );
    session.sign_in(credential());
    session.provider().set_offline(true);

    let state = session.upload_backup();
    assert!(state.is_error);
    assert!(state.message.as_deref().unwrap().starts_with("Upload failed: "));
    assert!(!state.is_uploading);
}

#[test]
fn imported_note_matches_exported_note() {
    let mut source = open_db_in_memory().unwrap();
    let exporter = NoteService::new(SqliteNoteRepository::try_new(&mut source).unwrap());
    let mut with_image = draft(20250401, "photo", "look ");
    with_image.cursor = 5;
    with_image.insert_image("content://media/9");
    let original: Note = exporter.create_note(&with_image).unwrap();
    let json = exporter.export_json().unwrap();

    let mut target = open_db_in_memory().unwrap();
    let mut importer = NoteService::new(SqliteNoteRepository::try_new(&mut target).unwrap());
    importer.import_json(&json).unwrap();

    assert_eq!(importer.get_note(original.id).unwrap().unwrap(), original);
}
