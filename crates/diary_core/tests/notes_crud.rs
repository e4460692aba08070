use diary_core::db::open_db_in_memory;
use diary_core::model::images::image_labels;
use diary_core::{
    ImageUriMap, Note, NoteDraft, NoteRepository, NoteService, NoteServiceError,
    NoteValidationError, RepoError, SqliteNoteRepository,
};
use rusqlite::Connection;

#[test]
fn insert_and_get_roundtrip_keeps_images() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();

    let mut note = Note::new(20250401, "walk", "park [IMAGE_a1]");
    note.image_uris.insert("[IMAGE_a1]", "content://media/7");
    let id = repo.insert_note(&note).unwrap().unwrap();

    let loaded = repo.get_note(id).unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.title, "walk");
    assert_eq!(loaded.image_uris.get("[IMAGE_a1]"), Some("content://media/7"));
}

#[test]
fn insert_with_existing_id_is_ignored() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();

    let mut first = Note::new(20250401, "first", "");
    first.id = 5;
    assert_eq!(repo.insert_note(&first).unwrap(), Some(5));

    let mut clash = Note::new(20250402, "second", "");
    clash.id = 5;
    assert_eq!(repo.insert_note(&clash).unwrap(), None);
    assert_eq!(repo.get_note(5).unwrap().unwrap().title, "first");
}

#[test]
fn briefs_are_ordered_by_date_then_id() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();

    for (date, title) in [(20250310, "c"), (20250101, "a"), (20250310, "d"), (20250201, "b")] {
        repo.insert_note(&Note::new(date, title, "")).unwrap();
    }

    let titles: Vec<String> = repo
        .list_note_briefs()
        .unwrap()
        .into_iter()
        .map(|brief| brief.title)
        .collect();
    assert_eq!(titles, vec!["a", "b", "c", "d"]);
}

#[test]
fn update_and_delete_missing_note_report_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();

    let mut ghost = Note::new(20250401, "ghost", "");
    ghost.id = 42;
    assert!(matches!(repo.update_note(&ghost), Err(RepoError::NotFound(42))));
    assert!(matches!(repo.delete_note(42), Err(RepoError::NotFound(42))));
}

#[test]
fn malformed_image_column_still_loads() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO notes (id, date, title, content, image_uris_json)
         VALUES (1, 20250401, 'broken', 'text', '{not json');",
        [],
    )
    .unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();

    let loaded = repo.get_note(1).unwrap().unwrap();
    assert_eq!(loaded.content, "text");
    assert!(loaded.image_uris.is_empty());
}

#[test]
fn repository_requires_migrated_schema() {
    let mut conn = Connection::open_in_memory().unwrap();
    assert!(matches!(
        SqliteNoteRepository::try_new(&mut conn),
        Err(RepoError::MissingRequiredTable("notes"))
    ));
}

#[test]
fn service_rejects_invalid_drafts_without_writing() {
    let mut conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap());

    let untitled = NoteDraft::new(20250401);
    assert!(matches!(
        service.create_note(&untitled),
        Err(NoteServiceError::Validation(NoteValidationError::EmptyTitle))
    ));

    let mut impossible = NoteDraft::new(20230229);
    impossible.title = "leap".to_string();
    assert!(matches!(
        service.create_note(&impossible),
        Err(NoteServiceError::Validation(NoteValidationError::InvalidDate(20230229)))
    ));

    assert!(service.list_note_briefs().unwrap().is_empty());
}

#[test]
fn draft_with_image_is_created_and_edited() {
    let mut conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap());

    let mut draft = NoteDraft::new(20240229);
    draft.title = "leap day".to_string();
    draft.content = "before after".to_string();
    draft.cursor = 7;
    let label = draft.insert_image("content://media/3");

    let created = service.create_note(&draft).unwrap();
    assert_eq!(created.content, format!("before {label}after"));
    assert_eq!(image_labels(&created.content), vec![label.as_str()]);

    let mut edit = NoteDraft::from_note(&created);
    edit.content = "before after".to_string();
    let saved = service.save_draft(&edit).unwrap();
    assert_eq!(saved.id, created.id);
    assert_eq!(saved.image_uris, ImageUriMap::new());
}

#[test]
fn service_delete_of_missing_note_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap());

    assert!(matches!(
        service.delete_note(9),
        Err(NoteServiceError::NoteNotFound(9))
    ));
}

#[test]
fn edit_keeps_original_date() {
    let mut conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap());

    let mut draft = NoteDraft::new(20250401);
    draft.title = "first".to_string();
    let created = service.create_note(&draft).unwrap();

    let mut edit = NoteDraft::from_note(&created);
    edit.date = 20250402;
    edit.title = "renamed".to_string();
    let saved = service.save_draft(&edit).unwrap();
    assert_eq!(saved.date, 20250401);
    assert_eq!(saved.title, "renamed");

    let mut moved = saved.clone();
    moved.date = 20991231;
    assert_eq!(service.update_note(&moved).unwrap().date, 20250401);
    assert_eq!(service.get_note(created.id).unwrap().unwrap().date, 20250401);
}

#[test]
fn edit_of_missing_note_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap());

    let mut ghost = Note::new(20250401, "ghost", "");
    ghost.id = 3;
    assert!(matches!(
        service.update_note(&ghost),
        Err(NoteServiceError::NoteNotFound(3))
    ));
}

#[test]
fn delete_all_notes_empties_the_table() {
    let mut conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&mut conn).unwrap());

    for title in ["a", "b"] {
        let mut draft = NoteDraft::new(20250401);
        draft.title = title.to_string();
        service.create_note(&draft).unwrap();
    }

    assert_eq!(service.delete_all_notes().unwrap(), 2);
    assert!(service.list_note_briefs().unwrap().is_empty());
    assert_eq!(service.delete_all_notes().unwrap(), 0);
}
