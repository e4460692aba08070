//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over the `notes` table.
//! - Own the whole-table replacement used by backup restore.
//!
//! # Invariants
//! - Lists are ordered by `date ASC, id ASC`.
//! - `replace_all` clears and re-inserts in a single transaction.
//! - Reads never fail because of an undecodable `image_uris_json` value.

use crate::db::DbError;
use crate::model::images::ImageUriMap;
use crate::model::note::{Note, NoteBrief, NoteId};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    date,
    title,
    content,
    image_uris_json
FROM notes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(NoteId),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing; run migrations first")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "required column `{table}.{column}` is missing; run migrations first"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for diary notes.
pub trait NoteRepository {
    /// Inserts one note. An `id` of 0 lets SQLite assign one.
    ///
    /// Returns `None` when a row with the same explicit id already exists;
    /// the existing row is left untouched.
    fn insert_note(&self, note: &Note) -> RepoResult<Option<NoteId>>;
    /// Overwrites every field of an existing note.
    fn update_note(&self, note: &Note) -> RepoResult<()>;
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    fn list_note_briefs(&self) -> RepoResult<Vec<NoteBrief>>;
    fn list_notes(&self) -> RepoResult<Vec<Note>>;
    /// Removes every note and returns the removed count.
    fn delete_all(&self) -> RepoResult<usize>;
    /// Replaces the full note set atomically and returns the inserted count.
    fn replace_all(&mut self, notes: &[Note]) -> RepoResult<usize>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// Fails when the schema is missing tables or columns this repository
    /// reads.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_notes_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, note: &Note) -> RepoResult<Option<NoteId>> {
        insert_note_row(&*self.conn, note)
    }

    fn update_note(&self, note: &Note) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                date = ?2,
                title = ?3,
                content = ?4,
                image_uris_json = ?5
             WHERE id = ?1;",
            params![
                note.id,
                note.date,
                note.title.as_str(),
                note.content.as_str(),
                note.image_uris.to_column_json(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(note.id));
        }
        Ok(())
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let note = self
            .conn
            .query_row(
                &format!("{NOTE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_note_row,
            )
            .optional()?;
        Ok(note)
    }

    fn list_note_briefs(&self) -> RepoResult<Vec<NoteBrief>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, date, title FROM notes ORDER BY date ASC, id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut briefs = Vec::new();
        while let Some(row) = rows.next()? {
            briefs.push(NoteBrief {
                id: row.get("id")?,
                date: row.get("date")?,
                title: row.get("title")?,
            });
        }
        Ok(briefs)
    }

    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} ORDER BY date ASC, id ASC;"))?;
        let notes = stmt
            .query_map([], parse_note_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    fn delete_all(&self) -> RepoResult<usize> {
        delete_all_rows(&*self.conn)
    }

    fn replace_all(&mut self, notes: &[Note]) -> RepoResult<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        delete_all_rows(&tx)?;

        let mut inserted = 0;
        for note in notes {
            if insert_note_row(&tx, note)?.is_some() {
                inserted += 1;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }
}

fn delete_all_rows(conn: &Connection) -> RepoResult<usize> {
    Ok(conn.execute("DELETE FROM notes;", [])?)
}

fn insert_note_row(conn: &Connection, note: &Note) -> RepoResult<Option<NoteId>> {
    let image_json = note.image_uris.to_column_json();
    if note.id == 0 {
        conn.execute(
            "INSERT INTO notes (date, title, content, image_uris_json)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                note.date,
                note.title.as_str(),
                note.content.as_str(),
                image_json
            ],
        )?;
        return Ok(Some(conn.last_insert_rowid()));
    }

    let changed = conn.execute(
        "INSERT OR IGNORE INTO notes (id, date, title, content, image_uris_json)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            note.id,
            note.date,
            note.title.as_str(),
            note.content.as_str(),
            image_json
        ],
    )?;
    Ok((changed > 0).then_some(note.id))
}

fn parse_note_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    let image_json: Option<String> = row.get("image_uris_json")?;
    Ok(Note {
        id: row.get("id")?,
        date: row.get("date")?,
        title: row.get("title")?,
        content: row.get("content")?,
        image_uris: ImageUriMap::from_column_json(image_json.as_deref()),
    })
}

fn ensure_notes_connection_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, "notes")? {
        return Err(RepoError::MissingRequiredTable("notes"));
    }

    for column in ["id", "date", "title", "content", "image_uris_json"] {
        if !table_has_column(conn, "notes", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "notes",
                column,
            });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
