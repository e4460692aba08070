//! Note use-case service.
//!
//! # Responsibility
//! - Validate and persist notes created or edited through `NoteDraft`.
//! - Export the note table to the JSON backup document and restore from it.
//!
//! # Invariants
//! - Nothing is written unless the title is non-empty and the date is a
//!   real calendar day.
//! - Import replaces every note atomically; malformed documents leave stored
//!   notes untouched.

use crate::model::images::ImageUriMap;
use crate::model::note::{Note, NoteBrief, NoteDraft, NoteId, NoteValidationError};
use crate::repo::note_repo::{NoteRepository, RepoError};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Title/date validation failed.
    Validation(NoteValidationError),
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Backup document could not be parsed or produced.
    InvalidBackup(serde_json::Error),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidBackup(err) => write!(f, "invalid backup document: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidBackup(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<NoteValidationError> for NoteServiceError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

/// One note inside the backup document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedNote {
    pub id: NoteId,
    pub date: i32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_uris_json: Option<String>,
}

impl From<&Note> for ExportedNote {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            date: note.date,
            title: note.title.clone(),
            content: note.content.clone(),
            image_uris_json: note.image_uris.to_column_json(),
        }
    }
}

impl From<ExportedNote> for Note {
    fn from(value: ExportedNote) -> Self {
        Self {
            id: value.id,
            date: value.date,
            title: value.title,
            content: value.content,
            image_uris: ImageUriMap::from_column_json(value.image_uris_json.as_deref()),
        }
    }
}

/// Backup document: `{"notes": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupDocument {
    #[serde(default)]
    pub notes: Vec<ExportedNote>,
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates a draft and inserts it as a new note.
    pub fn create_note(&self, draft: &NoteDraft) -> Result<Note, NoteServiceError> {
        draft.validate()?;
        let mut note = draft.to_note();
        note.id = 0;

        let id = self
            .repo
            .insert_note(&note)?
            .ok_or(NoteServiceError::InconsistentState(
                "auto-assigned note id was ignored on insert",
            ))?;
        self.read_back(id, "created note not found in read-back")
    }

    /// Validates and overwrites an existing note.
    ///
    /// The stored date is kept; only title, content and images change.
    pub fn update_note(&self, note: &Note) -> Result<Note, NoteServiceError> {
        let stored = self
            .repo
            .get_note(note.id)?
            .ok_or(NoteServiceError::NoteNotFound(note.id))?;
        let edited = Note {
            date: stored.date,
            ..note.clone()
        };
        edited.validate()?;
        self.repo.update_note(&edited)?;
        self.read_back(edited.id, "updated note not found in read-back")
    }

    /// Saves an edit-screen draft over its persisted note.
    pub fn save_draft(&self, draft: &NoteDraft) -> Result<Note, NoteServiceError> {
        if draft.id == 0 {
            return self.create_note(draft);
        }
        self.update_note(&draft.to_note())
    }

    pub fn delete_note(&self, id: NoteId) -> Result<(), NoteServiceError> {
        self.repo.delete_note(id)?;
        Ok(())
    }

    pub fn get_note(&self, id: NoteId) -> Result<Option<Note>, NoteServiceError> {
        Ok(self.repo.get_note(id)?)
    }

    /// Removes every note and returns the removed count.
    pub fn delete_all_notes(&self) -> Result<usize, NoteServiceError> {
        let removed = self.repo.delete_all()?;
        info!("event=notes_clear module=service status=ok count={removed}");
        Ok(removed)
    }

    /// Lists note briefs ordered by date, oldest first.
    pub fn list_note_briefs(&self) -> Result<Vec<NoteBrief>, NoteServiceError> {
        Ok(self.repo.list_note_briefs()?)
    }

    /// Serializes every note into the backup document.
    pub fn export_json(&self) -> Result<String, NoteServiceError> {
        let started_at = Instant::now();
        let notes = self.repo.list_notes()?;
        let document = BackupDocument {
            notes: notes.iter().map(ExportedNote::from).collect(),
        };
        let json = serde_json::to_string(&document).map_err(NoteServiceError::InvalidBackup)?;
        info!(
            "event=notes_export module=service status=ok count={} bytes={} duration_ms={}",
            document.notes.len(),
            json.len(),
            started_at.elapsed().as_millis()
        );
        Ok(json)
    }

    /// Replaces every note with the contents of a backup document.
    ///
    /// Returns the number of imported notes.
    pub fn import_json(&mut self, json: &str) -> Result<usize, NoteServiceError> {
        let started_at = Instant::now();
        let document: BackupDocument = match serde_json::from_str(json) {
            Ok(document) => document,
            Err(err) => {
                warn!(
                    "event=notes_import module=service status=error error_code=invalid_backup bytes={} error={}",
                    json.len(),
                    err
                );
                return Err(NoteServiceError::InvalidBackup(err));
            }
        };

        let notes: Vec<Note> = document.notes.into_iter().map(Note::from).collect();
        let imported = self.repo.replace_all(&notes)?;
        info!(
            "event=notes_import module=service status=ok count={} skipped={} duration_ms={}",
            imported,
            notes.len() - imported,
            started_at.elapsed().as_millis()
        );
        Ok(imported)
    }

    fn read_back(&self, id: NoteId, details: &'static str) -> Result<Note, NoteServiceError> {
        self.repo
            .get_note(id)?
            .ok_or(NoteServiceError::InconsistentState(details))
    }
}
