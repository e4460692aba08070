//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted note record and its list projection.
//! - Hold entry/edit form state (`NoteDraft`) and its validation rules.
//!
//! # Invariants
//! - `id == 0` marks a note that has not been persisted yet.
//! - Valid notes have a non-empty title and a real calendar date.

use crate::model::date::is_valid_date;
use crate::model::images::{insert_label_at, new_image_label, ImageUriMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Row identifier assigned by SQLite.
pub type NoteId = i64;

/// Persisted diary note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    /// Calendar day encoded as `YYYYMMDD`.
    pub date: i32,
    pub title: String,
    /// Free text; may contain `[IMAGE_<uuid>]` placeholders.
    pub content: String,
    pub image_uris: ImageUriMap,
}

impl Note {
    pub fn new(date: i32, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: 0,
            date,
            title: title.into(),
            content: content.into(),
            image_uris: ImageUriMap::new(),
        }
    }

    /// Checks the title and date invariants.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_fields(self.title.as_str(), self.date)
    }

    pub fn brief(&self) -> NoteBrief {
        NoteBrief {
            id: self.id,
            date: self.date,
            title: self.title.clone(),
        }
    }
}

/// List projection shown on the home screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteBrief {
    pub id: NoteId,
    pub date: i32,
    pub title: String,
}

/// Field-level validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyTitle,
    InvalidDate(i32),
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title cannot be empty"),
            Self::InvalidDate(value) => write!(f, "note date `{value}` is not a calendar day"),
        }
    }
}

impl Error for NoteValidationError {}

fn validate_fields(title: &str, date: i32) -> Result<(), NoteValidationError> {
    if title.is_empty() {
        return Err(NoteValidationError::EmptyTitle);
    }
    if !is_valid_date(date) {
        return Err(NoteValidationError::InvalidDate(date));
    }
    Ok(())
}

/// Editable note state backing the entry and edit screens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub id: NoteId,
    pub date: i32,
    pub title: String,
    pub content: String,
    /// Insertion point for images, in chars.
    pub cursor: usize,
    pub image_uris: ImageUriMap,
}

impl NoteDraft {
    pub fn new(date: i32) -> Self {
        Self {
            date,
            ..Self::default()
        }
    }

    /// Loads a persisted note for editing, cursor at the end of the text.
    pub fn from_note(note: &Note) -> Self {
        Self {
            id: note.id,
            date: note.date,
            title: note.title.clone(),
            content: note.content.clone(),
            cursor: note.content.chars().count(),
            image_uris: note.image_uris.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_fields(self.title.as_str(), self.date)
    }

    /// Whether the save action should be enabled.
    pub fn is_entry_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Inserts a new image placeholder at the cursor and maps it to `uri`.
    ///
    /// Returns the generated label.
    pub fn insert_image(&mut self, uri: impl Into<String>) -> String {
        let label = new_image_label();
        let inserted = insert_label_at(self.content.as_str(), self.cursor, label.as_str());
        self.content = inserted.content;
        self.cursor = inserted.cursor;
        self.image_uris.insert(label.clone(), uri);
        label
    }

    /// Converts the draft into a note, dropping images whose placeholder
    /// was removed from the text.
    pub fn to_note(&self) -> Note {
        let mut image_uris = self.image_uris.clone();
        image_uris.prune_unreferenced(self.content.as_str());
        Note {
            id: self.id,
            date: self.date,
            title: self.title.clone(),
            content: self.content.clone(),
            image_uris,
        }
    }
}
