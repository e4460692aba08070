//! Persistence behind traits.
//!
//! Services depend on `NoteRepository`; the SQLite queries live in
//! `note_repo` and nowhere else.

pub mod note_repo;
