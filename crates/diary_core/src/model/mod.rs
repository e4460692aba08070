//! Diary domain model.
//!
//! # Responsibility
//! - Define the note record persisted by the repository layer.
//! - Own the integer date encoding and inline image placeholder format.
//!
//! # Invariants
//! - A persisted note has a non-empty title and a date that decodes to a
//!   real calendar day.
//! - Image placeholders in note text map to URIs through `ImageUriMap`.

pub mod date;
pub mod images;
pub mod note;
