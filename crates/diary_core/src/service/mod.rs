//! Use-case services over repositories, preferences and backup providers.
//!
//! FFI and CLI front ends call these instead of touching storage directly.

pub mod backup_service;
pub mod font_service;
pub mod note_service;
