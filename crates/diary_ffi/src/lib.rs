//! Flutter bridge for the diary core.

pub mod api;
