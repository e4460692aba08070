//! Inline image placeholders and the note image-URI side channel.
//!
//! # Responsibility
//! - Generate `[IMAGE_<uuid>]` labels and splice them into note text.
//! - Marshal the label-to-URI map to and from the `image_uris_json` column.
//! - Split note text into text/image segments for rendering.
//!
//! # Invariants
//! - An empty map is persisted as NULL, never as `{}`.
//! - Undecodable column values load as an empty map; they never fail a read.

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

static IMAGE_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[IMAGE_[0-9A-Za-z-]+\]").expect("valid image label regex"));

/// Serialized shape of one map value: `{"uriString": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct UriWrapper {
    #[serde(rename = "uriString")]
    uri_string: String,
}

/// Ordered mapping from placeholder label to image URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageUriMap {
    entries: BTreeMap<String, String>,
}

impl ImageUriMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, uri: impl Into<String>) {
        self.entries.insert(label.into(), uri.into());
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.get(label).map(String::as_str)
    }

    pub fn remove(&mut self, label: &str) -> Option<String> {
        self.entries.remove(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(label, uri)| (label.as_str(), uri.as_str()))
    }

    /// Drops entries whose label no longer appears in `content`.
    ///
    /// Returns the number of removed entries.
    pub fn prune_unreferenced(&mut self, content: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|label, _| content.contains(label.as_str()));
        before - self.entries.len()
    }

    /// Encodes the map for the `image_uris_json` column.
    ///
    /// Returns `None` for an empty map.
    pub fn to_column_json(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let wrapped: BTreeMap<&str, UriWrapper> = self
            .entries
            .iter()
            .map(|(label, uri)| {
                (
                    label.as_str(),
                    UriWrapper {
                        uri_string: uri.clone(),
                    },
                )
            })
            .collect();
        // A map of strings always serializes.
        serde_json::to_string(&wrapped).ok()
    }

    /// Decodes the `image_uris_json` column.
    ///
    /// NULL, blank or malformed values yield an empty map.
    pub fn from_column_json(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Self::default();
        };

        match serde_json::from_str::<BTreeMap<String, UriWrapper>>(raw) {
            Ok(wrapped) => Self {
                entries: wrapped
                    .into_iter()
                    .map(|(label, wrapper)| (label, wrapper.uri_string))
                    .collect(),
            },
            Err(err) => {
                warn!(
                    "event=image_map_decode module=model status=error error_code=invalid_json bytes={} error={}",
                    raw.len(),
                    err
                );
                Self::default()
            }
        }
    }
}

/// Result of splicing an image label into note text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelInsertion {
    /// Content with the label inserted.
    pub content: String,
    /// Cursor position (in chars) right after the inserted label.
    pub cursor: usize,
}

/// One renderable piece of note content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSegment<'a> {
    Text(&'a str),
    Image { label: &'a str, uri: &'a str },
}

/// Generates a fresh `[IMAGE_<uuid>]` label.
pub fn new_image_label() -> String {
    format!("[IMAGE_{}]", Uuid::new_v4())
}

/// Inserts `label` at `cursor`, counted in chars and clamped to the end.
pub fn insert_label_at(content: &str, cursor: usize, label: &str) -> LabelInsertion {
    let byte_index = content
        .char_indices()
        .nth(cursor)
        .map_or(content.len(), |(index, _)| index);
    let inserted_at = content[..byte_index].chars().count();

    let mut updated = String::with_capacity(content.len() + label.len());
    updated.push_str(&content[..byte_index]);
    updated.push_str(label);
    updated.push_str(&content[byte_index..]);

    LabelInsertion {
        content: updated,
        cursor: inserted_at + label.chars().count(),
    }
}

/// Lists placeholder labels in order of appearance.
pub fn image_labels(content: &str) -> Vec<&str> {
    IMAGE_LABEL_RE
        .find_iter(content)
        .map(|found| found.as_str())
        .collect()
}

/// Splits content into text and image segments.
///
/// Labels without a map entry stay in the surrounding text.
pub fn segment_content<'a>(content: &'a str, images: &'a ImageUriMap) -> Vec<ContentSegment<'a>> {
    let mut segments = Vec::new();
    let mut text_start = 0;

    for found in IMAGE_LABEL_RE.find_iter(content) {
        let Some(uri) = images.get(found.as_str()) else {
            continue;
        };
        if found.start() > text_start {
            segments.push(ContentSegment::Text(&content[text_start..found.start()]));
        }
        segments.push(ContentSegment::Image {
            label: found.as_str(),
            uri,
        });
        text_start = found.end();
    }

    if text_start < content.len() {
        segments.push(ContentSegment::Text(&content[text_start..]));
    }
    segments
}
