//! Display font settings use-case.
//!
//! # Invariants
//! - Font size stays within `FONT_SIZE_MIN..=FONT_SIZE_MAX`.
//! - Unknown saved family names fall back to `FontFamily::Default`.

use crate::prefs::font_repo::FontRepository;
use crate::prefs::{PreferenceStore, PrefsResult};
use log::info;

pub const FONT_SIZE_MIN: f32 = 12.0;
pub const FONT_SIZE_MAX: f32 = 24.0;

/// Families offered by the font screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontFamily {
    #[default]
    Default,
    Serif,
    Monospace,
}

impl FontFamily {
    pub const ALL: [FontFamily; 3] = [Self::Default, Self::Serif, Self::Monospace];

    pub fn label(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Serif => "Serif",
            Self::Monospace => "Monospace",
        }
    }

    /// Case-insensitive lookup by label.
    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|family| family.label().eq_ignore_ascii_case(value.trim()))
    }
}

/// Current font selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSettings {
    pub family: FontFamily,
    pub size: f32,
}

/// Clamps a size into the supported slider range. NaN maps to the minimum.
pub fn clamp_font_size(size: f32) -> f32 {
    if size.is_nan() {
        return FONT_SIZE_MIN;
    }
    size.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX)
}

/// Font settings state holder backed by `FontRepository`.
pub struct FontService<S: PreferenceStore> {
    repo: FontRepository<S>,
    current: FontSettings,
}

impl<S: PreferenceStore> FontService<S> {
    /// Loads the saved selection.
    pub fn load(repo: FontRepository<S>) -> PrefsResult<Self> {
        let family = repo
            .font_family()?
            .and_then(|value| FontFamily::from_label(&value))
            .unwrap_or_default();
        let size = clamp_font_size(repo.font_size()?);
        Ok(Self {
            repo,
            current: FontSettings { family, size },
        })
    }

    pub fn current(&self) -> FontSettings {
        self.current
    }

    /// Updates the selection and persists it.
    ///
    /// The in-memory value changes even when persistence fails, matching a
    /// UI that reflects the user's choice immediately.
    pub fn update(&mut self, family: FontFamily, size: f32) -> PrefsResult<FontSettings> {
        self.current = FontSettings {
            family,
            size: clamp_font_size(size),
        };
        self.repo
            .save_font_state(Some(family.label()), self.current.size)?;
        info!(
            "event=font_update module=service status=ok family={} size={}",
            family.label(),
            self.current.size
        );
        Ok(self.current)
    }
}
