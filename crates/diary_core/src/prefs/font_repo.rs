//! Font preference repository (`user_font` store).

use super::{PreferenceStore, PrefsResult};

/// Store name used for font preferences.
pub const FONT_STORE_NAME: &str = "user_font";
/// Size returned when nothing has been saved yet.
pub const DEFAULT_FONT_SIZE: f32 = 18.0;
/// Family persisted when the caller saves without choosing one.
pub const DEFAULT_FONT_FAMILY_VALUE: &str = "default";

const KEY_FONT_FAMILY: &str = "font_family";
const KEY_FONT_SIZE: &str = "font_size";

/// Reads and writes display font preferences.
pub struct FontRepository<S: PreferenceStore> {
    store: S,
}

impl<S: PreferenceStore> FontRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Saved font family, if any.
    pub fn font_family(&self) -> PrefsResult<Option<String>> {
        Ok(self
            .store
            .load()?
            .get_string(KEY_FONT_FAMILY)
            .map(str::to_string))
    }

    /// Saved font size, defaulting to 18.
    pub fn font_size(&self) -> PrefsResult<f32> {
        Ok(self
            .store
            .load()?
            .get_float(KEY_FONT_SIZE)
            .unwrap_or(DEFAULT_FONT_SIZE))
    }

    /// Persists both values in one edit.
    pub fn save_font_state(&self, family: Option<&str>, size: f32) -> PrefsResult<()> {
        let family = family.unwrap_or(DEFAULT_FONT_FAMILY_VALUE).to_string();
        self.store.edit(&mut |prefs| {
            prefs.set_string(KEY_FONT_FAMILY, family.as_str());
            prefs.set_float(KEY_FONT_SIZE, size);
        })
    }
}
