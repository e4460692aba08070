//! Saved sign-in state (`user_prefs` store).

use super::{PreferenceStore, PrefsResult};

/// Store name used for login preferences.
pub const LOGIN_STORE_NAME: &str = "user_prefs";

const KEY_IS_LOGGED_IN: &str = "is_logged_in";
const KEY_USER_ID: &str = "user_id";
const KEY_USER_DISPLAY_NAME: &str = "user_display_name";
const KEY_ID_TOKEN: &str = "id_token";

/// Snapshot of the saved login preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedLogin {
    pub is_logged_in: bool,
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub id_token: Option<String>,
}

/// Persists whether a drive account is signed in, and which one.
pub struct LoginRepository<S: PreferenceStore> {
    store: S,
}

impl<S: PreferenceStore> LoginRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn saved_login(&self) -> PrefsResult<SavedLogin> {
        let prefs = self.store.load()?;
        Ok(SavedLogin {
            is_logged_in: prefs.get_bool(KEY_IS_LOGGED_IN).unwrap_or(false),
            user_id: prefs.get_string(KEY_USER_ID).map(str::to_string),
            display_name: prefs.get_string(KEY_USER_DISPLAY_NAME).map(str::to_string),
            id_token: prefs.get_string(KEY_ID_TOKEN).map(str::to_string),
        })
    }

    /// Saves the login state; `None` values are stored as empty strings.
    pub fn save_login_state(
        &self,
        is_logged_in: bool,
        user_id: Option<&str>,
        display_name: Option<&str>,
        id_token: Option<&str>,
    ) -> PrefsResult<()> {
        self.store.edit(&mut |prefs| {
            prefs.set_bool(KEY_IS_LOGGED_IN, is_logged_in);
            prefs.set_string(KEY_USER_ID, user_id.unwrap_or_default());
            prefs.set_string(KEY_USER_DISPLAY_NAME, display_name.unwrap_or_default());
            prefs.set_string(KEY_ID_TOKEN, id_token.unwrap_or_default());
        })
    }

    /// Removes every saved login key.
    pub fn clear_login_state(&self) -> PrefsResult<()> {
        self.store.edit(&mut |prefs| prefs.clear())
    }

    /// Whether a logged-in state was saved.
    pub fn check_saved_login_state(&self) -> PrefsResult<bool> {
        Ok(self.saved_login()?.is_logged_in)
    }
}

#[cfg(test)]
mod tests {
    use super::LoginRepository;
    use crate::prefs::MemoryPreferenceStore;

    #[test]
    fn save_stores_missing_values_as_empty_strings() {
        let repo = LoginRepository::new(MemoryPreferenceStore::new());
        repo.save_login_state(false, None, None, None).unwrap();

        let saved = repo.saved_login().unwrap();
        assert!(!saved.is_logged_in);
        assert_eq!(saved.user_id.as_deref(), Some(""));
        assert_eq!(saved.id_token.as_deref(), Some(""));
    }

    #[test]
    fn clear_resets_to_logged_out() {
        let repo = LoginRepository::new(MemoryPreferenceStore::new());
        repo.save_login_state(true, Some("user@example.com"), Some("User"), Some("tok"))
            .unwrap();
        assert!(repo.check_saved_login_state().unwrap());

        repo.clear_login_state().unwrap();
        assert!(!repo.check_saved_login_state().unwrap());
        assert_eq!(repo.saved_login().unwrap().user_id, None);
    }
}
