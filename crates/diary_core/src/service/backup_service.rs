//! Sign-in state and cloud backup orchestration.
//!
//! # Responsibility
//! - Track the drive sign-in state and persist it through `LoginRepository`.
//! - Run backup upload/restore flows and expose their progress as
//!   `DriveUiState` messages.
//!
//! # Invariants
//! - Upload is refused only while the state is `Idle`; download and listing
//!   require a successful sign-in.
//! - Every flow ends with `is_loading == false` and a final message.
//! - Tokens are never logged.

use crate::backup::{BackupInfo, BackupProvider, BackupResult, DriveAccount};
use crate::prefs::login_repo::LoginRepository;
use crate::prefs::PreferenceStore;
use crate::repo::note_repo::NoteRepository;
use crate::service::note_service::NoteService;
use log::{debug, info, warn};

/// Credential type produced by the platform's Google ID-token sign-in.
pub const GOOGLE_ID_TOKEN_CREDENTIAL_TYPE: &str =
    "com.google.android.libraries.identity.googleid.TYPE_GOOGLE_ID_TOKEN_CREDENTIAL";

/// Drive sign-in state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoginState {
    #[default]
    Idle,
    Loading,
    Success {
        user_id: String,
        id_token: Option<String>,
    },
    Error(String),
}

impl LoginState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Credential handed over by the host after the platform sign-in sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInCredential {
    pub credential_type: String,
    pub account_id: String,
    pub id_token: String,
    pub display_name: Option<String>,
    /// OAuth token authorizing drive calls, when the host obtained one.
    pub access_token: Option<String>,
}

/// Backup screen state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveUiState {
    pub is_loading: bool,
    pub is_uploading: bool,
    pub is_downloading: bool,
    pub message: Option<String>,
    pub is_error: bool,
    pub available_backups: Vec<BackupInfo>,
}

/// Login and drive state carried between short-lived services.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub login_state: LoginState,
    pub drive_state: DriveUiState,
}

type ProgressListener = Box<dyn FnMut(&DriveUiState)>;

/// Coordinates sign-in, note export/import and the backup provider.
pub struct BackupService<R: NoteRepository, S: PreferenceStore, P: BackupProvider> {
    notes: NoteService<R>,
    login: LoginRepository<S>,
    provider: P,
    login_state: LoginState,
    drive_state: DriveUiState,
    progress_listener: Option<ProgressListener>,
}

impl<R: NoteRepository, S: PreferenceStore, P: BackupProvider> BackupService<R, S, P> {
    /// Creates an idle service. Call `restore_saved_login` to pick up a
    /// previous session.
    pub fn new(notes: NoteService<R>, login: LoginRepository<S>, provider: P) -> Self {
        Self {
            notes,
            login,
            provider,
            login_state: LoginState::Idle,
            drive_state: DriveUiState::default(),
            progress_listener: None,
        }
    }

    /// Rebuilds a service around state captured by `snapshot`.
    pub fn resume(
        notes: NoteService<R>,
        login: LoginRepository<S>,
        provider: P,
        snapshot: SessionSnapshot,
    ) -> Self {
        Self {
            login_state: snapshot.login_state,
            drive_state: snapshot.drive_state,
            ..Self::new(notes, login, provider)
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            login_state: self.login_state.clone(),
            drive_state: self.drive_state.clone(),
        }
    }

    pub fn login_state(&self) -> &LoginState {
        &self.login_state
    }

    pub fn drive_state(&self) -> &DriveUiState {
        &self.drive_state
    }

    pub fn notes(&self) -> &NoteService<R> {
        &self.notes
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Registers a callback invoked on every intermediate drive state.
    pub fn set_progress_listener(&mut self, listener: impl FnMut(&DriveUiState) + 'static) {
        self.progress_listener = Some(Box::new(listener));
    }

    /// Restores the sign-in saved by a previous run.
    pub fn restore_saved_login(&mut self) -> &LoginState {
        self.login_state = LoginState::Loading;
        let saved = match self.login.saved_login() {
            Ok(saved) => saved,
            Err(err) => {
                warn!("event=login_restore module=session status=error error={err}");
                self.login_state = LoginState::Error(format!("Failed to read saved login: {err}"));
                return &self.login_state;
            }
        };

        if !saved.is_logged_in {
            debug!("event=login_restore module=session status=ok found=false");
            self.fail_login("No saved login info", false);
            return &self.login_state;
        }

        let user_id = saved.user_id.filter(|value| !value.is_empty());
        let id_token = saved.id_token.filter(|value| !value.is_empty());
        let display_name = saved.display_name.filter(|value| !value.is_empty());
        match (user_id, id_token, display_name) {
            (Some(user_id), Some(id_token), Some(display_name)) => {
                info!("event=login_restore module=session status=ok found=true");
                self.succeed_login(user_id, id_token, &display_name, None, false);
            }
            _ => {
                warn!("event=login_restore module=session status=error error_code=incomplete_saved_login");
                self.fail_login("Login info updated", true);
            }
        }
        &self.login_state
    }

    /// Completes sign-in with a platform credential.
    pub fn sign_in(&mut self, credential: SignInCredential) -> &LoginState {
        self.login_state = LoginState::Loading;

        if credential.credential_type != GOOGLE_ID_TOKEN_CREDENTIAL_TYPE {
            warn!("event=sign_in module=session status=error error_code=unsupported_credential");
            self.fail_login(
                &format!("Unsupported credential type: {}", credential.credential_type),
                true,
            );
            return &self.login_state;
        }
        if credential.account_id.trim().is_empty() || credential.id_token.trim().is_empty() {
            warn!("event=sign_in module=session status=error error_code=invalid_id_token");
            self.fail_login("Sign-in failed: unable to parse ID token", true);
            return &self.login_state;
        }
        let Some(display_name) = credential
            .display_name
            .filter(|value| !value.trim().is_empty())
        else {
            warn!("event=sign_in module=session status=error error_code=missing_display_name");
            self.fail_login("Sign-in failed: missing display name", true);
            return &self.login_state;
        };

        info!("event=sign_in module=session status=ok");
        self.succeed_login(
            credential.account_id,
            credential.id_token,
            &display_name,
            credential.access_token,
            true,
        );
        &self.login_state
    }

    /// Records a sign-in failure reported by the host's credential manager.
    pub fn sign_in_failed(&mut self, reason: &str) -> &LoginState {
        warn!("event=sign_in module=session status=error error_code=credential_manager");
        self.login_state = LoginState::Error(format!("Sign-in failed: {reason}"));
        &self.login_state
    }

    /// Re-authorizes the drive provider with a fresh access token.
    pub fn authorize_drive(&mut self, access_token: &str) -> bool {
        let LoginState::Success { user_id, .. } = &self.login_state else {
            return false;
        };
        let account = DriveAccount {
            account_name: user_id.clone(),
            access_token: Some(access_token.to_string()),
        };
        self.initialize_provider(&account)
    }

    /// Signs out and saves the logged-out state.
    pub fn sign_out(&mut self) -> &LoginState {
        self.login_state = LoginState::Idle;
        if let Err(err) = self.login.save_login_state(false, None, None, None) {
            warn!("event=sign_out module=session status=error error={err}");
        } else {
            info!("event=sign_out module=session status=ok");
        }
        &self.login_state
    }

    /// Exports every note and uploads it as a new backup.
    pub fn upload_backup(&mut self) -> &DriveUiState {
        if self.login_state == LoginState::Idle {
            self.update_drive(|state| {
                state.message = Some("Please login first".to_string());
                state.is_error = true;
            });
            return &self.drive_state;
        }

        self.update_drive(|state| {
            state.is_uploading = true;
            state.is_loading = true;
            state.message = Some("Preparing backup...".to_string());
        });
        self.set_message("Exporting database...");
        let json = match self.notes.export_json() {
            Ok(json) => json,
            Err(err) => {
                self.finish_flow(format!("Upload error: {err}"), true);
                return &self.drive_state;
            }
        };

        self.set_message("Uploading to Google Drive...");
        match self.provider.upload_backup(&json) {
            BackupResult::Success(_) => {
                self.finish_flow("Backup uploaded successfully!".to_string(), false)
            }
            BackupResult::Error(message) => self.finish_flow(message, true),
        }
        &self.drive_state
    }

    /// Downloads the newest backup and replaces local notes with it.
    pub fn download_backup(&mut self) -> &DriveUiState {
        if !self.login_state.is_signed_in() {
            self.update_drive(|state| {
                state.message = Some("Please sign in first".to_string());
                state.is_error = true;
            });
            return &self.drive_state;
        }

        self.update_drive(|state| {
            state.is_downloading = true;
            state.is_loading = true;
            state.message = Some("Searching for backups...".to_string());
        });
        self.set_message("Downloading from Google Drive...");
        let json = match self.provider.download_latest_backup() {
            Ok(Some(json)) => json,
            Ok(None) => {
                self.finish_flow("No backup found in Google Drive".to_string(), true);
                return &self.drive_state;
            }
            Err(err) => {
                self.finish_flow(format!("Download error: {err}"), true);
                return &self.drive_state;
            }
        };

        self.set_message("Restoring database...");
        match self.notes.import_json(&json) {
            Ok(_) => self.finish_flow("Backup restored successfully!".to_string(), false),
            Err(err) => self.finish_flow(format!("Download error: {err}"), true),
        }
        &self.drive_state
    }

    /// Refreshes `available_backups`. Does nothing unless signed in.
    pub fn list_backups(&mut self) -> &DriveUiState {
        if !self.login_state.is_signed_in() {
            return &self.drive_state;
        }
        match self.provider.list(None) {
            Ok(backups) => self.update_drive(|state| state.available_backups = backups),
            Err(err) => self.update_drive(|state| {
                state.message = Some(format!("Failed to list backups: {err}"));
                state.is_error = true;
            }),
        }
        &self.drive_state
    }

    /// Deletes one remote backup.
    pub fn delete_backup(&mut self, file_id: &str) -> &DriveUiState {
        if !self.login_state.is_signed_in() {
            self.update_drive(|state| {
                state.message = Some("Please sign in first".to_string());
                state.is_error = true;
            });
            return &self.drive_state;
        }
        match self.provider.delete(file_id) {
            Ok(()) => self.update_drive(|state| {
                state.available_backups.retain(|backup| backup.id != file_id);
                state.message = Some("Backup deleted".to_string());
                state.is_error = false;
            }),
            Err(err) => self.update_drive(|state| {
                state.message = Some(format!("Delete failed: {err}"));
                state.is_error = true;
            }),
        }
        &self.drive_state
    }

    fn succeed_login(
        &mut self,
        user_id: String,
        id_token: String,
        display_name: &str,
        access_token: Option<String>,
        persist: bool,
    ) {
        let account = DriveAccount {
            account_name: user_id.clone(),
            access_token,
        };
        self.initialize_provider(&account);

        if persist {
            if let Err(err) = self.login.save_login_state(
                true,
                Some(user_id.as_str()),
                Some(display_name),
                Some(id_token.as_str()),
            ) {
                warn!("event=login_save module=session status=error error={err}");
            }
        }
        self.login_state = LoginState::Success {
            user_id,
            id_token: Some(id_token),
        };
    }

    fn fail_login(&mut self, message: &str, clear_saved: bool) {
        self.login_state = LoginState::Error(message.to_string());
        if clear_saved {
            if let Err(err) = self.login.clear_login_state() {
                warn!("event=login_clear module=session status=error error={err}");
            }
        }
    }

    fn initialize_provider(&mut self, account: &DriveAccount) -> bool {
        match self.provider.initialize(account) {
            Ok(()) => {
                info!(
                    "event=drive_init module=session status=ok provider={}",
                    self.provider.provider_id()
                );
                true
            }
            Err(err) => {
                warn!(
                    "event=drive_init module=session status=error provider={} error={}",
                    self.provider.provider_id(),
                    err
                );
                false
            }
        }
    }

    fn set_message(&mut self, message: &str) {
        self.update_drive(|state| state.message = Some(message.to_string()));
    }

    fn finish_flow(&mut self, message: String, is_error: bool) {
        self.update_drive(|state| {
            state.is_loading = false;
            state.is_uploading = false;
            state.is_downloading = false;
            state.message = Some(message);
            state.is_error = is_error;
        });
    }

    fn update_drive(&mut self, apply: impl FnOnce(&mut DriveUiState)) {
        apply(&mut self.drive_state);
        if let Some(listener) = self.progress_listener.as_mut() {
            listener(&self.drive_state);
        }
    }
}
