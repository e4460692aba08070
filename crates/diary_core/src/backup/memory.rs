//! In-process backup provider.

use super::{
    BackupError, BackupInfo, BackupProvider, BackupProviderResult, DriveAccount,
};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredBackup {
    info: BackupInfo,
    data: Vec<u8>,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: Vec<StoredBackup>,
    next_id: u64,
    last_created: i64,
}

/// Keeps backups in memory. Used by tests and offline sessions.
#[derive(Debug, Default)]
pub struct MemoryBackupProvider {
    account: Option<String>,
    require_access_token: bool,
    offline: AtomicBool,
    state: Mutex<MemoryState>,
}

impl MemoryBackupProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects accounts without an access token, like the drive client.
    pub fn requiring_access_token() -> Self {
        Self {
            require_access_token: true,
            ..Self::default()
        }
    }

    /// Simulates an unreachable remote: every call fails with HTTP 503.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn account_name(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn check_available(&self) -> BackupProviderResult<()> {
        if self.account.is_none() {
            return Err(BackupError::NotInitialized);
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(BackupError::Status {
                status: 503,
                body: "memory provider is offline".to_string(),
            });
        }
        Ok(())
    }
}

impl BackupProvider for MemoryBackupProvider {
    fn provider_id(&self) -> &str {
        "memory"
    }

    fn initialize(&mut self, account: &DriveAccount) -> BackupProviderResult<()> {
        if account.account_name.trim().is_empty() {
            return Err(BackupError::InvalidAccount(
                "account name cannot be empty".to_string(),
            ));
        }
        let has_token = account
            .access_token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty());
        if self.require_access_token && !has_token {
            return Err(BackupError::InvalidAccount("missing access token".to_string()));
        }
        self.account = Some(account.account_name.clone());
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.account.is_some()
    }

    fn put(&self, name: &str, data: &[u8]) -> BackupProviderResult<BackupInfo> {
        self.check_available()?;
        let mut state = self.lock();
        state.next_id += 1;
        // Strictly increasing so same-millisecond uploads still sort.
        let created_time = Utc::now().timestamp_millis().max(state.last_created + 1);
        state.last_created = created_time;

        let info = BackupInfo {
            id: format!("mem-{}", state.next_id),
            name: name.to_string(),
            created_time,
        };
        state.files.push(StoredBackup {
            info: info.clone(),
            data: data.to_vec(),
        });
        Ok(info)
    }

    fn list(&self, limit: Option<u32>) -> BackupProviderResult<Vec<BackupInfo>> {
        self.check_available()?;
        let state = self.lock();
        let mut infos: Vec<BackupInfo> = state.files.iter().map(|f| f.info.clone()).collect();
        infos.sort_by(|a, b| b.created_time.cmp(&a.created_time));
        if let Some(limit) = limit {
            infos.truncate(limit as usize);
        }
        Ok(infos)
    }

    fn get(&self, file_id: &str) -> BackupProviderResult<Vec<u8>> {
        self.check_available()?;
        self.lock()
            .files
            .iter()
            .find(|file| file.info.id == file_id)
            .map(|file| file.data.clone())
            .ok_or_else(|| BackupError::NotFound(file_id.to_string()))
    }

    fn delete(&self, file_id: &str) -> BackupProviderResult<()> {
        self.check_available()?;
        let mut state = self.lock();
        let before = state.files.len();
        state.files.retain(|file| file.info.id != file_id);
        if state.files.len() == before {
            return Err(BackupError::NotFound(file_id.to_string()));
        }
        Ok(())
    }
}
