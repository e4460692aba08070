//! Google Drive REST v3 backup provider.
//!
//! Backups live in the private `appDataFolder` space of the signed-in
//! account. Uploads use a `multipart/related` request carrying the file
//! metadata and the JSON body in one call.

use super::{
    is_backup_file_name, BackupError, BackupInfo, BackupProvider, BackupProviderResult,
    DriveAccount, APP_DATA_FOLDER, BACKUP_FILE_PREFIX, BACKUP_MIME_TYPE,
};
use chrono::DateTime;
use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

/// Default API origin.
pub const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com";

const FILE_FIELDS: &str = "id,name,createdTime";
const LIST_FIELDS: &str = "files(id,name,createdTime)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    created_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Drive-backed provider using bearer-token authorization.
pub struct DriveBackupProvider {
    api_base: String,
    http: Client,
    session: Option<DriveSession>,
}

struct DriveSession {
    account_name: String,
    access_token: String,
}

impl DriveBackupProvider {
    /// Builds an uninitialized provider talking to `api_base`.
    pub fn new(api_base: &str, app_name: &str) -> BackupProviderResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(app_name)
            .build()?;
        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            http,
            session: None,
        })
    }

    /// Account bound by the last successful `initialize`.
    pub fn account_name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.account_name.as_str())
    }

    fn session(&self) -> BackupProviderResult<&DriveSession> {
        self.session.as_ref().ok_or(BackupError::NotInitialized)
    }

    fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.api_base)
    }

    /// `files/<file_id>` with the id escaped as a single path segment.
    fn file_url(&self, file_id: &str) -> BackupProviderResult<Url> {
        let mut url = Url::parse(&self.files_url())
            .map_err(|err| BackupError::InvalidEndpoint(format!("{}: {err}", self.api_base)))?;
        url.path_segments_mut()
            .map_err(|()| BackupError::InvalidEndpoint(self.api_base.clone()))?
            .push(file_id);
        Ok(url)
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/drive/v3/files", self.api_base)
    }
}

impl BackupProvider for DriveBackupProvider {
    fn provider_id(&self) -> &str {
        "google_drive"
    }

    fn initialize(&mut self, account: &DriveAccount) -> BackupProviderResult<()> {
        if account.account_name.trim().is_empty() {
            return Err(BackupError::InvalidAccount(
                "account name cannot be empty".to_string(),
            ));
        }
        let access_token = account
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| BackupError::InvalidAccount("missing access token".to_string()))?;

        self.session = Some(DriveSession {
            account_name: account.account_name.clone(),
            access_token: access_token.to_string(),
        });
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    fn put(&self, name: &str, data: &[u8]) -> BackupProviderResult<BackupInfo> {
        let session = self.session()?;
        let boundary = format!("diary-{}", Uuid::new_v4().simple());
        let body = multipart_related_body(&boundary, name, data);

        let response = self
            .http
            .post(self.upload_url())
            .query(&[("uploadType", "multipart"), ("fields", FILE_FIELDS)])
            .bearer_auth(&session.access_token)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()?;

        let file: DriveFile = ensure_success(response)?.json()?;
        debug!(
            "event=drive_put module=backup status=ok file_id={} bytes={}",
            file.id,
            data.len()
        );
        Ok(to_backup_info(file))
    }

    fn list(&self, limit: Option<u32>) -> BackupProviderResult<Vec<BackupInfo>> {
        let session = self.session()?;
        let mut query = vec![
            ("spaces", APP_DATA_FOLDER.to_string()),
            ("q", format!("name contains '{BACKUP_FILE_PREFIX}'")),
            ("orderBy", "createdTime desc".to_string()),
            ("fields", LIST_FIELDS.to_string()),
        ];
        if let Some(limit) = limit {
            query.push(("pageSize", limit.to_string()));
        }

        let response = self
            .http
            .get(self.files_url())
            .query(&query)
            .bearer_auth(&session.access_token)
            .send()?;

        let listed: DriveFileList = ensure_success(response)?.json()?;
        Ok(backup_infos(listed))
    }

    fn get(&self, file_id: &str) -> BackupProviderResult<Vec<u8>> {
        let session = self.session()?;
        let response = self
            .http
            .get(self.file_url(file_id)?)
            .query(&[("alt", "media")])
            .bearer_auth(&session.access_token)
            .send()?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BackupError::NotFound(file_id.to_string()));
        }
        Ok(ensure_success(response)?.bytes()?.to_vec())
    }

    fn delete(&self, file_id: &str) -> BackupProviderResult<()> {
        let session = self.session()?;
        let response = self
            .http
            .delete(self.file_url(file_id)?)
            .bearer_auth(&session.access_token)
            .send()?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BackupError::NotFound(file_id.to_string()));
        }
        ensure_success(response)?;
        Ok(())
    }
}

fn ensure_success(response: Response) -> BackupProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(BackupError::Status {
        status: status.as_u16(),
        body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    })
}

fn multipart_related_body(boundary: &str, name: &str, data: &[u8]) -> Vec<u8> {
    let metadata = json!({
        "name": name,
        "parents": [APP_DATA_FOLDER],
        "mimeType": BACKUP_MIME_TYPE,
    });

    let mut body = Vec::with_capacity(data.len() + 512);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {BACKUP_MIME_TYPE}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

/// Keeps only files named like backups, in listing order.
fn backup_infos(listed: DriveFileList) -> Vec<BackupInfo> {
    listed
        .files
        .into_iter()
        .filter(|file| is_backup_file_name(&file.name))
        .map(to_backup_info)
        .collect()
}

fn to_backup_info(file: DriveFile) -> BackupInfo {
    let created_time = file
        .created_time
        .as_deref()
        .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map_or(0, |value| value.timestamp_millis());
    BackupInfo {
        id: file.id,
        name: file.name,
        created_time,
    }
}
