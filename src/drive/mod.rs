//! Google Drive download proxy client: fetch a file's metadata and bytes
//! with the caller's OAuth access token.

use axum::body::Bytes;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("Invalid Drive API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Metadata Fetch Failed: {0}")]
    MetadataStatus(StatusCode),

    #[error("File Fetch Failed: {0}")]
    ContentStatus(StatusCode),

    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub name: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    /// Drive reports sizes as decimal strings; absent for native Docs files.
    pub size: Option<String>,
}

fn default_mime_type() -> String {
    "application/octet-stream".to_string()
}

impl FileMetadata {
    /// `attachment; filename="…"`, with quotes and control characters removed.
    /// Non-ASCII names get an `_` fallback plus an RFC 5987 `filename*`.
    pub fn content_disposition(&self) -> String {
        let safe: String = self
            .name
            .chars()
            .filter(|c| *c != '"' && *c != '\\' && !c.is_control())
            .collect();
        if safe.is_ascii() {
            return format!("attachment; filename=\"{}\"", safe);
        }
        let fallback: String = safe.chars().map(|c| if c.is_ascii() { c } else { '_' }).collect();
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            ext_value(&safe)
        )
    }
}

fn ext_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct DriveClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DriveClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Result<Self, DriveError> {
        let base_url = Url::parse(base_url).map_err(|_| DriveError::InvalidBaseUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(DriveError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self { http, base_url })
    }

    /// `<base>/files/<id>`, with the id percent-encoded as one path segment.
    fn file_url(&self, file_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("files").push(file_id);
        }
        url
    }

    pub async fn metadata(&self, file_id: &str, token: &str) -> Result<FileMetadata, DriveError> {
        let mut url = self.file_url(file_id);
        url.query_pairs_mut().append_pair("fields", "name,mimeType,size");

        let res = self.http.get(url).bearer_auth(token).send().await?;
        if !res.status().is_success() {
            return Err(DriveError::MetadataStatus(res.status()));
        }
        Ok(res.json::<FileMetadata>().await?)
    }

    pub async fn content(&self, file_id: &str, token: &str) -> Result<Bytes, DriveError> {
        let mut url = self.file_url(file_id);
        url.query_pairs_mut().append_pair("alt", "media");

        let res = self.http.get(url).bearer_auth(token).send().await?;
        if !res.status().is_success() {
            return Err(DriveError::ContentStatus(res.status()));
        }
        Ok(res.bytes().await?)
    }
}
