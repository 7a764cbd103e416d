use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::instrument;

use crate::config::CdnConfig;
use crate::error::ApiError;

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
    pub file_name: String,
}

/// Reference to a hosted image, as returned by the CDN.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaRef {
    pub public_id: String,
    pub secure_url: String,
}

#[async_trait]
pub trait MediaClient: Send + Sync {
    async fn upload(&self, item: UploadItem) -> Result<MediaRef, ApiError>;
}

/// Unsigned preset upload against a Cloudinary-style endpoint. All
/// identifiers come from the injected config.
pub struct CdnUploader {
    http: reqwest::Client,
    upload_url: String,
    api_key: String,
    upload_preset: String,
}

impl CdnUploader {
    pub fn new(config: &CdnConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            upload_url: format!(
                "{}/v1_1/{}/image/upload",
                config.base_url.trim_end_matches('/'),
                config.cloud_name
            ),
            api_key: config.api_key.clone(),
            upload_preset: config.upload_preset.clone(),
        }
    }
}

#[async_trait]
impl MediaClient for CdnUploader {
    #[instrument(skip(self, item), fields(file = %item.file_name))]
    async fn upload(&self, item: UploadItem) -> Result<MediaRef, ApiError> {
        let part = Part::bytes(item.body.to_vec())
            .file_name(item.file_name)
            .mime_str(&item.content_type)?;
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone())
            .text("api_key", self.api_key.clone());

        let resp = self.http.post(&self.upload_url).multipart(form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status));
        }
        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// A picked-files event carries a list; only the first entry is uploaded.
pub fn select_first<P: AsRef<Path>>(paths: &[P]) -> Option<&Path> {
    paths.first().map(|p| p.as_ref())
}

pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn mime_for_known_and_unknown_extensions() {
        assert_eq!(mime_for_path(Path::new("a/b/photo.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("photo.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("photo.webp")), "image/webp");
        assert_eq!(mime_for_path(Path::new("photo.heic")), "image/heic");
        assert_eq!(mime_for_path(Path::new("notes.txt")), "application/octet-stream");
        assert_eq!(mime_for_path(Path::new("no_extension")), "application/octet-stream");
    }

    #[test]
    fn first_file_wins() {
        let picked = vec![PathBuf::from("one.png"), PathBuf::from("two.png")];
        assert_eq!(select_first(&picked), Some(Path::new("one.png")));

        let none: Vec<PathBuf> = vec![];
        assert_eq!(select_first(&none), None);
    }
}
