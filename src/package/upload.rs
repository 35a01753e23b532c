use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use tracing::info;

use crate::assets::source::{USER_AGENT, preview};
use crate::foundation::error::{KissError, KissResult};

/// Hosts an encoded video and returns its public URL.
pub trait Uploader: Send + Sync {
    fn upload(&self, bytes: &[u8], filename: &str) -> KissResult<String>;
}

/// Multipart upload to a temporary file host answering `{ "success": true, "link": "..." }`.
pub struct HttpUploader {
    http: reqwest::blocking::Client,
    endpoint: String,
}

#[derive(serde::Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    link: Option<String>,
}

impl HttpUploader {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> KissResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| KissError::upload(format!("build upload client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

impl Uploader for HttpUploader {
    fn upload(&self, bytes: &[u8], filename: &str) -> KissResult<String> {
        let part = Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str("video/mp4")
            .map_err(|e| KissError::upload(format!("build multipart body: {e}")))?;
        let form = Form::new().part("file", part);

        info!(filename, size = bytes.len(), endpoint = %self.endpoint, "uploading video");
        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .map_err(|e| KissError::upload(format!("upload request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| KissError::upload(format!("read upload response: {e}")))?;
        if !status.is_success() {
            return Err(KissError::upload(format!(
                "HTTP {status}: {}",
                preview(&text, 200)
            )));
        }

        let parsed: UploadResponse = serde_json::from_str(&text).map_err(|_| {
            KissError::upload(format!("invalid JSON response: {}", preview(&text, 200)))
        })?;
        match parsed.link {
            Some(link) if parsed.success && !link.is_empty() => {
                info!(url = %link, "upload successful");
                Ok(link)
            }
            _ => Err(KissError::upload(format!(
                "host rejected upload: {}",
                preview(&text, 200)
            ))),
        }
    }
}
