use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::RgbImage;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, info};

use crate::{
    assets::decode::{SizePolicy, decode_image},
    foundation::error::{KissError, KissResult},
};

pub(crate) const USER_AGENT: &str = concat!("kissframe/", env!("CARGO_PKG_VERSION"));

/// Where a request image comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// `data:image/...;base64,<payload>`; holds the payload only.
    DataUrl(String),
    /// Remote `http://` or `https://` URL.
    Http(String),
    /// Bare base64 payload.
    Base64(String),
}

impl ImageSource {
    /// Classify a request string.
    ///
    /// `*_url` request fields pass `allow_raw_base64 = false`: they must be a URL or data URL.
    pub fn parse(raw: &str, allow_raw_base64: bool) -> KissResult<Self> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(KissError::invalid_input("image reference must be non-empty"));
        }

        if let Some(rest) = s.strip_prefix("data:") {
            let (header, payload) = rest.split_once(',').ok_or_else(|| {
                KissError::invalid_input("data URL is missing the ',' payload separator")
            })?;
            if !header.ends_with(";base64") {
                return Err(KissError::invalid_input(
                    "only base64-encoded data URLs are supported",
                ));
            }
            return Ok(Self::DataUrl(payload.to_string()));
        }

        let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(Self::Http(s.to_string()));
        }

        if allow_raw_base64 {
            Ok(Self::Base64(s.to_string()))
        } else {
            Err(KissError::invalid_input(format!(
                "expected an http(s) or data URL, got '{}'",
                preview(s, 48)
            )))
        }
    }
}

/// Decode a base64 payload, ignoring embedded whitespace and line breaks.
pub fn decode_base64(payload: &str) -> KissResult<Vec<u8>> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| KissError::invalid_input(format!("malformed base64 image data: {e}")))
}

/// Resolves [`ImageSource`]s to decoded, size-checked RGB images.
pub struct ImageFetcher {
    http: reqwest::blocking::Client,
    policy: SizePolicy,
}

impl ImageFetcher {
    pub fn new(timeout: Duration, policy: SizePolicy) -> KissResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| KissError::Other(anyhow::Error::new(e).context("build http client")))?;
        Ok(Self { http, policy })
    }

    /// Raw encoded bytes behind `source`.
    pub fn bytes(&self, source: &ImageSource) -> KissResult<Vec<u8>> {
        match source {
            ImageSource::DataUrl(payload) | ImageSource::Base64(payload) => decode_base64(payload),
            ImageSource::Http(url) => self.download(url),
        }
    }

    /// Parse, fetch, decode and size-check one request image.
    pub fn load(&self, raw: &str, allow_raw_base64: bool) -> KissResult<RgbImage> {
        let source = ImageSource::parse(raw, allow_raw_base64)?;
        debug!(source = %preview(raw, 100), "loading image");
        let bytes = self.bytes(&source)?;
        let img = decode_image(&bytes)?;
        let img = self.policy.apply(img)?;
        info!(width = img.width(), height = img.height(), "image loaded");
        Ok(img)
    }

    fn download(&self, url: &str) -> KissResult<Vec<u8>> {
        let fail = |e: String| {
            KissError::invalid_input(format!(
                "failed to download image from {}: {e}",
                preview(url, 100)
            ))
        };

        let response = self
            .http
            .get(url)
            .header(ACCEPT, "image/*")
            .send()
            .map_err(|e| fail(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {status}")));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !content_type.starts_with("image/") {
            return Err(fail(format!("invalid content type: '{content_type}'")));
        }

        let bytes = response.bytes().map_err(|e| fail(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// First `max_chars` characters of `s`, for log lines and error messages.
pub(crate) fn preview(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
