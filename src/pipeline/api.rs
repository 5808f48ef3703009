//! Listing API calls: photo uploads and the final status patch.
//!
//! ## Retry Strategy
//!
//! Uploads retry on any transport error or non-2xx response, up to
//! `max_attempts` requests per photo. Before retry *n* the uploader sleeps
//! `n × backoff` (1 s, 2 s, 3 s with the default unit). The growth is linear
//! and has no jitter: uploads are strictly sequential, so there is no herd
//! to spread out.
//!
//! The status patch is sent exactly once.
//!
//! Neither call returns `Err`. Failures come back as
//! [`UploadResult`] / [`PatchResult`] values so the pipeline can keep going.

use crate::config::SyncConfig;
use crate::error::MlsPhotosError;
use crate::output::{truncate_error, ExtractedImage, PatchResult, UploadResult};
use crate::pipeline::mime::mime_for_extension;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Per-upload knobs, split out of [`SyncConfig`].
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Send the `isCover` form field.
    pub send_cover_flag: bool,
    /// Send the `order` form field.
    pub send_ordering: bool,
    /// Requests per photo before giving up; values below 1 act as 1.
    pub max_attempts: u32,
    /// Linear backoff unit.
    pub backoff: Duration,
}

impl UploadOptions {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            send_cover_flag: config.send_cover_flag,
            send_ordering: config.send_ordering,
            max_attempts: config.max_attempts(),
            backoff: config.retry_backoff,
        }
    }
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            send_cover_flag: true,
            send_ordering: true,
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Delay before the retry that follows failed attempt `attempt` (1-based).
pub fn backoff_delay(attempt: u32, unit: Duration) -> Duration {
    unit * attempt
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusPatch {
    has_photos: bool,
    photo_count: usize,
}

/// Client for one listing's photo and status endpoints.
///
/// Holds a single `reqwest::Client` so every call reuses the same
/// connection pool.
#[derive(Debug, Clone)]
pub struct ListingApi {
    client: Client,
    upload_url: String,
    status_url: String,
    token: String,
    timeout: Duration,
}

impl ListingApi {
    /// Build the client and resolve both endpoint URLs from `config`.
    pub fn new(config: &SyncConfig) -> Result<Self, MlsPhotosError> {
        let client = Client::builder()
            .user_agent(concat!("mls-photos/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MlsPhotosError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            upload_url: config.upload_url(),
            status_url: config.status_url(),
            token: config.token.clone(),
            timeout: config.timeout,
        })
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    pub fn status_url(&self) -> &str {
        &self.status_url
    }

    /// Upload one photo with retries.
    ///
    /// `index` is the photo's 0-based position in upload order; `is_cover`
    /// marks the cover photo. The returned status is the last one any
    /// attempt received (`0` if none did) and the error text belongs to the
    /// final attempt.
    pub async fn upload_photo(
        &self,
        photo: &ExtractedImage,
        index: usize,
        is_cover: bool,
        options: &UploadOptions,
    ) -> UploadResult {
        let bytes = match tokio::fs::read(&photo.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return UploadResult::failed(
                    0,
                    format!("failed to read {}: {}", photo.path.display(), e),
                    0,
                )
            }
        };
        let file_name = photo.file_name();
        let mime = mime_for_extension(&photo.extension());
        let max_attempts = options.max_attempts.max(1);

        let mut last_status = 0u16;
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            let sent = self
                .send_upload(bytes.clone(), &file_name, &mime, index, is_cover, options)
                .await;

            match sent {
                Ok(response) => {
                    let status = response.status();
                    last_status = status.as_u16();
                    if status.is_success() {
                        debug!("[{index:02}] {file_name}: HTTP {last_status} on attempt {attempt}");
                        return UploadResult::succeeded(last_status, attempt);
                    }
                    let body = response.text().await.unwrap_or_default();
                    last_error = truncate_error(&body);
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }

            if attempt < max_attempts {
                let delay = backoff_delay(attempt, options.backoff);
                warn!(
                    "[{index:02}] {file_name}: attempt {attempt}/{max_attempts} failed (HTTP {last_status}); retrying in {delay:?}"
                );
                tokio::time::sleep(delay).await;
            }
        }

        warn!("[{index:02}] {file_name}: giving up after {max_attempts} attempt(s)");
        UploadResult::failed(last_status, last_error, max_attempts)
    }

    async fn send_upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime: &str,
        index: usize,
        is_cover: bool,
        options: &UploadOptions,
    ) -> reqwest::Result<Response> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)?;

        let mut form = Form::new().part("file", part);
        if options.send_cover_flag {
            form = form.text("isCover", if is_cover { "true" } else { "false" });
        }
        if options.send_ordering {
            form = form.text("order", index.to_string());
        }

        self.client
            .post(&self.upload_url)
            .bearer_auth(&self.token)
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
    }

    /// Report the final photo count on the listing. Sent once, no retry.
    pub async fn patch_status(&self, photo_count: usize) -> PatchResult {
        let body = StatusPatch {
            has_photos: photo_count > 0,
            photo_count,
        };

        let sent = self
            .client
            .patch(&self.status_url)
            .bearer_auth(&self.token)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await;

        match sent {
            Ok(response) => {
                let status = response.status().as_u16();
                if response.status().is_success() {
                    PatchResult::ok(status)
                } else {
                    let text = response.text().await.unwrap_or_default();
                    PatchResult::failed(status, truncate_error(&text))
                }
            }
            Err(e) => PatchResult::failed(0, e.to_string()),
        }
    }
}
