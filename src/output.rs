//! Result types produced by the sync pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Maximum characters of a response body kept as error text.
pub const ERROR_TEXT_LIMIT: usize = 500;

/// One unique image pulled out of the PDF and written to disk.
///
/// Immutable once extracted. The file is left on disk after the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedImage {
    /// Location of the written image file.
    pub path: PathBuf,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// `width × height`.
    pub area: u64,
    /// 0-based page the image was found on.
    pub page_index: usize,
    /// 0-based position of the image among the page's image objects.
    pub image_index: usize,
    /// Lowercase hex SHA-256 of the file bytes; unique within a run.
    pub sha256: String,
}

impl ExtractedImage {
    pub fn new(
        path: PathBuf,
        width: u32,
        height: u32,
        page_index: usize,
        image_index: usize,
        sha256: String,
    ) -> Self {
        Self {
            path,
            width,
            height,
            area: u64::from(width) * u64::from(height),
            page_index,
            image_index,
            sha256,
        }
    }

    /// Square images count as landscape.
    pub fn is_landscape(&self) -> bool {
        self.width >= self.height
    }

    /// File name component of [`Self::path`], used as the upload file name.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Lowercase file extension without the dot, or `""`.
    pub fn extension(&self) -> String {
        extension_of(&self.path)
    }
}

pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Outcome of uploading one photo, after all attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// `true` once any attempt returned a 2xx status.
    pub success: bool,
    /// Last HTTP status observed; `0` if no response was ever received.
    pub status: u16,
    /// Truncated response body or transport error of the last attempt.
    /// Empty on success.
    pub error: String,
    /// Requests actually sent.
    pub attempts: u32,
}

impl UploadResult {
    pub fn succeeded(status: u16, attempts: u32) -> Self {
        Self {
            success: true,
            status,
            error: String::new(),
            attempts,
        }
    }

    pub fn failed(status: u16, error: impl Into<String>, attempts: u32) -> Self {
        Self {
            success: false,
            status,
            error: error.into(),
            attempts,
        }
    }
}

/// Outcome of the single listing status PATCH.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchResult {
    pub success: bool,
    /// HTTP status, `0` if no response was received.
    pub status: u16,
    /// Truncated response body or transport error. Empty on success.
    pub error: String,
}

impl PatchResult {
    pub fn ok(status: u16) -> Self {
        Self {
            success: true,
            status,
            error: String::new(),
        }
    }

    pub fn failed(status: u16, error: impl Into<String>) -> Self {
        Self {
            success: false,
            status,
            error: error.into(),
        }
    }
}

/// A photo in upload order together with how its upload went.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoUpload {
    /// 0-based position in upload order; sent as `order`.
    pub index: usize,
    /// Whether this photo was sent as the cover (position 0).
    pub is_cover: bool,
    pub image: ExtractedImage,
    pub result: UploadResult,
}

/// Everything a completed sync run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub listing_id: String,
    /// Directory the extracted images were written to.
    pub output_dir: PathBuf,
    /// Photos in upload order.
    pub uploads: Vec<PhotoUpload>,
    /// Number of photos whose upload succeeded.
    pub uploaded: usize,
    pub min_photos: usize,
    /// `uploaded >= min_photos`. Informational; the patch runs either way.
    pub meets_minimum: bool,
    pub patch: PatchResult,
}

impl SyncReport {
    /// The cover photo, if anything was extracted.
    pub fn cover(&self) -> Option<&ExtractedImage> {
        self.uploads.first().map(|u| &u.image)
    }

    /// Photos whose upload failed after every attempt.
    pub fn failed_uploads(&self) -> impl Iterator<Item = &PhotoUpload> {
        self.uploads.iter().filter(|u| !u.result.success)
    }
}

/// Keep at most [`ERROR_TEXT_LIMIT`] characters of `text`.
pub(crate) fn truncate_error(text: &str) -> String {
    match text.char_indices().nth(ERROR_TEXT_LIMIT) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
