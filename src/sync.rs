//! End-to-end sync entry points.
//!
//! [`sync_listing`] runs the whole pipeline: validate, extract, order,
//! upload, patch. [`publish_photos`] starts from images that are already on
//! disk, and [`extract_and_order`] stops before any network call.
//!
//! Only the two input conditions are fatal (unusable PDF, nothing
//! extracted). Upload failures, a missed photo minimum, and a rejected
//! status patch are all reported in the returned [`SyncReport`].

use crate::config::SyncConfig;
use crate::error::MlsPhotosError;
use crate::output::{ExtractedImage, PhotoUpload, SyncReport};
use crate::pipeline::api::{ListingApi, UploadOptions};
use crate::pipeline::{extract, input, order};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract a listing PDF's photos and upload them.
///
/// # Errors
/// Returns `Err(MlsPhotosError)` only for fatal conditions:
/// - PDF missing, unreadable, or not a PDF
/// - pdfium unavailable or unable to open the document
/// - zero images extracted (no request is sent in that case)
/// - invalid endpoint configuration
pub async fn sync_listing(
    pdf: impl AsRef<Path>,
    config: &SyncConfig,
) -> Result<SyncReport, MlsPhotosError> {
    let start = Instant::now();
    let pdf_path = input::validate_pdf(pdf.as_ref())?;
    info!(
        "Syncing photos for listing {} from {}",
        config.listing_id,
        pdf_path.display()
    );

    let images = extract_nonempty(&pdf_path, config.output_dir.as_path(), config).await?;
    let report = publish_photos(images, config).await?;

    info!(
        "Sync complete: {}/{} photo(s) uploaded in {}ms",
        report.uploaded,
        report.uploads.len(),
        start.elapsed().as_millis()
    );
    Ok(report)
}

/// Extract and order a PDF's photos without touching the network.
///
/// The first element is the cover. Fails like [`sync_listing`] when the PDF
/// is unusable or yields no images.
pub async fn extract_and_order(
    pdf: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
) -> Result<Vec<ExtractedImage>, MlsPhotosError> {
    let pdf_path = input::validate_pdf(pdf.as_ref())?;
    let images = extract::extract_images(&pdf_path, output_dir.as_ref()).await?;
    if images.is_empty() {
        return Err(MlsPhotosError::NoImagesFound { path: pdf_path });
    }
    Ok(order::order_for_upload(&images))
}

/// Order already-extracted images, upload them, and patch the listing.
///
/// # Errors
/// `NoImagesFound` for an empty list (before any request), or an HTTP
/// client construction failure.
pub async fn publish_photos(
    images: Vec<ExtractedImage>,
    config: &SyncConfig,
) -> Result<SyncReport, MlsPhotosError> {
    if images.is_empty() {
        return Err(MlsPhotosError::NoImagesFound {
            path: config.output_dir.clone(),
        });
    }

    let ordered = order::order_for_upload(&images);
    let cover = &ordered[0];
    info!(
        "Selected cover: {} ({}x{})",
        cover.file_name(),
        cover.width,
        cover.height
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_cover_selected(cover);
    }

    let api = ListingApi::new(config)?;
    debug!("Uploading to {}", api.upload_url());

    let uploads = upload_all(&api, ordered, config).await;
    let uploaded = uploads.iter().filter(|u| u.result.success).count();
    let meets_minimum = uploaded >= config.min_photos;

    if meets_minimum {
        info!(
            "Uploaded {} photo(s); meets minimum ({})",
            uploaded, config.min_photos
        );
    } else {
        warn!(
            "Uploaded {} photo(s); below required minimum {}",
            uploaded, config.min_photos
        );
    }
    if let Some(ref cb) = config.progress_callback {
        cb.on_uploads_finished(uploaded, config.min_photos);
    }

    let patch = api.patch_status(uploaded).await;
    if patch.success {
        info!("Listing status patched (photoCount={})", uploaded);
    } else {
        warn!(
            "Listing status patch failed (HTTP {}): {}",
            patch.status, patch.error
        );
    }
    if let Some(ref cb) = config.progress_callback {
        cb.on_patch_complete(uploaded, &patch);
    }

    Ok(SyncReport {
        listing_id: config.listing_id.clone(),
        output_dir: config.output_dir.clone(),
        uploads,
        uploaded,
        min_photos: config.min_photos,
        meets_minimum,
        patch,
    })
}

/// Synchronous wrapper around [`sync_listing`].
///
/// Creates a temporary tokio runtime internally.
pub fn sync_listing_blocking(
    pdf: impl AsRef<Path>,
    config: &SyncConfig,
) -> Result<SyncReport, MlsPhotosError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| MlsPhotosError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(sync_listing(pdf, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn extract_nonempty(
    pdf_path: &Path,
    output_dir: &Path,
    config: &SyncConfig,
) -> Result<Vec<ExtractedImage>, MlsPhotosError> {
    let extract_start = Instant::now();
    let images = extract::extract_images(pdf_path, output_dir).await?;
    info!(
        "Extracted {} image(s) to {} in {}ms",
        images.len(),
        output_dir.display(),
        extract_start.elapsed().as_millis()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(images.len(), output_dir);
    }

    if images.is_empty() {
        return Err(MlsPhotosError::NoImagesFound {
            path: pdf_path.to_path_buf(),
        });
    }
    Ok(images)
}

/// Upload photos one at a time, in order. Position 0 is the cover.
async fn upload_all(
    api: &ListingApi,
    ordered: Vec<ExtractedImage>,
    config: &SyncConfig,
) -> Vec<PhotoUpload> {
    let options = UploadOptions::from_config(config);
    let total = ordered.len();
    let mut uploads = Vec::with_capacity(total);

    for (index, image) in ordered.into_iter().enumerate() {
        let is_cover = index == 0;
        if let Some(ref cb) = config.progress_callback {
            cb.on_upload_start(index, total, &image);
        }

        let result = api.upload_photo(&image, index, is_cover, &options).await;

        if let Some(ref cb) = config.progress_callback {
            cb.on_upload_complete(index, total, &image, &result);
        }
        uploads.push(PhotoUpload {
            index,
            is_cover,
            image,
            result,
        });
    }

    uploads
}
